//! Per-turn records of fire and repair.
//!
//! A grid produces these during a turn and keeps them until its next turn.
//! Timestamps are spread across the turn so a client can play them back as
//! individual effects.

use serde::{Deserialize, Serialize};

use crate::damage::{DamageReport, Layer, Volley};
use crate::factions::Colour;
use crate::forces::ShipRef;

/// One volley's flight and, once resolved, its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salvo {
    /// Tick at which the shot is shown.
    pub timestamp: u64,
    /// Slot of the firing ship.
    pub origin: usize,
    /// Firing ship.
    pub shooter: ShipRef,
    /// What was fired.
    pub volley: Volley,
    /// Weapon colour of the firing faction.
    pub colour: Colour,
    /// Slot hit in the opposing grid, `None` until resolved or when dropped.
    pub target: Option<usize>,
    /// Ship hit.
    pub target_ship: Option<ShipRef>,
    /// Outcome on the target.
    pub report: Option<DamageReport>,
    /// Loot earned by the shooter. Non-zero only for a final hit.
    pub loot: u32,
}

impl Salvo {
    /// Create an unresolved salvo.
    #[must_use]
    pub const fn new(
        timestamp: u64,
        origin: usize,
        shooter: ShipRef,
        volley: Volley,
        colour: Colour,
    ) -> Self {
        Self {
            timestamp,
            origin,
            shooter,
            volley,
            colour,
            target: None,
            target_ship: None,
            report: None,
            loot: 0,
        }
    }

    /// Check if the salvo found a target.
    #[must_use]
    pub const fn landed(&self) -> bool {
        self.target.is_some()
    }

    /// Check if the salvo destroyed its target.
    #[must_use]
    pub fn was_final(&self) -> bool {
        self.report.is_some_and(|report| report.final_hit)
    }
}

/// One unit of repair offered by a support ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regen {
    /// Tick at which the repair is shown.
    pub timestamp: u64,
    /// Slot of the repairing ship.
    pub origin: usize,
    /// Repairing ship.
    pub source: ShipRef,
    /// Layer repaired.
    pub layer: Layer,
    /// Repair offered.
    pub amount: u32,
    /// Slot of the repaired ship, `None` when nobody needed it.
    pub target: Option<usize>,
    /// Repaired ship.
    pub target_ship: Option<ShipRef>,
    /// Health actually restored.
    pub applied: i32,
}

impl Regen {
    /// Create an unassigned repair.
    #[must_use]
    pub const fn new(timestamp: u64, origin: usize, source: ShipRef, layer: Layer, amount: u32) -> Self {
        Self {
            timestamp,
            origin,
            source,
            layer,
            amount,
            target: None,
            target_ship: None,
            applied: 0,
        }
    }

    /// Check if the repair was applied to a ship.
    #[must_use]
    pub const fn applied_to_target(&self) -> bool {
        self.target.is_some()
    }
}

/// A visual effect due at a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect<'a> {
    /// Weapon fire.
    Salvo(&'a Salvo),
    /// Repair.
    Regen(&'a Regen),
}

impl Effect<'_> {
    /// Tick at which the effect is shown.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        match self {
            Self::Salvo(salvo) => salvo.timestamp,
            Self::Regen(regen) => regen.timestamp,
        }
    }
}
