//! Battle statistics and the history archive they end up in.
//!
//! Every battle keeps a [`BattleReport`] tallied per side and per ship
//! class. When the battle wraps up, the finished report goes to a
//! [`HistoryArchive`]. [`BattleHistory`] is the in-memory archive, which can
//! be written to and read from a versioned file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::battle::{BattleId, BattleResolution, BattleSide};
use crate::error::{GameError, Result};
use crate::factions::FactionId;
use crate::forces::{FleetId, LocationId};

/// History file format version for compatibility.
pub const HISTORY_VERSION: u32 = 1;

/// Statistics for one ship class on one side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipReport {
    /// Ships placed into the grid.
    pub deployed: u32,
    /// Ships lost as wrecks.
    pub destroyed: u32,
    /// Ships withdrawn intact.
    pub retreated: u32,
    /// Layer damage dealt to the enemy.
    pub damage_dealt: u64,
    /// Layer damage taken.
    pub damage_taken: u64,
    /// Incoming damage resisted.
    pub damage_resisted: u64,
    /// Health restored to friendly ships.
    pub repairs: u64,
    /// Enemy ships destroyed.
    pub kills: u32,
    /// Loot earned from kills.
    pub loot: u64,
}

impl ShipReport {
    /// Add another report's figures to this one.
    pub fn merge(&mut self, other: &Self) {
        self.deployed += other.deployed;
        self.destroyed += other.destroyed;
        self.retreated += other.retreated;
        self.damage_dealt += other.damage_dealt;
        self.damage_taken += other.damage_taken;
        self.damage_resisted += other.damage_resisted;
        self.repairs += other.repairs;
        self.kills += other.kills;
        self.loot += other.loot;
    }
}

/// Statistics for one side.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideReport {
    /// Factions that fought on this side.
    pub factions: BTreeSet<FactionId>,
    /// Fleets that fought on this side.
    pub fleets: BTreeSet<FleetId>,
    /// Figures per ship class id.
    pub ships: BTreeMap<String, ShipReport>,
}

impl SideReport {
    /// Figures for a ship class, created empty on first use.
    pub fn ship_mut(&mut self, class: &str) -> &mut ShipReport {
        self.ships.entry(class.to_string()).or_default()
    }

    /// Figures summed over every class.
    #[must_use]
    pub fn totals(&self) -> ShipReport {
        self.ships.values().fold(ShipReport::default(), |mut acc, r| {
            acc.merge(r);
            acc
        })
    }
}

/// Statistics for a whole battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Battle identifier.
    pub battle: BattleId,
    /// Where it was fought.
    pub location: LocationId,
    /// Tick the battle opened.
    pub started_at: u64,
    /// Tick the battle was resolved.
    pub ended_at: Option<u64>,
    /// Combat turns fought.
    pub turns: u32,
    /// Outcome.
    pub resolution: BattleResolution,
    /// Attacking side.
    pub attacker: SideReport,
    /// Defending side.
    pub defender: SideReport,
}

impl BattleReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(battle: BattleId, location: LocationId, started_at: u64) -> Self {
        Self {
            battle,
            location,
            started_at,
            ended_at: None,
            turns: 0,
            resolution: BattleResolution::None,
            attacker: SideReport::default(),
            defender: SideReport::default(),
        }
    }

    /// Statistics for one side.
    #[must_use]
    pub const fn side(&self, side: BattleSide) -> &SideReport {
        match side {
            BattleSide::Attacker => &self.attacker,
            BattleSide::Defender => &self.defender,
        }
    }

    /// Statistics for one side, mutably.
    pub fn side_mut(&mut self, side: BattleSide) -> &mut SideReport {
        match side {
            BattleSide::Attacker => &mut self.attacker,
            BattleSide::Defender => &mut self.defender,
        }
    }

    /// Record the outcome.
    pub fn finalize(&mut self, resolution: BattleResolution, turns: u32, now: u64) {
        self.resolution = resolution;
        self.turns = turns;
        self.ended_at = Some(now);
    }

    /// Check if the battle has been resolved.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Receiver of finished battle reports.
pub trait HistoryArchive {
    /// Store a finished report.
    fn archive(&mut self, report: BattleReport);
}

/// In-memory archive of finished battles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleHistory {
    /// File format version.
    pub version: u32,
    reports: Vec<BattleReport>,
}

impl Default for BattleHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleHistory {
    /// Create an empty archive.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: HISTORY_VERSION,
            reports: Vec::new(),
        }
    }

    /// Archived reports, oldest first.
    #[must_use]
    pub fn reports(&self) -> &[BattleReport] {
        &self.reports
    }

    /// Report of one battle.
    #[must_use]
    pub fn get(&self, battle: BattleId) -> Option<&BattleReport> {
        self.reports.iter().find(|r| r.battle == battle)
    }

    /// Number of archived battles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Check if nothing has been archived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Save the archive to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize history: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write history file: {e}")))?;
        Ok(())
    }

    /// Load an archive from a file.
    ///
    /// # Errors
    /// Returns an error if reading or decoding fails, or the file was
    /// written by another format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read history file: {e}")))?;
        let history: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize history: {e}")))?;

        if history.version != HISTORY_VERSION {
            return Err(GameError::InvalidState(format!(
                "History version mismatch: expected {HISTORY_VERSION}, got {}",
                history.version
            )));
        }

        Ok(history)
    }
}

impl HistoryArchive for BattleHistory {
    fn archive(&mut self, report: BattleReport) {
        self.reports.push(report);
    }
}
