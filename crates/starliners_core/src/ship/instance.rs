//! Mutable combat state of a single ship.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::battle::BattleSide;
use crate::damage::{DamageKind, DamageReport, HitType, Layer, PerLayer, Volley};
use crate::forces::{LevyId, ShipId};
use crate::math::{ratio, scale, Fixed};
use crate::random::WorldRng;

use super::class::ShipClass;
use super::properties::ShipProperties;
use super::MAX_MANOUVER;

/// Veterancy level, derived from accumulated experience.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ShipLevel {
    /// Fresh crew.
    #[default]
    Green,
    /// Has seen some action.
    Trained,
    /// Seasoned crew.
    Veteran,
    /// Hand-picked crew.
    Elite,
    /// Famous ship.
    Legendary,
}

impl ShipLevel {
    /// Experience needed to reach each level, lowest first.
    pub const THRESHOLDS: [(u32, Self); 5] = [
        (0, Self::Green),
        (100, Self::Trained),
        (300, Self::Veteran),
        (700, Self::Elite),
        (1500, Self::Legendary),
    ];

    /// Level for an amount of experience.
    #[must_use]
    pub fn from_experience(experience: u32) -> Self {
        Self::THRESHOLDS
            .iter()
            .rev()
            .find(|(needed, _)| experience >= *needed)
            .map_or(Self::Green, |(_, level)| *level)
    }

    /// Bonus applied to manoeuvre and tracking, in whole percent.
    #[must_use]
    pub const fn bonus_percent(self) -> u32 {
        match self {
            Self::Green => 0,
            Self::Trained => 5,
            Self::Veteran => 10,
            Self::Elite => 15,
            Self::Legendary => 20,
        }
    }

    /// Apply the level bonus to a manoeuvre or tracking rating.
    #[must_use]
    pub const fn adjust(self, rating: u32) -> u32 {
        let adjusted = rating.saturating_mul(100 + self.bonus_percent()) / 100;
        if adjusted > MAX_MANOUVER {
            MAX_MANOUVER
        } else {
            adjusted
        }
    }
}

/// Whether a ship can still fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShipState {
    /// Intact.
    #[default]
    Operational,
    /// Hull reached zero. Removed from the grid on the next cleanup.
    Wreck,
}

/// Where a ship currently is relative to battles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Deployment {
    /// With its levy, not taking part in any battle.
    #[default]
    Reserve,
    /// Selected as a reinforcement for one side, waiting for a slot.
    Queued(BattleSide),
    /// Occupying a grid slot.
    Deployed {
        /// Side of the grid.
        side: BattleSide,
        /// Slot index in that grid.
        slot: usize,
    },
}

/// A single ship's mutable combat state.
///
/// The ship is owned by its levy; the levy handle here is a lookup key, not
/// an owning reference.
#[derive(Debug, Clone)]
pub struct ShipInstance {
    id: ShipId,
    class: Arc<ShipClass>,
    properties: ShipProperties,
    levy: LevyId,
    construction: Fixed,
    layers: PerLayer<i32>,
    experience: u32,
    state: ShipState,
    deployment: Deployment,
    last_joined: Option<u64>,
}

impl ShipInstance {
    /// Create a fully built ship at full health.
    #[must_use]
    pub fn new(
        id: ShipId,
        class: Arc<ShipClass>,
        properties: ShipProperties,
        levy: LevyId,
    ) -> Self {
        let layers = class.capacity;
        Self {
            id,
            class,
            properties,
            levy,
            construction: Fixed::ONE,
            layers,
            experience: 0,
            state: ShipState::Operational,
            deployment: Deployment::Reserve,
            last_joined: None,
        }
    }

    /// Create a ship that still has to be built.
    #[must_use]
    pub fn under_construction(
        id: ShipId,
        class: Arc<ShipClass>,
        properties: ShipProperties,
        levy: LevyId,
    ) -> Self {
        let mut ship = Self::new(id, class, properties, levy);
        ship.construction = Fixed::ZERO;
        ship
    }

    /// Ship identifier.
    #[must_use]
    pub const fn id(&self) -> ShipId {
        self.id
    }

    /// Ship class.
    #[must_use]
    pub fn class(&self) -> &Arc<ShipClass> {
        &self.class
    }

    /// Effective combat numbers.
    #[must_use]
    pub const fn properties(&self) -> &ShipProperties {
        &self.properties
    }

    /// Owning levy.
    #[must_use]
    pub const fn levy(&self) -> LevyId {
        self.levy
    }

    /// Current health of a layer.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> i32 {
        self.layers[layer]
    }

    /// Current health of every layer.
    #[must_use]
    pub const fn layers(&self) -> PerLayer<i32> {
        self.layers
    }

    /// Accumulated experience.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Veterancy level.
    #[must_use]
    pub fn level(&self) -> ShipLevel {
        ShipLevel::from_experience(self.experience)
    }

    /// Combat state.
    #[must_use]
    pub const fn state(&self) -> ShipState {
        self.state
    }

    /// Check if the ship has been wrecked.
    #[must_use]
    pub fn is_wreck(&self) -> bool {
        self.state == ShipState::Wreck
    }

    /// Construction progress in `[0, 1]`.
    #[must_use]
    pub const fn construction(&self) -> Fixed {
        self.construction
    }

    /// Check if construction has finished.
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.construction >= Fixed::ONE
    }

    /// Battle placement.
    #[must_use]
    pub const fn deployment(&self) -> Deployment {
        self.deployment
    }

    /// Tick at which the ship last took a grid slot.
    #[must_use]
    pub const fn last_joined(&self) -> Option<u64> {
        self.last_joined
    }

    /// Check if the ship can be picked as a reinforcement.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.is_constructed() && !self.is_wreck() && self.deployment == Deployment::Reserve
    }

    /// Advance construction. Returns `true` when this call finished the ship.
    pub fn advance_construction(&mut self, progress: Fixed) -> bool {
        if self.is_constructed() || progress <= Fixed::ZERO {
            return false;
        }
        self.construction = (self.construction + progress).min(Fixed::ONE);
        self.is_constructed()
    }

    /// Add experience. Experience never decreases.
    pub fn gain_experience(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
    }

    pub(crate) fn set_deployment(&mut self, deployment: Deployment) {
        self.deployment = deployment;
    }

    pub(crate) fn mark_joined(&mut self, side: BattleSide, slot: usize, tick: u64) {
        self.deployment = Deployment::Deployed { side, slot };
        self.last_joined = Some(tick);
    }

    /// Chance to evade a volley, from level-adjusted manoeuvre.
    #[must_use]
    pub fn evasion(&self) -> Fixed {
        ratio(self.level().adjust(self.class.manoeuvre), MAX_MANOUVER)
    }

    /// Level-adjusted tracking rating.
    #[must_use]
    pub fn tracking(&self) -> u32 {
        self.level().adjust(self.class.tracking)
    }

    /// Volley this ship fires for one damage kind. Wrecks fire nothing.
    #[must_use]
    pub fn fire(&self, kind: DamageKind) -> Volley {
        let damage = if self.is_wreck() {
            0
        } else {
            self.properties.firepower[kind]
        };
        Volley::new(kind, self.tracking(), damage)
    }

    /// Resolve an incoming volley against this ship.
    ///
    /// Severities are contested in ascending order. For each one a first
    /// draw is compared with the ship's evasion; only when it falls below the
    /// evasion is a second draw made, and the volley's tracking overcomes the
    /// evasion when that draw falls below the tracking. An evaded severity
    /// ends the contest. The hit is the highest severity reached, a miss if
    /// the first one was evaded.
    ///
    /// Damage then runs through shield, armour and hull in turn. Each layer
    /// resists its fraction of what reaches it, loses at most its remaining
    /// health, and passes the rest on.
    pub fn absorb_volley(&mut self, volley: &Volley, rng: &mut WorldRng) -> DamageReport {
        if self.is_wreck() {
            return DamageReport::NO_DAMAGE;
        }

        let evasion = self.evasion();
        let tracking = ratio(volley.tracking.min(MAX_MANOUVER), MAX_MANOUVER);

        let mut hit = HitType::Missed;
        for severity in HitType::SEVERITIES {
            let evaded = rng.fraction() < evasion && rng.fraction() >= tracking;
            if evaded {
                break;
            }
            hit = severity;
        }

        if hit == HitType::Missed {
            return DamageReport::NO_DAMAGE;
        }

        let mut remaining = hit.randomized_damage(volley.damage, rng);
        let mut report = DamageReport::with_hit(hit);

        for layer in Layer::ALL {
            let health = self.layers[layer];
            if health <= 0 || remaining <= 0 {
                continue;
            }
            let absorbed = scale(remaining, self.properties.resist(layer, volley.kind));
            let delivered = (remaining - absorbed).min(health);
            self.layers[layer] = health - delivered;
            remaining -= absorbed + delivered;
            report.record(layer, absorbed, delivered);
        }

        if self.layers.hull <= 0 {
            self.layers.hull = 0;
            self.state = ShipState::Wreck;
            report.final_hit = true;
        }

        report
    }

    /// Repair output this ship offers for one layer. Wrecks offer nothing.
    #[must_use]
    pub fn support(&self, layer: Layer) -> u32 {
        if self.is_wreck() {
            0
        } else {
            self.properties.support[layer]
        }
    }

    /// Missing health on one layer. Wrecks cannot be repaired.
    #[must_use]
    pub fn requires_healing(&self, layer: Layer) -> i32 {
        if self.is_wreck() {
            return 0;
        }
        (self.class.capacity[layer] - self.layers[layer]).max(0)
    }

    /// Repair a layer, capped to its deficit. Returns the amount applied.
    pub fn apply_healing(&mut self, layer: Layer, amount: u32) -> i32 {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let applied = amount.min(self.requires_healing(layer)).max(0);
        self.layers[layer] += applied;
        applied
    }
}
