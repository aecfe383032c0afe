//! # Starliners Core
//!
//! Deterministic tactical battle simulation for Starliners.
//!
//! This crate contains **only** the combat model:
//! - No rendering
//! - No IO beyond explicit history save/load
//! - No system randomness (the world lends a seeded [`random::WorldRng`])
//! - No floating-point math (uses fixed-point)
//!
//! Replaying the same draws in the same order reproduces a battle exactly.
//!
//! ## Crate Structure
//!
//! - [`damage`] - Damage kinds, layers, volleys and damage reports
//! - [`ship`] - Ship classes, levy modifiers, effective properties, ship state
//! - [`forces`] - Levies, fleets and the registry owning them
//! - [`grid`] - One side's 45-slot combat grid
//! - [`battle`] - The turn driver
//! - [`engagement`] - Opening and ticking battles across the world
//! - [`report`] - Battle statistics and the history archive
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod battle;
pub mod damage;
pub mod data;
pub mod effects;
pub mod engagement;
pub mod error;
pub mod factions;
pub mod forces;
pub mod grid;
pub mod math;
pub mod metrics;
pub mod notifications;
pub mod random;
pub mod report;
pub mod ship;

#[cfg(test)]
mod testing;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::battle::{
        Battle, BattleConfig, BattleContext, BattleId, BattleResolution, BattleSide,
    };
    pub use crate::damage::{DamageKind, DamageReport, HitType, Layer, PerKind, PerLayer, Volley};
    pub use crate::data::{parse_ship_classes, ShipClassData};
    pub use crate::effects::{Effect, Regen, Salvo};
    pub use crate::engagement::Engagements;
    pub use crate::error::{GameError, Result};
    pub use crate::factions::{Colour, CombatProperties, Faction, FactionId, Relation};
    pub use crate::forces::{Fleet, FleetId, Forces, Levy, LevyId, LocationId, ShipId, ShipRef};
    pub use crate::grid::{BattleGrid, COLUMN_MAP, GRID_CAPACITY, GRID_COLUMNS};
    pub use crate::math::Fixed;
    pub use crate::metrics::BattleMetrics;
    pub use crate::notifications::{
        LogNotifications, Notification, NotificationCategory, NotificationSink,
        RecordingNotifications,
    };
    pub use crate::random::WorldRng;
    pub use crate::report::{BattleHistory, BattleReport, HistoryArchive, ShipReport, SideReport};
    pub use crate::ship::{
        OriginAttributes, ShipClass, ShipClassRegistry, ShipInstance, ShipLevel, ShipRole,
        ShipSize, MAX_MANOUVER,
    };
}
