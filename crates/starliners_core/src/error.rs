//! Error types for the battle simulation.
//!
//! Only invariant violations and data problems are errors. Normal combat
//! outcomes (no targets left, nothing to repair, an empty reinforcement
//! pool) are never reported through this type.

use thiserror::Error;

use crate::forces::{FleetId, LevyId, ShipId};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all battle simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// A ship was pushed onto a grid with no free slot.
    #[error("Battle grid is full: {capacity} slots occupied")]
    GridFull {
        /// Grid capacity.
        capacity: usize,
    },

    /// A ship was pushed onto a grid while already deployed somewhere.
    #[error("Ship {0} is already deployed")]
    AlreadyDeployed(ShipId),

    /// Ship handle does not resolve to a ship in its levy.
    #[error("Ship not found: {0}")]
    ShipNotFound(ShipId),

    /// Levy handle does not resolve.
    #[error("Levy not found: {0}")]
    LevyNotFound(LevyId),

    /// Fleet handle does not resolve.
    #[error("Fleet not found: {0}")]
    FleetNotFound(FleetId),

    /// Ship class identifier is not registered.
    #[error("Unknown ship class: {0}")]
    UnknownShipClass(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Ship class data failed a consistency check.
    #[error("Invalid ship class '{id}': {reason}")]
    InvalidShipClass {
        /// Class identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Invalid battle state.
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
