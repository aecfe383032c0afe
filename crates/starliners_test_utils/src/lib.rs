//! # Starliners Test Utilities
//!
//! Shared testing infrastructure for the Starliners crates.
//!
//! ## Modules
//!
//! - [`fixtures`] - Sample ship classes and a two-fleet [`fixtures::Armada`]
//! - [`skirmish`] - A battle bundled with its per-tick collaborators
//! - [`determinism`] - Repeat-run hash comparison and proptest strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod skirmish;

pub use fixtures::*;
pub use skirmish::Skirmish;

// Re-export proptest for convenience
pub use proptest;
