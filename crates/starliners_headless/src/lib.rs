//! Headless battle runner for balance testing and CI verification.
//!
//! Runs Starliners battles without a client: a scenario file describes the
//! factions and fleets at one location, the runner ticks the world until
//! every battle has been archived, and the outcome is printed as JSON.
//!
//! - **Balance testing**: run a scenario under many seeds and compare win rates
//! - **CI verification**: the same seed must always produce the same state hash
//!
//! # Output
//!
//! - **stdout**: run metrics and batch results (JSON)
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run the bundled scenario once
//! cargo run -p starliners_headless -- run --seed 7
//!
//! # Run a batch of 500 seeds
//! cargo run -p starliners_headless -- batch --count 500 --output results/
//!
//! # Verify determinism
//! cargo run -p starliners_headless -- verify --seed 12345 --runs 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod ship_data;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, BattleOutcome, RunMetrics};
pub use runner::{run_scenario, BattleRunner};
pub use scenario::{Scenario, ScenarioError};
pub use ship_data::{builtin_ship_classes, resolve_ship_classes, DataLoadError};
