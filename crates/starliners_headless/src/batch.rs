//! Batch runner for balance testing.
//!
//! Runs one scenario under many seeds in parallel with rayon and collects
//! the per-run metrics into a [`BatchSummary`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use starliners_core::ship::ShipClassRegistry;

use crate::metrics::{BatchSummary, RunMetrics};
use crate::runner::run_scenario;
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name, for the record.
    pub scenario: String,
    /// Number of runs.
    pub run_count: u32,
    /// Worker threads (0 = rayon default).
    pub parallel: u32,
    /// Seed of the first run. Run `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Tick limit per run.
    pub max_ticks: u64,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::frontier_clash().name,
            run_count: 100,
            parallel: 0,
            seed_start: 0,
            max_ticks: 5_000,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create a config for `run_count` runs of a scenario.
    pub fn new(scenario: &Scenario, run_count: u32) -> Self {
        Self {
            scenario: scenario.name.clone(),
            run_count,
            max_ticks: scenario.max_ticks,
            ..Self::default()
        }
    }

    /// Set the first seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }
}

/// A run that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index.
    pub run_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual runs, in seed order.
    pub runs: Vec<RunMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Failed runs.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a scenario under `config.run_count` consecutive seeds.
pub fn run_batch(
    scenario: &Scenario,
    classes: &ShipClassRegistry,
    config: BatchConfig,
) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        scenario = %config.scenario,
        runs = config.run_count,
        seed_start = config.seed_start,
        "Starting batch"
    );

    let work = |i: u32| {
        let seed = config.seed_start.wrapping_add(u64::from(i));
        let outcome = run_scenario(scenario, classes, seed, config.max_ticks).map_err(|e| {
            warn!(run = i, seed, error = %e, "Run failed");
            BatchError {
                run_index: i,
                seed,
                message: e.to_string(),
            }
        });
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % 10 == 0 {
            debug!(done, total = config.run_count, "Batch progress");
        }
        outcome
    };

    let outcomes: Vec<Result<RunMetrics, BatchError>> = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build()
        {
            Ok(pool) => pool.install(|| (0..config.run_count).into_par_iter().map(work).collect()),
            Err(e) => {
                warn!(error = %e, "Thread pool unavailable, using the global pool");
                (0..config.run_count).into_par_iter().map(work).collect()
            }
        }
    } else {
        (0..config.run_count).into_par_iter().map(work).collect()
    };

    let (runs, errors): (Vec<_>, Vec<_>) = outcomes.into_iter().partition(Result::is_ok);
    let runs: Vec<RunMetrics> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        runs = runs.len(),
        failed = errors.len(),
        duration_secs = format!("{duration_seconds:.1}"),
        "Batch complete"
    );

    BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run the same seed several times and compare the final state hashes.
pub fn verify_determinism(
    scenario: &Scenario,
    classes: &ShipClassRegistry,
    seed: u64,
    runs: u32,
) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .into_par_iter()
        .map(|_| {
            run_scenario(scenario, classes, seed, scenario.max_ticks)
                .map(|metrics| metrics.state_hash)
                .ok()
        })
        .collect();
    hashes.iter().all(Option::is_some) && hashes.windows(2).all(|w| w[0] == w[1])
}
