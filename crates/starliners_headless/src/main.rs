//! Headless Starliners battle runner.
//!
//! Runs battles without a client. Results go to stdout as JSON, logs go
//! to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run one scenario
//! cargo run -p starliners_headless -- run --scenario data/scenarios/frontier_clash.ron
//!
//! # Run a batch balance test
//! cargo run -p starliners_headless -- batch --count 1000 --output results/
//!
//! # Check that a seed replays identically
//! cargo run -p starliners_headless -- verify --seed 12345
//!
//! # Show effective ship numbers for a heat-affine levy
//! cargo run -p starliners_headless -- inspect --affinity 6,0,0
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starliners_core::damage::PerKind;
use starliners_core::factions::CombatProperties;
use starliners_core::ship::{
    OriginAttributes, ShipClassRegistry, ShipModifiers, ShipProperties, ShipRole, ShipSize,
};
use starliners_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::BattleRunner,
    scenario::Scenario,
    ship_data::resolve_ship_classes,
};

#[derive(Parser)]
#[command(name = "starliners_headless")]
#[command(about = "Headless Starliners battle runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ship class data directory (defaults to data/ships or the bundled copy)
    #[arg(long, global = true)]
    ship_data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario
    Run {
        /// Scenario file to load (defaults to the bundled frontier clash)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Random seed (defaults to the scenario's seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Tick limit (defaults to the scenario's limit)
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Save the battle history archive to this file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Run a batch of seeds for balance testing
    Batch {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Print effective ship properties as JSON
    Inspect {
        /// Only this ship class
        #[arg(short, long)]
        class: Option<String>,

        /// Levy origin affinity levels: heat,kinetic,radiation
        #[arg(long, value_delimiter = ',', default_values_t = [0u8, 0, 0])]
        affinity: Vec<u8>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for JSON
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let classes = match resolve_ship_classes(cli.ship_data.as_deref()) {
        Ok(classes) => classes,
        Err(e) => fail(&format!("Failed to load ship data: {e}")),
    };

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            max_ticks,
            history,
        } => cmd_run(&classes, scenario, seed, max_ticks, history),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(&classes, scenario, count, parallel, output, seed),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&classes, scenario, seed, runs),
        Commands::Inspect { class, affinity } => cmd_inspect(&classes, class, &affinity),
    }
}

fn fail(message: &str) -> ! {
    tracing::error!("{message}");
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_scenario(path: Option<PathBuf>) -> Scenario {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading scenario");
            Scenario::load(&path).unwrap_or_else(|e| fail(&format!("{e}")))
        }
        None => Scenario::frontier_clash(),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&format!("Failed to serialize output: {e}")),
    }
}

/// Run one scenario and print its metrics
fn cmd_run(
    classes: &ShipClassRegistry,
    scenario: Option<PathBuf>,
    seed: Option<u64>,
    max_ticks: Option<u64>,
    history: Option<PathBuf>,
) {
    let scenario = load_scenario(scenario);
    let seed = seed.unwrap_or(scenario.seed);
    let max_ticks = max_ticks.unwrap_or(scenario.max_ticks);

    let mut runner = BattleRunner::new(&scenario, classes, seed)
        .unwrap_or_else(|e| fail(&format!("Failed to build scenario: {e}")));
    let metrics = runner
        .run(max_ticks)
        .unwrap_or_else(|e| fail(&format!("Run failed: {e}")));

    if let Some(path) = history {
        if let Err(e) = runner.history().save(&path) {
            fail(&format!("Failed to save history: {e}"));
        }
        tracing::info!(path = %path.display(), battles = runner.history().len(), "History saved");
    }

    print_json(&metrics);
}

/// Run a batch of seeds and save the results
fn cmd_batch(
    classes: &ShipClassRegistry,
    scenario: Option<PathBuf>,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
) {
    let scenario = load_scenario(scenario);
    let config = BatchConfig {
        parallel,
        ..BatchConfig::new(&scenario, count)
            .with_seed(seed)
            .with_output(output.clone())
    };

    let results = run_batch(&scenario, classes, config);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fail(&format!("Failed to save results: {e}"));
    }

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs: {}", results.runs.len());
    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!("  Run {} (seed {}): {}", error.run_index, error.seed, error.message);
        }
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("\nWin Rates:");
    for (faction, rate) in &results.summary.win_rates {
        eprintln!("  {}: {:.1}%", faction, rate * 100.0);
    }
    eprintln!("  Draws: {}", results.summary.draws);
    eprintln!("\nResults saved to: {}", results_path.display());

    print_json(&results.summary);
}

/// Verify determinism
fn cmd_verify(classes: &ShipClassRegistry, scenario: Option<PathBuf>, seed: u64, runs: u32) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, seed, runs, "Verifying determinism");

    if verify_determinism(&scenario, classes, seed, runs) {
        eprintln!("PASS: All {runs} runs produced identical results");
    } else {
        fail("Non-determinism detected");
    }
}

#[derive(Serialize)]
struct ClassSheet<'a> {
    id: &'a str,
    size: ShipSize,
    role: ShipRole,
    manoeuvre: u32,
    tracking: u32,
    properties: ShipProperties,
}

/// Print effective properties of every class for one levy origin
fn cmd_inspect(classes: &ShipClassRegistry, class: Option<String>, affinity: &[u8]) {
    let level = |i: usize| affinity.get(i).copied().unwrap_or(0);
    let origin = OriginAttributes {
        affinity: PerKind::new(level(0), level(1), level(2)),
    };
    let modifiers = ShipModifiers::from_attributes(&origin);
    let combat = CombatProperties::default();

    let mut sheets: Vec<ClassSheet<'_>> = classes
        .iter()
        .filter(|c| class.as_deref().map_or(true, |id| c.id == id))
        .map(|c| ClassSheet {
            id: &c.id,
            size: c.size,
            role: c.role,
            manoeuvre: c.manoeuvre,
            tracking: c.tracking,
            properties: ShipProperties::compute(c, &modifiers, &combat),
        })
        .collect();
    if sheets.is_empty() {
        fail(&format!("Unknown ship class: {}", class.unwrap_or_default()));
    }
    sheets.sort_by(|a, b| a.id.cmp(b.id));

    print_json(&sheets);
}
