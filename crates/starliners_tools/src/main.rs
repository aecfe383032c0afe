//! Starliners - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "starliners-tools")]
#[command(about = "Development tools for Starliners")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate ship class data files
    Validate {
        /// Path to the ship data directory
        #[arg(default_value = "data/ships")]
        path: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path, strict } => {
            tracing::info!("Validating ship data in: {path}");
            let report = starliners_tools::validate::validate_ship_data(std::path::Path::new(&path));
            for warning in &report.warnings {
                tracing::warn!("{warning}");
            }
            for error in &report.errors {
                tracing::error!("{error}");
            }
            tracing::info!(
                files = report.files,
                classes = report.classes,
                errors = report.errors.len(),
                warnings = report.warnings.len(),
                "Validation finished"
            );
            if !report.is_ok() || (strict && !report.warnings.is_empty()) {
                tracing::error!("Validation failed");
                std::process::exit(1);
            }
            tracing::info!("Validation passed");
        }
    }
}
