//! Resona CLI - migrations, seeding, data checks and repairs.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! resona migrate
//!
//! # Seed shipping config, the Montaje category and the calculator config
//! resona seed
//! resona seed --file seed.yaml
//!
//! # Report every business-convention violation (exit 1 if any)
//! resona check --output report.json
//!
//! # Fix violations; --dry-run only logs what would change
//! resona repair deposits --dry-run
//! resona repair stock
//! resona repair pack-prices
//! resona repair montaje
//!
//! # Move the calculator config in and out of the database
//! resona calculator export calculator.yaml
//! resona calculator import calculator.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `RESONA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "resona")]
#[command(author, version, about = "Resona operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert default configuration rows that are missing
    Seed {
        /// YAML file with shipping and calculator overrides
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Run every integrity check and report violations
    Check {
        /// Also write the report as JSON to this path
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Fix violations reported by `check`
    Repair {
        #[command(subcommand)]
        target: RepairTarget,

        /// Log the changes without writing them
        #[arg(long, global = true)]
        dry_run: bool,
    },
    /// Export or import the event calculator configuration
    Calculator {
        #[command(subcommand)]
        action: CalculatorAction,
    },
}

#[derive(Subcommand)]
enum RepairTarget {
    /// Zero deposits on VIP orders (or recompute every order with --all)
    Deposits {
        /// Recompute the deposit of every order, not only VIP ones
        #[arg(long)]
        all: bool,
    },
    /// Backfill null real stock and clamp available stock
    Stock,
    /// Recompute auto-calculated pack prices that drifted
    PackPrices,
    /// Align pack category enums with their category reference
    Montaje,
}

#[derive(Subcommand)]
enum CalculatorAction {
    /// Write the stored configuration to a YAML file
    Export {
        /// Destination path
        path: String,
    },
    /// Validate a YAML file and store it as the configuration
    Import {
        /// Source path
        path: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
        Commands::Check { output } => commands::check::run(output.as_deref()).await?,
        Commands::Repair { target, dry_run } => match target {
            RepairTarget::Deposits { all } => commands::repair::deposits(dry_run, all).await?,
            RepairTarget::Stock => commands::repair::stock(dry_run).await?,
            RepairTarget::PackPrices => commands::repair::pack_prices(dry_run).await?,
            RepairTarget::Montaje => commands::repair::montaje(dry_run).await?,
        },
        Commands::Calculator { action } => match action {
            CalculatorAction::Export { path } => commands::calculator::export(&path).await?,
            CalculatorAction::Import { path } => commands::calculator::import(&path).await?,
        },
    }
    Ok(())
}
