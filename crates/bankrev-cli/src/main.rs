mod enrich;
mod harvest;
mod normalize;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bankrev")]
#[command(about = "Bank branch review harvester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every target organization, visit its branches and save their reviews
    Harvest(harvest::HarvestArgs),
    /// Re-resolve review dates and drop reviews without meaningful text
    Normalize {
        /// Saved reviews file (CSV or JSON)
        #[arg(long)]
        input: PathBuf,

        /// Cleaned reviews CSV (defaults to `<input>_cleaned.csv`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Revisit saved branches and replace listing addresses with full ones
    Enrich {
        /// Saved branches file (CSV or JSON)
        #[arg(long)]
        input: PathBuf,

        /// Enriched branches CSV (defaults to `<input>_enriched.csv`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Visit at most this many branches
        #[arg(long)]
        limit: Option<usize>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bankrev_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Harvest(args) => harvest::run_harvest_command(&config, args).await,
        Commands::Normalize { input, output } => {
            let report = normalize::run_normalize(&input, output.as_deref())?;
            println!(
                "normalize complete: kept {}/{} reviews, written to {}",
                report.kept,
                report.read,
                report.reviews_path.display()
            );
            Ok(())
        }
        Commands::Enrich {
            input,
            output,
            limit,
            headed,
        } => enrich::run_enrich(&config, &input, output.as_deref(), limit, headed).await,
    }
}
