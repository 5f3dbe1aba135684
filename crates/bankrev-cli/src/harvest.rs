//! `bankrev harvest`: drive a browser over every target and save the output.

use std::path::PathBuf;

use anyhow::Context;
use bankrev_core::{AppConfig, TargetsFile};
use bankrev_harvester::{BrowserOptions, HarvestConfig, TokioClock, WebDriverSession};
use clap::Args;

use crate::output::{branches_by_organization, FileSink};

#[derive(Debug, Clone, Default, Args)]
pub struct HarvestArgs {
    /// Harvest only this organization (case-insensitive name from the targets file)
    #[arg(long)]
    pub org: Option<String>,

    /// Search these localities instead of the ones in the targets file (repeatable)
    #[arg(long = "locality")]
    pub localities: Vec<String>,

    /// Stop after this many branches per organization
    #[arg(long)]
    pub max_branches: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for output files (defaults to BANKREV_OUTPUT_DIR)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Targets file (defaults to BANKREV_TARGETS_PATH)
    #[arg(long)]
    pub targets: Option<PathBuf>,

    /// Write a progress checkpoint after each organization
    #[arg(long)]
    pub progress_saves: bool,
}

/// Effective settings of one harvest after CLI overrides.
#[derive(Debug)]
pub(crate) struct HarvestPlan {
    pub targets: TargetsFile,
    pub harvest: HarvestConfig,
    pub browser: BrowserOptions,
    pub output_dir: PathBuf,
}

/// Apply `args` on top of `config` and the loaded `targets`.
///
/// # Errors
///
/// Returns an error if `--org` matches no organization in the targets file.
pub(crate) fn plan_harvest(
    config: &AppConfig,
    targets: TargetsFile,
    args: HarvestArgs,
) -> anyhow::Result<HarvestPlan> {
    let mut targets = match args.org.as_deref() {
        Some(name) => {
            let filtered = targets.filtered(name);
            if filtered.organizations.is_empty() {
                anyhow::bail!("organization '{name}' not found in targets file");
            }
            filtered
        }
        None => targets,
    };

    if !args.localities.is_empty() {
        for org in &mut targets.organizations {
            org.localities = Some(args.localities.clone());
        }
    }

    let mut harvest = HarvestConfig::from_app_config(config);
    if args.max_branches.is_some() {
        harvest.max_branches_per_org = args.max_branches;
    }
    harvest.progress_saves |= args.progress_saves;

    let browser = BrowserOptions {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless && !args.headed,
        ..BrowserOptions::default()
    };

    Ok(HarvestPlan {
        targets,
        harvest,
        browser,
        output_dir: args.output_dir.unwrap_or_else(|| config.output_dir.clone()),
    })
}

/// Run a full harvest and persist the output.
///
/// # Errors
///
/// Returns an error if the targets cannot be loaded, the browser cannot be
/// started, the run stops on a fatal session error, or the final save
/// fails. Output collected before a fatal error is still saved.
pub(crate) async fn run_harvest_command(config: &AppConfig, args: HarvestArgs) -> anyhow::Result<()> {
    let targets_path = args
        .targets
        .clone()
        .unwrap_or_else(|| config.targets_path.clone());
    let targets = bankrev_core::load_targets(&targets_path)
        .with_context(|| format!("failed to load targets from {}", targets_path.display()))?;
    let plan = plan_harvest(config, targets, args)?;

    tracing::info!(
        organizations = plan.targets.organizations.len(),
        max_branches = ?plan.harvest.max_branches_per_org,
        headless = plan.browser.headless,
        output_dir = %plan.output_dir.display(),
        "starting harvest"
    );

    let session = WebDriverSession::connect(&plan.browser)
        .await
        .context("failed to start browser session")?;
    let mut sink = FileSink::new(&plan.output_dir, chrono::Local::now());

    let output = bankrev_harvester::run_harvest(
        session,
        &TokioClock,
        &plan.harvest,
        &plan.targets,
        &mut sink,
    )
    .await?;

    println!(
        "harvest complete: {} branches, {} reviews",
        output.branches.len(),
        output.reviews.len()
    );
    for (org, count) in branches_by_organization(&output.branches) {
        println!("  {org}: {count} branches");
    }
    Ok(())
}
