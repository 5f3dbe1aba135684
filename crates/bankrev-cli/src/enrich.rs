//! `bankrev enrich`: replace listing addresses with detail-page addresses.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use bankrev_core::{AppConfig, Branch};
use bankrev_harvester::{
    apply_enrichment, enrich_branches, BranchDetails, BrowserOptions, DocumentSession, TokioClock,
    WebDriverSession,
};

use crate::output::{read_records, sibling_path, write_csv, write_json};

/// Revisit the branches saved in `input` and write the enriched copy.
///
/// Writes `{input}_enriched.csv` (or `output`) and the raw details as
/// `{input}_details.json`. At most `limit` branches are visited; the rest
/// keep their listing address.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the browser cannot be
/// started or an output cannot be written. A session that dies mid-pass
/// is reported after the partial output has been written.
pub(crate) async fn run_enrich(
    config: &AppConfig,
    input: &Path,
    output: Option<&Path>,
    limit: Option<usize>,
    headed: bool,
) -> anyhow::Result<()> {
    let branches: Vec<Branch> = read_records(input)?;
    let to_visit = limit.map_or(branches.len(), |n| n.min(branches.len()));
    tracing::info!(
        input = %input.display(),
        branches = branches.len(),
        to_visit,
        "enriching saved branches"
    );

    let options = BrowserOptions {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless && !headed,
        ..BrowserOptions::default()
    };
    let session = WebDriverSession::connect(&options)
        .await
        .context("failed to start browser session")?;

    let outcome = enrich_branches(
        &session,
        &TokioClock,
        &branches[..to_visit],
        Duration::from_millis(config.branch_delay_ms),
    )
    .await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    let visited = outcome.details.len();
    let found = outcome.details.iter().filter(|d| d.address.is_some()).count();
    let enriched_path = write_enrichment(input, output, branches, &outcome.details)?;

    if let Some(e) = outcome.error {
        return Err(anyhow::Error::new(e).context(format!(
            "enrichment stopped after {visited} of {to_visit} branches; partial output written to {}",
            enriched_path.display()
        )));
    }

    println!(
        "enrichment complete: {found}/{visited} addresses found, written to {}",
        enriched_path.display()
    );
    Ok(())
}

/// Apply `details` to `branches` and write `{input}_enriched.csv` (or
/// `output`) plus `{input}_details.json`. Returns the enriched CSV path.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub(crate) fn write_enrichment(
    input: &Path,
    output: Option<&Path>,
    branches: Vec<Branch>,
    details: &[BranchDetails],
) -> anyhow::Result<PathBuf> {
    let enriched = apply_enrichment(branches, details);
    let enriched_path =
        output.map_or_else(|| sibling_path(input, "enriched", "csv"), Path::to_path_buf);
    write_csv(&enriched_path, &enriched)?;
    write_json(&sibling_path(input, "details", "json"), details)?;
    Ok(enriched_path)
}
