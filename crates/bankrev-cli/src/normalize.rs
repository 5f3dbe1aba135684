//! `bankrev normalize`: re-resolve review dates and drop meaningless bodies.

use std::path::{Path, PathBuf};

use bankrev_core::NormalizedReview;
use bankrev_harvester::{clean_reviews, normalize_reviews};

use crate::output::{read_records, sibling_path, write_csv, write_json, CleaningSummary};

/// Files produced by one normalize run.
#[derive(Debug)]
pub(crate) struct NormalizeReport {
    pub read: usize,
    pub kept: usize,
    pub reviews_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Re-normalize every review's date against its collection time, then drop
/// reviews whose body carries no meaningful text.
#[must_use]
pub(crate) fn normalize_and_clean(reviews: &[NormalizedReview]) -> Vec<NormalizedReview> {
    let raw = reviews.iter().map(NormalizedReview::to_review).collect();
    clean_reviews(normalize_reviews(raw))
}

/// Read saved reviews from `input` (CSV or JSON), normalize and clean them,
/// and write `{input}_cleaned.csv` plus `{input}_cleaning_summary.json`
/// (or `output` for the reviews file when given).
///
/// # Errors
///
/// Returns an error if the input cannot be read or an output cannot be
/// written.
pub(crate) fn run_normalize(input: &Path, output: Option<&Path>) -> anyhow::Result<NormalizeReport> {
    let reviews: Vec<NormalizedReview> = read_records(input)?;
    let read = reviews.len();
    tracing::info!(input = %input.display(), reviews = read, "normalizing saved reviews");

    let cleaned = normalize_and_clean(&reviews);

    let reviews_path = output.map_or_else(|| sibling_path(input, "cleaned", "csv"), Path::to_path_buf);
    write_csv(&reviews_path, &cleaned)?;

    let summary_path = sibling_path(input, "cleaning_summary", "json");
    write_json(&summary_path, &CleaningSummary::from_reviews(&cleaned))?;

    tracing::info!(
        read,
        kept = cleaned.len(),
        output = %reviews_path.display(),
        "cleaned reviews saved"
    );

    Ok(NormalizeReport {
        read,
        kept: cleaned.len(),
        reviews_path,
        summary_path,
    })
}
