//! File persistence for harvest runs and the offline steps.
//!
//! A run writes `{prefix}bank_branches_{ts}.csv`, `{prefix}bank_reviews_{ts}.csv`,
//! `{prefix}bank_reviews_{ts}.json` and `{prefix}scraping_summary_{ts}.txt`
//! where `prefix` is `final_` or `progress_` and `ts` is fixed when the sink
//! is created, so every save of one run overwrites the same set of files.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use bankrev_core::{Branch, NormalizedReview};
use bankrev_harvester::{HarvestOutput, RecordSink, SaveKind, SinkError};
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Serialize;

const SESSION_TS_FORMAT: &str = "%Y%m%d_%H%M%S";

/// [`RecordSink`] writing CSV, JSON and a text summary into one directory.
#[derive(Debug, Clone)]
pub(crate) struct FileSink {
    dir: PathBuf,
    session_ts: String,
}

impl FileSink {
    pub(crate) fn new(dir: impl Into<PathBuf>, started_at: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            session_ts: started_at.format(SESSION_TS_FORMAT).to_string(),
        }
    }

    pub(crate) fn path_for(&self, kind: SaveKind, stem: &str, extension: &str) -> PathBuf {
        let prefix = match kind {
            SaveKind::Progress => "progress_",
            SaveKind::Final => "final_",
        };
        self.dir
            .join(format!("{prefix}{stem}_{}.{extension}", self.session_ts))
    }

    /// Write every output file for `kind` and return the paths written.
    ///
    /// Empty branch or review lists produce no file for that list.
    pub(crate) fn write_all(
        &self,
        output: &HarvestOutput,
        kind: SaveKind,
    ) -> Result<Vec<PathBuf>, SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut written = Vec::new();

        if !output.branches.is_empty() {
            let path = self.path_for(kind, "bank_branches", "csv");
            write_csv(&path, &output.branches)?;
            written.push(path);
        }

        if !output.reviews.is_empty() {
            let path = self.path_for(kind, "bank_reviews", "csv");
            write_csv(&path, &output.reviews)?;
            written.push(path);

            let path = self.path_for(kind, "bank_reviews", "json");
            write_json(&path, &output.reviews)?;
            written.push(path);
        }

        let path = self.path_for(kind, "scraping_summary", "txt");
        std::fs::write(&path, render_summary(output, Local::now()))?;
        written.push(path);

        Ok(written)
    }
}

impl RecordSink for FileSink {
    fn save(&mut self, output: &HarvestOutput, kind: SaveKind) -> Result<(), SinkError> {
        let written = self.write_all(output, kind)?;
        tracing::info!(
            kind = ?kind,
            branches = output.branches.len(),
            reviews = output.reviews.len(),
            files = written.len(),
            dir = %self.dir.display(),
            "harvest output saved"
        );
        Ok(())
    }
}

/// Plain-text run summary: totals, then branch counts per organization.
pub(crate) fn render_summary(output: &HarvestOutput, generated_at: DateTime<Local>) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Scraping Summary - {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(text, "{}", "=".repeat(50));
    let _ = writeln!(text, "Total branches found: {}", output.branches.len());
    let _ = writeln!(text, "Total reviews collected: {}", output.reviews.len());
    let _ = writeln!(text);
    let _ = writeln!(text, "Branches by organization:");
    for (org, count) in branches_by_organization(&output.branches) {
        let _ = writeln!(text, "  {org}: {count} branches");
    }
    text
}

/// Statistics written next to a cleaned reviews file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CleaningSummary {
    pub total_reviews: usize,
    pub unique_branches: usize,
    pub avg_rating: Option<f64>,
    pub reviews_by_year: BTreeMap<i32, usize>,
    pub reviews_by_rating: BTreeMap<String, usize>,
}

impl CleaningSummary {
    pub(crate) fn from_reviews(reviews: &[NormalizedReview]) -> Self {
        let mut branches: Vec<&str> = reviews.iter().map(|r| r.branch_locator.as_str()).collect();
        branches.sort_unstable();
        branches.dedup();

        let mut reviews_by_year = BTreeMap::new();
        let mut reviews_by_rating = BTreeMap::new();
        for review in reviews {
            *reviews_by_year.entry(review.review_year).or_insert(0) += 1;
            *reviews_by_rating
                .entry(format!("{:.1}", review.rating))
                .or_insert(0) += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        let avg_rating = (!reviews.is_empty())
            .then(|| reviews.iter().map(|r| r.rating).sum::<f64>() / reviews.len() as f64);

        Self {
            total_reviews: reviews.len(),
            unique_branches: branches.len(),
            avg_rating,
            reviews_by_year,
            reviews_by_rating,
        }
    }
}

pub(crate) fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SinkError> {
    let encode = |e: csv::Error| SinkError::Encode {
        context: path.display().to_string(),
        reason: e.to_string(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(encode)?;
    for row in rows {
        writer.serialize(row).map_err(encode)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), SinkError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|e| SinkError::Encode {
        context: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Read records saved by [`write_csv`] or [`write_json`], chosen by the
/// file extension (`.json`, anything else is read as CSV).
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
        let records = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
        return Ok(records);
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
    let mut records = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        let record =
            row.map_err(|e| anyhow::anyhow!("{} row {}: {e}", path.display(), idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// `dir/name.csv` -> `dir/name_{suffix}.{extension}`.
pub(crate) fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_{suffix}.{extension}"))
}

/// Branch count per organization, for CLI reporting.
pub(crate) fn branches_by_organization(branches: &[Branch]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for branch in branches {
        *counts.entry(branch.organization.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
