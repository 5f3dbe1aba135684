//! Records produced by a harvest run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reviewer name used when no strategy yields one.
pub const ANONYMOUS_REVIEWER: &str = "Anonymous";

/// A bank branch discovered on a search listing.
///
/// Identity is `locator`, the canonical detail-page URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// Parent organization (bank) name the search was issued for.
    pub organization: String,
    pub name: String,
    pub locator: String,
    /// Raw address as shown on the listing; replaced by enrichment when a
    /// better one is found on the detail page.
    pub address: String,
    /// Aggregate rating in `[0, 5]`.
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
}

impl Branch {
    /// Returns a copy with `address` replaced when `enriched` carries a value.
    #[must_use]
    pub fn with_address(mut self, enriched: Option<&str>) -> Self {
        if let Some(address) = enriched.map(str::trim).filter(|a| !a.is_empty()) {
            address.clone_into(&mut self.address);
        }
        self
    }
}

/// A single customer review collected from a branch detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Locator of the owning [`Branch`].
    pub branch_locator: String,
    pub reviewer_name: String,
    /// Star rating in `[0, 5]`; `0` when the rating could not be read.
    pub rating: f64,
    /// Review body, possibly empty.
    pub text: String,
    /// Relative date phrase exactly as displayed, e.g. `"3 months ago"`.
    pub relative_date: String,
    /// When the review was collected; reference point for `relative_date`.
    pub collected_at: DateTime<Utc>,
}

/// A [`Review`] with its relative date resolved to a calendar date.
///
/// Flat on purpose: CSV writers cannot serialize nested structs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReview {
    pub branch_locator: String,
    pub reviewer_name: String,
    pub rating: f64,
    pub text: String,
    pub relative_date: String,
    pub collected_at: DateTime<Utc>,
    pub review_date: NaiveDate,
    pub review_year: i32,
    pub review_month: u32,
}

impl NormalizedReview {
    /// Attach a resolved date to `review`. Year and month are derived from
    /// `review_date` so they can never disagree with it.
    #[must_use]
    pub fn new(review: Review, review_date: NaiveDate) -> Self {
        use chrono::Datelike;

        Self {
            branch_locator: review.branch_locator,
            reviewer_name: review.reviewer_name,
            rating: review.rating,
            text: review.text,
            relative_date: review.relative_date,
            collected_at: review.collected_at,
            review_date,
            review_year: review_date.year(),
            review_month: review_date.month(),
        }
    }

    /// The raw review this record was derived from.
    #[must_use]
    pub fn to_review(&self) -> Review {
        Review {
            branch_locator: self.branch_locator.clone(),
            reviewer_name: self.reviewer_name.clone(),
            rating: self.rating,
            text: self.text.clone(),
            relative_date: self.relative_date.clone(),
            collected_at: self.collected_at,
        }
    }
}
