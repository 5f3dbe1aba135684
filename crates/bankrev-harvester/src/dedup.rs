//! Fingerprint deduplication for harvested records.
//!
//! Scopes are explicit: branches share one [`FingerprintSet`] per run, reviews
//! get a fresh set per branch visit so identical reviews under different
//! branches are both kept.

use std::collections::HashSet;
use std::fmt;

use bankrev_core::Branch;
use sha2::{Digest, Sha256};

use crate::error::SessionError;
use crate::extract::review::ReviewCandidate;
use crate::session::{DocumentSession, Position};

/// Number of body characters that take part in a review fingerprint.
///
/// Two distinct reviews by the same person with the same rating and date
/// that share their first 50 characters collide; this is accepted.
pub const FINGERPRINT_BODY_CHARS: usize = 50;

/// Stable identity key of a record.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

impl Fingerprint for Branch {
    fn fingerprint(&self) -> String {
        self.locator.clone()
    }
}

impl Fingerprint for ReviewCandidate {
    fn fingerprint(&self) -> String {
        review_fingerprint(
            &self.reviewer_name,
            self.rating,
            &self.text,
            &self.relative_date,
        )
    }
}

/// SHA-256 over `name || rating || body[..50 chars] || date`, hex-encoded.
#[must_use]
pub fn review_fingerprint(reviewer_name: &str, rating: f64, text: &str, relative_date: &str) -> String {
    let body_prefix: String = text.chars().take(FINGERPRINT_BODY_CHARS).collect();
    let input = format!("{reviewer_name}\x00{rating}\x00{body_prefix}\x00{relative_date}");
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Lifetime of a [`FingerprintSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupScope {
    /// One harvest run; used for branches.
    Run,
    /// One detail-page visit; used for that branch's reviews.
    BranchVisit { locator: String },
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupScope::Run => f.write_str("run"),
            DedupScope::BranchVisit { locator } => write!(f, "visit {locator}"),
        }
    }
}

/// Seen fingerprints within one scope. Grows only; dropped with its scope.
#[derive(Debug)]
pub struct FingerprintSet {
    scope: DedupScope,
    seen: HashSet<String>,
}

impl FingerprintSet {
    #[must_use]
    pub fn new(scope: DedupScope) -> Self {
        Self {
            scope,
            seen: HashSet::new(),
        }
    }

    /// Record `record`'s fingerprint. Returns `false` when it was already
    /// seen in this scope.
    pub fn admit<R: Fingerprint>(&mut self, record: &R) -> bool {
        let admitted = self.seen.insert(record.fingerprint());
        if !admitted {
            tracing::debug!(scope = %self.scope, "duplicate record dropped");
        }
        admitted
    }

    #[must_use]
    pub fn scope(&self) -> &DedupScope {
        &self.scope
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Drops candidate blocks whose rounded on-page position was already seen in
/// the same extraction pass.
///
/// Incremental re-measurement and overlapping block locators re-surface the
/// same rendered card; its position is the stable key.
#[derive(Debug, Default)]
pub struct PositionFilter {
    seen: HashSet<Position>,
}

impl PositionFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `position` is offered.
    pub fn admit(&mut self, position: Position) -> bool {
        self.seen.insert(position)
    }

    /// Keep the blocks at positions not seen before, in input order. Blocks
    /// whose position cannot be read are skipped.
    ///
    /// # Errors
    ///
    /// Only fatal session errors are returned.
    pub async fn retain_unseen<S: DocumentSession>(
        &mut self,
        session: &S,
        blocks: Vec<S::Element>,
    ) -> Result<Vec<S::Element>, SessionError> {
        let total = blocks.len();
        let mut unique = Vec::with_capacity(total);
        for block in blocks {
            match session.position(&block).await {
                Ok(position) => {
                    if self.admit(position) {
                        unique.push(block);
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::debug!(error = %e, "block position unreadable; skipped"),
            }
        }
        tracing::debug!(total, unique = unique.len(), "position filter applied");
        Ok(unique)
    }
}
