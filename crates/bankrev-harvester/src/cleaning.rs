//! Post-harvest review text cleaning.

use std::sync::LazyLock;

use bankrev_core::NormalizedReview;
use regex::Regex;

/// Minimum number of ASCII letters a body needs to count as text.
const MIN_ASCII_LETTERS: usize = 3;

static NON_WORD_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\W_]+$").expect("valid regex"));

static CONTROL_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\x00-\x1F\x7F-\x{9F}]+\s*$").expect("valid regex")
});

/// `false` for bodies that are blank, made only of symbols or control
/// characters, or carry fewer than three ASCII letters.
#[must_use]
pub fn has_meaningful_text(body: &str) -> bool {
    if body.trim().is_empty() || NON_WORD_ONLY_RE.is_match(body) || CONTROL_ONLY_RE.is_match(body)
    {
        return false;
    }
    body.chars().filter(char::is_ascii_alphabetic).count() >= MIN_ASCII_LETTERS
}

/// Drop reviews whose body fails [`has_meaningful_text`].
#[must_use]
pub fn clean_reviews(reviews: Vec<NormalizedReview>) -> Vec<NormalizedReview> {
    let before = reviews.len();
    let kept: Vec<_> = reviews
        .into_iter()
        .filter(|r| has_meaningful_text(&r.text))
        .collect();
    let removed = before - kept.len();
    tracing::info!(before, removed, kept = kept.len(), "review text cleaned");
    kept
}
