//! Relative date phrases (`"3 months ago"`) resolved against the collection
//! timestamp.
//!
//! Total: every input resolves to some date. Anything that cannot be
//! interpreted resolves to the reference date with a warning.

use std::sync::LazyLock;

use bankrev_core::{NormalizedReview, Review};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

static QUANTITY_UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(a|an|\d+)\s+([a-z]+)").expect("valid regex"));

/// Units in match priority: the first one contained in the unit word wins.
const UNITS: &[(&str, Unit)] = &[
    ("year", Unit::Year),
    ("month", Unit::Month),
    ("week", Unit::Week),
    ("day", Unit::Day),
    ("hour", Unit::Hour),
    ("minute", Unit::Minute),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
}

impl From<NaiveDate> for NormalizedDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Resolve `phrase` relative to `reference`.
#[must_use]
pub fn normalize_relative_date(phrase: &str, reference: NaiveDateTime) -> NormalizedDate {
    let today = reference.date();
    let lower = phrase.trim().to_lowercase();

    match lower.as_str() {
        "" | "today" | "now" => return today.into(),
        "yesterday" => return today.pred_opt().unwrap_or(today).into(),
        _ => {}
    }

    let Some(caps) = QUANTITY_UNIT_RE.captures(&lower) else {
        tracing::warn!(phrase, "unrecognized date phrase; using reference date");
        return today.into();
    };

    let quantity: u32 = match &caps[1] {
        "a" | "an" => 1,
        digits => match digits.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(phrase, "date quantity out of range; using reference date");
                return today.into();
            }
        },
    };

    let Some(unit) = UNITS
        .iter()
        .find(|(name, _)| caps[2].contains(name))
        .map(|&(_, unit)| unit)
    else {
        tracing::warn!(phrase, unit = &caps[2], "unknown date unit; using reference date");
        return today.into();
    };

    match subtract(reference, quantity, unit) {
        Some(resolved) => resolved.date().into(),
        None => {
            tracing::warn!(phrase, "date offset out of range; using reference date");
            today.into()
        }
    }
}

fn subtract(reference: NaiveDateTime, quantity: u32, unit: Unit) -> Option<NaiveDateTime> {
    let n = i64::from(quantity);
    match unit {
        Unit::Year => reference.checked_sub_months(Months::new(quantity.checked_mul(12)?)),
        Unit::Month => reference.checked_sub_months(Months::new(quantity)),
        Unit::Week => reference.checked_sub_signed(TimeDelta::try_weeks(n)?),
        Unit::Day => reference.checked_sub_signed(TimeDelta::try_days(n)?),
        Unit::Hour => reference.checked_sub_signed(TimeDelta::try_hours(n)?),
        Unit::Minute => reference.checked_sub_signed(TimeDelta::try_minutes(n)?),
    }
}

/// Resolve every review's relative date against its own collection time.
#[must_use]
pub fn normalize_reviews(reviews: Vec<Review>) -> Vec<NormalizedReview> {
    reviews
        .into_iter()
        .map(|review| {
            let resolved =
                normalize_relative_date(&review.relative_date, review.collected_at.naive_utc());
            NormalizedReview::new(review, resolved.date)
        })
        .collect()
}

#[cfg(test)]
#[path = "dates_test.rs"]
mod tests;
