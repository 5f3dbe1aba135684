//! Strategy tables for review cards on a branch detail page.

use std::sync::LazyLock;

use bankrev_core::ANONYMOUS_REVIEWER;
use chrono::{DateTime, Utc};
use regex::Regex;

use super::{extract_field, non_empty, FieldSpec, Probe, Strategy};
use crate::error::SessionError;
use crate::session::{DocumentSession, Locator};

/// Review card containers, unioned and position-filtered.
pub const REVIEW_BLOCKS: &[Locator] = &[
    Locator::Css("[data-review-id]"),
    Locator::Css("[jscontroller='fIQYlf']"),
    Locator::Css("div[aria-label*='stars']"),
    Locator::Css(".jftiEf"),
];

/// Items counted while scrolling the review panel.
pub const REVIEW_ITEMS: Locator = Locator::Css("[data-review-id]");

const MORE_LABEL: &str = "More";
const MIN_BODY_CHARS: usize = 5;
const TIME_WORDS: &[&str] = &["ago", "year", "month", "day", "week"];

static STAR_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*star").expect("valid regex"));

pub static REVIEWER_NAME: FieldSpec<String> = FieldSpec {
    field: "reviewer_name",
    strategies: &[
        Strategy {
            name: "d4r55",
            probe: Probe::Text(Locator::Css(".d4r55")),
            parse: parse_reviewer_name,
        },
        Strategy {
            name: "profile_button",
            probe: Probe::Text(Locator::Css("button.WEBjve")),
            parse: parse_reviewer_name,
        },
        Strategy {
            name: "profile_div",
            probe: Probe::Text(Locator::Css("div.WEBjve")),
            parse: parse_reviewer_name,
        },
        Strategy {
            name: "labelled_button",
            probe: Probe::Text(Locator::Css("[data-review-id] button[aria-label]")),
            parse: parse_reviewer_name,
        },
        Strategy {
            name: "kvmyjc",
            probe: Probe::Text(Locator::Css(".kvMYJc")),
            parse: parse_reviewer_name,
        },
        Strategy {
            name: "contributor_link",
            probe: Probe::Text(Locator::Css("a[href*='/contrib/']")),
            parse: parse_reviewer_name,
        },
    ],
};

pub static REVIEW_RATING: FieldSpec<f64> = FieldSpec {
    field: "review_rating",
    strategies: &[
        Strategy {
            name: "star_label",
            probe: Probe::Attribute(Locator::Css("[role='img'][aria-label*='star']"), "aria-label"),
            parse: parse_star_label,
        },
        Strategy {
            name: "filled_star_count",
            probe: Probe::Count(Locator::Css(".hCCjke.vzX5Ic")),
            parse: parse_star_count,
        },
    ],
};

pub static REVIEW_BODY: FieldSpec<String> = FieldSpec {
    field: "review_body",
    strategies: &[
        Strategy {
            name: "wiI7pd",
            probe: Probe::Text(Locator::Css(".wiI7pd")),
            parse: parse_body,
        },
        Strategy {
            name: "MyEned",
            probe: Probe::Text(Locator::Css(".MyEned")),
            parse: parse_body,
        },
        Strategy {
            name: "span_wiI7pd",
            probe: Probe::Text(Locator::Css("span.wiI7pd")),
            parse: parse_body,
        },
        Strategy {
            name: "nested_span",
            probe: Probe::Text(Locator::Css("[data-review-id] > div > div > div > span")),
            parse: parse_body,
        },
        Strategy {
            name: "Jtu6Td",
            probe: Probe::Text(Locator::Css(".Jtu6Td > span")),
            parse: parse_body,
        },
    ],
};

pub static REVIEW_DATE: FieldSpec<String> = FieldSpec {
    field: "review_date",
    strategies: &[
        Strategy {
            name: "rsqaWe",
            probe: Probe::Text(Locator::Css(".rsqaWe")),
            parse: parse_date_phrase,
        },
        Strategy {
            name: "span_rsqaWe",
            probe: Probe::Text(Locator::Css("span.rsqaWe")),
            parse: parse_date_phrase,
        },
        Strategy {
            name: "DU9Pgb",
            probe: Probe::Text(Locator::Css(".DU9Pgb > span")),
            parse: parse_date_phrase,
        },
        Strategy {
            name: "body_medium_span",
            probe: Probe::EachText(Locator::Css("[class*='fontBodyMedium'] span")),
            parse: parse_date_phrase,
        },
    ],
};

fn parse_reviewer_name(raw: &str) -> Option<String> {
    non_empty(raw).filter(|name| name != MORE_LABEL)
}

/// `"4 stars"`, `"1 star"`; the leading integer is the rating.
pub(crate) fn parse_star_label(raw: &str) -> Option<f64> {
    let stars: u8 = STAR_LABEL_RE.captures(raw)?.get(1)?.as_str().parse().ok()?;
    (stars <= 5).then_some(f64::from(stars))
}

fn parse_star_count(raw: &str) -> Option<f64> {
    let count: u8 = raw.parse().ok()?;
    (1..=5).contains(&count).then_some(f64::from(count))
}

pub(crate) fn parse_body(raw: &str) -> Option<String> {
    non_empty(raw).filter(|body| body != MORE_LABEL && body.chars().count() > MIN_BODY_CHARS)
}

pub(crate) fn parse_date_phrase(raw: &str) -> Option<String> {
    let phrase = non_empty(raw)?;
    let lower = phrase.to_lowercase();
    TIME_WORDS
        .iter()
        .any(|w| lower.contains(w))
        .then_some(phrase)
}

/// A review card's fields before admission and deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewCandidate {
    pub reviewer_name: String,
    pub rating: f64,
    pub text: String,
    pub relative_date: String,
}

impl ReviewCandidate {
    /// Cards with neither a rating nor a substantive body carry no signal.
    #[must_use]
    pub fn is_admissible(&self) -> bool {
        self.rating > 0.0 || self.text.chars().count() > MIN_BODY_CHARS
    }

    #[must_use]
    pub fn into_review(
        self,
        branch_locator: &str,
        collected_at: DateTime<Utc>,
    ) -> bankrev_core::Review {
        bankrev_core::Review {
            branch_locator: branch_locator.to_string(),
            reviewer_name: self.reviewer_name,
            rating: self.rating,
            text: self.text,
            relative_date: self.relative_date,
            collected_at,
        }
    }
}

/// Extract every field of one review card, applying documented defaults.
///
/// # Errors
///
/// Only fatal session errors are returned.
pub async fn extract_review<S: DocumentSession>(
    session: &S,
    block: &S::Element,
) -> Result<ReviewCandidate, SessionError> {
    let reviewer_name = extract_field(session, block, &REVIEWER_NAME)
        .await?
        .map_or_else(|| ANONYMOUS_REVIEWER.to_string(), |e| e.value);
    let rating = extract_field(session, block, &REVIEW_RATING)
        .await?
        .map_or(0.0, |e| e.value);
    let text = extract_field(session, block, &REVIEW_BODY)
        .await?
        .map(|e| e.value)
        .unwrap_or_default();
    let relative_date = extract_field(session, block, &REVIEW_DATE)
        .await?
        .map(|e| e.value)
        .unwrap_or_default();

    Ok(ReviewCandidate {
        reviewer_name,
        rating,
        text,
        relative_date,
    })
}
