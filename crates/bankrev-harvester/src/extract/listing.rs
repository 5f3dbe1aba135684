//! Strategy tables for search-result listing cards.

use bankrev_core::Branch;

use super::{extract_field, non_empty, FieldSpec, Probe, Strategy};
use crate::error::SessionError;
use crate::session::{DocumentSession, Locator};

/// Result-card containers. Both locators resolve to the same cards on current
/// markup, so the union is position-filtered before extraction.
pub const LISTING_BLOCKS: &[Locator] = &[
    Locator::XPath("//a[contains(@class, 'hfpxzc')]/parent::div/parent::div"),
    Locator::Css("div.Nv2PK"),
];

/// Items counted while scrolling the result feed.
pub const LISTING_ITEMS: Locator = Locator::Css("a.hfpxzc");

/// Scrollable result feed candidates.
pub const LISTING_REGIONS: &[Locator] = &[
    Locator::Css("[role='main'] [tabindex='-1']"),
    Locator::Css("[role='main'] > div > div"),
];

/// Search results region awaited after a search.
pub const RESULTS_REGION: Locator = Locator::Css("[role='main']");

const ADDRESS_MARKERS: &[&str] = &["bd", "avenue", "rue", "street", "·"];

pub static BRANCH_LOCATOR: FieldSpec<String> = FieldSpec {
    field: "branch_locator",
    strategies: &[Strategy {
        name: "result_link_href",
        probe: Probe::Attribute(Locator::Css("a.hfpxzc"), "href"),
        parse: non_empty,
    }],
};

pub static BRANCH_NAME: FieldSpec<String> = FieldSpec {
    field: "branch_name",
    strategies: &[
        Strategy {
            name: "headline",
            probe: Probe::Text(Locator::Css("div.qBF1Pd.fontHeadlineSmall")),
            parse: non_empty,
        },
        Strategy {
            name: "result_link_label",
            probe: Probe::Attribute(Locator::Css("a.hfpxzc"), "aria-label"),
            parse: non_empty,
        },
    ],
};

pub static BRANCH_ADDRESS: FieldSpec<String> = FieldSpec {
    field: "branch_address",
    strategies: &[Strategy {
        name: "detail_line",
        probe: Probe::EachText(Locator::Css("div.W4Efsd")),
        parse: parse_address_line,
    }],
};

pub static BRANCH_RATING: FieldSpec<f64> = FieldSpec {
    field: "branch_rating",
    strategies: &[Strategy {
        name: "rating_badge",
        probe: Probe::Text(Locator::Css("span.MW4etd")),
        parse: parse_rating,
    }],
};

pub static BRANCH_REVIEW_COUNT: FieldSpec<u32> = FieldSpec {
    field: "branch_review_count",
    strategies: &[Strategy {
        name: "review_count_badge",
        probe: Probe::Text(Locator::Css("span.UY7F9")),
        parse: parse_review_count,
    }],
};

/// Pick the address out of a listing detail line such as
/// `"Banque · 12 Avenue Hassan II · Open"`.
///
/// Lines without an address marker are rejected so the next line is tried.
pub(crate) fn parse_address_line(raw: &str) -> Option<String> {
    let lower = raw.to_lowercase();
    if !ADDRESS_MARKERS.iter().any(|m| lower.contains(m)) {
        return None;
    }
    let mut parts = raw.split('·');
    let first = parts.next();
    let address = parts.next().or(first)?;
    non_empty(address)
}

/// Ratings are shown with either decimal separator (`4.3`, `4,3`).
pub(crate) fn parse_rating(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().replace(',', ".").parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Review counts are parenthesized and may carry grouping: `(1,204)`.
pub(crate) fn parse_review_count(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .trim_matches(|c| c == '(' || c == ')')
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    digits.parse().ok()
}

/// Extract one [`Branch`] from a listing card.
///
/// Returns `Ok(None)` when the card has no detail-page link: a branch without
/// a locator cannot be identified or visited.
///
/// # Errors
///
/// Only fatal session errors are returned.
pub async fn extract_branch<S: DocumentSession>(
    session: &S,
    block: &S::Element,
    organization: &str,
) -> Result<Option<Branch>, SessionError> {
    let Some(locator) = extract_field(session, block, &BRANCH_LOCATOR).await? else {
        tracing::debug!(organization, "listing card without detail link skipped");
        return Ok(None);
    };

    let name = extract_field(session, block, &BRANCH_NAME)
        .await?
        .map_or_else(|| organization.to_string(), |e| e.value);
    let address = extract_field(session, block, &BRANCH_ADDRESS)
        .await?
        .map(|e| e.value)
        .unwrap_or_default();
    let rating = extract_field(session, block, &BRANCH_RATING)
        .await?
        .map(|e| e.value);
    let review_count = extract_field(session, block, &BRANCH_REVIEW_COUNT)
        .await?
        .map(|e| e.value);

    Ok(Some(Branch {
        organization: organization.to_string(),
        name,
        locator: locator.value,
        address,
        rating,
        review_count,
    }))
}
