//! Locators and strategy tables for a branch detail page.

use super::{non_empty, FieldSpec, Probe, Strategy};
use crate::session::Locator;

/// Candidates for the reviews tab, most specific first.
pub const REVIEW_TAB: &[Locator] = &[
    Locator::XPath("//button[contains(@aria-label, 'Reviews')]"),
    Locator::XPath("//button[contains(., 'Reviews')]"),
    Locator::XPath("//div[@role='tab'][contains(., 'Reviews')]"),
    Locator::XPath("//button[@data-tab-index='1']"),
];

/// Scrollable review panel candidates.
pub const REVIEW_PANEL_REGIONS: &[Locator] = &[
    Locator::Css("[role='main'] [tabindex='-1']"),
    Locator::Css("[data-review-id]"),
    Locator::Css(".m6QErb.DxyBCb.kA9KIf.dS8AEf"),
];

/// Element the place-information fields are read from.
pub const PLACE_ROOT: &[Locator] = &[Locator::Css("[role='main']"), Locator::Css("body")];

pub static PLACE_ADDRESS: FieldSpec<String> = FieldSpec {
    field: "place_address",
    strategies: &[
        Strategy {
            name: "address_item_label",
            probe: Probe::Attribute(Locator::Css("button[data-item-id='address']"), "aria-label"),
            parse: parse_address_label,
        },
        Strategy {
            name: "address_item_text",
            probe: Probe::Text(Locator::Css("button[data-item-id='address'] .Io6YTe")),
            parse: non_empty,
        },
        Strategy {
            name: "labelled_address_button",
            probe: Probe::Attribute(Locator::Css("button[aria-label*='Address:']"), "aria-label"),
            parse: parse_address_label,
        },
        Strategy {
            name: "copy_address_label",
            probe: Probe::Attribute(Locator::Css("[data-tooltip='Copy address']"), "aria-label"),
            parse: parse_address_label,
        },
        Strategy {
            name: "copy_address_text",
            probe: Probe::Text(Locator::Css("[data-tooltip='Copy address'] .Io6YTe")),
            parse: non_empty,
        },
        Strategy {
            name: "info_line",
            probe: Probe::Text(Locator::Css("div.rogA2c .Io6YTe")),
            parse: non_empty,
        },
    ],
};

pub static PLACE_PHONE: FieldSpec<String> = FieldSpec {
    field: "place_phone",
    strategies: &[Strategy {
        name: "phone_item_label",
        probe: Probe::Attribute(Locator::Css("button[data-item-id='phone']"), "aria-label"),
        parse: parse_phone_label,
    }],
};

/// `"Address: 12 Rue Patrice Lumumba, Rabat"` → the address.
pub(crate) fn parse_address_label(raw: &str) -> Option<String> {
    if !raw.contains("Address:") {
        return None;
    }
    non_empty(&raw.replace("Address:", ""))
}

pub(crate) fn parse_phone_label(raw: &str) -> Option<String> {
    non_empty(&raw.replace("Phone:", ""))
}
