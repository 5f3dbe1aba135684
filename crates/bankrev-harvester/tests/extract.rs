//! Field extraction, block collection and position filtering.

mod support;

use bankrev_harvester::extract::listing::{extract_branch, LISTING_BLOCKS};
use bankrev_harvester::extract::review::{extract_review, REVIEW_BLOCKS};
use bankrev_harvester::extract::{collect_blocks, extract_field, FieldSpec, Probe, Strategy};
use bankrev_harvester::{DocumentSession, Locator, PositionFilter, SessionError};

use support::{listing_card, review_card, FakeSession, NodeSpec};

const PAGE: &str = "https://maps.example/page";

fn accept_long(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (trimmed.len() > 5 && trimmed != "More").then(|| trimmed.to_string())
}

static CHAIN: FieldSpec<String> = FieldSpec {
    field: "chain",
    strategies: &[
        Strategy {
            name: "s1_missing",
            probe: Probe::Text(Locator::Css(".absent")),
            parse: accept_long,
        },
        Strategy {
            name: "s2_invalid",
            probe: Probe::Text(Locator::Css(".more-button")),
            parse: accept_long,
        },
        Strategy {
            name: "s3_valid",
            probe: Probe::Text(Locator::Css(".body")),
            parse: accept_long,
        },
        Strategy {
            name: "s4_never_reached",
            probe: Probe::Text(Locator::Css(".other-body")),
            parse: accept_long,
        },
    ],
};

fn session_with(block: NodeSpec) -> FakeSession {
    let mut session = FakeSession::new();
    session.add_page(PAGE, vec![block.matching(Locator::Css(".block"))]);
    session.open(PAGE);
    session
}

async fn only_block(session: &FakeSession) -> usize {
    let blocks = session.find_all(Locator::Css(".block")).await.unwrap();
    assert_eq!(blocks.len(), 1);
    blocks[0]
}

#[tokio::test]
async fn first_valid_strategy_wins_over_missing_and_invalid() {
    let block = NodeSpec::new()
        .child(NodeSpec::new().matching(Locator::Css(".more-button")).text("More"))
        .child(NodeSpec::new().matching(Locator::Css(".body")).text("Guichet rapide"))
        .child(
            NodeSpec::new()
                .matching(Locator::Css(".other-body"))
                .text("Should not be read"),
        );
    let session = session_with(block);
    let block = only_block(&session).await;

    let extracted = extract_field(&session, &block, &CHAIN).await.unwrap().unwrap();

    assert_eq!(extracted.strategy, "s3_valid");
    assert_eq!(extracted.value, "Guichet rapide");
}

#[tokio::test]
async fn local_probe_failure_falls_through() {
    let block = NodeSpec::new()
        .child(
            NodeSpec::new()
                .matching(Locator::Css(".more-button"))
                .text("Long enough text")
                .stale(),
        )
        .child(NodeSpec::new().matching(Locator::Css(".body")).text("Agence propre"));
    let session = session_with(block);
    let block = only_block(&session).await;

    let extracted = extract_field(&session, &block, &CHAIN).await.unwrap().unwrap();

    assert_eq!(extracted.strategy, "s3_valid");
}

#[tokio::test]
async fn all_strategies_missing_yields_none() {
    let session = session_with(NodeSpec::new());
    let block = only_block(&session).await;

    assert!(extract_field(&session, &block, &CHAIN).await.unwrap().is_none());
}

#[tokio::test]
async fn review_defaults_apply_when_card_is_empty() {
    let session = session_with(NodeSpec::new());
    let block = only_block(&session).await;

    let candidate = extract_review(&session, &block).await.unwrap();

    assert_eq!(candidate.reviewer_name, "Anonymous");
    assert!(candidate.rating.abs() < f64::EPSILON);
    assert!(candidate.text.is_empty());
    assert!(candidate.relative_date.is_empty());
    assert!(!candidate.is_admissible());
}

#[tokio::test]
async fn review_rating_falls_back_to_filled_star_count() {
    let mut block = NodeSpec::new().child(
        NodeSpec::new()
            .matching(Locator::Css(".d4r55"))
            .text("More"),
    );
    for _ in 0..3 {
        block = block.child(NodeSpec::new().matching(Locator::Css(".hCCjke.vzX5Ic")));
    }
    block = block.child(
        NodeSpec::new()
            .matching(Locator::Css("a[href*='/contrib/']"))
            .text("Nadia B."),
    );
    let session = session_with(block);
    let block = only_block(&session).await;

    let candidate = extract_review(&session, &block).await.unwrap();

    assert_eq!(candidate.reviewer_name, "Nadia B.");
    assert!((candidate.rating - 3.0).abs() < f64::EPSILON);
    assert!(candidate.is_admissible());
}

#[tokio::test]
async fn review_card_fields_are_read() {
    let session = session_with(review_card(
        "Youssef",
        2,
        "Attente beaucoup trop longue",
        "3 months ago",
        100,
    ));
    let block = only_block(&session).await;

    let candidate = extract_review(&session, &block).await.unwrap();

    assert_eq!(candidate.reviewer_name, "Youssef");
    assert!((candidate.rating - 2.0).abs() < f64::EPSILON);
    assert_eq!(candidate.text, "Attente beaucoup trop longue");
    assert_eq!(candidate.relative_date, "3 months ago");
}

#[tokio::test]
async fn listing_card_extracts_branch() {
    let session = session_with(listing_card(
        "https://maps.example/place/cih-agdal",
        "CIH Bank Agdal",
        10,
        100,
    ));
    let block = only_block(&session).await;

    let branch = extract_branch(&session, &block, "CIH Bank")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(branch.organization, "CIH Bank");
    assert_eq!(branch.name, "CIH Bank Agdal");
    assert_eq!(branch.locator, "https://maps.example/place/cih-agdal");
    assert_eq!(branch.address, "CIH Bank Agdal Avenue Mohammed V");
    assert_eq!(branch.rating, Some(4.1));
    assert_eq!(branch.review_count, Some(12));
}

#[tokio::test]
async fn listing_card_name_defaults_to_organization() {
    let block = NodeSpec::new().child(
        NodeSpec::new()
            .matching(Locator::Css("a.hfpxzc"))
            .attr("href", "https://maps.example/place/x"),
    );
    let session = session_with(block);
    let block = only_block(&session).await;

    let branch = extract_branch(&session, &block, "Bank of Africa")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(branch.name, "Bank of Africa");
    assert!(branch.address.is_empty());
    assert_eq!(branch.rating, None);
    assert_eq!(branch.review_count, None);
}

#[tokio::test]
async fn listing_card_without_link_is_skipped() {
    let block = NodeSpec::new().child(
        NodeSpec::new()
            .matching(Locator::Css("div.qBF1Pd.fontHeadlineSmall"))
            .text("Orphan"),
    );
    let session = session_with(block);
    let block = only_block(&session).await;

    assert!(extract_branch(&session, &block, "CIH Bank")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn overlapping_block_locators_are_collapsed_by_position() {
    let mut session = FakeSession::new();
    session.add_page(
        PAGE,
        vec![
            review_card("A", 5, "", "a day ago", 100).matching(REVIEW_BLOCKS[3]),
            review_card("B", 4, "", "a day ago", 200).matching(REVIEW_BLOCKS[1]),
            NodeSpec::new().matching(REVIEW_BLOCKS[2]),
        ],
    );
    session.open(PAGE);

    let blocks = collect_blocks(&session, REVIEW_BLOCKS).await.unwrap();
    assert_eq!(blocks.len(), 5);

    let unique = PositionFilter::new()
        .retain_unseen(&session, blocks)
        .await
        .unwrap();
    // The third node has no layout and is dropped.
    assert_eq!(unique.len(), 2);
}

#[tokio::test]
async fn fatal_error_stops_extraction() {
    let mut session = FakeSession::new();
    session.add_page(PAGE, vec![listing_card("https://x", "X", 0, 0)]);
    session.disconnect_on("https://maps.example/crash");
    session.open(PAGE);
    let blocks = collect_blocks(&session, LISTING_BLOCKS).await.unwrap();

    assert!(session.navigate("https://maps.example/crash").await.is_err());
    let err = extract_branch(&session, &blocks[0], "X").await.unwrap_err();
    assert!(matches!(err, SessionError::Disconnected(_)));
}
