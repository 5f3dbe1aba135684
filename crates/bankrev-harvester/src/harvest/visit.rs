use std::time::Duration;

use bankrev_core::{Branch, NormalizedReview};

use super::Harvester;
use crate::clock::Clock;
use crate::dates::normalize_reviews;
use crate::dedup::{DedupScope, FingerprintSet, PositionFilter};
use crate::error::HarvestError;
use crate::extract::detail::REVIEW_TAB;
use crate::extract::review::{extract_review, REVIEW_BLOCKS};
use crate::extract::{collect_blocks, find_first};
use crate::scroll::{drive_scroll, ScrollPolicy, ScrollTarget};
use crate::session::DocumentSession;

/// Wait for the detail page to render after navigation.
const DETAIL_RENDER: Duration = Duration::from_secs(3);
/// Wait for the review panel after clicking its tab.
const REVIEW_TAB_RENDER: Duration = Duration::from_secs(3);
/// Wait after scrolling before reading review cards.
const REVIEW_SETTLE: Duration = Duration::from_secs(2);

impl<S, C> Harvester<'_, S, C>
where
    S: DocumentSession,
    C: Clock,
{
    /// Collect the reviews of one branch with a fresh per-visit dedup scope.
    ///
    /// # Errors
    ///
    /// [`HarvestError::BranchVisit`] when the page cannot be opened or the
    /// reviews tab cannot be clicked, [`HarvestError::NoReviewAffordance`]
    /// when no reviews tab exists, and fatal session errors.
    pub async fn visit_branch(
        &mut self,
        branch: &Branch,
    ) -> Result<Vec<NormalizedReview>, HarvestError> {
        let visit_error = |source| HarvestError::BranchVisit {
            locator: branch.locator.clone(),
            source,
        };

        self.session
            .navigate(&branch.locator)
            .await
            .map_err(visit_error)?;
        self.clock.sleep(DETAIL_RENDER).await;

        let Some(tab) = find_first(self.session, REVIEW_TAB).await? else {
            return Err(HarvestError::NoReviewAffordance {
                locator: branch.locator.clone(),
            });
        };
        self.session.click(&tab).await.map_err(visit_error)?;
        self.clock.sleep(REVIEW_TAB_RENDER).await;

        let report = drive_scroll(
            self.session,
            self.clock,
            ScrollTarget::REVIEWS,
            ScrollPolicy::REVIEWS,
        )
        .await?;
        tracing::debug!(
            locator = %branch.locator,
            rounds = report.rounds,
            items = report.item_count,
            stop = ?report.stop,
            "review panel scrolled"
        );
        self.clock.sleep(REVIEW_SETTLE).await;

        let blocks = collect_blocks(self.session, REVIEW_BLOCKS).await?;
        let blocks = PositionFilter::new()
            .retain_unseen(self.session, blocks)
            .await?;

        let mut seen = FingerprintSet::new(DedupScope::BranchVisit {
            locator: branch.locator.clone(),
        });
        let collected_at = self.clock.now();
        let mut reviews = Vec::new();

        for block in &blocks {
            let candidate = extract_review(self.session, block).await?;
            if !candidate.is_admissible() {
                tracing::trace!(locator = %branch.locator, "review card without rating or body skipped");
                continue;
            }
            if seen.admit(&candidate) {
                reviews.push(candidate.into_review(&branch.locator, collected_at));
            }
        }

        Ok(normalize_reviews(reviews))
    }
}
