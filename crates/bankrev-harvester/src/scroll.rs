//! Drives an infinite-scroll region until its item count stabilizes.
//!
//! There is no authoritative end-of-list signal, so the drive stops after the
//! visible item count has stayed the same for [`ScrollPolicy::stable_rounds`]
//! consecutive rounds, or at the policy's round cap.

use std::time::Duration;

use crate::clock::Clock;
use crate::error::SessionError;
use crate::extract::{detail, listing};
use crate::session::{DocumentSession, Locator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPolicy {
    pub max_rounds: u32,
    pub stable_rounds: u32,
    /// Pause after each scroll for content to materialize.
    pub pause: Duration,
    /// Pause after hovering the region, before the first round.
    pub settle: Duration,
    /// A region qualifies only when its scroll height exceeds this.
    pub min_region_height: i64,
}

impl ScrollPolicy {
    pub const LISTING: Self = Self {
        max_rounds: 20,
        stable_rounds: 3,
        pause: Duration::from_secs(2),
        settle: Duration::from_secs(1),
        min_region_height: 0,
    };

    pub const REVIEWS: Self = Self {
        max_rounds: 10,
        stable_rounds: 3,
        pause: Duration::from_secs(2),
        settle: Duration::from_secs(1),
        min_region_height: 500,
    };
}

/// What to scroll and what to count.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTarget {
    pub regions: &'static [Locator],
    pub items: Locator,
}

impl ScrollTarget {
    pub const LISTING: Self = Self {
        regions: listing::LISTING_REGIONS,
        items: listing::LISTING_ITEMS,
    };

    pub const REVIEWS: Self = Self {
        regions: detail::REVIEW_PANEL_REGIONS,
        items: crate::extract::review::REVIEW_ITEMS,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Count unchanged for the policy's stable rounds.
    Stable,
    RoundCap,
    /// No candidate region was tall enough to scroll.
    NoRegion,
    /// A non-fatal session error cut the drive short.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    pub rounds: u32,
    pub item_count: usize,
    pub stop: StopReason,
}

/// Counters for one drive.
#[derive(Debug, Default, Clone, Copy)]
struct ScrollState {
    last_count: usize,
    unchanged: u32,
    rounds: u32,
}

impl ScrollState {
    /// Record the count measured in the current round. Returns `true` once
    /// the count has been unchanged for `stable_rounds` rounds in a row.
    fn observe(&mut self, count: usize, stable_rounds: u32) -> bool {
        if count == self.last_count {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
        }
        self.last_count = count;
        self.unchanged >= stable_rounds
    }

    fn report(self, stop: StopReason) -> ScrollReport {
        ScrollReport {
            rounds: self.rounds,
            item_count: self.last_count,
            stop,
        }
    }
}

/// Scroll `target` until stable or capped.
///
/// # Errors
///
/// Only fatal session errors are returned. A missing region yields a
/// [`StopReason::NoRegion`] report with zero rounds; other local failures end
/// the drive with [`StopReason::Interrupted`].
pub async fn drive_scroll<S, C>(
    session: &S,
    clock: &C,
    target: ScrollTarget,
    policy: ScrollPolicy,
) -> Result<ScrollReport, SessionError>
where
    S: DocumentSession,
    C: Clock,
{
    let mut state = ScrollState::default();

    let Some(region) = locate_region(session, target.regions, policy.min_region_height).await?
    else {
        tracing::warn!(items = %target.items, "no scrollable region found; using visible items");
        state.last_count = match session.find_all(target.items).await {
            Ok(items) => items.len(),
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => 0,
        };
        return Ok(state.report(StopReason::NoRegion));
    };

    if let Err(e) = session.hover(&region).await {
        if e.is_fatal() {
            return Err(e);
        }
        tracing::debug!(error = %e, "hover over scroll region failed");
    }
    clock.sleep(policy.settle).await;

    while state.rounds < policy.max_rounds {
        state.rounds += 1;

        let count = match session.find_all(target.items).await {
            Ok(items) => items.len(),
            Err(e) => return interrupted(state, e),
        };
        tracing::debug!(round = state.rounds, count, "scroll round");

        if let Err(e) = session.scroll_to_end(&region).await {
            state.last_count = count;
            return interrupted(state, e);
        }
        clock.sleep(policy.pause).await;

        if state.observe(count, policy.stable_rounds) {
            tracing::info!(rounds = state.rounds, count, "scroll stabilized");
            return Ok(state.report(StopReason::Stable));
        }
    }

    // The last round's scroll may have loaded more items.
    match session.find_all(target.items).await {
        Ok(items) => state.last_count = items.len(),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => tracing::debug!(error = %e, "final item count failed"),
    }
    tracing::info!(
        rounds = state.rounds,
        count = state.last_count,
        "scroll round cap reached"
    );
    Ok(state.report(StopReason::RoundCap))
}

fn interrupted(state: ScrollState, e: SessionError) -> Result<ScrollReport, SessionError> {
    if e.is_fatal() {
        return Err(e);
    }
    tracing::error!(rounds = state.rounds, error = %e, "scroll interrupted");
    Ok(state.report(StopReason::Interrupted))
}

async fn locate_region<S: DocumentSession>(
    session: &S,
    candidates: &[Locator],
    min_height: i64,
) -> Result<Option<S::Element>, SessionError> {
    for &locator in candidates {
        let elements = match session.find_all(locator).await {
            Ok(found) => found,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(%locator, error = %e, "region locator failed");
                continue;
            }
        };
        for element in elements {
            match session.scroll_height(&element).await {
                Ok(height) if height > min_height => {
                    tracing::debug!(%locator, height, "scroll region found");
                    return Ok(Some(element));
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::debug!(%locator, error = %e, "scroll height unreadable"),
            }
        }
    }
    Ok(None)
}
