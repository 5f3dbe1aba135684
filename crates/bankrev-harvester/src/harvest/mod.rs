//! Harvest orchestration across organizations, localities and branches.
//!
//! Per organization: search each locality, scroll the result feed, extract
//! and deduplicate branch cards, then visit every branch to collect its
//! reviews. Branch-level failures are logged and recorded as zero reviews;
//! only fatal session errors stop the run.

mod visit;

use std::time::Duration;

use bankrev_core::{AppConfig, Branch, NormalizedReview, OrganizationTarget, TargetsFile};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::clock::Clock;
use crate::dedup::{DedupScope, FingerprintSet, PositionFilter};
use crate::error::{HarvestError, SessionError, SinkError};
use crate::extract::collect_blocks;
use crate::extract::listing::{extract_branch, LISTING_BLOCKS, RESULTS_REGION};
use crate::scroll::{drive_scroll, ScrollPolicy, ScrollTarget};
use crate::session::DocumentSession;

pub const DEFAULT_SEARCH_BASE: &str = "https://www.google.com/maps/search/";

/// Wait after issuing a search before looking for results.
const SEARCH_SETTLE: Duration = Duration::from_secs(5);
/// Wait after the results region appeared.
const RESULTS_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Budget for the results region to render after a search.
    pub wait_time: Duration,
    pub max_branches_per_org: Option<usize>,
    /// Pause after every branch visit, successful or not.
    pub branch_delay: Duration,
    pub locality_delay: Duration,
    pub organization_delay: Duration,
    /// Save a progress checkpoint after each organization.
    pub progress_saves: bool,
    pub search_base: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(15),
            max_branches_per_org: None,
            branch_delay: Duration::from_secs(5),
            locality_delay: Duration::from_secs(3),
            organization_delay: Duration::from_secs(10),
            progress_saves: false,
            search_base: DEFAULT_SEARCH_BASE.to_string(),
        }
    }
}

impl HarvestConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            wait_time: Duration::from_secs(config.wait_time_secs),
            max_branches_per_org: config.max_branches_per_org,
            branch_delay: Duration::from_millis(config.branch_delay_ms),
            locality_delay: Duration::from_millis(config.locality_delay_ms),
            organization_delay: Duration::from_millis(config.organization_delay_ms),
            progress_saves: config.progress_saves,
            ..Self::default()
        }
    }

    /// Search URL for `organization`, optionally narrowed to `locality`,
    /// with `country` appended.
    #[must_use]
    pub fn search_url(
        &self,
        organization: &str,
        locality: Option<&str>,
        country: Option<&str>,
    ) -> String {
        let query = [Some(organization), locality, country]
            .into_iter()
            .flatten()
            .flat_map(str::split_whitespace)
            .map(|word| utf8_percent_encode(word, NON_ALPHANUMERIC).to_string())
            .collect::<Vec<_>>()
            .join("+");
        format!("{}{query}", self.search_base)
    }
}

/// Everything admitted during a run. Reviews are date-normalized as they are
/// admitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarvestOutput {
    pub branches: Vec<Branch>,
    pub reviews: Vec<NormalizedReview>,
}

impl HarvestOutput {
    #[must_use]
    pub fn reviews_for(&self, locator: &str) -> usize {
        self.reviews
            .iter()
            .filter(|r| r.branch_locator == locator)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Checkpoint after an organization.
    Progress,
    /// End of run, including runs stopped by a fatal error.
    Final,
}

/// Persistence collaborator invoked at run boundaries.
pub trait RecordSink {
    /// # Errors
    ///
    /// Returns [`SinkError`] if the output cannot be written.
    fn save(&mut self, output: &HarvestOutput, kind: SaveKind) -> Result<(), SinkError>;
}

/// Sequential harvester over one borrowed session.
pub struct Harvester<'a, S, C> {
    session: &'a S,
    clock: &'a C,
    config: &'a HarvestConfig,
    seen_branches: FingerprintSet,
    output: HarvestOutput,
}

impl<'a, S, C> Harvester<'a, S, C>
where
    S: DocumentSession,
    C: Clock,
{
    #[must_use]
    pub fn new(session: &'a S, clock: &'a C, config: &'a HarvestConfig) -> Self {
        Self {
            session,
            clock,
            config,
            seen_branches: FingerprintSet::new(DedupScope::Run),
            output: HarvestOutput::default(),
        }
    }

    #[must_use]
    pub fn output(&self) -> &HarvestOutput {
        &self.output
    }

    #[must_use]
    pub fn into_output(self) -> HarvestOutput {
        self.output
    }

    /// Harvest every organization in `targets`.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; everything admitted before it stays in
    /// [`Self::output`].
    pub async fn harvest_all<K: RecordSink>(
        &mut self,
        targets: &TargetsFile,
        sink: &mut K,
    ) -> Result<(), HarvestError> {
        let total = targets.organizations.len();
        for (idx, org) in targets.organizations.iter().enumerate() {
            if idx > 0 {
                self.clock.sleep(self.config.organization_delay).await;
            }
            tracing::info!(
                organization = %org.name,
                position = idx + 1,
                total,
                "harvesting organization"
            );

            self.harvest_organization(org, targets.localities_for(org), targets.country.as_deref())
                .await?;

            if self.config.progress_saves {
                if let Err(e) = sink.save(&self.output, SaveKind::Progress) {
                    tracing::warn!(organization = %org.name, error = %e, "progress save failed");
                }
            }
        }
        Ok(())
    }

    /// Search, deduplicate and visit the branches of one organization.
    ///
    /// # Errors
    ///
    /// Returns fatal errors only.
    pub async fn harvest_organization(
        &mut self,
        org: &OrganizationTarget,
        localities: &[String],
        country: Option<&str>,
    ) -> Result<(), HarvestError> {
        let start = self.output.branches.len();
        if localities.is_empty() {
            let found = self.search_branches(&org.name, None, country).await?;
            self.record_branches(&org.name, start, found);
        } else {
            for (idx, locality) in localities.iter().enumerate() {
                if idx > 0 {
                    self.clock.sleep(self.config.locality_delay).await;
                }
                let found = self
                    .search_branches(&org.name, Some(locality), country)
                    .await?;
                tracing::info!(
                    organization = %org.name,
                    locality = %locality,
                    found = found.len(),
                    "locality searched"
                );
                self.record_branches(&org.name, start, found);
            }
        }

        let branches = self.output.branches[start..].to_vec();
        tracing::info!(organization = %org.name, branches = branches.len(), "unique branches found");

        let total = branches.len();
        for (idx, branch) in branches.iter().enumerate() {
            tracing::info!(
                branch = %branch.name,
                locator = %branch.locator,
                position = idx + 1,
                total,
                "visiting branch"
            );
            match self.visit_branch(branch).await {
                Ok(reviews) => {
                    tracing::info!(branch = %branch.name, reviews = reviews.len(), "reviews collected");
                    self.output.reviews.extend(reviews);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        branch = %branch.name,
                        locator = %branch.locator,
                        error = %e,
                        "branch visit failed; recording zero reviews"
                    );
                }
            }
            self.clock.sleep(self.config.branch_delay).await;
        }

        Ok(())
    }

    /// Append `found` to the run output, keeping at most the per-organization
    /// cap counted from `start`.
    fn record_branches(&mut self, organization: &str, start: usize, mut found: Vec<Branch>) {
        if let Some(cap) = self.config.max_branches_per_org {
            let room = cap.saturating_sub(self.output.branches.len() - start);
            if found.len() > room {
                tracing::info!(
                    organization,
                    dropped = found.len() - room,
                    cap,
                    "branch cap applied"
                );
                found.truncate(room);
            }
        }
        self.output.branches.extend(found);
    }

    /// Run one search and return the branches not seen earlier in the run.
    async fn search_branches(
        &mut self,
        organization: &str,
        locality: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<Branch>, SessionError> {
        let url = self.config.search_url(organization, locality, country);
        tracing::info!(organization, locality, url = %url, "searching");

        if let Err(e) = self.session.navigate(&url).await {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::error!(organization, locality, error = %e, "search navigation failed");
            return Ok(Vec::new());
        }
        self.clock.sleep(SEARCH_SETTLE).await;

        match self
            .session
            .wait_for(RESULTS_REGION, self.config.wait_time)
            .await
        {
            Ok(()) => self.clock.sleep(RESULTS_SETTLE).await,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::error!(organization, locality, error = %e, "search results did not render");
            }
        }

        let report = drive_scroll(self.session, self.clock, ScrollTarget::LISTING, ScrollPolicy::LISTING).await?;
        tracing::debug!(
            rounds = report.rounds,
            items = report.item_count,
            stop = ?report.stop,
            "listing scrolled"
        );

        let blocks = collect_blocks(self.session, LISTING_BLOCKS).await?;
        let blocks = PositionFilter::new()
            .retain_unseen(self.session, blocks)
            .await?;

        let mut admitted = Vec::new();
        for block in &blocks {
            let Some(branch) = extract_branch(self.session, block, organization).await? else {
                continue;
            };
            if self.seen_branches.admit(&branch) {
                admitted.push(branch);
            }
        }
        Ok(admitted)
    }
}

/// Harvest `targets` with `session`, then save and close.
///
/// A `Final` save is always attempted, including after a fatal error, and the
/// session is always closed.
///
/// # Errors
///
/// Returns the fatal error that stopped the harvest, or the final save
/// failure when the harvest itself succeeded.
pub async fn run_harvest<S, C, K>(
    session: S,
    clock: &C,
    config: &HarvestConfig,
    targets: &TargetsFile,
    sink: &mut K,
) -> Result<HarvestOutput, HarvestError>
where
    S: DocumentSession,
    C: Clock,
    K: RecordSink,
{
    let mut harvester = Harvester::new(&session, clock, config);
    let result = harvester.harvest_all(targets, sink).await;
    let output = harvester.into_output();

    if let Err(e) = &result {
        tracing::error!(
            error = %e,
            branches = output.branches.len(),
            reviews = output.reviews.len(),
            "harvest aborted; saving partial output"
        );
    }

    let saved = sink.save(&output, SaveKind::Final);
    if let Err(e) = &saved {
        tracing::error!(error = %e, "final save failed");
    }

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    result?;
    saved?;

    tracing::info!(
        branches = output.branches.len(),
        reviews = output.reviews.len(),
        "harvest complete"
    );
    Ok(output)
}
