//! Address enrichment from branch detail pages.
//!
//! Listing cards carry only a fragment of the postal address. Enrichment
//! revisits each branch page and reads the full address and phone number.

use std::collections::HashMap;
use std::time::Duration;

use bankrev_core::Branch;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::SessionError;
use crate::extract::detail::{PLACE_ADDRESS, PLACE_PHONE, PLACE_ROOT};
use crate::extract::{extract_field, find_first};
use crate::session::DocumentSession;

/// Wait after navigating before reading the place panel.
const RENDER_WAIT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchDetails {
    pub locator: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl BranchDetails {
    fn empty(locator: &str) -> Self {
        Self {
            locator: locator.to_string(),
            address: None,
            phone: None,
        }
    }
}

/// Visit `branch` and read its full address and phone number.
///
/// Local failures are logged and leave the fields `None`.
///
/// # Errors
///
/// Only fatal session errors are returned.
pub async fn enrich_branch<S, C>(
    session: &S,
    clock: &C,
    branch: &Branch,
) -> Result<BranchDetails, SessionError>
where
    S: DocumentSession,
    C: Clock,
{
    if let Err(e) = session.navigate(&branch.locator).await {
        if e.is_fatal() {
            return Err(e);
        }
        tracing::warn!(
            branch = %branch.name,
            locator = %branch.locator,
            error = %e,
            "branch page unreachable; enrichment skipped"
        );
        return Ok(BranchDetails::empty(&branch.locator));
    }
    clock.sleep(RENDER_WAIT).await;

    let Some(root) = find_first(session, PLACE_ROOT).await? else {
        tracing::warn!(locator = %branch.locator, "place panel not found");
        return Ok(BranchDetails::empty(&branch.locator));
    };

    let address = extract_field(session, &root, &PLACE_ADDRESS)
        .await?
        .map(|e| e.value);
    let phone = extract_field(session, &root, &PLACE_PHONE)
        .await?
        .map(|e| e.value);

    if address.is_none() {
        tracing::warn!(branch = %branch.name, locator = %branch.locator, "no address on branch page");
    }

    Ok(BranchDetails {
        locator: branch.locator.clone(),
        address,
        phone,
    })
}

/// Details gathered by [`enrich_branches`], with the fatal error that cut
/// the pass short, if any.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub details: Vec<BranchDetails>,
    pub error: Option<SessionError>,
}

/// Enrich `branches` in order, pausing `delay` after each visit.
///
/// A fatal session error stops the pass; the details gathered before it are
/// kept in the outcome alongside the error.
pub async fn enrich_branches<S, C>(
    session: &S,
    clock: &C,
    branches: &[Branch],
    delay: Duration,
) -> EnrichOutcome
where
    S: DocumentSession,
    C: Clock,
{
    let total = branches.len();
    let mut outcome = EnrichOutcome {
        details: Vec::with_capacity(total),
        error: None,
    };
    for (idx, branch) in branches.iter().enumerate() {
        tracing::info!(
            branch = %branch.name,
            position = idx + 1,
            total,
            "enriching branch"
        );
        match enrich_branch(session, clock, branch).await {
            Ok(details) => outcome.details.push(details),
            Err(e) => {
                tracing::error!(
                    locator = %branch.locator,
                    enriched = outcome.details.len(),
                    error = %e,
                    "enrichment aborted"
                );
                outcome.error = Some(e);
                break;
            }
        }
        clock.sleep(delay).await;
    }
    outcome
}

/// Replace each branch's raw address with its enriched one where available.
#[must_use]
pub fn apply_enrichment(branches: Vec<Branch>, details: &[BranchDetails]) -> Vec<Branch> {
    let by_locator: HashMap<&str, Option<&str>> = details
        .iter()
        .map(|d| (d.locator.as_str(), d.address.as_deref()))
        .collect();
    branches
        .into_iter()
        .map(|branch| {
            let enriched = by_locator.get(branch.locator.as_str()).copied().flatten();
            branch.with_address(enriched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(locator: &str, address: &str) -> Branch {
        Branch {
            organization: "Bank of Africa".to_string(),
            name: "BOA Agdal".to_string(),
            locator: locator.to_string(),
            address: address.to_string(),
            rating: Some(4.1),
            review_count: Some(12),
        }
    }

    #[test]
    fn apply_enrichment_replaces_only_found_addresses() {
        let branches = vec![branch("a", "Av. France"), branch("b", "Rue 7")];
        let details = vec![
            BranchDetails {
                locator: "a".to_string(),
                address: Some("12 Avenue de France, Rabat".to_string()),
                phone: None,
            },
            BranchDetails::empty("b"),
        ];
        let enriched = apply_enrichment(branches, &details);
        assert_eq!(enriched[0].address, "12 Avenue de France, Rabat");
        assert_eq!(enriched[1].address, "Rue 7");
    }
}
