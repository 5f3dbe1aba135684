//! First-match-wins field extraction over candidate blocks.
//!
//! Each field owns an ordered list of [`Strategy`] values. A strategy probes
//! the block for raw text and hands it to a validating parser; the first
//! strategy whose probe finds content that the parser accepts wins and later
//! strategies are never consulted. New strategies are appended to a table
//! without disturbing the precedence of existing ones.

pub mod detail;
pub mod listing;
pub mod review;

use crate::error::SessionError;
use crate::session::{DocumentSession, Locator};

/// Where a strategy reads its raw value from.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Text of the first matching descendant.
    Text(Locator),
    /// Text of every matching descendant, in document order.
    EachText(Locator),
    /// Attribute of the first matching descendant.
    Attribute(Locator, &'static str),
    /// Text of the block itself.
    OwnText,
    /// Attribute of the block itself.
    OwnAttribute(&'static str),
    /// Number of matching descendants, rendered as a decimal string.
    Count(Locator),
}

/// One probe paired with the parser that validates what it found.
pub struct Strategy<T: 'static> {
    pub name: &'static str,
    pub probe: Probe,
    pub parse: fn(&str) -> Option<T>,
}

/// The ordered strategy chain for one field.
pub struct FieldSpec<T: 'static> {
    pub field: &'static str,
    pub strategies: &'static [Strategy<T>],
}

/// A value together with the name of the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub strategy: &'static str,
}

/// Evaluate `spec` against `block`.
///
/// Returns `Ok(None)` when every strategy missed or produced an invalid value;
/// callers substitute the field's default.
///
/// # Errors
///
/// Only fatal session errors are returned. Locator misses and element-level
/// failures advance to the next strategy.
pub async fn extract_field<S, T>(
    session: &S,
    block: &S::Element,
    spec: &FieldSpec<T>,
) -> Result<Option<Extracted<T>>, SessionError>
where
    S: DocumentSession,
{
    for strategy in spec.strategies {
        let raw_values = match probe(session, block, strategy.probe).await {
            Ok(values) => values,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(
                    field = spec.field,
                    strategy = strategy.name,
                    error = %e,
                    "strategy probe failed"
                );
                continue;
            }
        };

        if let Some(value) = raw_values.iter().find_map(|raw| (strategy.parse)(raw.as_str())) {
            return Ok(Some(Extracted {
                value,
                strategy: strategy.name,
            }));
        }
    }

    tracing::debug!(field = spec.field, "no strategy matched; using default");
    Ok(None)
}

async fn probe<S: DocumentSession>(
    session: &S,
    block: &S::Element,
    probe: Probe,
) -> Result<Vec<String>, SessionError> {
    match probe {
        Probe::Text(locator) => match first_within(session, block, locator).await? {
            Some(el) => Ok(vec![session.text(&el).await?]),
            None => Ok(Vec::new()),
        },
        Probe::EachText(locator) => {
            let mut texts = Vec::new();
            for el in session.find_within(block, locator).await? {
                texts.push(session.text(&el).await?);
            }
            Ok(texts)
        }
        Probe::Attribute(locator, name) => match first_within(session, block, locator).await? {
            Some(el) => Ok(session.attribute(&el, name).await?.into_iter().collect()),
            None => Ok(Vec::new()),
        },
        Probe::OwnText => Ok(vec![session.text(block).await?]),
        Probe::OwnAttribute(name) => Ok(session.attribute(block, name).await?.into_iter().collect()),
        Probe::Count(locator) => {
            let found = session.find_within(block, locator).await?;
            Ok(vec![found.len().to_string()])
        }
    }
}

async fn first_within<S: DocumentSession>(
    session: &S,
    block: &S::Element,
    locator: Locator,
) -> Result<Option<S::Element>, SessionError> {
    Ok(session.find_within(block, locator).await?.into_iter().next())
}

/// Union of all elements matching any of `locators`, in locator order.
///
/// The same element may appear more than once when several locators match
/// it; run the result through [`crate::dedup::PositionFilter`].
///
/// # Errors
///
/// Only fatal session errors are returned; a locator that fails locally
/// contributes nothing.
pub async fn collect_blocks<S: DocumentSession>(
    session: &S,
    locators: &[Locator],
) -> Result<Vec<S::Element>, SessionError> {
    let mut blocks = Vec::new();
    for &locator in locators {
        match session.find_all(locator).await {
            Ok(found) => {
                if !found.is_empty() {
                    tracing::debug!(%locator, count = found.len(), "candidate blocks found");
                }
                blocks.extend(found);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::debug!(%locator, error = %e, "block locator failed"),
        }
    }
    Ok(blocks)
}

/// First element matching any of `locators`, tried in order.
///
/// # Errors
///
/// Only fatal session errors are returned.
pub async fn find_first<S: DocumentSession>(
    session: &S,
    locators: &[Locator],
) -> Result<Option<S::Element>, SessionError> {
    for &locator in locators {
        match session.find_all(locator).await {
            Ok(found) => {
                if let Some(el) = found.into_iter().next() {
                    return Ok(Some(el));
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::debug!(%locator, error = %e, "locator failed"),
        }
    }
    Ok(None)
}

/// Parser shared by text fields: trimmed, non-empty.
pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
