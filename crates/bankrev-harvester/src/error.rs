use thiserror::Error;

/// Failures reported by a [`crate::session::DocumentSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no element matches {locator}")]
    NotFound { locator: String },

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    /// Element went stale, could not be interacted with, a script failed, or a
    /// page could not be loaded.
    #[error("element interaction failed: {0}")]
    Interaction(String),

    /// The rendering service is gone or the session is no longer usable.
    #[error("browser session lost: {0}")]
    Disconnected(String),

    #[error("webdriver error: {0}")]
    WebDriver(String),
}

impl SessionError {
    /// Returns `true` when the session can no longer be used and the run
    /// must stop.
    ///
    /// Locator misses, render timeouts and element-level failures are local:
    /// callers fall back to the next strategy or skip the entity.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Disconnected(_) | SessionError::WebDriver(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// One branch detail visit failed; the run continues with zero reviews
    /// for that branch unless the underlying session error is fatal.
    #[error("branch visit failed for {locator}: {source}")]
    BranchVisit {
        locator: String,
        #[source]
        source: SessionError,
    },

    #[error("no reviews tab found on {locator}")]
    NoReviewAffordance { locator: String },

    #[error("failed to persist harvest output: {0}")]
    Sink(#[from] SinkError),
}

impl HarvestError {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            HarvestError::Session(e) | HarvestError::BranchVisit { source: e, .. } => e.is_fatal(),
            HarvestError::NoReviewAffordance { .. } | HarvestError::Sink(_) => false,
        }
    }
}

/// Errors raised by a [`crate::harvest::RecordSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error for {context}: {reason}")]
    Encode { context: String, reason: String },
}
