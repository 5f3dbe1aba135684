//! Document-session abstraction over a remote rendering service.
//!
//! The harvester only issues navigation and structural queries through
//! [`DocumentSession`]; [`WebDriverSession`] drives a real browser, tests use
//! an in-memory fake.

mod webdriver;

use std::fmt;
use std::time::Duration;

pub use webdriver::{BrowserOptions, WebDriverSession};

use crate::error::SessionError;

/// A structural query against the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(&'static str),
    XPath(&'static str),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{s}`"),
            Locator::XPath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

/// On-page position of an element, rounded to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    /// Round fractional layout coordinates into a stable key.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_layout(x: f64, y: f64) -> Self {
        Self {
            x: x.round() as i64,
            y: y.round() as i64,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// One browser-like session, used strictly sequentially by one harvest run.
#[allow(async_fn_in_trait)]
pub trait DocumentSession {
    type Element: Clone;

    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Wait until at least one element matches `locator`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Timeout`] when nothing matched within `timeout`.
    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<(), SessionError>;

    /// All elements matching `locator` in document order. No match is an
    /// empty vector, not an error.
    async fn find_all(&self, locator: Locator) -> Result<Vec<Self::Element>, SessionError>;

    async fn find_within(
        &self,
        parent: &Self::Element,
        locator: Locator,
    ) -> Result<Vec<Self::Element>, SessionError>;

    async fn text(&self, element: &Self::Element) -> Result<String, SessionError>;

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn position(&self, element: &Self::Element) -> Result<Position, SessionError>;

    async fn scroll_height(&self, element: &Self::Element) -> Result<i64, SessionError>;

    /// Scroll `element` to the end of its content.
    async fn scroll_to_end(&self, element: &Self::Element) -> Result<(), SessionError>;

    async fn hover(&self, element: &Self::Element) -> Result<(), SessionError>;

    async fn click(&self, element: &Self::Element) -> Result<(), SessionError>;

    /// Release the session. Consumes it so no query can follow.
    async fn close(self) -> Result<(), SessionError>;
}
