use std::time::Duration;

use serde_json::json;
use thirtyfour::error::{WebDriverError, WebDriverErrorInner};
use thirtyfour::prelude::*;

use super::{DocumentSession, Locator, Position};
use crate::error::SessionError;

const SCROLL_HEIGHT_SCRIPT: &str = "return arguments[0].scrollHeight;";
const SCROLL_TO_END_SCRIPT: &str = "arguments[0].scrollTop = arguments[0].scrollHeight;";
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How to launch the browser behind a [`WebDriverSession`].
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// ChromeDriver endpoint, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    pub window_size: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            window_size: (1920, 1080),
        }
    }
}

/// [`DocumentSession`] backed by a Chrome instance reached over WebDriver.
pub struct WebDriverSession {
    driver: WebDriver,
}

impl WebDriverSession {
    /// Start a Chrome session with automation markers hidden.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disconnected`] if the driver endpoint refuses
    /// the session.
    pub async fn connect(options: &BrowserOptions) -> Result<Self, SessionError> {
        let mut caps = DesiredCapabilities::chrome();
        let (width, height) = options.window_size;
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            format!("--window-size={width},{height}"),
        ];
        if options.headless {
            args.push("--headless=new".to_string());
        }
        for arg in &args {
            caps.add_arg(arg).map_err(disconnected)?;
        }
        caps.add_experimental_option("excludeSwitches", json!(["enable-automation"]))
            .map_err(disconnected)?;
        caps.add_experimental_option("useAutomationExtension", false)
            .map_err(disconnected)?;

        let driver = WebDriver::new(&options.webdriver_url, caps)
            .await
            .map_err(disconnected)?;

        tracing::info!(
            webdriver_url = %options.webdriver_url,
            headless = options.headless,
            "browser session started"
        );

        Ok(Self { driver })
    }

    async fn run_script(
        &self,
        script: &str,
        element: &WebElement,
    ) -> Result<serde_json::Value, SessionError> {
        let arg = element.to_json().map_err(|e| classify(e, "script argument"))?;
        let ret = self
            .driver
            .execute(script, vec![arg])
            .await
            .map_err(|e| classify(e, "script"))?;
        Ok(ret.json().clone())
    }
}

fn by(locator: Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s),
        Locator::XPath(s) => By::XPath(s),
    }
}

fn disconnected(e: WebDriverError) -> SessionError {
    SessionError::Disconnected(e.to_string())
}

/// Sort a WebDriver failure into the local/fatal taxonomy.
fn classify(e: WebDriverError, what: &str) -> SessionError {
    match e.as_inner() {
        WebDriverErrorInner::NoSuchElement(_) => SessionError::NotFound {
            locator: what.to_string(),
        },
        WebDriverErrorInner::StaleElementReference(_)
        | WebDriverErrorInner::ElementNotInteractable(_)
        | WebDriverErrorInner::ElementClickIntercepted(_)
        | WebDriverErrorInner::MoveTargetOutOfBounds(_)
        | WebDriverErrorInner::JavascriptError(_) => {
            SessionError::Interaction(format!("{what}: {e}"))
        }
        WebDriverErrorInner::InvalidSessionId(_)
        | WebDriverErrorInner::NoSuchWindow(_)
        | WebDriverErrorInner::SessionNotCreated(_) => disconnected(e),
        _ => SessionError::WebDriver(format!("{what}: {e}")),
    }
}

impl DocumentSession for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        match self.driver.goto(url).await {
            Ok(()) => Ok(()),
            // Unreachable pages surface as `unknown error: net::ERR_*`.
            Err(e)
                if matches!(
                    e.as_inner(),
                    WebDriverErrorInner::UnknownError(_) | WebDriverErrorInner::Timeout(_)
                ) =>
            {
                Err(SessionError::Interaction(format!(
                    "navigate to {url}: {e}"
                )))
            }
            Err(e) => Err(classify(e, "navigate")),
        }
    }

    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<(), SessionError> {
        self.driver
            .query(by(locator))
            .wait(timeout, WAIT_POLL_INTERVAL)
            .first()
            .await
            .map(|_| ())
            .map_err(|e| match e.as_inner() {
                WebDriverErrorInner::NoSuchElement(_) | WebDriverErrorInner::Timeout(_) => {
                    SessionError::Timeout {
                        what: locator.to_string(),
                        secs: timeout.as_secs(),
                    }
                }
                _ => classify(e, "wait"),
            })
    }

    async fn find_all(&self, locator: Locator) -> Result<Vec<WebElement>, SessionError> {
        self.driver
            .find_all(by(locator))
            .await
            .map_err(|e| classify(e, &locator.to_string()))
    }

    async fn find_within(
        &self,
        parent: &WebElement,
        locator: Locator,
    ) -> Result<Vec<WebElement>, SessionError> {
        parent
            .find_all(by(locator))
            .await
            .map_err(|e| classify(e, &locator.to_string()))
    }

    async fn text(&self, element: &WebElement) -> Result<String, SessionError> {
        element.text().await.map_err(|e| classify(e, "text"))
    }

    async fn attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        element
            .attr(name)
            .await
            .map_err(|e| classify(e, &format!("attribute {name}")))
    }

    async fn position(&self, element: &WebElement) -> Result<Position, SessionError> {
        let rect = element.rect().await.map_err(|e| classify(e, "rect"))?;
        Ok(Position::from_layout(rect.x, rect.y))
    }

    async fn scroll_height(&self, element: &WebElement) -> Result<i64, SessionError> {
        let value = self.run_script(SCROLL_HEIGHT_SCRIPT, element).await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| Position::from_layout(h, 0.0).x))
            .ok_or_else(|| SessionError::Interaction(format!("scrollHeight was {value}")))
    }

    async fn scroll_to_end(&self, element: &WebElement) -> Result<(), SessionError> {
        self.run_script(SCROLL_TO_END_SCRIPT, element).await.map(|_| ())
    }

    async fn hover(&self, element: &WebElement) -> Result<(), SessionError> {
        self.driver
            .action_chain()
            .move_to_element_center(element)
            .perform()
            .await
            .map_err(|e| classify(e, "hover"))
    }

    async fn click(&self, element: &WebElement) -> Result<(), SessionError> {
        element.click().await.map_err(|e| classify(e, "click"))
    }

    async fn close(self) -> Result<(), SessionError> {
        self.driver.quit().await.map_err(disconnected)
    }
}
