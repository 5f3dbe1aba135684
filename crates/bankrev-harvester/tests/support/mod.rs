//! In-memory document session for integration tests.
//!
//! Pages are trees of [`NodeSpec`] keyed by URL. A node matches the locators
//! it was built with; no selector engine is involved. Nodes can be hidden
//! until the page has been scrolled a number of times.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bankrev_harvester::extract::{detail, listing, review};
use bankrev_harvester::{DocumentSession, Locator, Position, SessionError};
use chrono::{DateTime, TimeZone, Utc};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    matches: Vec<Locator>,
    text: String,
    attrs: Vec<(&'static str, String)>,
    position: Option<Position>,
    visible_after: u32,
    scroll_height: i64,
    stale: bool,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, locator: Locator) -> Self {
        self.matches.push(locator);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &'static str, value: &str) -> Self {
        self.attrs.push((name, value.to_string()));
        self
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    pub fn visible_after(mut self, scrolls: u32) -> Self {
        self.visible_after = scrolls;
        self
    }

    pub fn scroll_height(mut self, height: i64) -> Self {
        self.scroll_height = height;
        self
    }

    /// Reading this node's text fails with a non-fatal interaction error.
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct Node {
    matches: Vec<Locator>,
    text: String,
    attrs: HashMap<&'static str, String>,
    position: Option<Position>,
    visible_after: u32,
    scroll_height: i64,
    stale: bool,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<Node>,
    pages: HashMap<String, Vec<usize>>,
    current: Option<String>,
    scrolls: u32,
    failing_urls: HashSet<String>,
    disconnect_urls: HashSet<String>,
    disconnected: bool,
    /// Scroll number from which `scroll_to_end` fails, and whether fatally.
    scroll_failure: Option<(u32, bool)>,
}

impl State {
    fn alloc(&mut self, spec: NodeSpec) -> usize {
        let children = spec
            .children
            .into_iter()
            .map(|c| self.alloc(c))
            .collect();
        self.nodes.push(Node {
            matches: spec.matches,
            text: spec.text,
            attrs: spec.attrs.into_iter().collect(),
            position: spec.position,
            visible_after: spec.visible_after,
            scroll_height: spec.scroll_height,
            stale: spec.stale,
            children,
        });
        self.nodes.len() - 1
    }

    fn collect_matching(&self, roots: &[usize], locator: Locator, out: &mut Vec<usize>) {
        for &id in roots {
            let node = &self.nodes[id];
            if node.visible_after > self.scrolls {
                continue;
            }
            if node.matches.contains(&locator) {
                out.push(id);
            }
            self.collect_matching(&node.children, locator, out);
        }
    }

    fn check_connected(&self) -> Result<(), SessionError> {
        if self.disconnected {
            Err(SessionError::Disconnected("renderer crashed".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Scripted [`DocumentSession`]. Elements are node indices.
#[derive(Debug, Default)]
pub struct FakeSession {
    state: Mutex<State>,
    closed: Arc<AtomicBool>,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, url: &str, roots: Vec<NodeSpec>) {
        let state = self.state.get_mut().unwrap();
        let ids = roots.into_iter().map(|r| state.alloc(r)).collect();
        state.pages.insert(url.to_string(), ids);
    }

    /// Navigating to `url` fails locally (unreachable page).
    pub fn fail_navigation(&mut self, url: &str) {
        self.state.get_mut().unwrap().failing_urls.insert(url.to_string());
    }

    /// Navigating to `url` kills the session.
    pub fn disconnect_on(&mut self, url: &str) {
        self.state
            .get_mut()
            .unwrap()
            .disconnect_urls
            .insert(url.to_string());
    }

    pub fn fail_scrolls_from(&mut self, scroll: u32, fatal: bool) {
        self.state.get_mut().unwrap().scroll_failure = Some((scroll, fatal));
    }

    /// Show `url` without going through `navigate`.
    pub fn open(&mut self, url: &str) {
        let state = self.state.get_mut().unwrap();
        state.current = Some(url.to_string());
        state.scrolls = 0;
    }

    pub fn scrolls(&self) -> u32 {
        self.lock().scrolls
    }

    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub fn navigation_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.navigations)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn with_node<T>(
        &self,
        id: usize,
        f: impl FnOnce(&Node) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let state = self.lock();
        state.check_connected()?;
        f(&state.nodes[id])
    }
}

impl DocumentSession for FakeSession {
    type Element = usize;

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        self.navigations.lock().unwrap().push(url.to_string());
        let mut state = self.lock();
        state.check_connected()?;
        if state.disconnect_urls.contains(url) {
            state.disconnected = true;
            return Err(SessionError::Disconnected("renderer crashed".to_string()));
        }
        if state.failing_urls.contains(url) {
            return Err(SessionError::Interaction(format!(
                "navigate to {url}: net::ERR_CONNECTION_RESET"
            )));
        }
        state.current = Some(url.to_string());
        state.scrolls = 0;
        Ok(())
    }

    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<(), SessionError> {
        if self.find_all(locator).await?.is_empty() {
            return Err(SessionError::Timeout {
                what: locator.to_string(),
                secs: timeout.as_secs(),
            });
        }
        Ok(())
    }

    async fn find_all(&self, locator: Locator) -> Result<Vec<usize>, SessionError> {
        let state = self.lock();
        state.check_connected()?;
        let roots = state
            .current
            .as_ref()
            .and_then(|url| state.pages.get(url))
            .cloned()
            .unwrap_or_default();
        let mut out = Vec::new();
        state.collect_matching(&roots, locator, &mut out);
        Ok(out)
    }

    async fn find_within(&self, parent: &usize, locator: Locator) -> Result<Vec<usize>, SessionError> {
        let state = self.lock();
        state.check_connected()?;
        let children = state.nodes[*parent].children.clone();
        let mut out = Vec::new();
        state.collect_matching(&children, locator, &mut out);
        Ok(out)
    }

    async fn text(&self, element: &usize) -> Result<String, SessionError> {
        self.with_node(*element, |node| {
            if node.stale {
                Err(SessionError::Interaction("stale element reference".to_string()))
            } else {
                Ok(node.text.clone())
            }
        })
    }

    async fn attribute(&self, element: &usize, name: &str) -> Result<Option<String>, SessionError> {
        self.with_node(*element, |node| Ok(node.attrs.get(name).cloned()))
    }

    async fn position(&self, element: &usize) -> Result<Position, SessionError> {
        self.with_node(*element, |node| {
            node.position
                .ok_or_else(|| SessionError::Interaction("element has no layout".to_string()))
        })
    }

    async fn scroll_height(&self, element: &usize) -> Result<i64, SessionError> {
        self.with_node(*element, |node| Ok(node.scroll_height))
    }

    async fn scroll_to_end(&self, _element: &usize) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.check_connected()?;
        if let Some((from, fatal)) = state.scroll_failure {
            if state.scrolls + 1 >= from {
                if fatal {
                    state.disconnected = true;
                    return Err(SessionError::Disconnected("renderer crashed".to_string()));
                }
                return Err(SessionError::Interaction("javascript error".to_string()));
            }
        }
        state.scrolls += 1;
        Ok(())
    }

    async fn hover(&self, _element: &usize) -> Result<(), SessionError> {
        self.lock().check_connected()
    }

    async fn click(&self, _element: &usize) -> Result<(), SessionError> {
        self.lock().check_connected()
    }

    async fn close(self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Page fixtures
// ---------------------------------------------------------------------------

/// Search result page: results region, scrollable feed, then `cards`.
pub fn listing_page(cards: Vec<NodeSpec>) -> Vec<NodeSpec> {
    let mut roots = vec![
        NodeSpec::new().matching(listing::RESULTS_REGION),
        NodeSpec::new()
            .matching(listing::LISTING_REGIONS[0])
            .scroll_height(4000),
    ];
    roots.extend(cards);
    roots
}

/// A listing card matched by the primary block locator.
pub fn listing_card(href: &str, name: &str, x: i64, y: i64) -> NodeSpec {
    NodeSpec::new()
        .matching(listing::LISTING_BLOCKS[0])
        .at(x, y)
        .child(
            NodeSpec::new()
                .matching(listing::LISTING_ITEMS)
                .attr("href", href)
                .attr("aria-label", name),
        )
        .child(
            NodeSpec::new()
                .matching(Locator::Css("div.qBF1Pd.fontHeadlineSmall"))
                .text(name),
        )
        .child(
            NodeSpec::new()
                .matching(Locator::Css("div.W4Efsd"))
                .text("Ouvert 24h/24"),
        )
        .child(
            NodeSpec::new()
                .matching(Locator::Css("div.W4Efsd"))
                .text(&format!("Banque · {name} Avenue Mohammed V · Ouvert")),
        )
        .child(NodeSpec::new().matching(Locator::Css("span.MW4etd")).text("4,1"))
        .child(NodeSpec::new().matching(Locator::Css("span.UY7F9")).text("(12)"))
}

/// Branch detail page: reviews tab, scrollable review panel, then `cards`.
pub fn detail_page(cards: Vec<NodeSpec>) -> Vec<NodeSpec> {
    let mut roots = vec![
        NodeSpec::new().matching(detail::REVIEW_TAB[0]),
        NodeSpec::new()
            .matching(detail::REVIEW_PANEL_REGIONS[0])
            .scroll_height(2400),
    ];
    roots.extend(cards);
    roots
}

/// Detail page without any reviews tab.
pub fn detail_page_without_tab() -> Vec<NodeSpec> {
    vec![NodeSpec::new()
        .matching(detail::REVIEW_PANEL_REGIONS[0])
        .scroll_height(2400)]
}

pub fn review_card(name: &str, stars: u8, body: &str, date: &str, y: i64) -> NodeSpec {
    let mut card = NodeSpec::new()
        .matching(review::REVIEW_BLOCKS[0])
        .at(400, y)
        .child(NodeSpec::new().matching(Locator::Css(".d4r55")).text(name))
        .child(NodeSpec::new().matching(Locator::Css(".rsqaWe")).text(date));
    if stars > 0 {
        card = card.child(
            NodeSpec::new()
                .matching(Locator::Css("[role='img'][aria-label*='star']"))
                .attr("aria-label", &format!("{stars} stars")),
        );
    }
    if !body.is_empty() {
        card = card.child(NodeSpec::new().matching(Locator::Css(".wiI7pd")).text(body));
    }
    card
}

/// Place page whose panel carries an address and phone number.
pub fn place_page(address: &str, phone: &str) -> Vec<NodeSpec> {
    vec![NodeSpec::new()
        .matching(detail::PLACE_ROOT[0])
        .child(
            NodeSpec::new()
                .matching(Locator::Css("button[data-item-id='address']"))
                .attr("aria-label", &format!("Address: {address}")),
        )
        .child(
            NodeSpec::new()
                .matching(Locator::Css("button[data-item-id='phone']"))
                .attr("aria-label", &format!("Phone: {phone}")),
        )]
}
