//! Chromium-backed [`PageAutomation`] over the DevTools protocol.
//!
//! A single browser with a single tab is launched per run. The CDP handler
//! is driven on a background tokio task for the lifetime of the session.
//!
//! # Error mapping
//!
//! CDP reports failures as free-form messages. Lookups that come back empty
//! become [`AutomationError::NotFound`]; operations on a handle whose node
//! left the document become [`AutomationError::StaleElement`]. Clicks are
//! hit-tested first, so a click that would land on another element (for
//! example the metering overlay) fails with
//! [`AutomationError::ClickIntercepted`] instead of silently clicking the
//! wrong thing.

use super::{AutomationError, AutomationResult, PageAutomation};
use crate::config::Config;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Messages Chromium uses for node handles that no longer resolve.
const STALE_MARKERS: [&str; 4] = [
    "Could not find node",
    "No node with given id",
    "detached",
    "Cannot find context with specified id",
];

const VISIBLE_JS: &str = "function() { \
    const s = window.getComputedStyle(this); \
    return s.display !== 'none' && s.visibility !== 'hidden' && this.getClientRects().length > 0; \
}";

/// Returns the tag of whatever covers the element's centre, or null when
/// the element itself (or a descendant) would receive the click.
const HIT_TEST_JS: &str = "function() { \
    this.scrollIntoView({ block: 'center', inline: 'center' }); \
    const r = this.getBoundingClientRect(); \
    const top = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2); \
    if (!top || top === this || this.contains(top)) { return null; } \
    return top.tagName.toLowerCase(); \
}";

const CONNECTED_JS: &str = "function() { return this.isConnected; }";

const CHECK_JS: &str = "function() { if (!this.checked) { this.click(); } return this.checked === true; }";

enum Selector<'a> {
    Css(&'a str),
    XPath(&'a str),
}

fn selector(locator: &str) -> Selector<'_> {
    if let Some(xpath) = locator.strip_prefix("xpath:") {
        Selector::XPath(xpath)
    } else {
        Selector::Css(locator.strip_prefix("css:").unwrap_or(locator))
    }
}

/// Map an error from a lookup of `locator`.
fn lookup_error(e: CdpError, locator: &str) -> AutomationError {
    if matches!(e, CdpError::NotFound) {
        return AutomationError::not_found(locator);
    }
    let msg = e.to_string();
    if msg.contains("Could not find node") || msg.contains("No node with given id") {
        // querySelector hands back node id 0 when nothing matches.
        AutomationError::not_found(locator)
    } else {
        AutomationError::Browser(msg)
    }
}

/// Map an error from a lookup scoped to an element.
///
/// Chromium reports an empty match and a scope that left the document with
/// the same message, so `attached` decides between absence and staleness.
fn scoped_lookup_error(e: CdpError, locator: &str, attached: bool) -> AutomationError {
    match lookup_error(e, locator) {
        AutomationError::NotFound { .. } if !attached => AutomationError::StaleElement(format!(
            "scope of '{locator}' is no longer in the document"
        )),
        AutomationError::Browser(msg) if STALE_MARKERS.iter().any(|m| msg.contains(m)) => {
            AutomationError::StaleElement(msg)
        }
        other => other,
    }
}

/// Map an error from an operation on an existing handle.
fn handle_error(e: CdpError) -> AutomationError {
    let msg = e.to_string();
    if STALE_MARKERS.iter().any(|m| msg.contains(m)) {
        AutomationError::StaleElement(msg)
    } else {
        AutomationError::Browser(msg)
    }
}

pub struct ChromeAutomation {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeAutomation {
    /// Launch Chromium and open a blank tab.
    #[instrument(level = "info", skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &Config) -> AutomationResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--dns-prefetch-disable")
            .arg("--force-device-scale-factor=1")
            .arg("--ignore-certificate-errors")
            .arg("--ignore-ssl-errors")
            .arg("--log-level=3");
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(AutomationError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| AutomationError::Browser(format!("browser launch failed: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AutomationError::Browser(format!("could not open a tab: {e}")))?;
        info!("Browser launched");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        })
    }

    async fn locate(&self, locator: &str) -> AutomationResult<Element> {
        let found = match selector(locator) {
            Selector::Css(css) => self.page.find_element(css).await,
            Selector::XPath(xpath) => self.page.find_xpath(xpath).await,
        };
        found.map_err(|e| lookup_error(e, locator))
    }

    /// `Ok(false)` when the element is missing, hidden, or went stale.
    async fn is_visible(&self, locator: &str) -> AutomationResult<bool> {
        let el = match self.locate(locator).await {
            Ok(el) => el,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        match el.call_js_fn(VISIBLE_JS, false).await {
            Ok(ret) => Ok(ret
                .result
                .value
                .and_then(|v| v.as_bool())
                .unwrap_or(false)),
            Err(e) => match handle_error(e) {
                AutomationError::StaleElement(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn wait_for(&self, locator: &str, visible: bool, timeout: Duration) -> AutomationResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible(locator).await? == visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::Timeout {
                    locator: locator.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

/// `Ok(false)` when the handle no longer resolves to a node in the document.
async fn is_attached(element: &Element) -> AutomationResult<bool> {
    match element.call_js_fn(CONNECTED_JS, false).await {
        Ok(ret) => Ok(ret.result.value.and_then(|v| v.as_bool()).unwrap_or(false)),
        Err(e) => match handle_error(e) {
            AutomationError::StaleElement(_) => Ok(false),
            other => Err(other),
        },
    }
}

impl PageAutomation for ChromeAutomation {
    type Element = Element;

    async fn goto(&self, url: &str) -> AutomationResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| AutomationError::Browser(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn find_element(
        &self,
        locator: &str,
        scope: Option<&Element>,
    ) -> AutomationResult<Element> {
        let Some(scope) = scope else {
            return self.locate(locator).await;
        };
        match selector(locator) {
            Selector::Css(css) => match scope.find_element(css).await {
                Ok(el) => Ok(el),
                Err(e) => {
                    let attached = is_attached(scope).await?;
                    Err(scoped_lookup_error(e, locator, attached))
                }
            },
            Selector::XPath(_) => Err(AutomationError::Browser(format!(
                "xpath lookups inside an element are not supported: '{locator}'"
            ))),
        }
    }

    async fn find_elements(&self, locator: &str) -> AutomationResult<Vec<Element>> {
        let found = match selector(locator) {
            Selector::Css(css) => self.page.find_elements(css).await,
            Selector::XPath(xpath) => self.page.find_xpaths(xpath).await,
        };
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => match lookup_error(e, locator) {
                AutomationError::NotFound { .. } => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn get_text(&self, element: &Element) -> AutomationResult<String> {
        Ok(element
            .inner_text()
            .await
            .map_err(handle_error)?
            .unwrap_or_default())
    }

    async fn get_attribute(&self, element: &Element, name: &str) -> AutomationResult<Option<String>> {
        element.attribute(name).await.map_err(handle_error)
    }

    async fn click(&self, element: &Element) -> AutomationResult<()> {
        let hit = element
            .call_js_fn(HIT_TEST_JS, false)
            .await
            .map_err(handle_error)?;
        if let Some(serde_json::Value::String(tag)) = hit.result.value {
            return Err(AutomationError::ClickIntercepted(tag));
        }
        element.click().await.map_err(handle_error)?;
        Ok(())
    }

    async fn wait_visible(&self, locator: &str, timeout: Duration) -> AutomationResult<()> {
        self.wait_for(locator, true, timeout).await
    }

    async fn wait_not_visible(&self, locator: &str, timeout: Duration) -> AutomationResult<()> {
        self.wait_for(locator, false, timeout).await
    }

    async fn select_checkbox(&self, locator: &str) -> AutomationResult<()> {
        let el = self.locate(locator).await?;
        let ret = el.call_js_fn(CHECK_JS, false).await.map_err(handle_error)?;
        match ret.result.value.and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(AutomationError::Script(format!("checkbox '{locator}' did not check"))),
        }
    }

    async fn select_from_list(&self, locator: &str, value: &str) -> AutomationResult<()> {
        let el = self.locate(locator).await?;
        let quoted = serde_json::Value::String(value.to_string());
        let js = format!(
            "function() {{ \
                this.value = {quoted}; \
                this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                return this.value; \
            }}"
        );
        let ret = el.call_js_fn(js, false).await.map_err(handle_error)?;
        match ret.result.value {
            Some(serde_json::Value::String(selected)) if selected == value => Ok(()),
            other => Err(AutomationError::Script(format!(
                "'{locator}' has no option '{value}' (selected {other:?})"
            ))),
        }
    }

    async fn execute_script(&self, script: &str) -> AutomationResult<()> {
        self.page
            .evaluate(script)
            .await
            .map_err(handle_error)?;
        Ok(())
    }

    async fn input_text(&self, locator: &str, text: &str) -> AutomationResult<()> {
        let el = self.locate(locator).await?;
        el.click().await.map_err(handle_error)?;
        el.type_str(text).await.map_err(handle_error)?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> AutomationResult<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .map_err(|e| AutomationError::Browser(format!("screenshot failed: {e}")))?;
        Ok(())
    }

    async fn close(&self) -> AutomationResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        self.handler.abort();
        closed.map_err(|e| AutomationError::Browser(format!("close failed: {e}")))?;
        Ok(())
    }
}
