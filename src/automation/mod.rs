//! Browser automation capability consumed by the harvesting pipeline.
//!
//! The pipeline never talks to a browser directly. It works against the
//! [`PageAutomation`] trait so the same session, extraction and pagination
//! logic can run over Chromium ([`chrome::ChromeAutomation`]) or over a
//! scripted fake in tests.
//!
//! # Locators
//!
//! Locators are opaque strings taken from [`crate::config::Locators`].
//! Implementations accept plain CSS, CSS with a `css:` prefix, and XPath
//! with an `xpath:` prefix.
//!
//! # Fault classes
//!
//! Every [`AutomationError`] maps to a [`Fault`] so callers can branch on the
//! class of failure instead of on individual variants:
//!
//! | Fault | Variants | Typical handling |
//! |-------|----------|------------------|
//! | `Transient` | `StaleElement`, `ClickIntercepted` | retry within a budget |
//! | `Absent` | `NotFound` | substitute a default for optional fields, otherwise fatal |
//! | `Timeout` | `Timeout` | advisory waits treat it as "already done" |
//! | `Structural` | `Script`, `Browser` | fatal |

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub mod chrome;
#[cfg(test)]
pub mod fake;

/// Errors raised by a [`PageAutomation`] implementation.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// No element matched the locator.
    #[error("no element matches '{locator}'")]
    NotFound { locator: String },

    /// The element handle no longer belongs to the live document.
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// Another element sits on top of the click target.
    #[error("click intercepted by <{0}>")]
    ClickIntercepted(String),

    /// A bounded wait elapsed.
    #[error("timed out after {timeout:?} waiting on '{locator}'")]
    Timeout { locator: String, timeout: Duration },

    /// A script ran but raised or returned something unusable.
    #[error("script failed: {0}")]
    Script(String),

    /// Anything else the browser or transport reported.
    #[error("browser error: {0}")]
    Browser(String),
}

/// Coarse classification of an [`AutomationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Transient,
    Absent,
    Timeout,
    Structural,
}

impl AutomationError {
    pub fn not_found(locator: impl Into<String>) -> Self {
        AutomationError::NotFound {
            locator: locator.into(),
        }
    }

    pub fn fault(&self) -> Fault {
        match self {
            AutomationError::StaleElement(_) | AutomationError::ClickIntercepted(_) => {
                Fault::Transient
            }
            AutomationError::NotFound { .. } => Fault::Absent,
            AutomationError::Timeout { .. } => Fault::Timeout,
            AutomationError::Script(_) | AutomationError::Browser(_) => Fault::Structural,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.fault() == Fault::Absent
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

/// The page-level operations the pipeline needs from a browser.
///
/// All calls are awaited one at a time; implementations do not need to be
/// `Sync`. Element handles are only valid until the page re-renders, after
/// which operations on them should fail with
/// [`AutomationError::StaleElement`].
pub trait PageAutomation {
    /// Handle to a located element.
    type Element;

    /// Navigate the current tab to `url`.
    async fn goto(&self, url: &str) -> AutomationResult<()>;

    /// Locate one element, optionally inside `scope`.
    async fn find_element(
        &self,
        locator: &str,
        scope: Option<&Self::Element>,
    ) -> AutomationResult<Self::Element>;

    /// Locate every element matching `locator`, in document order.
    async fn find_elements(&self, locator: &str) -> AutomationResult<Vec<Self::Element>>;

    async fn get_text(&self, element: &Self::Element) -> AutomationResult<String>;

    /// Read an attribute; `Ok(None)` when the element lacks it.
    async fn get_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> AutomationResult<Option<String>>;

    async fn click(&self, element: &Self::Element) -> AutomationResult<()>;

    async fn wait_visible(&self, locator: &str, timeout: Duration) -> AutomationResult<()>;

    async fn wait_not_visible(&self, locator: &str, timeout: Duration) -> AutomationResult<()>;

    /// Tick a checkbox, leaving it alone when already checked.
    async fn select_checkbox(&self, locator: &str) -> AutomationResult<()>;

    /// Choose the `<option>` whose value is `value`.
    async fn select_from_list(&self, locator: &str, value: &str) -> AutomationResult<()>;

    async fn execute_script(&self, script: &str) -> AutomationResult<()>;

    async fn input_text(&self, locator: &str, text: &str) -> AutomationResult<()>;

    async fn screenshot(&self, path: &Path) -> AutomationResult<()>;

    /// End the browser session. Safe to call more than once.
    async fn close(&self) -> AutomationResult<()>;
}
