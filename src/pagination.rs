//! Walking the paged, newest-first result list.
//!
//! Each pass scans every card on the visible page, keeps the ones inside the
//! date window, and then decides whether to advance. Advancing happens only
//! when the last card of the page qualified: results are newest first, so an
//! out-of-window last card means nothing further back can qualify.
//!
//! ```text
//! Scanning(page) ──► DecideAdvance ──► Scanning(page + 1)
//!                         │
//!                         ├──► Done    (last card too old, or no next page)
//!                         └──► Failed  (extraction error, retries exhausted)
//! ```
//!
//! # Advancing
//!
//! The next-page click is retried on transient faults (an overlay swallowing
//! the click, or the link going stale mid re-render) up to
//! [`Config::pagination_attempts`] attempts in total. Before every attempt the
//! metering overlay is stripped from the document. Any other fault is fatal
//! immediately. A next-page control that is missing or disabled on the first
//! attempt means the results ran out; one that vanishes after a failed
//! attempt is fatal.

use crate::automation::{AutomationError, Fault, PageAutomation};
use crate::config::{Config, Locators, Timeouts};
use crate::date_window::DateWindow;
use crate::error::ScrapeError;
use crate::extractor::ArticleExtractor;
use crate::models::Article;
use tracing::{debug, error, info, instrument, warn};

/// Result of a single next-page click.
#[derive(Debug)]
pub enum ClickOutcome {
    Clicked,
    /// The next-page control is missing or disabled.
    NoNextPage,
    Transient(AutomationError),
    Structural(AutomationError),
}

/// Why the controller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// The last card of a page fell outside the window.
    OutOfWindow,
    /// There is no further page.
    EndOfResults,
}

/// Articles collected by a finished walk.
#[derive(Debug)]
pub struct Harvest {
    pub articles: Vec<Article>,
    /// Number of result pages scanned.
    pub pages: usize,
    pub stop: Stop,
}

pub struct PaginationController<'a> {
    config: &'a Config,
    extractor: ArticleExtractor<'a>,
}

impl<'a> PaginationController<'a> {
    pub fn new(config: &'a Config, window: DateWindow) -> Self {
        Self {
            config,
            extractor: ArticleExtractor::new(&config.locators, window),
        }
    }

    fn locators(&self) -> &Locators {
        &self.config.locators
    }

    /// Scan pages until the window or the result list is exhausted.
    #[instrument(level = "info", skip_all)]
    pub async fn run<P: PageAutomation>(&self, page: &P) -> Result<Harvest, ScrapeError> {
        let mut articles = Vec::new();
        let mut pages = 0usize;

        loop {
            pages += 1;
            let items = page
                .find_elements(&self.locators().result_item)
                .await
                .map_err(ScrapeError::Pagination)?;
            debug!(page = pages, items = items.len(), "Scanning result page");

            let mut last_qualified = false;
            for item in &items {
                match self.extractor.extract(page, item).await {
                    Ok(Some(article)) => {
                        articles.push(article);
                        last_qualified = true;
                    }
                    Ok(None) => last_qualified = false,
                    Err(e) => {
                        error!(page = pages, error = %e, "Article extraction failed");
                        return Err(e.into());
                    }
                }
            }

            if !last_qualified {
                info!(page = pages, count = articles.len(), "Reached end of date window");
                return Ok(Harvest {
                    articles,
                    pages,
                    stop: Stop::OutOfWindow,
                });
            }

            if !self.advance(page).await? {
                info!(page = pages, count = articles.len(), "No further result pages");
                return Ok(Harvest {
                    articles,
                    pages,
                    stop: Stop::EndOfResults,
                });
            }
        }
    }

    /// Move to the next page. `Ok(false)` means there is none.
    async fn advance<P: PageAutomation>(&self, page: &P) -> Result<bool, ScrapeError> {
        let attempts = self.config.pagination_attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            remove_overlay(page, self.locators()).await;

            match self.click_next(page, attempt).await {
                ClickOutcome::Clicked => {
                    wait_for_loading(page, self.locators(), &self.config.timeouts)
                        .await
                        .map_err(ScrapeError::Pagination)?;
                    return Ok(true);
                }
                ClickOutcome::NoNextPage => return Ok(false),
                ClickOutcome::Transient(e) => {
                    warn!(attempt, max = attempts, error = %e, "Next page click failed; retrying");
                    last = Some(e);
                }
                ClickOutcome::Structural(e) => {
                    error!(attempt, error = %e, "Next page click failed");
                    return Err(ScrapeError::Pagination(e));
                }
            }
        }

        let last = last.unwrap_or_else(|| AutomationError::Browser("no attempt made".into()));
        error!(attempts, error = %last, "Next page retries exhausted");
        Err(ScrapeError::PaginationExhausted { attempts, last })
    }

    async fn click_next<P: PageAutomation>(&self, page: &P, attempt: u32) -> ClickOutcome {
        let locator = &self.locators().next_page;
        let control = match page.find_element(locator, None).await {
            Ok(el) => el,
            Err(e) if e.is_not_found() && attempt == 1 => return ClickOutcome::NoNextPage,
            Err(e) => return classify(e),
        };

        match page.get_attribute(&control, "aria-disabled").await {
            Ok(Some(v)) if v == "true" => return ClickOutcome::NoNextPage,
            Ok(_) => {}
            Err(e) => return classify(e),
        }

        match page.click(&control).await {
            Ok(()) => ClickOutcome::Clicked,
            Err(e) => classify(e),
        }
    }
}

fn classify(e: AutomationError) -> ClickOutcome {
    match e.fault() {
        Fault::Transient => ClickOutcome::Transient(e),
        Fault::Absent | Fault::Timeout | Fault::Structural => ClickOutcome::Structural(e),
    }
}

/// Strip the metering overlay if it is in the document.
pub async fn remove_overlay<P: PageAutomation>(page: &P, locators: &Locators) {
    match page.find_element(&locators.overlay_host, None).await {
        Ok(_) => match page.execute_script(&locators.overlay_removal_script()).await {
            Ok(()) => debug!("Removed overlay"),
            Err(e) => warn!(error = %e, "Overlay removal script failed"),
        },
        Err(e) if e.is_not_found() => debug!("No overlay present"),
        Err(e) => warn!(error = %e, "Could not look for overlay"),
    }
}

/// Wait for the loading indicator to show and then clear.
///
/// Not seeing the indicator within its window counts as "already loaded".
pub async fn wait_for_loading<P: PageAutomation>(
    page: &P,
    locators: &Locators,
    timeouts: &Timeouts,
) -> Result<(), AutomationError> {
    let indicator = &locators.loading_indicator;
    advisory(page.wait_visible(indicator, timeouts.loading_appear()).await)?;
    advisory(
        page.wait_not_visible(indicator, timeouts.loading_disappear())
            .await,
    )
}

fn advisory(result: Result<(), AutomationError>) -> Result<(), AutomationError> {
    match result {
        Err(e) if matches!(e.fault(), Fault::Timeout | Fault::Absent) => {
            debug!(error = %e, "Loading indicator not observed");
            Ok(())
        }
        other => other,
    }
}
