//! Run orchestration over a browser session.
//!
//! [`extract_data`] owns the browser for the whole run: it sets up the
//! search, walks the results, and closes the browser on every path before
//! returning. On failure the partial article list is dropped.

use crate::automation::PageAutomation;
use crate::config::Config;
use crate::date_window::DateWindow;
use crate::error::ScrapeError;
use crate::models::{Article, RunParams};
use crate::pagination::PaginationController;
use crate::session::SearchSession;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument, warn};

/// Search, filter and paginate, returning every article inside the window.
#[instrument(level = "info", skip_all, fields(phrase = %params.search_phrase, topic = %params.topic, months = params.months))]
pub async fn extract_data<P: PageAutomation>(
    page: &P,
    config: &Config,
    params: &RunParams,
    now: DateTime<Utc>,
) -> Result<Vec<Article>, ScrapeError> {
    let result = harvest(page, config, params, now).await;

    if let Err(e) = &result {
        error!(error = %e, "Harvest failed");
        if let Some(path) = &config.failure_screenshot {
            match page.screenshot(path).await {
                Ok(()) => info!(path = %path.display(), "Saved failure screenshot"),
                Err(se) => warn!(error = %se, "Could not save failure screenshot"),
            }
        }
    }

    info!("Closing browser");
    if let Err(e) = page.close().await {
        warn!(error = %e, "Browser did not close cleanly");
    }

    result
}

async fn harvest<P: PageAutomation>(
    page: &P,
    config: &Config,
    params: &RunParams,
    now: DateTime<Utc>,
) -> Result<Vec<Article>, ScrapeError> {
    SearchSession::new(config, params).run(page).await?;

    let window = DateWindow::new(now, params.months);
    let (sy, sm) = window.start();
    let (ey, em) = window.end();
    info!(start = %format!("{sy}-{sm:02}"), end = %format!("{ey}-{em:02}"), "Date window");

    let harvest = PaginationController::new(config, window).run(page).await?;
    info!(
        count = harvest.articles.len(),
        pages = harvest.pages,
        stop = ?harvest.stop,
        "Harvest complete"
    );
    Ok(harvest.articles)
}
