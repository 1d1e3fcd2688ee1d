//! # LA Times Harvester
//!
//! Drives a headless Chromium through the latimes.com search page, collects
//! every article for a phrase and topic published within the last N months,
//! downloads each lead image, and records the results in a spreadsheet.
//!
//! ## Usage
//!
//! ```sh
//! latimes_harvester --search-phrase climate --topic Science --months 2
//! ```
//!
//! ## Architecture
//!
//! 1. **Session**: open the site, search, filter by topic, sort newest first
//! 2. **Pagination**: scan result pages, keeping articles inside the date
//!    window, until a page ends outside the window or results run out
//! 3. **Images**: download each article's lead image, one at a time
//! 4. **Spreadsheet**: one row per article, written only if every step succeeded

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod automation;
mod cli;
mod config;
mod date_window;
mod error;
mod extractor;
mod models;
mod outputs;
mod pagination;
mod scraper;
mod session;
mod utils;

use automation::chrome::ChromeAutomation;
use cli::Cli;
use config::Config;
use error::ScrapeError;
use models::ArticleRow;
use outputs::{images::ImageDownloader, spreadsheet};
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("latimes_harvester starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if args.headed {
        config.headless = false;
    }
    let params = args.run_params()?;
    info!(
        phrase = %params.search_phrase,
        topic = %params.topic,
        months = params.months,
        "Run parameters"
    );

    // Early check: fail before launching a browser if output is unwritable
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Harvest ----
    let browser = ChromeAutomation::launch(&config)
        .await
        .map_err(ScrapeError::Browser)?;
    let articles = scraper::extract_data(&browser, &config, &params, Utc::now()).await?;
    info!(count = articles.len(), "Articles harvested");

    // ---- Images ----
    let mut downloader = ImageDownloader::new(&config.output_dir);
    let mut rows = Vec::with_capacity(articles.len());
    for article in &articles {
        let image_file = match &article.image_url {
            Some(url) => downloader.download(url).await.inspect_err(|e| {
                error!(
                    title = %truncate_for_log(&article.title, 80),
                    error = %e,
                    "Image download failed; aborting without spreadsheet"
                );
            })?,
            None => String::new(),
        };
        rows.push(ArticleRow::new(article, image_file, &params.search_phrase));
    }

    // ---- Spreadsheet ----
    let spreadsheet_path = config.spreadsheet_path();
    spreadsheet::write_rows(&spreadsheet_path, &rows)?;
    info!(path = %spreadsheet_path.display(), rows = rows.len(), "Wrote spreadsheet");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
