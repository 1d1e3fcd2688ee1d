//! Run settings and the site locator table.
//!
//! Defaults target the latimes.com search page. Any field can be overridden
//! from a YAML file passed with `--config`; omitted fields keep their
//! defaults.
//!
//! ```yaml
//! output_dir: ./out
//! pagination_attempts: 5
//! locators:
//!   next_page: "div.search-results-module-next-page a"
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration handed to every pipeline component.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Site entry point.
    pub base_url: String,
    /// Directory receiving images and the spreadsheet.
    pub output_dir: PathBuf,
    /// Spreadsheet file name inside `output_dir`.
    pub spreadsheet_name: String,
    /// `<option>` value of the "newest first" sort entry.
    pub newest_sort_value: String,
    pub headless: bool,
    /// Total click attempts allowed per next-page advance.
    pub pagination_attempts: u32,
    /// Where to save a screenshot when the run fails, if anywhere.
    pub failure_screenshot: Option<PathBuf>,
    pub timeouts: Timeouts,
    pub locators: Locators,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com/".to_string(),
            output_dir: PathBuf::from("output"),
            spreadsheet_name: "news_data.xlsx".to_string(),
            newest_sort_value: "1".to_string(),
            headless: true,
            pagination_attempts: 3,
            failure_screenshot: None,
            timeouts: Timeouts::default(),
            locators: Locators::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn spreadsheet_path(&self) -> PathBuf {
        self.output_dir.join(&self.spreadsheet_name)
    }
}

/// Bounded waits, in milliseconds so they read naturally in YAML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    pub element_ms: u64,
    pub loading_appear_ms: u64,
    pub loading_disappear_ms: u64,
    pub result_count_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            element_ms: 30_000,
            loading_appear_ms: 5_000,
            loading_disappear_ms: 3_000,
            result_count_ms: 30_000,
            poll_interval_ms: 250,
        }
    }
}

impl Timeouts {
    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }

    pub fn loading_appear(&self) -> Duration {
        Duration::from_millis(self.loading_appear_ms)
    }

    pub fn loading_disappear(&self) -> Duration {
        Duration::from_millis(self.loading_disappear_ms)
    }

    pub fn result_count(&self) -> Duration {
        Duration::from_millis(self.result_count_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Flat selector table for the search results page.
///
/// `topic_checkbox` and `topic_count` are templates: `{topic}` is replaced
/// by the requested topic name.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Locators {
    pub search_button: String,
    pub search_input: String,
    pub submit_button: String,
    pub topic_filter_toggle: String,
    pub topic_checkbox: String,
    pub topic_count: String,
    pub result_count: String,
    pub sort_select: String,
    pub result_item: String,
    pub item_title: String,
    pub item_description: String,
    pub item_date: String,
    pub item_date_attribute: String,
    pub item_image: String,
    pub next_page: String,
    pub loading_indicator: String,
    pub overlay_host: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            search_button: r#"button[data-element="search-button"]"#.to_string(),
            search_input: r#"input[data-element="search-form-input"]"#.to_string(),
            submit_button: r#"button[data-element="search-submit-button"]"#.to_string(),
            topic_filter_toggle: "div.search-filter-menu-wrapper button.see-all-button"
                .to_string(),
            topic_checkbox: "xpath://span[text()='{topic}']/preceding-sibling::input".to_string(),
            topic_count: "xpath://span[text()='{topic}']/ancestor::li//span[contains(@class,'search-filter-count')]"
                .to_string(),
            result_count: "span.search-results-module-count-desc".to_string(),
            sort_select: "select.select-input".to_string(),
            result_item: "ul.search-results-module-results-menu > li".to_string(),
            item_title: "h3.promo-title".to_string(),
            item_description: "p.promo-description".to_string(),
            item_date: "p.promo-timestamp".to_string(),
            item_date_attribute: "data-timestamp".to_string(),
            item_image: "img.image".to_string(),
            next_page: "div.search-results-module-next-page a".to_string(),
            loading_indicator: "div.loading-icon".to_string(),
            overlay_host: "modality-custom-element".to_string(),
        }
    }
}

impl Locators {
    pub fn topic_checkbox_for(&self, topic: &str) -> String {
        self.topic_checkbox.replace("{topic}", topic)
    }

    pub fn topic_count_for(&self, topic: &str) -> String {
        self.topic_count.replace("{topic}", topic)
    }

    /// Script that removes the metering overlay host from the document.
    pub fn overlay_removal_script(&self) -> String {
        format!(
            "document.querySelectorAll({}).forEach(e => e.remove())",
            serde_json::Value::String(self.overlay_host.clone())
        )
    }
}
