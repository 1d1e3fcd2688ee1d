//! Data models for harvested articles and run parameters.
//!
//! - [`RunParams`]: what to search for, supplied per run
//! - [`Article`]: one qualifying search result as read from the page
//! - [`ArticleRow`]: the spreadsheet projection of an [`Article`]

use crate::utils::{contains_money, count_phrase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Parameters of a single harvesting run.
///
/// Deserializes from the JSON work-item file accepted by `--work-item`:
///
/// ```json
/// { "search_phrase": "climate", "topic": "Science", "months": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunParams {
    pub search_phrase: String,
    /// Topic filter label; empty skips topic filtering.
    #[serde(default)]
    pub topic: String,
    /// Size of the publication window in calendar months.
    #[serde(default)]
    pub months: u32,
}

impl RunParams {
    pub fn from_work_item(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// A search result that falls inside the publication window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    /// Empty when the result card has no description.
    pub description: String,
    pub published_at: DateTime<Utc>,
    /// Lead image URL, when the card has one.
    pub image_url: Option<String>,
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleRow {
    pub title: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub description: String,
    /// File name inside the output directory; empty when there is no image.
    pub image_file: String,
    pub phrase_count: usize,
    pub contains_money: bool,
}

impl ArticleRow {
    pub fn new(article: &Article, image_file: String, search_phrase: &str) -> Self {
        Self {
            title: article.title.clone(),
            date: article.published_at.format("%Y-%m-%d").to_string(),
            description: article.description.clone(),
            image_file,
            phrase_count: count_phrase(&article.title, search_phrase)
                + count_phrase(&article.description, search_phrase),
            contains_money: contains_money(&format!("{} {}", article.title, article.description)),
        }
    }
}
