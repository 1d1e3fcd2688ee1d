//! Text scans and file system helpers.
//!
//! - Search phrase counting and money detection for spreadsheet rows
//! - Log-friendly truncation of scraped text
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static MONEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    // Unit words are case-sensitive and take exactly one space.
    [
        // $1,000 or $1,000.50
        r"\$\d{1,3}(,\d{3})+(\.\d+)?",
        // $100 or $100.50
        r"\$\d+(\.\d+)?",
        // 100 dollars, 1,500 dollars
        r"\d+ dollars",
        // 100 USD
        r"\d+ USD",
        // 100k USD, 2m USD
        r"\d+[km] USD",
        // 100k dollars, 2.5m dollars
        r"\d+(\.\d+)?[km] dollars",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("money pattern is valid"))
    .collect()
});

/// Whether `text` mentions an amount of money.
pub fn contains_money(text: &str) -> bool {
    MONEY_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Case-insensitive, non-overlapping occurrences of `phrase` in `text`.
///
/// An empty phrase never matches.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(&phrase.to_lowercase()).count()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary near `max` bytes and get
/// a `"…(+N bytes)"` suffix.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
