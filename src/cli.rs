//! Command-line interface definitions.
//!
//! Run parameters come either from flags (with environment fallbacks) or
//! from a JSON work-item file; the work item wins when both are given.

use crate::models::RunParams;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// latimes_harvester -s climate -t Science -n 2
///
/// # Parameters from a work item, custom selectors and output directory
/// latimes_harvester -w work_item.json -c config.yaml -o ./output
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Phrase to search for
    #[arg(short, long, env = "SEARCH_PHRASE")]
    pub search_phrase: Option<String>,

    /// Topic filter to apply (empty for none)
    #[arg(short, long, env = "TOPIC", default_value = "")]
    pub topic: String,

    /// Months of news to collect, counting the current month
    #[arg(short = 'n', long, env = "MONTHS", default_value_t = 1)]
    pub months: u32,

    /// JSON file with search_phrase, topic and months
    #[arg(short, long)]
    pub work_item: Option<PathBuf>,

    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for images and the spreadsheet
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

impl Cli {
    /// Resolve the run parameters from the work item or the flags.
    pub fn run_params(&self) -> Result<RunParams, Box<dyn Error>> {
        if let Some(path) = &self.work_item {
            return RunParams::from_work_item(path);
        }
        let search_phrase = self
            .search_phrase
            .clone()
            .filter(|p| !p.trim().is_empty())
            .ok_or("a search phrase is required (--search-phrase or --work-item)")?;
        Ok(RunParams {
            search_phrase,
            topic: self.topic.clone(),
            months: self.months,
        })
    }
}
