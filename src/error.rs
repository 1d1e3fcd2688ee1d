//! Error taxonomy for a harvesting run.
//!
//! Tolerated absences (description, image, overlay, loading indicator) never
//! surface here; they are substituted where they occur. Everything in this
//! module ends the run.

use crate::automation::AutomationError;
use thiserror::Error;

/// Failure to read a result card.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The card has no readable millisecond-epoch date.
    #[error("result card has no usable publication date ({0})")]
    MissingDate(String),

    #[error("result card has no title")]
    MissingTitle,

    #[error(transparent)]
    Automation(#[from] AutomationError),
}

/// Fatal outcome of a harvesting run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("search session failed while trying to {step}: {source}")]
    Session {
        step: &'static str,
        #[source]
        source: AutomationError,
    },

    #[error("could not read a result count for topic '{topic}' from {text:?}")]
    TopicCount { topic: String, text: String },

    #[error("article extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("could not reach the next page after {attempts} attempts: {last}")]
    PaginationExhausted {
        attempts: u32,
        #[source]
        last: AutomationError,
    },

    #[error("pagination failed: {0}")]
    Pagination(#[source] AutomationError),

    /// The browser could not be started.
    #[error("browser unavailable: {0}")]
    Browser(#[source] AutomationError),
}
