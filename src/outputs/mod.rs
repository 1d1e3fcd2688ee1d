//! Output generation: downloaded images and the spreadsheet.
//!
//! # Submodules
//!
//! - [`images`]: downloads each article's lead image into the output directory
//! - [`spreadsheet`]: writes one row per article to an `.xlsx` workbook
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news_data.xlsx
//! ├── wildfire.jpg
//! └── storm-warning.jpg
//! ```

pub mod images;
pub mod spreadsheet;
