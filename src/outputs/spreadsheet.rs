//! Spreadsheet output.
//!
//! One header row followed by one row per article, in harvest order.

use crate::models::ArticleRow;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use tracing::{info, instrument};

pub const HEADERS: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Image File",
    "Phrase Count",
    "Contains Money",
];

/// Write `rows` to a new workbook at `path`, replacing any existing file.
#[instrument(level = "info", skip(rows), fields(path = %path.display(), rows = rows.len()))]
pub fn write_rows(path: &Path, rows: &[ArticleRow]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col, title) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    sheet.set_column_width(0, 60)?;
    sheet.set_column_width(2, 80)?;

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, &row.title)?;
        sheet.write_string(r, 1, &row.date)?;
        sheet.write_string(r, 2, &row.description)?;
        sheet.write_string(r, 3, &row.image_file)?;
        sheet.write_number(r, 4, row.phrase_count as f64)?;
        sheet.write_boolean(r, 5, row.contains_money)?;
    }

    workbook.save(path)?;
    info!("Spreadsheet saved");
    Ok(())
}
