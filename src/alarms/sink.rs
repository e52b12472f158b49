//! Output adapters for cleaned tables and rendered images
//!
//! The pipeline and renderer only hand back values; persisting them is done here so the
//! same core serves both "write to a path" and "return the bytes" callers.

use super::error::Result;
use super::source::SourceFormat;
use polars::prelude::*;
use rust_xlsxwriter::{ColNum, Format, Workbook};
use std::fs;
use std::path::Path;

/// Write a DataFrame with its header row first, creating parent directories
///
/// A `.csv` path gets CSV; any other path gets a single-sheet xlsx workbook.
pub fn write_clean_table(frame: &DataFrame, path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let format = SourceFormat::from_path(path);
    match format {
        SourceFormat::Csv => write_csv(frame, path)?,
        SourceFormat::Spreadsheet => write_xlsx(frame, path)?,
    }

    tracing::info!(
        path = %path.display(),
        rows = frame.height(),
        cols = frame.width(),
        ?format,
        "Cleaned table written"
    );
    Ok(())
}

fn write_csv(frame: &DataFrame, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(frame.get_column_names().iter().map(|name| name.as_str()))?;

    let columns = string_columns(frame)?;
    for row in 0..frame.height() {
        writer.write_record(columns.iter().map(|col| col.get(row).unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Header in bold on row 1, data below; null cells stay empty
fn write_xlsx(frame: &DataFrame, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    let columns = string_columns(frame)?;
    for (idx, (name, values)) in frame.get_column_names().iter().zip(&columns).enumerate() {
        let col = ColNum::try_from(idx).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("too many columns for a worksheet: {}", frame.width()),
            )
        })?;
        sheet.write_string_with_format(0, col, name.as_str(), &bold)?;
        for (row, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                sheet.write_string(row as u32 + 1, col, value)?;
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Write PNG bytes to `path`, creating parent directories
pub fn write_image(png: &[u8], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, png)?;
    tracing::info!(path = %path.display(), bytes = png.len(), "Table image written");
    Ok(())
}

/// Every column cast to strings, in frame order
pub(crate) fn string_columns(frame: &DataFrame) -> Result<Vec<StringChunked>> {
    frame
        .get_columns()
        .iter()
        .map(|col| {
            let series = col.as_materialized_series().cast(&DataType::String)?;
            Ok(series.str()?.clone())
        })
        .collect()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
