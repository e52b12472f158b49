//! Raw alarm export reading
//!
//! Turns a spreadsheet or CSV export into a polars DataFrame of nullable string columns.
//! The export carries a title row above the header, so the header is read from a
//! configurable physical row (row index 1 by default) and everything above it is skipped.
//!
//! Two source capabilities feed the same reader:
//! - `TableSource::Path`: file on disk, format detected from the extension
//! - `TableSource::Buffer`: bytes already in memory (uploads, stdin)

use super::error::{AlarmError, Result};
use super::timestamp::DAY_FIRST_FORMAT;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader};
use csv::ReaderBuilder;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Container format of a raw export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx / xlsm / xlsb / xls / ods workbook (first sheet is used)
    Spreadsheet,
    /// Comma separated values
    Csv,
}

impl SourceFormat {
    /// Guess the format from a file extension; anything that is not `.csv` is a workbook
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            _ => SourceFormat::Spreadsheet,
        }
    }

    /// Parse a user-facing name ("spreadsheet", "xlsx", "csv")
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "spreadsheet" | "excel" | "xlsx" | "xls" | "ods" => Some(SourceFormat::Spreadsheet),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// Where the raw export comes from
#[derive(Debug, Clone)]
pub enum TableSource {
    Path(PathBuf),
    Buffer { bytes: Vec<u8>, format: SourceFormat },
}

impl TableSource {
    fn origin(&self) -> String {
        match self {
            TableSource::Path(path) => path.display().to_string(),
            TableSource::Buffer { bytes, .. } => format!("in-memory buffer ({} bytes)", bytes.len()),
        }
    }
}

/// Read a raw export into a DataFrame
///
/// # Arguments
/// * `source` - File path or in-memory buffer
/// * `header_row` - Zero-based physical row holding the column names
///
/// # Returns
/// DataFrame with one nullable string column per header cell, names trimmed
pub fn read_raw_table(source: &TableSource, header_row: usize) -> Result<DataFrame> {
    let origin = source.origin();
    let rows = match source {
        TableSource::Path(path) => {
            if !path.exists() {
                return Err(AlarmError::MissingSource { path: path.clone() });
            }
            match SourceFormat::from_path(path) {
                SourceFormat::Csv => {
                    let bytes = std::fs::read(path)?;
                    csv_rows(&bytes, &origin)?
                }
                SourceFormat::Spreadsheet => {
                    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(&origin, e))?;
                    first_sheet(&mut workbook, &origin)?
                }
            }
        }
        TableSource::Buffer { bytes, format } => match format {
            SourceFormat::Csv => csv_rows(bytes, &origin)?,
            SourceFormat::Spreadsheet => {
                let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.clone()))
                    .map_err(|e| unreadable(&origin, e))?;
                first_sheet(&mut workbook, &origin)?
            }
        },
    };

    let frame = rows_to_frame(rows, header_row, &origin)?;
    tracing::info!(
        source = %origin,
        rows = frame.height(),
        cols = frame.width(),
        "Raw alarm export read"
    );
    Ok(frame)
}

fn unreadable(origin: &str, error: impl std::fmt::Display) -> AlarmError {
    AlarmError::UnreadableSource {
        origin: origin.to_string(),
        reason: error.to_string(),
    }
}

/// Physical rows of the first worksheet, starting at physical row 0
fn first_sheet<R, RS>(workbook: &mut R, origin: &str) -> Result<Vec<Vec<Option<String>>>>
where
    R: Reader<RS>,
    RS: std::io::Read + std::io::Seek,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable(origin, "workbook has no sheets"))?
        .map_err(|e| unreadable(origin, e))?;
    Ok(range_rows(&range))
}

fn range_rows(range: &Range<Data>) -> Vec<Vec<Option<String>>> {
    // The used range may start below/right of A1; pad so indices stay physical
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![None; start_col as usize];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }
    rows
}

/// Text form of a spreadsheet cell; empty cells are null
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => non_blank(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(parsed) => parsed.format(DAY_FIRST_FORMAT).to_string(),
            None => format_float(dt.as_f64()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => non_blank(s),
        Data::Error(e) => Some(e.to_string()),
    }
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Physical CSV records; the header is not interpreted here
fn csv_rows(bytes: &[u8], origin: &str) -> Result<Vec<Vec<Option<String>>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| unreadable(origin, format!("Failed to parse CSV row: {}", e)))?;
        rows.push(record.iter().map(non_blank).collect());
    }
    Ok(rows)
}

/// Build the DataFrame from physical rows, using `header_row` as the column names
fn rows_to_frame(rows: Vec<Vec<Option<String>>>, header_row: usize, origin: &str) -> Result<DataFrame> {
    let mut rows = rows.into_iter().skip(header_row);
    let header = rows
        .next()
        .ok_or_else(|| unreadable(origin, format!("no header at physical row {}", header_row + 1)))?;

    let body: Vec<Vec<Option<String>>> = rows
        .filter(|row| row.iter().any(Option::is_some))
        .collect();

    let width = body.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    let names = column_names(&header, width);

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<String>> = body
                .iter()
                .map(|row| row.get(idx).cloned().flatten())
                .collect();
            Column::from(Series::new(name.as_str().into(), values))
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Trimmed header names; blanks become `Unnamed: <idx>`, repeats get `.1`, `.2`, ...
fn column_names(header: &[Option<String>], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    (0..width)
        .map(|idx| {
            let base = header
                .get(idx)
                .cloned()
                .flatten()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {}", idx));

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::timestamp::parse_day_first;
    use chrono::{NaiveDate, Timelike};
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use std::io::Write;

    const EXPORT_CSV: &str = "\
Trouble Ticket Log,,,
 OpenTime , Cluster ,SourceInput,ClearedDateTime
18-10-2024 09:15,Pune-1,RJIO,
18-10-2024 10:00,Goa,Mobile,18-10-2024 11:00
,,,
";

    fn string_values(frame: &DataFrame, name: &str) -> Vec<Option<String>> {
        frame
            .column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_csv_buffer_skips_title_row_and_trims_headers() {
        let source = TableSource::Buffer {
            bytes: EXPORT_CSV.as_bytes().to_vec(),
            format: SourceFormat::Csv,
        };
        let frame = read_raw_table(&source, 1).unwrap();

        let names: Vec<&str> = frame.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["OpenTime", "Cluster", "SourceInput", "ClearedDateTime"]);

        // Blank trailing record is dropped
        assert_eq!(frame.height(), 2);
        assert_eq!(
            string_values(&frame, "ClearedDateTime"),
            vec![None, Some("18-10-2024 11:00".to_string())]
        );
        assert_eq!(
            string_values(&frame, "Cluster"),
            vec![Some("Pune-1".to_string()), Some("Goa".to_string())]
        );
    }

    #[test]
    fn test_csv_path_source() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(EXPORT_CSV.as_bytes()).unwrap();

        let frame = read_raw_table(&TableSource::Path(file.path().to_path_buf()), 1).unwrap();
        assert_eq!(frame.shape(), (2, 4));
    }

    #[test]
    fn test_missing_path_is_missing_source() {
        let err = read_raw_table(&TableSource::Path(PathBuf::from("/nonexistent/Raw_data.xlsx")), 1)
            .unwrap_err();
        assert!(matches!(err, AlarmError::MissingSource { .. }));
    }

    fn day(hour: u16, min: u8) -> ExcelDateTime {
        ExcelDateTime::from_ymd(2024, 10, 18)
            .unwrap()
            .and_hms(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn test_workbook_with_title_row_and_datetime_cells() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let stamp = Format::new().set_num_format("dd-mm-yyyy hh:mm");

        sheet.write_string(0, 0, "Trouble Ticket Log").unwrap();
        for (col, name) in [" OpenTime ", "Cluster ", "ClearedDateTime"].into_iter().enumerate() {
            sheet.write_string(1, col as u16, name).unwrap();
        }
        sheet.write_datetime_with_format(2, 0, &day(9, 15), &stamp).unwrap();
        sheet.write_string(2, 1, "Pune-1").unwrap();
        sheet.write_datetime_with_format(3, 0, &day(10, 0), &stamp).unwrap();
        sheet.write_string(3, 1, "Goa").unwrap();
        sheet.write_datetime_with_format(3, 2, &day(11, 30), &stamp).unwrap();

        let source = TableSource::Buffer {
            bytes: workbook.save_to_buffer().unwrap(),
            format: SourceFormat::Spreadsheet,
        };
        let frame = read_raw_table(&source, 1).unwrap();

        let names: Vec<&str> = frame.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["OpenTime", "Cluster", "ClearedDateTime"]);
        assert_eq!(frame.height(), 2);

        // Date cells come back as day-first text
        let open_times = string_values(&frame, "OpenTime");
        for (value, hour) in open_times.iter().zip([9, 10]) {
            let value = value.as_deref().unwrap();
            assert!(value.starts_with("18-10-2024"), "{}", value);
            let parsed = parse_day_first(value).unwrap();
            assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 10, 18).unwrap());
            assert!(parsed.hour() == hour || parsed.hour() + 1 == hour);
        }

        let cleared = string_values(&frame, "ClearedDateTime");
        assert_eq!(cleared[0], None);
        assert!(cleared[1].as_deref().unwrap().starts_with("18-10-2024"));
    }

    #[test]
    fn test_workbook_used_range_below_a1_is_padded() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        // Nothing in row 1 or column A; header sits at B2
        sheet.write_string(1, 1, "Cluster").unwrap();
        sheet.write_string(1, 2, "SiteName").unwrap();
        sheet.write_string(2, 1, "Pune-1").unwrap();
        sheet.write_string(2, 2, "PUN-0001").unwrap();

        let source = TableSource::Buffer {
            bytes: workbook.save_to_buffer().unwrap(),
            format: SourceFormat::Spreadsheet,
        };
        let frame = read_raw_table(&source, 1).unwrap();

        let names: Vec<&str> = frame.get_column_names().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Unnamed: 0", "Cluster", "SiteName"]);
        assert_eq!(string_values(&frame, "Unnamed: 0"), vec![None]);
        assert_eq!(string_values(&frame, "SiteName"), vec![Some("PUN-0001".to_string())]);
    }

    #[test]
    fn test_garbage_spreadsheet_is_unreadable() {
        let source = TableSource::Buffer {
            bytes: b"definitely not a workbook".to_vec(),
            format: SourceFormat::Spreadsheet,
        };
        let err = read_raw_table(&source, 1).unwrap_err();
        assert!(matches!(err, AlarmError::UnreadableSource { .. }));
    }

    #[test]
    fn test_header_row_past_end_is_unreadable() {
        let source = TableSource::Buffer {
            bytes: b"only one line\n".to_vec(),
            format: SourceFormat::Csv,
        };
        let err = read_raw_table(&source, 1).unwrap_err();
        assert!(matches!(err, AlarmError::UnreadableSource { .. }));
    }

    #[test]
    fn test_column_names_blank_and_duplicate() {
        let header = vec![
            Some("Status".to_string()),
            None,
            Some(" Status ".to_string()),
            Some("Status".to_string()),
        ];
        assert_eq!(
            column_names(&header, 5),
            vec!["Status", "Unnamed: 1", "Status.1", "Status.2", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let rows = vec![
            vec![Some("title".to_string())],
            vec![Some("A".to_string()), Some("B".to_string())],
            vec![Some("a1".to_string())],
        ];
        let frame = rows_to_frame(rows, 1, "test").unwrap();
        assert_eq!(frame.shape(), (1, 2));
        assert_eq!(string_values(&frame, "B"), vec![None]);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".to_string())), None);
        assert_eq!(cell_text(&Data::Int(42)), Some("42".to_string()));
        assert_eq!(cell_text(&Data::Float(7.0)), Some("7".to_string()));
        assert_eq!(cell_text(&Data::Float(7.5)), Some("7.5".to_string()));
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-10-18T09:15:00".to_string())),
            Some("2024-10-18T09:15:00".to_string())
        );
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("a/Raw_data.CSV")), SourceFormat::Csv);
        assert_eq!(
            SourceFormat::from_path(Path::new("a/Raw_data.xlsx")),
            SourceFormat::Spreadsheet
        );
        assert_eq!(SourceFormat::parse("xlsx"), Some(SourceFormat::Spreadsheet));
        assert_eq!(SourceFormat::parse("CSV"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::parse("pdf"), None);
    }
}
