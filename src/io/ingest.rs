//! Wide-table CSV ingest.
//!
//! Offline alternative to the FRED fetch. Expected layout:
//!
//! ```text
//! date,3 Month,5 Year,10 Year,30 Year
//! 2022-09-01,2.97,3.47,3.26,3.39
//! 2022-09-05,,,,
//! ```
//!
//! Series columns may use labels (`10 Year`) or FRED ids (`DGS10`), any case.
//! Unrecognized columns are ignored, as is a second column for the same series.
//! Empty cells, FRED's `.` and non-finite numbers are absent. Repeated dates
//! are merged.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::data::fred::parse_value;
use crate::domain::{SeriesName, WideSeriesTable};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the joined table plus bookkeeping.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: WideSeriesTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a wide CSV file.
pub fn read_wide_csv(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let ingested = read_wide_csv_from(file)?;
    log::info!(
        "read {} ({} rows used of {}, {} errors)",
        path.display(),
        ingested.rows_used,
        ingested.rows_read,
        ingested.row_errors.len()
    );
    Ok(ingested)
}

/// Load a wide CSV from any reader.
pub fn read_wide_csv_from<R: Read>(input: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::new(2, "Missing required column: `date`"))?;

    let mut series_cols: Vec<(SeriesName, usize)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        let Some(series) = SeriesName::from_label(name.trim_start_matches('\u{feff}')) else {
            continue;
        };
        if series_cols.iter().any(|&(seen, _)| seen == series) {
            log::warn!("ignoring CSV column '{name}': `{series}` already read from an earlier column");
            continue;
        }
        series_cols.push((series, idx));
    }
    if series_cols.is_empty() {
        return Err(AppError::new(
            2,
            "No series columns found. Expected labels like `10 Year` or FRED ids like `DGS10`.",
        ));
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header, lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, date_idx, &series_cols) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {} // every series absent
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        log::warn!("skipped CSV line {}: {}", err.line, err.message);
    }

    let rows_used = rows.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows in CSV."));
    }

    // Stable sort keeps file order for repeated dates.
    rows.sort_by_key(|(date, _)| *date);
    let rows = merge_repeated_dates(rows);

    let mut columns: BTreeMap<SeriesName, Vec<Option<f64>>> = BTreeMap::new();
    for (col, &(series, _)) in series_cols.iter().enumerate() {
        columns.insert(series, rows.iter().map(|(_, cells)| cells[col]).collect());
    }
    let dates = rows.into_iter().map(|(date, _)| date).collect();
    let table = WideSeriesTable::new(dates, columns)?;

    Ok(IngestedTable {
        table,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the `date` column goes missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(
    record: &StringRecord,
    date_idx: usize,
    series_cols: &[(SeriesName, usize)],
) -> Result<Option<(NaiveDate, Vec<Option<f64>>)>, String> {
    let raw_date = record
        .get(date_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing required value: `date`".to_string())?;
    let date = parse_date(raw_date)?;

    let mut cells = Vec::with_capacity(series_cols.len());
    for &(series, idx) in series_cols {
        let raw = record.get(idx).unwrap_or("").trim();
        cells.push(parse_cell(raw).ok_or_else(|| format!("Invalid `{series}` value '{raw}'"))?);
    }

    if cells.iter().all(Option::is_none) {
        return Ok(None);
    }
    Ok(Some((date, cells)))
}

/// `Some(None)` for missing markers and non-finite numbers, `None` when the
/// text is not a number at all.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    if raw.is_empty() || raw == "." {
        return Some(None);
    }
    raw.parse::<f64>().ok().map(|_| parse_value(raw))
}

/// Fold rows sharing a date into one; per series the later present cell wins.
fn merge_repeated_dates(rows: Vec<(NaiveDate, Vec<Option<f64>>)>) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
    let mut merged: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::with_capacity(rows.len());
    for (date, cells) in rows {
        match merged.last_mut() {
            Some((last_date, last_cells)) if *last_date == date => {
                log::warn!("repeated CSV date {date}: later values win");
                for (slot, cell) in last_cells.iter_mut().zip(cells) {
                    if cell.is_some() {
                        *slot = cell;
                    }
                }
            }
            _ => merged.push((date, cells)),
        }
    }
    merged
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO first; spreadsheet exports often use day-first or slashed forms.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_labels_ids_and_missing_markers() {
        let csv = "\u{feff}Date,DGS3MO,10 Year,Notes\n\
                   2022-09-02,2.99,3.19,x\n\
                   2022-09-01,2.97,.,\n\
                   2022-09-05,,,holiday\n";
        let ingested = read_wide_csv_from(csv.as_bytes()).unwrap();
        let table = &ingested.table;

        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.rows_used, 2);
        assert!(ingested.row_errors.is_empty());
        assert_eq!(table.dates(), &[d(2022, 9, 1), d(2022, 9, 2)]);
        assert_eq!(table.column(SeriesName::ThreeMonth).unwrap(), &[Some(2.97), Some(2.99)]);
        assert_eq!(table.column(SeriesName::TenYear).unwrap(), &[None, Some(3.19)]);
        assert!(table.column(SeriesName::FiveYear).is_none());
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let csv = "date,10 Year\n2022-09-01,3.2\nnot-a-date,3.3\n2022-09-02,abc\n";
        let ingested = read_wide_csv_from(csv.as_bytes()).unwrap();
        assert_eq!(ingested.rows_used, 1);
        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn missing_date_column_is_a_config_error() {
        let err = read_wide_csv_from("day,10 Year\n2022-09-01,3.2\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_series_columns_is_a_config_error() {
        let err = read_wide_csv_from("date,2 Year\n2022-09-01,3.2\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_file_body_is_no_data() {
        let err = read_wide_csv_from("date,10 Year\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn non_finite_cells_are_absent_not_row_errors() {
        let csv = "date,5 Year,10 Year\n2022-09-01,NaN,3.2\n2022-09-02,inf,-inf\n";
        let ingested = read_wide_csv_from(csv.as_bytes()).unwrap();
        assert!(ingested.row_errors.is_empty());
        assert_eq!(ingested.rows_used, 1);
        assert_eq!(ingested.table.dates(), &[d(2022, 9, 1)]);
        assert_eq!(ingested.table.column(SeriesName::FiveYear).unwrap(), &[None]);
        assert_eq!(ingested.table.column(SeriesName::TenYear).unwrap(), &[Some(3.2)]);
    }

    #[test]
    fn repeated_dates_merge_with_later_values_winning() {
        let csv = "date,5 Year,10 Year\n\
                   2022-09-02,3.5,3.3\n\
                   2022-09-01,3.4,3.2\n\
                   2022-09-01,,3.25\n";
        let ingested = read_wide_csv_from(csv.as_bytes()).unwrap();
        let table = &ingested.table;
        assert_eq!(table.dates(), &[d(2022, 9, 1), d(2022, 9, 2)]);
        assert_eq!(table.column(SeriesName::FiveYear).unwrap(), &[Some(3.4), Some(3.5)]);
        assert_eq!(table.column(SeriesName::TenYear).unwrap(), &[Some(3.25), Some(3.3)]);
    }

    #[test]
    fn duplicate_series_header_keeps_first_column() {
        let csv = "date,DGS10,10 Year\n2022-09-01,3.2,9.9\n";
        let ingested = read_wide_csv_from(csv.as_bytes()).unwrap();
        assert_eq!(ingested.table.column(SeriesName::TenYear).unwrap(), &[Some(3.2)]);
        assert_eq!(ingested.table.series().count(), 1);
    }

    #[test]
    fn accepts_day_first_dates() {
        assert_eq!(parse_date("31/01/2023").unwrap(), d(2023, 1, 31));
        assert!(parse_date("2023.01.31").is_err());
    }
}
