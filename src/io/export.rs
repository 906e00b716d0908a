//! CSV exports of the reshaped tables.
//!
//! Both files are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{LongObservation, MonthEndSummary};
use crate::error::AppError;

/// Write long observations as `date,series,value`.
pub fn write_long_csv(path: &Path, observations: &[LongObservation]) -> Result<(), AppError> {
    let file = create(path)?;
    write_long(BufWriter::new(file), observations)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    log::info!("wrote {} observations to {}", observations.len(), path.display());
    Ok(())
}

/// Write the month-end table as `date,<series labels...>`.
pub fn write_month_end_csv(path: &Path, summary: &MonthEndSummary) -> Result<(), AppError> {
    let file = create(path)?;
    write_month_end(BufWriter::new(file), summary)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    log::info!("wrote {} month-end rows to {}", summary.rows.len(), path.display());
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

pub fn write_long<W: Write>(mut out: W, observations: &[LongObservation]) -> std::io::Result<()> {
    writeln!(out, "date,series,value")?;
    for o in observations {
        writeln!(out, "{},{},{:.4}", o.date, o.series.label(), o.value)?;
    }
    out.flush()
}

pub fn write_month_end<W: Write>(mut out: W, summary: &MonthEndSummary) -> std::io::Result<()> {
    let header: Vec<&str> = summary.series.iter().map(|s| s.label()).collect();
    writeln!(out, "date,{}", header.join(","))?;
    for row in &summary.rows {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|v| v.map(|v| format!("{v:.4}")).unwrap_or_default())
            .collect();
        writeln!(out, "{},{}", row.date, cells.join(","))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{MonthEndRow, SeriesName};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_end_csv_leaves_absent_cells_empty() {
        let summary = MonthEndSummary {
            series: vec![SeriesName::FiveYear, SeriesName::TenYear],
            rows: vec![MonthEndRow {
                year: 2023,
                month: 1,
                date: d(2023, 1, 31),
                values: vec![Some(4.0), None],
            }],
        };
        let mut buf = Vec::new();
        write_month_end(&mut buf, &summary).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "date,5 Year,10 Year\n2023-01-31,4.0000,\n"
        );
    }

    #[test]
    fn long_csv_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.csv");
        let obs = vec![LongObservation {
            date: d(2022, 9, 1),
            series: SeriesName::ThirtyYear,
            value: 3.39,
        }];
        write_long_csv(&path, &obs).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "date,series,value\n2022-09-01,30 Year,3.3900\n");
    }

    #[test]
    fn export_to_missing_directory_fails_with_config_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.csv");
        let err = write_long_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
