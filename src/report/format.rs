//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the reshaping code stays clean and testable
//! - output changes are localized (the TUI and the `table` command share it)

use crate::domain::{AxisRange, MonthEndSummary, WideSeriesTable};
use crate::reshape::Crosshair;

const DATE_WIDTH: usize = 12;
const VALUE_WIDTH: usize = 9;

/// "Data source: FRED as of YYYY-MM-DD".
pub fn format_as_of(table: &WideSeriesTable) -> String {
    match table.latest_date() {
        Some(date) => format!("Data source: FRED as of {date}"),
        None => "Data source: FRED (no data)".to_string(),
    }
}

pub fn format_axis_range(range: &AxisRange) -> String {
    format!("Yield axis: [{:.1}, {:.1}]%", range.low, range.high)
}

/// Fixed-width month-end table: one row per month, absent cells as `-`.
pub fn format_month_end_table(summary: &MonthEndSummary) -> String {
    let mut out = String::new();

    let mut header = format!("{:<DATE_WIDTH$}", "Date");
    let mut rule = format!("{:-<DATE_WIDTH$}", "");
    for s in &summary.series {
        header.push_str(&format!(" {:>VALUE_WIDTH$}", s.label()));
        rule.push_str(&format!(" {:-<VALUE_WIDTH$}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in &summary.rows {
        let mut line = format!("{:<DATE_WIDTH$}", row.date.to_string());
        for v in &row.values {
            line.push_str(&format!(" {:>VALUE_WIDTH$}", fmt_cell(*v)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// One-line crosshair readout: `2022-09-06  5 Year 3.40  10 Year 3.30`.
pub fn format_crosshair(hit: &Crosshair) -> String {
    let mut out = hit.date.to_string();
    for (series, value) in &hit.values {
        out.push_str(&format!("  {} {value:.2}", series.label()));
    }
    out
}

fn fmt_cell(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
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
    fn month_end_table_snapshot() {
        let summary = MonthEndSummary {
            series: vec![SeriesName::ThreeMonth, SeriesName::TenYear],
            rows: vec![
                MonthEndRow {
                    year: 2023,
                    month: 1,
                    date: d(2023, 1, 31),
                    values: vec![Some(4.7), Some(3.52)],
                },
                MonthEndRow {
                    year: 2023,
                    month: 2,
                    date: d(2023, 2, 28),
                    values: vec![None, Some(3.92)],
                },
            ],
        };
        let expected = concat!(
            "Date           3 Month   10 Year\n",
            "------------ --------- ---------\n",
            "2023-01-31        4.70      3.52\n",
            "2023-02-28           -      3.92\n",
        );
        assert_eq!(format_month_end_table(&summary), expected);
    }

    #[test]
    fn as_of_uses_latest_table_date() {
        let table = WideSeriesTable::from_series(vec![(
            SeriesName::TenYear,
            vec![(d(2024, 5, 30), 4.5), (d(2024, 5, 31), 4.51)],
        )]);
        assert_eq!(format_as_of(&table), "Data source: FRED as of 2024-05-31");
    }

    #[test]
    fn crosshair_readout() {
        let hit = Crosshair {
            date: d(2022, 9, 6),
            values: vec![(SeriesName::FiveYear, 3.4), (SeriesName::TenYear, 3.3)],
        };
        assert_eq!(format_crosshair(&hit), "2022-09-06  5 Year 3.40  10 Year 3.30");
        assert_eq!(
            format_axis_range(&AxisRange { low: 3.0, high: 3.5 }),
            "Yield axis: [3.0, 3.5]%"
        );
    }
}
