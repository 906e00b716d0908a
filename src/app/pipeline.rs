//! Shared dashboard pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load table -> long form -> axis range -> month-end summary -> quarter rules
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::NaiveDate;

use crate::data::FredClient;
use crate::domain::{AxisRange, DashboardConfig, LongObservation, MonthEndSummary, WideSeriesTable};
use crate::error::AppError;
use crate::reshape::{compute_axis_range, distinct_dates, month_end_summary, quarter_starts, to_long};

/// Everything the renderers need from one table.
#[derive(Debug, Clone)]
pub struct DashboardData {
    /// The table as loaded (handed to the agent unmodified).
    pub table: WideSeriesTable,
    /// Unfiltered long observations on/after the chart floor.
    pub long: Vec<LongObservation>,
    /// Axis range over `long`; stable across selection changes.
    pub axis: AxisRange,
    pub summary: MonthEndSummary,
    /// Ascending trading days in `long` (crosshair steps).
    pub dates: Vec<NaiveDate>,
    pub quarter_starts: Vec<NaiveDate>,
}

/// Load the wide table from CSV or FRED.
pub fn load_table(config: &DashboardConfig) -> Result<WideSeriesTable, AppError> {
    match &config.csv_path {
        Some(path) => Ok(crate::io::read_wide_csv(path)?.table),
        None => {
            let client = FredClient::from_env()?;
            client.fetch_table(&config.series, config.observation_start)
        }
    }
}

/// Reshape a loaded table for charting and the summary panel.
pub fn build_dashboard(config: &DashboardConfig, table: WideSeriesTable) -> Result<DashboardData, AppError> {
    let long = to_long(&table, &config.series, config.chart_floor)?;
    let axis = compute_axis_range(&long)?;
    let summary = month_end_summary(&table, &config.series, config.summary_floor)?;

    let dates = distinct_dates(&long);
    let quarter_starts = match (dates.first(), dates.last()) {
        (Some(&first), Some(&last)) => quarter_starts(first, last),
        _ => Vec::new(),
    };

    log::info!(
        "dashboard: {} observations over {} days, axis [{}, {}], {} months",
        long.len(),
        dates.len(),
        axis.low,
        axis.high,
        summary.rows.len()
    );

    Ok(DashboardData {
        table,
        long,
        axis,
        summary,
        dates,
        quarter_starts,
    })
}

/// Load and reshape in one step.
pub fn run_dashboard(config: &DashboardConfig) -> Result<DashboardData, AppError> {
    let table = load_table(config)?;
    build_dashboard(config, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesName;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config(series: Vec<SeriesName>) -> DashboardConfig {
        DashboardConfig {
            csv_path: None,
            observation_start: d(2000, 1, 1),
            series,
            chart_floor: Some(d(2022, 9, 1)),
            summary_floor: Some(d(2022, 1, 1)),
            agent_model: "gpt-4o".to_string(),
            agent_context_floor: None,
        }
    }

    #[test]
    fn builds_every_output_from_one_table() {
        let table = WideSeriesTable::from_series(vec![
            (
                SeriesName::FiveYear,
                vec![(d(2022, 8, 31), 3.3), (d(2022, 9, 30), 4.1), (d(2022, 10, 3), 3.9)],
            ),
            (
                SeriesName::TenYear,
                vec![(d(2022, 8, 31), 3.2), (d(2022, 9, 30), 3.8), (d(2022, 10, 3), 3.65)],
            ),
        ]);
        let data = build_dashboard(&config(vec![SeriesName::FiveYear, SeriesName::TenYear]), table).unwrap();

        assert_eq!(data.long.len(), 4);
        assert_eq!(data.axis, AxisRange { low: 3.5, high: 4.5 });
        assert_eq!(data.summary.rows.len(), 3);
        assert_eq!(data.dates, vec![d(2022, 9, 30), d(2022, 10, 3)]);
        assert_eq!(data.quarter_starts, vec![d(2022, 10, 1)]);
        assert_eq!(data.table.len(), 3);
    }

    #[test]
    fn empty_chart_window_is_no_data() {
        let table = WideSeriesTable::from_series(vec![(SeriesName::TenYear, vec![(d(2022, 8, 1), 2.6)])]);
        let err = build_dashboard(&config(vec![SeriesName::TenYear]), table).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_series_is_a_config_error() {
        let table = WideSeriesTable::from_series(vec![(SeriesName::TenYear, vec![(d(2022, 9, 1), 3.2)])]);
        let err = build_dashboard(&config(vec![SeriesName::ThirtyYear]), table).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
