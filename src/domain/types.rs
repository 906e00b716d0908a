//! Shared domain types.
//!
//! This module defines:
//!
//! - the closed treasury series catalog (`SeriesName`)
//! - the wide input table (`WideSeriesTable`) and its long form (`LongObservation`)
//! - reshaping outputs (`AxisRange`, `MonthEndSummary`)
//! - run configuration (`DashboardConfig`)

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ReshapeError;

/// Treasury constant-maturity series tracked by the dashboard.
///
/// Declaration order is the catalog order: it drives colours, legend order,
/// selector order and summary column order. `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
pub enum SeriesName {
    #[serde(rename = "3 Month")]
    #[value(name = "3m")]
    ThreeMonth,
    #[serde(rename = "5 Year")]
    #[value(name = "5y")]
    FiveYear,
    #[serde(rename = "10 Year")]
    #[value(name = "10y")]
    TenYear,
    #[serde(rename = "30 Year")]
    #[value(name = "30y")]
    ThirtyYear,
}

impl SeriesName {
    pub const ALL: [SeriesName; 4] = [
        SeriesName::ThreeMonth,
        SeriesName::FiveYear,
        SeriesName::TenYear,
        SeriesName::ThirtyYear,
    ];

    /// Display label (also the CSV column header).
    pub fn label(self) -> &'static str {
        match self {
            SeriesName::ThreeMonth => "3 Month",
            SeriesName::FiveYear => "5 Year",
            SeriesName::TenYear => "10 Year",
            SeriesName::ThirtyYear => "30 Year",
        }
    }

    /// FRED series id (daily, percent).
    pub fn fred_id(self) -> &'static str {
        match self {
            SeriesName::ThreeMonth => "DGS3MO",
            SeriesName::FiveYear => "DGS5",
            SeriesName::TenYear => "DGS10",
            SeriesName::ThirtyYear => "DGS30",
        }
    }

    /// Position in the catalog.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a column header: either the label or the FRED id, case-insensitive.
    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|s| {
            s.label().eq_ignore_ascii_case(raw) || s.fred_id().eq_ignore_ascii_case(raw)
        })
    }
}

impl std::fmt::Display for SeriesName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Series selector state for the chart.
///
/// `All` is the initial state and shows every series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(SeriesName),
}

impl Selection {
    pub fn matches(self, series: SeriesName) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => selected == series,
        }
    }

    /// Next selector entry: `All` -> catalog order -> `All`.
    pub fn next(self, catalog: &[SeriesName]) -> Self {
        let pos = match self {
            Selection::All => None,
            Selection::Only(s) => catalog.iter().position(|&c| c == s),
        };
        let next = match pos {
            None => 0,
            Some(i) => i + 1,
        };
        catalog.get(next).map_or(Selection::All, |&s| Selection::Only(s))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Selection::All => "All",
            Selection::Only(s) => s.label(),
        }
    }
}

impl From<Option<SeriesName>> for Selection {
    fn from(value: Option<SeriesName>) -> Self {
        value.map_or(Selection::All, Selection::Only)
    }
}

/// One row per date, one column per series.
///
/// Dates are non-decreasing; every column has one cell per date. Absent
/// observations are `None`, never zero. The table is immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct WideSeriesTable {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<SeriesName, Vec<Option<f64>>>,
}

impl WideSeriesTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<SeriesName, Vec<Option<f64>>>,
    ) -> Result<Self, ReshapeError> {
        if let Some(w) = dates.windows(2).find(|w| w[0] > w[1]) {
            return Err(ReshapeError::Shape {
                reason: format!("dates out of order ({} after {})", w[1], w[0]),
            });
        }
        for (series, cells) in &columns {
            if cells.len() != dates.len() {
                return Err(ReshapeError::Shape {
                    reason: format!(
                        "column `{series}` has {} cells for {} dates",
                        cells.len(),
                        dates.len()
                    ),
                });
            }
        }
        Ok(Self { dates, columns })
    }

    /// Outer-join per-series observations on date.
    ///
    /// Non-finite values are treated as absent and dates where every series
    /// is absent are dropped. Within one series a repeated date keeps the
    /// last value supplied.
    pub fn from_series(series: Vec<(SeriesName, Vec<(NaiveDate, f64)>)>) -> Self {
        let mut lookups: BTreeMap<SeriesName, HashMap<NaiveDate, f64>> = BTreeMap::new();
        let mut all_dates = BTreeSet::new();

        for (name, obs) in series {
            let lookup = lookups.entry(name).or_default();
            for (date, value) in obs {
                if value.is_finite() {
                    lookup.insert(date, value);
                    all_dates.insert(date);
                }
            }
        }

        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
        let columns = lookups
            .into_iter()
            .map(|(name, lookup)| {
                let cells = dates.iter().map(|d| lookup.get(d).copied()).collect();
                (name, cells)
            })
            .collect();

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column(&self, series: SeriesName) -> Option<&[Option<f64>]> {
        self.columns.get(&series).map(Vec::as_slice)
    }

    /// Series present in the table, in catalog order.
    pub fn series(&self) -> impl Iterator<Item = SeriesName> + '_ {
        self.columns.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Latest date in the table (used for the "as of" label).
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Check that every requested series has a column.
    pub fn require(&self, series_order: &[SeriesName]) -> Result<(), ReshapeError> {
        match series_order.iter().find(|s| !self.columns.contains_key(s)) {
            Some(&missing) => Err(ReshapeError::Schema { missing }),
            None => Ok(()),
        }
    }

    /// Copy of the table restricted to rows on/after `floor`.
    pub fn since(&self, floor: NaiveDate) -> Self {
        let start = self.dates.partition_point(|d| *d < floor);
        Self {
            dates: self.dates[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(s, cells)| (*s, cells[start..].to_vec()))
                .collect(),
        }
    }
}

/// One present observation in long (tidy) form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LongObservation {
    pub date: NaiveDate,
    pub series: SeriesName,
    pub value: f64,
}

/// Value-axis bounds quantized to half units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub low: f64,
    pub high: f64,
}

impl AxisRange {
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// One calendar month of the month-end summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthEndRow {
    pub year: i32,
    pub month: u32,
    /// Latest date present in the month.
    pub date: NaiveDate,
    /// One cell per summary column, in column order.
    pub values: Vec<Option<f64>>,
}

impl MonthEndRow {
    pub fn value(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }
}

/// Month-end table: one row per calendar month, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthEndSummary {
    pub series: Vec<SeriesName>,
    pub rows: Vec<MonthEndRow>,
}

impl MonthEndSummary {
    /// Value for `series` in `row`, if that series is a column and observed.
    pub fn get(&self, row: usize, series: SeriesName) -> Option<f64> {
        let col = self.series.iter().position(|&s| s == series)?;
        self.rows.get(row)?.value(col)
    }
}

/// A run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Offline wide CSV; FRED is used when absent.
    pub csv_path: Option<PathBuf>,
    /// First date requested from FRED.
    pub observation_start: NaiveDate,
    /// Series to chart/summarize, in catalog order.
    pub series: Vec<SeriesName>,
    /// Chart rows before this date are dropped.
    pub chart_floor: Option<NaiveDate>,
    /// Summary rows before this date are dropped before grouping.
    pub summary_floor: Option<NaiveDate>,
    /// Chat model name for the question-answering agent.
    pub agent_model: String,
    /// Table rows before this date are not sent to the agent.
    pub agent_context_floor: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn series_labels_and_ids_resolve() {
        assert_eq!(SeriesName::from_label("10 year"), Some(SeriesName::TenYear));
        assert_eq!(SeriesName::from_label("dgs3mo"), Some(SeriesName::ThreeMonth));
        assert_eq!(SeriesName::from_label(" DGS30 "), Some(SeriesName::ThirtyYear));
        assert_eq!(SeriesName::from_label("2 Year"), None);
        assert!(SeriesName::ThreeMonth < SeriesName::ThirtyYear);
    }

    #[test]
    fn selection_cycles_through_catalog() {
        let catalog = SeriesName::ALL;
        let mut sel = Selection::default();
        assert_eq!(sel, Selection::All);
        let mut seen = Vec::new();
        for _ in 0..catalog.len() {
            sel = sel.next(&catalog);
            seen.push(sel);
        }
        assert_eq!(seen[0], Selection::Only(SeriesName::ThreeMonth));
        assert_eq!(seen[3], Selection::Only(SeriesName::ThirtyYear));
        assert_eq!(sel.next(&catalog), Selection::All);
        assert!(Selection::All.matches(SeriesName::FiveYear));
        assert!(!Selection::Only(SeriesName::TenYear).matches(SeriesName::FiveYear));
    }

    #[test]
    fn from_series_outer_joins_and_drops_empty_dates() {
        let table = WideSeriesTable::from_series(vec![
            (SeriesName::FiveYear, vec![(d(2023, 1, 3), 3.9), (d(2023, 1, 4), f64::NAN)]),
            (SeriesName::TenYear, vec![(d(2023, 1, 2), 3.7), (d(2023, 1, 3), 3.8)]),
        ]);
        assert_eq!(table.dates(), &[d(2023, 1, 2), d(2023, 1, 3)]);
        assert_eq!(table.column(SeriesName::FiveYear).unwrap(), &[None, Some(3.9)]);
        assert_eq!(table.column(SeriesName::TenYear).unwrap(), &[Some(3.7), Some(3.8)]);
        assert_eq!(table.latest_date(), Some(d(2023, 1, 3)));
    }

    #[test]
    fn new_rejects_ragged_and_unordered_tables() {
        let mut cols = BTreeMap::new();
        cols.insert(SeriesName::TenYear, vec![Some(1.0)]);
        let err = WideSeriesTable::new(vec![d(2023, 1, 2), d(2023, 1, 3)], cols.clone()).unwrap_err();
        assert!(matches!(err, ReshapeError::Shape { .. }));

        cols.insert(SeriesName::TenYear, vec![Some(1.0), Some(2.0)]);
        let err = WideSeriesTable::new(vec![d(2023, 1, 3), d(2023, 1, 2)], cols).unwrap_err();
        assert!(matches!(err, ReshapeError::Shape { .. }));
    }

    #[test]
    fn require_reports_first_missing_series() {
        let table = WideSeriesTable::from_series(vec![(SeriesName::TenYear, vec![(d(2023, 1, 2), 3.7)])]);
        assert!(table.require(&[SeriesName::TenYear]).is_ok());
        assert_eq!(
            table.require(&[SeriesName::TenYear, SeriesName::FiveYear]),
            Err(ReshapeError::Schema { missing: SeriesName::FiveYear })
        );
    }

    #[test]
    fn since_keeps_rows_on_and_after_floor() {
        let table = WideSeriesTable::from_series(vec![(
            SeriesName::TenYear,
            vec![(d(2022, 8, 31), 3.2), (d(2022, 9, 1), 3.3), (d(2022, 9, 2), 3.4)],
        )]);
        let tail = table.since(d(2022, 9, 1));
        assert_eq!(tail.dates(), &[d(2022, 9, 1), d(2022, 9, 2)]);
        assert_eq!(tail.column(SeriesName::TenYear).unwrap(), &[Some(3.3), Some(3.4)]);
    }
}
