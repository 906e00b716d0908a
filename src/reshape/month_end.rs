//! Month-end summary table.

use chrono::{Datelike, NaiveDate};

use crate::domain::{MonthEndRow, MonthEndSummary, SeriesName, WideSeriesTable};
use crate::error::ReshapeError;

/// Group rows by calendar month and keep each series' last observed value.
///
/// Rows before `date_floor` are removed before grouping, so a partial month
/// at the floor only sees its in-range rows. Within a month the cell for a
/// series is its value on the latest date it was observed; when two rows
/// share that date the later row in the table wins. A series never observed
/// in the month stays absent.
pub fn month_end_summary(
    wide: &WideSeriesTable,
    series_order: &[SeriesName],
    date_floor: Option<NaiveDate>,
) -> Result<MonthEndSummary, ReshapeError> {
    wide.require(series_order)?;

    let columns: Vec<&[Option<f64>]> = series_order
        .iter()
        .filter_map(|&s| wide.column(s))
        .collect();

    let start = match date_floor {
        Some(floor) => wide.dates().partition_point(|d| *d < floor),
        None => 0,
    };

    let mut rows: Vec<MonthEndRow> = Vec::new();
    for (row, &date) in wide.dates().iter().enumerate().skip(start) {
        let (year, month) = (date.year(), date.month());

        // Dates are sorted, so a month's rows are contiguous.
        let starts_new_month = rows
            .last()
            .is_none_or(|r| (r.year, r.month) != (year, month));
        if starts_new_month {
            rows.push(MonthEndRow {
                year,
                month,
                date,
                values: vec![None; columns.len()],
            });
        }

        let Some(current) = rows.last_mut() else {
            continue;
        };
        current.date = date;
        for (col, cells) in columns.iter().enumerate() {
            if let Some(v) = cells[row] {
                current.values[col] = Some(v);
            }
        }
    }

    log::debug!("month_end_summary: {} months", rows.len());
    Ok(MonthEndSummary {
        series: series_order.to_vec(),
        rows,
    })
}
