//! Wide -> long (tidy) transform.

use chrono::NaiveDate;

use crate::domain::{LongObservation, SeriesName, WideSeriesTable};
use crate::error::ReshapeError;

/// Melt `wide` into one observation per present `(date, series)` cell.
///
/// Output is ordered by date, then by position in `series_order`. Rows
/// strictly before `date_floor` are skipped. Columns not named in
/// `series_order` are ignored, and a series named twice is emitted once.
///
/// Repeated dates collapse into one: per series, the last present value in
/// table order wins.
pub fn to_long(
    wide: &WideSeriesTable,
    series_order: &[SeriesName],
    date_floor: Option<NaiveDate>,
) -> Result<Vec<LongObservation>, ReshapeError> {
    wide.require(series_order)?;

    let mut columns: Vec<(SeriesName, &[Option<f64>])> = Vec::with_capacity(series_order.len());
    for &s in series_order {
        if columns.iter().any(|(seen, _)| *seen == s) {
            continue;
        }
        if let Some(cells) = wide.column(s) {
            columns.push((s, cells));
        }
    }

    let dates = wide.dates();
    let start = match date_floor {
        Some(floor) => dates.partition_point(|d| *d < floor),
        None => 0,
    };

    let mut out = Vec::with_capacity((wide.len() - start) * columns.len());
    let mut row = start;
    while row < dates.len() {
        let date = dates[row];
        let end = row + dates[row..].partition_point(|d| *d == date);
        for &(series, cells) in &columns {
            if let Some(value) = cells[row..end].iter().rev().find_map(|c| *c) {
                out.push(LongObservation { date, series, value });
            }
        }
        row = end;
    }

    log::debug!(
        "to_long: {} rows x {} series -> {} observations",
        wide.len() - start,
        columns.len(),
        out.len()
    );
    Ok(out)
}
