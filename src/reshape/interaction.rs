//! Chart interaction helpers: series selection, crosshair, quarter rules.

use chrono::{Datelike, Months, NaiveDate};

use crate::domain::{LongObservation, Selection, SeriesName};

/// Values under the crosshair cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Crosshair {
    pub date: NaiveDate,
    /// Present values at `date`, in catalog order.
    pub values: Vec<(SeriesName, f64)>,
}

/// Keep the observations visible under `selection`.
///
/// `Selection::All` returns the input unchanged.
pub fn filter_selection(observations: &[LongObservation], selection: Selection) -> Vec<LongObservation> {
    observations
        .iter()
        .filter(|o| selection.matches(o.series))
        .copied()
        .collect()
}

/// Ascending unique observation dates.
pub fn distinct_dates(observations: &[LongObservation]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Snap `date` to the nearest observation date and collect the values there.
///
/// Ties between an earlier and a later date resolve to the earlier one.
pub fn crosshair_at(observations: &[LongObservation], date: NaiveDate) -> Option<Crosshair> {
    let dates = distinct_dates(observations);
    let snapped = nearest_date(&dates, date)?;

    let mut values: Vec<(SeriesName, f64)> = observations
        .iter()
        .filter(|o| o.date == snapped)
        .map(|o| (o.series, o.value))
        .collect();
    values.sort_by_key(|(s, _)| *s);

    Some(Crosshair { date: snapped, values })
}

/// Nearest entry of a sorted date list.
pub fn nearest_date(sorted: &[NaiveDate], date: NaiveDate) -> Option<NaiveDate> {
    let idx = sorted.partition_point(|d| *d < date);
    let after = sorted.get(idx).copied();
    let before = idx.checked_sub(1).and_then(|i| sorted.get(i)).copied();

    match (before, after) {
        (Some(b), Some(a)) => {
            if (date - b) <= (a - date) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}

/// Quarter-start dates (Jan/Apr/Jul/Oct 1st) in `[first, last]`.
pub fn quarter_starts(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let quarter_month = (first.month0() / 3) * 3 + 1;
    let Some(mut cur) = NaiveDate::from_ymd_opt(first.year(), quarter_month, 1) else {
        return out;
    };
    if cur < first {
        cur = match cur.checked_add_months(Months::new(3)) {
            Some(next) => next,
            None => return out,
        };
    }
    while cur <= last {
        out.push(cur);
        cur = match cur.checked_add_months(Months::new(3)) {
            Some(next) => next,
            None => break,
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn o(date: NaiveDate, series: SeriesName, value: f64) -> LongObservation {
        LongObservation { date, series, value }
    }

    fn sample() -> Vec<LongObservation> {
        vec![
            o(d(2022, 9, 1), SeriesName::ThreeMonth, 2.9),
            o(d(2022, 9, 1), SeriesName::TenYear, 3.2),
            o(d(2022, 9, 6), SeriesName::TenYear, 3.3),
            o(d(2022, 9, 6), SeriesName::FiveYear, 3.4),
        ]
    }

    #[test]
    fn no_selection_is_identity() {
        let all = sample();
        assert_eq!(filter_selection(&all, Selection::All), all);
    }

    #[test]
    fn single_selection_keeps_one_series() {
        let only = filter_selection(&sample(), Selection::Only(SeriesName::TenYear));
        assert_eq!(only.len(), 2);
        assert!(only.iter().all(|o| o.series == SeriesName::TenYear));
    }

    #[test]
    fn crosshair_snaps_to_nearest_trading_day() {
        let obs = sample();
        let hit = crosshair_at(&obs, d(2022, 9, 5)).unwrap();
        assert_eq!(hit.date, d(2022, 9, 6));
        assert_eq!(
            hit.values,
            vec![(SeriesName::FiveYear, 3.4), (SeriesName::TenYear, 3.3)]
        );

        // 2022-09-03 is two days from the 1st and three from the 6th.
        assert_eq!(crosshair_at(&obs, d(2022, 9, 3)).unwrap().date, d(2022, 9, 1));
        assert_eq!(crosshair_at(&obs, d(2030, 1, 1)).unwrap().date, d(2022, 9, 6));
        assert!(crosshair_at(&[], d(2022, 9, 1)).is_none());
    }

    #[test]
    fn nearest_date_tie_prefers_earlier() {
        let dates = [d(2022, 9, 1), d(2022, 9, 3)];
        assert_eq!(nearest_date(&dates, d(2022, 9, 2)), Some(d(2022, 9, 1)));
    }

    #[test]
    fn quarter_starts_within_range() {
        assert_eq!(
            quarter_starts(d(2022, 9, 1), d(2023, 4, 1)),
            vec![d(2022, 10, 1), d(2023, 1, 1), d(2023, 4, 1)]
        );
        assert_eq!(quarter_starts(d(2023, 1, 1), d(2023, 1, 31)), vec![d(2023, 1, 1)]);
        assert!(quarter_starts(d(2023, 1, 2), d(2023, 3, 31)).is_empty());
    }

    #[test]
    fn distinct_dates_sorted_unique() {
        assert_eq!(distinct_dates(&sample()), vec![d(2022, 9, 1), d(2022, 9, 6)]);
    }
}
