//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal or a pipe
//! - deterministic output (helpful for golden tests)
//!
//! One glyph per series (see `glyph`); the y scale is the quantized axis
//! range as-is, with no extra padding.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{AxisRange, LongObservation, SeriesName};

/// Plot glyph for a series.
pub fn glyph(series: SeriesName) -> char {
    match series {
        SeriesName::ThreeMonth => 'M',
        SeriesName::FiveYear => '5',
        SeriesName::TenYear => 'T',
        SeriesName::ThirtyYear => 'L',
    }
}

/// Render the visible observations against `axis`.
pub fn render_ascii_plot(
    observations: &[LongObservation],
    axis: &AxisRange,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut by_series: BTreeMap<SeriesName, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for o in observations {
        by_series.entry(o.series).or_default().push((o.date, o.value));
    }

    let first = observations.iter().map(|o| o.date).min();
    let last = observations.iter().map(|o| o.date).max();

    let mut out = String::new();
    let (Some(first), Some(last)) = (first, last) else {
        out.push_str("Plot: no observations\n");
        return out;
    };

    let mut grid = vec![vec![' '; width]; height];
    let span_days = (last - first).num_days() as f64;

    for (series, points) in &by_series {
        let ch = glyph(*series);
        let mut prev = None;
        for &(date, value) in points {
            let x = map_x((date - first).num_days() as f64, span_days, width);
            let y = map_y(value, axis.low, axis.high, height);
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, ch),
                None => grid[y][x] = ch,
            }
            prev = Some((x, y));
        }
    }

    out.push_str(&format!(
        "Plot: {first} .. {last} | y=[{:.2}, {:.2}]%\n",
        axis.low, axis.high
    ));
    let legend: Vec<String> = by_series
        .keys()
        .map(|s| format!("{}={}", glyph(*s), s.label()))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" ")));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn map_x(offset_days: f64, span_days: f64, width: usize) -> usize {
    if span_days <= 0.0 {
        return 0;
    }
    let u = (offset_days / span_days).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = if y_max > y_min {
        ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Earlier series keep their cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
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

    #[test]
    fn plot_golden_snapshot_small() {
        let obs = vec![
            o(d(2022, 9, 1), SeriesName::FiveYear, 4.0),
            o(d(2022, 9, 1), SeriesName::TenYear, 3.0),
            o(d(2022, 9, 10), SeriesName::FiveYear, 4.0),
            o(d(2022, 9, 10), SeriesName::TenYear, 3.0),
        ];
        let axis = AxisRange { low: 3.0, high: 4.0 };

        let txt = render_ascii_plot(&obs, &axis, 10, 5);
        let expected = concat!(
            "Plot: 2022-09-01 .. 2022-09-10 | y=[3.00, 4.00]%\n",
            "Legend: 5=5 Year T=10 Year\n",
            "5555555555\n",
            "          \n",
            "          \n",
            "          \n",
            "TTTTTTTTTT\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_plot_says_so() {
        let axis = AxisRange { low: 0.0, high: 1.0 };
        assert_eq!(render_ascii_plot(&[], &axis, 10, 5), "Plot: no observations\n");
    }

    #[test]
    fn flat_axis_centers_values() {
        assert_eq!(map_y(3.0, 3.0, 3.0, 5), 2);
        assert_eq!(map_x(3.0, 0.0, 10), 0);
    }
}
