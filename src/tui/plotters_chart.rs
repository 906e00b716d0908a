//! Plotters-powered yield chart widget for Ratatui.
//!
//! Quarter and crosshair rules are drawn as plain two-point line series.
//! Output goes into the Ratatui buffer through `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One series' polyline, x = days since CE.
pub struct SeriesLine {
    pub rgb: (u8, u8, u8),
    pub points: Vec<(f64, f64)>,
}

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call, so `render()`
/// only draws.
pub struct YieldPlottersChart<'a> {
    /// Visible series, already filtered by the selector.
    pub lines: &'a [SeriesLine],
    /// X positions of quarter-start rules.
    pub quarter_rules: &'a [f64],
    /// X position of the crosshair rule, if shown.
    pub crosshair: Option<f64>,
    /// Dots where the crosshair meets each visible line.
    pub markers: &'a [((f64, f64), (u8, u8, u8))],
    /// X bounds (days since CE).
    pub x_bounds: [f64; 2],
    /// Y bounds: the quantized axis range, independent of the selection.
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for YieldPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            // Tick labels are drawn by the caller around this rect, so no label areas.
            let mut chart = ChartBuilder::on(&root)
                .margin(0)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .axis_style(&WHITE)
                .draw()?;

            let rule_color = RGBColor(110, 110, 110);
            for &x in self.quarter_rules {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &rule_color))?;
            }

            for line in self.lines {
                let (r, g, b) = line.rgb;
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &RGBColor(r, g, b)))?;
            }

            if let Some(x) = self.crosshair {
                chart.draw_series(LineSeries::new([(x, y0), (x, y1)], &WHITE))?;
            }

            // `Pixel` rather than `Circle`: the backend maps circle radii to
            // canvas units and draws them far too large.
            chart.draw_series(
                self.markers
                    .iter()
                    .map(|&(pos, (r, g, b))| Pixel::new(pos, RGBColor(r, g, b))),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
