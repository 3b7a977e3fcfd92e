//! Plotters-powered chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis rendering
//! - less manual work for ticks/labels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::{Chart, PlotSink, SeriesKind};

/// Sink producing Plotters widgets for the standard views.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersPlot;

impl PlotSink for PlottersPlot {
    type Output = SirPlottersChart;

    fn render(&self, chart: &Chart) -> SirPlottersChart {
        SirPlottersChart::new(chart.clone())
    }
}

/// A render-only chart widget.
///
/// All series and bounds are computed before the render call, so `render()`
/// only draws.
pub struct SirPlottersChart {
    chart: Chart,
    bounds: Option<([f64; 2], [f64; 2])>,
}

impl SirPlottersChart {
    pub fn new(chart: Chart) -> Self {
        let bounds = chart.bounds().map(|(x, y)| {
            let pad = ((y[1] - y[0]).abs() * 0.05).max(1e-12);
            (x, [y[0] - pad, y[1] + pad])
        });
        Self { chart, bounds }
    }

    /// Padded `(x, y)` bounds, `None` when the chart has no finite data.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        self.bounds
    }

    pub fn title(&self) -> &str {
        &self.chart.title
    }

    pub fn x_label(&self) -> &str {
        &self.chart.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.chart.y_label
    }
}

/// High-contrast palette keyed by series glyph.
fn series_color(glyph: char) -> RGBColor {
    match glyph {
        'S' => RGBColor(80, 160, 255),
        'I' => RGBColor(255, 80, 80),
        'R' => RGBColor(0, 255, 0),
        '-' => RGBColor(0, 255, 255),
        _ => WHITE,
    }
}

impl Widget for SirPlottersChart {
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

        let Some(([x0, x1], [y0, y1])) = self.bounds else {
            return;
        };

        let series = self.chart.series;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Tick labels are drawn by the caller around the chart rect.
                .set_label_area_size(LabelAreaPosition::Left, 0)
                .set_label_area_size(LabelAreaPosition::Bottom, 0)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .axis_style(&WHITE)
                .draw()?;

            for s in series.iter().filter(|s| s.kind == SeriesKind::Line) {
                let color = series_color(s.glyph);
                chart.draw_series(LineSeries::new(
                    s.points.iter().copied().filter(|(x, y)| x.is_finite() && y.is_finite()),
                    &color,
                ))?;
            }

            // `Circle` radii are mapped incorrectly by the ratatui backend;
            // single pixels give a clean dot.
            for s in series.iter().filter(|s| s.kind == SeriesKind::Points) {
                let color = series_color(s.glyph);
                chart.draw_series(
                    s.points
                        .iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|&(x, y)| Pixel::new((x, y), color)),
                )?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Compartments, Trajectory};

    #[test]
    fn widget_bounds_pad_y_only() {
        let mut traj = Trajectory::default();
        traj.push(0.0, Compartments::new(100.0, 0.0, 0.0));
        traj.push(2.0, Compartments::new(90.0, 6.0, 4.0));

        let widget = PlottersPlot.goodness_of_fit(&traj, &[0.0], &[0.0]);
        assert_eq!(widget.bounds(), Some(([0.0, 2.0], [-0.5, 10.5])));
        assert_eq!(widget.y_label(), "case number");
    }

    #[test]
    fn one_widget_per_compartment() {
        let mut traj = Trajectory::default();
        traj.push(0.0, Compartments::new(100.0, 1.0, 0.0));
        traj.push(1.0, Compartments::new(99.0, 1.5, 0.5));
        let titles: Vec<String> = PlottersPlot
            .compartments(&traj)
            .iter()
            .map(|w| w.title().to_string())
            .collect();
        assert_eq!(titles, ["Susceptible", "Infected", "Recovered"]);
    }

    #[test]
    fn tiny_area_shows_hint() {
        let traj = Trajectory::default();
        let area = Rect::new(0, 0, 45, 4);
        let mut buf = Buffer::empty(area);
        PlottersPlot.goodness_of_fit(&traj, &[], &[]).render(area, &mut buf);
        let first_row: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(first_row.starts_with("Chart area too small"));
    }
}
