//! Plot descriptions and the sinks that render them.
//!
//! Two views are produced for every run:
//! - compartments: S, I and R over time, one panel each
//! - goodness of fit: modelled `I + R` against the observed case counts
//!
//! Chart data is built here once; a [`PlotSink`] only decides how to draw it
//! (terminal text in [`ascii`], Plotters widgets in the TUI).

pub mod ascii;

pub use ascii::AsciiPlot;

use crate::domain::Trajectory;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Points,
}

/// One named series of `(x, y)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// Glyph used by text renderers.
    pub glyph: char,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

/// A render-only chart description.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Chart {
    /// Data bounds over all finite points: `([x_min, x_max], [y_min, y_max])`.
    ///
    /// A flat axis is widened by one unit on each side so renderers always
    /// get a non-empty range.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for &(px, py) in self.series.iter().flat_map(|s| s.points.iter()) {
            if !(px.is_finite() && py.is_finite()) {
                continue;
            }
            x = [x[0].min(px), x[1].max(px)];
            y = [y[0].min(py), y[1].max(py)];
        }
        if !(x[0].is_finite() && y[0].is_finite()) {
            return None;
        }
        Some((widen_flat(x), widen_flat(y)))
    }
}

fn widen_flat(range: [f64; 2]) -> [f64; 2] {
    if range[1] > range[0] {
        range
    } else {
        [range[0] - 1.0, range[1] + 1.0]
    }
}

/// The three compartment panels: S, I, R against day count.
pub fn compartment_charts(trajectory: &Trajectory) -> Vec<Chart> {
    let panel = |title: &str, glyph: char, values: &[f64]| Chart {
        title: title.to_string(),
        x_label: "day count".to_string(),
        y_label: "number of individuals".to_string(),
        series: vec![Series {
            label: glyph.to_string(),
            glyph,
            kind: SeriesKind::Line,
            points: trajectory.t.iter().copied().zip(values.iter().copied()).collect(),
        }],
    };

    vec![
        panel("Susceptible", 'S', &trajectory.s),
        panel("Infected", 'I', &trajectory.i),
        panel("Recovered", 'R', &trajectory.r),
    ]
}

/// Modelled `I + R` (line) against observed case counts (points).
pub fn goodness_of_fit_chart(trajectory: &Trajectory, observed_t: &[f64], observed: &[f64]) -> Chart {
    Chart {
        title: "Goodness of fit".to_string(),
        x_label: "day count".to_string(),
        y_label: "case number".to_string(),
        series: vec![
            Series {
                label: "I+R".to_string(),
                glyph: '-',
                kind: SeriesKind::Line,
                points: trajectory.t.iter().copied().zip(trajectory.cases()).collect(),
            },
            Series {
                label: "observed".to_string(),
                glyph: 'o',
                kind: SeriesKind::Points,
                points: observed_t.iter().copied().zip(observed.iter().copied()).collect(),
            },
        ],
    }
}

/// Destination for the two standard views of a run.
pub trait PlotSink {
    type Output;

    /// Render one chart.
    fn render(&self, chart: &Chart) -> Self::Output;

    /// S, I and R over time, one output per compartment.
    fn compartments(&self, trajectory: &Trajectory) -> Vec<Self::Output> {
        compartment_charts(trajectory)
            .iter()
            .map(|chart| self.render(chart))
            .collect()
    }

    /// Modelled cases against observations.
    fn goodness_of_fit(&self, trajectory: &Trajectory, observed_t: &[f64], observed: &[f64]) -> Self::Output {
        self.render(&goodness_of_fit_chart(trajectory, observed_t, observed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Compartments;

    fn small_trajectory() -> Trajectory {
        let mut traj = Trajectory::default();
        traj.push(0.0, Compartments::new(95.0, 5.0, 0.0));
        traj.push(1.0, Compartments::new(90.0, 7.0, 3.0));
        traj
    }

    #[test]
    fn compartment_panels_follow_trajectory() {
        let charts = compartment_charts(&small_trajectory());
        assert_eq!(charts.len(), 3);
        assert_eq!(charts[1].series[0].points, vec![(0.0, 5.0), (1.0, 7.0)]);
        assert_eq!(charts[2].title, "Recovered");
    }

    #[test]
    fn fit_chart_plots_infected_plus_recovered() {
        let chart = goodness_of_fit_chart(&small_trajectory(), &[0.0, 1.0], &[5.0, 11.0]);
        assert_eq!(chart.series[0].points, vec![(0.0, 5.0), (1.0, 10.0)]);
        assert_eq!(chart.series[1].kind, SeriesKind::Points);
        assert_eq!(chart.bounds(), Some(([0.0, 1.0], [5.0, 11.0])));
    }

    #[test]
    fn flat_series_gets_non_empty_bounds() {
        let chart = Chart {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            series: vec![Series {
                label: "I".into(),
                glyph: 'I',
                kind: SeriesKind::Line,
                points: vec![(0.0, 0.0), (1.0, 0.0), (2.0, f64::NAN)],
            }],
        };
        assert_eq!(chart.bounds(), Some(([0.0, 1.0], [-1.0, 1.0])));
    }
}
