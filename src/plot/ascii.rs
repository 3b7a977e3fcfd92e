//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Line series are drawn with their glyph first; point series overlay them.

use crate::plot::{Chart, PlotSink, SeriesKind};

/// Fixed-size text renderer.
#[derive(Debug, Clone, Copy)]
pub struct AsciiPlot {
    pub width: usize,
    pub height: usize,
}

impl AsciiPlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(10),
            height: height.max(5),
        }
    }
}

impl PlotSink for AsciiPlot {
    type Output = String;

    fn render(&self, chart: &Chart) -> String {
        render_chart(chart, self.width.max(10), self.height.max(5))
    }
}

fn render_chart(chart: &Chart, width: usize, height: usize) -> String {
    let Some((x_bounds, y_bounds)) = chart.bounds() else {
        return format!("{}: no finite data\n", chart.title);
    };
    let [x_min, x_max] = x_bounds;
    let (y_min, y_max) = pad_range(y_bounds[0], y_bounds[1], 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for kind in [SeriesKind::Line, SeriesKind::Points] {
        for series in chart.series.iter().filter(|s| s.kind == kind) {
            let mut prev = None;
            for &(x, y) in &series.points {
                if !(x.is_finite() && y.is_finite()) {
                    prev = None;
                    continue;
                }
                let col = map_x(x, x_min, x_max, width);
                let row = map_y(y, y_min, y_max, height);
                match (kind, prev) {
                    (SeriesKind::Line, Some((c0, r0))) => draw_line(&mut grid, c0, r0, col, row, series.glyph),
                    (SeriesKind::Line, None) => {
                        if grid[row][col] == ' ' {
                            grid[row][col] = series.glyph;
                        }
                    }
                    (SeriesKind::Points, _) => grid[row][col] = series.glyph,
                }
                prev = Some((col, row));
            }
        }
    }

    let legend: Vec<String> = chart
        .series
        .iter()
        .map(|s| format!("'{}' {}", s.glyph, s.label))
        .collect();

    let mut out = String::new();
    out.push_str(&format!(
        "{}: {}=[{x_min:.1}, {x_max:.1}] | {}=[{y_min:.1}, {y_max:.1}]\n",
        chart.title, chart.x_label, chart.y_label
    ));
    out.push_str(&format!("legend: {}\n", legend.join(", ")));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
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
    use crate::domain::{Compartments, Trajectory};

    #[test]
    fn goodness_of_fit_golden_snapshot_small() {
        let mut traj = Trajectory::default();
        traj.push(0.0, Compartments::new(100.0, 0.0, 0.0));
        traj.push(1.0, Compartments::new(95.0, 4.0, 1.0));
        traj.push(2.0, Compartments::new(90.0, 6.0, 4.0));

        let txt = AsciiPlot::new(10, 5).goodness_of_fit(&traj, &[0.0, 2.0], &[0.0, 10.0]);
        let expected = concat!(
            "Goodness of fit: day count=[0.0, 2.0] | case number=[-0.5, 10.5]\n",
            "legend: '-' I+R, 'o' observed\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn compartments_render_three_panels() {
        let mut traj = Trajectory::default();
        for d in 0..5 {
            let r = d as f64;
            traj.push(r, Compartments::new(10.0 - r, 1.0, r));
        }
        let panels = AsciiPlot::new(20, 6).compartments(&traj);
        assert_eq!(panels.len(), 3);
        assert!(panels[0].starts_with("Susceptible:"));
        // Flat I panel is still drawn on a widened range.
        assert!(panels[1].lines().skip(2).any(|l| l.contains('I')));
        // Grid lines have the requested width.
        assert!(panels[2].lines().skip(2).all(|l| l.chars().count() == 20));
    }

    #[test]
    fn empty_chart_does_not_panic() {
        let traj = Trajectory::default();
        let txt = AsciiPlot::new(10, 5).goodness_of_fit(&traj, &[], &[]);
        assert_eq!(txt, "Goodness of fit: no finite data\n");
    }
}
