//! Ratatui-based terminal UI.
//!
//! The TUI fits one region from the case file, then renders the S/I/R panels
//! and the goodness-of-fit chart. The region can be edited in place and refit.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::warn;

use crate::app::pipeline::{RunOutput, run_fit};
use crate::cli::TuiArgs;
use crate::error::AppError;
use crate::fit::EstimatorOptions;
use crate::plot::PlotSink;

mod plotters_chart;

pub use plotters_chart::{PlottersPlot, SirPlottersChart};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    if !io::stdout().is_terminal() {
        return Err(AppError::new(1, "The TUI needs an interactive terminal (stdout is not a tty)."));
    }

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(1, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args);
    app.refit();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(1, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(1, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    data_path: PathBuf,
    opts: EstimatorOptions,
    region: String,
    region_input: String,
    editing_region: bool,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(args: TuiArgs) -> Self {
        Self {
            data_path: args.source.data,
            opts: EstimatorOptions {
                max_iters: args.source.max_iters,
                ..EstimatorOptions::default()
            },
            region_input: args.source.region.clone(),
            region: args.source.region,
            editing_region: false,
            status: String::new(),
            run: None,
        }
    }

    /// Fit the current region. Failures are shown in the status line.
    fn refit(&mut self) {
        match run_fit(&self.data_path, &self.region, &self.opts) {
            Ok(run) => {
                self.status = format!(
                    "Fitted '{}' in {} iterations.",
                    run.region, run.estimate.diagnostics.iterations
                );
                self.run = Some(run);
            }
            Err(err) => {
                warn!(region = %self.region, error = %err, "fit failed");
                self.status = format!("Fit failed (exit {}): {err}", err.exit_code());
                self.run = None;
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(1, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(1, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(1, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_region {
            self.handle_region_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter | KeyCode::Char('e') => {
                self.editing_region = true;
                self.region_input = self.region.clone();
                self.status = "Editing region. Enter to fit, Esc to cancel.".to_string();
            }
            KeyCode::Char('r') => self.refit(),
            KeyCode::Char('d') => {
                if let Some(run) = &self.run {
                    match crate::debug::write_debug_bundle(run, &self.opts) {
                        Ok(path) => {
                            self.status = format!("Wrote debug bundle: {}", path.display());
                        }
                        Err(err) => {
                            self.status = format!("Debug write failed: {err}");
                        }
                    }
                } else {
                    self.status = "No fit available.".to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn handle_region_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_region = false;
                self.status = "Region edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_region = false;
                let trimmed = self.region_input.trim();
                if trimmed.is_empty() {
                    self.status = "Region must not be empty.".to_string();
                    return;
                }
                self.region = trimmed.to_string();
                self.refit();
            }
            KeyCode::Backspace => {
                self.region_input.pop();
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    self.region_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("sir", Style::default().fg(Color::Cyan)),
            Span::raw(" - SIR parameter estimate"),
        ]));

        let region = if self.editing_region {
            format!("{}_", self.region_input)
        } else {
            self.region.clone()
        };
        let n = self.run.as_ref().map(|r| r.observed.len()).unwrap_or(0);
        lines.push(Line::from(Span::styled(
            format!("region: {region} | data: {} | n={n}", self.data_path.display()),
            Style::default().fg(if self.editing_region { Color::Yellow } else { Color::Gray }),
        )));

        if let Some(run) = &self.run {
            let fit = &run.estimate.fit;
            lines.push(Line::from(Span::styled(
                format!(
                    "beta={:.4} | gamma={:.4} | S={:.0} | R0={:.3} | deviation={:.2} | iterations={}",
                    fit.beta,
                    fit.gamma,
                    fit.s,
                    fit.r_naught(),
                    run.estimate.diagnostics.deviation,
                    run.estimate.diagnostics.iterations,
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(run) = &self.run else {
            let block = Block::default().title("Charts").borders(Borders::ALL);
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No fit to show. Press Enter to choose a region.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[0]);

        let sink = PlottersPlot;
        for (widget, rect) in sink.compartments(&run.projection).into_iter().zip(panels.iter()) {
            draw_chart(frame, *rect, widget);
        }
        draw_chart(
            frame,
            rows[1],
            sink.goodness_of_fit(&run.projection, &run.observed_t(), &run.observed),
        );
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Enter/e edit region  r refit  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_chart(frame: &mut ratatui::Frame<'_>, area: Rect, widget: SirPlottersChart) {
    let block = Block::default()
        .title(format!("{} ({})", widget.title(), widget.y_label()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let bounds = widget.bounds();
    let x_label = widget.x_label().to_string();
    match (split_panel(inner), bounds) {
        (Some(panel), Some((x, y))) => {
            frame.render_widget(widget, panel.plot);
            draw_range_labels(frame, &panel, x, y, &x_label);
        }
        _ => frame.render_widget(widget, inner),
    }
}

/// Width of the gutter holding the y range.
const Y_GUTTER: u16 = 8;

/// A chart panel split into the plot and its label gutters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PanelAreas {
    plot: Rect,
    y_gutter: Rect,
    x_row: Rect,
}

/// `None` when the panel cannot spare the gutters and still fit a plot.
fn split_panel(inner: Rect) -> Option<PanelAreas> {
    if inner.width < Y_GUTTER + 20 || inner.height < 9 {
        return None;
    }
    let [body, x_row] = Layout::vertical([Constraint::Min(8), Constraint::Length(1)]).areas(inner);
    let [y_gutter, plot] = Layout::horizontal([Constraint::Length(Y_GUTTER), Constraint::Min(20)]).areas(body);
    Some(PanelAreas { plot, y_gutter, x_row })
}

/// Min/max of each axis at the plot corners, x label centred underneath.
fn draw_range_labels(frame: &mut ratatui::Frame<'_>, panel: &PanelAreas, x: [f64; 2], y: [f64; 2], x_label: &str) {
    let style = Style::default().fg(Color::Gray);
    let gutter = panel.y_gutter;
    let y_top = Rect { height: 1, ..gutter };
    let y_bottom = Rect {
        y: gutter.bottom().saturating_sub(1),
        height: 1,
        ..gutter
    };
    frame.render_widget(Paragraph::new(fmt_axis_y(y[1])).alignment(Alignment::Right).style(style), y_top);
    frame.render_widget(Paragraph::new(fmt_axis_y(y[0])).alignment(Alignment::Right).style(style), y_bottom);

    let x_axis = Rect {
        x: panel.plot.x,
        width: panel.plot.width,
        ..panel.x_row
    };
    let [left, middle, right] = Layout::horizontal([Constraint::Ratio(1, 3); 3]).areas(x_axis);
    frame.render_widget(Paragraph::new(fmt_axis_x(x[0])).style(style), left);
    frame.render_widget(Paragraph::new(x_label.to_string()).alignment(Alignment::Center).style(style), middle);
    frame.render_widget(Paragraph::new(fmt_axis_x(x[1])).alignment(Alignment::Right).style(style), right);
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

/// Compact count labels so population-scale values fit the gutter.
fn fmt_axis_y(v: f64) -> String {
    if v.abs() >= 1e5 {
        format!("{v:.1e}")
    } else {
        format!("{v:.0}")
    }
}
