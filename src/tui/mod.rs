//! Ratatui-based terminal UI.
//!
//! The TUI reads the observation store and shows one chart per series over a
//! selectable period, with the latest/average/YoY summary in the header.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::analytics::{self, Summary};
use crate::config::AppConfig;
use crate::domain::{Observation, Series};
use crate::error::AppError;
use crate::store::{JsonFileStore, KeyedStore};

mod plotters_chart;

use plotters_chart::SeriesChart;

/// Selectable chart windows, in days. `None` shows the whole store.
const PERIODS: [(Option<u32>, &str); 4] = [
    (Some(14), "2 weeks"),
    (Some(90), "3 months"),
    (Some(365), "1 year"),
    (None, "all"),
];

/// Start the TUI.
pub fn run(config: &AppConfig) -> Result<(), AppError> {
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::Terminal(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::Terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::Terminal(format!("Failed to enter alternate screen: {e}")));
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
    store: JsonFileStore,
    window_days: u32,
    period_idx: usize,
    records: Vec<Observation>,
    summary: Option<Summary>,
    status: String,
}

impl App {
    fn new(config: &AppConfig) -> Result<Self, AppError> {
        let mut app = Self {
            store: JsonFileStore::new(config.store_path.clone()),
            window_days: config.window_days,
            period_idx: 1,
            records: Vec::new(),
            summary: None,
            status: String::new(),
        };
        app.reload()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::Terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::Terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::Terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
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

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Left => {
                self.period_idx = self.period_idx.checked_sub(1).unwrap_or(PERIODS.len() - 1);
                self.status = format!("period: {}", PERIODS[self.period_idx].1);
            }
            KeyCode::Right | KeyCode::Char('p') => {
                self.period_idx = (self.period_idx + 1) % PERIODS.len();
                self.status = format!("period: {}", PERIODS[self.period_idx].1);
            }
            KeyCode::Char('r') => self.reload()?,
            _ => {}
        }
        Ok(false)
    }

    fn reload(&mut self) -> Result<(), AppError> {
        self.records = self.store.scan_all()?;
        self.summary = match analytics::summarize(&self.records, self.window_days) {
            Ok(summary) => Some(summary),
            Err(e) if e.is_no_data() => None,
            Err(e) => return Err(e),
        };
        self.status = format!("loaded {} observation(s) from {}", self.records.len(), self.store.path().display());
        Ok(())
    }

    fn visible(&self) -> &[Observation] {
        match PERIODS[self.period_idx].0 {
            Some(days) => analytics::recent_window(&self.records, days),
            None => &self.records,
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_charts(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("mkt", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" - daily market indicators | period: {}", PERIODS[self.period_idx].1)),
        ]));

        match &self.summary {
            Some(summary) => {
                lines.push(gray_line(format!("latest {}: {}", summary.latest.date, per_series(|s| {
                    fmt_opt(summary.latest.get(s), 4)
                }))));
                lines.push(gray_line(format!("{}d avg: {}", summary.window_days, per_series(|s| {
                    fmt_opt(summary.trailing_average.get(s), 4)
                }))));
                let yoy = match &summary.year_over_year {
                    Some(yoy) => format!(
                        "YoY vs {}: {}",
                        yoy.comparison.date,
                        per_series(|s| yoy.change_pct.get(s).map(|v| format!("{v:+.2}%")).unwrap_or_else(|| "n/a".into()))
                    ),
                    None => "YoY: n/a".to_string(),
                };
                lines.push(gray_line(yoy));
            }
            None => lines.push(Line::from(Span::styled(
                "No data found. Run `mkt pull --mode history` first.",
                Style::default().fg(Color::Yellow),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_charts(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(area);

        let visible = self.visible();
        for (series, rect) in Series::ALL.into_iter().zip(chunks.iter()) {
            let block = Block::default()
                .title(format!("{} - last {}", series.label(), PERIODS[self.period_idx].1))
                .borders(Borders::ALL);
            let inner = block.inner(*rect);
            frame.render_widget(block, *rect);
            frame.render_widget(Clear, inner);

            let Some(data) = chart_data(visible, series) else {
                let msg = Paragraph::new("No observations in this period.")
                    .style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
                continue;
            };

            let widget = SeriesChart {
                points: &data.points,
                origin: data.origin,
                x_bounds: data.x_bounds,
                y_bounds: data.y_bounds,
                y_label: series.unit(),
                color: series_color(series),
            };
            frame.render_widget(widget, inner);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ period  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Points and bounds for one chart; x is days since `origin`.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    origin: chrono::NaiveDate,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_data(records: &[Observation], series: Series) -> Option<ChartData> {
    let pts = analytics::points(records, series);
    let origin = pts.first()?.0;

    let points: Vec<(f64, f64)> = pts
        .iter()
        .map(|&(date, v)| ((date - origin).num_days() as f64, v))
        .collect();

    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &points {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(ChartData {
        origin,
        points,
        x_bounds: [0.0, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn series_color(series: Series) -> RGBColor {
    match series {
        Series::EurUsd => RGBColor(0, 255, 255),
        Series::Sp500 => RGBColor(255, 165, 0),
        Series::Treasury10y => RGBColor(0, 255, 0),
    }
}

fn per_series(f: impl Fn(Series) -> String) -> String {
    Series::ALL
        .iter()
        .map(|&s| format!("{}={}", s.label(), f(s)))
        .collect::<Vec<_>>()
        .join("  ")
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{v:.decimals$}")).unwrap_or_else(|| "n/a".to_string())
}

fn gray_line(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::Gray)))
}
