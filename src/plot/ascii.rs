//! ASCII scatter plots for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each present observation is drawn as `o`; absent values leave a gap.

use chrono::NaiveDate;

use crate::analytics::points;
use crate::domain::{Observation, Series};

/// Render one series over the given records (already windowed by the caller).
pub fn render_series_plot(records: &[Observation], series: Series, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let pts = points(records, series);

    let Some((d_min, d_max)) = date_range(&pts) else {
        return format!("{} ({}): no observations\n", series.label(), series.unit());
    };
    let (y_min, y_max) = y_range(&pts).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let span_days = (d_max - d_min).num_days();
    for &(date, value) in &pts {
        let x = map_x((date - d_min).num_days(), span_days, width);
        let y = map_y(value, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{} ({}): {d_min} .. {d_max} | y=[{y_min:.4}, {y_max:.4}]\n",
        series.label(),
        series.unit()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// One panel per series, stacked.
pub fn render_all(records: &[Observation], width: usize, height: usize) -> String {
    Series::ALL
        .iter()
        .map(|&s| render_series_plot(records, s, width, height))
        .collect::<Vec<_>>()
        .join("\n")
}

fn date_range(pts: &[(NaiveDate, f64)]) -> Option<(NaiveDate, NaiveDate)> {
    let min = pts.iter().map(|p| p.0).min()?;
    let max = pts.iter().map(|p| p.0).max()?;
    Some((min, max))
}

fn y_range(pts: &[(NaiveDate, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in pts {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() {
        // Flat series: center it.
        Some((min_y - 0.5, min_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(offset_days: i64, span_days: i64, width: usize) -> usize {
    if span_days <= 0 {
        return width / 2;
    }
    let u = (offset_days as f64 / span_days as f64).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesValues;

    fn obs(day: u32, treasury: Option<f64>) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            SeriesValues { treasury, ..Default::default() },
        )
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let records = vec![obs(1, Some(4.0)), obs(4, None), obs(10, Some(5.0))];
        let txt = render_series_plot(&records, Series::Treasury10y, 10, 5);
        let expected = concat!(
            "10Y Treasury (yield %): 2024-01-01 .. 2024-01-10 | y=[3.9500, 5.0500]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn series_without_values_says_so() {
        let records = vec![obs(1, Some(4.0))];
        let txt = render_series_plot(&records, Series::Sp500, 20, 5);
        assert_eq!(txt, "SPY (USD): no observations\n");
    }

    #[test]
    fn render_all_has_three_panels() {
        let records = vec![obs(1, Some(4.0)), obs(2, Some(4.1))];
        let txt = render_all(&records, 20, 5);
        assert!(txt.contains("EUR/USD (USD per EUR): no observations"));
        assert!(txt.contains("10Y Treasury (yield %): 2024-01-01 .. 2024-01-02"));
    }
}
