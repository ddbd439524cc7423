//! Formatted terminal output for summaries and pull results.
//!
//! We keep formatting code in one place so the analytics code stays free of
//! presentation concerns and output changes are localized.

use crate::analytics::Summary;
use crate::domain::{Series, SeriesValues};
use crate::error::AppError;
use crate::merge::MergeReport;

/// Format the latest snapshot, trailing averages, and year-over-year change.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();

    out.push_str("=== mkt - market summary ===\n");
    out.push_str(&format!("Latest data ({}):\n", summary.latest.date));
    out.push_str(&format_values(&summary.latest.values, fmt_level));

    out.push_str(&format!("\nLast {} days average:\n", summary.window_days));
    out.push_str(&format_values(&summary.trailing_average, fmt_level));

    match &summary.year_over_year {
        Some(yoy) => {
            out.push_str(&format!(
                "\nYear over year change (%) vs {}:\n",
                yoy.comparison.date
            ));
            out.push_str(&format_values(&yoy.change_pct, fmt_pct));
        }
        None => {
            out.push_str("\nYear over year change (%):\n");
            match crate::analytics::yoy_target_date(summary.latest.date) {
                Some(target) => out.push_str(&format!("  n/a (no observation at or before {target})\n")),
                None => out.push_str("  n/a\n"),
            }
        }
    }

    out
}

/// Pretty JSON for scripting.
pub fn summary_json(summary: &Summary) -> Result<String, AppError> {
    serde_json::to_string_pretty(summary)
        .map_err(|e| AppError::Output(format!("Failed to serialize summary: {e}")))
}

/// One line per series describing what a pull wrote.
pub fn format_merge_report(report: &MergeReport) -> String {
    let mut out = String::new();
    match (report.first_date, report.last_date) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Wrote {} row(s) covering {first} .. {last}\n",
            report.rows_written
        )),
        _ => out.push_str("No observations returned; store unchanged.\n"),
    }
    for series in Series::ALL {
        out.push_str(&format!(
            "  {:<13} {:>6} value(s)\n",
            format!("{}:", series.label()),
            report.per_series[series.index()]
        ));
    }
    out
}

fn format_values(values: &SeriesValues, fmt: fn(Option<f64>) -> String) -> String {
    let mut out = String::new();
    for series in Series::ALL {
        out.push_str(&format!(
            "  {:<13} {}\n",
            format!("{}:", series.label()),
            fmt(values.get(series))
        ));
    }
    out
}

fn fmt_level(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:+.2}%"),
        None => "n/a".to_string(),
    }
}
