//! Turn raw provider responses into sparse `date -> value` feeds.
//!
//! The provider answers in three shapes:
//!
//! - a single current value with no date (`Point`)
//! - an object keyed by date string, one nested object per date (`Series`)
//! - an array of `{date, value}` objects (`Records`)
//!
//! Anomalies are tolerated at the smallest granularity: a bad entry is dropped,
//! a missing top-level key yields an empty feed. Nothing here returns an error.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{FetchMode, NormalizedFeed};

/// Keys the provider uses to explain an otherwise empty body (rate limits, bad keys).
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// Where the value lives inside a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    Point {
        root: &'static str,
        field: &'static str,
    },
    Series {
        root: &'static str,
        field: &'static str,
    },
    Records {
        root: &'static str,
        date_field: &'static str,
        value_field: &'static str,
    },
}

impl FeedShape {
    pub fn root(&self) -> &'static str {
        match *self {
            FeedShape::Point { root, .. }
            | FeedShape::Series { root, .. }
            | FeedShape::Records { root, .. } => root,
        }
    }
}

/// Normalize one provider body according to `shape` and `mode`.
///
/// - `Historical { since }` keeps dates on or after `since`.
/// - `Daily { today }` keeps only the most recent observation, keyed at `today`.
pub fn normalize(shape: FeedShape, body: &Value, mode: FetchMode) -> NormalizedFeed {
    let Some(root) = body.get(shape.root()) else {
        log_missing_root(shape.root(), body);
        return NormalizedFeed::new();
    };

    let dated = match shape {
        FeedShape::Point { field, .. } => {
            // A point value carries no date; only a daily pull can place it.
            let FetchMode::Daily { today } = mode else {
                debug!(root = shape.root(), "point feed ignored by historical pull");
                return NormalizedFeed::new();
            };
            return root
                .get(field)
                .and_then(parse_number)
                .map(|v| NormalizedFeed::from([(today, v)]))
                .unwrap_or_default();
        }
        FeedShape::Series { field, .. } => match root.as_object() {
            Some(map) => series_entries(map, field),
            None => NormalizedFeed::new(),
        },
        FeedShape::Records {
            date_field,
            value_field,
            ..
        } => match root.as_array() {
            Some(items) => record_entries(items, date_field, value_field),
            None => NormalizedFeed::new(),
        },
    };

    apply_mode(dated, mode)
}

fn series_entries(map: &Map<String, Value>, field: &str) -> NormalizedFeed {
    let mut out = NormalizedFeed::new();
    let mut dropped = 0usize;
    for (raw_date, entry) in map {
        match (parse_date(raw_date), entry.get(field).and_then(parse_number)) {
            (Some(date), Some(value)) => {
                out.insert(date, value);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(dropped, "dropped unparseable series entries");
    }
    out
}

fn record_entries(items: &[Value], date_field: &str, value_field: &str) -> NormalizedFeed {
    let mut out = NormalizedFeed::new();
    let mut dropped = 0usize;
    for item in items {
        let date = item.get(date_field).and_then(Value::as_str).and_then(parse_date);
        let value = item.get(value_field).and_then(parse_number);
        match (date, value) {
            (Some(date), Some(value)) => {
                out.insert(date, value);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(dropped, "dropped unparseable list entries");
    }
    out
}

fn apply_mode(mut feed: NormalizedFeed, mode: FetchMode) -> NormalizedFeed {
    match mode {
        FetchMode::Historical { since } => feed.split_off(&since),
        FetchMode::Daily { today } => match feed.pop_last() {
            Some((_, value)) => NormalizedFeed::from([(today, value)]),
            None => NormalizedFeed::new(),
        },
    }
}

fn log_missing_root(root: &str, body: &Value) {
    let notice = NOTICE_KEYS
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str));
    match notice {
        Some(msg) => warn!(root, notice = msg, "provider returned a notice instead of data"),
        None => debug!(root, "response has no data key; treating as empty feed"),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parse a provider number. Strings are trimmed; `"."`, empty, and non-finite values are rejected.
fn parse_number(raw: &Value) -> Option<f64> {
    let v = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed == "." || trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}
