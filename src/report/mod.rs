//! Reporting utilities: console/JSON summaries and CSV export.

pub mod export;
pub mod format;

pub use export::write_store_csv;
pub use format::{format_merge_report, format_summary, summary_json};
