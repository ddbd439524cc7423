//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tracked indicators (`Series`) and per-date rows (`Observation`)
//! - normalized provider output (`NormalizedFeed`)
//! - pull and merge knobs (`FetchMode`, `MergePolicy`)

pub mod types;

pub use types::*;
