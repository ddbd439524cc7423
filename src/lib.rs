//! `market-pulse` library crate.
//!
//! The binary (`mkt`) is a thin wrapper around this library so that:
//!
//! - the merge and analytics core is testable without spawning processes
//! - the feed client and the store sit behind traits and can be swapped in tests

pub mod analytics;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod merge;
pub mod plot;
pub mod report;
pub mod store;
pub mod tui;
