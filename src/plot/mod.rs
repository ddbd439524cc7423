//! Terminal plotting.

pub mod ascii;

pub use ascii::{render_all, render_series_plot};
