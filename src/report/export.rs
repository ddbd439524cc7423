//! Export the stored series to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{Observation, Series};
use crate::error::AppError;

/// Write every observation as `date,eurusd,sp500,treasury`; absent values are empty cells.
pub fn write_store_csv(path: &Path, records: &[Observation]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::Output(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    let header: Vec<&str> = std::iter::once("date")
        .chain(Series::ALL.iter().map(|s| s.column()))
        .collect();
    writeln!(out, "{}", header.join(","))
        .map_err(|e| AppError::Output(format!("Failed to write export CSV header: {e}")))?;

    for r in records {
        writeln!(out, "{}", csv_row(r))
            .map_err(|e| AppError::Output(format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::Output(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn csv_row(r: &Observation) -> String {
    let mut cells = vec![r.date.to_string()];
    for series in Series::ALL {
        cells.push(r.get(series).map(|v| v.to_string()).unwrap_or_default());
    }
    cells.join(",")
}
