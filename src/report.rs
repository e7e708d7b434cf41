//! Report output
//!
//! Shared helpers for writing the per-pipeline JSON reports and for
//! marking empty aggregate sections explicitly instead of emitting
//! divide-by-zero garbage.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::FitreportResult;

/// An aggregate section that may have no underlying data
///
/// Empty collections serialize as `{"message": "..."}` so report
/// consumers can tell "no data" apart from a zero-valued summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Section<T> {
    Data(T),
    Empty { message: String },
}

impl<T> Section<T> {
    /// Wrap a computed summary
    pub fn data(value: T) -> Self {
        Section::Data(value)
    }

    /// Mark a section as having no underlying records
    pub fn empty(message: impl Into<String>) -> Self {
        Section::Empty {
            message: message.into(),
        }
    }

    /// Access the summary if present
    pub fn as_data(&self) -> Option<&T> {
        match self {
            Section::Data(value) => Some(value),
            Section::Empty { .. } => None,
        }
    }
}

/// Write a report as pretty-printed JSON to a fixed filename
///
/// Returns the full path the report was written to.
pub fn write_json_report<T: Serialize>(
    output_dir: &Path,
    filename: &str,
    report: &T,
) -> FitreportResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(filename);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    tracing::info!("Report written to {:?}", path);
    Ok(path)
}
