//! Top-level error types
//!
//! Defines the fatal errors a pipeline run can fail with. Per-record
//! problems (bad dates, missing attributes) are not errors: they are
//! skip outcomes counted by the pipelines and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for a pipeline run
#[derive(Error, Debug)]
pub enum FitreportError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML document could not be read at all
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive could not be opened or read
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required input file is absent; no partial result is meaningful
    #[error("Missing required input: {}", .0.display())]
    MissingInput(PathBuf),

    /// Export archive contained no export.xml entry
    #[error("No export.xml found in archive: {}", .0.display())]
    NoExportEntry(PathBuf),
}

impl From<toml::de::Error> for FitreportError {
    fn from(err: toml::de::Error) -> Self {
        FitreportError::Config(err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type FitreportResult<T> = Result<T, FitreportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FitreportError::MissingInput(PathBuf::from("export.xml"));
        assert_eq!(err.to_string(), "Missing required input: export.xml");

        let err = FitreportError::Config("bad cutoff".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad cutoff");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FitreportError = io_err.into();
        assert!(matches!(err, FitreportError::Io(_)));
    }
}
