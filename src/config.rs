//! Configuration System
//!
//! Handles loading configuration from a TOML file with sensible defaults.
//! Every setting can also be overridden from the command line.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{FitreportError, FitreportResult};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub inputs: InputsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Analysis window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum date (YYYY-MM-DD); records before it are excluded everywhere
    #[serde(default = "default_cutoff_date")]
    pub cutoff_date: String,
}

fn default_cutoff_date() -> String {
    "2025-05-01".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cutoff_date: default_cutoff_date(),
        }
    }
}

impl AnalysisConfig {
    /// Parse the configured cutoff into a calendar date
    pub fn cutoff(&self) -> FitreportResult<NaiveDate> {
        NaiveDate::parse_from_str(&self.cutoff_date, "%Y-%m-%d").map_err(|e| {
            FitreportError::Config(format!("invalid cutoff date {:?}: {}", self.cutoff_date, e))
        })
    }
}

/// Input file locations
#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    /// Directory of GPX route files
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Apple Health export (export.xml, or the export ZIP)
    #[serde(default = "default_export_path")]
    pub export_path: String,
}

fn default_routes_dir() -> String {
    "workout-routes".to_string()
}

fn default_export_path() -> String {
    "export.xml".to_string()
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            export_path: default_export_path(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the JSON reports are written to
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> FitreportResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default locations, falling back to built-in defaults
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("fitreport").join("config.toml")),
            Some(PathBuf::from("./fitreport.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Config::default()
    }
}

/// Generate a default configuration file with comments
pub fn generate_default_config() -> String {
    r#"# Fitreport configuration

[analysis]
# Records dated before this day are excluded from every report
cutoff_date = "2025-05-01"

[inputs]
# Directory containing GPX route files (route_YYYY-MM-DD_*.gpx)
routes_dir = "workout-routes"
# Apple Health export: export.xml or the export ZIP archive
export_path = "export.xml"

[output]
# Directory the JSON reports are written to
dir = "."
"#
    .to_string()
}
