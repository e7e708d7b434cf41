//! # Fitreport
//!
//! Batch analyzer for personal fitness exports. Three independent
//! pipelines, each producing one JSON report and a console summary:
//!
//! - **Route analyzer**: a directory of GPX files becomes per-route
//!   distance/elevation/duration statistics with monthly rollups.
//! - **Health analyzer**: a (possibly very large) Apple Health export
//!   is streamed element by element into record-type counts and heart
//!   rate, step, energy and workout summaries.
//! - **Step corrector**: step records overlapping cycling or skating
//!   workout intervals are reclassified and removed from the corrected
//!   step total; walking overlaps are reported but kept.
//!
//! ## Modules
//!
//! - [`routes`]: GPX parsing and route aggregation
//! - [`health`]: streaming export reader and health summaries
//! - [`correction`]: the workout/record time-overlap correction
//! - [`config`]: TOML configuration
//! - [`report`]: JSON report output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fitreport::correction::correct_export_steps;
//! use std::path::Path;
//!
//! fn main() -> Result<(), fitreport::FitreportError> {
//!     let cutoff = chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
//!     let report = correct_export_steps(Path::new("export.xml"), cutoff)?;
//!
//!     println!("Corrected steps: {}", report.correction.corrected_steps);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod correction;
pub mod error;
pub mod health;
pub mod report;
pub mod routes;

// Re-export top-level types for convenience
pub use config::Config;
pub use correction::{
    correct_export_steps, correct_steps, CorrectionReport, StepCorrection, WorkoutDistances,
    WorkoutInterval,
};
pub use error::{FitreportError, FitreportResult};
pub use health::{analyze_health, HealthReport, StepRecord, Workout};
pub use report::{write_json_report, Section};
pub use routes::{analyze_routes, RouteSummary, RoutesReport, TrackPoint};
