//! Route analyzer pipeline
//!
//! Scans a directory of GPX files, filters them by the date encoded in
//! the file name, computes per-route statistics and aggregates them
//! into [`RoutesReport`].

pub mod geo;
pub mod gpx;
pub mod summary;

pub use gpx::{parse_gpx_file, parse_gpx_str, route_date_from_filename, TrackPoint};
pub use summary::{Coordinate, MonthlyStats, RouteSummary, RouteTotals, RoutesReport};

use chrono::NaiveDate;
use std::path::Path;

use crate::error::FitreportResult;

/// Fixed report filename for this pipeline
pub const ROUTES_REPORT_FILE: &str = "routes_summary.json";

/// Analyze all GPX files in a directory from the cutoff date onwards
///
/// A missing directory is not fatal: it is logged and yields an empty
/// report. Files with an undecodable date token and files that fail to
/// parse are skipped with a diagnostic.
pub fn analyze_routes(dir: &Path, cutoff: NaiveDate) -> FitreportResult<RoutesReport> {
    tracing::info!("Analyzing GPX files from {}...", cutoff.format("%Y-%m-%d"));

    if !dir.exists() {
        tracing::warn!("Routes directory {:?} not found, producing empty report", dir);
        return Ok(RoutesReport::build(cutoff, Vec::new()));
    }

    let mut filenames: Vec<String> = std::fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".gpx"))
        .collect();
    filenames.sort();

    let total_count = filenames.len();
    let mut routes = Vec::new();

    for filename in filenames {
        let date = match route_date_from_filename(&filename) {
            Some(date) => date,
            None => {
                tracing::warn!("Could not parse date from {}", filename);
                continue;
            }
        };

        // Files before the cutoff are skipped without being opened
        if date < cutoff {
            continue;
        }

        let points = match parse_gpx_file(&dir.join(&filename)) {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!("Error analyzing {}: {}", filename, e);
                continue;
            }
        };

        if let Some(route) = RouteSummary::from_points(&filename, date, &points) {
            routes.push(route);
        }
    }

    tracing::info!(
        "Processed {} GPX files from {} total files",
        routes.len(),
        total_count
    );

    Ok(RoutesReport::build(cutoff, routes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const GPX: &str = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1">
  <trk><trkseg>
    <trkpt lat="48.2082" lon="16.3738"><time>2025-05-10T17:00:00Z</time></trkpt>
    <trkpt lat="48.2100" lon="16.3750"><time>2025-05-10T17:12:00Z</time></trkpt>
  </trkseg></trk>
</gpx>"#;

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[test]
    fn test_missing_directory_yields_empty_report() {
        let report = analyze_routes(Path::new("/nonexistent/routes"), cutoff()).unwrap();
        assert!(report.routes.is_empty());
        assert!(report.summary.as_data().is_none());
    }

    #[test]
    fn test_directory_scan_filters_by_date() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("route_2025-05-10_5.09pm.gpx"), GPX).unwrap();
        fs::write(dir.path().join("route_2025-04-01_9.00am.gpx"), GPX).unwrap();
        fs::write(dir.path().join("route_baddate_9.00am.gpx"), GPX).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a gpx").unwrap();

        let report = analyze_routes(dir.path(), cutoff()).unwrap();

        assert_eq!(report.routes.len(), 1);
        assert_eq!(report.routes[0].date, "2025-05-10");
        assert_eq!(report.routes[0].track_points, 2);
        assert_eq!(report.routes[0].duration_minutes, 12.0);
    }

    #[test]
    fn test_empty_track_excluded_from_report() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("route_2025-05-10_1pm.gpx"),
            "<gpx><trk><trkseg/></trk></gpx>",
        )
        .unwrap();

        let report = analyze_routes(dir.path(), cutoff()).unwrap();
        assert!(report.routes.is_empty());
    }
}
