//! Route aggregation
//!
//! Builds the per-route summary from a parsed point sequence and rolls
//! the collection up into the routes report (totals, per-route averages
//! and a monthly breakdown).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::report::Section;
use crate::routes::geo;
use crate::routes::gpx::TrackPoint;

/// A start or end coordinate of a route
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Derived statistics for one route file, immutable once computed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub filename: String,
    /// Route date (from the file name), YYYY-MM-DD
    pub date: String,
    pub track_points: usize,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub duration_minutes: f64,
    pub start_point: Coordinate,
    pub end_point: Coordinate,
}

impl RouteSummary {
    /// Compute a summary from an ordered point sequence
    ///
    /// Returns `None` for an empty sequence; such files are excluded
    /// from the report entirely.
    pub fn from_points(filename: &str, date: NaiveDate, points: &[TrackPoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;

        Some(Self {
            filename: filename.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            track_points: points.len(),
            distance_km: geo::total_distance_km(points),
            elevation_gain_m: geo::elevation_gain_m(points),
            duration_minutes: geo::duration_minutes(points),
            start_point: Coordinate {
                lat: first.lat,
                lon: first.lon,
            },
            end_point: Coordinate {
                lat: last.lat,
                lon: last.lon,
            },
        })
    }

    /// Year-month grouping key (`YYYY-MM`)
    pub fn month_key(&self) -> String {
        self.date.chars().take(7).collect()
    }
}

/// Rollup of all routes within one calendar month
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MonthlyStats {
    pub routes: usize,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub duration_minutes: f64,
}

/// Aggregate totals over the full route collection
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteTotals {
    pub total_routes: usize,
    pub total_distance_km: f64,
    pub total_elevation_gain_m: f64,
    pub total_duration_minutes: f64,
    pub total_track_points: usize,
    pub average_distance_per_route: f64,
    pub average_elevation_per_route: f64,
    pub average_duration_per_route: f64,
}

/// The routes pipeline report
#[derive(Debug, Clone, Serialize)]
pub struct RoutesReport {
    /// Analysis window, e.g. "From 2025-05-01 to present"
    pub period: String,
    pub summary: Section<RouteTotals>,
    pub monthly_breakdown: HashMap<String, MonthlyStats>,
    pub routes: Vec<RouteSummary>,
}

impl RoutesReport {
    /// Aggregate a route collection into the report
    pub fn build(cutoff: NaiveDate, routes: Vec<RouteSummary>) -> Self {
        let period = format!("From {} to present", cutoff.format("%Y-%m-%d"));

        let summary = if routes.is_empty() {
            Section::empty("No routes found for the specified period")
        } else {
            let count = routes.len();
            let total_distance: f64 = routes.iter().map(|r| r.distance_km).sum();
            let total_elevation: f64 = routes.iter().map(|r| r.elevation_gain_m).sum();
            let total_duration: f64 = routes.iter().map(|r| r.duration_minutes).sum();
            let total_points: usize = routes.iter().map(|r| r.track_points).sum();

            Section::data(RouteTotals {
                total_routes: count,
                total_distance_km: total_distance,
                total_elevation_gain_m: total_elevation,
                total_duration_minutes: total_duration,
                total_track_points: total_points,
                average_distance_per_route: total_distance / count as f64,
                average_elevation_per_route: total_elevation / count as f64,
                average_duration_per_route: total_duration / count as f64,
            })
        };

        let mut monthly_breakdown: HashMap<String, MonthlyStats> = HashMap::new();
        for route in &routes {
            let entry = monthly_breakdown.entry(route.month_key()).or_default();
            entry.routes += 1;
            entry.distance_km += route.distance_km;
            entry.elevation_gain_m += route.elevation_gain_m;
            entry.duration_minutes += route.duration_minutes;
        }

        Self {
            period,
            summary,
            monthly_breakdown,
            routes,
        }
    }
}
