//! Route geometry math
//!
//! Pure functions over an ordered track-point sequence: great-circle
//! distance, cumulative elevation gain and elapsed duration. No I/O and
//! no side effects; all edge cases degrade to zero.

use crate::routes::gpx::TrackPoint;

/// Earth radius in kilometers, for the Haversine formula
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total route distance in kilometers
///
/// Sums consecutive-pair Haversine distances. Zero for fewer than two
/// points.
pub fn total_distance_km(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum()
}

/// Total elevation gain in meters
///
/// Only positive deltas between consecutive points accumulate; descents
/// never contribute. Pairs missing an elevation contribute zero.
pub fn elevation_gain_m(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .filter_map(|pair| match (pair[0].ele, pair[1].ele) {
            (Some(a), Some(b)) if b > a => Some(b - a),
            _ => None,
        })
        .sum()
}

/// Route duration in minutes
///
/// Elapsed time between the first and last point carrying a timestamp.
/// Zero when fewer than two points are timestamped or either timestamp
/// fails to parse.
pub fn duration_minutes(points: &[TrackPoint]) -> f64 {
    let mut timestamped = points.iter().filter_map(|p| p.time.as_deref());
    let first = timestamped.next();
    let last = timestamped.last();

    match (first, last) {
        (Some(start), Some(end)) => {
            let start = chrono::DateTime::parse_from_rfc3339(start);
            let end = chrono::DateTime::parse_from_rfc3339(end);
            match (start, end) {
                (Ok(start), Ok(end)) => (end - start).num_seconds() as f64 / 60.0,
                _ => 0.0,
            }
        }
        _ => 0.0,
    }
}
