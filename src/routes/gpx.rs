//! GPX file parsing
//!
//! Extracts ordered track points from a GPX document and decodes the
//! route date encoded in the file name (`route_YYYY-MM-DD_*.gpx`).

use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::BufRead;
use std::path::Path;

use crate::error::FitreportResult;

/// One point of a recorded route, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    /// Raw RFC 3339 timestamp as recorded in the file
    pub time: Option<String>,
}

/// Which child element of the current track point is being read
enum Capture {
    None,
    Ele,
    Time,
}

/// Parse all `<trkpt>` elements from a GPX file
pub fn parse_gpx_file(path: &Path) -> FitreportResult<Vec<TrackPoint>> {
    let file = std::fs::File::open(path)?;
    parse_track_points(Reader::from_reader(std::io::BufReader::new(file)))
}

/// Parse track points from an in-memory GPX document
pub fn parse_gpx_str(xml: &str) -> FitreportResult<Vec<TrackPoint>> {
    parse_track_points(Reader::from_reader(xml.as_bytes()))
}

fn parse_track_points<R: BufRead>(mut reader: Reader<R>) -> FitreportResult<Vec<TrackPoint>> {
    reader.trim_text(true);

    let mut points = Vec::new();
    let mut current: Option<TrackPoint> = None;
    let mut capture = Capture::None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            // Self-closing points carry no children and complete immediately
            Event::Empty(ref e) if e.name().as_ref() == b"trkpt" => {
                points.push(point_from_attrs(e));
            }
            Event::Start(ref e) if e.name().as_ref() == b"trkpt" => {
                current = Some(point_from_attrs(e));
            }
            Event::Start(ref e) if current.is_some() => {
                capture = match e.name().as_ref() {
                    b"ele" => Capture::Ele,
                    b"time" => Capture::Time,
                    _ => Capture::None,
                };
            }
            Event::Text(ref t) => {
                if let Some(point) = current.as_mut() {
                    let text = t.unescape().unwrap_or_default();
                    match capture {
                        Capture::Ele => point.ele = text.trim().parse().ok(),
                        Capture::Time => point.time = Some(text.trim().to_string()),
                        Capture::None => {}
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"trkpt" => {
                    if let Some(point) = current.take() {
                        points.push(point);
                    }
                }
                _ => capture = Capture::None,
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(points)
}

/// Read a point's coordinates; missing or malformed lat/lon default to 0.0
fn point_from_attrs(e: &quick_xml::events::BytesStart<'_>) -> TrackPoint {
    let mut lat = 0.0;
    let mut lon = 0.0;
    for attr in e.attributes().flatten() {
        let value = attr.unescape_value().unwrap_or_default();
        match attr.key.as_ref() {
            b"lat" => lat = value.parse().unwrap_or(0.0),
            b"lon" => lon = value.parse().unwrap_or(0.0),
            _ => {}
        }
    }
    TrackPoint {
        lat,
        lon,
        ele: None,
        time: None,
    }
}

/// Decode the route date from a file name
///
/// The date sits in the second underscore-delimited token, e.g.
/// `route_2025-05-10_5.09pm.gpx`. Returns `None` when the token is
/// missing or does not parse as `YYYY-MM-DD`.
pub fn route_date_from_filename(filename: &str) -> Option<NaiveDate> {
    let token = filename.split('_').nth(1)?;
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}
