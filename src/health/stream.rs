//! Streaming export reader
//!
//! Forward-only, single-pass traversal of the Apple Health `export.xml`
//! document. The event buffer is reused and cleared after every element
//! so peak memory stays bounded no matter how large the export is; the
//! consumer must fully process each element before advancing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use crate::error::{FitreportError, FitreportResult};

/// Raw attributes of one `<Record>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordElement {
    pub type_tag: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub value: Option<String>,
    pub source_name: Option<String>,
    pub unit: Option<String>,
}

/// Raw attributes of one nested `<WorkoutStatistics>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsElement {
    pub type_tag: Option<String>,
    pub average: Option<String>,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub sum: Option<String>,
    pub unit: Option<String>,
}

/// Raw attributes of one `<Workout>` element with its nested statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutElement {
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration: Option<String>,
    pub duration_unit: Option<String>,
    pub source_name: Option<String>,
    pub statistics: Vec<StatisticsElement>,
}

/// One record-like element from the export stream
#[derive(Debug, Clone, PartialEq)]
pub enum ExportElement {
    Record(RecordElement),
    Workout(WorkoutElement),
}

/// Open the export input as a buffered byte stream
///
/// Accepts a plain `export.xml` or the export ZIP archive (selected by
/// file extension); for ZIP input the `export.xml` entry is located by
/// name suffix and decompressed up front. A missing file is fatal.
pub fn open_export(path: &Path) -> FitreportResult<Box<dyn BufRead>> {
    if !path.exists() {
        return Err(FitreportError::MissingInput(path.to_path_buf()));
    }

    let is_zip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    if is_zip {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if name.ends_with("export.xml") || name.ends_with("Export.xml") {
                let mut content = Vec::new();
                entry.read_to_end(&mut content)?;
                return Ok(Box::new(Cursor::new(content)));
            }
        }

        Err(FitreportError::NoExportEntry(path.to_path_buf()))
    } else {
        let file = std::fs::File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Forward-only reader over the record-like elements of an export
pub struct ExportReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl ExportReader<Box<dyn BufRead>> {
    /// Open an export file or ZIP archive for streaming
    pub fn open(path: &Path) -> FitreportResult<Self> {
        Ok(Self::new(open_export(path)?))
    }
}

impl<'a> ExportReader<&'a [u8]> {
    /// Stream an in-memory export document (used by tests)
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> ExportReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    /// Advance to the next `<Record>` or `<Workout>` element
    ///
    /// Returns `None` at end of document. The internal buffer is
    /// cleared between elements, releasing each element's memory as
    /// soon as it has been handed to the consumer.
    pub fn next_element(&mut self) -> FitreportResult<Option<ExportElement>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Empty(ref e) if e.name().as_ref() == b"Record" => {
                    return Ok(Some(ExportElement::Record(read_record(e))));
                }
                Event::Start(ref e) if e.name().as_ref() == b"Record" => {
                    // Records with children (metadata entries) still
                    // carry everything we need in their attributes
                    return Ok(Some(ExportElement::Record(read_record(e))));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"Workout" => {
                    return Ok(Some(ExportElement::Workout(read_workout_attrs(e))));
                }
                Event::Start(ref e) if e.name().as_ref() == b"Workout" => {
                    let workout = read_workout_attrs(e);
                    return Ok(Some(ExportElement::Workout(
                        self.read_workout_children(workout)?,
                    )));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Consume nested elements up to `</Workout>`, collecting statistics
    fn read_workout_children(
        &mut self,
        mut workout: WorkoutElement,
    ) -> FitreportResult<WorkoutElement> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Empty(ref e) | Event::Start(ref e)
                    if e.name().as_ref() == b"WorkoutStatistics" =>
                {
                    workout.statistics.push(read_statistics(e));
                }
                Event::End(ref e) if e.name().as_ref() == b"Workout" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(workout)
    }
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if a.key.as_ref() == name {
            a.unescape_value().ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

fn read_record(e: &BytesStart<'_>) -> RecordElement {
    RecordElement {
        type_tag: attr(e, b"type"),
        start_date: attr(e, b"startDate"),
        end_date: attr(e, b"endDate"),
        value: attr(e, b"value"),
        source_name: attr(e, b"sourceName"),
        unit: attr(e, b"unit"),
    }
}

fn read_workout_attrs(e: &BytesStart<'_>) -> WorkoutElement {
    WorkoutElement {
        activity_type: attr(e, b"workoutActivityType"),
        start_date: attr(e, b"startDate"),
        end_date: attr(e, b"endDate"),
        duration: attr(e, b"duration"),
        duration_unit: attr(e, b"durationUnit"),
        source_name: attr(e, b"sourceName"),
        statistics: Vec::new(),
    }
}

fn read_statistics(e: &BytesStart<'_>) -> StatisticsElement {
    StatisticsElement {
        type_tag: attr(e, b"type"),
        average: attr(e, b"average"),
        minimum: attr(e, b"minimum"),
        maximum: attr(e, b"maximum"),
        sum: attr(e, b"sum"),
        unit: attr(e, b"unit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
  <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch"
          unit="count/min" startDate="2025-05-01 16:32:36 +0200"
          endDate="2025-05-01 16:32:36 +0200" value="72"/>
  <Workout workoutActivityType="HKWorkoutActivityTypeCycling"
           duration="30.5" durationUnit="min" sourceName="Watch"
           startDate="2025-05-02 10:00:00 +0200" endDate="2025-05-02 10:30:30 +0200">
    <MetadataEntry key="HKIndoorWorkout" value="0"/>
    <WorkoutStatistics type="HKQuantityTypeIdentifierDistanceCycling"
                       sum="12.4" unit="km"
                       startDate="2025-05-02 10:00:00 +0200" endDate="2025-05-02 10:30:30 +0200"/>
    <WorkoutStatistics type="HKQuantityTypeIdentifierHeartRate"
                       average="132" minimum="95" maximum="161" unit="count/min"
                       startDate="2025-05-02 10:00:00 +0200" endDate="2025-05-02 10:30:30 +0200"/>
  </Workout>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Phone"
          unit="count" startDate="2025-05-03 08:00:00 +0200"
          endDate="2025-05-03 08:10:00 +0200" value="512"/>
</HealthData>"#;

    #[test]
    fn test_streams_records_and_workouts_in_order() {
        let mut reader = ExportReader::from_xml(EXPORT);

        match reader.next_element().unwrap().unwrap() {
            ExportElement::Record(record) => {
                assert_eq!(
                    record.type_tag.as_deref(),
                    Some("HKQuantityTypeIdentifierHeartRate")
                );
                assert_eq!(record.value.as_deref(), Some("72"));
                assert_eq!(record.source_name.as_deref(), Some("Watch"));
            }
            other => panic!("expected record, got {:?}", other),
        }

        match reader.next_element().unwrap().unwrap() {
            ExportElement::Workout(workout) => {
                assert_eq!(
                    workout.activity_type.as_deref(),
                    Some("HKWorkoutActivityTypeCycling")
                );
                assert_eq!(workout.duration.as_deref(), Some("30.5"));
                assert_eq!(workout.statistics.len(), 2);
                assert_eq!(workout.statistics[0].sum.as_deref(), Some("12.4"));
                assert_eq!(workout.statistics[1].average.as_deref(), Some("132"));
            }
            other => panic!("expected workout, got {:?}", other),
        }

        match reader.next_element().unwrap().unwrap() {
            ExportElement::Record(record) => {
                assert_eq!(record.value.as_deref(), Some("512"));
            }
            other => panic!("expected record, got {:?}", other),
        }

        assert!(reader.next_element().unwrap().is_none());
    }

    #[test]
    fn test_missing_export_is_fatal() {
        let err = match open_export(Path::new("/nonexistent/export.xml")) {
            Ok(_) => panic!("expected missing file to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, FitreportError::MissingInput(_)));
    }

    #[test]
    fn test_open_export_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");

        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(
                "apple_health_export/export.xml",
                zip::write::SimpleFileOptions::default(),
            )
            .unwrap();
        writer.write_all(EXPORT.as_bytes()).unwrap();
        writer.finish().unwrap();

        let mut reader = ExportReader::open(&zip_path).unwrap();
        let mut elements = 0;
        while reader.next_element().unwrap().is_some() {
            elements += 1;
        }
        assert_eq!(elements, 3);
    }

    #[test]
    fn test_zip_without_export_entry_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");

        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nothing here").unwrap();
        writer.finish().unwrap();

        let err = match ExportReader::open(&zip_path) {
            Ok(_) => panic!("expected missing entry to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, FitreportError::NoExportEntry(_)));
    }
}
