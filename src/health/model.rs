//! Health export data types
//!
//! Plain data types produced by one streaming pass over the Apple
//! Health export, plus the skip accounting used for malformed records.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::HashMap;

use crate::health::stream::{RecordElement, WorkoutElement};

/// Record type tags collected in detail (all others are only counted)
pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
pub const STEP_COUNT: &str = "HKQuantityTypeIdentifierStepCount";
pub const ACTIVE_ENERGY: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";
pub const BASAL_ENERGY: &str = "HKQuantityTypeIdentifierBasalEnergyBurned";

/// A heart-rate sample in beats per minute
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeartRateReading {
    pub date: DateTime<FixedOffset>,
    pub value: f64,
}

/// One raw step-count record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepSample {
    pub date: DateTime<FixedOffset>,
    pub value: i64,
}

/// Whether an energy sample is active or basal expenditure
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnergyKind {
    Active,
    Basal,
}

/// An energy expenditure sample in kcal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnergySample {
    pub date: DateTime<FixedOffset>,
    pub kind: EnergyKind,
    pub value: f64,
}

/// One named statistic nested inside a workout
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WorkoutStatistic {
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub sum: Option<f64>,
    pub unit: Option<String>,
}

/// A workout session from the export
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Workout {
    pub activity_type: String,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub duration_minutes: Option<f64>,
    pub duration_unit: Option<String>,
    pub source: Option<String>,
    /// Nested statistics keyed by their type tag
    pub statistics: HashMap<String, WorkoutStatistic>,
}

impl Workout {
    /// Build a workout from its raw streamed element
    ///
    /// Requires a parseable start date; everything else is optional.
    pub fn try_from_element(elem: WorkoutElement) -> Result<Self, SkipReason> {
        let start_date = elem.start_date.as_deref().ok_or(SkipReason::MissingAttribute)?;
        let start = parse_export_date(start_date).ok_or(SkipReason::BadTimestamp)?;

        let mut statistics = HashMap::new();
        for stat in elem.statistics {
            if let Some(type_tag) = stat.type_tag {
                statistics.insert(
                    type_tag,
                    WorkoutStatistic {
                        average: stat.average.as_deref().and_then(|v| v.parse().ok()),
                        minimum: stat.minimum.as_deref().and_then(|v| v.parse().ok()),
                        maximum: stat.maximum.as_deref().and_then(|v| v.parse().ok()),
                        sum: stat.sum.as_deref().and_then(|v| v.parse().ok()),
                        unit: stat.unit,
                    },
                );
            }
        }

        Ok(Self {
            activity_type: elem.activity_type.unwrap_or_else(|| "Unknown".to_string()),
            start,
            end: elem.end_date.as_deref().and_then(parse_export_date),
            duration_minutes: elem.duration.as_deref().and_then(|v| v.parse().ok()),
            duration_unit: elem.duration_unit,
            source: elem.source_name,
            statistics,
        })
    }
}

/// A step-count record with its full interval, used for correction
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepRecord {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub value: i64,
    pub source: String,
}

impl StepRecord {
    /// Build a step record from a raw `<Record>` element
    ///
    /// Requires parseable start and end dates and an integer value.
    pub fn try_from_element(elem: &RecordElement) -> Result<Self, SkipReason> {
        let start_date = elem.start_date.as_deref().ok_or(SkipReason::MissingAttribute)?;
        let end_date = elem.end_date.as_deref().ok_or(SkipReason::MissingAttribute)?;
        let value = elem.value.as_deref().ok_or(SkipReason::MissingAttribute)?;

        let start = parse_export_date(start_date).ok_or(SkipReason::BadTimestamp)?;
        let end = parse_export_date(end_date).ok_or(SkipReason::BadTimestamp)?;
        let value = value.parse().map_err(|_| SkipReason::BadValue)?;

        Ok(Self {
            start,
            end,
            value,
            source: elem
                .source_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}

/// Why a single record was skipped instead of counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A required attribute was absent
    MissingAttribute,
    /// A date attribute did not parse
    BadTimestamp,
    /// A numeric attribute did not parse
    BadValue,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingAttribute => "missing attribute",
            SkipReason::BadTimestamp => "bad timestamp",
            SkipReason::BadValue => "bad value",
        }
    }
}

/// Per-reason skip counters aggregated over one streaming pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkipCounts {
    counts: HashMap<SkipReason, usize>,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    /// Log a one-line summary when anything was skipped
    pub fn log_summary(&self, what: &str) {
        if self.total() > 0 {
            let breakdown: Vec<String> = self
                .counts
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason.as_str(), count))
                .collect();
            tracing::warn!("Skipped {} {} ({})", self.total(), what, breakdown.join(", "));
        }
    }
}

/// Parse the export's timestamp format: `YYYY-MM-DD HH:MM:SS ±ZZZZ`
pub fn parse_export_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z").ok()
}
