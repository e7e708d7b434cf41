//! Health analyzer pipeline
//!
//! Streams the Apple Health export element by element, classifies each
//! record by its type tag and aggregates the collections into
//! [`HealthReport`].

pub mod model;
pub mod stream;
pub mod summary;

pub use model::{
    parse_export_date, EnergyKind, EnergySample, HeartRateReading, SkipCounts, SkipReason,
    StepRecord, StepSample, Workout, WorkoutStatistic, ACTIVE_ENERGY, BASAL_ENERGY, HEART_RATE,
    STEP_COUNT,
};
pub use stream::{ExportElement, ExportReader, RecordElement, StatisticsElement, WorkoutElement};
pub use summary::{
    EnergySummary, EnergyTotals, HealthReport, HeartRateSummary, StepSummary, WorkoutSummary,
};

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::FitreportResult;

/// Fixed report filename for this pipeline
pub const HEALTH_REPORT_FILE: &str = "health_summary.json";

/// What happened to one streamed element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Counted into the aggregates
    Counted,
    /// Dated before the cutoff, excluded from all outputs
    BeforeCutoff,
    /// Malformed; logged and skipped
    Skipped(SkipReason),
}

/// Explicit accumulator state threaded through the streaming pass
#[derive(Debug, Default)]
pub struct HealthAccumulator {
    pub record_counts: HashMap<String, u64>,
    pub heart_rate: Vec<HeartRateReading>,
    pub steps: Vec<StepSample>,
    pub energy: Vec<EnergySample>,
    pub workouts: Vec<Workout>,
    pub skips: SkipCounts,
    pub before_cutoff: u64,
}

impl HealthAccumulator {
    /// Classify one `<Record>` element
    pub fn add_record(&mut self, elem: &RecordElement, cutoff: NaiveDate) -> RecordOutcome {
        let start_date = match elem.start_date.as_deref() {
            Some(s) => s,
            None => return self.skip(SkipReason::MissingAttribute),
        };
        let start = match parse_export_date(start_date) {
            Some(dt) => dt,
            None => return self.skip(SkipReason::BadTimestamp),
        };
        if start.date_naive() < cutoff {
            self.before_cutoff += 1;
            return RecordOutcome::BeforeCutoff;
        }

        let type_tag = elem.type_tag.as_deref().unwrap_or("Unknown");
        *self.record_counts.entry(type_tag.to_string()).or_insert(0) += 1;

        // Interesting types also collect their value
        match type_tag {
            HEART_RATE => match elem.value.as_deref().and_then(|v| v.parse().ok()) {
                Some(value) => self.heart_rate.push(HeartRateReading { date: start, value }),
                None => return self.skip(SkipReason::BadValue),
            },
            STEP_COUNT => match elem.value.as_deref().and_then(|v| v.parse().ok()) {
                Some(value) => self.steps.push(StepSample { date: start, value }),
                None => return self.skip(SkipReason::BadValue),
            },
            ACTIVE_ENERGY | BASAL_ENERGY => {
                let kind = if type_tag == ACTIVE_ENERGY {
                    EnergyKind::Active
                } else {
                    EnergyKind::Basal
                };
                match elem.value.as_deref().and_then(|v| v.parse().ok()) {
                    Some(value) => self.energy.push(EnergySample {
                        date: start,
                        kind,
                        value,
                    }),
                    None => return self.skip(SkipReason::BadValue),
                }
            }
            _ => {}
        }

        RecordOutcome::Counted
    }

    /// Classify one `<Workout>` element
    pub fn add_workout(&mut self, elem: WorkoutElement, cutoff: NaiveDate) -> RecordOutcome {
        let workout = match Workout::try_from_element(elem) {
            Ok(workout) => workout,
            Err(reason) => return self.skip(reason),
        };
        if workout.start.date_naive() < cutoff {
            self.before_cutoff += 1;
            return RecordOutcome::BeforeCutoff;
        }

        self.workouts.push(workout);
        RecordOutcome::Counted
    }

    fn skip(&mut self, reason: SkipReason) -> RecordOutcome {
        self.skips.record(reason);
        RecordOutcome::Skipped(reason)
    }

    /// Build the report from the accumulated collections
    pub fn into_report(self, cutoff: NaiveDate) -> HealthReport {
        HealthReport {
            period: HealthReport::period_string(cutoff),
            total_records: self.record_counts.values().sum(),
            total_workouts: self.workouts.len(),
            record_types: self.record_counts,
            heart_rate_summary: HeartRateSummary::build(&self.heart_rate),
            step_summary: StepSummary::build(&self.steps),
            energy_summary: EnergySummary::build(&self.energy),
            workout_summary: WorkoutSummary::build(&self.workouts),
            workouts: self.workouts,
        }
    }
}

/// Run the streaming pass over an already-open export reader
pub fn accumulate<R: BufRead>(
    reader: &mut ExportReader<R>,
    cutoff: NaiveDate,
) -> FitreportResult<HealthAccumulator> {
    let mut acc = HealthAccumulator::default();
    let mut record_count: u64 = 0;
    let mut workout_count: u64 = 0;

    while let Some(elem) = reader.next_element()? {
        match elem {
            ExportElement::Record(record) => {
                record_count += 1;
                acc.add_record(&record, cutoff);
                if record_count % 10_000 == 0 {
                    tracing::debug!(
                        "Processed {} records, {} workouts...",
                        record_count,
                        workout_count
                    );
                }
            }
            ExportElement::Workout(workout) => {
                workout_count += 1;
                acc.add_workout(workout, cutoff);
            }
        }
    }

    tracing::info!(
        "Completed: processed {} records and {} workouts",
        record_count,
        workout_count
    );
    acc.skips.log_summary("records");

    Ok(acc)
}

/// Analyze a health export file from the cutoff date onwards
pub fn analyze_health(path: &Path, cutoff: NaiveDate) -> FitreportResult<HealthReport> {
    tracing::info!(
        "Parsing {:?} from {}...",
        path,
        cutoff.format("%Y-%m-%d")
    );
    let mut reader = ExportReader::open(path)?;
    let acc = accumulate(&mut reader, cutoff)?;
    Ok(acc.into_report(cutoff))
}
