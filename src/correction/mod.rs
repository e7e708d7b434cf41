//! Step-count correction
//!
//! Steps registered by the watch during cycling and skating workouts are
//! mechanical motion, not real steps. This module streams the export
//! twice (workout intervals, then step records), classifies every step
//! record against overlapping workout intervals with first-match
//! priority and recomputes a corrected total.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::io::BufRead;
use std::path::Path;

use crate::error::FitreportResult;
use crate::health::{
    ExportElement, ExportReader, SkipCounts, StepRecord, Workout, STEP_COUNT,
};

/// Fixed report filename for this pipeline
pub const CORRECTION_REPORT_FILE: &str = "step_correction.json";

/// Workout statistic type tags carrying distance sums
const DISTANCE_CYCLING: &str = "HKQuantityTypeIdentifierDistanceCycling";
const DISTANCE_SKATING: &str = "HKQuantityTypeIdentifierDistanceSkatingSports";
const DISTANCE_WALKING_RUNNING: &str = "HKQuantityTypeIdentifierDistanceWalkingRunning";

/// A workout's time interval, used for overlap classification
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkoutInterval {
    pub activity_type: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl WorkoutInterval {
    /// Extract the interval from a workout; `None` when the workout has
    /// no end date
    pub fn from_workout(workout: &Workout) -> Option<Self> {
        Some(Self {
            activity_type: workout.activity_type.clone(),
            start: workout.start,
            end: workout.end?,
        })
    }
}

/// Inclusive interval intersection; boundary-touching counts as overlap
pub fn overlaps(step: &StepRecord, workout: &WorkoutInterval) -> bool {
    step.start <= workout.end && step.end >= workout.start
}

/// Activity class a step record can be attributed to
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityClass {
    Cycling,
    Skating,
    Walking,
}

/// Classify a step record against the three interest classes
///
/// First-match priority: cycling, then skating, then walking. Returns
/// `None` when the record overlaps no interval of any class.
pub fn classify_step(
    step: &StepRecord,
    cycling: &[WorkoutInterval],
    skating: &[WorkoutInterval],
    walking: &[WorkoutInterval],
) -> Option<ActivityClass> {
    if cycling.iter().any(|w| overlaps(step, w)) {
        Some(ActivityClass::Cycling)
    } else if skating.iter().any(|w| overlaps(step, w)) {
        Some(ActivityClass::Skating)
    } else if walking.iter().any(|w| overlaps(step, w)) {
        Some(ActivityClass::Walking)
    } else {
        None
    }
}

/// Corrected step totals
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepCorrection {
    pub total_steps: i64,
    pub cycling_steps: i64,
    pub skating_steps: i64,
    /// Reported but never subtracted: walking is real stepping
    pub walking_steps: i64,
    pub corrected_steps: i64,
    pub cycling_workouts: usize,
    pub skating_workouts: usize,
    pub walking_workouts: usize,
}

/// Reclassify step records against workout intervals
///
/// Naive exhaustive scan, O(steps x workouts); fine for a one-shot
/// batch run over a personal export.
pub fn correct_steps(workouts: &[WorkoutInterval], steps: &[StepRecord]) -> StepCorrection {
    let class_of = |needle: &str| -> Vec<WorkoutInterval> {
        workouts
            .iter()
            .filter(|w| w.activity_type.contains(needle))
            .cloned()
            .collect()
    };
    let cycling = class_of("Cycling");
    let skating = class_of("Skating");
    let walking = class_of("Walking");

    let total_steps: i64 = steps.iter().map(|s| s.value).sum();
    let mut cycling_steps = 0;
    let mut skating_steps = 0;
    let mut walking_steps = 0;

    for step in steps {
        match classify_step(step, &cycling, &skating, &walking) {
            Some(ActivityClass::Cycling) => cycling_steps += step.value,
            Some(ActivityClass::Skating) => skating_steps += step.value,
            Some(ActivityClass::Walking) => walking_steps += step.value,
            None => {}
        }
    }

    StepCorrection {
        total_steps,
        cycling_steps,
        skating_steps,
        walking_steps,
        corrected_steps: total_steps - cycling_steps - skating_steps,
        cycling_workouts: cycling.len(),
        skating_workouts: skating.len(),
        walking_workouts: walking.len(),
    }
}

/// Per-activity distance sums extracted from workout statistics, in km
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WorkoutDistances {
    pub cycling_km: f64,
    pub skating_km: f64,
    pub walking_km: f64,
    pub running_km: f64,
}

/// Sum the distance statistics over all workouts
///
/// Walking/running distance shares one statistic type; it is attributed
/// to running when the workout's activity type mentions running.
pub fn workout_distances(workouts: &[Workout]) -> WorkoutDistances {
    let mut distances = WorkoutDistances::default();

    for workout in workouts {
        for (type_tag, stat) in &workout.statistics {
            let sum = match stat.sum {
                Some(sum) => sum,
                None => continue,
            };
            match type_tag.as_str() {
                DISTANCE_CYCLING => distances.cycling_km += sum,
                DISTANCE_SKATING => distances.skating_km += sum,
                DISTANCE_WALKING_RUNNING => {
                    if workout.activity_type.contains("Running") {
                        distances.running_km += sum;
                    } else {
                        distances.walking_km += sum;
                    }
                }
                _ => {}
            }
        }
    }

    distances
}

/// The step-correction pipeline report
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionReport {
    pub period: String,
    pub correction: StepCorrection,
    pub workout_distances: WorkoutDistances,
    pub total_workouts: usize,
    pub step_records: Vec<StepRecord>,
    pub workout_intervals: Vec<WorkoutInterval>,
}

/// Collect cutoff-filtered workouts from one streaming pass
fn collect_workouts<R: BufRead>(
    reader: &mut ExportReader<R>,
    cutoff: NaiveDate,
) -> FitreportResult<Vec<Workout>> {
    let mut workouts = Vec::new();
    let mut skips = SkipCounts::default();

    while let Some(elem) = reader.next_element()? {
        if let ExportElement::Workout(elem) = elem {
            match Workout::try_from_element(elem) {
                Ok(workout) if workout.start.date_naive() >= cutoff => workouts.push(workout),
                Ok(_) => {}
                Err(reason) => skips.record(reason),
            }
        }
    }

    skips.log_summary("workouts");
    tracing::info!("Found {} workouts from specified date", workouts.len());
    Ok(workouts)
}

/// Collect cutoff-filtered step records from one streaming pass
fn collect_steps<R: BufRead>(
    reader: &mut ExportReader<R>,
    cutoff: NaiveDate,
) -> FitreportResult<Vec<StepRecord>> {
    let mut steps = Vec::new();
    let mut skips = SkipCounts::default();

    while let Some(elem) = reader.next_element()? {
        if let ExportElement::Record(record) = elem {
            if record.type_tag.as_deref() != Some(STEP_COUNT) {
                continue;
            }
            match StepRecord::try_from_element(&record) {
                Ok(step) if step.start.date_naive() >= cutoff => steps.push(step),
                Ok(_) => {}
                Err(reason) => skips.record(reason),
            }
        }
    }

    skips.log_summary("step records");
    tracing::info!("Found {} step records from specified date", steps.len());
    Ok(steps)
}

/// Run the full correction over an export file
///
/// Streams the export twice: once for workouts, once for step records.
pub fn correct_export_steps(path: &Path, cutoff: NaiveDate) -> FitreportResult<CorrectionReport> {
    tracing::info!("Extracting workout times...");
    let mut reader = ExportReader::open(path)?;
    let workouts = collect_workouts(&mut reader, cutoff)?;

    tracing::info!("Extracting step records...");
    let mut reader = ExportReader::open(path)?;
    let steps = collect_steps(&mut reader, cutoff)?;

    let intervals: Vec<WorkoutInterval> = workouts
        .iter()
        .filter_map(WorkoutInterval::from_workout)
        .collect();

    let correction = correct_steps(&intervals, &steps);
    let distances = workout_distances(&workouts);

    Ok(CorrectionReport {
        period: format!("From {} to present", cutoff.format("%Y-%m-%d")),
        correction,
        workout_distances: distances,
        total_workouts: workouts.len(),
        step_records: steps,
        workout_intervals: intervals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::parse_export_date;

    fn interval(activity: &str, start: &str, end: &str) -> WorkoutInterval {
        WorkoutInterval {
            activity_type: format!("HKWorkoutActivityType{}", activity),
            start: parse_export_date(start).unwrap(),
            end: parse_export_date(end).unwrap(),
        }
    }

    fn step(start: &str, end: &str, value: i64) -> StepRecord {
        StepRecord {
            start: parse_export_date(start).unwrap(),
            end: parse_export_date(end).unwrap(),
            value,
            source: "Watch".to_string(),
        }
    }

    #[test]
    fn test_contained_step_attributed_to_cycling() {
        let workouts = vec![interval(
            "Cycling",
            "2025-05-02 10:00:00 +0200",
            "2025-05-02 10:30:00 +0200",
        )];
        let steps = vec![
            step("2025-05-02 10:05:00 +0200", "2025-05-02 10:10:00 +0200", 500),
            step("2025-05-02 11:00:00 +0200", "2025-05-02 11:05:00 +0200", 200),
        ];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(result.cycling_steps, 500);
        assert_eq!(result.corrected_steps, 200);
        assert_eq!(result.total_steps, 700);
    }

    #[test]
    fn test_boundary_touch_counts_as_overlap() {
        let workouts = vec![interval(
            "Cycling",
            "2025-05-02 10:00:00 +0200",
            "2025-05-02 10:30:00 +0200",
        )];
        // Step starts exactly when the workout ends
        let steps = vec![step(
            "2025-05-02 10:30:00 +0200",
            "2025-05-02 10:35:00 +0200",
            100,
        )];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(result.cycling_steps, 100);
    }

    #[test]
    fn test_cycling_priority_over_skating() {
        let workouts = vec![
            interval(
                "Skating",
                "2025-05-02 10:00:00 +0200",
                "2025-05-02 11:00:00 +0200",
            ),
            interval(
                "Cycling",
                "2025-05-02 10:00:00 +0200",
                "2025-05-02 11:00:00 +0200",
            ),
        ];
        let steps = vec![step(
            "2025-05-02 10:15:00 +0200",
            "2025-05-02 10:20:00 +0200",
            300,
        )];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(result.cycling_steps, 300);
        assert_eq!(result.skating_steps, 0);
    }

    #[test]
    fn test_walking_steps_not_subtracted() {
        let workouts = vec![interval(
            "Walking",
            "2025-05-02 08:00:00 +0200",
            "2025-05-02 09:00:00 +0200",
        )];
        let steps = vec![step(
            "2025-05-02 08:10:00 +0200",
            "2025-05-02 08:20:00 +0200",
            900,
        )];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(result.walking_steps, 900);
        assert_eq!(result.corrected_steps, 900);
    }

    #[test]
    fn test_correction_invariant_holds() {
        let workouts = vec![
            interval(
                "Cycling",
                "2025-05-02 10:00:00 +0200",
                "2025-05-02 10:30:00 +0200",
            ),
            interval(
                "Skating",
                "2025-05-03 14:00:00 +0200",
                "2025-05-03 15:00:00 +0200",
            ),
        ];
        let steps = vec![
            step("2025-05-02 10:05:00 +0200", "2025-05-02 10:10:00 +0200", 500),
            step("2025-05-03 14:20:00 +0200", "2025-05-03 14:25:00 +0200", 250),
            step("2025-05-04 09:00:00 +0200", "2025-05-04 09:10:00 +0200", 1200),
        ];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(
            result.corrected_steps + result.cycling_steps + result.skating_steps,
            result.total_steps
        );
    }

    #[test]
    fn test_no_workouts_means_no_subtraction() {
        let steps = vec![step(
            "2025-05-02 10:05:00 +0200",
            "2025-05-02 10:10:00 +0200",
            500,
        )];

        let result = correct_steps(&[], &steps);
        assert_eq!(result.corrected_steps, 500);
        assert_eq!(result.cycling_steps, 0);
        assert_eq!(result.skating_steps, 0);
    }

    #[test]
    fn test_mixed_timezone_offsets_compare_as_instants() {
        let workouts = vec![interval(
            "Cycling",
            "2025-05-02 10:00:00 +0200",
            "2025-05-02 10:30:00 +0200",
        )];
        // 08:05 UTC is 10:05 in +0200
        let steps = vec![step(
            "2025-05-02 08:05:00 +0000",
            "2025-05-02 08:10:00 +0000",
            400,
        )];

        let result = correct_steps(&workouts, &steps);
        assert_eq!(result.cycling_steps, 400);
    }

    #[test]
    fn test_full_pipeline_scenario() {
        let xml = r#"<HealthData>
  <Workout workoutActivityType="HKWorkoutActivityTypeCycling" duration="30" durationUnit="min"
           startDate="2025-05-02 10:00:00 +0200" endDate="2025-05-02 10:30:00 +0200">
    <WorkoutStatistics type="HKQuantityTypeIdentifierDistanceCycling" sum="12.4" unit="km"/>
  </Workout>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Watch"
          startDate="2025-05-02 10:05:00 +0200" endDate="2025-05-02 10:10:00 +0200" value="500"/>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Watch"
          startDate="2025-05-02 11:00:00 +0200" endDate="2025-05-02 11:05:00 +0200" value="200"/>
  <Record type="HKQuantityTypeIdentifierStepCount" sourceName="Watch"
          startDate="2025-04-02 11:00:00 +0200" endDate="2025-04-02 11:05:00 +0200" value="9999"/>
  <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch"
          startDate="2025-05-02 10:05:00 +0200" endDate="2025-05-02 10:05:00 +0200" value="130"/>
</HealthData>"#;

        let cutoff = chrono::NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();

        let mut reader = ExportReader::from_xml(xml);
        let workouts = collect_workouts(&mut reader, cutoff).unwrap();
        let mut reader = ExportReader::from_xml(xml);
        let steps = collect_steps(&mut reader, cutoff).unwrap();

        assert_eq!(workouts.len(), 1);
        assert_eq!(steps.len(), 2);

        let intervals: Vec<WorkoutInterval> = workouts
            .iter()
            .filter_map(WorkoutInterval::from_workout)
            .collect();
        let result = correct_steps(&intervals, &steps);
        assert_eq!(result.cycling_steps, 500);
        assert_eq!(result.corrected_steps, 200);

        let distances = workout_distances(&workouts);
        assert_eq!(distances.cycling_km, 12.4);
        assert_eq!(distances.walking_km, 0.0);
    }
}
