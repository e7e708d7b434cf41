//! Health aggregate reporters
//!
//! Pure aggregation over the collections gathered during the streaming
//! pass: record-type counts, heart-rate statistics, daily step totals,
//! energy totals split active/basal and workout-type frequencies. Every
//! average is guarded; empty collections produce an explicit no-data
//! section instead of dividing by zero.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::health::model::{
    EnergyKind, EnergySample, HeartRateReading, StepSample, Workout,
};
use crate::report::Section;

/// Heart-rate statistics over all readings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeartRateSummary {
    pub total_readings: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Last 10 readings in document order
    pub recent_readings: Vec<HeartRateReading>,
}

impl HeartRateSummary {
    pub fn build(readings: &[HeartRateReading]) -> Section<Self> {
        if readings.is_empty() {
            return Section::empty("No heart rate data found");
        }

        let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
        let sum: f64 = values.iter().sum();

        Section::data(Self {
            total_readings: values.len(),
            average: sum / values.len() as f64,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            recent_readings: readings.iter().rev().take(10).rev().cloned().collect(),
        })
    }
}

/// Daily step totals grouped by calendar date
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepSummary {
    pub total_days: usize,
    pub total_steps: i64,
    pub average_daily: f64,
    pub max_daily: i64,
    pub min_daily: i64,
    /// Total per calendar date (local to the record's offset), YYYY-MM-DD
    pub daily_breakdown: HashMap<String, i64>,
}

impl StepSummary {
    pub fn build(samples: &[StepSample]) -> Section<Self> {
        if samples.is_empty() {
            return Section::empty("No step data found");
        }

        let mut daily: HashMap<String, i64> = HashMap::new();
        for sample in samples {
            let key = sample.date.date_naive().format("%Y-%m-%d").to_string();
            *daily.entry(key).or_insert(0) += sample.value;
        }

        let total: i64 = daily.values().sum();
        let days = daily.len();

        Section::data(Self {
            total_days: days,
            total_steps: total,
            average_daily: total as f64 / days as f64,
            max_daily: daily.values().copied().max().unwrap_or(0),
            min_daily: daily.values().copied().min().unwrap_or(0),
            daily_breakdown: daily,
        })
    }
}

/// Totals for one energy kind
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnergyTotals {
    pub total: f64,
    pub average: f64,
    pub max: f64,
}

impl EnergyTotals {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        Some(Self {
            total: sum,
            average: sum / values.len() as f64,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Energy expenditure split into active and basal components
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnergySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_energy: Option<EnergyTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basal_energy: Option<EnergyTotals>,
}

impl EnergySummary {
    pub fn build(samples: &[EnergySample]) -> Section<Self> {
        if samples.is_empty() {
            return Section::empty("No energy data found");
        }

        let active: Vec<f64> = samples
            .iter()
            .filter(|s| s.kind == EnergyKind::Active)
            .map(|s| s.value)
            .collect();
        let basal: Vec<f64> = samples
            .iter()
            .filter(|s| s.kind == EnergyKind::Basal)
            .map(|s| s.value)
            .collect();

        Section::data(Self {
            active_energy: EnergyTotals::from_values(&active),
            basal_energy: EnergyTotals::from_values(&basal),
        })
    }
}

/// Workout-type frequencies and duration totals
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkoutSummary {
    pub total_workouts: usize,
    pub workout_types: HashMap<String, usize>,
    pub total_duration_minutes: f64,
    pub average_duration: f64,
    /// Last 5 workouts in document order
    pub recent_workouts: Vec<Workout>,
}

impl WorkoutSummary {
    pub fn build(workouts: &[Workout]) -> Section<Self> {
        if workouts.is_empty() {
            return Section::empty("No workouts found");
        }

        let mut workout_types: HashMap<String, usize> = HashMap::new();
        let mut total_duration = 0.0;
        for workout in workouts {
            *workout_types.entry(workout.activity_type.clone()).or_insert(0) += 1;
            total_duration += workout.duration_minutes.unwrap_or(0.0);
        }

        Section::data(Self {
            total_workouts: workouts.len(),
            workout_types,
            total_duration_minutes: total_duration,
            average_duration: total_duration / workouts.len() as f64,
            recent_workouts: workouts.iter().rev().take(5).rev().cloned().collect(),
        })
    }
}

/// The health pipeline report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub period: String,
    pub total_records: u64,
    pub total_workouts: usize,
    /// Count of every record type seen, keyed by its type tag
    pub record_types: HashMap<String, u64>,
    pub heart_rate_summary: Section<HeartRateSummary>,
    pub step_summary: Section<StepSummary>,
    pub energy_summary: Section<EnergySummary>,
    pub workout_summary: Section<WorkoutSummary>,
    pub workouts: Vec<Workout>,
}

impl HealthReport {
    pub fn period_string(cutoff: NaiveDate) -> String {
        format!("From {} to present", cutoff.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::model::parse_export_date;

    fn reading(date: &str, value: f64) -> HeartRateReading {
        HeartRateReading {
            date: parse_export_date(date).unwrap(),
            value,
        }
    }

    fn steps(date: &str, value: i64) -> StepSample {
        StepSample {
            date: parse_export_date(date).unwrap(),
            value,
        }
    }

    #[test]
    fn test_heart_rate_summary() {
        let readings = vec![
            reading("2025-05-01 08:00:00 +0200", 60.0),
            reading("2025-05-01 09:00:00 +0200", 90.0),
            reading("2025-05-01 10:00:00 +0200", 120.0),
        ];

        let summary = HeartRateSummary::build(&readings);
        let data = summary.as_data().unwrap();
        assert_eq!(data.total_readings, 3);
        assert_eq!(data.average, 90.0);
        assert_eq!(data.min, 60.0);
        assert_eq!(data.max, 120.0);
        assert_eq!(data.recent_readings.len(), 3);
    }

    #[test]
    fn test_heart_rate_empty_is_no_data() {
        assert!(HeartRateSummary::build(&[]).as_data().is_none());
    }

    #[test]
    fn test_step_summary_groups_by_day() {
        let samples = vec![
            steps("2025-05-01 08:00:00 +0200", 1000),
            steps("2025-05-01 18:00:00 +0200", 2000),
            steps("2025-05-02 08:00:00 +0200", 500),
        ];

        let summary = StepSummary::build(&samples);
        let data = summary.as_data().unwrap();
        assert_eq!(data.total_days, 2);
        assert_eq!(data.total_steps, 3500);
        assert_eq!(data.daily_breakdown["2025-05-01"], 3000);
        assert_eq!(data.max_daily, 3000);
        assert_eq!(data.min_daily, 500);
        assert_eq!(data.average_daily, 1750.0);
    }

    #[test]
    fn test_energy_summary_splits_kinds() {
        let samples = vec![
            EnergySample {
                date: parse_export_date("2025-05-01 08:00:00 +0200").unwrap(),
                kind: EnergyKind::Active,
                value: 12.0,
            },
            EnergySample {
                date: parse_export_date("2025-05-01 09:00:00 +0200").unwrap(),
                kind: EnergyKind::Active,
                value: 8.0,
            },
            EnergySample {
                date: parse_export_date("2025-05-01 09:00:00 +0200").unwrap(),
                kind: EnergyKind::Basal,
                value: 30.0,
            },
        ];

        let summary = EnergySummary::build(&samples);
        let data = summary.as_data().unwrap();
        let active = data.active_energy.as_ref().unwrap();
        assert_eq!(active.total, 20.0);
        assert_eq!(active.average, 10.0);
        assert_eq!(active.max, 12.0);
        assert_eq!(data.basal_energy.as_ref().unwrap().total, 30.0);
    }

    #[test]
    fn test_workout_summary_counts_types() {
        let workout = |activity: &str, duration: f64| Workout {
            activity_type: activity.to_string(),
            start: parse_export_date("2025-05-02 10:00:00 +0200").unwrap(),
            end: parse_export_date("2025-05-02 10:30:00 +0200"),
            duration_minutes: Some(duration),
            duration_unit: Some("min".to_string()),
            source: None,
            statistics: HashMap::new(),
        };

        let workouts = vec![
            workout("HKWorkoutActivityTypeCycling", 30.0),
            workout("HKWorkoutActivityTypeCycling", 40.0),
            workout("HKWorkoutActivityTypeWalking", 20.0),
        ];

        let summary = WorkoutSummary::build(&workouts);
        let data = summary.as_data().unwrap();
        assert_eq!(data.total_workouts, 3);
        assert_eq!(data.workout_types["HKWorkoutActivityTypeCycling"], 2);
        assert_eq!(data.total_duration_minutes, 90.0);
        assert_eq!(data.average_duration, 30.0);
    }
}
