//! Workout aggregation across finished exercises

use serde::Serialize;

use crate::ExerciseResult;

/// Coarse form-accuracy band
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyTier {
    Excellent,
    Good,
    NeedsWork,
}

impl AccuracyTier {
    pub fn from_accuracy(accuracy: f32) -> Self {
        if accuracy >= 90.0 {
            AccuracyTier::Excellent
        } else if accuracy >= 70.0 {
            AccuracyTier::Good
        } else {
            AccuracyTier::NeedsWork
        }
    }
}

/// Summary of a whole workout
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub exercises_completed: usize,
    pub total_elapsed_seconds: f64,
    /// Mean of per-exercise accuracy, 0 for an empty workout
    pub average_form_accuracy: f32,
    pub tier: AccuracyTier,
    pub message: &'static str,
}

impl WorkoutSummary {
    pub fn from_results(results: &[ExerciseResult]) -> Self {
        let total_elapsed_seconds = results.iter().map(|r| r.elapsed_seconds).sum();
        let average_form_accuracy = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.form_accuracy_percent).sum::<f32>() / results.len() as f32
        };

        WorkoutSummary {
            exercises_completed: results.len(),
            total_elapsed_seconds,
            average_form_accuracy,
            tier: AccuracyTier::from_accuracy(average_form_accuracy),
            message: motivation(average_form_accuracy),
        }
    }

    /// Total time as `m:ss`
    pub fn formatted_duration(&self) -> String {
        format_duration(self.total_elapsed_seconds)
    }
}

fn motivation(accuracy: f32) -> &'static str {
    if accuracy >= 90.0 {
        "Exceptional form! You're crushing it!"
    } else if accuracy >= 80.0 {
        "Great workout! Keep up the excellent work!"
    } else if accuracy >= 70.0 {
        "Good effort! Focus on form for even better results!"
    } else {
        "Nice work! Practice makes perfect!"
    }
}

/// Whole seconds as `m:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
