//! Exercise result record and the persistence collaborator

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use repsense_core::{ExerciseKind, RepsenseError, RepsenseResult};

/// Record handed to persistence when a session ends
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResult {
    pub exercise: ExerciseKind,
    /// Rep count for cyclic exercises, held seconds for isometric ones
    pub reps_or_duration_seconds: f64,
    /// 0..=100
    pub form_accuracy_percent: f32,
    pub feedback: Vec<String>,
    /// Wall time from start to stop
    pub elapsed_seconds: f64,
}

/// Persistence collaborator
pub trait ResultSink {
    fn persist(&mut self, result: &ExerciseResult) -> RepsenseResult<()>;
}

/// Writes one JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn persist(&mut self, result: &ExerciseResult) -> RepsenseResult<()> {
        serde_json::to_writer(&mut self.writer, result)
            .map_err(|e| RepsenseError::Persistence(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .map_err(|e| RepsenseError::Persistence(e.to_string()))?;
        debug!(exercise = %result.exercise, "result persisted");
        Ok(())
    }
}

/// In-memory sink; clones share storage
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    results: Arc<Mutex<Vec<ExerciseResult>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<ExerciseResult> {
        self.results.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn persist(&mut self, result: &ExerciseResult) -> RepsenseResult<()> {
        self.results.lock().push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExerciseResult {
        ExerciseResult {
            exercise: ExerciseKind::PushUp,
            reps_or_duration_seconds: 12.0,
            form_accuracy_percent: 95.0,
            feedback: vec!["Go lower next time".into()],
            elapsed_seconds: 61.5,
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["exercise"], "push-up");
        assert_eq!(json["repsOrDurationSeconds"], 12.0);
        assert_eq!(json["formAccuracyPercent"], 95.0);
        assert_eq!(json["elapsedSeconds"], 61.5);
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_result() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.persist(&sample()).unwrap();
        sink.persist(&sample()).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: ExerciseResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_memory_sink_clones_share_storage() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.persist(&sample()).unwrap();
        assert_eq!(sink.len(), 1);
    }
}
