use serde::{Deserialize, Serialize};

use crate::session::FinishEvent;

/// Average word length used by the wpm formula.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Lower bound on elapsed time so an instant finish does not blow up wpm.
pub const MIN_ELAPSED_MINUTES: f64 = 0.01;

/// Final, immutable metrics of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub wpm: u32,
    pub accuracy: u8,
    pub errors: usize,
    pub total_chars: usize,
    pub elapsed_minutes: f64,
}

impl TestResults {
    pub fn from_finish(event: &FinishEvent) -> Self {
        let elapsed_secs = event
            .finished_at
            .duration_since(event.started_at)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let elapsed_minutes = (elapsed_secs * 1000.0 / 60_000.0).max(MIN_ELAPSED_MINUTES);

        let length = event.length as f64;
        let wpm = ((length / CHARS_PER_WORD) / elapsed_minutes).round().max(1.0) as u32;

        let accuracy = if event.length == 0 {
            0
        } else {
            let errors = event.total_error_events as f64;
            (((length - errors) / length) * 100.0).round().clamp(0.0, 100.0) as u8
        };

        Self {
            wpm,
            accuracy,
            errors: event.total_error_events,
            total_chars: event.length,
            elapsed_minutes,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Perfect! Test completed with {}% accuracy and {} WPM!",
            self.accuracy, self.wpm
        )
    }
}
