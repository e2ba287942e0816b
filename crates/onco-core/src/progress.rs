//! Progress reporting contract.

use std::sync::Mutex;

/// Receives `(message, percent)` events from the orchestrator and from
/// steps. Percent is 0..=100, monotonically non-decreasing within one
/// patient's processing, and resets at the start of each new patient and of
/// each batch-level stage.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, message: &str, percent: u8);
}

/// Discards all events.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn emit(&self, _message: &str, _percent: u8) {}
}

/// Records events for assertions.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<(String, u8)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, u8)> {
        self.events.lock().expect("progress lock").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, message: &str, percent: u8) {
        self.events
            .lock()
            .expect("progress lock")
            .push((message.to_string(), percent.min(100)));
    }
}
