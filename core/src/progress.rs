use std::sync::Mutex;

use tracing::info;

/// Receives the human-readable progress lines of a launch cycle.
pub trait ProgressSink: Send + Sync {
    fn report(&self, line: &str);
}

/// Forwards every line to the `wolagent::progress` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, line: &str) {
        info!(target: "wolagent::progress", "{line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    lines: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
