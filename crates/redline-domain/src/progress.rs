//! Progress notifications
//!
//! Progress is one-way: the pipeline emits and never waits. Sinks must not
//! block, and a sink that fails is the caller's problem.

use serde::{Deserialize, Serialize};

/// Status carried by every in-flight update
pub const STATUS_PROCESSING: &str = "processing";

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Step label, e.g. `Step 3/5`
    pub step: String,
    /// Percentage, 0-100
    pub progress: u8,
    /// Human-readable description
    pub message: String,
    /// Job status while in flight
    pub status: String,
}

impl ProgressUpdate {
    /// Update for a job that is still running
    pub fn processing(step: impl Into<String>, progress: u8, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            progress: progress.min(100),
            message: message.into(),
            status: STATUS_PROCESSING.to_string(),
        }
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    /// Deliver one update; must return promptly
    fn notify(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn notify(&self, update: ProgressUpdate) {
        self(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |update: ProgressUpdate| seen.lock().unwrap().push(update.progress);
        sink.notify(ProgressUpdate::processing("Step 1/5", 10, "Parsing original contract..."));
        sink.notify(ProgressUpdate::processing(
            "Step 1/5",
            20,
            "Original contract parsed successfully",
        ));
        assert_eq!(*seen.lock().unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_progress_is_clamped() {
        let update = ProgressUpdate::processing("Completed", 120, "done");
        assert_eq!(update.progress, 100);
        assert_eq!(update.status, "processing");
    }
}
