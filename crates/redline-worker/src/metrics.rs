//! Counters for worker operations

/// Jobs seen by one worker since start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerMetrics {
    /// Messages that reached the pipeline
    pub processed: usize,

    /// Pipeline runs ending in `success`
    pub succeeded: usize,

    /// Pipeline runs ending in `error`
    pub failed: usize,

    /// Messages dropped before the pipeline (malformed)
    pub rejected: usize,

    /// Replies published
    pub replies: usize,
}

impl WorkerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished pipeline run
    pub fn record_outcome(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Record a dropped message
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Record a published reply
    pub fn record_reply(&mut self) {
        self.replies += 1;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Worker Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Processed: {}", self.processed),
            format!("  Succeeded: {}", self.succeeded),
            format!("  Failed: {}", self.failed),
            format!("Rejected: {}", self.rejected),
            format!("Replies sent: {}", self.replies),
        ]
        .join("\n")
    }
}
