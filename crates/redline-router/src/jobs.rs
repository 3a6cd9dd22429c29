//! Job records for polling
//!
//! One record per job id, written by the handlers and the job runner. The
//! store lives for the life of the process and is never evicted; a restart
//! loses every record.

use chrono::{DateTime, Utc};
use redline_domain::{ContractChangeResult, ProcessingResult, ProgressUpdate, Status};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lifecycle of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, pipeline not started
    Pending,
    /// Pipeline running
    Processing,
    /// Finished with a result
    Success,
    /// Finished with an error
    Error,
}

impl JobStatus {
    /// Whether the job has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

impl From<Status> for JobStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => JobStatus::Success,
            Status::Error => JobStatus::Error,
        }
    }
}

/// Latest progress of a job; each write replaces the whole record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Step label
    pub step: String,
    /// Percentage, 0-100
    pub progress: u8,
    /// Human-readable description
    pub message: String,
    /// When this record was written
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Record for a job that has not reported yet
    pub fn starting() -> Self {
        Self {
            step: "Starting".to_string(),
            progress: 0,
            message: "Initializing processing".to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl From<ProgressUpdate> for ProgressRecord {
    fn from(update: ProgressUpdate) -> Self {
        Self {
            step: update.step,
            progress: update.progress,
            message: update.message,
            updated_at: Utc::now(),
        }
    }
}

/// Everything known about one job
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// Job id, equal to the contract id
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Result once successful
    pub result: Option<ContractChangeResult>,
    /// Error once failed
    pub error: Option<String>,
    /// Trace correlation id once finished
    pub trace_id: Option<String>,
    /// Pipeline duration once finished
    pub processing_time_ms: Option<u64>,
    /// When the job was accepted
    pub created_at: DateTime<Utc>,
    /// When the job finished
    pub completed_at: Option<DateTime<Utc>>,
    /// Latest progress
    pub progress: Option<ProgressRecord>,
}

impl JobRecord {
    fn new(job_id: impl Into<String>, status: JobStatus, progress: Option<ProgressRecord>) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            result: None,
            error: None,
            trace_id: None,
            processing_time_ms: None,
            created_at: Utc::now(),
            completed_at: None,
            progress,
        }
    }

    /// Queued job that has not started
    pub fn pending(job_id: impl Into<String>) -> Self {
        Self::new(job_id, JobStatus::Pending, None)
    }

    /// Job whose pipeline is starting now
    pub fn processing(job_id: impl Into<String>) -> Self {
        Self::new(job_id, JobStatus::Processing, Some(ProgressRecord::starting()))
    }

    /// Copy the envelope's outcome into this record
    pub fn complete(&mut self, envelope: &ProcessingResult) {
        self.status = envelope.status().into();
        self.result = envelope.result().cloned();
        self.error = envelope.error().map(str::to_string);
        self.trace_id = envelope.trace_id.clone();
        self.processing_time_ms = Some(envelope.processing_time_ms);
        self.completed_at = Some(Utc::now());
    }
}

/// Keyed job storage shared by the handlers
pub trait JobStore: Send + Sync {
    /// Insert a record unless a job with the same id is still running
    ///
    /// Finished records are replaced. Returns false when the id is taken.
    fn claim(&self, record: JobRecord) -> bool;

    /// Snapshot of a record
    fn get(&self, job_id: &str) -> Option<JobRecord>;

    /// Replace the progress of a job, moving it out of `pending`
    ///
    /// Returns false for unknown ids.
    fn update_progress(&self, job_id: &str, progress: ProgressRecord) -> bool;

    /// Record the final envelope of a job
    ///
    /// Returns false for unknown ids.
    fn complete(&self, job_id: &str, envelope: &ProcessingResult) -> bool;
}

/// Process-local store behind a `RwLock`
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobRecord>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobStore for InMemoryJobStore {
    fn claim(&self, record: JobRecord) -> bool {
        let mut jobs = self.write();
        if jobs.get(&record.job_id).is_some_and(|existing| !existing.status.is_terminal()) {
            return false;
        }
        jobs.insert(record.job_id.clone(), record);
        true
    }

    fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.read().get(job_id).cloned()
    }

    fn update_progress(&self, job_id: &str, progress: ProgressRecord) -> bool {
        match self.write().get_mut(job_id) {
            Some(record) => {
                if record.status == JobStatus::Pending {
                    record.status = JobStatus::Processing;
                }
                record.progress = Some(progress);
                true
            }
            None => false,
        }
    }

    fn complete(&self, job_id: &str, envelope: &ProcessingResult) -> bool {
        match self.write().get_mut(job_id) {
            Some(record) => {
                record.complete(envelope);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_moves_to_processing_on_progress() {
        let store = InMemoryJobStore::new();
        assert!(store.claim(JobRecord::pending("job-1")));
        assert_eq!(store.get("job-1").unwrap().status, JobStatus::Pending);

        let update = ProgressUpdate::processing("Step 1/5", 10, "Parsing original contract...");
        assert!(store.update_progress("job-1", update.into()));

        let record = store.get("job-1").unwrap();
        assert_eq!(record.status, JobStatus::Processing);
        assert_eq!(record.progress.unwrap().progress, 10);
    }

    #[test]
    fn test_complete_copies_envelope() {
        let store = InMemoryJobStore::new();
        assert!(store.claim(JobRecord::processing("job-2")));

        let envelope = ProcessingResult::failure(
            "job-2",
            "Image file not found: a.png",
            Some("t-1".into()),
            12,
        );
        assert!(store.complete("job-2", &envelope));

        let record = store.get("job-2").unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.error.as_deref(), Some("Image file not found: a.png"));
        assert_eq!(record.trace_id.as_deref(), Some("t-1"));
        assert_eq!(record.processing_time_ms, Some(12));
        assert!(record.completed_at.is_some());
        assert!(record.status.is_terminal());
    }

    #[test]
    fn test_claim_refuses_running_job_but_replaces_finished_one() {
        let store = InMemoryJobStore::new();
        assert!(store.claim(JobRecord::pending("job-3")));
        assert!(!store.claim(JobRecord::processing("job-3")));
        assert_eq!(store.get("job-3").unwrap().status, JobStatus::Pending);

        let envelope = ProcessingResult::failure("job-3", "boom", None, 1);
        assert!(store.complete("job-3", &envelope));
        assert!(store.claim(JobRecord::processing("job-3")));

        let record = store.get("job-3").unwrap();
        assert_eq!(record.status, JobStatus::Processing);
        assert!(record.error.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_ids() {
        let store = InMemoryJobStore::new();
        assert!(store.get("nope").is_none());
        assert!(!store.update_progress("nope", ProgressRecord::starting()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_job_status_wire_names() {
        assert_eq!(serde_json::to_string(&JobStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(serde_json::to_string(&JobStatus::Processing).unwrap(), "\"processing\"");
    }
}
