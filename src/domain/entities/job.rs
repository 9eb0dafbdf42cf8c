//! Job entity and its state machine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a job's request originated. Serializes lowercase for wire
/// compatibility with the batch API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Ui,
    Webhook,
    Asr,
    Api,
}

/// Job state enumeration. States form a DAG: any non-terminal state can
/// reach `Failed` or `Cancelled`; otherwise transitions are strictly the
/// forward chain below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Extracting,
    Uploading,
    Transcribing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// True iff `self -> next` is a legal, monotonic transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        match next {
            Failed | Cancelled => true,
            Pending => false,
            Extracting => self == Pending,
            Uploading => self == Extracting,
            Transcribing => self == Uploading,
            Completed => self == Transcribing,
        }
    }
}

/// A single per-file pipeline job, owned by exactly one `Session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub file_path: String,
    pub requested_language: String,
    pub source: JobSource,
    pub status: JobStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_blob_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,

    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_refresh_status: Option<HashMap<String, bool>>,
}

impl Job {
    pub fn new(job_id: String, file_path: String, requested_language: String, source: JobSource) -> Self {
        Self {
            job_id,
            file_path,
            requested_language,
            source,
            status: JobStatus::Pending,
            error: None,
            output_path: None,
            remote_job_id: None,
            remote_blob_name: None,
            segments_count: None,
            duration_seconds: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            media_refresh_status: None,
        }
    }

    /// True while the job is in any pre-terminal, non-pending status.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            JobStatus::Extracting | JobStatus::Uploading | JobStatus::Transcribing
        )
    }

    /// True while the job is eligible for cancellation.
    pub fn is_cancellable(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_chain_is_monotonic() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Extracting));
        assert!(Extracting.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Transcribing));
        assert!(Transcribing.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Uploading));
        assert!(!Completed.can_transition_to(Extracting));
    }

    #[test]
    fn any_non_terminal_state_can_fail_or_cancel() {
        use JobStatus::*;
        for s in [Pending, Extracting, Uploading, Transcribing] {
            assert!(s.can_transition_to(Failed));
            assert!(s.can_transition_to(Cancelled));
        }
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        use JobStatus::*;
        for s in [Completed, Failed, Cancelled] {
            assert!(!s.can_transition_to(Failed));
            assert!(!s.can_transition_to(Completed));
        }
    }
}
