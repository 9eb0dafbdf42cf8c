//! Session cancellation: marks every cancellable job in a session
//! `cancelled` and best-effort tears down its remote resources.

use std::sync::Arc;

use crate::infrastructure::external::cloud_speech::RemoteTranscriptionClient;
use crate::infrastructure::jobs::{CancellationFlags, SessionStore};
use crate::shared::error::JobError;

#[derive(Debug, Clone, Default)]
pub struct CancelSessionResult {
    pub cancelled: Vec<String>,
    pub cleaned_blobs: usize,
    pub errors: Vec<String>,
}

pub struct CancelSessionUseCase {
    sessions: SessionStore,
    cancellation: CancellationFlags,
    remote: Arc<RemoteTranscriptionClient>,
}

impl CancelSessionUseCase {
    pub fn new(sessions: SessionStore, cancellation: CancellationFlags, remote: Arc<RemoteTranscriptionClient>) -> Self {
        Self { sessions, cancellation, remote }
    }

    /// Marks every cancellable job cancelled, then best-effort tears down
    /// each one's remote resources. Calling this twice on the same session
    /// is safe: the second call finds no cancellable jobs left and returns
    /// an empty result; double-deleting the same blob is tolerated.
    pub async fn execute(&self, session_id: &str) -> Result<CancelSessionResult, JobError> {
        let session = self.sessions.get_session(session_id).await?;
        let cancellable: Vec<_> = session.jobs.values().filter(|j| j.is_cancellable()).cloned().collect();

        let cancelled = self.sessions.cancel_session(session_id).await?;

        let mut cleaned_blobs = 0;
        let mut errors = Vec::new();

        for job in cancellable {
            self.cancellation.cancel(&job.job_id);

            if let Some(blob_name) = &job.remote_blob_name {
                if self.remote.delete_blob(blob_name).await {
                    cleaned_blobs += 1;
                } else {
                    errors.push(format!("failed to delete blob for job {}", job.job_id));
                }
            }
            if let Some(remote_job_id) = &job.remote_job_id {
                if !self.remote.delete_transcription(remote_job_id).await {
                    errors.push(format!("failed to delete remote job for job {}", job.job_id));
                }
            }
        }

        Ok(CancelSessionResult { cancelled, cleaned_blobs, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Job, JobSource, Session};
    use crate::infrastructure::external::cloud_speech::{BlobClient, SpeechClient};

    fn make_remote() -> Arc<RemoteTranscriptionClient> {
        Arc::new(RemoteTranscriptionClient::new(
            BlobClient::new("http://localhost:1", "container", "sas"),
            SpeechClient::new("http://localhost:1", "key"),
        ))
    }

    #[tokio::test]
    async fn cancelling_an_unknown_session_is_an_error() {
        let use_case = CancelSessionUseCase::new(SessionStore::new(), CancellationFlags::new(), make_remote());
        assert!(use_case.execute("nope").await.is_err());
    }

    #[tokio::test]
    async fn cancelling_a_session_with_no_active_jobs_returns_empty() {
        let sessions = SessionStore::new();
        let mut session = Session::new("s1".to_string(), JobSource::Api, false);
        let mut completed = Job::new("j1".to_string(), "/a.mkv".to_string(), "en".to_string(), JobSource::Api);
        completed.status = crate::domain::entities::JobStatus::Completed;
        session.add_job(completed);
        sessions.insert_session(session).await;

        let use_case = CancelSessionUseCase::new(sessions, CancellationFlags::new(), make_remote());
        let result = use_case.execute("s1").await.unwrap();
        assert!(result.cancelled.is_empty());
    }
}
