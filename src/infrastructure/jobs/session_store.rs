//! Session/job store — in-memory, thread-safe tracking of sessions and
//! the jobs inside them.
//!
//! An `Arc<RwLock<HashMap<...>>>` wrapped in a cheaply cloneable handle,
//! with cleanup-by-age and active-count helpers. The map is keyed by
//! session rather than by flat job id, since jobs are addressed through
//! their owning session (`getJob(sessionId, jobId)`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::{Job, JobStatus, Session};
use crate::shared::error::JobError;

/// In-memory store for sessions and their jobs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn insert_session(&self, session: Session) {
        self.sessions.write().await.insert(session.session_id.clone(), session);
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, JobError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| JobError::SessionNotFound(session_id.to_string()))
    }

    pub async fn get_job(&self, session_id: &str, job_id: &str) -> Result<Job, JobError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| JobError::SessionNotFound(session_id.to_string()))?;
        session
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| JobError::JobNotFound(job_id.to_string()))
    }

    /// Applies `mutate` to the job if it exists, persisting the result.
    /// Used by the orchestrator to advance job state one step at a time.
    pub async fn update_job<F>(&self, session_id: &str, job_id: &str, mutate: F) -> Result<Job, JobError>
    where
        F: FnOnce(&mut Job),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| JobError::SessionNotFound(session_id.to_string()))?;
        let job = session
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| JobError::JobNotFound(job_id.to_string()))?;
        mutate(job);
        Ok(job.clone())
    }

    /// Transitions a job's status, recording `started_at`/`completed_at`
    /// timestamps as the state machine requires.
    pub async fn transition_job(&self, session_id: &str, job_id: &str, next: JobStatus) -> Result<Job, JobError> {
        self.update_job(session_id, job_id, |job| {
            if !job.status.can_transition_to(next) {
                return;
            }
            job.status = next;
            let now = Utc::now();
            match next {
                JobStatus::Extracting if job.started_at.is_none() => job.started_at = Some(now),
                JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled => job.completed_at = Some(now),
                _ => {}
            }
        })
        .await
    }

    pub async fn fail_job(&self, session_id: &str, job_id: &str, error: impl Into<String>) -> Result<Job, JobError> {
        let error = error.into();
        self.update_job(session_id, job_id, |job| {
            if job.status.can_transition_to(JobStatus::Failed) {
                job.status = JobStatus::Failed;
                job.error = Some(error);
                job.completed_at = Some(Utc::now());
            }
        })
        .await
    }

    /// All jobs across all sessions currently in a non-terminal,
    /// non-pending state.
    pub async fn active_jobs(&self) -> Vec<Job> {
        self.sessions
            .read()
            .await
            .values()
            .flat_map(|s| s.jobs.values())
            .filter(|j| j.is_active())
            .cloned()
            .collect()
    }

    /// Marks every cancellable job in a session as cancelled, returning
    /// the ids that were actually transitioned.
    pub async fn cancel_session(&self, session_id: &str) -> Result<Vec<String>, JobError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| JobError::SessionNotFound(session_id.to_string()))?;

        let mut cancelled = Vec::new();
        for job in session.jobs.values_mut() {
            if job.is_cancellable() {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(Utc::now());
                cancelled.push(job.job_id.clone());
            }
        }
        Ok(cancelled)
    }

    /// Removes sessions whose jobs are all terminal and whose most recent
    /// completion predates `max_age`.
    pub async fn cleanup_old_sessions(&self, max_age: Duration) {
        let cutoff: DateTime<Utc> = Utc::now() - max_age;
        self.sessions.write().await.retain(|_, session| {
            let all_terminal = session.jobs.values().all(|j| j.status.is_terminal());
            if !all_terminal {
                return true;
            }
            let latest_completion = session.jobs.values().filter_map(|j| j.completed_at).max();
            latest_completion.map(|t| t > cutoff).unwrap_or(true)
        });
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// All sessions, for the Batch API's list endpoint. No ordering
    /// guarantee beyond what the underlying map happens to yield.
    pub async fn list_sessions(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Removes a session outright, regardless of its jobs' statuses.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), JobError> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| JobError::SessionNotFound(session_id.to_string()))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Job, JobSource};

    fn make_session() -> Session {
        Session::new("s1".to_string(), JobSource::Api, false)
    }

    #[tokio::test]
    async fn job_transitions_persist() {
        let store = SessionStore::new();
        let mut session = make_session();
        let job = Job::new("j1".to_string(), "/movie.mkv".to_string(), "en".to_string(), JobSource::Api);
        session.add_job(job);
        store.insert_session(session).await;

        let updated = store.transition_job("s1", "j1", JobStatus::Extracting).await.unwrap();
        assert_eq!(updated.status, JobStatus::Extracting);
        assert!(updated.started_at.is_some());
    }

    #[tokio::test]
    async fn illegal_transition_is_a_no_op() {
        let store = SessionStore::new();
        let mut session = make_session();
        let job = Job::new("j1".to_string(), "/movie.mkv".to_string(), "en".to_string(), JobSource::Api);
        session.add_job(job);
        store.insert_session(session).await;

        let updated = store.transition_job("s1", "j1", JobStatus::Completed).await.unwrap();
        assert_eq!(updated.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn cancel_session_cancels_only_active_jobs() {
        let store = SessionStore::new();
        let mut session = make_session();
        let mut job1 = Job::new("j1".to_string(), "/a.mkv".to_string(), "en".to_string(), JobSource::Api);
        job1.status = JobStatus::Completed;
        let job2 = Job::new("j2".to_string(), "/b.mkv".to_string(), "en".to_string(), JobSource::Api);
        session.add_job(job1);
        session.add_job(job2);
        store.insert_session(session).await;

        let cancelled = store.cancel_session("s1").await.unwrap();
        assert_eq!(cancelled, vec!["j2".to_string()]);
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let store = SessionStore::new();
        let err = store.get_session("nope").await.unwrap_err();
        assert!(matches!(err, JobError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn delete_session_removes_it_and_list_no_longer_reports_it() {
        let store = SessionStore::new();
        store.insert_session(make_session()).await;
        assert_eq!(store.list_sessions().await.len(), 1);

        store.delete_session("s1").await.unwrap();
        assert!(store.list_sessions().await.is_empty());
        assert!(store.delete_session("s1").await.is_err());
    }
}
