//! Failure Notifier singleton.
//!
//! Process-wide singleton held behind an explicit lock rather than hidden
//! memoization, so tests can `reset_for_tests`.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::domain::entities::{Job, Session};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_failure(&self, job: &Job, session: &Session);
}

/// Fire-and-forget push to a configured webhook URL. Never surfaces an
/// error to the orchestrator; failures are logged only.
pub struct HttpNotifier {
    client: Client,
    webhook_url: String,
}

impl HttpNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_failure(&self, job: &Job, session: &Session) {
        let payload = serde_json::json!({
            "sessionId": session.session_id,
            "jobId": job.job_id,
            "filePath": job.file_path,
            "error": job.error,
        });

        if let Err(e) = self.client.post(&self.webhook_url).json(&payload).send().await {
            warn!("failure notifier request errored for job {}: {e}", job.job_id);
        }
    }
}

/// No-op implementation used in tests and when no webhook is configured.
#[derive(Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_failure(&self, _job: &Job, _session: &Session) {}
}

static NOTIFIER: Lazy<RwLock<Arc<dyn Notifier>>> = Lazy::new(|| RwLock::new(Arc::new(NoopNotifier)));

/// Initializes (or replaces) the process-wide notifier.
pub fn init(notifier: Arc<dyn Notifier>) {
    *NOTIFIER.write().expect("notifier lock poisoned") = notifier;
}

/// Returns the currently configured notifier, `NoopNotifier` by default.
pub fn get() -> Arc<dyn Notifier> {
    NOTIFIER.read().expect("notifier lock poisoned").clone()
}

/// Restores the default `NoopNotifier`. Tests only — production code
/// should only ever call `init` once, at startup.
pub fn reset_for_tests() {
    init(Arc::new(NoopNotifier));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::JobSource;

    #[tokio::test]
    async fn default_notifier_is_noop_and_never_panics() {
        reset_for_tests();
        let job = Job::new("j1".to_string(), "/a.mkv".to_string(), "en".to_string(), JobSource::Api);
        let session = Session::new("s1".to_string(), JobSource::Api, false);
        get().notify_failure(&job, &session).await;
    }

    #[tokio::test]
    async fn init_replaces_the_singleton() {
        struct Counting(std::sync::atomic::AtomicUsize);
        #[async_trait]
        impl Notifier for Counting {
            async fn notify_failure(&self, _job: &Job, _session: &Session) {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        init(Arc::new(Counting(std::sync::atomic::AtomicUsize::new(0))));
        let job = Job::new("j1".to_string(), "/a.mkv".to_string(), "en".to_string(), JobSource::Api);
        let session = Session::new("s1".to_string(), JobSource::Api, false);
        get().notify_failure(&job, &session).await;
        reset_for_tests();
    }
}
