//! Webhook duplicate-submission guard.
//!
//! A process-wide `file_path -> in flight` set, checked before a webhook
//! hands a path to the orchestrator and cleared once that pipeline
//! reaches any terminal outcome — success, failure, or cancellation
//! alike. Media servers routinely fire the same event twice (e.g.
//! Plex's "added" and "library.new" in close succession); without this
//! guard both would queue their own transcription job for the same file.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct WebhookGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

impl WebhookGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks-and-sets: returns `true` (admitted) only if
    /// `file_path` was not already in flight.
    pub fn try_start(&self, file_path: &str) -> bool {
        self.active.lock().expect("webhook guard lock poisoned").insert(file_path.to_string())
    }

    /// Releases `file_path`, regardless of how the in-flight pipeline ended.
    pub fn finish(&self, file_path: &str) {
        self.active.lock().expect("webhook guard lock poisoned").remove(file_path);
    }

    pub fn is_active(&self, file_path: &str) -> bool {
        self.active.lock().expect("webhook guard lock poisoned").contains(file_path)
    }
}

/// RAII guard so `finish` runs on every exit path of the caller, including
/// early returns and panics, without repeating the cleanup call.
pub struct WebhookGuardHandle {
    guard: WebhookGuard,
    file_path: String,
}

impl WebhookGuardHandle {
    pub fn acquire(guard: WebhookGuard, file_path: impl Into<String>) -> Option<Self> {
        let file_path = file_path.into();
        if guard.try_start(&file_path) {
            Some(Self { guard, file_path })
        } else {
            None
        }
    }
}

impl Drop for WebhookGuardHandle {
    fn drop(&mut self) {
        self.guard.finish(&self.file_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_submission_for_the_same_path_is_refused() {
        let guard = WebhookGuard::new();
        let first = WebhookGuardHandle::acquire(guard.clone(), "/tv/show.mkv");
        assert!(first.is_some());
        assert!(WebhookGuardHandle::acquire(guard.clone(), "/tv/show.mkv").is_none());
    }

    #[test]
    fn dropping_the_handle_frees_the_path_for_resubmission() {
        let guard = WebhookGuard::new();
        {
            let _handle = WebhookGuardHandle::acquire(guard.clone(), "/tv/show.mkv");
            assert!(guard.is_active("/tv/show.mkv"));
        }
        assert!(!guard.is_active("/tv/show.mkv"));
        assert!(WebhookGuardHandle::acquire(guard.clone(), "/tv/show.mkv").is_some());
    }

    #[test]
    fn distinct_paths_do_not_contend() {
        let guard = WebhookGuard::new();
        let _a = WebhookGuardHandle::acquire(guard.clone(), "/tv/a.mkv");
        assert!(WebhookGuardHandle::acquire(guard.clone(), "/tv/b.mkv").is_some());
    }
}
