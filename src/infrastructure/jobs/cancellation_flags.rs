//! Process-wide cancellation flags.
//!
//! The completion wait loop (`SpeechClient::wait_for_completion`) polls a
//! synchronous `FnMut() -> bool`, but the session/job store's own status
//! field only supports an async read. Rather than block an async task on a
//! lock from inside a sync closure, each in-flight job gets a plain
//! `AtomicBool` side channel that `cancel_session` flips and the
//! orchestrator polls directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct CancellationFlags {
    flags: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl CancellationFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh flag for `job_id`, overwriting any stale entry.
    pub fn register(&self, job_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.flags
            .lock()
            .expect("cancellation flags lock poisoned")
            .insert(job_id.to_string(), flag.clone());
        flag
    }

    /// Flips the flag for `job_id` if it's currently registered. A no-op
    /// for jobs that already completed and cleared their entry.
    pub fn cancel(&self, job_id: &str) {
        if let Some(flag) = self.flags.lock().expect("cancellation flags lock poisoned").get(job_id) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Removes `job_id`'s entry once its pipeline has finished.
    pub fn clear(&self, job_id: &str) {
        self.flags.lock().expect("cancellation flags lock poisoned").remove(job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_flag_starts_false_and_flips_on_cancel() {
        let flags = CancellationFlags::new();
        let flag = flags.register("j1");
        assert!(!flag.load(Ordering::SeqCst));
        flags.cancel("j1");
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn cancelling_an_unregistered_job_is_a_no_op() {
        let flags = CancellationFlags::new();
        flags.cancel("nope");
    }

    #[test]
    fn clear_drops_the_entry() {
        let flags = CancellationFlags::new();
        flags.register("j1");
        flags.clear("j1");
        flags.cancel("j1");
    }
}
