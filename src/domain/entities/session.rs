//! Session entity: a unit of work grouping one or more jobs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::job::{Job, JobSource};

/// A unit of work grouping one or more jobs submitted together.
/// Append-only: jobs are never removed once added (until the whole
/// session is deleted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub source: JobSource,
    pub created_at: DateTime<Utc>,
    pub notify_downstream: bool,

    /// Insertion order is preserved for UI display.
    pub jobs: HashMap<String, Job>,
    pub job_order: Vec<String>,

    /// `(file_path, reason)` pairs, in submission order.
    pub skipped: Vec<(String, String)>,
}

impl Session {
    pub fn new(session_id: String, source: JobSource, notify_downstream: bool) -> Self {
        Self {
            session_id,
            source,
            created_at: Utc::now(),
            notify_downstream,
            jobs: HashMap::new(),
            job_order: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn add_job(&mut self, job: Job) {
        self.job_order.push(job.job_id.clone());
        self.jobs.insert(job.job_id.clone(), job);
    }

    pub fn skip(&mut self, file_path: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push((file_path.into(), reason.into()));
    }

    /// Jobs in insertion order, for stable UI/API listing.
    pub fn jobs_in_order(&self) -> Vec<&Job> {
        self.job_order
            .iter()
            .filter_map(|id| self.jobs.get(id))
            .collect()
    }
}
