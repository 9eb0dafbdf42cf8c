//! Batch Ingress — expands files and folders into a new session of queued
//! jobs, applying the Skip Engine when asked.
//!
//! Shares the session/job creation shape with the orchestrator, and walks
//! directories recursively the same way, generalized to take both a
//! file-list and a folder-list input.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::entities::{Job, JobSource, Session};
use crate::domain::services::{discover_external_subtitles, evaluate_skip, is_media_extension};
use crate::domain::value_objects::SkipConfig;
use crate::infrastructure::external::ffmpeg::FfprobeAdapter;
use crate::infrastructure::jobs::SessionStore;
use crate::shared::error::IngressError;

/// Per-session soft bound on queued jobs; the global `PriorityGate` is the
/// real throttle, not this number.
const MAX_JOBS_PER_SESSION: usize = 50;

#[derive(Debug, Clone)]
pub struct BatchIngressRequest {
    pub files: Vec<String>,
    pub folders: Vec<String>,
    pub language: String,
    pub notify_downstream: bool,
    pub apply_skip_config: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchIngressResult {
    pub session_id: String,
    pub job_count: usize,
    pub queued: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

pub struct BatchIngressUseCase {
    sessions: SessionStore,
    inspector: Arc<FfprobeAdapter>,
    skip_config: SkipConfig,
}

impl BatchIngressUseCase {
    pub fn new(sessions: SessionStore, inspector: Arc<FfprobeAdapter>, skip_config: SkipConfig) -> Self {
        Self { sessions, inspector, skip_config }
    }

    /// Expands `req.folders` recursively by media extension, merges in
    /// `req.files`, then checks each resulting path in turn. Returns a
    /// typed error only when not a single job survives to be queued.
    pub async fn execute(&self, req: BatchIngressRequest) -> Result<BatchIngressResult, IngressError> {
        let mut candidates: Vec<PathBuf> = req.files.iter().map(PathBuf::from).collect();
        candidates.extend(expand_folders(&req.folders));

        let session_id = Uuid::new_v4().to_string();
        let mut session = Session::new(session_id.clone(), JobSource::Api, req.notify_downstream);

        let mut not_found = 0usize;
        let mut not_media = 0usize;
        let mut skipped_by_config = 0usize;

        for path in candidates.into_iter().take(MAX_JOBS_PER_SESSION) {
            let display = path.to_string_lossy().to_string();

            if !path.exists() {
                not_found += 1;
                session.skip(display, "file not found");
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !is_media_extension(ext) {
                not_media += 1;
                session.skip(display, "not a media file");
                continue;
            }

            if req.apply_skip_config {
                if let Some(reason) = self.skip_reason(&path, &req.language).await {
                    skipped_by_config += 1;
                    session.skip(display, reason);
                    continue;
                }
            }

            let job = Job::new(Uuid::new_v4().to_string(), display, req.language.clone(), JobSource::Api);
            session.add_job(job);
        }

        if session.jobs.is_empty() {
            return Err(classify_all_skipped(not_found, not_media, skipped_by_config));
        }

        let result = BatchIngressResult {
            session_id: session.session_id.clone(),
            job_count: session.jobs.len(),
            queued: session.jobs_in_order().into_iter().map(|j| j.file_path.clone()).collect(),
            skipped: session.skipped.clone(),
        };

        self.sessions.insert_session(session).await;
        Ok(result)
    }

    async fn skip_reason(&self, path: &Path, language: &str) -> Option<String> {
        let external_subs = discover_external_subtitles(path);
        let audio_tracks = self.inspector.audio_tracks(path).await;
        let internal_subs = self.inspector.subtitle_streams(path).await;
        let result = evaluate_skip(path, language, &self.skip_config, &external_subs, &audio_tracks, &internal_subs);
        if result.skip {
            result.reason
        } else {
            None
        }
    }
}

/// Walks each folder recursively, returning every entry whose extension
/// is a recognized media extension.
fn expand_folders(folders: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for folder in folders {
        for entry in WalkDir::new(folder).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if is_media_extension(ext) {
                found.push(path.to_path_buf());
            }
        }
    }
    found
}

/// Distinguishes "every candidate failed for the same reason" from a
/// mixed bag of failures.
fn classify_all_skipped(not_found: usize, not_media: usize, skipped_by_config: usize) -> IngressError {
    let total = not_found + not_media + skipped_by_config;
    if total == 0 {
        return IngressError::NoMediaFiles;
    }
    if skipped_by_config == total {
        IngressError::AllSkippedByConfig
    } else if not_found == total {
        IngressError::AllNotFound
    } else if not_media == total {
        IngressError::NoMediaFiles
    } else {
        IngressError::MixedSummary(skipped_by_config, not_found, not_media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_request(files: Vec<String>) -> BatchIngressRequest {
        BatchIngressRequest {
            files,
            folders: Vec::new(),
            language: "en".to_string(),
            notify_downstream: false,
            apply_skip_config: false,
        }
    }

    #[tokio::test]
    async fn missing_files_are_skipped_with_reason() {
        let use_case = BatchIngressUseCase::new(SessionStore::new(), Arc::new(FfprobeAdapter::default()), SkipConfig::default());
        let err = use_case.execute(base_request(vec!["/definitely/not/here.mkv".to_string()])).await.unwrap_err();
        assert!(matches!(err, IngressError::AllNotFound));
    }

    #[tokio::test]
    async fn non_media_extensions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let use_case = BatchIngressUseCase::new(SessionStore::new(), Arc::new(FfprobeAdapter::default()), SkipConfig::default());
        let err = use_case.execute(base_request(vec![path.to_string_lossy().to_string()])).await.unwrap_err();
        assert!(matches!(err, IngressError::NoMediaFiles));
    }

    #[tokio::test]
    async fn a_single_real_media_file_is_queued() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.mkv");
        fs::write(&path, b"fake").unwrap();

        let use_case = BatchIngressUseCase::new(SessionStore::new(), Arc::new(FfprobeAdapter::default()), SkipConfig::default());
        let result = use_case.execute(base_request(vec![path.to_string_lossy().to_string()])).await.unwrap();
        assert_eq!(result.job_count, 1);
        assert!(result.skipped.is_empty());
    }

    #[tokio::test]
    async fn folders_are_expanded_recursively_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("season1");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("ep1.mp4"), b"fake").unwrap();
        fs::write(nested.join("readme.txt"), b"fake").unwrap();

        let use_case = BatchIngressUseCase::new(SessionStore::new(), Arc::new(FfprobeAdapter::default()), SkipConfig::default());
        let mut req = base_request(Vec::new());
        req.folders = vec![dir.path().to_string_lossy().to_string()];
        let result = use_case.execute(req).await.unwrap();
        assert_eq!(result.job_count, 1);
    }

    #[tokio::test]
    async fn mixed_failures_report_a_mixed_summary() {
        let dir = tempfile::tempdir().unwrap();
        let not_media = dir.path().join("readme.txt");
        fs::write(&not_media, b"fake").unwrap();

        let use_case = BatchIngressUseCase::new(SessionStore::new(), Arc::new(FfprobeAdapter::default()), SkipConfig::default());
        let req = base_request(vec![not_media.to_string_lossy().to_string(), "/nowhere/gone.mkv".to_string()]);
        let err = use_case.execute(req).await.unwrap_err();
        assert!(matches!(err, IngressError::MixedSummary(0, 1, 1)));
    }
}
