//! Shared error types for the application
//!
//! One `thiserror` enum per subsystem, composed into a top-level
//! `AppError` via `#[from]`, following domain-driven design conventions.

use thiserror::Error;

/// Errors from the skip-decision engine and language registry lookups.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("entity not found: {0}")]
    NotFound(String),
}

/// Media-probing (ffprobe) errors. Always absorbed into an empty result.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe process exited with status {0}")]
    NonZeroExit(String),

    #[error("failed to parse probe output: {0}")]
    ParseError(String),
}

/// Audio extraction/staging (ffmpeg) errors.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction timed out")]
    Timeout,

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Object-storage (blob) client errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("transient error: {0}")]
    Transient(String),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cloud speech-to-text batch service errors.
#[derive(Debug, Error)]
pub enum RemoteSpeechError {
    #[error("create-transcription failed: {0}")]
    CreateFailed(String),

    #[error("remote job failed: {0}")]
    JobFailed(String),

    #[error("transcription timed out")]
    Timeout,

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("response parse error: {0}")]
    ParseError(String),
}

/// Subtitle parse/emit errors.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid segment ordering or timing: {0}")]
    InvalidSegment(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

/// Job-store/orchestrator errors.
#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),
}

/// Batch ingress errors.
#[derive(Debug, Clone, Error)]
pub enum IngressError {
    #[error("all candidate files were skipped by configuration")]
    AllSkippedByConfig,

    #[error("all candidate paths were not found")]
    AllNotFound,

    #[error("no media files were found among the given paths")]
    NoMediaFiles,

    #[error("no job survived ingress: {0} skipped by config, {1} not found, {2} not media")]
    MixedSummary(usize, usize, usize),
}

/// Configuration load/validate errors.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),

    #[error("invalid configuration value for {0}: {1}")]
    Invalid(String, String),
}

/// Typed cancellation control-flow signal.
///
/// Distinct from `AppError::Failed*` variants so that the orchestrator's
/// cleanup contract runs without falsely transitioning a job to `failed`.
#[derive(Debug, Clone, Error)]
#[error("job was cancelled")]
pub struct Cancelled;

/// Top-level application error, composed from every subsystem below it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    RemoteSpeech(#[from] RemoteSpeechError),

    #[error(transparent)]
    Subtitle(#[from] SubtitleError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Ingress(#[from] IngressError),

    #[error("cancelled")]
    Cancelled,

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Cancelled> for AppError {
    fn from(_: Cancelled) -> Self {
        AppError::Cancelled
    }
}
