//! TranscriptionResult value object.

use crate::domain::value_objects::subtitle_segment::SubtitleSegment;

/// The parsed output of a completed remote transcription job.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub job_id: String,
    /// Raw locale string as reported by (or falling back to) the remote job.
    pub language: String,
    pub segments: Vec<SubtitleSegment>,
    pub duration_seconds: f64,
}

impl TranscriptionResult {
    /// `duration_seconds` is always `max(end_seconds)` across segments,
    /// computed here rather than trusted from callers.
    pub fn new(job_id: impl Into<String>, language: impl Into<String>, segments: Vec<SubtitleSegment>) -> Self {
        let duration_seconds = segments
            .iter()
            .map(|s| s.end_seconds)
            .fold(0.0_f64, f64::max);
        Self {
            job_id: job_id.into(),
            language: language.into(),
            segments,
            duration_seconds,
        }
    }
}
