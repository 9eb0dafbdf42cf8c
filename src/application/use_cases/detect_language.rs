//! Language Detector — a small sibling pipeline that extracts a short audio
//! segment, drives a one-shot remote recognition, and returns a language
//! code.
//!
//! Mirrors the orchestrator's own upload/create/wait sequence, trimmed to a
//! single-shot detection: no job-store tracking, no output file, and the
//! remote job/blob are torn down immediately after the result comes back
//! rather than deferred to a cleanup contract.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::PriorityGate;
use crate::domain::value_objects::{from_any, UNKNOWN};
use crate::infrastructure::external::cloud_speech::RemoteTranscriptionClient;
use crate::infrastructure::external::ffmpeg::{AudioStager, FfprobeAdapter};
use crate::shared::error::AppError;

/// A handful of common candidate locales for language identification.
/// The remote service caps this list at 4 entries.
const CANDIDATE_LOCALES: &[&str] = &["en-US", "es-ES", "fr-FR", "de-DE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectLanguageResult {
    pub detected_language: String,
    pub language_code: String,
}

pub struct DetectLanguageUseCase {
    inspector: Arc<FfprobeAdapter>,
    stager: Arc<AudioStager>,
    remote: Arc<RemoteTranscriptionClient>,
    gate: PriorityGate,
    segment_duration_sec: f64,
    poll_interval_sec: u64,
    timeout_sec: u64,
}

impl DetectLanguageUseCase {
    pub fn new(
        inspector: Arc<FfprobeAdapter>,
        stager: Arc<AudioStager>,
        remote: Arc<RemoteTranscriptionClient>,
        gate: PriorityGate,
    ) -> Self {
        Self {
            inspector,
            stager,
            remote,
            gate,
            segment_duration_sec: 30.0,
            poll_interval_sec: 5,
            timeout_sec: 120,
        }
    }

    /// Detects the spoken language of a media file already on disk, by
    /// sampling a segment from the middle of the file.
    pub async fn detect_from_file(&self, media_path: &Path) -> Result<DetectLanguageResult, AppError> {
        let duration = self.inspector.duration_seconds(media_path).await;
        let offset = (duration / 2.0 - self.segment_duration_sec / 2.0).max(0.0);
        let segment_path = self.stager.extract_segment(media_path, offset, self.segment_duration_sec).await?;

        let result = self.run_detection(&segment_path).await;
        self.stager.cleanup(&segment_path).await;
        result
    }

    /// Detects the spoken language directly from posted audio bytes (the
    /// `/detect-language` ASR-protocol route).
    pub async fn detect_from_bytes(&self, bytes: &[u8], is_raw_pcm: bool) -> Result<DetectLanguageResult, AppError> {
        let scratch = std::env::temp_dir().join(format!("subgen-detect-{}.wav", uuid::Uuid::new_v4()));

        if is_raw_pcm {
            write_raw_pcm_as_wav(bytes, &scratch)?;
        } else {
            tokio::fs::write(&scratch, bytes).await.map_err(crate::shared::error::ExtractionError::Io)?;
        }

        let result = self.run_detection(&scratch).await;
        let _ = tokio::fs::remove_file(&scratch).await;
        result
    }

    async fn run_detection(&self, audio_path: &Path) -> Result<DetectLanguageResult, AppError> {
        let _permit = self.gate.acquire(true).await;

        let (readable_url, blob_name) = self.remote.upload_audio(audio_path).await?;
        let candidates = CANDIDATE_LOCALES.iter().map(|s| s.to_string()).collect();
        let handle = self
            .remote
            .create_transcription(&readable_url, CANDIDATE_LOCALES[0], "language-detection", false, false, Some(candidates))
            .await;

        let handle = match handle {
            Ok(h) => h,
            Err(e) => {
                self.remote.delete_blob(&blob_name).await;
                return Err(e.into());
            }
        };

        let wait_result = self
            .remote
            .wait_for_completion(&handle.remote_job_id, &handle.locale, self.poll_interval_sec, self.timeout_sec, || false)
            .await;

        self.remote.delete_transcription(&handle.remote_job_id).await;
        self.remote.delete_blob(&blob_name).await;

        let transcription = wait_result?;
        let code = from_any(&transcription.language);
        if code == UNKNOWN {
            return Ok(DetectLanguageResult { detected_language: "Unknown".to_string(), language_code: "und".to_string() });
        }
        Ok(DetectLanguageResult {
            detected_language: code.english_name.to_string(),
            language_code: code.iso1.unwrap_or("und").to_string(),
        })
    }
}

fn write_raw_pcm_as_wav(bytes: &[u8], out_path: &Path) -> Result<(), AppError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(out_path, spec)
        .map_err(|e| AppError::Internal(format!("failed to create WAV container: {e}")))?;
    for chunk in bytes.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer
            .write_sample(sample)
            .map_err(|e| AppError::Internal(format!("failed to write PCM sample: {e}")))?;
    }
    writer.finalize().map_err(|e| AppError::Internal(format!("failed to finalize WAV container: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_und() {
        let result = DetectLanguageResult { detected_language: "Unknown".to_string(), language_code: "und".to_string() };
        assert_eq!(result.language_code, "und");
    }
}
