//! Orchestrator — the twelve-step transcription pipeline: resolve the
//! session/job, acquire a gate permit, stage audio, upload, create and poll
//! the remote job, write the output, and run cleanup on every exit path.
//!
//! One injected-dependency struct whose `execute()` walks a fixed sequence
//! of job-store transitions, holding one gate permit for the whole
//! operation, with typed cancellation and a best-effort cleanup contract
//! that runs regardless of which step the pipeline exits from.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::handlers::downstream_refresh;
use crate::application::services::PriorityGate;
use crate::domain::entities::{Job, JobSource, JobStatus, Session};
use crate::domain::value_objects::{from_any, to_service_locale, LanguageCode, SubtitleNamingConfig, TranscriptionResult};
use crate::infrastructure::external::cloud_speech::RemoteTranscriptionClient;
use crate::infrastructure::external::ffmpeg::{AudioFormat, AudioStager, FfprobeAdapter};
use crate::infrastructure::jobs::{CancellationFlags, SessionStore};
use crate::infrastructure::subtitle;
use crate::interfaces::external_services::{MediaServerClient, SubtitleManagerClient};
use crate::interfaces::notifier;
use crate::shared::error::{AppError, Cancelled};

/// Output shape options the orchestrator chooses between at step 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    TimedText,
    Lyrics,
}

/// Everything `execute()` needs beyond what's already recorded on the job.
pub struct TranscribeFileRequest {
    pub file_path: String,
    pub language: String,
    pub source: JobSource,
    pub session_id: Option<String>,
    pub job_id: Option<String>,
    pub save_output: bool,
    pub refresh_indexers: bool,
}

impl TranscribeFileRequest {
    pub fn new(file_path: impl Into<String>, language: impl Into<String>, source: JobSource) -> Self {
        Self {
            file_path: file_path.into(),
            language: language.into(),
            source,
            session_id: None,
            job_id: None,
            save_output: true,
            refresh_indexers: true,
        }
    }
}

/// Tracks every resource the cleanup contract must release, regardless of
/// which step the pipeline exits from.
#[derive(Default)]
struct Cleanup {
    staged_audio: Option<PathBuf>,
    blob_name: Option<String>,
    remote_job_id: Option<String>,
}

pub struct TranscribeFileUseCase {
    sessions: SessionStore,
    gate: PriorityGate,
    cancellation: CancellationFlags,
    inspector: Arc<FfprobeAdapter>,
    stager: Arc<AudioStager>,
    remote: Arc<RemoteTranscriptionClient>,
    media_servers: Vec<Arc<dyn MediaServerClient>>,
    subtitle_manager: Option<Arc<dyn SubtitleManagerClient>>,
    naming: SubtitleNamingConfig,
    product_name: String,
    lyric_for_audio: bool,
    credit_line_enabled: bool,
    credit_offset_seconds: f64,
    poll_interval_sec: u64,
    timeout_sec: u64,
}

impl TranscribeFileUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionStore,
        gate: PriorityGate,
        cancellation: CancellationFlags,
        inspector: Arc<FfprobeAdapter>,
        stager: Arc<AudioStager>,
        remote: Arc<RemoteTranscriptionClient>,
        media_servers: Vec<Arc<dyn MediaServerClient>>,
        naming: SubtitleNamingConfig,
        product_name: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            gate,
            cancellation,
            inspector,
            stager,
            media_servers,
            subtitle_manager: None,
            remote,
            naming,
            product_name: product_name.into(),
            lyric_for_audio: false,
            credit_line_enabled: true,
            credit_offset_seconds: 5.0,
            poll_interval_sec: 10,
            timeout_sec: 3600,
        }
    }

    pub fn with_subtitle_manager(mut self, client: Arc<dyn SubtitleManagerClient>) -> Self {
        self.subtitle_manager = Some(client);
        self
    }

    pub fn with_lyric_for_audio(mut self, enabled: bool) -> Self {
        self.lyric_for_audio = enabled;
        self
    }

    pub fn with_credit_line(mut self, enabled: bool, offset_seconds: f64) -> Self {
        self.credit_line_enabled = enabled;
        self.credit_offset_seconds = offset_seconds;
        self
    }

    pub fn with_polling(mut self, poll_interval_sec: u64, timeout_sec: u64) -> Self {
        self.poll_interval_sec = poll_interval_sec;
        self.timeout_sec = timeout_sec;
        self
    }

    /// Runs the full pipeline for a file already on disk. Never returns an
    /// `Err` — every failure is absorbed into the returned `Job`'s terminal
    /// state and `error` field; the job store is the source of truth.
    pub async fn execute(&self, req: TranscribeFileRequest) -> (Option<TranscriptionResult>, Job) {
        let (session_id, job_id) = match self.resolve_session_and_job(&req).await {
            Ok(ids) => ids,
            Err(e) => {
                let job = Job::new("unresolved".to_string(), req.file_path.clone(), req.language.clone(), req.source);
                error!("failed to resolve session/job for {}: {e}", req.file_path);
                return (None, job);
            }
        };

        let cancel_flag = self.cancellation.register(&job_id);
        let priority = matches!(req.source, JobSource::Asr);
        let _permit = self.gate.acquire(priority).await;

        let mut cleanup = Cleanup::default();
        let outcome = self.run_pipeline(&session_id, &job_id, &req, &mut cleanup, &cancel_flag).await;
        self.run_cleanup(&cleanup).await;
        self.cancellation.clear(&job_id);

        let job = match outcome {
            Ok(result) => {
                let _ = self
                    .sessions
                    .update_job(&session_id, &job_id, |job| {
                        job.status = JobStatus::Completed;
                        job.completed_at = Some(chrono::Utc::now());
                        job.segments_count = Some(result.segments.len());
                        job.duration_seconds = Some(result.duration_seconds);
                    })
                    .await;
                let job = self.sessions.get_job(&session_id, &job_id).await.unwrap_or_else(|_| {
                    Job::new(job_id.clone(), req.file_path.clone(), req.language.clone(), req.source)
                });
                return (Some(result), job);
            }
            Err(PipelineError::Cancelled) => {
                info!("job {job_id} observed cancellation, cleanup contract ran");
                self.sessions.get_job(&session_id, &job_id).await
            }
            Err(PipelineError::Failed(e)) => {
                warn!("job {job_id} failed: {e}");
                let _ = self.sessions.fail_job(&session_id, &job_id, e.to_string()).await;
                self.notify_failure(&session_id, &job_id).await;
                self.sessions.get_job(&session_id, &job_id).await
            }
        };

        let job = job.unwrap_or_else(|_| Job::new(job_id, req.file_path.clone(), req.language.clone(), req.source));
        (None, job)
    }

    /// The ASR-protocol sibling: input is raw bytes rather than a path
    /// already on disk, and the output is returned in memory instead of
    /// written next to the media. Not tracked by the session store, so
    /// there is no session-driven cancellation to observe.
    pub async fn transcribe_audio_bytes(
        &self,
        bytes: &[u8],
        language: &str,
        source: JobSource,
        file_name: &str,
        is_raw_pcm: bool,
    ) -> Result<TranscriptionResult, AppError> {
        let scratch = std::env::temp_dir().join(format!("subgen-asr-{}.wav", uuid::Uuid::new_v4()));

        if is_raw_pcm {
            write_raw_pcm_as_wav(bytes, &scratch)?;
        } else {
            tokio::fs::write(&scratch, bytes).await.map_err(crate::shared::error::ExtractionError::Io)?;
        }

        let mut cleanup = Cleanup { staged_audio: Some(scratch.clone()), ..Default::default() };

        let priority = matches!(source, JobSource::Asr);
        let _permit = self.gate.acquire(priority).await;

        let never_cancel = Arc::new(AtomicBool::new(false));
        let result = self.transcode_upload_and_wait(&scratch, language, &mut cleanup, &never_cancel, None).await;
        self.run_cleanup(&cleanup).await;

        match result {
            Ok(r) => {
                info!("transcribed in-memory audio '{file_name}' ({} segments)", r.segments.len());
                Ok(r)
            }
            Err(PipelineError::Cancelled) => Err(AppError::Cancelled),
            Err(PipelineError::Failed(e)) => Err(e),
        }
    }

    async fn resolve_session_and_job(&self, req: &TranscribeFileRequest) -> Result<(String, String), AppError> {
        let session_id = match &req.session_id {
            Some(id) if self.sessions.get_session(id).await.is_ok() => id.clone(),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                self.sessions.insert_session(Session::new(id.clone(), req.source, req.refresh_indexers)).await;
                id
            }
        };

        let job_id = match &req.job_id {
            Some(id) => id.clone(),
            None => {
                let job = Job::new(uuid::Uuid::new_v4().to_string(), req.file_path.clone(), req.language.clone(), req.source);
                let id = job.job_id.clone();
                self.insert_job(&session_id, job).await?;
                id
            }
        };

        Ok((session_id, job_id))
    }

    async fn insert_job(&self, session_id: &str, job: Job) -> Result<(), AppError> {
        let mut session = self.sessions.get_session(session_id).await?;
        session.add_job(job);
        self.sessions.insert_session(session).await;
        Ok(())
    }

    async fn run_pipeline(
        &self,
        session_id: &str,
        job_id: &str,
        req: &TranscribeFileRequest,
        cleanup: &mut Cleanup,
        cancel_flag: &Arc<AtomicBool>,
    ) -> Result<TranscriptionResult, PipelineError> {
        let media_path = Path::new(&req.file_path);

        // Step 3: stage audio.
        self.transition(session_id, job_id, JobStatus::Extracting).await?;
        let is_audio_input =
            crate::domain::services::is_audio_extension(media_path.extension().and_then(|e| e.to_str()).unwrap_or(""));

        let (staged_path, owns_staged) = if is_audio_input {
            self.stager
                .prepare(media_path, AudioFormat::OpusOgg)
                .await
                .map_err(|e| PipelineError::Failed(e.into()))?
        } else {
            let tracks = self.inspector.audio_tracks(media_path).await;
            let track_index = AudioStager::select_preferred_track(&tracks, &[req.language.clone()]);
            let path = self
                .stager
                .extract(media_path, track_index, AudioFormat::OpusOgg, 16_000, true)
                .await
                .map_err(|e| PipelineError::Failed(e.into()))?;
            (path, true)
        };
        if owns_staged {
            cleanup.staged_audio = Some(staged_path.clone());
        }

        // Step 5: cancellation observed during staging/locale mapping.
        if cancel_flag.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }

        let result = self
            .transcode_upload_and_wait(&staged_path, &req.language, cleanup, cancel_flag, Some((session_id, job_id)))
            .await?;

        if req.save_output {
            let out_format = if is_audio_input && self.lyric_for_audio {
                OutputFormat::Lyrics
            } else {
                OutputFormat::TimedText
            };
            let output_path = self.write_output(media_path, &req.language, &result, out_format)?;
            let output_path_str = output_path.to_string_lossy().to_string();
            let _ = self
                .sessions
                .update_job(session_id, job_id, |job| job.output_path = Some(output_path_str.clone()))
                .await;

            if req.refresh_indexers {
                let mut statuses = downstream_refresh::refresh_all(&self.media_servers, &req.file_path).await;
                if let Some(subtitle_manager) = &self.subtitle_manager {
                    let ok = downstream_refresh::notify_subtitle_manager(subtitle_manager.as_ref(), &req.file_path).await;
                    statuses.insert("subtitle-manager".to_string(), ok);
                }
                let _ = self
                    .sessions
                    .update_job(session_id, job_id, |job| job.media_refresh_status = Some(statuses.clone()))
                    .await;
            }
        }

        Ok(result)
    }

    /// Steps 4–8: locale mapping, upload, remote-job creation, and the
    /// completion wait. Shared between `execute` and
    /// `transcribe_audio_bytes`, since both follow the same remainder of
    /// the pipeline once audio is staged on disk.
    async fn transcode_upload_and_wait(
        &self,
        staged_path: &Path,
        language: &str,
        cleanup: &mut Cleanup,
        cancel_flag: &Arc<AtomicBool>,
        job_ref: Option<(&str, &str)>,
    ) -> Result<TranscriptionResult, PipelineError> {
        let locale = to_service_locale(&from_any(language));

        let (readable_url, blob_name) = self
            .remote
            .upload_audio(staged_path)
            .await
            .map_err(|e| PipelineError::Failed(e.into()))?;
        cleanup.blob_name = Some(blob_name.clone());
        if let Some((session_id, job_id)) = job_ref {
            let _ = self.sessions.update_job(session_id, job_id, |job| job.remote_blob_name = Some(blob_name)).await;
        }

        // Step 7: re-check cancellation before the remote job is created.
        if cancel_flag.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }

        let display_name = staged_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let handle = self
            .remote
            .create_transcription(&readable_url, &locale, &display_name, true, false, None)
            .await
            .map_err(|e| PipelineError::Failed(e.into()))?;
        cleanup.remote_job_id = Some(handle.remote_job_id.clone());
        if let Some((session_id, job_id)) = job_ref {
            let remote_job_id = handle.remote_job_id.clone();
            let _ = self.sessions.update_job(session_id, job_id, |job| job.remote_job_id = Some(remote_job_id)).await;
        }

        let remote_job_id = handle.remote_job_id.clone();
        let poll_flag = cancel_flag.clone();
        let wait_result = self
            .remote
            .wait_for_completion(&remote_job_id, &locale, self.poll_interval_sec, self.timeout_sec, move || {
                poll_flag.load(Ordering::SeqCst)
            })
            .await;

        match wait_result {
            Ok(result) => Ok(result),
            Err(e) if cancel_flag.load(Ordering::SeqCst) => {
                warn!("remote wait loop for {remote_job_id} exited on cancellation: {e}");
                Err(PipelineError::Cancelled)
            }
            Err(e) => Err(PipelineError::Failed(e.into())),
        }
    }

    fn write_output(
        &self,
        media_path: &Path,
        language: &str,
        result: &TranscriptionResult,
        format: OutputFormat,
    ) -> Result<PathBuf, PipelineError> {
        let lang: LanguageCode = from_any(language);
        let mut segments = result.segments.clone();
        if self.credit_line_enabled {
            segments = subtitle::with_credit_line(segments, &self.product_name, self.credit_offset_seconds);
        }

        let (body, ext) = match format {
            OutputFormat::TimedText => (subtitle::emit(&segments), "srt"),
            OutputFormat::Lyrics => (subtitle::emit_lyrics(&segments), "lrc"),
        };

        let out_path = subtitle::build_output_path(media_path, &lang, &self.naming, None, ext);
        std::fs::write(&out_path, body).map_err(|e| PipelineError::Failed(crate::shared::error::ExtractionError::Io(e).into()))?;

        Ok(out_path)
    }

    async fn transition(&self, session_id: &str, job_id: &str, next: JobStatus) -> Result<(), PipelineError> {
        self.sessions
            .transition_job(session_id, job_id, next)
            .await
            .map_err(|e| PipelineError::Failed(e.into()))?;
        Ok(())
    }

    /// Best-effort cleanup, never raises: delete the remote job, delete the
    /// blob, remove the local staged audio.
    async fn run_cleanup(&self, cleanup: &Cleanup) {
        if let Some(remote_job_id) = &cleanup.remote_job_id {
            self.remote.delete_transcription(remote_job_id).await;
        }
        if let Some(blob_name) = &cleanup.blob_name {
            self.remote.delete_blob(blob_name).await;
        }
        if let Some(path) = &cleanup.staged_audio {
            self.stager.cleanup(path).await;
        }
    }

    async fn notify_failure(&self, session_id: &str, job_id: &str) {
        if let (Ok(job), Ok(session)) =
            (self.sessions.get_job(session_id, job_id).await, self.sessions.get_session(session_id).await)
        {
            tokio::spawn(async move {
                notifier::get().notify_failure(&job, &session).await;
            });
        }
    }
}

enum PipelineError {
    Cancelled,
    Failed(AppError),
}

impl From<Cancelled> for PipelineError {
    fn from(_: Cancelled) -> Self {
        PipelineError::Cancelled
    }
}

/// Wraps raw 16-bit mono 16 kHz PCM bytes in a WAV container, for the ASR
/// protocol's `encode=false` request body.
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
    fn output_format_lyrics_uses_lrc_extension() {
        assert_ne!(OutputFormat::TimedText, OutputFormat::Lyrics);
    }
}
