//! Remote transcription facade — the orchestrator's single entry point
//! over object storage + cloud speech, so call sites don't need to reach
//! into both clients separately.

use std::path::Path;

use crate::domain::value_objects::TranscriptionResult;
use crate::infrastructure::external::cloud_speech::blob_client::BlobClient;
use crate::infrastructure::external::cloud_speech::speech_client::{RemoteJobHandle, RemoteJobState, SpeechClient};
use crate::shared::error::{RemoteSpeechError, StorageError};

pub struct RemoteTranscriptionClient {
    blob: BlobClient,
    speech: SpeechClient,
}

impl RemoteTranscriptionClient {
    pub fn new(blob: BlobClient, speech: SpeechClient) -> Self {
        Self { blob, speech }
    }

    pub async fn upload_audio(&self, path: &Path) -> Result<(String, String), StorageError> {
        self.blob.upload_audio(path).await
    }

    pub async fn delete_blob(&self, blob_name: &str) -> bool {
        self.blob.delete_blob(blob_name).await
    }

    pub async fn create_transcription(
        &self,
        content_url: &str,
        locale: &str,
        display_name: &str,
        word_timestamps: bool,
        diarization: bool,
        candidate_locales: Option<Vec<String>>,
    ) -> Result<RemoteJobHandle, RemoteSpeechError> {
        self.speech
            .create_transcription(content_url, locale, display_name, word_timestamps, diarization, candidate_locales)
            .await
    }

    pub async fn delete_transcription(&self, remote_job_id: &str) -> bool {
        self.speech.delete_transcription(remote_job_id).await
    }

    pub async fn wait_for_completion<F>(
        &self,
        remote_job_id: &str,
        fallback_locale: &str,
        poll_interval_sec: u64,
        timeout_sec: u64,
        should_cancel: F,
    ) -> Result<TranscriptionResult, RemoteSpeechError>
    where
        F: FnMut() -> bool,
    {
        self.speech
            .wait_for_completion(remote_job_id, fallback_locale, poll_interval_sec, timeout_sec, should_cancel)
            .await
    }
}

pub use RemoteJobState as JobState;
