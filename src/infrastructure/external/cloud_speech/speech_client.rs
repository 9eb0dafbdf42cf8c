//! Cloud speech-to-text batch client.
//!
//! Talks to the `/speechtotext/v3.2` REST surface directly via `reqwest` —
//! no vendor SDK, matching the hand-rolled-client idiom the rest of the
//! external adapters use.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::value_objects::{SubtitleSegment, TranscriptionResult};
use crate::shared::error::RemoteSpeechError;

const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 2000;
const MAX_CANDIDATE_LOCALES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteJobState {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RemoteJobStatus {
    pub state: RemoteJobState,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteJobHandle {
    pub remote_job_id: String,
    pub status: String,
    pub created_at: String,
    pub locale: String,
}

#[derive(Serialize)]
struct CreateTranscriptionProperties {
    #[serde(rename = "wordLevelTimestampsEnabled")]
    word_level_timestamps_enabled: bool,
    #[serde(rename = "displayFormWordLevelTimestampsEnabled")]
    display_form_word_level_timestamps_enabled: bool,
    #[serde(rename = "diarizationEnabled")]
    diarization_enabled: bool,
    #[serde(rename = "punctuationMode")]
    punctuation_mode: &'static str,
    #[serde(rename = "profanityFilterMode")]
    profanity_filter_mode: &'static str,
}

#[derive(Serialize)]
struct LanguageIdentification {
    #[serde(rename = "candidateLocales")]
    candidate_locales: Vec<String>,
    mode: &'static str,
}

#[derive(Serialize)]
struct CreateTranscriptionRequest {
    #[serde(rename = "contentUrls")]
    content_urls: Vec<String>,
    locale: String,
    #[serde(rename = "displayName")]
    display_name: String,
    properties: CreateTranscriptionProperties,
    #[serde(rename = "languageIdentification", skip_serializing_if = "Option::is_none")]
    language_identification: Option<LanguageIdentification>,
}

#[derive(Deserialize)]
struct CreateTranscriptionResponse {
    #[serde(rename = "self")]
    self_url: String,
    status: String,
    #[serde(rename = "createdDateTime")]
    created_date_time: String,
    locale: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(rename = "properties", default)]
    properties: Option<StatusProperties>,
}

#[derive(Deserialize, Default)]
struct StatusProperties {
    error: Option<StatusError>,
}

#[derive(Deserialize)]
struct StatusError {
    message: String,
}

#[derive(Deserialize)]
struct FilesResponse {
    values: Vec<FileEntry>,
}

#[derive(Deserialize)]
struct FileEntry {
    kind: String,
    links: FileLinks,
}

#[derive(Deserialize)]
struct FileLinks {
    #[serde(rename = "contentUrl")]
    content_url: String,
}

#[derive(Deserialize)]
struct ResultDocument {
    #[serde(rename = "recognizedPhrases", default)]
    recognized_phrases: Vec<RecognizedPhrase>,
}

#[derive(Deserialize)]
struct RecognizedPhrase {
    #[serde(rename = "offsetInTicks")]
    offset_in_ticks: i64,
    #[serde(rename = "durationInTicks")]
    duration_in_ticks: i64,
    #[serde(default)]
    locale: Option<String>,
    #[serde(rename = "nBest", default)]
    n_best: Vec<NBestEntry>,
}

#[derive(Deserialize)]
struct NBestEntry {
    display: String,
    confidence: f32,
}

fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / 10_000_000.0
}

pub struct SpeechClient {
    client: Client,
    base_url: String,
    subscription_key: String,
}

impl SpeechClient {
    pub fn new(base_url: impl Into<String>, subscription_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            subscription_key: subscription_key.into(),
        }
    }

    fn auth_header(&self) -> (&'static str, String) {
        ("Ocp-Apim-Subscription-Key", self.subscription_key.clone())
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
        let language_identification = candidate_locales.map(|mut locales| {
            locales.truncate(MAX_CANDIDATE_LOCALES);
            LanguageIdentification { candidate_locales: locales, mode: "Single" }
        });

        let body = CreateTranscriptionRequest {
            content_urls: vec![content_url.to_string()],
            locale: locale.to_string(),
            display_name: display_name.to_string(),
            properties: CreateTranscriptionProperties {
                word_level_timestamps_enabled: word_timestamps,
                display_form_word_level_timestamps_enabled: word_timestamps,
                diarization_enabled: diarization,
                punctuation_mode: "DictatedAndAutomatic",
                profanity_filter_mode: "None",
            },
            language_identification,
        };

        let (header, value) = self.auth_header();
        let url = format!("{}/speechtotext/v3.2/transcriptions", self.base_url);
        let resp = self.client.post(&url).header(header, value).json(&body).send().await?;

        if resp.status().as_u16() != 201 {
            let text = resp.text().await.unwrap_or_default();
            return Err(RemoteSpeechError::CreateFailed(text));
        }

        let parsed: CreateTranscriptionResponse = resp.json().await.map_err(|e| RemoteSpeechError::ParseError(e.to_string()))?;
        let remote_job_id = parsed
            .self_url
            .rsplit('/')
            .next()
            .unwrap_or(&parsed.self_url)
            .to_string();

        Ok(RemoteJobHandle {
            remote_job_id,
            status: parsed.status,
            created_at: parsed.created_date_time,
            locale: parsed.locale,
        })
    }

    pub async fn get_status(&self, remote_job_id: &str) -> Result<RemoteJobStatus, RemoteSpeechError> {
        let (header, value) = self.auth_header();
        let url = format!("{}/speechtotext/v3.2/transcriptions/{remote_job_id}", self.base_url);
        let resp = self.client.get(&url).header(header, value).send().await?;

        let parsed: StatusResponse = resp.json().await.map_err(|e| RemoteSpeechError::ParseError(e.to_string()))?;
        let state = match parsed.status.as_str() {
            "NotStarted" => RemoteJobState::NotStarted,
            "Running" => RemoteJobState::Running,
            "Succeeded" => RemoteJobState::Succeeded,
            "Failed" => RemoteJobState::Failed,
            other => {
                warn!("unrecognized remote job status '{other}', treating as Running");
                RemoteJobState::Running
            }
        };
        let error_message = parsed.properties.and_then(|p| p.error).map(|e| e.message);

        Ok(RemoteJobStatus { state, error_message })
    }

    pub async fn get_result(&self, remote_job_id: &str, fallback_locale: &str) -> Result<TranscriptionResult, RemoteSpeechError> {
        let (header, value) = self.auth_header();
        let files_url = format!("{}/speechtotext/v3.2/transcriptions/{remote_job_id}/files", self.base_url);
        let resp = self.client.get(&files_url).header(header.clone(), value.clone()).send().await?;
        let files: FilesResponse = resp.json().await.map_err(|e| RemoteSpeechError::ParseError(e.to_string()))?;

        let transcription_file = files
            .values
            .into_iter()
            .find(|f| f.kind == "Transcription")
            .ok_or_else(|| RemoteSpeechError::ParseError("no Transcription file in files list".to_string()))?;

        let content_resp = self.client.get(&transcription_file.links.content_url).send().await?;
        let document: ResultDocument = content_resp.json().await.map_err(|e| RemoteSpeechError::ParseError(e.to_string()))?;

        let mut language: Option<String> = None;
        let mut segments = Vec::new();

        for phrase in document.recognized_phrases {
            if language.is_none() {
                language = phrase.locale.clone();
            }
            let Some(best) = phrase.n_best.into_iter().max_by(|a, b| a.confidence.total_cmp(&b.confidence)) else {
                continue;
            };
            if best.display.trim().is_empty() {
                continue;
            }
            let start = ticks_to_seconds(phrase.offset_in_ticks);
            let end = ticks_to_seconds(phrase.offset_in_ticks + phrase.duration_in_ticks);
            match SubtitleSegment::new(start, end, best.display, best.confidence) {
                Ok(seg) => segments.push(seg),
                Err(e) => warn!("dropping malformed recognized phrase: {e}"),
            }
        }

        let language = language.unwrap_or_else(|| fallback_locale.to_string());
        Ok(TranscriptionResult::new(remote_job_id, language, segments))
    }

    /// Best-effort. `DeleteNotAllowed` (job still running) is treated as
    /// success — the batch speech API has no cancellation endpoint, so a
    /// still-running job is left to finish on its own.
    pub async fn delete_transcription(&self, remote_job_id: &str) -> bool {
        let (header, value) = self.auth_header();
        let url = format!("{}/speechtotext/v3.2/transcriptions/{remote_job_id}", self.base_url);
        match self.client.delete(&url).header(header, value).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) if resp.status().as_u16() == 400 => {
                let body = resp.text().await.unwrap_or_default();
                if body.contains("DeleteNotAllowed") {
                    true
                } else {
                    warn!("remote transcription delete returned 400: {body}");
                    false
                }
            }
            Ok(resp) => {
                warn!("remote transcription delete returned {}", resp.status());
                false
            }
            Err(e) => {
                warn!("remote transcription delete request failed: {e}");
                false
            }
        }
    }

    /// Polls `getStatus` until `Succeeded`/`Failed` or `timeout_sec` elapses.
    /// `should_cancel` is checked between polls so the orchestrator's
    /// cancellation contract can interrupt the wait.
    pub async fn wait_for_completion<F>(
        &self,
        remote_job_id: &str,
        fallback_locale: &str,
        poll_interval_sec: u64,
        timeout_sec: u64,
        mut should_cancel: F,
    ) -> Result<TranscriptionResult, RemoteSpeechError>
    where
        F: FnMut() -> bool,
    {
        let max_polls = (timeout_sec / poll_interval_sec.max(1)).max(1);
        let mut last_logged_state: Option<RemoteJobState> = None;
        let mut last_log_at = std::time::Instant::now();

        for poll in 0..max_polls {
            if should_cancel() {
                return Err(RemoteSpeechError::JobFailed("cancelled".to_string()));
            }

            let status = self.get_status(remote_job_id).await?;
            let changed = last_logged_state != Some(status.state);
            if changed || last_log_at.elapsed() >= Duration::from_secs(30) {
                tracing::info!("remote job {remote_job_id} status: {:?}", status.state);
                last_logged_state = Some(status.state);
                last_log_at = std::time::Instant::now();
            }

            match status.state {
                RemoteJobState::Succeeded => return self.get_result(remote_job_id, fallback_locale).await,
                RemoteJobState::Failed => {
                    return Err(RemoteSpeechError::JobFailed(
                        status.error_message.unwrap_or_else(|| "unknown remote failure".to_string()),
                    ));
                }
                RemoteJobState::NotStarted | RemoteJobState::Running => {
                    if poll + 1 < max_polls {
                        tokio::time::sleep(Duration::from_secs(poll_interval_sec)).await;
                    }
                }
            }
        }

        Err(RemoteSpeechError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_convert_at_100ns_resolution() {
        assert_eq!(ticks_to_seconds(20_000_000), 2.0);
        assert_eq!(ticks_to_seconds(0), 0.0);
    }
}
