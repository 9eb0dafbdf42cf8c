//! ASR Protocol Handlers
//!
//! A Whisper-ASR-webservice-compatible surface, so that Bazarr's built-in
//! "Whisper provider" can point at this daemon without modification: the
//! same four routes, the same query parameters, and the same one-element
//! JSON-array error body for a misdirected `GET` on a `POST`-only route.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::application::use_cases::{DetectLanguageUseCase, TranscribeFileUseCase};
use crate::config::Config;
use crate::domain::entities::JobSource;
use crate::domain::value_objects::SubtitleSegment;
use crate::infrastructure::subtitle::srt;
use crate::shared::error::AppError;

const GET_NOT_ALLOWED: &str = "Method Not Allowed Did you mean to use POST?";

/// GET /
pub async fn root(State(config): State<Arc<Config>>) -> String {
    format!("{} ASR webservice", config.product_name)
}

/// GET /asr — a browser hitting this directly means it's misconfigured
/// as a `GET` endpoint; point it at a one-element error array instead of
/// a generic 405.
pub async fn asr_get_guard() -> impl IntoResponse {
    (StatusCode::OK, Json(json!([GET_NOT_ALLOWED])))
}

/// GET /detect-language — same guard as `asr_get_guard`.
pub async fn detect_language_get_guard() -> impl IntoResponse {
    (StatusCode::OK, Json(json!([GET_NOT_ALLOWED])))
}

/// GET /status
pub async fn status(State(config): State<Arc<Config>>) -> Json<serde_json::Value> {
    Json(json!({"version": config.product_name}))
}

#[derive(Debug, Deserialize)]
pub struct AsrQuery {
    #[serde(default = "default_task")]
    pub task: String,
    pub language: Option<String>,
    #[allow(dead_code)]
    pub video_file: Option<String>,
    #[serde(default = "default_true")]
    pub encode: bool,
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_task() -> String {
    "transcribe".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output() -> String {
    "srt".to_string()
}

/// POST /asr
///
/// Accepts a multipart `audio_file` field plus the query parameters above,
/// runs the same pipeline the file-path flows use, and renders the result
/// in whichever subtitle format `output` names. `task=translate` is not
/// distinguished from `transcribe` here: the remote service always
/// transcribes in the source language, same as the file-path flows.
pub async fn transcribe(
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    State(config): State<Arc<Config>>,
    Query(query): Query<AsrQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut file_name = "audio_file".to_string();
    let mut bytes = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("audio_file") {
            if let Some(name) = field.file_name() {
                file_name = name.to_string();
            }
            bytes = field.bytes().await.ok();
            break;
        }
    }

    let Some(bytes) = bytes else {
        return Err((StatusCode::BAD_REQUEST, "missing audio_file field".to_string()));
    };

    let language = query.language.clone().unwrap_or_else(|| "en".to_string());
    let is_raw_pcm = !query.encode;

    let result = transcribe
        .transcribe_audio_bytes(&bytes, &language, JobSource::Asr, &file_name, is_raw_pcm)
        .await
        .map_err(app_error_response)?;

    let (content_type, body) = render_output(&query.output, &result.segments);
    let mut headers = HeaderMap::new();
    headers.insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let source = format!("Transcribed using {}", config.product_name);
    headers.insert(
        "Source",
        HeaderValue::from_str(&source).unwrap_or_else(|_| HeaderValue::from_static("Transcribed using SubGen")),
    );

    Ok((StatusCode::OK, headers, body))
}

#[derive(Debug, Deserialize)]
pub struct DetectLanguageQuery {
    #[serde(default = "default_true")]
    pub encode: bool,
}

/// POST /detect-language and POST //detect-language
///
/// Registered at both paths: some Bazarr releases call the doubled-slash
/// form, a quirk of how the upstream client builds its request URL.
pub async fn detect_language(
    State(detect): State<Arc<DetectLanguageUseCase>>,
    Query(query): Query<DetectLanguageQuery>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let mut bytes = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("audio_file") {
            bytes = field.bytes().await.ok();
            break;
        }
    }
    let Some(bytes) = bytes else {
        return Err((StatusCode::BAD_REQUEST, "missing audio_file field".to_string()));
    };

    let is_raw_pcm = !query.encode;
    let result = detect.detect_from_bytes(&bytes, is_raw_pcm).await.map_err(app_error_response)?;

    Ok(Json(json!({
        "detected_language": result.detected_language,
        "language_code": result.language_code,
    })))
}

fn app_error_response(err: AppError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn render_output(output: &str, segments: &[SubtitleSegment]) -> (&'static str, String) {
    match output {
        "vtt" => ("text/vtt", emit_vtt(segments)),
        "txt" => ("text/plain", emit_txt(segments)),
        // json/tsv are not meaningfully different from srt for this
        // protocol's clients (Bazarr only ever requests srt/vtt); fall
        // back to srt for any format not specifically handled above.
        _ => ("text/plain", srt::emit(segments)),
    }
}

fn emit_txt(segments: &[SubtitleSegment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ")
}

fn emit_vtt(segments: &[SubtitleSegment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(segment.start_seconds),
            format_timestamp(segment.end_seconds),
            segment.text
        ));
    }
    out
}

fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let m = (total_sec / 60) % 60;
    let h = total_sec / 3600;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vtt_timestamp_formatting_matches_webvtt() {
        assert_eq!(format_timestamp(3661.25), "01:01:01.250");
    }

    #[test]
    fn txt_output_joins_segment_text() {
        let segments = vec![
            SubtitleSegment { start_seconds: 0.0, end_seconds: 1.0, text: "hello".to_string(), confidence: 1.0 },
            SubtitleSegment { start_seconds: 1.0, end_seconds: 2.0, text: "world".to_string(), confidence: 1.0 },
        ];
        assert_eq!(emit_txt(&segments), "hello world");
    }
}
