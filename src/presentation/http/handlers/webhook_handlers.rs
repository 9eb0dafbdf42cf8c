//! Webhook Handlers
//!
//! HTTP handlers for the four media-server webhook receivers. Each parses
//! its vendor's payload shape, applies the configured add/play trigger
//! gate and path mapping, then hands the resolved path to the orchestrator
//! in the background, guarded against duplicate submission by
//! `WebhookGuard`.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap};
use axum::body::Bytes;
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::application::use_cases::{TranscribeFileRequest, TranscribeFileUseCase};
use crate::config::Config;
use crate::domain::entities::{JobSource, JobStatus};
use crate::infrastructure::jobs::{WebhookGuard, WebhookGuardHandle};

fn resolve_path(config: &Config, raw: &str) -> String {
    match &config.path_mapping {
        Some(mapping) => mapping.apply(raw),
        None => raw.to_string(),
    }
}

fn spawn_transcription(transcribe: Arc<TranscribeFileUseCase>, guard_handle: WebhookGuardHandle, file_path: String, language: String) {
    tokio::spawn(async move {
        let _guard_handle = guard_handle;
        let req = TranscribeFileRequest::new(file_path, language, JobSource::Webhook);
        let (_, job) = transcribe.execute(req).await;
        match job.status {
            JobStatus::Completed => info!("webhook transcription completed for {}", job.file_path),
            JobStatus::Failed => warn!("webhook transcription failed for {}: {:?}", job.file_path, job.error),
            _ => {}
        }
    });
}

/// Starts a transcription for `file_path` unless one is already in flight
/// for the same path. Returns whether a new job was actually started.
fn try_start(
    guard: &WebhookGuard,
    transcribe: &Arc<TranscribeFileUseCase>,
    file_path: &str,
    language: &str,
) -> bool {
    match WebhookGuardHandle::acquire(guard.clone(), file_path) {
        Some(handle) => {
            spawn_transcription(transcribe.clone(), handle, file_path.to_string(), language.to_string());
            true
        }
        None => {
            info!("transcription already in progress for: {file_path}");
            false
        }
    }
}

/// POST /webhook/plex
///
/// Plex sends `Metadata.Media[].Part[].file` inside a multipart `payload`
/// field. We act on `library.new` and, if configured, `media.play`.
pub async fn plex_webhook(
    State(config): State<Arc<Config>>,
    State(guard): State<WebhookGuard>,
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut payload_str = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("payload") {
            payload_str = field.text().await.unwrap_or_default();
            break;
        }
    }

    let payload: Value = serde_json::from_str(&payload_str).unwrap_or(Value::Null);
    let event = payload.get("event").and_then(Value::as_str).unwrap_or("");
    info!("plex webhook event: {event}");

    let should_process = match event {
        "library.new" => config.process_added_media,
        "media.play" => config.process_media_on_play,
        _ => false,
    };
    if !should_process {
        return Json(json!({"status": "ignored", "event": event}));
    }

    let Some(media_list) = payload.pointer("/Metadata/Media").and_then(Value::as_array) else {
        return Json(json!({"status": "no_media"}));
    };

    let mut started_any = false;
    for media in media_list {
        let Some(parts) = media.get("Part").and_then(Value::as_array) else { continue };
        for part in parts {
            let Some(file) = part.get("file").and_then(Value::as_str) else { continue };
            let file_path = resolve_path(&config, file);
            if !Path::new(&file_path).exists() {
                continue;
            }
            if try_start(&guard, &transcribe, &file_path, &config.default_subtitle_language) {
                started_any = true;
            }
        }
    }

    Json(json!({"status": if started_any { "processing" } else { "no_files" }}))
}

/// POST /webhook/jellyfin
pub async fn jellyfin_webhook(
    State(config): State<Arc<Config>>,
    State(guard): State<WebhookGuard>,
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let event_type = payload
        .get("NotificationType")
        .or_else(|| payload.get("EventType"))
        .and_then(Value::as_str)
        .unwrap_or("");
    info!("jellyfin webhook event: {event_type}");

    let should_process = match event_type {
        "ItemAdded" => config.process_added_media,
        "PlaybackStart" => config.process_media_on_play,
        _ => false,
    };
    if !should_process {
        return Json(json!({"status": "ignored", "event": event_type}));
    }

    let file = payload
        .get("Path")
        .or_else(|| payload.pointer("/Item/Path"))
        .and_then(Value::as_str);
    let Some(file) = file else {
        return Json(json!({"status": "no_path"}));
    };

    let file_path = resolve_path(&config, file);
    if !Path::new(&file_path).exists() {
        warn!("file not found: {file_path}");
        return Json(json!({"status": "file_not_found"}));
    }

    let started = try_start(&guard, &transcribe, &file_path, &config.default_subtitle_language);
    Json(json!({"status": if started { "processing" } else { "already_processing" }}))
}

/// POST /webhook/emby
pub async fn emby_webhook(
    State(config): State<Arc<Config>>,
    State(guard): State<WebhookGuard>,
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let event_type = payload.get("Event").and_then(Value::as_str).unwrap_or("");
    info!("emby webhook event: {event_type}");

    let should_process = match event_type {
        "library.new" => config.process_added_media,
        "playback.start" => config.process_media_on_play,
        _ => false,
    };
    if !should_process {
        return Json(json!({"status": "ignored", "event": event_type}));
    }

    let file = payload.pointer("/Item/Path").and_then(Value::as_str);
    let Some(file) = file else {
        return Json(json!({"status": "no_path"}));
    };

    let file_path = resolve_path(&config, file);
    if !Path::new(&file_path).exists() {
        warn!("file not found: {file_path}");
        return Json(json!({"status": "file_not_found"}));
    }

    let started = try_start(&guard, &transcribe, &file_path, &config.default_subtitle_language);
    Json(json!({"status": if started { "processing" } else { "already_processing" }}))
}

/// POST /webhook/tautulli
///
/// Tautulli is configured with a custom webhook body, either
/// `application/x-www-form-urlencoded` (`file=...&media_type=...`) or raw
/// JSON. Both are accepted since Tautulli's script-webhook format varies
/// by how the user has set it up.
pub async fn tautulli_webhook(
    State(config): State<Arc<Config>>,
    State(guard): State<WebhookGuard>,
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    let body_str = String::from_utf8_lossy(&body);

    let file_path = if content_type.contains("json") {
        serde_json::from_str::<Value>(&body_str)
            .ok()
            .and_then(|v| v.get("file").and_then(Value::as_str).map(str::to_string))
    } else {
        parse_form_field(&body_str, "file")
    };

    let Some(file_path) = file_path.filter(|p| !p.is_empty()) else {
        return Json(json!({"status": "no_file"}));
    };
    info!("tautulli webhook for: {file_path}");

    if !Path::new(&file_path).exists() {
        warn!("file not found: {file_path}");
        return Json(json!({"status": "file_not_found"}));
    }

    let started = try_start(&guard, &transcribe, &file_path, &config.default_subtitle_language);
    Json(json!({"status": if started { "processing" } else { "already_processing" }}))
}

fn parse_form_field(body: &str, key: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k != key {
            return None;
        }
        let space_restored = v.replace('+', " ");
        urlencoding::decode(&space_restored).ok().map(|s| s.into_owned())
    })
}
