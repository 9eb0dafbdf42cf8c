//! Batch API Handlers
//!
//! HTTP handlers for bulk submission and session management.
//!
//! `BatchIngressUseCase::execute` only queues jobs as `Pending` — it does
//! not dispatch them. `submit` closes that gap itself: once ingress
//! returns a session of queued jobs, it spawns `TranscribeFileUseCase`
//! against each one, passing the already-assigned `session_id`/`job_id`
//! so the orchestrator updates the existing job in place instead of
//! minting a new one.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::application::use_cases::{
    BatchIngressRequest, BatchIngressUseCase, CancelSessionUseCase, TranscribeFileRequest, TranscribeFileUseCase,
};
use crate::infrastructure::jobs::SessionStore;
use crate::shared::error::JobError;

#[derive(Debug, Deserialize)]
pub struct BatchSubmitRequest {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub folders: Vec<String>,
    pub language: String,
    #[serde(default)]
    pub notify_bazarr: bool,
    /// Both aliases must be true for skip-config application to kick in;
    /// treated as synonymous rather than independently meaningful.
    #[serde(default)]
    pub skip_if_exists: bool,
    #[serde(default)]
    pub apply_skip_config: bool,
}

/// POST /api/batch/submit
pub async fn submit(
    State(batch_ingress): State<Arc<BatchIngressUseCase>>,
    State(transcribe): State<Arc<TranscribeFileUseCase>>,
    State(sessions): State<SessionStore>,
    Json(body): Json<BatchSubmitRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let apply_skip_config = body.skip_if_exists && body.apply_skip_config;

    let request = BatchIngressRequest {
        files: body.files,
        folders: body.folders,
        language: body.language,
        notify_downstream: body.notify_bazarr,
        apply_skip_config,
    };

    let result = batch_ingress.execute(request).await.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let session_id = result.session_id.clone();
    let session = sessions
        .get_session(&session_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    for job in session.jobs_in_order() {
        let transcribe = transcribe.clone();
        let mut req = TranscribeFileRequest::new(job.file_path.clone(), job.requested_language.clone(), job.source);
        req.session_id = Some(session_id.clone());
        req.job_id = Some(job.job_id.clone());
        tokio::spawn(async move {
            transcribe.execute(req).await;
        });
    }

    Ok(Json(json!({
        "session_id": result.session_id,
        "job_count": result.job_count,
        "queued": result.queued,
        "skipped": result.skipped,
    })))
}

/// GET /api/batch/session/:session_id
pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(session_id): Path<String>,
) -> Result<Json<crate::domain::entities::Session>, (StatusCode, String)> {
    sessions.get_session(&session_id).await.map(Json).map_err(job_error_response)
}

/// GET /api/batch/job/:session_id/:job_id
pub async fn get_job(
    State(sessions): State<SessionStore>,
    Path((session_id, job_id)): Path<(String, String)>,
) -> Result<Json<crate::domain::entities::Job>, (StatusCode, String)> {
    sessions.get_job(&session_id, &job_id).await.map(Json).map_err(job_error_response)
}

/// GET /api/batch/sessions
pub async fn list_sessions(State(sessions): State<SessionStore>) -> Json<Vec<crate::domain::entities::Session>> {
    Json(sessions.list_sessions().await)
}

/// POST /api/batch/session/:session_id/cancel
pub async fn cancel_session(
    State(cancel_session): State<Arc<CancelSessionUseCase>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = cancel_session.execute(&session_id).await.map_err(job_error_response)?;
    Ok(Json(json!({
        "cancelled": result.cancelled,
        "cleaned_blobs": result.cleaned_blobs,
        "errors": result.errors,
    })))
}

/// DELETE /api/batch/session/:session_id
pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    sessions.delete_session(&session_id).await.map_err(job_error_response)?;
    Ok(Json(json!({"status": "deleted"})))
}

fn job_error_response(err: JobError) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, err.to_string())
}
