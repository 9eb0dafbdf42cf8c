//! HTTP presentation layer: handlers, middleware, shared state, and the
//! route table.

pub mod handlers;
pub mod middleware;
pub mod state;

use axum::routing::{delete, get, post};
use axum::Router;

use handlers::{asr_handlers, batch_handlers, health_handlers, webhook_handlers};
use middleware::{cors_layer, logging_middleware};
pub use state::AppState;

/// Builds the full route table over `state`, grouped by surface: health,
/// webhooks, ASR protocol, batch API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handlers::health_check))
        .route("/webhook/plex", post(webhook_handlers::plex_webhook))
        .route("/webhook/jellyfin", post(webhook_handlers::jellyfin_webhook))
        .route("/webhook/emby", post(webhook_handlers::emby_webhook))
        .route("/webhook/tautulli", post(webhook_handlers::tautulli_webhook))
        .route("/", get(asr_handlers::root))
        .route("/asr", get(asr_handlers::asr_get_guard).post(asr_handlers::transcribe))
        .route("/detect-language", get(asr_handlers::detect_language_get_guard).post(asr_handlers::detect_language))
        .route("//detect-language", post(asr_handlers::detect_language))
        .route("/status", get(asr_handlers::status))
        .route("/api/batch/submit", post(batch_handlers::submit))
        .route("/api/batch/sessions", get(batch_handlers::list_sessions))
        .route("/api/batch/session/:session_id", get(batch_handlers::get_session).delete(batch_handlers::delete_session))
        .route("/api/batch/session/:session_id/cancel", post(batch_handlers::cancel_session))
        .route("/api/batch/job/:session_id/:job_id", get(batch_handlers::get_job))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .with_state(state)
}
