//! Shared Axum application state: one small struct of `Arc`-wrapped use
//! cases and stores, with a `FromRef` impl per field so handlers can
//! extract exactly the dependency they need instead of the whole state.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::use_cases::{BatchIngressUseCase, CancelSessionUseCase, DetectLanguageUseCase, TranscribeFileUseCase};
use crate::config::Config;
use crate::infrastructure::jobs::{SessionStore, WebhookGuard};

#[derive(Clone)]
pub struct AppState {
    pub transcribe: Arc<TranscribeFileUseCase>,
    pub batch_ingress: Arc<BatchIngressUseCase>,
    pub detect_language: Arc<DetectLanguageUseCase>,
    pub cancel_session: Arc<CancelSessionUseCase>,
    pub sessions: SessionStore,
    pub webhook_guard: WebhookGuard,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for Arc<TranscribeFileUseCase> {
    fn from_ref(state: &AppState) -> Self {
        state.transcribe.clone()
    }
}

impl FromRef<AppState> for Arc<BatchIngressUseCase> {
    fn from_ref(state: &AppState) -> Self {
        state.batch_ingress.clone()
    }
}

impl FromRef<AppState> for Arc<DetectLanguageUseCase> {
    fn from_ref(state: &AppState) -> Self {
        state.detect_language.clone()
    }
}

impl FromRef<AppState> for Arc<CancelSessionUseCase> {
    fn from_ref(state: &AppState) -> Self {
        state.cancel_session.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for WebhookGuard {
    fn from_ref(state: &AppState) -> Self {
        state.webhook_guard.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
