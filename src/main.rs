//! Process entry point: loads configuration, wires every adapter and use
//! case behind `AppState`, and serves the HTTP surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use subgend::application::services::PriorityGate;
use subgend::application::use_cases::{BatchIngressUseCase, CancelSessionUseCase, DetectLanguageUseCase, TranscribeFileUseCase};
use subgend::config::Config;
use subgend::infrastructure::external::cloud_speech::{BlobClient, RemoteTranscriptionClient, SpeechClient};
use subgend::infrastructure::external::ffmpeg::{AudioStager, FfprobeAdapter};
use subgend::infrastructure::external::media_server::{JellyfinClient, PlexClient};
use subgend::infrastructure::external::subtitle_manager::BazarrClient;
use subgend::infrastructure::jobs::{CancellationFlags, SessionStore, WebhookGuard};
use subgend::interfaces::external_services::{MediaServerClient, SubtitleManagerClient};
use subgend::interfaces::notifier::{self, HttpNotifier, NoopNotifier};
use subgend::presentation::http::{router, AppState};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const FFMPEG_TIMEOUT: Duration = Duration::from_secs(600);
const CREDIT_LINE_OFFSET_SECONDS: f64 = 5.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("subgend=info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(port = config.bind_port, "starting subgend");

    if let Some(webhook_url) = &config.notifier_webhook_url {
        notifier::init(Arc::new(HttpNotifier::new(webhook_url.clone())));
    } else {
        notifier::init(Arc::new(NoopNotifier));
    }

    let sessions = SessionStore::new();
    let webhook_guard = WebhookGuard::new();
    let gate = PriorityGate::new(config.concurrent_transcriptions);
    let cancellation = CancellationFlags::new();

    let inspector = Arc::new(FfprobeAdapter::new(PROBE_TIMEOUT));
    let transcode_dir = config.transcode_dir.as_ref().map(PathBuf::from);
    let stager = Arc::new(AudioStager::new(transcode_dir, FFMPEG_TIMEOUT));

    let speech_base_url = format!("https://{}.api.cognitive.microsoft.com", config.azure.speech_region);
    let blob = BlobClient::new(config.azure.storage_account_url.clone(), config.azure.storage_container.clone(), config.azure.storage_sas_token.clone());
    let speech = SpeechClient::new(speech_base_url, config.azure.speech_key.clone());
    let remote = Arc::new(RemoteTranscriptionClient::new(blob, speech));

    let mut media_servers: Vec<Arc<dyn MediaServerClient>> = Vec::new();
    if let Some(plex) = &config.plex {
        media_servers.push(Arc::new(PlexClient::new(plex.server.clone(), plex.token.clone())));
    }
    if let Some(jellyfin) = &config.jellyfin {
        media_servers.push(Arc::new(JellyfinClient::new(jellyfin.server.clone(), jellyfin.token.clone(), false)));
    }
    if let Some(emby) = &config.emby {
        media_servers.push(Arc::new(JellyfinClient::new(emby.server.clone(), emby.token.clone(), true)));
    }

    let subtitle_manager: Option<Arc<dyn SubtitleManagerClient>> =
        config.bazarr.as_ref().map(|bazarr| Arc::new(BazarrClient::new(bazarr.url.clone(), bazarr.api_key.clone())) as Arc<dyn SubtitleManagerClient>);

    let mut transcribe = TranscribeFileUseCase::new(
        sessions.clone(),
        gate.clone(),
        cancellation.clone(),
        inspector.clone(),
        stager.clone(),
        remote.clone(),
        media_servers,
        config.naming_config.clone(),
        config.product_name.clone(),
    )
    .with_lyric_for_audio(config.lrc_for_audio_files)
    .with_credit_line(config.credit_line_enabled, CREDIT_LINE_OFFSET_SECONDS)
    .with_polling(config.job_poll_interval_sec, config.job_timeout_sec);
    if let Some(subtitle_manager) = subtitle_manager {
        transcribe = transcribe.with_subtitle_manager(subtitle_manager);
    }
    let transcribe = Arc::new(transcribe);

    let batch_ingress = Arc::new(BatchIngressUseCase::new(sessions.clone(), inspector.clone(), config.skip_config.clone()));
    let detect_language = Arc::new(DetectLanguageUseCase::new(inspector.clone(), stager.clone(), remote.clone(), gate.clone()));
    let cancel_session = Arc::new(CancelSessionUseCase::new(sessions.clone(), cancellation.clone(), remote.clone()));

    let config = Arc::new(config);
    let state = AppState {
        transcribe,
        batch_ingress,
        detect_language,
        cancel_session,
        sessions: sessions.clone(),
        webhook_guard,
        config: config.clone(),
    };

    spawn_session_sweeper(sessions);

    let app = router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.bind_port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("subgend listening on {addr}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Periodically evicts sessions whose jobs are all terminal and stale,
/// so long-running deployments don't accumulate session history forever.
fn spawn_session_sweeper(sessions: SessionStore) {
    const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);
    const MAX_SESSION_AGE: chrono::Duration = chrono::Duration::hours(24);

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;
            sessions.cleanup_old_sessions(MAX_SESSION_AGE).await;
        }
    });
}
