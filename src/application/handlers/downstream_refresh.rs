//! Downstream indexer fan-out, run after a subtitle is written to disk.
//!
//! Every configured media-server client is refreshed concurrently; each
//! client's success/failure is recorded independently so one indexer being
//! down never blocks or fails the others. If a subtitle-manager client is
//! also configured, it is notified afterward via a series/movie/full-scan
//! fallback chain, expressed generically over the trait rather than any
//! one vendor.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::interfaces::external_services::{MediaServerClient, SubtitleManagerClient};

/// Refreshes `file_path` against every configured client, returning a
/// `clientName -> succeeded` map for `Job::media_refresh_status`.
pub async fn refresh_all(clients: &[Arc<dyn MediaServerClient>], file_path: &str) -> HashMap<String, bool> {
    let results = join_all(clients.iter().map(|client| async move {
        let ok = client.refresh_by_file_path(file_path).await.is_ok();
        (client.name().to_string(), ok)
    }))
    .await;

    results.into_iter().collect()
}

/// Notifies the subtitle manager of a newly written subtitle: series
/// lookup, then movie lookup, then an unscoped full-disk scan if neither
/// owns the path. Best-effort; failures are logged, not propagated, so a
/// subtitle-manager outage never fails the job it rode in on.
pub async fn notify_subtitle_manager(client: &dyn SubtitleManagerClient, file_path: &str) -> bool {
    let result = async {
        if let Some(series_id) = client.lookup_series_by_path(file_path).await? {
            return client.trigger_series_scan(&series_id).await;
        }
        if let Some(movie_id) = client.lookup_movie_by_path(file_path).await? {
            return client.trigger_movie_scan(&movie_id).await;
        }
        client.trigger_full_scan().await
    }
    .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("subtitle manager notification failed for {file_path}: {e}");
            false
        }
    }
}
