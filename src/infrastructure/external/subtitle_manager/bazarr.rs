//! Bazarr client: `X-API-KEY` header auth, `GET /api/system/status` as a
//! connectivity probe, and a series/movie-by-path lookup with a
//! full-disk-scan fallback when the owning series/movie can't be
//! identified.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::interfaces::external_services::SubtitleManagerClient;
use crate::shared::error::AppError;

pub struct BazarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BazarrClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    #[serde(rename = "sonarrSeriesId")]
    sonarr_series_id: i64,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieEntry {
    #[serde(rename = "radarrId")]
    radarr_id: i64,
    path: Option<String>,
}

#[async_trait]
impl SubtitleManagerClient for BazarrClient {
    async fn test_connection(&self) -> Result<bool, AppError> {
        let url = self.url("/api/system/status");
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("bazarr status request failed: {e}")))?;
        Ok(resp.status().is_success())
    }

    async fn trigger_series_scan(&self, series_id: &str) -> Result<(), AppError> {
        let url = format!("{}?seriesid={}&action=scan-disk", self.url("/api/series"), series_id);
        let resp = self
            .client
            .patch(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("bazarr series scan request failed: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Internal(format!("bazarr series scan returned {}", resp.status())))
        }
    }

    async fn trigger_movie_scan(&self, movie_id: &str) -> Result<(), AppError> {
        let url = format!("{}?radarrid={}&action=scan-disk", self.url("/api/movies"), movie_id);
        let resp = self
            .client
            .patch(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("bazarr movie scan request failed: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Internal(format!("bazarr movie scan returned {}", resp.status())))
        }
    }

    /// No id scopes a full-disk scan to one series/movie, so this triggers
    /// both the series and movie whole-library rescan tasks.
    async fn trigger_full_scan(&self) -> Result<(), AppError> {
        for task_id in ["update_series", "update_movies"] {
            let url = format!("{}?taskid={task_id}", self.url("/api/system/tasks"));
            let resp = self
                .client
                .post(&url)
                .header("X-API-KEY", &self.api_key)
                .send()
                .await
                .map_err(|e| AppError::Internal(format!("bazarr full scan request failed: {e}")))?;

            if !resp.status().is_success() {
                return Err(AppError::Internal(format!("bazarr full scan ({task_id}) returned {}", resp.status())));
            }
        }
        Ok(())
    }

    async fn lookup_series_by_path(&self, file_path: &str) -> Result<Option<String>, AppError> {
        let url = self.url("/api/series");
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("bazarr series list request failed: {e}")))?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let series: Vec<SeriesEntry> = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse bazarr series list: {e}")))?;

        Ok(series
            .into_iter()
            .find(|s| s.path.as_deref().is_some_and(|p| file_path.starts_with(p)))
            .map(|s| s.sonarr_series_id.to_string()))
    }

    async fn lookup_movie_by_path(&self, file_path: &str) -> Result<Option<String>, AppError> {
        let url = self.url("/api/movies");
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("bazarr movie list request failed: {e}")))?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let movies: Vec<MovieEntry> = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse bazarr movie list: {e}")))?;

        Ok(movies
            .into_iter()
            .find(|m| m.path.as_deref().is_some_and(|p| file_path.starts_with(p)))
            .map(|m| m.radarr_id.to_string()))
    }
}
