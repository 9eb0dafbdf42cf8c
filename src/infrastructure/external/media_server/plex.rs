//! Plex client — talks to the Plex Media Server HTTP API directly via
//! `reqwest`, matching the hand-rolled-client idiom the rest of the
//! external adapters use: `X-Plex-Token` header auth, `PUT
//! /library/metadata/{id}/refresh` for a targeted refresh, and a
//! library-sections scan keyed by path prefix when only a file path (not
//! an item id) is known.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::interfaces::external_services::MediaServerClient;
use crate::shared::error::AppError;

pub struct PlexClient {
    client: Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build().unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(rename = "MediaContainer")]
    media_container: MetadataContainer,
}

#[derive(Debug, Deserialize)]
struct MetadataContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataEntry {
    #[serde(rename = "Media", default)]
    media: Vec<MediaEntry>,
}

#[derive(Debug, Deserialize)]
struct MediaEntry {
    #[serde(rename = "Part", default)]
    part: Vec<PartEntry>,
}

#[derive(Debug, Deserialize)]
struct PartEntry {
    file: String,
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    #[serde(rename = "MediaContainer")]
    media_container: SectionsContainer,
}

#[derive(Debug, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<SectionEntry>,
}

#[derive(Debug, Deserialize)]
struct SectionEntry {
    key: String,
    #[serde(rename = "Location", default)]
    location: Vec<LocationEntry>,
}

#[derive(Debug, Deserialize)]
struct LocationEntry {
    path: String,
}

#[async_trait]
impl MediaServerClient for PlexClient {
    fn name(&self) -> &str {
        "plex"
    }

    async fn refresh_by_item_id(&self, item_id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/library/metadata/{item_id}/refresh"));
        let resp = self
            .client
            .put(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("plex refresh request failed: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Internal(format!("plex refresh returned {}", resp.status())))
        }
    }

    async fn get_file_path(&self, item_id: &str) -> Result<Option<String>, AppError> {
        let url = self.url(&format!("/library/metadata/{item_id}"));
        let resp = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("plex metadata request failed: {e}")))?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let parsed: MetadataResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse plex metadata: {e}")))?;

        Ok(parsed
            .media_container
            .metadata
            .into_iter()
            .next()
            .and_then(|m| m.media.into_iter().next())
            .and_then(|m| m.part.into_iter().next())
            .map(|p| p.file))
    }

    /// Finds the library section whose own location prefixes `file_path`,
    /// then asks Plex to rescan that section's parent directory. There is
    /// no item-id lookup by path in the Plex API, so this is the closest
    /// targeted refresh available.
    async fn refresh_by_file_path(&self, file_path: &str) -> Result<(), AppError> {
        let url = self.url("/library/sections");
        let resp = self
            .client
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("plex sections request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Internal(format!("plex sections returned {}", resp.status())));
        }

        let parsed: SectionsResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("failed to parse plex sections: {e}")))?;

        let section = parsed
            .media_container
            .directory
            .into_iter()
            .find(|s| s.location.iter().any(|l| file_path.starts_with(&l.path)));

        let Some(section) = section else {
            warn!("no plex library section matches path {file_path}");
            return Err(AppError::Internal(format!("no plex library section matches {file_path}")));
        };

        let parent = std::path::Path::new(file_path).parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();

        let refresh_url = format!(
            "{}?path={}",
            self.url(&format!("/library/sections/{}/refresh", section.key)),
            urlencoding::encode(&parent)
        );
        let resp = self
            .client
            .get(&refresh_url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("plex section refresh request failed: {e}")))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Internal(format!("plex section refresh returned {}", resp.status())))
        }
    }
}
