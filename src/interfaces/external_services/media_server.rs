//! Downstream media-server capability.
//!
//! Plex, Jellyfin, and Emby share one capability set. Each concrete media
//! server implements this single trait; the orchestrator's refresh
//! fan-out is written entirely against it and never knows which vendor
//! it's talking to.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Capability set shared by Plex, Jellyfin, and Emby.
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    fn name(&self) -> &str;

    /// Triggers a metadata refresh for a library item already indexed by
    /// this server.
    async fn refresh_by_item_id(&self, item_id: &str) -> Result<(), AppError>;

    /// Resolves `file_path` to a library item and refreshes it.
    async fn refresh_by_file_path(&self, file_path: &str) -> Result<(), AppError>;

    /// Resolves an already-indexed item id to its on-disk file path.
    async fn get_file_path(&self, item_id: &str) -> Result<Option<String>, AppError>;
}
