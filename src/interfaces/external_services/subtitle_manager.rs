//! Subtitle-manager downstream capability — a distinct capability set from
//! `MediaServerClient`, since this integration indexes subtitles rather
//! than media items.

use async_trait::async_trait;

use crate::shared::error::AppError;

#[async_trait]
pub trait SubtitleManagerClient: Send + Sync {
    async fn test_connection(&self) -> Result<bool, AppError>;
    async fn trigger_series_scan(&self, series_id: &str) -> Result<(), AppError>;
    async fn trigger_movie_scan(&self, movie_id: &str) -> Result<(), AppError>;
    async fn trigger_full_scan(&self) -> Result<(), AppError>;
    async fn lookup_series_by_path(&self, file_path: &str) -> Result<Option<String>, AppError>;
    async fn lookup_movie_by_path(&self, file_path: &str) -> Result<Option<String>, AppError>;
}
