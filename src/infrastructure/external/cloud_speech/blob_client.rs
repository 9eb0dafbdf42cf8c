//! Object storage client — uploads staged audio to a blob container and
//! issues a time-bounded read URL. Chunked multipart for large blobs,
//! exponential-backoff retry on transient errors.

use std::path::Path;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::shared::error::StorageError;

const CHUNK_THRESHOLD_BYTES: u64 = 64 * 1024 * 1024;
const CHUNK_SIZE_BYTES: usize = 4 * 1024 * 1024;
const MAX_PARALLEL_PARTS: usize = 4;
const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 2000;
const READ_URL_VALID_HOURS: i64 = 24;

pub struct BlobClient {
    client: Client,
    base_url: String,
    container: String,
    sas_token: String,
}

impl BlobClient {
    pub fn new(base_url: impl Into<String>, container: impl Into<String>, sas_token: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .timeout(Duration::from_secs(600))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            container: container.into(),
            sas_token: sas_token.into(),
        }
    }

    fn is_transient(status: reqwest::StatusCode) -> bool {
        status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn blob_url(&self, blob_name: &str) -> String {
        format!("{}/{}/{}?{}", self.base_url, self.container, blob_name, self.sas_token)
    }

    /// Creates the container if it doesn't already exist. Idempotent.
    async fn ensure_container(&self) -> Result<(), StorageError> {
        let url = format!("{}/{}?restype=container&{}", self.base_url, self.container, self.sas_token);
        let resp = self.client.put(&url).header("x-ms-blob-public-access", "").send().await?;
        if resp.status().is_success() || resp.status() == reqwest::StatusCode::CONFLICT {
            Ok(())
        } else if Self::is_transient(resp.status()) {
            Err(StorageError::Transient(format!("container create returned {}", resp.status())))
        } else {
            Err(StorageError::Fatal(format!("container create returned {}", resp.status())))
        }
    }

    async fn put_whole(&self, blob_name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let url = self.blob_url(blob_name);
        let resp = self
            .client
            .put(&url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(data)
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else if Self::is_transient(resp.status()) {
            Err(StorageError::Transient(format!("upload returned {}", resp.status())))
        } else {
            Err(StorageError::Fatal(format!("upload returned {}", resp.status())))
        }
    }

    async fn put_chunked(&self, blob_name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let chunks: Vec<&[u8]> = data.chunks(CHUNK_SIZE_BYTES).collect();
        let mut block_ids = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(MAX_PARALLEL_PARTS) {
            let mut futures = Vec::new();
            for (offset, chunk) in batch.iter().enumerate() {
                let block_id = format!("{:08}", block_ids.len() + offset);
                let url = format!(
                    "{}&comp=block&blockid={}",
                    self.blob_url(blob_name),
                    urlencoding::encode(&block_id)
                );
                let bytes = chunk.to_vec();
                futures.push(async move {
                    let resp = self.client.put(&url).body(bytes).send().await?;
                    if resp.status().is_success() {
                        Ok(block_id)
                    } else if Self::is_transient(resp.status()) {
                        Err(StorageError::Transient(format!("block upload returned {}", resp.status())))
                    } else {
                        Err(StorageError::Fatal(format!("block upload returned {}", resp.status())))
                    }
                });
            }
            for result in futures::future::join_all(futures).await {
                block_ids.push(result?);
            }
        }

        let block_list_xml = {
            let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?><BlockList>");
            for id in &block_ids {
                xml.push_str(&format!("<Latest>{id}</Latest>"));
            }
            xml.push_str("</BlockList>");
            xml
        };

        let url = format!("{}&comp=blocklist", self.blob_url(blob_name));
        let resp = self.client.put(&url).body(block_list_xml).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else if Self::is_transient(resp.status()) {
            Err(StorageError::Transient(format!("block list commit returned {}", resp.status())))
        } else {
            Err(StorageError::Fatal(format!("block list commit returned {}", resp.status())))
        }
    }

    async fn upload_with_retry(&self, blob_name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let mut attempt = 0;
        loop {
            let result = if data.len() as u64 > CHUNK_THRESHOLD_BYTES {
                self.put_chunked(blob_name, data.clone()).await
            } else {
                self.put_whole(blob_name, data.clone()).await
            };

            match result {
                Ok(()) => return Ok(()),
                Err(StorageError::Fatal(msg)) => return Err(StorageError::Fatal(msg)),
                Err(other) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(other);
                    }
                    let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                    warn!("blob upload attempt {attempt} failed ({other}), retrying in {delay}ms");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }

    /// Uploads `path` and returns `(readableUrl, blobName)`.
    pub async fn upload_audio(&self, path: &Path) -> Result<(String, String), StorageError> {
        self.ensure_container().await?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("ogg");
        let blob_name = format!("audio/{}.{ext}", Uuid::new_v4());

        let data = fs::read(path).await?;
        self.upload_with_retry(&blob_name, data).await?;

        let expiry = Utc::now() + ChronoDuration::hours(READ_URL_VALID_HOURS);
        let readable_url = format!("{}&se={}", self.blob_url(&blob_name), expiry.to_rfc3339());
        Ok((readable_url, blob_name))
    }

    /// Best-effort delete; never raises. A missing blob is a no-op that
    /// reports `false`, not success.
    pub async fn delete_blob(&self, blob_name: &str) -> bool {
        let url = self.blob_url(blob_name);
        match self.client.delete(&url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::NOT_FOUND => false,
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("blob delete request failed for {blob_name}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_name_is_namespaced_and_uuid_based() {
        let client = BlobClient::new("https://example.blob.core.windows.net", "audio", "sv=token");
        let url = client.blob_url("audio/abc.ogg");
        assert!(url.contains("/audio/audio/abc.ogg"));
        assert!(url.contains("sv=token"));
    }

    #[test]
    fn is_transient_covers_server_errors_and_throttling() {
        assert!(BlobClient::is_transient(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        assert!(BlobClient::is_transient(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(!BlobClient::is_transient(reqwest::StatusCode::BAD_REQUEST));
    }
}
