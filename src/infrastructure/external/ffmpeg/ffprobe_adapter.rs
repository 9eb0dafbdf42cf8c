//! Media Inspector — wraps the `ffprobe` command-line tool: child process,
//! captured stderr on non-zero exit, typed timeout. Inspection failures
//! are treated as non-fatal throughout — every public method returns an
//! empty/zero result rather than propagating.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::domain::value_objects::{normalize_language_tag, AudioTrack, InternalSubtitleStream};
use crate::shared::error::ProbeError;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    codec_name: String,
    #[serde(default)]
    channels: Option<u32>,
    #[serde(default)]
    disposition: Option<FfprobeDisposition>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
}

#[derive(Debug, Deserialize, Default)]
struct FfprobeDisposition {
    #[serde(default)]
    default: i32,
}

#[derive(Debug, Deserialize, Default)]
struct FfprobeTags {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

pub struct FfprobeAdapter {
    timeout: Duration,
}

impl FfprobeAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs `ffprobe` and parses its JSON output. The typed `ProbeError` is
    /// always absorbed by the public methods below into an empty/zero
    /// result — probe failures are non-fatal per spec §7 — but it carries
    /// the failure reason to the `warn!` call site rather than discarding
    /// it at an `Option`.
    async fn run(&self, path: &Path) -> Result<FfprobeOutput, ProbeError> {
        let Some(path_str) = path.to_str() else {
            return Err(ProbeError::NonZeroExit("non-UTF-8 path".to_string()));
        };
        let args = ["-v", "error", "-print_format", "json", "-show_format", "-show_streams", path_str];

        let result = timeout(self.timeout, Command::new("ffprobe").args(args).output()).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ProbeError::Io(e)),
            Err(_) => return Err(ProbeError::NonZeroExit("timed out".to_string())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ProbeError::NonZeroExit(stderr));
        }

        serde_json::from_slice::<FfprobeOutput>(&output.stdout).map_err(|e| ProbeError::ParseError(e.to_string()))
    }

    /// Audio streams, indexed 0..n-1 among audio streams only.
    pub async fn audio_tracks(&self, path: &Path) -> Vec<AudioTrack> {
        let probe = match self.run(path).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("ffprobe failed for {}: {e}", path.display());
                return Vec::new();
            }
        };

        probe
            .streams
            .iter()
            .filter(|s| s.codec_type == "audio")
            .enumerate()
            .map(|(index, s)| AudioTrack {
                index,
                codec: s.codec_name.clone(),
                channels: s.channels.unwrap_or(0),
                language_tag: s
                    .tags
                    .as_ref()
                    .and_then(|t| t.language.as_deref())
                    .and_then(normalize_language_tag),
                title: s.tags.as_ref().and_then(|t| t.title.clone()),
                is_default: s.disposition.as_ref().map(|d| d.default != 0).unwrap_or(false),
            })
            .collect()
    }

    /// Subtitle streams embedded in the container.
    pub async fn subtitle_streams(&self, path: &Path) -> Vec<InternalSubtitleStream> {
        let probe = match self.run(path).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("ffprobe failed for {}: {e}", path.display());
                return Vec::new();
            }
        };

        probe
            .streams
            .iter()
            .filter(|s| s.codec_type == "subtitle")
            .map(|s| InternalSubtitleStream {
                codec: s.codec_name.clone(),
                language_tag: s
                    .tags
                    .as_ref()
                    .and_then(|t| t.language.as_deref())
                    .and_then(normalize_language_tag),
                title: s.tags.as_ref().and_then(|t| t.title.clone()),
            })
            .collect()
    }

    /// Duration in seconds, or 0.0 on any probing failure.
    pub async fn duration_seconds(&self, path: &Path) -> f64 {
        let probe = match self.run(path).await {
            Ok(probe) => probe,
            Err(e) => {
                warn!("ffprobe failed for {}: {e}", path.display());
                return 0.0;
            }
        };
        probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

impl Default for FfprobeAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_language_tags_normalize_through_the_same_helper() {
        assert_eq!(normalize_language_tag("und"), None);
        assert_eq!(normalize_language_tag("EN"), Some("en".to_string()));
    }

    #[tokio::test]
    async fn missing_binary_path_yields_empty_results_not_a_panic() {
        let adapter = FfprobeAdapter::new(Duration::from_millis(50));
        let tracks = adapter.audio_tracks(Path::new("/nonexistent/media.mkv")).await;
        assert!(tracks.is_empty());
        let duration = adapter.duration_seconds(Path::new("/nonexistent/media.mkv")).await;
        assert_eq!(duration, 0.0);
    }
}
