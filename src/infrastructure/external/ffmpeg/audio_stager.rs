//! Audio Stager — extracts and transcodes audio via `ffmpeg` child
//! processes into scratch files ready for upload or language detection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::domain::value_objects::AudioTrack;
use crate::shared::error::ExtractionError;

/// Upload-bound codec: speech-quality compressed, 64 kbps mono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    OpusOgg,
    Wav,
}

impl AudioFormat {
    fn extension(self) -> &'static str {
        match self {
            AudioFormat::OpusOgg => "ogg",
            AudioFormat::Wav => "wav",
        }
    }
}

pub struct AudioStager {
    scratch_dir: Option<PathBuf>,
    timeout: Duration,
}

impl AudioStager {
    pub fn new(scratch_dir: Option<PathBuf>, timeout: Duration) -> Self {
        Self { scratch_dir, timeout }
    }

    fn scratch_path(&self, ext: &str) -> PathBuf {
        let filename = format!("subgen-{}.{ext}", Uuid::new_v4());
        match &self.scratch_dir {
            Some(dir) => dir.join(filename),
            None => std::env::temp_dir().join(filename),
        }
    }

    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), ExtractionError> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = timeout(self.timeout, Command::new("ffmpeg").args(&arg_refs).output()).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(ExtractionError::Io(e)),
            Err(_) => return Err(ExtractionError::Timeout),
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.lines().rev().take(10).collect::<Vec<_>>().into_iter().rev().collect::<Vec<_>>().join("\n");
            warn!("ffmpeg extraction failed: {tail}");
            Err(ExtractionError::Failed(tail))
        }
    }

    /// Extracts `track_index`'s audio into `format`, resampled as requested.
    /// Overwrites any existing output at the chosen path (each call targets
    /// a fresh UUID-named scratch file, so collisions don't occur in
    /// practice).
    pub async fn extract(
        &self,
        path: &Path,
        track_index: usize,
        format: AudioFormat,
        sample_rate: u32,
        mono: bool,
    ) -> Result<PathBuf, ExtractionError> {
        let out_path = self.scratch_path(format.extension());

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-map".to_string(),
            format!("0:a:{track_index}"),
            "-ar".to_string(),
            sample_rate.to_string(),
        ];
        if mono {
            args.push("-ac".to_string());
            args.push("1".to_string());
        }
        match format {
            AudioFormat::OpusOgg => {
                args.push("-c:a".to_string());
                args.push("libopus".to_string());
                args.push("-b:a".to_string());
                args.push("64k".to_string());
            }
            AudioFormat::Wav => {
                args.push("-c:a".to_string());
                args.push("pcm_s16le".to_string());
            }
        }
        args.push(out_path.to_string_lossy().to_string());

        self.run_ffmpeg(&args).await?;
        Ok(out_path)
    }

    /// Extracts a bounded window of audio (uncompressed PCM) for language
    /// detection.
    pub async fn extract_segment(&self, path: &Path, offset_sec: f64, duration_sec: f64) -> Result<PathBuf, ExtractionError> {
        let out_path = self.scratch_path("wav");

        let args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{offset_sec:.3}"),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-t".to_string(),
            format!("{duration_sec:.3}"),
            "-ar".to_string(),
            "16000".to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
            out_path.to_string_lossy().to_string(),
        ];

        self.run_ffmpeg(&args).await?;
        Ok(out_path)
    }

    /// No-op when `path` is already an audio file matching `target` format;
    /// otherwise extracts track 0 into a temp file. Returns whether the
    /// returned path is a temp artifact the caller must clean up.
    pub async fn prepare(&self, path: &Path, target: AudioFormat) -> Result<(PathBuf, bool), ExtractionError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if ext == target.extension() {
            return Ok((path.to_path_buf(), false));
        }
        let staged = self.extract(path, 0, target, 16_000, true).await?;
        Ok((staged, true))
    }

    /// Picks an audio track index given a preference list: exact match,
    /// then prefix match either way, then track 0.
    pub fn select_preferred_track(tracks: &[AudioTrack], preferences: &[String]) -> usize {
        for pref in preferences {
            if let Some(t) = tracks.iter().find(|t| t.language_tag.as_deref() == Some(pref.as_str())) {
                return t.index;
            }
        }
        for pref in preferences {
            if let Some(t) = tracks.iter().find(|t| {
                t.language_tag
                    .as_deref()
                    .is_some_and(|tag| tag.starts_with(pref.as_str()) || pref.starts_with(tag))
            }) {
                return t.index;
            }
        }
        tracks.first().map(|t| t.index).unwrap_or(0)
    }

    /// Best-effort removal of a staged temp file; never raises.
    pub async fn cleanup(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove staged audio {}: {e}", path.display());
            }
        }
    }
}

impl Default for AudioStager {
    fn default() -> Self {
        Self::new(None, Duration::from_secs(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(index: usize, lang: Option<&str>) -> AudioTrack {
        AudioTrack {
            index,
            codec: "aac".to_string(),
            channels: 2,
            language_tag: lang.map(str::to_string),
            title: None,
            is_default: index == 0,
        }
    }

    #[test]
    fn select_preferred_track_prefers_exact_match() {
        let tracks = vec![track(0, Some("en")), track(1, Some("ja"))];
        let prefs = vec!["ja".to_string()];
        assert_eq!(AudioStager::select_preferred_track(&tracks, &prefs), 1);
    }

    #[test]
    fn select_preferred_track_falls_back_to_prefix_match() {
        let tracks = vec![track(0, Some("en")), track(1, Some("pt-br"))];
        let prefs = vec!["pt".to_string()];
        assert_eq!(AudioStager::select_preferred_track(&tracks, &prefs), 1);
    }

    #[test]
    fn select_preferred_track_falls_back_to_zero() {
        let tracks = vec![track(0, Some("en")), track(1, Some("ja"))];
        let prefs = vec!["de".to_string()];
        assert_eq!(AudioStager::select_preferred_track(&tracks, &prefs), 0);
    }

    #[test]
    fn prepare_target_path_uses_scratch_dir_when_configured() {
        let stager = AudioStager::new(Some(PathBuf::from("/tmp/subgend-scratch")), Duration::from_secs(5));
        let p = stager.scratch_path("wav");
        assert!(p.starts_with("/tmp/subgend-scratch"));
    }
}
