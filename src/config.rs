//! Process configuration: one env var per flag, grouped into small nested
//! structs rather than a flat bag, with every default spelled out here
//! instead of scattered across call sites. Loading and validation happen
//! together in `from_env` so a missing key fails fast at startup.

use std::time::Duration;

use crate::domain::value_objects::{NamingType, SkipConfig, SubtitleNamingConfig};
use crate::shared::error::ConfigError;

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env_string(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on")).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_string(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_string(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env_string(key) {
        Some(v) => v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub speech_key: String,
    pub speech_region: String,
    /// Blob-service base URL, e.g. `https://<account>.blob.core.windows.net`.
    pub storage_account_url: String,
    /// A container-level SAS token (query-string form, no leading `?`),
    /// supplied once at startup rather than minted per upload — see
    /// DESIGN.md.
    pub storage_sas_token: String,
    pub storage_container: String,
}

#[derive(Debug, Clone)]
pub struct BazarrConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct PlexConfig {
    pub server: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct JellyfinConfig {
    pub server: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct EmbyConfig {
    pub server: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct PathMapping {
    pub from_prefix: String,
    pub to_prefix: String,
}

impl PathMapping {
    pub fn apply(&self, file_path: &str) -> String {
        if let Some(rest) = file_path.strip_prefix(&self.from_prefix) {
            format!("{}{rest}", self.to_prefix)
        } else {
            file_path.to_string()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_port: u16,
    pub product_name: String,

    pub azure: AzureConfig,
    pub bazarr: Option<BazarrConfig>,
    pub plex: Option<PlexConfig>,
    pub jellyfin: Option<JellyfinConfig>,
    pub emby: Option<EmbyConfig>,
    pub path_mapping: Option<PathMapping>,

    pub process_added_media: bool,
    pub process_media_on_play: bool,

    pub skip_config: SkipConfig,
    pub naming_config: SubtitleNamingConfig,
    pub credit_line_enabled: bool,

    pub lrc_for_audio_files: bool,
    pub preferred_audio_languages: Vec<String>,
    pub limit_to_preferred_audio_language: bool,

    pub detect_language_length_sec: f64,
    pub detect_language_offset_sec: f64,
    pub language_detection_candidates: Vec<String>,

    pub media_folders: Vec<String>,
    pub default_subtitle_language: String,

    pub concurrent_transcriptions: usize,
    pub job_poll_interval_sec: u64,
    pub job_timeout_sec: u64,

    pub transcode_dir: Option<String>,
    pub debug: bool,

    /// Fire-and-forget push target for the failure notifier.
    /// `None` leaves the process-wide notifier at its default no-op.
    pub notifier_webhook_url: Option<String>,
}

impl Config {
    /// Loads and validates configuration from the process environment.
    /// Fails fast (before the HTTP listener starts) rather than surfacing
    /// a missing key at first use.
    pub fn from_env() -> Result<Self, ConfigError> {
        let azure = AzureConfig {
            speech_key: env_string("AZURE_SPEECH_KEY").ok_or_else(|| ConfigError::Missing("AZURE_SPEECH_KEY".to_string()))?,
            speech_region: env_string("AZURE_SPEECH_REGION").unwrap_or_else(|| "swedencentral".to_string()),
            storage_account_url: env_string("AZURE_STORAGE_ACCOUNT_URL")
                .ok_or_else(|| ConfigError::Missing("AZURE_STORAGE_ACCOUNT_URL".to_string()))?,
            storage_sas_token: env_string("AZURE_STORAGE_SAS_TOKEN")
                .ok_or_else(|| ConfigError::Missing("AZURE_STORAGE_SAS_TOKEN".to_string()))?,
            storage_container: env_string("AZURE_STORAGE_CONTAINER").unwrap_or_else(|| "transcription-audio".to_string()),
        };

        let bazarr = match (env_string("BAZARR_URL"), env_string("BAZARR_API_KEY")) {
            (Some(url), Some(api_key)) => Some(BazarrConfig { url, api_key }),
            _ => None,
        };
        let plex = match (env_string("PLEX_SERVER"), env_string("PLEX_TOKEN")) {
            (Some(server), Some(token)) => Some(PlexConfig { server, token }),
            _ => None,
        };
        let jellyfin = match (env_string("JELLYFIN_SERVER"), env_string("JELLYFIN_TOKEN")) {
            (Some(server), Some(token)) => Some(JellyfinConfig { server, token }),
            _ => None,
        };
        let emby = match (env_string("EMBY_SERVER"), env_string("EMBY_TOKEN")) {
            (Some(server), Some(token)) => Some(EmbyConfig { server, token }),
            _ => None,
        };

        let path_mapping = if env_bool("USE_PATH_MAPPING", false) {
            let from_prefix =
                env_string("PATH_MAPPING_FROM").ok_or_else(|| ConfigError::Missing("PATH_MAPPING_FROM".to_string()))?;
            let to_prefix = env_string("PATH_MAPPING_TO").ok_or_else(|| ConfigError::Missing("PATH_MAPPING_TO".to_string()))?;
            Some(PathMapping { from_prefix, to_prefix })
        } else {
            None
        };

        let naming_type = match env_string("SUBTITLE_LANGUAGE_NAMING_TYPE").as_deref() {
            Some("ISO_639_1") => NamingType::Iso6391,
            Some("ISO_639_2_T") => NamingType::Iso6392T,
            Some("NAME") => NamingType::Name,
            Some("NATIVE") => NamingType::Native,
            _ => NamingType::Iso6392B,
        };
        let naming_config = SubtitleNamingConfig {
            naming_type,
            show_marker: env_bool("SHOW_IN_SUBNAME_SUBGEN", false),
            override_token: env_string("SUBTITLE_LANGUAGE_NAME"),
        };

        let skip_config = SkipConfig {
            skip_if_target_exists: env_bool("SKIP_IF_TARGET_SUBTITLES_EXIST", true),
            skip_if_any_external_exists: env_bool("SKIP_IF_EXTERNAL_SUBTITLES_EXIST", false),
            only_subgen: env_bool("SKIP_ONLY_SUBGEN_SUBTITLES", false),
            internal_language: env_string("SKIP_IF_INTERNAL_SUBTITLES_LANGUAGE"),
            audio_skip_languages: env_list("SKIP_IF_AUDIO_TRACK_IS", &[]),
            subtitle_skip_languages: env_list("SKIP_SUBTITLE_LANGUAGES", &[]),
            skip_unknown_audio: env_bool("SKIP_UNKNOWN_LANGUAGE", false),
            skip_if_no_audio_lang_but_subs_exist: env_bool("SKIP_IF_NO_LANGUAGE_BUT_SUBTITLES_EXIST", false),
            limit_to_preferred_audio: env_bool("LIMIT_TO_PREFERRED_AUDIO_LANGUAGE", false),
            preferred_audio_languages: env_list("PREFERRED_AUDIO_LANGUAGES", &[]),
        };

        Ok(Self {
            bind_port: env_u64("PORT", 9000) as u16,
            product_name: "SubGen".to_string(),

            azure,
            bazarr,
            plex,
            jellyfin,
            emby,
            path_mapping,

            process_added_media: env_bool("PROCESS_ADDED_MEDIA", true),
            process_media_on_play: env_bool("PROCESS_MEDIA_ON_PLAY", false),

            skip_config,
            naming_config,
            credit_line_enabled: env_bool("APPEND", true),

            lrc_for_audio_files: env_bool("LRC_FOR_AUDIO_FILES", true),
            preferred_audio_languages: env_list("PREFERRED_AUDIO_LANGUAGES", &[]),
            limit_to_preferred_audio_language: env_bool("LIMIT_TO_PREFERRED_AUDIO_LANGUAGE", false),

            detect_language_length_sec: env_f64("DETECT_LANGUAGE_LENGTH", 30.0),
            detect_language_offset_sec: env_f64("DETECT_LANGUAGE_OFFSET", 0.0),
            language_detection_candidates: env_list("LANGUAGE_DETECTION_CANDIDATES", &["en-US", "nl-NL", "es-ES", "fr-FR"]),

            media_folders: env_list("MEDIA_FOLDERS", &["/tv", "/movies"]),
            default_subtitle_language: env_string("SUBTITLE_LANGUAGE").unwrap_or_else(|| "en".to_string()),

            concurrent_transcriptions: env_u64("CONCURRENT_TRANSCRIPTIONS", 50) as usize,
            job_poll_interval_sec: env_u64("JOB_POLL_INTERVAL", 10),
            job_timeout_sec: env_u64("JOB_TIMEOUT", 3600),

            transcode_dir: env_string("TRANSCODE_DIR"),
            debug: env_bool("DEBUG", false),

            notifier_webhook_url: env_string("NOTIFIER_WEBHOOK_URL"),
        })
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "AZURE_SPEECH_KEY",
            "AZURE_STORAGE_ACCOUNT_URL",
            "AZURE_STORAGE_SAS_TOKEN",
            "USE_PATH_MAPPING",
            "PATH_MAPPING_FROM",
            "PATH_MAPPING_TO",
            "BAZARR_URL",
            "BAZARR_API_KEY",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_required_azure_key_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(k) if k == "AZURE_SPEECH_KEY"));
    }

    #[test]
    fn path_mapping_requires_both_prefixes_when_enabled() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("AZURE_SPEECH_KEY", "k");
        std::env::set_var("AZURE_STORAGE_ACCOUNT_URL", "https://acct.blob.core.windows.net");
        std::env::set_var("AZURE_STORAGE_SAS_TOKEN", "sv=2023&sig=abc");
        std::env::set_var("USE_PATH_MAPPING", "true");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(k) if k == "PATH_MAPPING_FROM"));
        clear_env();
    }

    #[test]
    fn fully_configured_env_loads_successfully() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("AZURE_SPEECH_KEY", "k");
        std::env::set_var("AZURE_STORAGE_ACCOUNT_URL", "https://acct.blob.core.windows.net");
        std::env::set_var("AZURE_STORAGE_SAS_TOKEN", "sv=2023&sig=abc");
        std::env::set_var("BAZARR_URL", "http://bazarr:6767");
        std::env::set_var("BAZARR_API_KEY", "apikey");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.azure.speech_region, "swedencentral");
        assert!(cfg.bazarr.is_some());
        assert!(cfg.skip_config.skip_if_target_exists);
        clear_env();
    }

    #[test]
    fn path_mapping_rewrites_matching_prefix_only() {
        let mapping = PathMapping { from_prefix: "/data".to_string(), to_prefix: "/mnt/media".to_string() };
        assert_eq!(mapping.apply("/data/tv/show.mkv"), "/mnt/media/tv/show.mkv");
        assert_eq!(mapping.apply("/other/show.mkv"), "/other/show.mkv");
    }
}
