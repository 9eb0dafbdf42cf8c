//! Immutable, process-lifetime value types shared across the domain.

pub mod audio_track;
pub mod language_code;
pub mod naming_config;
pub mod skip_config;
pub mod subtitle_segment;
pub mod transcription_result;

pub use audio_track::{normalize_language_tag, AudioTrack, InternalSubtitleStream};
pub use language_code::{from_any, languages_match, to_naming, to_service_locale, LanguageCode, NamingType, UNKNOWN};
pub use naming_config::SubtitleNamingConfig;
pub use skip_config::SkipConfig;
pub use subtitle_segment::SubtitleSegment;
pub use transcription_result::TranscriptionResult;
