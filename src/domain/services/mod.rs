//! Pure domain services — rules that operate over value objects and
//! entities without touching I/O.

pub mod extensions;
pub mod skip_engine;

pub use extensions::{is_audio_extension, is_media_extension, is_video_extension, AUDIO_EXTENSIONS, SUBTITLE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use skip_engine::{discover_external_subtitles, evaluate as evaluate_skip, ExternalSubtitle, SkipResult};
