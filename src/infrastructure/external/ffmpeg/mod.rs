//! `ffprobe`/`ffmpeg` child-process adapters.

pub mod audio_stager;
pub mod ffprobe_adapter;

pub use audio_stager::{AudioFormat, AudioStager};
pub use ffprobe_adapter::FfprobeAdapter;
