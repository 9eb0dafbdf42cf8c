//! Subtitle parsing, emission, and output path construction.

pub mod naming;
pub mod srt;

pub use naming::build_output_path;
pub use srt::{emit, emit_lyrics, parse, with_credit_line};
