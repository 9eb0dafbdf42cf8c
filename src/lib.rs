//! SubGen
//!
//! Cloud-backed subtitle generation daemon: watches for new/played media
//! via webhook, transcribes it through a remote speech service, and writes
//! the result back as a subtitle file next to the source — with a
//! Whisper-ASR-compatible HTTP surface so Bazarr can drive it directly,
//! and a batch API for one-shot library sweeps.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod presentation;
pub mod shared;
