//! Small cross-cutting handlers shared across use cases.
//!
//! Failure notification is not broken out into its own handler here: it's
//! a single fire-and-forget call into the `Notifier` singleton, embedded
//! directly in `TranscribeFileUseCase::notify_failure` rather than given
//! its own module (see DESIGN.md).

pub mod downstream_refresh;

pub use downstream_refresh::{notify_subtitle_manager, refresh_all};
