//! Session/job persistence (in-memory).

pub mod cancellation_flags;
pub mod session_store;
pub mod webhook_guard;

pub use cancellation_flags::CancellationFlags;
pub use session_store::SessionStore;
pub use webhook_guard::{WebhookGuard, WebhookGuardHandle};
