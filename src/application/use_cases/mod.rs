//! Use cases — the application's entry points.

pub mod batch_ingress;
pub mod cancel_session;
pub mod detect_language;
pub mod transcribe_file;

pub use batch_ingress::{BatchIngressRequest, BatchIngressResult, BatchIngressUseCase};
pub use cancel_session::{CancelSessionResult, CancelSessionUseCase};
pub use detect_language::{DetectLanguageResult, DetectLanguageUseCase};
pub use transcribe_file::{OutputFormat, TranscribeFileRequest, TranscribeFileUseCase};
