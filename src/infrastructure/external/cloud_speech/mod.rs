//! Cloud speech-to-text + object storage clients.

pub mod blob_client;
pub mod remote_client;
pub mod speech_client;

pub use blob_client::BlobClient;
pub use remote_client::RemoteTranscriptionClient;
pub use speech_client::{RemoteJobHandle, RemoteJobState, SpeechClient};
