//! Concrete `MediaServerClient` implementations.

pub mod jellyfin;
pub mod plex;

pub use jellyfin::JellyfinClient;
pub use plex::PlexClient;
