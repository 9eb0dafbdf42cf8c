//! Infrastructure: in-memory stores and adapters for external
//! processes/services.

pub mod external;
pub mod jobs;
pub mod subtitle;
