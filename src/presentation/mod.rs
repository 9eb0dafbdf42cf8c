//! Presentation layer: the HTTP surface the rest of the crate is driven
//! through.

pub mod http;
