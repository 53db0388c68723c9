//! RESP frame types.
//!
//! A [`Frame`] is one decoded unit of server response (or one encoded
//! request): status, error, integer, bulk string, array or nil.

/// Frame type definitions.
pub mod types;

pub use types::Frame;
