//! # Redswitch Proto
//!
//! RESP (Redis Serialization Protocol) codec and error taxonomy.
//!
//! ## Modules
//!
//! - [`codec`] - Encoder and decoder for RESP protocol
//! - [`error`] - Error types shared by the whole client
//! - [`frame`] - Frame types representing RESP data structures

pub mod codec;
/// Error types.
pub mod error;
pub mod frame;
