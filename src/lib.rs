//! # Redswitch
//!
//! A small async Redis client built around one dispatch path: every command
//! takes a connection (the client's dedicated one, or one checked out of a
//! pool), writes one request, reads one reply, and parses that reply into
//! the Rust type the caller asked for.
//!
//! On top of it sits [`StateBoard`], a tiny on/off switch that polls a key
//! once a second.
//!
//! ## Features
//!
//! - `serde` - `Deserialize` for [`ConnectionOptions`] and [`PoolOptions`]
//!
//! ## Example
//!
//! ```no_run
//! use redswitch::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("redis://localhost:6379").await?;
//!     client.ping().await?;
//!     let removed = client.del(["a", "b"]).await?;
//!     println!("removed {} keys", removed);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod board;
pub mod core;
pub mod proto;

// Re-export high-level client types for convenience
pub use crate::board::StateBoard;
pub use crate::core::builder::ClientBuilder;
pub use crate::core::command::Cmd;
pub use crate::core::options::{ConnectionOptions, PoolOptions};
pub use crate::core::pool::{ConnectionPool, PoolStatus};
pub use crate::core::reply::FromReply;
pub use crate::core::{Client, Error, Result};
pub use crate::proto::frame::Frame;
