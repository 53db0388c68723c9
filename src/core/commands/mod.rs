//! Command wrappers, one module per command family.
//!
//! Every module follows the same shape: free functions build a [`Cmd`]
//! (those taking a collection of keys or members return `Result<Cmd>` and
//! reject an empty collection before any I/O), and an `impl Client` block
//! dispatches the command and parses its reply.
//!
//! Durations are sent in milliseconds wherever the server accepts them.

use bytes::Bytes;

use crate::core::command::{self, Cmd};
use crate::core::reply;
use crate::proto::frame::Frame;
use crate::{Client, Result};

/// Generic keys (DEL, EXPIRE, SCAN, ...).
pub mod keys;
/// String values.
pub mod strings;
/// Lists.
pub mod lists;
/// Hashes.
pub mod hashes;
/// Sets.
pub mod sets;
/// Sorted sets.
pub mod sorted_sets;
/// HyperLogLog.
pub mod hyperloglog;
/// Geospatial indexes.
pub mod geo;
/// Lua scripting.
pub mod scripting;
/// MULTI/EXEC transactions.
pub mod transaction;

pub use self::geo::GeoUnit;
pub use self::keys::Ttl;
pub use self::lists::InsertPosition;
pub use self::sorted_sets::{Aggregation, Limit, ScoreBound, UpdateType};
pub use self::strings::{SetCondition, SetOptions};
pub use self::transaction::Transaction;

/// `MATCH` / `COUNT` modifiers shared by the SCAN family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Glob-style pattern the returned elements must match.
    pub pattern: Option<String>,
    /// Hint for how much work one call does.
    pub count: Option<u64>,
}

impl ScanOptions {
    /// Only return elements matching `pattern`.
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the COUNT hint.
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn apply(&self, mut cmd: Cmd) -> Cmd {
        if let Some(pattern) = &self.pattern {
            cmd = cmd.arg("MATCH").arg(pattern.clone());
        }
        if let Some(count) = self.count {
            cmd = cmd.arg("COUNT").arg(count.to_string());
        }
        cmd
    }
}

/// Creates a PING command.
#[inline]
pub fn ping() -> Cmd {
    command::ping()
}

/// Creates an ECHO command.
#[inline]
pub fn echo(message: impl Into<Bytes>) -> Cmd {
    command::echo(message)
}

impl Client {
    /// Sends a PING command to the server. Returns the status text, `PONG`.
    pub async fn ping(&self) -> Result<String> {
        self.command_as(ping()).await
    }

    /// Echoes the provided message back from the server.
    pub async fn echo<V: reply::FromReply>(&self, message: impl Into<Bytes>) -> Result<V> {
        self.command_as(echo(message)).await
    }

    /// Runs a SCAN-family command and splits the reply into the next cursor
    /// and the raw batch.
    pub(crate) async fn scan_frame(&self, cmd: Cmd) -> Result<(u64, Frame)> {
        reply::parse_scan_reply(self.command(cmd).await?)
    }
}

#[cfg(test)]
pub(crate) fn words(cmd: &Cmd) -> Vec<String> {
    cmd.as_args()
        .iter()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .collect()
}
