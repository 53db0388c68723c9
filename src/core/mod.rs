//! # Redswitch Core
//!
//! Command dispatch for the Redswitch Redis client: connections, the pool,
//! the client that routes every command through one of them, and the reply
//! parser that turns raw frames into Rust values.
//!
//! ## Modules
//!
//! - [`connection`] - Single connection management
//! - [`pool`] - Bounded connection pool
//! - [`command`] - Command builders
//! - [`commands`] - Per-family command wrappers
//! - [`reply`] - Reply parsing
//! - [`builder`] - Client builder
//! - [`options`] - Connection and pool configuration

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::instrument;

pub use crate::proto::error::{Error, Result};

/// Client builder configuration.
pub mod builder;
/// Command construction helpers.
pub mod command;
/// Command wrappers grouped by family.
pub mod commands;
/// Low-level connection management.
pub mod connection;
/// Connection and pool options.
pub mod options;
/// Connection pooling.
pub mod pool;
/// Reply parsing.
pub mod reply;

use self::builder::ClientBuilder;
use self::command::Cmd;
use self::connection::Connection;
use self::options::ConnectionOptions;
use self::pool::{ConnectionPool, PoolStatus, PooledConnection};
use self::reply::FromReply;
use crate::proto::frame::Frame;

/// High-level Redis client.
///
/// A client is backed by exactly one of:
///
/// - a single dedicated connection, used by one command at a time. Once
///   that connection breaks every call fails with [`Error::Connection`];
///   the client never reconnects on its own.
/// - a [`ConnectionPool`], from which each command checks out a
///   connection and returns it when done.
///
/// The mode is fixed at construction. Cloning a client shares its backend.
///
/// # Example
///
/// ```no_run
/// use redswitch::core::Client;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::connect("redis://localhost:6379").await?;
///     client.set("state", "On").await?;
///     let value: Option<String> = client.get("state").await?;
///     assert_eq!(value.as_deref(), Some("On"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    backend: Backend,
}

#[derive(Debug, Clone)]
enum Backend {
    Single(Arc<Mutex<Connection>>),
    Pool(ConnectionPool),
}

/// Exclusive use of one connection for the duration of a request.
pub(crate) enum Lease {
    Single(OwnedMutexGuard<Connection>),
    Pooled(PooledConnection),
}

impl Deref for Lease {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Lease::Single(guard) => &**guard,
            Lease::Pooled(conn) => &**conn,
        }
    }
}

impl DerefMut for Lease {
    fn deref_mut(&mut self) -> &mut Connection {
        match self {
            Lease::Single(guard) => &mut **guard,
            Lease::Pooled(conn) => &mut **conn,
        }
    }
}

impl Client {
    /// Connects to a Redis server using the provided address.
    ///
    /// The address should be in the format `redis://[user:password@]host[:port][/db]`.
    /// The returned client owns a single connection; use
    /// [`Client::builder`] with [`ClientBuilder::pool`] for a pooled client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a malformed address and any
    /// error raised while connecting or authenticating.
    pub async fn connect<T: AsRef<str>>(addr: T) -> Result<Self> {
        let options = ConnectionOptions::from_url(addr.as_ref())?;
        let conn = Connection::connect(&options).await?;
        Ok(Self::with_connection(conn))
    }

    /// Wraps an already established connection (single mode).
    pub fn with_connection(conn: Connection) -> Self {
        Client {
            backend: Backend::Single(Arc::new(Mutex::new(conn))),
        }
    }

    /// Dispatches through `pool` (pool mode).
    pub fn with_pool(pool: ConnectionPool) -> Self {
        Client {
            backend: Backend::Pool(pool),
        }
    }

    /// Returns a [`ClientBuilder`].
    #[inline]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns true if commands are dispatched through a pool.
    pub fn is_pooled(&self) -> bool {
        matches!(self.backend, Backend::Pool(_))
    }

    /// Pool occupancy, or `None` in single mode.
    pub fn pool_status(&self) -> Option<PoolStatus> {
        match &self.backend {
            Backend::Single(_) => None,
            Backend::Pool(pool) => Some(pool.status()),
        }
    }

    /// Sends one command and waits for its one reply.
    ///
    /// The reply is returned as is; an error reply comes back as
    /// [`Frame::Error`] rather than as `Err`. Use
    /// [`command_as`](Client::command_as) to have it parsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] without any I/O if the single
    /// connection is broken, the pool checkout errors in pool mode, and
    /// stream errors otherwise. Stream errors mark the connection broken.
    #[instrument(level = "debug", skip(self, cmd), fields(command = %cmd.name()))]
    pub async fn command(&self, cmd: Cmd) -> Result<Frame> {
        let mut conn = self.lease().await?;
        conn.request(&cmd).await
    }

    /// Sends one command and parses its reply into `T`.
    ///
    /// # Errors
    ///
    /// As [`command`](Client::command), plus [`Error::Server`] for an error
    /// reply and [`Error::Type`] when the reply does not fit `T`.
    pub async fn command_as<T: FromReply>(&self, cmd: Cmd) -> Result<T> {
        reply::parse(self.command(cmd).await?)
    }

    /// Takes exclusive use of a connection: the single connection's lock or
    /// a pool checkout. Released when the lease is dropped.
    pub(crate) async fn lease(&self) -> Result<Lease> {
        match &self.backend {
            Backend::Single(conn) => {
                let guard = conn.clone().lock_owned().await;
                if guard.is_broken() {
                    return Err(Error::Connection {
                        message: "connection is broken".to_string(),
                    });
                }
                Ok(Lease::Single(guard))
            }
            Backend::Pool(pool) => Ok(Lease::Pooled(pool.fetch().await?)),
        }
    }
}
