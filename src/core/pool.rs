//! Bounded pool of [`Connection`]s.
//!
//! Connections are created lazily on checkout, up to the configured size.
//! A checkout is a [`PooledConnection`] guard that hands the connection back
//! when dropped, so it is released on every exit path. Broken connections
//! are never put back: they are discarded on release, and the next checkout
//! opens a fresh one.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};

use crate::core::connection::Connection;
use crate::core::options::{ConnectionOptions, PoolOptions};
use crate::{Error, Result};

struct PoolState {
    idle: VecDeque<Connection>,
    checked_out: usize,
}

struct PoolInner {
    connection: ConnectionOptions,
    options: PoolOptions,
    state: Mutex<PoolState>,
    // One permit per connection slot; a checkout holds one until release.
    permits: Arc<Semaphore>,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops the first reusable idle connection, dropping stale ones.
    fn take_idle(&self) -> Option<Connection> {
        let mut state = self.lock();
        while let Some(conn) = state.idle.pop_front() {
            if conn.is_broken() {
                debug!("discarding broken idle connection");
                continue;
            }
            if let Some(lifetime) = self.options.connection_lifetime {
                if conn.last_active().elapsed() > lifetime {
                    debug!(?lifetime, "discarding expired idle connection");
                    continue;
                }
            }
            state.checked_out += 1;
            return Some(conn);
        }
        None
    }

    fn release(&self, conn: Connection) {
        let mut state = self.lock();
        state.checked_out = state.checked_out.saturating_sub(1);
        if conn.is_broken() {
            warn!("dropping broken connection instead of returning it to the pool");
        } else {
            state.idle.push_back(conn);
        }
    }
}

/// Snapshot of a pool's occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections waiting in the pool.
    pub idle: usize,
    /// Connections currently lent out, including ones being opened.
    pub checked_out: usize,
    /// Configured maximum.
    pub size: usize,
}

/// A bounded, lazily filled pool of connections to one server.
///
/// Cloning is cheap; all clones share the same connections.
///
/// # Example
///
/// ```no_run
/// use redswitch::core::options::{ConnectionOptions, PoolOptions};
/// use redswitch::core::pool::ConnectionPool;
/// use redswitch::core::command;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = ConnectionPool::new(
///     ConnectionOptions::from_url("redis://127.0.0.1:6379")?,
///     PoolOptions { size: 4, ..Default::default() },
/// )?;
/// let mut conn = pool.fetch().await?;
/// conn.request(&command::ping()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates an empty pool. No connection is opened until the first fetch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the pool size is zero.
    pub fn new(connection: ConnectionOptions, options: PoolOptions) -> Result<Self> {
        options.validate()?;
        let state = PoolState {
            idle: VecDeque::with_capacity(options.size),
            checked_out: 0,
        };
        Ok(ConnectionPool {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(options.size)),
                connection,
                options,
                state: Mutex::new(state),
            }),
        })
    }

    /// Checks out a healthy connection.
    ///
    /// Reuses an idle connection when one is available and opens a new one
    /// otherwise. When every slot is lent out the call waits according to
    /// [`PoolOptions::wait_timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] when the pool is full and the wait
    /// budget is zero, [`Error::Timeout`] when a non-zero budget elapses, and
    /// any error from opening a new connection.
    pub async fn fetch(&self) -> Result<PooledConnection> {
        let permit = self.acquire_permit().await?;

        if let Some(conn) = self.inner.take_idle() {
            return Ok(PooledConnection::new(self.inner.clone(), conn, permit));
        }

        // Reserve the slot before the await so concurrent status snapshots
        // stay within the invariant. The reservation is undone if connecting
        // fails or this future is dropped.
        let reservation = Reservation::new(self.inner.clone());
        debug!(addr = %self.inner.connection.socket_addr(), "opening pooled connection");
        let conn = Connection::connect(&self.inner.connection).await?;
        reservation.disarm();
        Ok(PooledConnection::new(self.inner.clone(), conn, permit))
    }

    /// Current occupancy.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.lock();
        PoolStatus {
            idle: state.idle.len(),
            checked_out: state.checked_out,
            size: self.inner.options.size,
        }
    }

    /// The options every pooled connection is opened with.
    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.inner.connection
    }

    /// The pool policy.
    pub fn options(&self) -> &PoolOptions {
        &self.inner.options
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit> {
        let permits = self.inner.permits.clone();
        match self.inner.options.wait_timeout {
            Some(limit) if limit.is_zero() => {
                permits.try_acquire_owned().map_err(|e| match e {
                    TryAcquireError::NoPermits => Error::PoolExhausted,
                    TryAcquireError::Closed => pool_closed(),
                })
            }
            Some(limit) => match tokio::time::timeout(limit, permits.acquire_owned()).await {
                Ok(permit) => permit.map_err(|_| pool_closed()),
                Err(_) => Err(Error::Timeout {
                    message: format!("no pooled connection available within {:?}", limit),
                }),
            },
            None => permits.acquire_owned().await.map_err(|_| pool_closed()),
        }
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("addr", &self.inner.connection.socket_addr())
            .field("status", &self.status())
            .finish()
    }
}

fn pool_closed() -> Error {
    Error::Connection {
        message: "connection pool is closed".to_string(),
    }
}

/// A checkout slot counted before its connection exists.
struct Reservation {
    pool: Arc<PoolInner>,
    armed: bool,
}

impl Reservation {
    fn new(pool: Arc<PoolInner>) -> Self {
        pool.lock().checked_out += 1;
        Reservation { pool, armed: true }
    }

    /// Keeps the slot counted; the new [`PooledConnection`] releases it.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.pool.lock();
            state.checked_out = state.checked_out.saturating_sub(1);
        }
    }
}

/// A connection checked out of a [`ConnectionPool`].
///
/// Dereferences to [`Connection`]. Dropping it returns a healthy
/// connection to the pool and discards a broken one.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    // Declared last so the slot is freed only after the connection is back.
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection, permit: OwnedSemaphorePermit) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
            _permit: permit,
        }
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection is present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection is present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .finish()
    }
}
