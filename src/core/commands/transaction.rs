use bytes::Bytes;
use tracing::{debug, warn};

use crate::core::command::{non_empty, Cmd};
use crate::core::Lease;
use crate::proto::frame::Frame;
use crate::{Client, Error, Result};

/// Creates a WATCH command.
pub fn watch<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("WATCH").args(non_empty("WATCH", "key", keys)?))
}

/// Creates an UNWATCH command.
#[inline]
pub fn unwatch() -> Cmd {
    Cmd::new("UNWATCH")
}

/// Creates a MULTI command.
#[inline]
pub fn multi() -> Cmd {
    Cmd::new("MULTI")
}

/// Creates an EXEC command.
#[inline]
pub fn exec() -> Cmd {
    Cmd::new("EXEC")
}

/// Creates a DISCARD command.
#[inline]
pub fn discard() -> Cmd {
    Cmd::new("DISCARD")
}

/// A MULTI/EXEC transaction holding one connection until it finishes.
///
/// Every step is one request and one reply on that connection: `WATCH`
/// goes out immediately, the first [`queue`](Transaction::queue) sends
/// `MULTI`, each queued command is acknowledged with `QUEUED`, and
/// [`exec`](Transaction::exec) returns the raw replies.
///
/// In single mode the client's connection stays locked while a
/// transaction is open. A transaction dropped before `exec` or `discard`
/// rolls the connection back in the background.
///
/// # Example
///
/// ```no_run
/// use redswitch::{Client, Cmd};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::connect("redis://localhost:6379").await?;
/// let mut tx = client.transaction().await?;
/// tx.watch(["balance"]).await?;
/// tx.queue(Cmd::new("DECRBY").arg("balance").arg("10")).await?;
/// match tx.exec().await? {
///     Some(replies) => println!("committed: {:?}", replies),
///     None => println!("balance changed, aborted"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Transaction {
    lease: Option<Lease>,
    watching: bool,
    in_multi: bool,
}

impl Transaction {
    fn lease(&mut self) -> Result<&mut Lease> {
        self.lease.as_mut().ok_or_else(|| Error::Connection {
            message: "transaction already finished".to_string(),
        })
    }

    async fn expect_ok(&mut self, cmd: Cmd) -> Result<()> {
        match self.lease()?.request(&cmd).await? {
            Frame::SimpleString(_) => Ok(()),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(Error::type_error(format!(
                "expected status reply to {}, got {} reply",
                cmd.name(),
                other.kind()
            ))),
        }
    }

    /// Watches keys for changes. Only allowed before the first queued
    /// command.
    pub async fn watch<I, K>(&mut self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        let cmd = watch(keys)?;
        if self.in_multi {
            return Err(Error::invalid_argument("WATCH inside MULTI is not allowed"));
        }
        self.expect_ok(cmd).await?;
        self.watching = true;
        Ok(())
    }

    /// Forgets all watched keys.
    pub async fn unwatch(&mut self) -> Result<()> {
        self.expect_ok(unwatch()).await?;
        self.watching = false;
        Ok(())
    }

    /// Queues one command, opening the transaction on first use.
    ///
    /// A command the server refuses to queue aborts the whole transaction
    /// (`DISCARD` is sent) and its error is returned.
    pub async fn queue(&mut self, cmd: Cmd) -> Result<()> {
        if !self.in_multi {
            self.expect_ok(multi()).await?;
            self.in_multi = true;
        }
        match self.lease()?.request(&cmd).await? {
            Frame::SimpleString(_) => Ok(()),
            Frame::Error(e) => {
                debug!(command = %cmd.name(), "command refused inside MULTI, discarding");
                self.in_multi = false;
                self.watching = false;
                self.expect_ok(discard()).await?;
                Err(Error::server(&e))
            }
            other => Err(Error::type_error(format!(
                "expected QUEUED, got {} reply",
                other.kind()
            ))),
        }
    }

    /// Executes the queued commands.
    ///
    /// Returns one raw reply per queued command, or `None` when a watched
    /// key changed and the transaction was aborted. Individual replies may
    /// be [`Frame::Error`]; parse them with [`crate::core::reply::parse`].
    pub async fn exec(mut self) -> Result<Option<Vec<Frame>>> {
        if !self.in_multi {
            self.expect_ok(multi()).await?;
            self.in_multi = true;
        }
        let reply = self.lease()?.request(&exec()).await;
        self.in_multi = false;
        self.watching = false;
        match reply? {
            Frame::Array(items) => Ok(Some(items)),
            f if f.is_nil() => Ok(None),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(Error::type_error(format!(
                "expected array reply to EXEC, got {} reply",
                other.kind()
            ))),
        }
    }

    /// Abandons the transaction and any watches.
    pub async fn discard(mut self) -> Result<()> {
        if self.in_multi {
            self.in_multi = false;
            self.watching = false;
            self.expect_ok(discard()).await
        } else if self.watching {
            self.watching = false;
            self.expect_ok(unwatch()).await
        } else {
            Ok(())
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.in_multi && !self.watching {
            return;
        }
        let Some(mut lease) = self.lease.take() else {
            return;
        };
        let rollback = if self.in_multi { discard() } else { unwatch() };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = lease.request(&rollback).await {
                        debug!(error = %e, "rollback of abandoned transaction failed");
                    }
                });
            }
            Err(_) => {
                warn!("transaction dropped outside a runtime, discarding its connection");
                lease.mark_broken();
            }
        }
    }
}

impl Client {
    /// Starts a transaction on a dedicated connection.
    ///
    /// # Errors
    ///
    /// Fails like any dispatch when no connection can be obtained.
    pub async fn transaction(&self) -> Result<Transaction> {
        Ok(Transaction {
            lease: Some(self.lease().await?),
            watching: false,
            in_multi: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::words;

    #[test]
    fn test_watch_cmd() {
        assert_eq!(words(&watch(["a", "b"]).unwrap()), ["WATCH", "a", "b"]);
        let none: Vec<&'static str> = Vec::new();
        assert!(matches!(watch(none), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_control_cmds() {
        assert_eq!(words(&multi()), ["MULTI"]);
        assert_eq!(words(&exec()), ["EXEC"]);
        assert_eq!(words(&discard()), ["DISCARD"]);
        assert_eq!(words(&unwatch()), ["UNWATCH"]);
    }
}
