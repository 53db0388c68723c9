use std::time::Duration;

use bytes::Bytes;

use crate::core::command::{non_empty, Cmd};
use crate::core::reply::FromReply;
use crate::{Client, Result};

/// Where LINSERT places the new element relative to the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// In front of the pivot.
    Before,
    /// Behind the pivot.
    After,
}

impl InsertPosition {
    fn as_str(self) -> &'static str {
        match self {
            InsertPosition::Before => "BEFORE",
            InsertPosition::After => "AFTER",
        }
    }
}

fn push<I, V>(name: &'static str, key: Bytes, values: I) -> Result<Cmd>
where
    I: IntoIterator<Item = V>,
    V: Into<Bytes>,
{
    Ok(Cmd::new(name).arg(key).args(non_empty(name, "element", values)?))
}

/// Creates an LPUSH command.
pub fn lpush<I, V>(key: impl Into<Bytes>, values: I) -> Result<Cmd>
where
    I: IntoIterator<Item = V>,
    V: Into<Bytes>,
{
    push("LPUSH", key.into(), values)
}

/// Creates an RPUSH command.
pub fn rpush<I, V>(key: impl Into<Bytes>, values: I) -> Result<Cmd>
where
    I: IntoIterator<Item = V>,
    V: Into<Bytes>,
{
    push("RPUSH", key.into(), values)
}

/// Creates an LPOP command.
#[inline]
pub fn lpop(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("LPOP").arg(key)
}

/// Creates an RPOP command.
#[inline]
pub fn rpop(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("RPOP").arg(key)
}

/// Creates an LRANGE command.
#[inline]
pub fn lrange(key: impl Into<Bytes>, start: i64, stop: i64) -> Cmd {
    Cmd::new("LRANGE").arg(key).arg_int(start).arg_int(stop)
}

/// Creates an LLEN command.
#[inline]
pub fn llen(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("LLEN").arg(key)
}

/// Creates an LINDEX command.
#[inline]
pub fn lindex(key: impl Into<Bytes>, index: i64) -> Cmd {
    Cmd::new("LINDEX").arg(key).arg_int(index)
}

/// Creates an LSET command.
#[inline]
pub fn lset(key: impl Into<Bytes>, index: i64, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("LSET").arg(key).arg_int(index).arg(value)
}

/// Creates an LREM command.
#[inline]
pub fn lrem(key: impl Into<Bytes>, count: i64, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("LREM").arg(key).arg_int(count).arg(value)
}

/// Creates an LTRIM command.
#[inline]
pub fn ltrim(key: impl Into<Bytes>, start: i64, stop: i64) -> Cmd {
    Cmd::new("LTRIM").arg(key).arg_int(start).arg_int(stop)
}

/// Creates an LINSERT command.
#[inline]
pub fn linsert(
    key: impl Into<Bytes>,
    position: InsertPosition,
    pivot: impl Into<Bytes>,
    value: impl Into<Bytes>,
) -> Cmd {
    Cmd::new("LINSERT")
        .arg(key)
        .arg(position.as_str())
        .arg(pivot)
        .arg(value)
}

/// Whole seconds for blocking pops, rounded up so a sub-second timeout
/// does not turn into 0, which blocks forever.
fn block_seconds(timeout: Duration) -> String {
    let mut secs = timeout.as_secs();
    if timeout.subsec_nanos() > 0 {
        secs += 1;
    }
    secs.to_string()
}

fn blocking_pop<I, K>(name: &'static str, keys: I, timeout: Duration) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new(name)
        .args(non_empty(name, "key", keys)?)
        .arg(block_seconds(timeout)))
}

/// Creates a BLPOP command. A zero timeout blocks indefinitely.
pub fn blpop<I, K>(keys: I, timeout: Duration) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    blocking_pop("BLPOP", keys, timeout)
}

/// Creates a BRPOP command. A zero timeout blocks indefinitely.
pub fn brpop<I, K>(keys: I, timeout: Duration) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    blocking_pop("BRPOP", keys, timeout)
}

impl Client {
    /// Prepends values to a list. Returns the new length.
    pub async fn lpush<I, V>(&self, key: impl Into<Bytes>, values: I) -> Result<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        self.command_as(lpush(key, values)?).await
    }

    /// Appends values to a list. Returns the new length.
    pub async fn rpush<I, V>(&self, key: impl Into<Bytes>, values: I) -> Result<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        self.command_as(rpush(key, values)?).await
    }

    /// Removes and returns the first element.
    pub async fn lpop<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(lpop(key)).await
    }

    /// Removes and returns the last element.
    pub async fn rpop<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(rpop(key)).await
    }

    /// Elements between `start` and `stop`, both inclusive.
    pub async fn lrange<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<V>> {
        self.command_as(lrange(key, start, stop)).await
    }

    /// Length of a list.
    pub async fn llen(&self, key: impl Into<Bytes>) -> Result<u64> {
        self.command_as(llen(key)).await
    }

    /// Element at `index`.
    pub async fn lindex<V: FromReply>(&self, key: impl Into<Bytes>, index: i64) -> Result<Option<V>> {
        self.command_as(lindex(key, index)).await
    }

    /// Overwrites the element at `index`.
    pub async fn lset(&self, key: impl Into<Bytes>, index: i64, value: impl Into<Bytes>) -> Result<()> {
        self.command_as(lset(key, index, value)).await
    }

    /// Removes up to `count` occurrences of `value`.
    pub async fn lrem(&self, key: impl Into<Bytes>, count: i64, value: impl Into<Bytes>) -> Result<u64> {
        self.command_as(lrem(key, count, value)).await
    }

    /// Trims a list to the given range.
    pub async fn ltrim(&self, key: impl Into<Bytes>, start: i64, stop: i64) -> Result<()> {
        self.command_as(ltrim(key, start, stop)).await
    }

    /// Inserts `value` next to `pivot`. Returns the new length, or -1 if
    /// the pivot was not found.
    pub async fn linsert(
        &self,
        key: impl Into<Bytes>,
        position: InsertPosition,
        pivot: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<i64> {
        self.command_as(linsert(key, position, pivot, value)).await
    }

    /// Blocking pop from the head of the first non-empty list.
    ///
    /// Returns the key and the element, or `None` on timeout. The
    /// connection's read timeout must be longer than `timeout`.
    pub async fn blpop<V, I, K>(&self, keys: I, timeout: Duration) -> Result<Option<(String, V)>>
    where
        V: FromReply,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(blpop(keys, timeout)?).await
    }

    /// Blocking pop from the tail of the first non-empty list.
    pub async fn brpop<V, I, K>(&self, keys: I, timeout: Duration) -> Result<Option<(String, V)>>
    where
        V: FromReply,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(brpop(keys, timeout)?).await
    }
}
