use std::collections::HashSet;
use std::hash::Hash;

use bytes::Bytes;

use super::ScanOptions;
use crate::core::command::{non_empty, Cmd};
use crate::core::reply::{parse, FromReply};
use crate::{Client, Result};

fn with_members<I, M>(name: &'static str, key: Bytes, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    Ok(Cmd::new(name).arg(key).args(non_empty(name, "member", members)?))
}

fn over_keys<I, K>(name: &'static str, keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new(name).args(non_empty(name, "key", keys)?))
}

fn store<I, K>(name: &'static str, destination: Bytes, keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new(name)
        .arg(destination)
        .args(non_empty(name, "key", keys)?))
}

/// Creates an SADD command.
pub fn sadd<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    with_members("SADD", key.into(), members)
}

/// Creates an SREM command.
pub fn srem<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    with_members("SREM", key.into(), members)
}

/// Creates an SMEMBERS command.
#[inline]
pub fn smembers(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("SMEMBERS").arg(key)
}

/// Creates an SISMEMBER command.
#[inline]
pub fn sismember(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Cmd {
    Cmd::new("SISMEMBER").arg(key).arg(member)
}

/// Creates an SCARD command.
#[inline]
pub fn scard(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("SCARD").arg(key)
}

/// Creates an SPOP command.
#[inline]
pub fn spop(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("SPOP").arg(key)
}

/// Creates an SRANDMEMBER command.
#[inline]
pub fn srandmember(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("SRANDMEMBER").arg(key)
}

/// Creates an SINTER command.
pub fn sinter<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    over_keys("SINTER", keys)
}

/// Creates an SUNION command.
pub fn sunion<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    over_keys("SUNION", keys)
}

/// Creates an SDIFF command.
pub fn sdiff<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    over_keys("SDIFF", keys)
}

/// Creates an SINTERSTORE command.
pub fn sinterstore<I, K>(destination: impl Into<Bytes>, keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    store("SINTERSTORE", destination.into(), keys)
}

/// Creates an SUNIONSTORE command.
pub fn sunionstore<I, K>(destination: impl Into<Bytes>, keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    store("SUNIONSTORE", destination.into(), keys)
}

/// Creates an SDIFFSTORE command.
pub fn sdiffstore<I, K>(destination: impl Into<Bytes>, keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    store("SDIFFSTORE", destination.into(), keys)
}

/// Creates an SMOVE command.
#[inline]
pub fn smove(
    source: impl Into<Bytes>,
    destination: impl Into<Bytes>,
    member: impl Into<Bytes>,
) -> Cmd {
    Cmd::new("SMOVE").arg(source).arg(destination).arg(member)
}

/// Creates an SSCAN command.
#[inline]
pub fn sscan(key: impl Into<Bytes>, cursor: u64, options: &ScanOptions) -> Cmd {
    options.apply(Cmd::new("SSCAN").arg(key).arg(cursor.to_string()))
}

impl Client {
    /// Adds members. Returns how many were new.
    pub async fn sadd<I, M>(&self, key: impl Into<Bytes>, members: I) -> Result<u64>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        self.command_as(sadd(key, members)?).await
    }

    /// Removes members. Returns how many were present.
    pub async fn srem<I, M>(&self, key: impl Into<Bytes>, members: I) -> Result<u64>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        self.command_as(srem(key, members)?).await
    }

    /// All members.
    pub async fn smembers<V>(&self, key: impl Into<Bytes>) -> Result<HashSet<V>>
    where
        V: FromReply + Eq + Hash,
    {
        self.command_as(smembers(key)).await
    }

    /// Whether `member` belongs to the set.
    pub async fn sismember(&self, key: impl Into<Bytes>, member: impl Into<Bytes>) -> Result<bool> {
        self.command_as(sismember(key, member)).await
    }

    /// Number of members.
    pub async fn scard(&self, key: impl Into<Bytes>) -> Result<u64> {
        self.command_as(scard(key)).await
    }

    /// Removes and returns a random member.
    pub async fn spop<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(spop(key)).await
    }

    /// Returns a random member without removing it.
    pub async fn srandmember<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(srandmember(key)).await
    }

    /// Intersection of the given sets.
    pub async fn sinter<V, I, K>(&self, keys: I) -> Result<HashSet<V>>
    where
        V: FromReply + Eq + Hash,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sinter(keys)?).await
    }

    /// Union of the given sets.
    pub async fn sunion<V, I, K>(&self, keys: I) -> Result<HashSet<V>>
    where
        V: FromReply + Eq + Hash,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sunion(keys)?).await
    }

    /// Members of the first set missing from all the others.
    pub async fn sdiff<V, I, K>(&self, keys: I) -> Result<HashSet<V>>
    where
        V: FromReply + Eq + Hash,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sdiff(keys)?).await
    }

    /// Stores the intersection in `destination`. Returns its size.
    pub async fn sinterstore<I, K>(&self, destination: impl Into<Bytes>, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sinterstore(destination, keys)?).await
    }

    /// Stores the union in `destination`. Returns its size.
    pub async fn sunionstore<I, K>(&self, destination: impl Into<Bytes>, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sunionstore(destination, keys)?).await
    }

    /// Stores the difference in `destination`. Returns its size.
    pub async fn sdiffstore<I, K>(&self, destination: impl Into<Bytes>, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(sdiffstore(destination, keys)?).await
    }

    /// Moves `member` between sets.
    pub async fn smove(
        &self,
        source: impl Into<Bytes>,
        destination: impl Into<Bytes>,
        member: impl Into<Bytes>,
    ) -> Result<bool> {
        self.command_as(smove(source, destination, member)).await
    }

    /// One SSCAN step.
    pub async fn sscan<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<V>)> {
        let (cursor, batch) = self.scan_frame(sscan(key, cursor, options)).await?;
        Ok((cursor, parse(batch)?))
    }
}
