use std::time::Duration;

use bytes::Bytes;

use super::keys::millis;
use crate::core::command::{non_empty, non_empty_pairs, Cmd};
use crate::core::reply::FromReply;
use crate::{Client, Result};

/// Condition under which SET writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCondition {
    /// Only set a key that does not exist (`NX`).
    NotExists,
    /// Only set a key that already exists (`XX`).
    Exists,
}

/// Modifiers for SET.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expire the key after this long (`PX`).
    pub ttl: Option<Duration>,
    /// Write only if the condition holds.
    pub condition: Option<SetCondition>,
}

impl SetOptions {
    /// Expire the key after `ttl`.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Write only when the key does not exist.
    pub fn only_if_absent(mut self) -> Self {
        self.condition = Some(SetCondition::NotExists);
        self
    }

    /// Write only when the key exists.
    pub fn only_if_present(mut self) -> Self {
        self.condition = Some(SetCondition::Exists);
        self
    }
}

/// Creates a GET command.
#[inline]
pub fn get(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("GET").arg(key)
}

/// Creates a SET command.
#[inline]
pub fn set(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("SET").arg(key).arg(value)
}

/// Creates a SET command with modifiers.
pub fn set_with_options(
    key: impl Into<Bytes>,
    value: impl Into<Bytes>,
    options: SetOptions,
) -> Cmd {
    let mut cmd = set(key, value);
    if let Some(ttl) = options.ttl {
        cmd = cmd.arg("PX").arg(millis(ttl));
    }
    match options.condition {
        Some(SetCondition::NotExists) => cmd.arg("NX"),
        Some(SetCondition::Exists) => cmd.arg("XX"),
        None => cmd,
    }
}

/// Creates a SETNX command.
#[inline]
pub fn setnx(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("SETNX").arg(key).arg(value)
}

/// Creates a PSETEX command.
#[inline]
pub fn set_with_expiry(key: impl Into<Bytes>, value: impl Into<Bytes>, ttl: Duration) -> Cmd {
    Cmd::new("PSETEX").arg(key).arg(millis(ttl)).arg(value)
}

/// Creates a GETSET command.
#[inline]
pub fn getset(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("GETSET").arg(key).arg(value)
}

/// Creates a GETDEL command.
#[inline]
pub fn getdel(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("GETDEL").arg(key)
}

/// Creates an MGET command.
pub fn mget<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("MGET").args(non_empty("MGET", "key", keys)?))
}

fn mset_like<I, K, V>(name: &str, pairs: I) -> Result<Cmd>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    let pairs = non_empty_pairs(name, pairs)?;
    Ok(pairs
        .into_iter()
        .fold(Cmd::new(name.to_string()), |cmd, (k, v)| cmd.arg(k).arg(v)))
}

/// Creates an MSET command.
pub fn mset<I, K, V>(pairs: I) -> Result<Cmd>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    mset_like("MSET", pairs)
}

/// Creates an MSETNX command.
pub fn msetnx<I, K, V>(pairs: I) -> Result<Cmd>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    mset_like("MSETNX", pairs)
}

/// Creates an APPEND command.
#[inline]
pub fn append(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("APPEND").arg(key).arg(value)
}

/// Creates a STRLEN command.
#[inline]
pub fn strlen(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("STRLEN").arg(key)
}

/// Creates a GETRANGE command.
#[inline]
pub fn getrange(key: impl Into<Bytes>, start: i64, end: i64) -> Cmd {
    Cmd::new("GETRANGE").arg(key).arg_int(start).arg_int(end)
}

/// Creates a SETRANGE command.
#[inline]
pub fn setrange(key: impl Into<Bytes>, offset: u64, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("SETRANGE")
        .arg(key)
        .arg(offset.to_string())
        .arg(value)
}

/// Creates an INCR command.
#[inline]
pub fn incr(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("INCR").arg(key)
}

/// Creates an INCRBY command.
#[inline]
pub fn incr_by(key: impl Into<Bytes>, amount: i64) -> Cmd {
    Cmd::new("INCRBY").arg(key).arg_int(amount)
}

/// Creates an INCRBYFLOAT command.
#[inline]
pub fn incr_by_float(key: impl Into<Bytes>, amount: f64) -> Cmd {
    Cmd::new("INCRBYFLOAT").arg(key).arg_float(amount)
}

/// Creates a DECR command.
#[inline]
pub fn decr(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("DECR").arg(key)
}

/// Creates a DECRBY command.
#[inline]
pub fn decr_by(key: impl Into<Bytes>, amount: i64) -> Cmd {
    Cmd::new("DECRBY").arg(key).arg_int(amount)
}

impl Client {
    /// Gets the value of `key`, `None` if it does not exist.
    ///
    /// `V` is usually `String` or [`Bytes`].
    pub async fn get<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(get(key)).await
    }

    /// Sets the string value of a key.
    pub async fn set(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        self.command_as(set(key, value)).await
    }

    /// Sets a value with an expiry and/or a condition.
    ///
    /// Returns false when the condition prevented the write.
    pub async fn set_with_options(
        &self,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
        options: SetOptions,
    ) -> Result<bool> {
        let written: Option<()> = self
            .command_as(set_with_options(key, value, options))
            .await?;
        Ok(written.is_some())
    }

    /// Sets `key` only if it does not exist.
    pub async fn setnx(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<bool> {
        self.command_as(setnx(key, value)).await
    }

    /// Sets `key` with a time to live.
    pub async fn set_with_expiry(
        &self,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
        ttl: Duration,
    ) -> Result<()> {
        self.command_as(set_with_expiry(key, value, ttl)).await
    }

    /// Sets `key` and returns its previous value.
    pub async fn getset<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<Option<V>> {
        self.command_as(getset(key, value)).await
    }

    /// Gets the value of `key` and deletes it.
    pub async fn getdel<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Option<V>> {
        self.command_as(getdel(key)).await
    }

    /// Gets several values at once, `None` for each missing key.
    pub async fn mget<V, I, K>(&self, keys: I) -> Result<Vec<Option<V>>>
    where
        V: FromReply,
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(mget(keys)?).await
    }

    /// Sets several keys at once.
    pub async fn mset<I, K, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.command_as(mset(pairs)?).await
    }

    /// Sets several keys only if none of them exists.
    pub async fn msetnx<I, K, V>(&self, pairs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.command_as(msetnx(pairs)?).await
    }

    /// Appends to the value of `key`. Returns the new length.
    pub async fn append(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<u64> {
        self.command_as(append(key, value)).await
    }

    /// Length of the value stored at `key`.
    pub async fn strlen(&self, key: impl Into<Bytes>) -> Result<u64> {
        self.command_as(strlen(key)).await
    }

    /// Substring of the value at `key`, both ends inclusive.
    pub async fn getrange<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        start: i64,
        end: i64,
    ) -> Result<V> {
        self.command_as(getrange(key, start, end)).await
    }

    /// Overwrites part of the value at `key`. Returns the new length.
    pub async fn setrange(
        &self,
        key: impl Into<Bytes>,
        offset: u64,
        value: impl Into<Bytes>,
    ) -> Result<u64> {
        self.command_as(setrange(key, offset, value)).await
    }

    /// Increments the number stored at `key` by one.
    pub async fn incr(&self, key: impl Into<Bytes>) -> Result<i64> {
        self.command_as(incr(key)).await
    }

    /// Increments the number stored at `key` by `amount`.
    pub async fn incr_by(&self, key: impl Into<Bytes>, amount: i64) -> Result<i64> {
        self.command_as(incr_by(key, amount)).await
    }

    /// Increments the float stored at `key` by `amount`.
    pub async fn incr_by_float(&self, key: impl Into<Bytes>, amount: f64) -> Result<f64> {
        self.command_as(incr_by_float(key, amount)).await
    }

    /// Decrements the number stored at `key` by one.
    pub async fn decr(&self, key: impl Into<Bytes>) -> Result<i64> {
        self.command_as(decr(key)).await
    }

    /// Decrements the number stored at `key` by `amount`.
    pub async fn decr_by(&self, key: impl Into<Bytes>, amount: i64) -> Result<i64> {
        self.command_as(decr_by(key, amount)).await
    }
}
