use std::collections::HashMap;

use bytes::Bytes;

use super::ScanOptions;
use crate::core::command::{non_empty, non_empty_pairs, Cmd};
use crate::core::reply::{parse_pairs, FromReply};
use crate::{Client, Result};

/// Creates an HSET command.
#[inline]
pub fn hset(key: impl Into<Bytes>, field: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("HSET").arg(key).arg(field).arg(value)
}

/// Creates an HSETNX command.
#[inline]
pub fn hsetnx(key: impl Into<Bytes>, field: impl Into<Bytes>, value: impl Into<Bytes>) -> Cmd {
    Cmd::new("HSETNX").arg(key).arg(field).arg(value)
}

/// Creates an HGET command.
#[inline]
pub fn hget(key: impl Into<Bytes>, field: impl Into<Bytes>) -> Cmd {
    Cmd::new("HGET").arg(key).arg(field)
}

/// Creates an HMSET command.
pub fn hmset<I, F, V>(key: impl Into<Bytes>, fields: I) -> Result<Cmd>
where
    I: IntoIterator<Item = (F, V)>,
    F: Into<Bytes>,
    V: Into<Bytes>,
{
    let fields = non_empty_pairs("HMSET", fields)?;
    Ok(fields
        .into_iter()
        .fold(Cmd::new("HMSET").arg(key), |cmd, (f, v)| cmd.arg(f).arg(v)))
}

/// Creates an HMGET command.
pub fn hmget<I, F>(key: impl Into<Bytes>, fields: I) -> Result<Cmd>
where
    I: IntoIterator<Item = F>,
    F: Into<Bytes>,
{
    Ok(Cmd::new("HMGET")
        .arg(key)
        .args(non_empty("HMGET", "field", fields)?))
}

/// Creates an HGETALL command.
#[inline]
pub fn hgetall(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("HGETALL").arg(key)
}

/// Creates an HDEL command.
pub fn hdel<I, F>(key: impl Into<Bytes>, fields: I) -> Result<Cmd>
where
    I: IntoIterator<Item = F>,
    F: Into<Bytes>,
{
    Ok(Cmd::new("HDEL")
        .arg(key)
        .args(non_empty("HDEL", "field", fields)?))
}

/// Creates an HEXISTS command.
#[inline]
pub fn hexists(key: impl Into<Bytes>, field: impl Into<Bytes>) -> Cmd {
    Cmd::new("HEXISTS").arg(key).arg(field)
}

/// Creates an HLEN command.
#[inline]
pub fn hlen(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("HLEN").arg(key)
}

/// Creates an HKEYS command.
#[inline]
pub fn hkeys(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("HKEYS").arg(key)
}

/// Creates an HVALS command.
#[inline]
pub fn hvals(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("HVALS").arg(key)
}

/// Creates an HINCRBY command.
#[inline]
pub fn hincr_by(key: impl Into<Bytes>, field: impl Into<Bytes>, amount: i64) -> Cmd {
    Cmd::new("HINCRBY").arg(key).arg(field).arg_int(amount)
}

/// Creates an HINCRBYFLOAT command.
#[inline]
pub fn hincr_by_float(key: impl Into<Bytes>, field: impl Into<Bytes>, amount: f64) -> Cmd {
    Cmd::new("HINCRBYFLOAT").arg(key).arg(field).arg_float(amount)
}

/// Creates an HSCAN command.
#[inline]
pub fn hscan(key: impl Into<Bytes>, cursor: u64, options: &ScanOptions) -> Cmd {
    options.apply(Cmd::new("HSCAN").arg(key).arg(cursor.to_string()))
}

impl Client {
    /// Sets one field. Returns true if the field is new.
    pub async fn hset(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<bool> {
        let added: u64 = self.command_as(hset(key, field, value)).await?;
        Ok(added > 0)
    }

    /// Sets one field only if it does not exist yet.
    pub async fn hsetnx(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<bool> {
        self.command_as(hsetnx(key, field, value)).await
    }

    /// Value of one field.
    pub async fn hget<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
    ) -> Result<Option<V>> {
        self.command_as(hget(key, field)).await
    }

    /// Sets several fields at once.
    pub async fn hmset<I, F, V>(&self, key: impl Into<Bytes>, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.command_as(hmset(key, fields)?).await
    }

    /// Values of several fields, `None` for each missing one.
    pub async fn hmget<V, I, F>(&self, key: impl Into<Bytes>, fields: I) -> Result<Vec<Option<V>>>
    where
        V: FromReply,
        I: IntoIterator<Item = F>,
        F: Into<Bytes>,
    {
        self.command_as(hmget(key, fields)?).await
    }

    /// All fields and values.
    pub async fn hgetall<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<HashMap<String, V>> {
        self.command_as(hgetall(key)).await
    }

    /// Removes fields. Returns how many existed.
    pub async fn hdel<I, F>(&self, key: impl Into<Bytes>, fields: I) -> Result<u64>
    where
        I: IntoIterator<Item = F>,
        F: Into<Bytes>,
    {
        self.command_as(hdel(key, fields)?).await
    }

    /// Whether `field` exists.
    pub async fn hexists(&self, key: impl Into<Bytes>, field: impl Into<Bytes>) -> Result<bool> {
        self.command_as(hexists(key, field)).await
    }

    /// Number of fields.
    pub async fn hlen(&self, key: impl Into<Bytes>) -> Result<u64> {
        self.command_as(hlen(key)).await
    }

    /// All field names.
    pub async fn hkeys(&self, key: impl Into<Bytes>) -> Result<Vec<String>> {
        self.command_as(hkeys(key)).await
    }

    /// All values.
    pub async fn hvals<V: FromReply>(&self, key: impl Into<Bytes>) -> Result<Vec<V>> {
        self.command_as(hvals(key)).await
    }

    /// Increments an integer field.
    pub async fn hincr_by(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
        amount: i64,
    ) -> Result<i64> {
        self.command_as(hincr_by(key, field, amount)).await
    }

    /// Increments a float field.
    pub async fn hincr_by_float(
        &self,
        key: impl Into<Bytes>,
        field: impl Into<Bytes>,
        amount: f64,
    ) -> Result<f64> {
        self.command_as(hincr_by_float(key, field, amount)).await
    }

    /// One HSCAN step, yielding field/value pairs.
    pub async fn hscan<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(String, V)>)> {
        let (cursor, batch) = self.scan_frame(hscan(key, cursor, options)).await?;
        Ok((cursor, parse_pairs(batch)?))
    }
}
