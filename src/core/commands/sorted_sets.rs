use bytes::Bytes;

use super::ScanOptions;
use crate::core::command::{format_float, non_empty, Cmd};
use crate::core::reply::{parse_pairs, FromReply};
use crate::{Client, Error, Result};

/// Which members ZADD may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateType {
    /// Add new members and update existing ones.
    #[default]
    Always,
    /// Only update existing members (`XX`).
    Exists,
    /// Only add new members (`NX`).
    NotExists,
}

/// One end of a score interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// The score itself is included.
    Inclusive(f64),
    /// The score itself is excluded.
    Exclusive(f64),
}

impl ScoreBound {
    /// Lower end of an unbounded interval.
    pub const NEG_INFINITY: ScoreBound = ScoreBound::Inclusive(f64::NEG_INFINITY);
    /// Upper end of an unbounded interval.
    pub const INFINITY: ScoreBound = ScoreBound::Inclusive(f64::INFINITY);

    fn to_arg(self) -> String {
        match self {
            ScoreBound::Inclusive(score) => format_float(score),
            ScoreBound::Exclusive(score) => format!("({}", format_float(score)),
        }
    }
}

/// How ZUNIONSTORE / ZINTERSTORE combine scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// Add the scores.
    #[default]
    Sum,
    /// Keep the lowest score.
    Min,
    /// Keep the highest score.
    Max,
}

impl Aggregation {
    fn as_str(self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
        }
    }
}

/// `LIMIT offset count` for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Number of matching elements to skip.
    pub offset: u64,
    /// Maximum number of elements to return.
    pub count: u64,
}

/// Creates a ZADD command from `(member, score)` pairs.
///
/// With `changed` set the reply counts updated members as well as added
/// ones (`CH`).
pub fn zadd<I, M>(
    key: impl Into<Bytes>,
    members: I,
    update: UpdateType,
    changed: bool,
) -> Result<Cmd>
where
    I: IntoIterator<Item = (M, f64)>,
    M: Into<Bytes>,
{
    let members: Vec<(M, f64)> = members.into_iter().collect();
    if members.is_empty() {
        return Err(Error::invalid_argument("ZADD: no member specified"));
    }

    let cmd = Cmd::new("ZADD").arg(key);
    let cmd = match update {
        UpdateType::Always => cmd,
        UpdateType::Exists => cmd.arg("XX"),
        UpdateType::NotExists => cmd.arg("NX"),
    };
    let cmd = cmd.arg_if(changed, "CH");
    Ok(members
        .into_iter()
        .fold(cmd, |cmd, (member, score)| cmd.arg_float(score).arg(member)))
}

/// Creates a ZREM command.
pub fn zrem<I, M>(key: impl Into<Bytes>, members: I) -> Result<Cmd>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    Ok(Cmd::new("ZREM")
        .arg(key)
        .args(non_empty("ZREM", "member", members)?))
}

/// Creates a ZSCORE command.
#[inline]
pub fn zscore(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Cmd {
    Cmd::new("ZSCORE").arg(key).arg(member)
}

/// Creates a ZCARD command.
#[inline]
pub fn zcard(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("ZCARD").arg(key)
}

/// Creates a ZCOUNT command.
#[inline]
pub fn zcount(key: impl Into<Bytes>, min: ScoreBound, max: ScoreBound) -> Cmd {
    Cmd::new("ZCOUNT").arg(key).arg(min.to_arg()).arg(max.to_arg())
}

/// Creates a ZINCRBY command.
#[inline]
pub fn zincrby(key: impl Into<Bytes>, increment: f64, member: impl Into<Bytes>) -> Cmd {
    Cmd::new("ZINCRBY").arg(key).arg_float(increment).arg(member)
}

/// Creates a ZRANK command.
#[inline]
pub fn zrank(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Cmd {
    Cmd::new("ZRANK").arg(key).arg(member)
}

/// Creates a ZREVRANK command.
#[inline]
pub fn zrevrank(key: impl Into<Bytes>, member: impl Into<Bytes>) -> Cmd {
    Cmd::new("ZREVRANK").arg(key).arg(member)
}

/// Creates a ZRANGE command.
#[inline]
pub fn zrange(key: impl Into<Bytes>, start: i64, stop: i64) -> Cmd {
    Cmd::new("ZRANGE").arg(key).arg_int(start).arg_int(stop)
}

/// Creates a ZRANGE ... WITHSCORES command.
#[inline]
pub fn zrange_withscores(key: impl Into<Bytes>, start: i64, stop: i64) -> Cmd {
    zrange(key, start, stop).arg("WITHSCORES")
}

/// Creates a ZREVRANGE command.
#[inline]
pub fn zrevrange(key: impl Into<Bytes>, start: i64, stop: i64) -> Cmd {
    Cmd::new("ZREVRANGE").arg(key).arg_int(start).arg_int(stop)
}

/// Creates a ZRANGEBYSCORE command.
pub fn zrangebyscore(
    key: impl Into<Bytes>,
    min: ScoreBound,
    max: ScoreBound,
    limit: Option<Limit>,
) -> Cmd {
    let cmd = Cmd::new("ZRANGEBYSCORE")
        .arg(key)
        .arg(min.to_arg())
        .arg(max.to_arg());
    match limit {
        Some(limit) => cmd
            .arg("LIMIT")
            .arg(limit.offset.to_string())
            .arg(limit.count.to_string()),
        None => cmd,
    }
}

/// Creates a ZREMRANGEBYSCORE command.
#[inline]
pub fn zremrangebyscore(key: impl Into<Bytes>, min: ScoreBound, max: ScoreBound) -> Cmd {
    Cmd::new("ZREMRANGEBYSCORE")
        .arg(key)
        .arg(min.to_arg())
        .arg(max.to_arg())
}

/// Creates a ZPOPMIN command.
#[inline]
pub fn zpopmin(key: impl Into<Bytes>, count: u64) -> Cmd {
    Cmd::new("ZPOPMIN").arg(key).arg(count.to_string())
}

/// Creates a ZPOPMAX command.
#[inline]
pub fn zpopmax(key: impl Into<Bytes>, count: u64) -> Cmd {
    Cmd::new("ZPOPMAX").arg(key).arg(count.to_string())
}

fn combine_store<I, K>(
    name: &'static str,
    destination: Bytes,
    keys: I,
    aggregation: Aggregation,
) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    let keys = non_empty(name, "key", keys)?;
    Ok(Cmd::new(name)
        .arg(destination)
        .arg(keys.len().to_string())
        .args(keys)
        .arg("AGGREGATE")
        .arg(aggregation.as_str()))
}

/// Creates a ZUNIONSTORE command.
pub fn zunionstore<I, K>(
    destination: impl Into<Bytes>,
    keys: I,
    aggregation: Aggregation,
) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    combine_store("ZUNIONSTORE", destination.into(), keys, aggregation)
}

/// Creates a ZINTERSTORE command.
pub fn zinterstore<I, K>(
    destination: impl Into<Bytes>,
    keys: I,
    aggregation: Aggregation,
) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    combine_store("ZINTERSTORE", destination.into(), keys, aggregation)
}

/// Creates a ZSCAN command.
#[inline]
pub fn zscan(key: impl Into<Bytes>, cursor: u64, options: &ScanOptions) -> Cmd {
    options.apply(Cmd::new("ZSCAN").arg(key).arg(cursor.to_string()))
}

impl Client {
    /// Adds or updates members with their scores.
    pub async fn zadd<I, M>(
        &self,
        key: impl Into<Bytes>,
        members: I,
        update: UpdateType,
        changed: bool,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = (M, f64)>,
        M: Into<Bytes>,
    {
        self.command_as(zadd(key, members, update, changed)?).await
    }

    /// Removes members. Returns how many were present.
    pub async fn zrem<I, M>(&self, key: impl Into<Bytes>, members: I) -> Result<u64>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        self.command_as(zrem(key, members)?).await
    }

    /// Score of `member`.
    pub async fn zscore(&self, key: impl Into<Bytes>, member: impl Into<Bytes>) -> Result<Option<f64>> {
        self.command_as(zscore(key, member)).await
    }

    /// Number of members.
    pub async fn zcard(&self, key: impl Into<Bytes>) -> Result<u64> {
        self.command_as(zcard(key)).await
    }

    /// Number of members with a score in the interval.
    pub async fn zcount(&self, key: impl Into<Bytes>, min: ScoreBound, max: ScoreBound) -> Result<u64> {
        self.command_as(zcount(key, min, max)).await
    }

    /// Adds `increment` to the score of `member`. Returns the new score.
    pub async fn zincrby(
        &self,
        key: impl Into<Bytes>,
        increment: f64,
        member: impl Into<Bytes>,
    ) -> Result<f64> {
        self.command_as(zincrby(key, increment, member)).await
    }

    /// Rank of `member`, lowest score first.
    pub async fn zrank(&self, key: impl Into<Bytes>, member: impl Into<Bytes>) -> Result<Option<u64>> {
        self.command_as(zrank(key, member)).await
    }

    /// Rank of `member`, highest score first.
    pub async fn zrevrank(&self, key: impl Into<Bytes>, member: impl Into<Bytes>) -> Result<Option<u64>> {
        self.command_as(zrevrank(key, member)).await
    }

    /// Members by rank, lowest score first.
    pub async fn zrange<V: FromReply>(&self, key: impl Into<Bytes>, start: i64, stop: i64) -> Result<Vec<V>> {
        self.command_as(zrange(key, start, stop)).await
    }

    /// Members with scores by rank, lowest score first.
    pub async fn zrange_withscores<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(V, f64)>> {
        parse_pairs(self.command(zrange_withscores(key, start, stop)).await?)
    }

    /// Members by rank, highest score first.
    pub async fn zrevrange<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<V>> {
        self.command_as(zrevrange(key, start, stop)).await
    }

    /// Members with a score in the interval, lowest first.
    pub async fn zrangebyscore<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<Limit>,
    ) -> Result<Vec<V>> {
        self.command_as(zrangebyscore(key, min, max, limit)).await
    }

    /// Removes members with a score in the interval.
    pub async fn zremrangebyscore(
        &self,
        key: impl Into<Bytes>,
        min: ScoreBound,
        max: ScoreBound,
    ) -> Result<u64> {
        self.command_as(zremrangebyscore(key, min, max)).await
    }

    /// Removes and returns up to `count` lowest-scored members.
    pub async fn zpopmin<V: FromReply>(&self, key: impl Into<Bytes>, count: u64) -> Result<Vec<(V, f64)>> {
        parse_pairs(self.command(zpopmin(key, count)).await?)
    }

    /// Removes and returns up to `count` highest-scored members.
    pub async fn zpopmax<V: FromReply>(&self, key: impl Into<Bytes>, count: u64) -> Result<Vec<(V, f64)>> {
        parse_pairs(self.command(zpopmax(key, count)).await?)
    }

    /// Stores the union of sorted sets. Returns the size of the result.
    pub async fn zunionstore<I, K>(
        &self,
        destination: impl Into<Bytes>,
        keys: I,
        aggregation: Aggregation,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(zunionstore(destination, keys, aggregation)?).await
    }

    /// Stores the intersection of sorted sets. Returns the size of the result.
    pub async fn zinterstore<I, K>(
        &self,
        destination: impl Into<Bytes>,
        keys: I,
        aggregation: Aggregation,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(zinterstore(destination, keys, aggregation)?).await
    }

    /// One ZSCAN step, yielding members with their scores.
    pub async fn zscan<V: FromReply>(
        &self,
        key: impl Into<Bytes>,
        cursor: u64,
        options: &ScanOptions,
    ) -> Result<(u64, Vec<(V, f64)>)> {
        let (cursor, batch) = self.scan_frame(zscan(key, cursor, options)).await?;
        Ok((cursor, parse_pairs(batch)?))
    }
}
