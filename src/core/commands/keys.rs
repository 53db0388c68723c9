use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::ScanOptions;
use crate::core::command::{non_empty, Cmd};
use crate::core::reply::{parse, FromReply};
use crate::proto::frame::Frame;
use crate::{Client, Error, Result};

/// Remaining time to live of a key, as reported by PTTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    NoKey,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after this long.
    Expires(Duration),
}

impl FromReply for Ttl {
    fn from_reply(frame: Frame) -> Result<Self> {
        match i64::from_reply(frame)? {
            -2 => Ok(Ttl::NoKey),
            -1 => Ok(Ttl::Persistent),
            ms if ms >= 0 => Ok(Ttl::Expires(Duration::from_millis(ms as u64))),
            other => Err(Error::type_error(format!("unexpected PTTL reply {}", other))),
        }
    }
}

pub(crate) fn millis(d: Duration) -> String {
    d.as_millis().to_string()
}

/// Creates a DEL command.
pub fn del<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("DEL").args(non_empty("DEL", "key", keys)?))
}

/// Creates an UNLINK command.
pub fn unlink<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("UNLINK").args(non_empty("UNLINK", "key", keys)?))
}

/// Creates an EXISTS command.
pub fn exists<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("EXISTS").args(non_empty("EXISTS", "key", keys)?))
}

/// Creates a TOUCH command.
pub fn touch<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("TOUCH").args(non_empty("TOUCH", "key", keys)?))
}

/// Creates a TYPE command.
#[inline]
pub fn key_type(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("TYPE").arg(key)
}

/// Creates a PEXPIRE command.
#[inline]
pub fn expire(key: impl Into<Bytes>, ttl: Duration) -> Cmd {
    Cmd::new("PEXPIRE").arg(key).arg(millis(ttl))
}

/// Creates a PEXPIREAT command.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for a time before the Unix epoch.
pub fn expire_at(key: impl Into<Bytes>, at: SystemTime) -> Result<Cmd> {
    let since_epoch = at
        .duration_since(UNIX_EPOCH)
        .map_err(|_| Error::invalid_argument("PEXPIREAT: time is before the Unix epoch"))?;
    Ok(Cmd::new("PEXPIREAT").arg(key).arg(millis(since_epoch)))
}

/// Creates a PTTL command.
#[inline]
pub fn pttl(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("PTTL").arg(key)
}

/// Creates a PERSIST command.
#[inline]
pub fn persist(key: impl Into<Bytes>) -> Cmd {
    Cmd::new("PERSIST").arg(key)
}

/// Creates a RENAME command.
#[inline]
pub fn rename(key: impl Into<Bytes>, newkey: impl Into<Bytes>) -> Cmd {
    Cmd::new("RENAME").arg(key).arg(newkey)
}

/// Creates a RENAMENX command.
#[inline]
pub fn renamenx(key: impl Into<Bytes>, newkey: impl Into<Bytes>) -> Cmd {
    Cmd::new("RENAMENX").arg(key).arg(newkey)
}

/// Creates a KEYS command.
#[inline]
pub fn keys(pattern: impl Into<Bytes>) -> Cmd {
    Cmd::new("KEYS").arg(pattern)
}

/// Creates a SCAN command.
#[inline]
pub fn scan(cursor: u64, options: &ScanOptions) -> Cmd {
    options.apply(Cmd::new("SCAN").arg(cursor.to_string()))
}

impl Client {
    /// Removes the specified keys. Returns how many existed.
    pub async fn del<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(del(keys)?).await
    }

    /// Removes the specified keys, reclaiming memory in the background.
    pub async fn unlink<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(unlink(keys)?).await
    }

    /// Counts how many of the given keys exist.
    pub async fn exists<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(exists(keys)?).await
    }

    /// Updates the last access time of the given keys.
    pub async fn touch<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(touch(keys)?).await
    }

    /// Returns the type name of the value stored at `key` (`none` if absent).
    pub async fn key_type(&self, key: impl Into<Bytes>) -> Result<String> {
        self.command_as(key_type(key)).await
    }

    /// Sets a time to live on `key`. Returns false if the key does not exist.
    pub async fn expire(&self, key: impl Into<Bytes>, ttl: Duration) -> Result<bool> {
        self.command_as(expire(key, ttl)).await
    }

    /// Expires `key` at an absolute time.
    pub async fn expire_at(&self, key: impl Into<Bytes>, at: SystemTime) -> Result<bool> {
        self.command_as(expire_at(key, at)?).await
    }

    /// Remaining time to live of `key`.
    pub async fn ttl(&self, key: impl Into<Bytes>) -> Result<Ttl> {
        self.command_as(pttl(key)).await
    }

    /// Removes the expiry from `key`.
    pub async fn persist(&self, key: impl Into<Bytes>) -> Result<bool> {
        self.command_as(persist(key)).await
    }

    /// Renames `key`, overwriting `newkey`.
    pub async fn rename(&self, key: impl Into<Bytes>, newkey: impl Into<Bytes>) -> Result<()> {
        self.command_as(rename(key, newkey)).await
    }

    /// Renames `key` only if `newkey` does not exist.
    pub async fn renamenx(&self, key: impl Into<Bytes>, newkey: impl Into<Bytes>) -> Result<bool> {
        self.command_as(renamenx(key, newkey)).await
    }

    /// Returns all keys matching `pattern`.
    pub async fn keys(&self, pattern: impl Into<Bytes>) -> Result<Vec<String>> {
        self.command_as(keys(pattern)).await
    }

    /// One SCAN step. Start with cursor 0; iteration is complete when the
    /// returned cursor is 0 again.
    pub async fn scan(&self, cursor: u64, options: &ScanOptions) -> Result<(u64, Vec<String>)> {
        let (cursor, batch) = self.scan_frame(scan(cursor, options)).await?;
        Ok((cursor, parse(batch)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::words;

    #[test]
    fn test_multi_key_guards() {
        let none: Vec<&'static str> = Vec::new();
        for result in [
            del(none.clone()),
            unlink(none.clone()),
            exists(none.clone()),
            touch(none),
        ] {
            assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        }
    }

    #[test]
    fn test_del_cmd() {
        assert_eq!(words(&del(["a", "b"]).unwrap()), ["DEL", "a", "b"]);
        let owned = vec![String::from("x")];
        assert_eq!(words(&exists(owned).unwrap()), ["EXISTS", "x"]);
    }

    #[test]
    fn test_expire_uses_milliseconds() {
        let cmd = expire("k", Duration::from_secs(2));
        assert_eq!(words(&cmd), ["PEXPIRE", "k", "2000"]);

        let at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        assert_eq!(
            words(&expire_at("k", at).unwrap()),
            ["PEXPIREAT", "k", "1700000000123"]
        );
    }

    #[test]
    fn test_expire_at_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert!(matches!(
            expire_at("k", before),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_ttl_reply() {
        assert_eq!(parse::<Ttl>(Frame::Integer(-2)).unwrap(), Ttl::NoKey);
        assert_eq!(parse::<Ttl>(Frame::Integer(-1)).unwrap(), Ttl::Persistent);
        assert_eq!(
            parse::<Ttl>(Frame::Integer(1500)).unwrap(),
            Ttl::Expires(Duration::from_millis(1500))
        );
        assert!(matches!(
            parse::<Ttl>(Frame::Integer(-7)),
            Err(Error::Type { .. })
        ));
    }

    #[test]
    fn test_scan_cmd() {
        let options = ScanOptions::default().matching("s*");
        assert_eq!(words(&scan(42, &options)), ["SCAN", "42", "MATCH", "s*"]);
    }
}
