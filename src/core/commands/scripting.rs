use bytes::Bytes;

use crate::core::command::{non_empty, Cmd};
use crate::core::reply::FromReply;
use crate::{Client, Result};

fn script_call<K, A>(name: &'static str, body: Bytes, keys: K, args: A) -> Cmd
where
    K: IntoIterator,
    K::Item: Into<Bytes>,
    A: IntoIterator,
    A::Item: Into<Bytes>,
{
    let keys: Vec<Bytes> = keys.into_iter().map(Into::into).collect();
    Cmd::new(name)
        .arg(body)
        .arg(keys.len().to_string())
        .args(keys)
        .args(args)
}

/// Creates an EVAL command. Scripts may take no keys.
pub fn eval<K, A>(script: impl Into<Bytes>, keys: K, args: A) -> Cmd
where
    K: IntoIterator,
    K::Item: Into<Bytes>,
    A: IntoIterator,
    A::Item: Into<Bytes>,
{
    script_call("EVAL", script.into(), keys, args)
}

/// Creates an EVALSHA command.
pub fn evalsha<K, A>(sha1: impl Into<Bytes>, keys: K, args: A) -> Cmd
where
    K: IntoIterator,
    K::Item: Into<Bytes>,
    A: IntoIterator,
    A::Item: Into<Bytes>,
{
    script_call("EVALSHA", sha1.into(), keys, args)
}

/// Creates a SCRIPT LOAD command.
#[inline]
pub fn script_load(script: impl Into<Bytes>) -> Cmd {
    Cmd::new("SCRIPT").arg("LOAD").arg(script)
}

/// Creates a SCRIPT EXISTS command.
pub fn script_exists<I, S>(sha1s: I) -> Result<Cmd>
where
    I: IntoIterator<Item = S>,
    S: Into<Bytes>,
{
    Ok(Cmd::new("SCRIPT")
        .arg("EXISTS")
        .args(non_empty("SCRIPT EXISTS", "sha1", sha1s)?))
}

/// Creates a SCRIPT FLUSH command.
#[inline]
pub fn script_flush() -> Cmd {
    Cmd::new("SCRIPT").arg("FLUSH")
}

impl Client {
    /// Runs a Lua script and parses its result into `T`.
    pub async fn eval<T, K, A>(&self, script: impl Into<Bytes>, keys: K, args: A) -> Result<T>
    where
        T: FromReply,
        K: IntoIterator,
        K::Item: Into<Bytes>,
        A: IntoIterator,
        A::Item: Into<Bytes>,
    {
        self.command_as(eval(script, keys, args)).await
    }

    /// Runs a cached script by its SHA1 digest.
    pub async fn evalsha<T, K, A>(&self, sha1: impl Into<Bytes>, keys: K, args: A) -> Result<T>
    where
        T: FromReply,
        K: IntoIterator,
        K::Item: Into<Bytes>,
        A: IntoIterator,
        A::Item: Into<Bytes>,
    {
        self.command_as(evalsha(sha1, keys, args)).await
    }

    /// Caches a script. Returns its SHA1 digest.
    pub async fn script_load(&self, script: impl Into<Bytes>) -> Result<String> {
        self.command_as(script_load(script)).await
    }

    /// Which of the digests are cached.
    pub async fn script_exists<I, S>(&self, sha1s: I) -> Result<Vec<bool>>
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        self.command_as(script_exists(sha1s)?).await
    }

    /// Empties the script cache.
    pub async fn script_flush(&self) -> Result<()> {
        self.command_as(script_flush()).await
    }
}
