use bytes::Bytes;

use crate::core::command::{non_empty, Cmd};
use crate::{Client, Result};

/// Creates a PFADD command.
pub fn pfadd<I, E>(key: impl Into<Bytes>, elements: I) -> Result<Cmd>
where
    I: IntoIterator<Item = E>,
    E: Into<Bytes>,
{
    Ok(Cmd::new("PFADD")
        .arg(key)
        .args(non_empty("PFADD", "element", elements)?))
}

/// Creates a PFCOUNT command.
pub fn pfcount<I, K>(keys: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("PFCOUNT").args(non_empty("PFCOUNT", "key", keys)?))
}

/// Creates a PFMERGE command.
pub fn pfmerge<I, K>(destination: impl Into<Bytes>, sources: I) -> Result<Cmd>
where
    I: IntoIterator<Item = K>,
    K: Into<Bytes>,
{
    Ok(Cmd::new("PFMERGE")
        .arg(destination)
        .args(non_empty("PFMERGE", "key", sources)?))
}

impl Client {
    /// Adds elements. Returns true if the estimate changed.
    pub async fn pfadd<I, E>(&self, key: impl Into<Bytes>, elements: I) -> Result<bool>
    where
        I: IntoIterator<Item = E>,
        E: Into<Bytes>,
    {
        self.command_as(pfadd(key, elements)?).await
    }

    /// Approximate cardinality of the union of the given HyperLogLogs.
    pub async fn pfcount<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(pfcount(keys)?).await
    }

    /// Merges `sources` into `destination`.
    pub async fn pfmerge<I, K>(&self, destination: impl Into<Bytes>, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<Bytes>,
    {
        self.command_as(pfmerge(destination, sources)?).await
    }
}
