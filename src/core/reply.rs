//! Reply decoding.
//!
//! [`FromReply`] turns one [`Frame`] into the Rust shape a command wrapper
//! asks for. It is the only place reply-to-value coercion happens: no I/O,
//! and a frame is consumed rather than mutated. Two rules apply to every
//! shape:
//!
//! - an error reply is always [`Error::Server`], whatever was requested;
//! - any other mismatch is [`Error::Type`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use bytes::Bytes;

use crate::proto::frame::Frame;
use crate::{Error, Result};

/// Decodes a reply frame into a concrete Rust type.
///
/// # Example
///
/// ```
/// use redswitch::core::reply::parse;
/// use redswitch::proto::frame::Frame;
///
/// let names: Vec<String> = parse(Frame::bulk_array(["a", "b", "c"])).unwrap();
/// assert_eq!(names, ["a", "b", "c"]);
///
/// let missing: Option<String> = parse(Frame::BulkString(None)).unwrap();
/// assert_eq!(missing, None);
/// ```
pub trait FromReply: Sized {
    /// Converts `frame` into `Self`.
    fn from_reply(frame: Frame) -> Result<Self>;
}

/// Parses `frame` into `T`.
#[inline]
pub fn parse<T: FromReply>(frame: Frame) -> Result<T> {
    T::from_reply(frame)
}

/// Parses a SCAN-family reply: `[cursor, [items...]]`.
///
/// Returns the next cursor (0 once the iteration is complete) and the
/// items decoded as `T`.
pub fn parse_scan_reply<T: FromReply>(frame: Frame) -> Result<(u64, T)> {
    let mut items = expect_array(frame, "scan reply")?;
    if items.len() != 2 {
        return Err(Error::type_error(format!(
            "scan reply must have 2 elements, got {}",
            items.len()
        )));
    }
    let batch = items.pop().unwrap_or(Frame::Null);
    let cursor = items.pop().unwrap_or(Frame::Null);

    let cursor = match cursor {
        Frame::BulkString(Some(b)) => parse_text::<u64>(&b, "cursor")?,
        Frame::Integer(n) if n >= 0 => n as u64,
        Frame::Error(e) => return Err(Error::server(&e)),
        other => return Err(mismatch("cursor", &other)),
    };

    if !matches!(batch, Frame::Array(_)) {
        return Err(mismatch("array of scanned items", &batch));
    }

    Ok((cursor, T::from_reply(batch)?))
}

/// Parses a flattened `[k1, v1, k2, v2, ...]` array into ordered pairs.
///
/// Used for replies such as `ZRANGE ... WITHSCORES` where order matters and
/// keys may repeat.
pub fn parse_pairs<K, V>(frame: Frame) -> Result<Vec<(K, V)>>
where
    K: FromReply,
    V: FromReply,
{
    let items = expect_array(frame, "flattened pairs")?;
    if items.len() % 2 != 0 {
        return Err(Error::type_error(format!(
            "flattened pairs must have an even number of elements, got {}",
            items.len()
        )));
    }
    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        pairs.push((K::from_reply(k)?, V::from_reply(v)?));
    }
    Ok(pairs)
}

fn mismatch(expected: &str, got: &Frame) -> Error {
    Error::type_error(format!("expected {}, got {} reply", expected, got.kind()))
}

fn expect_array(frame: Frame, expected: &str) -> Result<Vec<Frame>> {
    match frame {
        Frame::Array(items) => Ok(items),
        Frame::Error(e) => Err(Error::server(&e)),
        other => Err(mismatch(expected, &other)),
    }
}

fn parse_text<T: std::str::FromStr>(raw: &[u8], expected: &str) -> Result<T> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            Error::type_error(format!(
                "expected {}, got {:?}",
                expected,
                String::from_utf8_lossy(raw)
            ))
        })
}

impl FromReply for Frame {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Error(e) => Err(Error::server(&e)),
            other => Ok(other),
        }
    }
}

/// A status reply such as `+OK`.
impl FromReply for () {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::SimpleString(_) => Ok(()),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(mismatch("status", &other)),
        }
    }
}

impl FromReply for i64 {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Integer(n) => Ok(n),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromReply for u64 {
    fn from_reply(frame: Frame) -> Result<Self> {
        let n = i64::from_reply(frame)?;
        u64::try_from(n)
            .map_err(|_| Error::type_error(format!("expected non-negative integer, got {}", n)))
    }
}

impl FromReply for usize {
    fn from_reply(frame: Frame) -> Result<Self> {
        let n = i64::from_reply(frame)?;
        usize::try_from(n)
            .map_err(|_| Error::type_error(format!("expected non-negative integer, got {}", n)))
    }
}

/// Integer replies of exactly 0 or 1.
impl FromReply for bool {
    fn from_reply(frame: Frame) -> Result<Self> {
        match i64::from_reply(frame)? {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(Error::type_error(format!(
                "expected integer 0 or 1, got {}",
                n
            ))),
        }
    }
}

/// Doubles travel as text (scores, distances, INCRBYFLOAT results).
impl FromReply for f64 {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::BulkString(Some(b)) => parse_text(&b, "double"),
            Frame::SimpleString(s) => parse_text(&s, "double"),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl FromReply for String {
    fn from_reply(frame: Frame) -> Result<Self> {
        let raw = match frame {
            Frame::BulkString(Some(b)) => b.to_vec(),
            Frame::SimpleString(s) => s,
            Frame::Error(e) => return Err(Error::server(&e)),
            other => return Err(mismatch("string", &other)),
        };
        String::from_utf8(raw).map_err(|_| Error::type_error("string reply is not valid UTF-8"))
    }
}

impl FromReply for Bytes {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::BulkString(Some(b)) => Ok(b),
            Frame::SimpleString(s) => Ok(Bytes::from(s)),
            Frame::Error(e) => Err(Error::server(&e)),
            other => Err(mismatch("string", &other)),
        }
    }
}

/// Both nil forms decode to `None`.
impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(frame: Frame) -> Result<Self> {
        match frame {
            Frame::Error(e) => Err(Error::server(&e)),
            f if f.is_nil() => Ok(None),
            f => T::from_reply(f).map(Some),
        }
    }
}

impl<T: FromReply, U: FromReply> FromReply for (T, U) {
    fn from_reply(frame: Frame) -> Result<Self> {
        let items = expect_array(frame, "pair")?;
        if items.len() != 2 {
            return Err(Error::type_error(format!(
                "expected array of 2 elements, got {}",
                items.len()
            )));
        }
        let mut iter = items.into_iter();
        match (iter.next(), iter.next()) {
            (Some(a), Some(b)) => Ok((T::from_reply(a)?, U::from_reply(b)?)),
            _ => Err(Error::type_error("expected array of 2 elements")),
        }
    }
}

impl<T: FromReply, U: FromReply, V: FromReply> FromReply for (T, U, V) {
    fn from_reply(frame: Frame) -> Result<Self> {
        let items = expect_array(frame, "triple")?;
        if items.len() != 3 {
            return Err(Error::type_error(format!(
                "expected array of 3 elements, got {}",
                items.len()
            )));
        }
        let mut iter = items.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(a), Some(b), Some(c)) => Ok((
                T::from_reply(a)?,
                U::from_reply(b)?,
                V::from_reply(c)?,
            )),
            _ => Err(Error::type_error("expected array of 3 elements")),
        }
    }
}

impl<T: FromReply> FromReply for Vec<T> {
    fn from_reply(frame: Frame) -> Result<Self> {
        expect_array(frame, "array")?
            .into_iter()
            .map(T::from_reply)
            .collect()
    }
}

impl<T: FromReply + Eq + Hash> FromReply for HashSet<T> {
    fn from_reply(frame: Frame) -> Result<Self> {
        expect_array(frame, "array")?
            .into_iter()
            .map(T::from_reply)
            .collect()
    }
}

impl<K, V> FromReply for HashMap<K, V>
where
    K: FromReply + Eq + Hash,
    V: FromReply,
{
    fn from_reply(frame: Frame) -> Result<Self> {
        Ok(parse_pairs(frame)?.into_iter().collect())
    }
}

impl<K, V> FromReply for BTreeMap<K, V>
where
    K: FromReply + Ord,
    V: FromReply,
{
    fn from_reply(frame: Frame) -> Result<Self> {
        Ok(parse_pairs(frame)?.into_iter().collect())
    }
}
