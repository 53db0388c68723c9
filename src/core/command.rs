use bytes::Bytes;

use crate::proto::frame::Frame;
use crate::{Error, Result};

/// A command ready to be sent to Redis.
///
/// A `Cmd` is the command-argument list: the command name followed by its
/// arguments, each an opaque byte string. It is built per call, consumed by
/// serialization and never kept.
///
/// # Example
///
/// ```
/// use redswitch::core::command::{self, Cmd};
///
/// let cmd = Cmd::new("SET").arg("key").arg("value");
/// assert_eq!(cmd.name(), "SET");
///
/// let ping = command::ping();
/// assert_eq!(ping.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    args: Vec<Bytes>,
}

impl Cmd {
    /// Creates a new command with the given name.
    #[inline]
    pub fn new(name: impl Into<Bytes>) -> Self {
        Self {
            args: vec![name.into()],
        }
    }

    /// Appends an argument to the command.
    #[inline]
    pub fn arg<T: Into<Bytes>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends every item of `args`.
    #[inline]
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends an integer argument in decimal form.
    #[inline]
    pub fn arg_int(self, n: i64) -> Self {
        self.arg(n.to_string())
    }

    /// Appends a floating point argument.
    ///
    /// Infinities use the `+inf` / `-inf` spelling Redis expects.
    #[inline]
    pub fn arg_float(self, f: f64) -> Self {
        self.arg(format_float(f))
    }

    /// Appends `arg` only when `cond` holds.
    #[inline]
    pub fn arg_if<T: Into<Bytes>>(self, cond: bool, arg: T) -> Self {
        if cond {
            self.arg(arg)
        } else {
            self
        }
    }

    /// The command name, lossily decoded.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).into_owned()
    }

    /// The full argument list, command name first.
    #[inline]
    pub fn as_args(&self) -> &[Bytes] {
        &self.args
    }

    /// Number of arguments including the command name.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always false; a command carries at least its name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Converts the command to a RESP Array frame.
    #[inline]
    pub fn into_frame(self) -> Frame {
        Frame::Array(
            self.args
                .into_iter()
                .map(|b| Frame::BulkString(Some(b)))
                .collect(),
        )
    }
}

pub(crate) fn format_float(f: f64) -> String {
    if f == f64::INFINITY {
        "+inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        f.to_string()
    }
}

/// Collects `items` and rejects an empty collection before any I/O happens.
///
/// Every command taking a variable number of keys or members funnels its
/// collection through here.
pub(crate) fn non_empty<I, T>(command: &str, what: &str, items: I) -> Result<Vec<Bytes>>
where
    I: IntoIterator<Item = T>,
    T: Into<Bytes>,
{
    let items: Vec<Bytes> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        return Err(Error::invalid_argument(format!(
            "{}: no {} specified",
            command, what
        )));
    }
    Ok(items)
}

/// Same as [`non_empty`] for key/value style pairs.
pub(crate) fn non_empty_pairs<I, K, V>(command: &str, items: I) -> Result<Vec<(Bytes, Bytes)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Bytes>,
    V: Into<Bytes>,
{
    let items: Vec<(Bytes, Bytes)> = items
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    if items.is_empty() {
        return Err(Error::invalid_argument(format!(
            "{}: no key specified",
            command
        )));
    }
    Ok(items)
}

// CONNECTION commands.

/// Creates a PING command.
#[inline]
pub fn ping() -> Cmd {
    Cmd::new("PING")
}

/// Creates an ECHO command.
#[inline]
pub fn echo(msg: impl Into<Bytes>) -> Cmd {
    Cmd::new("ECHO").arg(msg)
}

/// Creates an AUTH command with password only.
#[inline]
pub fn auth(password: impl Into<Bytes>) -> Cmd {
    Cmd::new("AUTH").arg(password)
}

/// Creates an AUTH command with username and password (ACL style).
#[inline]
pub fn auth_with_username(username: impl Into<Bytes>, password: impl Into<Bytes>) -> Cmd {
    Cmd::new("AUTH").arg(username).arg(password)
}

/// Creates a SELECT command.
#[inline]
pub fn select(db: u8) -> Cmd {
    Cmd::new("SELECT").arg(db.to_string())
}

/// Creates a CLIENT SETNAME command.
#[inline]
pub fn client_setname(name: impl Into<Bytes>) -> Cmd {
    Cmd::new("CLIENT").arg("SETNAME").arg(name)
}
