use bytes::Bytes;

/// A RESP (Redis Serialization Protocol) frame.
///
/// This enum represents the reply kinds defined in RESP2:
/// - SimpleString: Status responses like "OK"
/// - Error: Error responses from the server
/// - Integer: Numeric responses
/// - BulkString: Binary-safe string data, `None` for the nil bulk string
/// - Array: Command arguments and array responses
/// - Null: the nil array
///
/// Frames are plain values; the reply parser consumes them and never
/// mutates one in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Simple string (+OK).
    SimpleString(Vec<u8>),
    /// Error (-ERR).
    Error(Vec<u8>),
    /// Integer (:1000).
    Integer(i64),
    /// Bulk string ($6\r\nfoobar).
    BulkString(Option<Bytes>),
    /// Array (*2\r\n...).
    Array(Vec<Frame>),
    /// Null ($-1 or *-1).
    Null,
}

impl Frame {
    /// Builds a bulk string frame from anything byte-like.
    #[inline]
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Frame::BulkString(Some(data.into()))
    }

    /// Builds a status frame.
    #[inline]
    pub fn status(text: &str) -> Self {
        Frame::SimpleString(text.as_bytes().to_vec())
    }

    /// Builds an error frame.
    #[inline]
    pub fn error(message: &str) -> Self {
        Frame::Error(message.as_bytes().to_vec())
    }

    /// Builds an array of bulk strings, the shape most list replies take.
    pub fn bulk_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Bytes>,
    {
        Frame::Array(items.into_iter().map(Frame::bulk).collect())
    }

    /// Returns true for both nil forms (nil bulk string and nil array).
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Frame::Null | Frame::BulkString(None))
    }

    /// Returns true if this is an error reply.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Frame::Error(_))
    }

    /// Short name of the reply kind, used in type error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::SimpleString(_) => "status",
            Frame::Error(_) => "error",
            Frame::Integer(_) => "integer",
            Frame::BulkString(Some(_)) => "bulk string",
            Frame::BulkString(None) | Frame::Null => "nil",
            Frame::Array(_) => "array",
        }
    }
}
