use bytes::{BufMut, Bytes, BytesMut};

use crate::proto::frame::Frame;

/// A RESP encoder that converts [`Frame`]s and command argument lists to bytes.
///
/// The encoder accumulates data in an internal buffer and can be used
/// to encode multiple frames sequentially.
///
/// # Example
///
/// ```
/// use redswitch::proto::codec::Encoder;
/// use redswitch::proto::frame::Frame;
///
/// let mut encoder = Encoder::new();
/// encoder.encode(&Frame::SimpleString(b"OK".to_vec()));
/// let data = encoder.take();
/// assert_eq!(&data[..], b"+OK\r\n");
/// ```
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    /// Creates a new encoder with an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Encodes a frame into the internal buffer using RESP protocol.
    pub fn encode(&mut self, frame: &Frame) {
        match frame {
            Frame::SimpleString(s) => {
                self.buf.put_u8(b'+');
                self.buf.extend_from_slice(s);
                self.buf.extend_from_slice(b"\r\n");
            }
            Frame::Error(e) => {
                self.buf.put_u8(b'-');
                self.buf.extend_from_slice(e);
                self.buf.extend_from_slice(b"\r\n");
            }
            Frame::Integer(n) => {
                self.buf.put_u8(b':');
                self.put_decimal(*n as i128);
            }
            Frame::BulkString(Some(data)) => self.put_bulk(data),
            Frame::BulkString(None) | Frame::Null => {
                self.buf.extend_from_slice(b"$-1\r\n");
            }
            Frame::Array(a) => {
                self.buf.put_u8(b'*');
                self.put_decimal(a.len() as i128);
                for item in a {
                    self.encode(item);
                }
            }
        }
    }

    /// Encodes a command argument list as an array of bulk strings.
    ///
    /// This is the request form every command takes on the wire; it skips
    /// building an intermediate [`Frame`] tree.
    pub fn encode_command(&mut self, args: &[Bytes]) {
        self.buf.put_u8(b'*');
        self.put_decimal(args.len() as i128);
        for arg in args {
            self.put_bulk(arg);
        }
    }

    /// Takes the encoded data from the buffer, leaving it empty.
    pub fn take(&mut self) -> BytesMut {
        self.buf.split()
    }

    fn put_bulk(&mut self, data: &[u8]) {
        self.buf.reserve(data.len() + 16);
        self.buf.put_u8(b'$');
        self.put_decimal(data.len() as i128);
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
    }

    fn put_decimal(&mut self, n: i128) {
        self.buf.extend_from_slice(n.to_string().as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
