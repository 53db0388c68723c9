use bytes::{Buf, Bytes, BytesMut};

use crate::proto::frame::Frame;

const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024; // 512 MB default

/// A RESP decoder that converts bytes to [`Frame`] types.
///
/// The decoder handles streaming input and can decode frames incrementally.
/// Call [`append`](Decoder::append) to add data, then [`decode`](Decoder::decode)
/// to parse frames. Returns `Ok(None)` when more data is needed. Elements of
/// an array are consumed as soon as they are complete, so a large reply that
/// arrives in many reads is parsed once, not again from its header on every
/// read.
///
/// # Example
///
/// ```
/// use redswitch::proto::codec::Decoder;
/// use redswitch::proto::frame::Frame;
///
/// let mut decoder = Decoder::new();
/// decoder.append(b"+OK\r\n");
/// let frame = decoder.decode().unwrap().unwrap();
/// assert_eq!(frame, Frame::SimpleString(b"OK".to_vec()));
/// ```
#[derive(Debug)]
pub struct Decoder {
    buf: BytesMut,
    max_frame_size: usize,
    // Arrays whose header has been read but not all of their elements.
    pending: Vec<PendingArray>,
    // Bytes of the unfinished frame already consumed from `buf`.
    consumed: usize,
    // `buf` must reach this length before another parse can make progress.
    need: usize,
}

#[derive(Debug)]
struct PendingArray {
    remaining: usize,
    items: Vec<Frame>,
}

/// One step of parsing at the front of the buffer.
enum Step {
    Frame(Frame, usize),
    ArrayStart(usize, usize),
    Incomplete(usize),
}

impl Decoder {
    /// Creates a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates a new decoder with a custom maximum frame size.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_size,
            pending: Vec::new(),
            consumed: 0,
            need: 0,
        }
    }

    /// Appends raw bytes to the internal buffer.
    ///
    /// Buffer size limits are checked during decode, not append.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Attempts to decode a frame from the buffer.
    ///
    /// Returns `Ok(Some(Frame))` if a complete frame was decoded.
    /// Returns `Ok(None)` if more data is needed.
    /// Returns `Err(...)` if the data is malformed.
    pub fn decode(&mut self) -> Result<Option<Frame>, String> {
        loop {
            if self.buf.is_empty() || self.buf.len() < self.need {
                return Ok(None);
            }

            if self.consumed + self.buf.len() > self.max_frame_size {
                return Err("Buffer size exceeded maximum frame size".to_string());
            }

            let frame = match self.step()? {
                Step::Incomplete(need) => {
                    self.need = need;
                    return Ok(None);
                }
                Step::ArrayStart(len, next) => {
                    self.consume(next);
                    // A hostile header must not reserve more than the data
                    // at hand can fill.
                    let capacity = len.min(self.buf.len() / 4);
                    self.pending.push(PendingArray {
                        remaining: len,
                        items: Vec::with_capacity(capacity),
                    });
                    continue;
                }
                Step::Frame(frame, next) => {
                    self.consume(next);
                    frame
                }
            };

            if let Some(frame) = self.complete(frame) {
                self.consumed = 0;
                return Ok(Some(frame));
            }
        }
    }

    fn consume(&mut self, n: usize) {
        self.buf.advance(n);
        self.consumed += n;
        self.need = 0;
    }

    /// Adds a finished element to the innermost open array, closing every
    /// array it fills. Returns the frame once nothing is left open.
    fn complete(&mut self, mut frame: Frame) -> Option<Frame> {
        while let Some(top) = self.pending.last_mut() {
            top.items.push(frame);
            top.remaining -= 1;
            if top.remaining > 0 {
                return None;
            }
            let done = self.pending.pop()?;
            frame = Frame::Array(done.items);
        }
        Some(frame)
    }

    /// Parses one token at the front of the buffer without consuming it.
    fn step(&self) -> Result<Step, String> {
        let Some(line_end) = self.find_crlf() else {
            return Ok(Step::Incomplete(self.buf.len() + 1));
        };
        let line = &self.buf[1..line_end];
        let next = line_end + 2;

        match self.buf[0] {
            b'+' => Ok(Step::Frame(Frame::SimpleString(line.to_vec()), next)),
            b'-' => Ok(Step::Frame(Frame::Error(line.to_vec()), next)),
            b':' => Ok(Step::Frame(Frame::Integer(parse_int(line)?), next)),
            b'$' => {
                let len = parse_int(line)?;
                if len == -1 {
                    return Ok(Step::Frame(Frame::BulkString(None), next));
                }
                if len < 0 {
                    return Err(format!("invalid bulk string length: {}", len));
                }
                let len = len as usize;
                if len > self.max_frame_size {
                    return Err("Bulk string length exceeds maximum frame size".to_string());
                }
                let end = next + len + 2;
                if self.buf.len() < end {
                    return Ok(Step::Incomplete(end));
                }
                if &self.buf[next + len..end] != b"\r\n" {
                    return Err("bulk string is not terminated by CRLF".to_string());
                }
                let data = Bytes::copy_from_slice(&self.buf[next..next + len]);
                Ok(Step::Frame(Frame::BulkString(Some(data)), end))
            }
            b'*' => {
                let len = parse_int(line)?;
                if len == -1 {
                    return Ok(Step::Frame(Frame::Null, next));
                }
                if len < 0 {
                    return Err(format!("invalid array length: {}", len));
                }
                let len = len as usize;
                // Assume minimum 16 bytes per item
                if len > self.max_frame_size / 16 {
                    return Err("Array length exceeds reasonable maximum".to_string());
                }
                if len == 0 {
                    return Ok(Step::Frame(Frame::Array(Vec::new()), next));
                }
                Ok(Step::ArrayStart(len, next))
            }
            other => Err(format!("unknown frame type: {}", other as char)),
        }
    }

    /// Returns the index of the first `\r` that starts a CRLF.
    fn find_crlf(&self) -> Option<usize> {
        self.buf.windows(2).position(|w| w == b"\r\n")
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_int(line: &[u8]) -> Result<i64, String> {
    std::str::from_utf8(line)
        .map_err(|e| e.to_string())?
        .parse::<i64>()
        .map_err(|e| format!("invalid integer {:?}: {}", String::from_utf8_lossy(line), e))
}
