use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::core::command::{self, Cmd};
use crate::core::options::ConnectionOptions;
use crate::proto::codec::{Decoder, Encoder};
use crate::proto::frame::Frame;
use crate::{Error, Result};

const READ_CHUNK: usize = 4096;

/// A connection to a Redis server.
///
/// Wraps one duplex stream and handles RESP encoding and decoding. A
/// connection carries exactly one outstanding request at a time: callers
/// [`send`](Connection::send) one command and [`recv`](Connection::recv) its
/// reply before sending the next.
///
/// Once an I/O failure, a protocol violation or a timeout interrupts a
/// request the connection is marked broken for good. It is never revived;
/// the owner discards it. A request whose reply was never read, because the
/// future driving it was dropped, counts as broken too: the unread reply
/// would otherwise be handed to the next caller.
///
/// # Example
///
/// ```no_run
/// use redswitch::core::command;
/// use redswitch::core::connection::Connection;
/// use redswitch::core::options::ConnectionOptions;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let options = ConnectionOptions::from_url("redis://127.0.0.1:6379")?;
///     let mut conn = Connection::connect(&options).await?;
///     let pong = conn.request(&command::ping()).await?;
///     println!("{:?}", pong);
///     Ok(())
/// }
/// ```
pub struct Connection<S = TcpStream> {
    stream: S,
    decoder: Decoder,
    encoder: Encoder,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    broken: bool,
    // Set when a command is written, cleared once its reply is decoded.
    in_flight: bool,
    last_active: Instant,
}

impl Connection<TcpStream> {
    /// Opens a TCP connection and runs the setup handshake.
    ///
    /// The handshake sends `AUTH` (if a password is configured), `SELECT`
    /// (if a database is configured) and `CLIENT SETNAME` (if a name is
    /// configured), one request at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the connect timeout elapses,
    /// [`Error::Io`] if the TCP connect fails and [`Error::Auth`] if the
    /// server rejects the credentials.
    pub async fn connect(options: &ConnectionOptions) -> Result<Self> {
        let addr = options.socket_addr();
        debug!(%addr, "connecting");
        let stream = with_timeout(options.connect_timeout, "connect", async {
            TcpStream::connect(&addr)
                .await
                .map_err(|e| Error::Io { source: e })
        })
        .await?;
        stream.set_nodelay(true)?;

        let mut connection =
            Connection::new(stream).with_timeouts(options.read_timeout, options.write_timeout);
        connection.handshake(options).await?;
        Ok(connection)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection with the given stream.
    ///
    /// Initializes a connection with no timeouts configured.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: Decoder::new(),
            encoder: Encoder::new(),
            read_timeout: None,
            write_timeout: None,
            broken: false,
            in_flight: false,
            last_active: Instant::now(),
        }
    }

    /// Configures read and write timeouts for this connection.
    pub fn with_timeouts(
        mut self,
        read_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Self {
        self.read_timeout = read_timeout;
        self.write_timeout = write_timeout;
        self
    }

    /// Returns true once the connection can no longer be used.
    ///
    /// This includes a connection that still owes the reply to a command
    /// sent earlier.
    #[inline]
    pub fn is_broken(&self) -> bool {
        self.broken || self.in_flight
    }

    /// Marks the connection broken. There is no way back.
    pub fn mark_broken(&mut self) {
        if !self.broken {
            warn!("marking connection broken");
        }
        self.broken = true;
    }

    /// When the connection last completed a send or receive.
    #[inline]
    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    /// Serializes `cmd` and writes it to the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] without touching the stream if the
    /// connection is already broken or the previous reply was never read.
    /// Write failures and timeouts mark it broken.
    pub async fn send(&mut self, cmd: &Cmd) -> Result<()> {
        if self.in_flight {
            debug!("previous reply was never read");
            self.mark_broken();
        }
        self.ensure_usable()?;
        self.encoder.encode_command(cmd.as_args());
        let data = self.encoder.take();

        self.in_flight = true;
        let result = with_timeout(
            self.write_timeout,
            "write",
            write_all(&mut self.stream, &data),
        )
        .await;
        self.settle(result)
    }

    /// Reads exactly one reply from the stream.
    ///
    /// Waits for incoming data until a complete frame is decoded. An error
    /// reply is returned as [`Frame::Error`]; interpreting it is up to the
    /// reply parser.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the peer closes the stream or sends
    /// malformed data; read failures and timeouts are reported as such. All
    /// of them mark the connection broken.
    pub async fn recv(&mut self) -> Result<Frame> {
        self.ensure_usable()?;
        let result = with_timeout(
            self.read_timeout,
            "read",
            read_frame(&mut self.stream, &mut self.decoder),
        )
        .await;
        if result.is_ok() {
            self.in_flight = false;
        }
        self.settle(result)
    }

    /// Sends one command and waits for its reply.
    ///
    /// Dropping the returned future before it completes leaves the
    /// connection broken.
    pub async fn request(&mut self, cmd: &Cmd) -> Result<Frame> {
        self.send(cmd).await?;
        self.recv().await
    }

    async fn handshake(&mut self, options: &ConnectionOptions) -> Result<()> {
        if let Some(password) = &options.password {
            let cmd = match &options.username {
                Some(user) => command::auth_with_username(user.clone(), password.clone()),
                None => command::auth(password.clone()),
            };
            if let Frame::Error(e) = self.request(&cmd).await? {
                warn!(reply = %String::from_utf8_lossy(&e), "authentication rejected");
                self.mark_broken();
                return Err(Error::Auth);
            }
        }

        if let Some(db) = options.database {
            if let Frame::Error(e) = self.request(&command::select(db)).await? {
                self.mark_broken();
                return Err(Error::server(&e));
            }
        }

        if let Some(name) = &options.client_name {
            if let Frame::Error(e) = self.request(&command::client_setname(name.clone())).await? {
                self.mark_broken();
                return Err(Error::server(&e));
            }
        }

        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.broken {
            return Err(Error::Connection {
                message: "connection is broken".to_string(),
            });
        }
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_active = Instant::now(),
            Err(e) if e.is_connection_fatal() => {
                debug!(error = %e, "request interrupted");
                self.mark_broken();
            }
            Err(_) => {}
        }
        result
    }
}

impl<S> fmt::Debug for Connection<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("stream", &self.stream)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("broken", &self.broken)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

async fn write_all<S>(stream: &mut S, data: &[u8]) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

async fn read_frame<S>(stream: &mut S, decoder: &mut Decoder) -> Result<Frame>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_CHUNK];
    loop {
        if let Some(frame) = decoder
            .decode()
            .map_err(|message| Error::Protocol { message })?
        {
            return Ok(frame);
        }
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::Protocol {
                message: "connection closed".to_string(),
            });
        }
        decoder.append(&buf[..n]);
    }
}

pub(crate) async fn with_timeout<T, F>(limit: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout {
                message: format!("{} timed out after {:?}", what, limit),
            })?,
        None => fut.await,
    }
}
