use std::io;

use thiserror::Error;

/// Result type alias for redswitch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to a Redis server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An IO error occurred.
    #[error("IO error: {source}")]
    Io {
        /// The underlying IO error.
        #[from]
        source: io::Error,
    },

    /// A protocol error occurred.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the error.
        message: String,
    },

    /// The dedicated connection of a single-connection client is broken.
    ///
    /// The client never reconnects on its own; build a new client instead.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the error.
        message: String,
    },

    /// The pool is at capacity and the caller asked not to wait.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// A wait budget elapsed (pool checkout, connect, read or write).
    #[error("timeout: {message}")]
    Timeout {
        /// What timed out.
        message: String,
    },

    /// The server returned an error.
    #[error("server error: {message}")]
    Server {
        /// Error message from server.
        message: String,
    },

    /// The reply did not have the shape the caller asked for.
    #[error("type error: {message}")]
    Type {
        /// Description of the mismatch.
        message: String,
    },

    /// Authentication failed.
    #[error("authentication failed")]
    Auth,

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of invalid argument.
        message: String,
    },
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Error::Type {
            message: message.into(),
        }
    }

    pub(crate) fn server(message: &[u8]) -> Self {
        Error::Server {
            message: String::from_utf8_lossy(message).into_owned(),
        }
    }

    /// Returns true if this error means the stream can no longer be trusted.
    ///
    /// Server and type errors leave the connection in sync; everything that
    /// interrupted a read or write does not.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Error::Io { .. } | Error::Protocol { .. } | Error::Timeout { .. }
        )
    }
}
