use std::time::Duration;

use crate::core::connection::Connection;
use crate::core::options::{ConnectionOptions, PoolOptions};
use crate::core::pool::ConnectionPool;
use crate::{Client, Error, Result};

/// Builder for configuring and creating a [`Client`].
///
/// Without [`pool`](ClientBuilder::pool) the client owns one dedicated
/// connection, opened by [`build`](ClientBuilder::build). With it, the
/// client dispatches through a pool that opens connections on demand.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use redswitch::core::builder::ClientBuilder;
/// use redswitch::core::options::PoolOptions;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ClientBuilder::new()
///     .address("redis://localhost:6379")
///     .password("secret")
///     .database(0)
///     .pool(PoolOptions {
///         size: 4,
///         wait_timeout: Some(Duration::from_millis(100)),
///         ..Default::default()
///     })
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    address: Option<String>,
    options: Option<ConnectionOptions>,
    password: Option<String>,
    username: Option<String>,
    database: Option<u8>,
    client_name: Option<String>,
    connection_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    pool: Option<PoolOptions>,
}

impl ClientBuilder {
    /// Creates a new [`ClientBuilder`] instance.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Redis server address.
    ///
    /// # Arguments
    ///
    /// * `address` - Redis address in format `redis://[user:password@]host[:port][/db]`
    #[inline]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Starts from a complete set of connection options instead of an
    /// address. Individual setters still override single fields.
    #[inline]
    pub fn options(mut self, options: ConnectionOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the password for authentication.
    #[inline]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the username for ACL authentication.
    #[inline]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the Redis database number to select after connection.
    ///
    /// # Arguments
    ///
    /// * `database` - Database number (0-15)
    #[inline]
    pub fn database(mut self, database: u8) -> Self {
        self.database = Some(database);
        self
    }

    /// Sets the client connection name.
    ///
    /// # Arguments
    ///
    /// * `name` - Client name displayed in `CLIENT LIST`
    #[inline]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Sets the connection timeout.
    #[inline]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Sets the read timeout for commands. `None` means no timeout.
    #[inline]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout for commands. `None` means no timeout.
    #[inline]
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Switches the client to pool mode.
    #[inline]
    pub fn pool(mut self, options: PoolOptions) -> Self {
        self.pool = Some(options);
        self
    }

    /// Resolves the connection options from the address or the explicit
    /// options, then applies the individual overrides.
    fn connection_options(&mut self) -> Result<ConnectionOptions> {
        let mut options = match (self.options.take(), self.address.take()) {
            (Some(options), _) => options,
            (None, Some(address)) => ConnectionOptions::from_url(&address)?,
            (None, None) => {
                return Err(Error::InvalidArgument {
                    message: "address is required".to_string(),
                })
            }
        };

        if let Some(password) = self.password.take() {
            options.password = Some(password);
        }
        if let Some(username) = self.username.take() {
            options.username = Some(username);
        }
        if let Some(database) = self.database {
            options.database = Some(database);
        }
        if let Some(name) = self.client_name.take() {
            options.client_name = Some(name);
        }
        if let Some(timeout) = self.connection_timeout {
            options.connect_timeout = Some(timeout);
        }
        if self.read_timeout.is_some() {
            options.read_timeout = self.read_timeout;
        }
        if self.write_timeout.is_some() {
            options.write_timeout = self.write_timeout;
        }
        Ok(options)
    }

    /// Builds the [`Client`].
    ///
    /// In single mode this opens and authenticates the connection. In pool
    /// mode no connection is opened until the first command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if neither an address nor options
    /// were given, or if the pool size is zero.
    /// Returns [`Error::Io`] or [`Error::Auth`] if the single connection
    /// cannot be established.
    pub async fn build(mut self) -> Result<Client> {
        let options = self.connection_options()?;
        match self.pool.take() {
            Some(pool) => Ok(Client::with_pool(ConnectionPool::new(options, pool)?)),
            None => {
                let conn = Connection::connect(&options).await?;
                Ok(Client::with_connection(conn))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_new() {
        let builder = ClientBuilder::new();
        assert!(builder.address.is_none());
        assert!(builder.password.is_none());
        assert!(builder.pool.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let builder = ClientBuilder::new()
            .address("redis://localhost:6379")
            .password("secret")
            .database(0)
            .client_name("test")
            .pool(PoolOptions::default());

        assert_eq!(builder.address, Some("redis://localhost:6379".to_string()));
        assert_eq!(builder.password, Some("secret".to_string()));
        assert_eq!(builder.database, Some(0));
        assert_eq!(builder.client_name, Some("test".to_string()));
        assert_eq!(builder.pool, Some(PoolOptions::default()));
    }

    #[test]
    fn test_overrides_apply_on_top_of_address() {
        let mut builder = ClientBuilder::new()
            .address("redis://:frompath@cache:7000/1")
            .password("override")
            .read_timeout(Some(Duration::from_secs(2)));
        let options = builder.connection_options().unwrap();
        assert_eq!(options.host, "cache");
        assert_eq!(options.port, 7000);
        assert_eq!(options.password.as_deref(), Some("override"));
        assert_eq!(options.database, Some(1));
        assert_eq!(options.read_timeout, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_builder_build_without_address() {
        let result = ClientBuilder::new().build().await;
        match result {
            Err(Error::InvalidArgument { message }) => {
                assert_eq!(message, "address is required");
            }
            _ => panic!("Expected InvalidArgument error"),
        }
    }

    #[tokio::test]
    async fn test_pool_mode_is_lazy() {
        // Nothing listens on this address; a lazy pool must not care.
        let client = ClientBuilder::new()
            .address("redis://127.0.0.1:1")
            .pool(PoolOptions {
                size: 3,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();
        assert!(client.is_pooled());
        let status = client.pool_status().unwrap();
        assert_eq!(status.size, 3);
        assert_eq!(status.idle + status.checked_out, 0);
    }

    #[tokio::test]
    async fn test_zero_pool_size_rejected() {
        let result = ClientBuilder::new()
            .address("redis://127.0.0.1:6379")
            .pool(PoolOptions {
                size: 0,
                ..Default::default()
            })
            .build()
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }
}
