//! A remote on/off switch backed by one Redis key.
//!
//! [`StateBoard`] polls the key once per interval and remembers the last
//! value it read. Display code asks the board for the current state and
//! its color; the two actions write `"On"` or `"Off"` to the key.
//!
//! Only the exact value `"On"` counts as on. A missing key, `"Off"` and
//! anything else all display as off.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{Client, Result};

/// Key polled when none is given.
pub const DEFAULT_KEY: &str = "state";
/// Polling period when none is given.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Value written by [`StateBoard::turn_on`].
pub const ON: &str = "On";
/// Value written by [`StateBoard::turn_off`].
pub const OFF: &str = "Off";

/// Color shown while the switch is on.
pub const ON_COLOR: &str = "Yellow";
/// Color shown otherwise.
pub const OFF_COLOR: &str = "#564b4b";

/// Display color for a stored value.
pub fn color_for(state: &str) -> &'static str {
    if state == ON {
        ON_COLOR
    } else {
        OFF_COLOR
    }
}

/// Polls one key and exposes it as an on/off state.
///
/// # Example
///
/// ```no_run
/// use redswitch::{Client, StateBoard};
/// use redswitch::board::DEFAULT_INTERVAL;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::connect("redis://localhost:6379").await?;
/// let board = StateBoard::new(client);
/// board.turn_on().await?;
/// board.poll_once().await?;
/// assert_eq!(board.display_color(), "Yellow");
///
/// // Keep polling until Ctrl-C.
/// board.run(DEFAULT_INTERVAL, async {
///     let _ = tokio::signal::ctrl_c().await;
/// }).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StateBoard {
    client: Client,
    key: String,
    state: watch::Sender<String>,
}

impl StateBoard {
    /// Creates a board on [`DEFAULT_KEY`]. Nothing is read until the first
    /// poll; until then the state is empty (off).
    pub fn new(client: Client) -> Self {
        Self::with_key(client, DEFAULT_KEY)
    }

    /// Creates a board on a custom key.
    pub fn with_key(client: Client, key: impl Into<String>) -> Self {
        let (state, _) = watch::channel(String::new());
        StateBoard {
            client,
            key: key.into(),
            state,
        }
    }

    /// The polled key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the key once and stores the result.
    ///
    /// A missing key reads as the empty string.
    ///
    /// # Errors
    ///
    /// Returns the dispatch error; the last known state is kept.
    pub async fn poll_once(&self) -> Result<String> {
        let value: Option<String> = self.client.get(self.key.clone()).await?;
        let value = value.unwrap_or_default();
        let key = &self.key;
        self.state.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            info!(%key, from = %current, to = %value, "state changed");
            current.clone_from(&value);
            true
        });
        debug!(%key, on = value == ON, "polled");
        Ok(value)
    }

    /// Polls every `interval` until `shutdown` completes.
    ///
    /// Failed polls are logged and skipped; the state keeps its last known
    /// value.
    pub async fn run<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!(key = %self.key, "board stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!(key = %self.key, error = %e, "poll failed, keeping last state");
                    }
                }
            }
        }
    }

    /// Last value read from the key.
    pub fn current_state(&self) -> String {
        self.state.borrow().clone()
    }

    /// True only when the last value read is exactly `"On"`.
    pub fn is_on(&self) -> bool {
        *self.state.borrow() == ON
    }

    /// `"Yellow"` when on, `"#564b4b"` otherwise.
    pub fn display_color(&self) -> &'static str {
        color_for(&self.state.borrow())
    }

    /// A receiver notified whenever a poll observes a new value.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.state.subscribe()
    }

    /// Writes `"On"` to the key.
    ///
    /// The displayed state follows on the next poll.
    pub async fn turn_on(&self) -> Result<()> {
        self.client.set(self.key.clone(), ON).await?;
        info!(key = %self.key, "turned on");
        Ok(())
    }

    /// Writes `"Off"` to the key.
    pub async fn turn_off(&self) -> Result<()> {
        self.client.set(self.key.clone(), OFF).await?;
        info!(key = %self.key, "turned off");
        Ok(())
    }
}
