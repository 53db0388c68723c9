//! A terminal on/off switch shared through Redis.
//!
//! Run several copies against the same server: flipping the switch in one
//! shows up in the others within a poll interval.
//!
//! Run with: cargo run --example switch -- [redis://host:port]
//! Then type `on`, `off`, `show` or `quit`.

use std::sync::Arc;

use redswitch::board::DEFAULT_INTERVAL;
use redswitch::{Client, PoolOptions, Result, StateBoard};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

    // The poller and the keyboard each get their own connection.
    let client = Client::builder()
        .address(addr)
        .client_name("switch-demo")
        .pool(PoolOptions {
            size: 2,
            ..Default::default()
        })
        .build()
        .await?;
    let board = Arc::new(StateBoard::new(client));

    let (stop, stopped) = oneshot::channel::<()>();
    let poller = {
        let board = board.clone();
        tokio::spawn(async move {
            board
                .run(DEFAULT_INTERVAL, async {
                    let _ = stopped.await;
                })
                .await
        })
    };

    let mut changes = board.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = changes.borrow_and_update().clone();
            println!(
                "switch is {} ({})",
                if state.is_empty() { "unset" } else { state.as_str() },
                redswitch::board::color_for(&state)
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "on" => report(board.turn_on().await),
            "off" => report(board.turn_off().await),
            "show" => println!(
                "switch is {:?}, color {}",
                board.current_state(),
                board.display_color()
            ),
            "quit" | "exit" => break,
            "" => {}
            other => println!("unknown command {:?}; try on, off, show or quit", other),
        }
    }

    let _ = stop.send(());
    let _ = poller.await;
    watcher.abort();
    Ok(())
}

/// A failed write leaves the switch as it was; say so and keep going.
fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("switch not changed: {}", e);
    }
}
