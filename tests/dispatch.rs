//! Request/reply dispatch against the in-process server.

mod common;

use std::time::Duration;

use common::{MockServer, CRASH};
use redswitch::{Client, Cmd, ConnectionOptions, Error, Frame, PoolOptions};

#[tokio::test]
async fn test_single_mode_round_trip() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    assert_eq!(client.ping().await.unwrap(), "PONG");
    client.set("greeting", "hello").await.unwrap();
    let value: Option<String> = client.get("greeting").await.unwrap();
    assert_eq!(value.as_deref(), Some("hello"));

    assert_eq!(server.connections(), 1);
    assert_eq!(server.command_names(), ["PING", "SET", "GET"]);
}

#[tokio::test]
async fn test_pool_mode_round_trip() {
    let server = MockServer::start().await;
    let client = Client::builder()
        .address(server.url())
        .pool(PoolOptions {
            size: 2,
            ..Default::default()
        })
        .build()
        .await
        .unwrap();
    assert!(client.is_pooled());
    assert_eq!(server.connections(), 0);

    client.set("k", "v").await.unwrap();
    let value: Option<String> = client.get("k").await.unwrap();
    assert_eq!(value.as_deref(), Some("v"));

    // Sequential calls reuse the one idle connection.
    assert_eq!(server.connections(), 1);
    let status = client.pool_status().unwrap();
    assert_eq!(status.idle, 1);
    assert_eq!(status.checked_out, 0);
    assert_eq!(status.size, 2);
}

#[tokio::test]
async fn test_missing_key_reads_as_none() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    let value: Option<String> = client.get("nope").await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn test_server_error_is_returned_verbatim() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    client.lpush("list", ["a"]).await.unwrap();
    let err = client.get::<String>("list").await.unwrap_err();
    match err {
        Error::Server { message } => assert_eq!(
            message,
            "WRONGTYPE Operation against a key holding the wrong kind of value"
        ),
        other => panic!("expected server error, got {other:?}"),
    }

    // The connection stays usable after an error reply.
    assert_eq!(client.ping().await.unwrap(), "PONG");
}

#[tokio::test]
async fn test_raw_command_keeps_error_frame() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    let reply = client.command(Cmd::new("NOSUCHCOMMAND")).await.unwrap();
    assert!(reply.is_error());
    assert_eq!(reply, Frame::error("ERR unknown command 'nosuchcommand'"));
}

#[tokio::test]
async fn test_reply_shape_mismatch_is_type_error() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    client.set("n", "12").await.unwrap();
    // GET answers with a bulk string, not an integer.
    let err = client.command_as::<i64>(Cmd::new("GET").arg("n")).await.unwrap_err();
    assert!(matches!(err, Error::Type { .. }), "got {err:?}");

    let n: String = client.command_as(Cmd::new("GET").arg("n")).await.unwrap();
    assert_eq!(n, "12");
}

#[tokio::test]
async fn test_broken_single_connection_fails_fast() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();

    let err = client.command(Cmd::new(CRASH)).await.unwrap_err();
    assert!(err.is_connection_fatal(), "got {err:?}");

    let logged = server.commands().len();
    let received = server.bytes_received();

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
    let err = client.set("k", "v").await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");

    assert_eq!(server.commands().len(), logged);
    assert_eq!(server.bytes_received(), received);
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_pool_replaces_crashed_connection() {
    let server = MockServer::start().await;
    let client = Client::builder()
        .address(server.url())
        .pool(PoolOptions {
            size: 1,
            ..Default::default()
        })
        .build()
        .await
        .unwrap();

    client.ping().await.unwrap();
    assert!(client.command(Cmd::new(CRASH)).await.is_err());
    assert_eq!(client.pool_status().unwrap().idle, 0);

    assert_eq!(client.ping().await.unwrap(), "PONG");
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_auth_handshake() {
    let server = MockServer::with_password("sekrit").await;

    let client = Client::builder()
        .address(server.url())
        .password("sekrit")
        .database(2)
        .client_name("board")
        .build()
        .await
        .unwrap();
    assert_eq!(client.ping().await.unwrap(), "PONG");
    assert_eq!(
        &server.commands()[..3],
        [
            vec!["AUTH".to_string(), "sekrit".to_string()],
            vec!["SELECT".to_string(), "2".to_string()],
            vec![
                "CLIENT".to_string(),
                "SETNAME".to_string(),
                "board".to_string()
            ],
        ]
    );
}

#[tokio::test]
async fn test_auth_from_url() {
    let server = MockServer::with_password("sekrit").await;
    let url = format!("redis://:sekrit@127.0.0.1:{}", server.options().port);

    let client = Client::connect(url).await.unwrap();
    assert_eq!(client.ping().await.unwrap(), "PONG");
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    let server = MockServer::with_password("sekrit").await;

    let err = Client::builder()
        .address(server.url())
        .password("guess")
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth), "got {err:?}");
}

#[tokio::test]
async fn test_unauthenticated_command_is_server_error() {
    let server = MockServer::with_password("sekrit").await;
    let client = Client::connect(server.url()).await.unwrap();

    let err = client.ping().await.unwrap_err();
    match err {
        Error::Server { message } => assert!(message.starts_with("NOAUTH")),
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pool_auth_failure_surfaces_on_checkout() {
    let server = MockServer::with_password("sekrit").await;
    let mut options = server.options();
    options.password = Some("guess".to_string());

    let client = Client::builder()
        .options(options)
        .pool(PoolOptions::default())
        .build()
        .await
        .unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Auth), "got {err:?}");
    assert_eq!(client.pool_status().unwrap().checked_out, 0);
}

#[tokio::test]
async fn test_empty_collections_never_reach_the_wire() {
    let server = MockServer::start().await;
    let client = Client::connect(server.url()).await.unwrap();
    client.ping().await.unwrap();
    let received = server.bytes_received();

    let no_keys: Vec<&str> = Vec::new();
    let no_pairs: Vec<(&str, &str)> = Vec::new();
    let no_scores: Vec<(&str, f64)> = Vec::new();

    let results = [
        client.del(no_keys.clone()).await.map(drop),
        client.exists(no_keys.clone()).await.map(drop),
        client.mget::<String, _, _>(no_keys.clone()).await.map(drop),
        client.mset(no_pairs.clone()).await,
        client.lpush("l", no_keys.clone()).await.map(drop),
        client.hmset("h", no_pairs).await,
        client.sadd("s", no_keys.clone()).await.map(drop),
        client
            .zadd("z", no_scores, Default::default(), false)
            .await
            .map(drop),
        client.pfcount(no_keys).await.map(drop),
    ];
    for result in results {
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    assert_eq!(server.bytes_received(), received);
    assert_eq!(server.command_names(), ["PING"]);
}

#[tokio::test]
async fn test_read_timeout_breaks_connection() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and hold the socket without ever answering.
    let holder = tokio::spawn(async move { listener.accept().await.unwrap() });

    let client = Client::builder()
        .options(ConnectionOptions {
            port: addr.port(),
            read_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        })
        .build()
        .await
        .unwrap();
    let _socket = holder.await.unwrap();

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "got {err:?}");
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_connect_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = Client::connect(format!("redis://{}", addr)).await.unwrap_err();
    assert!(matches!(err, Error::Io { .. } | Error::Timeout { .. }), "got {err:?}");
}

/// Answers `GET a` after a delay and anything else at once with "B".
async fn slow_first_reply_server() -> std::net::SocketAddr {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1024];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                    let reply: &[u8] = if buf[..n].ends_with(b"$1\r\na\r\n") {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        b"$1\r\nA\r\n"
                    } else {
                        b"$1\r\nB\r\n"
                    };
                    if socket.write_all(reply).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}

#[tokio::test]
async fn test_cancelled_get_never_leaks_its_reply() {
    let addr = slow_first_reply_server().await;
    let client = Client::connect(format!("redis://{}", addr)).await.unwrap();

    let cancelled =
        tokio::time::timeout(Duration::from_millis(20), client.get::<String>("a")).await;
    assert!(cancelled.is_err());

    // Wait for the late "A" to land on the socket.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let err = client.get::<String>("b").await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_pool_drops_connection_of_cancelled_get() {
    let addr = slow_first_reply_server().await;
    let client = Client::builder()
        .address(format!("redis://{}", addr))
        .pool(PoolOptions {
            size: 1,
            ..Default::default()
        })
        .build()
        .await
        .unwrap();

    let cancelled =
        tokio::time::timeout(Duration::from_millis(20), client.get::<String>("a")).await;
    assert!(cancelled.is_err());
    let status = client.pool_status().unwrap();
    assert_eq!((status.idle, status.checked_out), (0, 0));

    tokio::time::sleep(Duration::from_millis(150)).await;
    let value: Option<String> = client.get("b").await.unwrap();
    assert_eq!(value.as_deref(), Some("B"));
}
