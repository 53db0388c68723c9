//! In-process RESP server for integration tests.
//!
//! Speaks the protocol with the crate's own codec, keeps a tiny in-memory
//! keyspace, and records every command it receives so tests can assert on
//! what did (or did not) reach the wire.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use redswitch::proto::codec::{Decoder, Encoder};
use redswitch::{ConnectionOptions, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Command the mock answers by closing the socket without replying.
pub const CRASH: &str = "CRASH";

enum Value {
    Str(Bytes),
    List(VecDeque<Bytes>),
    Hash(BTreeMap<Bytes, Bytes>),
    Set(BTreeSet<Bytes>),
    ZSet(Vec<(Bytes, f64)>),
}

#[derive(Default)]
struct Db {
    data: HashMap<Bytes, Value>,
    version: u64,
}

#[derive(Default)]
struct Shared {
    db: Mutex<Db>,
    log: Mutex<Vec<Vec<String>>>,
    connections: AtomicUsize,
    bytes_received: AtomicUsize,
    password: Option<String>,
}

pub struct MockServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::spawn(None).await
    }

    pub async fn with_password(password: &str) -> Self {
        Self::spawn(Some(password.to_string())).await
    }

    async fn spawn(password: Option<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared {
            password,
            ..Default::default()
        });

        let accept_shared = shared.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_shared.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(socket, accept_shared.clone()));
            }
        });

        MockServer { addr, shared }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub fn options(&self) -> ConnectionOptions {
        ConnectionOptions {
            host: "127.0.0.1".to_string(),
            port: self.addr.port(),
            ..Default::default()
        }
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Raw bytes read from all clients so far.
    pub fn bytes_received(&self) -> usize {
        self.shared.bytes_received.load(Ordering::SeqCst)
    }

    /// Every command received, in arrival order.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.shared.log.lock().unwrap().clone()
    }

    /// Upper-cased command names received, in arrival order.
    pub fn command_names(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .map(|args| args[0].to_ascii_uppercase())
            .collect()
    }
}

async fn serve(mut socket: TcpStream, shared: Arc<Shared>) {
    let mut decoder = Decoder::new();
    let mut encoder = Encoder::new();
    let mut session = Session {
        authed: shared.password.is_none(),
        queued: None,
        watched: None,
    };
    let mut buf = [0u8; 4096];

    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        shared.bytes_received.fetch_add(n, Ordering::SeqCst);
        decoder.append(&buf[..n]);

        while let Ok(Some(frame)) = decoder.decode() {
            let args = match frame {
                Frame::Array(items) => items
                    .into_iter()
                    .filter_map(|f| match f {
                        Frame::BulkString(Some(b)) => Some(b),
                        _ => None,
                    })
                    .collect::<Vec<Bytes>>(),
                _ => Vec::new(),
            };
            if args.is_empty() {
                return;
            }
            shared.log.lock().unwrap().push(
                args.iter()
                    .map(|a| String::from_utf8_lossy(a).into_owned())
                    .collect(),
            );
            if name_of(&args) == CRASH {
                return;
            }

            let reply = session.handle(&shared, args);
            encoder.encode(&reply);
            let data = encoder.take();
            if socket.write_all(&data).await.is_err() {
                return;
            }
        }
    }
}

struct Session {
    authed: bool,
    queued: Option<Vec<Vec<Bytes>>>,
    watched: Option<u64>,
}

impl Session {
    fn handle(&mut self, shared: &Shared, args: Vec<Bytes>) -> Frame {
        let name = name_of(&args);

        if name == "AUTH" {
            return match &shared.password {
                None => Frame::error(
                    "ERR AUTH <password> called without any password configured for the default user",
                ),
                Some(pw) if args.last().map(|a| &a[..]) == Some(pw.as_bytes()) => {
                    self.authed = true;
                    ok()
                }
                Some(_) => Frame::error(
                    "WRONGPASS invalid username-password pair or user is disabled.",
                ),
            };
        }
        if !self.authed {
            return Frame::error("NOAUTH Authentication required.");
        }

        if self.queued.is_some() {
            return match name.as_str() {
                "EXEC" => {
                    let queued = self.queued.take().unwrap_or_default();
                    let watched = self.watched.take();
                    let mut db = shared.db.lock().unwrap();
                    if matches!(watched, Some(v) if v != db.version) {
                        return Frame::Null;
                    }
                    Frame::Array(queued.iter().map(|a| execute(&mut db, a)).collect())
                }
                "DISCARD" => {
                    self.queued = None;
                    self.watched = None;
                    ok()
                }
                "MULTI" => Frame::error("ERR MULTI calls can not be nested"),
                "WATCH" => Frame::error("ERR WATCH inside MULTI is not allowed"),
                other if !is_known(other) => {
                    Frame::error(&format!("ERR unknown command '{}'", other.to_lowercase()))
                }
                _ => {
                    if let Some(queue) = self.queued.as_mut() {
                        queue.push(args);
                    }
                    Frame::status("QUEUED")
                }
            };
        }

        match name.as_str() {
            "MULTI" => {
                self.queued = Some(Vec::new());
                ok()
            }
            "EXEC" => Frame::error("ERR EXEC without MULTI"),
            "DISCARD" => Frame::error("ERR DISCARD without MULTI"),
            "WATCH" => {
                let version = shared.db.lock().unwrap().version;
                self.watched.get_or_insert(version);
                ok()
            }
            "UNWATCH" => {
                self.watched = None;
                ok()
            }
            _ => execute(&mut shared.db.lock().unwrap(), &args),
        }
    }
}

const KNOWN: &[&str] = &[
    "PING", "ECHO", "SELECT", "CLIENT", "GET", "SET", "DEL", "EXISTS", "MGET", "MSET", "INCR",
    "INCRBY", "DECR", "SCAN", "KEYS", "LPUSH", "RPUSH", "LRANGE", "LPOP", "LLEN", "HSET", "HGET",
    "HGETALL", "HMGET", "SADD", "SMEMBERS", "SCARD", "ZADD", "ZSCORE", "ZRANGE",
];

fn is_known(name: &str) -> bool {
    KNOWN.contains(&name)
}

fn name_of(args: &[Bytes]) -> String {
    String::from_utf8_lossy(&args[0]).to_ascii_uppercase()
}

fn text(b: &Bytes) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn ok() -> Frame {
    Frame::status("OK")
}

fn wrongtype() -> Frame {
    Frame::error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn wrong_args(name: &str) -> Frame {
    Frame::error(&format!(
        "ERR wrong number of arguments for '{}' command",
        name.to_lowercase()
    ))
}

fn not_integer() -> Frame {
    Frame::error("ERR value is not an integer or out of range")
}

fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}

fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

fn parse_i64(b: &Bytes) -> Option<i64> {
    text(b).parse().ok()
}

fn execute(db: &mut Db, args: &[Bytes]) -> Frame {
    let name = name_of(args);
    let argc = args.len();
    match name.as_str() {
        "PING" => match args.get(1) {
            Some(msg) => Frame::bulk(msg.clone()),
            None => Frame::status("PONG"),
        },
        "ECHO" if argc == 2 => Frame::bulk(args[1].clone()),
        "SELECT" | "CLIENT" => ok(),

        "GET" if argc == 2 => match db.data.get(&args[1]) {
            Some(Value::Str(v)) => Frame::bulk(v.clone()),
            Some(_) => wrongtype(),
            None => Frame::BulkString(None),
        },
        "SET" if argc >= 3 => {
            let flags: Vec<String> = args[3..].iter().map(|a| text(a).to_uppercase()).collect();
            let exists = db.data.contains_key(&args[1]);
            if flags.iter().any(|f| f == "NX") && exists
                || flags.iter().any(|f| f == "XX") && !exists
            {
                return Frame::BulkString(None);
            }
            db.data.insert(args[1].clone(), Value::Str(args[2].clone()));
            db.version += 1;
            ok()
        }
        "DEL" if argc >= 2 => {
            let removed = args[1..]
                .iter()
                .filter(|k| db.data.remove(*k).is_some())
                .count();
            if removed > 0 {
                db.version += 1;
            }
            Frame::Integer(removed as i64)
        }
        "EXISTS" if argc >= 2 => Frame::Integer(
            args[1..].iter().filter(|k| db.data.contains_key(*k)).count() as i64,
        ),
        "MGET" if argc >= 2 => Frame::Array(
            args[1..]
                .iter()
                .map(|k| match db.data.get(k) {
                    Some(Value::Str(v)) => Frame::bulk(v.clone()),
                    _ => Frame::BulkString(None),
                })
                .collect(),
        ),
        "MSET" if argc >= 3 && argc % 2 == 1 => {
            for pair in args[1..].chunks(2) {
                db.data.insert(pair[0].clone(), Value::Str(pair[1].clone()));
            }
            db.version += 1;
            ok()
        }
        "INCR" | "INCRBY" | "DECR" => {
            let delta = match (name.as_str(), args.get(2)) {
                ("INCR", None) if argc == 2 => 1,
                ("DECR", None) if argc == 2 => -1,
                ("INCRBY", Some(d)) if argc == 3 => match parse_i64(d) {
                    Some(d) => d,
                    None => return not_integer(),
                },
                _ => return wrong_args(&name),
            };
            let current = match db.data.get(&args[1]) {
                Some(Value::Str(v)) => match parse_i64(v) {
                    Some(n) => n,
                    None => return not_integer(),
                },
                Some(_) => return wrongtype(),
                None => 0,
            };
            let next = current + delta;
            db.data
                .insert(args[1].clone(), Value::Str(Bytes::from(next.to_string())));
            db.version += 1;
            Frame::Integer(next)
        }
        "SCAN" | "KEYS" if argc >= 2 => {
            let pattern = if name == "KEYS" {
                Some(text(&args[1]))
            } else {
                args.iter()
                    .position(|a| a.eq_ignore_ascii_case(b"MATCH"))
                    .and_then(|i| args.get(i + 1))
                    .map(text)
            };
            let mut keys: Vec<Bytes> = db
                .data
                .keys()
                .filter(|k| pattern.as_deref().map_or(true, |p| glob_match(p, &text(k))))
                .cloned()
                .collect();
            keys.sort();
            let keys = Frame::Array(keys.into_iter().map(Frame::bulk).collect());
            if name == "KEYS" {
                keys
            } else {
                Frame::Array(vec![Frame::bulk("0"), keys])
            }
        }

        "LPUSH" | "RPUSH" if argc >= 3 => {
            let entry = db
                .data
                .entry(args[1].clone())
                .or_insert_with(|| Value::List(VecDeque::new()));
            let Value::List(list) = entry else {
                return wrongtype();
            };
            for v in &args[2..] {
                if name == "LPUSH" {
                    list.push_front(v.clone());
                } else {
                    list.push_back(v.clone());
                }
            }
            let len = list.len();
            db.version += 1;
            Frame::Integer(len as i64)
        }
        "LRANGE" if argc == 4 => {
            let (Some(start), Some(stop)) = (parse_i64(&args[2]), parse_i64(&args[3])) else {
                return not_integer();
            };
            match db.data.get(&args[1]) {
                Some(Value::List(list)) => match normalize_range(list.len(), start, stop) {
                    Some((s, e)) => {
                        Frame::Array(list.range(s..=e).cloned().map(Frame::bulk).collect())
                    }
                    None => Frame::Array(Vec::new()),
                },
                Some(_) => wrongtype(),
                None => Frame::Array(Vec::new()),
            }
        }
        "LPOP" if argc == 2 => match db.data.get_mut(&args[1]) {
            Some(Value::List(list)) => {
                let popped = list.pop_front();
                if list.is_empty() {
                    db.data.remove(&args[1]);
                }
                db.version += 1;
                Frame::BulkString(popped)
            }
            Some(_) => wrongtype(),
            None => Frame::BulkString(None),
        },
        "LLEN" if argc == 2 => match db.data.get(&args[1]) {
            Some(Value::List(list)) => Frame::Integer(list.len() as i64),
            Some(_) => wrongtype(),
            None => Frame::Integer(0),
        },

        "HSET" if argc >= 4 && argc % 2 == 0 => {
            let entry = db
                .data
                .entry(args[1].clone())
                .or_insert_with(|| Value::Hash(BTreeMap::new()));
            let Value::Hash(hash) = entry else {
                return wrongtype();
            };
            let added = args[2..]
                .chunks(2)
                .filter(|pair| hash.insert(pair[0].clone(), pair[1].clone()).is_none())
                .count();
            db.version += 1;
            Frame::Integer(added as i64)
        }
        "HGET" if argc == 3 => match db.data.get(&args[1]) {
            Some(Value::Hash(hash)) => Frame::BulkString(hash.get(&args[2]).cloned()),
            Some(_) => wrongtype(),
            None => Frame::BulkString(None),
        },
        "HMGET" if argc >= 3 => match db.data.get(&args[1]) {
            Some(Value::Hash(hash)) => Frame::Array(
                args[2..]
                    .iter()
                    .map(|f| Frame::BulkString(hash.get(f).cloned()))
                    .collect(),
            ),
            Some(_) => wrongtype(),
            None => Frame::Array(args[2..].iter().map(|_| Frame::BulkString(None)).collect()),
        },
        "HGETALL" if argc == 2 => match db.data.get(&args[1]) {
            Some(Value::Hash(hash)) => Frame::Array(
                hash.iter()
                    .flat_map(|(k, v)| [Frame::bulk(k.clone()), Frame::bulk(v.clone())])
                    .collect(),
            ),
            Some(_) => wrongtype(),
            None => Frame::Array(Vec::new()),
        },

        "SADD" if argc >= 3 => {
            let entry = db
                .data
                .entry(args[1].clone())
                .or_insert_with(|| Value::Set(BTreeSet::new()));
            let Value::Set(set) = entry else {
                return wrongtype();
            };
            let added = args[2..].iter().filter(|m| set.insert((*m).clone())).count();
            db.version += 1;
            Frame::Integer(added as i64)
        }
        "SMEMBERS" if argc == 2 => match db.data.get(&args[1]) {
            Some(Value::Set(set)) => Frame::Array(set.iter().cloned().map(Frame::bulk).collect()),
            Some(_) => wrongtype(),
            None => Frame::Array(Vec::new()),
        },
        "SCARD" if argc == 2 => match db.data.get(&args[1]) {
            Some(Value::Set(set)) => Frame::Integer(set.len() as i64),
            Some(_) => wrongtype(),
            None => Frame::Integer(0),
        },

        "ZADD" if argc >= 4 => {
            let mut i = 2;
            let (mut nx, mut xx, mut ch) = (false, false, false);
            while i < argc {
                match text(&args[i]).to_uppercase().as_str() {
                    "NX" => nx = true,
                    "XX" => xx = true,
                    "CH" => ch = true,
                    _ => break,
                }
                i += 1;
            }
            if (argc - i) == 0 || (argc - i) % 2 != 0 {
                return Frame::error("ERR syntax error");
            }
            let entry = db
                .data
                .entry(args[1].clone())
                .or_insert_with(|| Value::ZSet(Vec::new()));
            let Value::ZSet(zset) = entry else {
                return wrongtype();
            };
            let (mut added, mut changed) = (0, 0);
            for pair in args[i..].chunks(2) {
                let Ok(score) = text(&pair[0]).parse::<f64>() else {
                    return Frame::error("ERR value is not a valid float");
                };
                match zset.iter_mut().find(|(m, _)| *m == pair[1]) {
                    Some(existing) if !nx => {
                        if existing.1 != score {
                            existing.1 = score;
                            changed += 1;
                        }
                    }
                    None if !xx => {
                        zset.push((pair[1].clone(), score));
                        added += 1;
                    }
                    _ => {}
                }
            }
            db.version += 1;
            Frame::Integer(if ch { added + changed } else { added })
        }
        "ZSCORE" if argc == 3 => match db.data.get(&args[1]) {
            Some(Value::ZSet(zset)) => Frame::BulkString(
                zset.iter()
                    .find(|(m, _)| *m == args[2])
                    .map(|(_, s)| Bytes::from(s.to_string())),
            ),
            Some(_) => wrongtype(),
            None => Frame::BulkString(None),
        },
        "ZRANGE" if argc >= 4 => {
            let (Some(start), Some(stop)) = (parse_i64(&args[2]), parse_i64(&args[3])) else {
                return not_integer();
            };
            let withscores = args
                .get(4)
                .is_some_and(|a| a.eq_ignore_ascii_case(b"WITHSCORES"));
            match db.data.get(&args[1]) {
                Some(Value::ZSet(zset)) => {
                    let mut sorted = zset.clone();
                    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                    let Some((s, e)) = normalize_range(sorted.len(), start, stop) else {
                        return Frame::Array(Vec::new());
                    };
                    let mut out = Vec::new();
                    for (member, score) in &sorted[s..=e] {
                        out.push(Frame::bulk(member.clone()));
                        if withscores {
                            out.push(Frame::bulk(score.to_string()));
                        }
                    }
                    Frame::Array(out)
                }
                Some(_) => wrongtype(),
                None => Frame::Array(Vec::new()),
            }
        }

        other if is_known(other) => wrong_args(other),
        other => Frame::error(&format!("ERR unknown command '{}'", other.to_lowercase())),
    }
}
