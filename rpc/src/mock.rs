//! Scripted in-memory connections. Every request is answered by a responder
//! function, and the factory counts connections and requests per method.

use crate::{Connection, ConnectionFactory, Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock answers a request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Result(Value),
    Error(i64, String),
    /// Writing the request fails.
    SendFailure,
    /// Writing succeeds, reading the response fails.
    RecvFailure,
    /// Responds with a frame which is not a JSON-RPC response.
    Garbage(&'static str),
    /// Responds with a subscription id followed by one notification per
    /// result. Reading beyond that waits forever.
    Subscription(&'static str, Vec<Value>),
}

type Responder = dyn Fn(&str, &Value) -> MockReply + Send + Sync;

struct Inner {
    responder: Box<Responder>,
    connects: AtomicUsize,
    generation: AtomicUsize,
    fail_connects: AtomicBool,
    calls: Mutex<HashMap<String, usize>>,
}

#[derive(Clone)]
pub struct MockFactory {
    inner: Arc<Inner>,
}

impl MockFactory {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> MockReply + Send + Sync + 'static,
    {
        MockFactory {
            inner: Arc::new(Inner {
                responder: Box::new(responder),
                connects: AtomicUsize::new(0),
                generation: AtomicUsize::new(0),
                fail_connects: AtomicBool::new(false),
                calls: Mutex::new(HashMap::new()),
            }),
        }
    }
    /// Number of successfully opened connections.
    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }
    /// Number of requests sent with the given method.
    pub fn calls(&self, method: &str) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(method)
            .copied()
            .unwrap_or(0)
    }
    /// Number of requests sent, of any method.
    pub fn total_calls(&self) -> usize {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .sum()
    }
    pub fn fail_connects(&self, fail: bool) {
        self.inner.fail_connects.store(fail, Ordering::SeqCst);
    }
    /// Every connection opened so far reports itself as disconnected.
    pub fn disconnect_all(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection> {
        if self.inner.fail_connects.load(Ordering::SeqCst) {
            return Err(Error::Connect {
                endpoint: "mock".to_string(),
                reason: "refused".to_string(),
            });
        }

        self.inner.connects.fetch_add(1, Ordering::SeqCst);

        Ok(MockConnection {
            inner: Arc::clone(&self.inner),
            generation: self.inner.generation.load(Ordering::SeqCst),
            frames: VecDeque::new(),
        })
    }
}

enum Frame {
    Text(String),
    Failure,
}

pub struct MockConnection {
    inner: Arc<Inner>,
    generation: usize,
    frames: VecDeque<Frame>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&mut self, text: String) -> Result<()> {
        let req: Value = serde_json::from_str(&text)?;
        let method = req["method"].as_str().unwrap_or_default().to_string();
        let id = req["id"].clone();

        *self
            .inner
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(method.clone())
            .or_default() += 1;

        let respond = |result: Value| {
            Frame::Text(json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
        };

        match (self.inner.responder)(&method, &req["params"]) {
            MockReply::Result(result) => self.frames.push_back(respond(result)),
            MockReply::Error(code, message) => self.frames.push_back(Frame::Text(
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": code, "message": message},
                })
                .to_string(),
            )),
            MockReply::SendFailure => return Err(Error::ConnectionClosed),
            MockReply::RecvFailure => self.frames.push_back(Frame::Failure),
            MockReply::Garbage(text) => self.frames.push_back(Frame::Text(text.to_string())),
            MockReply::Subscription(subscription, updates) => {
                self.frames.push_back(respond(json!(subscription)));
                for update in updates {
                    self.frames.push_back(Frame::Text(
                        json!({
                            "jsonrpc": "2.0",
                            "method": "author_extrinsicUpdate",
                            "params": {"subscription": subscription, "result": update},
                        })
                        .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
    async fn recv(&mut self) -> Result<String> {
        match self.frames.pop_front() {
            Some(Frame::Text(text)) => Ok(text),
            Some(Frame::Failure) => Err(Error::ConnectionClosed),
            None => futures_util::future::pending().await,
        }
    }
    fn is_connected(&self) -> bool {
        self.generation == self.inner.generation.load(Ordering::SeqCst)
    }
}
