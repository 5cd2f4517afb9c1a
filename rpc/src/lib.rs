//! Pooled JSON-RPC 2.0 transport over websockets.
//!
//! Requests are sent over connections checked out of a [`Pool`]. A request
//! which fails on the wire marks its connection unusable and is retried after
//! a fixed backoff, see [`RetryConfig`]. Errors returned by the node itself are
//! never retried.

#[macro_use]
extern crate log;

pub use self::client::{RetryConfig, RpcClient};
pub use self::connection::{Connection, ConnectionFactory, WsConnection, WsFactory};
pub use self::pool::{Pool, PoolConfig, PooledConnection};
pub use self::types::*;
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, Error>;

pub mod client;
pub mod connection;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pool;
pub mod types;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pool capacity: {initial} initial connections, capacity {capacity}")]
    InvalidPoolCapacity { initial: usize, capacity: usize },
    #[error("connection pool is closed")]
    PoolClosed,
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("websocket error: {0}")]
    Websocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("failed to process JSON message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("retry limit reached after {attempts} attempts, last error: {last}")]
    RetryLimit { attempts: u32, last: Box<Error> },
    #[error("subscription terminated")]
    Terminated,
}

impl Error {
    /// Failures of the transport, which might succeed on another attempt.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. }
                | Error::Websocket(_)
                | Error::ConnectionClosed
                | Error::RetryLimit { .. }
        )
    }
}
