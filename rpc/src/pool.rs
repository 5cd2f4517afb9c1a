use crate::{Connection, ConnectionFactory, Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Connections opened when the pool is created.
    pub initial: usize,
    /// Maximum number of idle connections.
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial: 1,
            capacity: 25,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.initial > self.capacity {
            return Err(Error::InvalidPoolCapacity {
                initial: self.initial,
                capacity: self.capacity,
            });
        }

        Ok(())
    }
}

struct Shared<F: ConnectionFactory> {
    factory: F,
    idle_tx: Sender<F::Connection>,
    idle_rx: Mutex<Receiver<F::Connection>>,
    idle: AtomicUsize,
    closed: AtomicBool,
}

impl<F: ConnectionFactory> Shared<F> {
    fn put(&self, conn: F::Connection) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        // Count before sending, a concurrent `get` may take it right away.
        self.idle.fetch_add(1, Ordering::AcqRel);
        match self.idle_tx.try_send(conn) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.idle.fetch_sub(1, Ordering::AcqRel);
                debug!("Idle pool is full, closing connection");
            }
            Err(TrySendError::Closed(_)) => {
                self.idle.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
    fn take(&self) -> Option<F::Connection> {
        let conn = self
            .idle_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .try_recv()
            .ok()?;

        self.idle.fetch_sub(1, Ordering::AcqRel);
        Some(conn)
    }
}

/// A bounded pool of idle connections. Connections are created on demand
/// if no idle one is available, so the capacity limits what is kept, not
/// what is in use.
pub struct Pool<F: ConnectionFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: ConnectionFactory> Pool<F> {
    pub async fn new(factory: F, config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let (idle_tx, idle_rx) = mpsc::channel(config.capacity);
        let pool = Pool {
            shared: Arc::new(Shared {
                factory,
                idle_tx,
                idle_rx: Mutex::new(idle_rx),
                idle: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        };

        for _ in 0..config.initial {
            match pool.shared.factory.connect().await {
                Ok(conn) => pool.shared.put(conn),
                Err(err) => {
                    pool.close();
                    return Err(err);
                }
            }
        }

        Ok(pool)
    }
    /// Checks out a connection. Disconnected idle connections are replaced
    /// by a new one. Failures of the factory are returned as is.
    pub async fn get(&self) -> Result<PooledConnection<F>> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(Error::PoolClosed);
        }

        let conn = match self.shared.take() {
            Some(conn) if conn.is_connected() => conn,
            Some(_) => {
                debug!("Replacing disconnected idle connection");
                self.shared.factory.connect().await?
            }
            None => {
                debug!("No idle connection available, creating a new one");
                self.shared.factory.connect().await?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            shared: Arc::clone(&self.shared),
            unusable: false,
        })
    }
    /// Closes all idle connections. Connections which are currently checked
    /// out are closed when released.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);

        let mut rx = self
            .shared
            .idle_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        rx.close();
        while rx.try_recv().is_ok() {
            self.shared.idle.fetch_sub(1, Ordering::AcqRel);
        }
    }
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
    /// Number of idle connections.
    pub fn len(&self) -> usize {
        self.shared.idle.load(Ordering::Acquire)
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A connection checked out of the [`Pool`]. It is returned to the pool when
/// dropped, unless it was marked unusable.
pub struct PooledConnection<F: ConnectionFactory> {
    conn: Option<F::Connection>,
    shared: Arc<Shared<F>>,
    unusable: bool,
}

impl<F: ConnectionFactory> PooledConnection<F> {
    /// The connection gets closed instead of returned to the pool.
    pub fn mark_unusable(&mut self) {
        self.unusable = true;
    }
    pub async fn send(&mut self, text: String) -> Result<()> {
        match self.conn.as_mut() {
            Some(conn) => conn.send(text).await,
            None => Err(Error::ConnectionClosed),
        }
    }
    pub async fn recv(&mut self) -> Result<String> {
        match self.conn.as_mut() {
            Some(conn) => conn.recv().await,
            None => Err(Error::ConnectionClosed),
        }
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.unusable {
                debug!("Closing unusable connection");
            } else {
                self.shared.put(conn);
            }
        }
    }
}
