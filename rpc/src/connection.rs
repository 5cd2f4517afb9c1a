use crate::{Error, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A message oriented, bidirectional connection to a node.
#[async_trait]
pub trait Connection: Send + 'static {
    /// Writes one text frame.
    async fn send(&mut self, text: String) -> Result<()>;
    /// Reads the next text frame.
    async fn recv(&mut self) -> Result<String>;
    fn is_connected(&self) -> bool;
}

/// Creates new connections for the [`Pool`](crate::Pool).
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: Connection;

    async fn connect(&self) -> Result<Self::Connection>;
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    connected: bool,
}

impl WsConnection {
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let (stream, _) = connect_async(endpoint)
            .await
            .map_err(|err| Error::Connect {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            })?;

        debug!("Connected to {}", endpoint);

        Ok(WsConnection {
            stream,
            connected: true,
        })
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn send(&mut self, text: String) -> Result<()> {
        trace!("Sending frame: {}", text);

        self.stream.send(Message::Text(text)).await.map_err(|err| {
            self.connected = false;
            Error::from(err)
        })
    }
    async fn recv(&mut self) -> Result<String> {
        loop {
            let msg = match self.stream.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(err)) => {
                    self.connected = false;
                    return Err(err.into());
                }
                None => {
                    self.connected = false;
                    return Err(Error::ConnectionClosed);
                }
            };

            match msg {
                Message::Text(text) => {
                    trace!("Received frame: {}", text);
                    return Ok(text);
                }
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes).map_err(|_| Error::ConnectionClosed)
                }
                Message::Close(_) => {
                    self.connected = false;
                    return Err(Error::ConnectionClosed);
                }
                // Pongs are answered by tungstenite on the next read.
                _ => continue,
            }
        }
    }
    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Opens websocket connections to a single endpoint.
#[derive(Debug, Clone)]
pub struct WsFactory {
    endpoint: String,
}

impl WsFactory {
    pub fn new(endpoint: &str) -> Self {
        WsFactory {
            endpoint: endpoint.to_string(),
        }
    }
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ConnectionFactory for WsFactory {
    type Connection = WsConnection;

    async fn connect(&self) -> Result<WsConnection> {
        WsConnection::connect(&self.endpoint).await
    }
}
