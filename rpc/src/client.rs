use crate::types::*;
use crate::{ConnectionFactory, Error, Pool, PoolConfig, PooledConnection, Result, WsFactory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 100,
            backoff_ms: 100,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// JSON-RPC client on top of a connection [`Pool`].
pub struct RpcClient<F: ConnectionFactory> {
    pool: Pool<F>,
    retry: RetryConfig,
    next_id: AtomicU64,
}

impl RpcClient<WsFactory> {
    /// Opens a pool of websocket connections to the endpoint.
    pub async fn connect(endpoint: &str, pool: PoolConfig, retry: RetryConfig) -> Result<Self> {
        info!("Connecting to {}", endpoint);

        Ok(Self::new(Pool::new(WsFactory::new(endpoint), pool).await?, retry))
    }
}

impl<F: ConnectionFactory> RpcClient<F> {
    pub fn new(pool: Pool<F>, retry: RetryConfig) -> Self {
        RpcClient {
            pool,
            retry,
            next_id: AtomicU64::new(1),
        }
    }
    pub fn pool(&self) -> &Pool<F> {
        &self.pool
    }
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
    /// Sends a request and waits for its response. Transport failures are
    /// retried, errors reported by the node are not.
    pub async fn request<P, R>(&self, method: RpcMethod, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(&RpcRequest::new(self.next_id(), method, params))?;
        trace!("Request: {}", payload);

        let mut attempts = 0;
        loop {
            let mut conn = self.pool.get().await?;

            // An unreadable frame leaves the connection in an unknown state.
            match exchange(&mut conn, payload.clone()).await {
                Ok(resp) => return into_result(resp),
                Err(err) => {
                    conn.mark_unusable();
                    drop(conn);

                    attempts += 1;
                    debug!(
                        "Request {} failed (attempt {}/{}): {}",
                        method.as_str(),
                        attempts,
                        self.retry.max_attempts,
                        err
                    );

                    sleep(self.retry.backoff()).await;

                    if attempts >= self.retry.max_attempts {
                        return Err(Error::RetryLimit {
                            attempts,
                            last: Box::new(err),
                        });
                    }
                }
            }
        }
    }
    pub async fn runtime_version(&self, at: Option<&str>) -> Result<RuntimeVersion> {
        self.request(RpcMethod::RuntimeVersion, json!([at])).await
    }
    /// Hex encoded runtime metadata, including the magic number.
    pub async fn metadata(&self, at: Option<&str>) -> Result<String> {
        self.request(RpcMethod::Metadata, json!([at])).await
    }
    /// Hex encoded storage value, `None` if the key does not exist.
    pub async fn storage(&self, key: &str, at: Option<&str>) -> Result<Option<String>> {
        self.request(RpcMethod::Storage, json!([key, at])).await
    }
    /// Hash of the block with the given number, or the latest block.
    pub async fn block_hash(&self, number: Option<u64>) -> Result<Option<String>> {
        self.request(RpcMethod::BlockHash, json!([number])).await
    }
    pub async fn header(&self, at: Option<&str>) -> Result<Option<Header>> {
        self.request(RpcMethod::Header, json!([at])).await
    }
    pub async fn block(&self, at: Option<&str>) -> Result<Option<SignedBlock>> {
        self.request(RpcMethod::Block, json!([at])).await
    }
    pub async fn finalized_head(&self) -> Result<String> {
        self.request(RpcMethod::FinalizedHead, json!([])).await
    }
    pub async fn query_info(&self, extrinsic: &str, at: Option<&str>) -> Result<PaymentQueryInfo> {
        self.request(RpcMethod::QueryInfo, json!([extrinsic, at]))
            .await
    }
    /// Submits the hex encoded extrinsic and follows its status until it
    /// reaches a terminal one, which is returned. Cancelling the token stops
    /// watching with [`Error::Terminated`].
    pub async fn submit_and_watch(
        &self,
        extrinsic: &str,
        token: &CancellationToken,
    ) -> Result<ExtrinsicStatus> {
        let payload = serde_json::to_string(&RpcRequest::new(
            self.next_id(),
            RpcMethod::SubmitAndWatch,
            json!([extrinsic]),
        ))?;

        let mut conn = self.pool.get().await?;
        // Carries an open subscription from here on.
        conn.mark_unusable();

        let subscription: Value = into_result(exchange(&mut conn, payload).await?)?;
        debug!("Watching extrinsic, subscription {}", subscription);

        loop {
            let frame = tokio::select! {
                _ = token.cancelled() => return Err(Error::Terminated),
                frame = conn.recv() => frame?,
            };

            let notification = match serde_json::from_str::<RpcNotification<ExtrinsicStatus>>(&frame)
            {
                Ok(notification) => notification,
                Err(_) => {
                    trace!("Ignoring frame: {}", frame);
                    continue;
                }
            };

            if notification.method != RpcMethod::ExtrinsicUpdate.as_str()
                || notification.params.subscription != subscription
            {
                continue;
            }

            let status = notification.params.result;
            if status.is_terminal() {
                return Ok(status);
            }

            debug!("Extrinsic status: {:?}", status);
        }
    }
}

/// Writes one frame and reads one response envelope.
async fn exchange<F: ConnectionFactory>(
    conn: &mut PooledConnection<F>,
    payload: String,
) -> Result<RpcResponse> {
    conn.send(payload).await?;
    let frame = conn.recv().await?;

    Ok(serde_json::from_str(&frame)?)
}

fn into_result<R: DeserializeOwned>(resp: RpcResponse) -> Result<R> {
    if let Some(err) = resp.error {
        return Err(Error::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    serde_json::from_value(resp.result.unwrap_or(Value::Null)).map_err(|err| err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFactory, MockReply};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    async fn client(factory: &MockFactory) -> RpcClient<MockFactory> {
        let _ = env_logger::builder().is_test(true).try_init();

        let pool = Pool::new(
            factory.clone(),
            PoolConfig {
                initial: 0,
                capacity: 4,
            },
        )
        .await
        .unwrap();

        RpcClient::new(pool, RetryConfig::default())
    }

    #[tokio::test]
    async fn request_returns_result() {
        let factory = MockFactory::new(|method, params| match method {
            "chain_getBlockHash" => {
                assert_eq!(params, &json!([0]));
                MockReply::Result(json!("0xabcd"))
            }
            _ => MockReply::Result(Value::Null),
        });
        let client = client(&factory).await;

        let hash = client.block_hash(Some(0)).await.unwrap();
        assert_eq!(hash.as_deref(), Some("0xabcd"));

        // Missing storage is not an error.
        assert_eq!(client.storage("0x00", None).await.unwrap(), None);

        // The connection is reused.
        assert_eq!(factory.connects(), 1);
        assert_eq!(client.pool().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn request_gives_up_after_max_attempts() {
        let factory = MockFactory::new(|_, _| MockReply::SendFailure);
        let client = client(&factory).await;

        let started = tokio::time::Instant::now();
        let res = client.finalized_head().await;

        assert!(matches!(
            res,
            Err(Error::RetryLimit { attempts: 100, .. })
        ));
        assert_eq!(factory.calls("chain_getFinalizedHead"), 100);
        // Every failed connection is discarded.
        assert_eq!(factory.connects(), 100);
        assert_eq!(client.pool().len(), 0);
        assert!(started.elapsed() >= Duration::from_millis(100 * 99));
    }

    #[tokio::test(start_paused = true)]
    async fn request_recovers_after_failures() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&counter);
        let factory = MockFactory::new(move |_, _| {
            if inner.fetch_add(1, Ordering::SeqCst) < 3 {
                MockReply::RecvFailure
            } else {
                MockReply::Result(json!("0x01"))
            }
        });
        let client = client(&factory).await;

        assert_eq!(client.finalized_head().await.unwrap(), "0x01");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(factory.connects(), 4);
    }

    #[tokio::test]
    async fn rpc_errors_are_not_retried() {
        let factory = MockFactory::new(|_, _| MockReply::Error(-32602, "Invalid params".into()));
        let client = client(&factory).await;

        let res = client.finalized_head().await;
        match res {
            Err(Error::Rpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid params");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(factory.calls("chain_getFinalizedHead"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn garbled_responses_are_retried_on_fresh_connections() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&counter);
        let factory = MockFactory::new(move |_, _| {
            if inner.fetch_add(1, Ordering::SeqCst) < 2 {
                MockReply::Garbage("not json")
            } else {
                MockReply::Result(json!("0x02"))
            }
        });
        let client = client(&factory).await;

        assert_eq!(client.finalized_head().await.unwrap(), "0x02");
        assert_eq!(factory.calls("chain_getFinalizedHead"), 3);
        assert_eq!(factory.connects(), 3);
        assert_eq!(client.pool().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn garbled_responses_hit_the_retry_limit() {
        let factory = MockFactory::new(|_, _| MockReply::Garbage("{\"jsonrpc\":"));
        let client = client(&factory).await;

        match client.finalized_head().await {
            Err(Error::RetryLimit { attempts, last }) => {
                assert_eq!(attempts, 100);
                assert!(matches!(*last, Error::Json(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(client.pool().len(), 0);
    }

    #[tokio::test]
    async fn factory_failures_are_not_retried() {
        let factory = MockFactory::new(|_, _| MockReply::Result(Value::Null));
        let client = client(&factory).await;
        factory.fail_connects(true);

        assert!(matches!(
            client.finalized_head().await,
            Err(Error::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn submit_and_watch_until_terminal_status() {
        let factory = MockFactory::new(|method, _| match method {
            "author_submitAndWatchExtrinsic" => MockReply::Subscription(
                "sub-1",
                vec![json!("ready"), json!({"broadcast": ["peer"]}), json!({"inBlock": "0xb1"})],
            ),
            _ => MockReply::Result(Value::Null),
        });
        let client = client(&factory).await;

        let status = client
            .submit_and_watch("0x00", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(status, ExtrinsicStatus::InBlock("0xb1".to_string()));

        // Subscribed connections are not reused.
        assert_eq!(client.pool().len(), 0);
    }

    #[tokio::test]
    async fn submit_and_watch_terminated_by_token() {
        let factory = MockFactory::new(|_, _| MockReply::Subscription("sub-1", vec![json!("future")]));
        let client = client(&factory).await;

        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        assert!(matches!(
            client.submit_and_watch("0x00", &token).await,
            Err(Error::Terminated)
        ));
    }

    #[tokio::test]
    async fn request_ids_increase() {
        let client = client(&MockFactory::new(|_, _| MockReply::Result(Value::Null))).await;

        let first = client.next_id();
        let second = client.next_id();
        assert!(second > first);
    }
}
