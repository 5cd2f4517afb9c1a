use crate::cache::RuntimeMetadata;
use crate::config::ClientConfig;
use crate::dialect::{new_dialect, Dialect};
use crate::model::{ChainEvent, Transaction};
use crate::{Error, Result};
use std::sync::Arc;
use sublink_interface::common::{AccountId32, Address, KeyringPair};
use sublink_metadata::{CallIndex, StorageKey};
use sublink_rpc::{ConnectionFactory, Header, RpcClient, WsFactory};
use sublink_types::Value;

/// Client of a single chain. Requests go through a pool of connections and
/// are retried on transport failures, decoding follows the chain dialect.
pub struct Client<F: ConnectionFactory = WsFactory> {
    pub(crate) config: ClientConfig,
    pub(crate) rpc: RpcClient<F>,
    pub(crate) dialect: Box<dyn Dialect>,
    pub(crate) signer: Option<KeyringPair>,
    pub(crate) genesis: [u8; 32],
}

impl Client<WsFactory> {
    /// Connects to the endpoint of the configuration. The signer is only
    /// needed to submit transactions.
    pub async fn connect(config: ClientConfig, signer: Option<KeyringPair>) -> Result<Self> {
        config.validate()?;

        let rpc = RpcClient::connect(&config.endpoint, config.pool, config.retry).await?;
        Self::with_rpc(config, rpc, signer).await
    }
}

impl<F: ConnectionFactory> Client<F> {
    pub async fn with_rpc(
        config: ClientConfig,
        rpc: RpcClient<F>,
        signer: Option<KeyringPair>,
    ) -> Result<Self> {
        config.validate()?;

        let dialect = new_dialect(
            config.chain,
            config.address_type,
            config.types_path.as_deref(),
        )?;
        let genesis = rpc
            .block_hash(Some(0))
            .await?
            .ok_or_else(|| Error::BlockNotFound("0".to_string()))?;

        let client = Client {
            genesis: parse_hash(&genesis)?,
            config,
            rpc,
            dialect,
            signer,
        };

        let finalized = client.rpc.finalized_head().await?;
        let runtime = client.metadata(Some(&finalized)).await?;

        info!(
            "Connected to {} chain, spec version {}, metadata V{}",
            client.config.chain, runtime.spec_version, runtime.metadata.version
        );

        if let Some(signer) = client.signer_address() {
            debug!(
                "Signing as {}",
                signer
                    .account_id()
                    .map(|account| account.to_ss58_address(client.config.ss58_format.into()))
                    .unwrap_or_default()
            );
        }

        Ok(client)
    }
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
    pub fn rpc(&self) -> &RpcClient<F> {
        &self.rpc
    }
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }
    pub fn genesis_hash(&self) -> [u8; 32] {
        self.genesis
    }
    pub fn signer(&self) -> Option<&KeyringPair> {
        self.signer.as_ref()
    }
    pub fn signer_address(&self) -> Option<Address> {
        self.signer
            .as_ref()
            .map(|signer| Address::new(self.config.address_type, signer.account_id()))
    }
    /// Metadata of the runtime at the given block, or the best block.
    pub async fn metadata(&self, at: Option<&str>) -> Result<Arc<RuntimeMetadata>> {
        let dialect = self.dialect.as_ref();

        dialect
            .cache()
            .get_or_fetch(&self.rpc, at, |metadata| dialect.check_metadata(metadata))
            .await
    }
    /// The most recent metadata seen, fetched if there is none yet.
    pub async fn latest_metadata(&self) -> Result<Arc<RuntimeMetadata>> {
        match self.dialect.cache().latest().await {
            Some(runtime) => Ok(runtime),
            None => self.metadata(None).await,
        }
    }
    pub async fn latest_spec_version(&self) -> Option<u32> {
        self.dialect
            .cache()
            .latest()
            .await
            .map(|runtime| runtime.spec_version)
    }
    /// Storage key of an entry, from the latest metadata. Keys are passed
    /// SCALE encoded.
    pub async fn storage_key(&self, prefix: &str, entry: &str, keys: &[&[u8]]) -> Result<StorageKey> {
        let runtime = self.latest_metadata().await?;
        Ok(runtime.metadata.storage_key(prefix, entry, keys)?)
    }
    /// Reads and decodes a storage value. Missing values decode to the
    /// default of the entry, `None` is returned for optional entries only.
    pub async fn query_storage(
        &self,
        prefix: &str,
        entry: &str,
        keys: &[&[u8]],
        at: Option<&str>,
    ) -> Result<Option<Value>> {
        let (runtime, key, raw) = self.read_storage(prefix, entry, keys, at).await?;
        self.dialect.decode_storage(&runtime, &key, raw.as_deref())
    }
    /// Like [`Client::query_storage`], but `None` whenever nothing is stored
    /// under the key, defaults are not applied.
    pub async fn query_stored(
        &self,
        prefix: &str,
        entry: &str,
        keys: &[&[u8]],
        at: Option<&str>,
    ) -> Result<Option<Value>> {
        match self.read_storage(prefix, entry, keys, at).await? {
            (runtime, key, Some(raw)) => self.dialect.decode_storage(&runtime, &key, Some(&raw)),
            (_, _, None) => Ok(None),
        }
    }
    async fn read_storage(
        &self,
        prefix: &str,
        entry: &str,
        keys: &[&[u8]],
        at: Option<&str>,
    ) -> Result<(Arc<RuntimeMetadata>, StorageKey, Option<Vec<u8>>)> {
        // Fails on unknown entries and wrong key counts before any request.
        let latest = self.latest_metadata().await?;
        let key = latest.metadata.storage_key(prefix, entry, keys)?;

        let (runtime, key) = match at {
            Some(at) => {
                let runtime = self.metadata(Some(at)).await?;
                let key = runtime.metadata.storage_key(prefix, entry, keys)?;
                (runtime, key)
            }
            None => (latest, key),
        };

        let raw = match self.rpc.storage(&key.to_hex(), at).await? {
            Some(value) => Some(decode_hex(&value)?),
            None => None,
        };

        Ok((runtime, key, raw))
    }
    /// Whether a value is stored under the key. Decoded values of absent
    /// `Default` entries can't tell this apart from a stored default.
    pub async fn storage_exists(
        &self,
        prefix: &str,
        entry: &str,
        keys: &[&[u8]],
        at: Option<&str>,
    ) -> Result<bool> {
        let key = match at {
            Some(at) => self.metadata(Some(at)).await?,
            None => self.latest_metadata().await?,
        }
        .metadata
        .storage_key(prefix, entry, keys)?;

        Ok(self.rpc.storage(&key.to_hex(), at).await?.is_some())
    }
    pub async fn account_info(&self, account: &AccountId32) -> Result<Option<Value>> {
        self.query_storage("System", "Account", &[account.as_ref()], None)
            .await
    }
    pub async fn nonce(&self, account: &AccountId32) -> Result<u32> {
        match self.account_info(account).await? {
            Some(info) => Ok(info.field("nonce")?.as_u32()?),
            None => Ok(0),
        }
    }
    pub async fn free_balance(&self, account: &AccountId32) -> Result<u128> {
        match self.account_info(account).await? {
            Some(info) => Ok(info.field("data")?.field("free")?.as_u128()?),
            None => Ok(0),
        }
    }
    /// A module constant of the latest runtime.
    pub async fn constant(&self, module: &str, name: &str) -> Result<Value> {
        let runtime = self.latest_metadata().await?;
        self.dialect.constant(&runtime, module, name)
    }
    pub async fn existential_deposit(&self) -> Result<u128> {
        Ok(self
            .constant("Balances", "ExistentialDeposit")
            .await?
            .as_u128()?)
    }
    /// Index of a `Module.method` call in the latest runtime.
    pub async fn call_index(&self, call: &str) -> Result<CallIndex> {
        let runtime = self.latest_metadata().await?;
        self.dialect.call_index(&runtime.metadata, call)
    }
    pub async fn block_hash(&self, number: u64) -> Result<String> {
        self.rpc
            .block_hash(Some(number))
            .await?
            .ok_or_else(|| Error::BlockNotFound(number.to_string()))
    }
    pub async fn finalized_head(&self) -> Result<String> {
        Ok(self.rpc.finalized_head().await?)
    }
    pub async fn header(&self, at: Option<&str>) -> Result<Header> {
        self.rpc
            .header(at)
            .await?
            .ok_or_else(|| Error::BlockNotFound(at.unwrap_or("best").to_string()))
    }
    /// Number of the best block.
    pub async fn latest_block_number(&self) -> Result<u64> {
        header_number(&self.header(None).await?)
    }
    pub async fn finalized_block_number(&self) -> Result<u64> {
        let hash = self.finalized_head().await?;
        header_number(&self.header(Some(&hash)).await?)
    }
    /// Decoded extrinsics of the block with the given hash.
    pub async fn extrinsics(&self, block_hash: &str) -> Result<Vec<Transaction>> {
        let block = self
            .rpc
            .block(Some(block_hash))
            .await?
            .ok_or_else(|| Error::BlockNotFound(block_hash.to_string()))?;

        let runtime = self.metadata(Some(block_hash)).await?;

        block
            .block
            .extrinsics
            .iter()
            .map(|ext| {
                let raw = decode_hex(ext)?;
                self.dialect
                    .decode_extrinsic(&runtime, self.config.address_type, &raw)
            })
            .collect()
    }
    pub async fn extrinsics_at(&self, number: u64) -> Result<Vec<Transaction>> {
        let hash = self.block_hash(number).await?;
        self.extrinsics(&hash).await
    }
    /// Timestamp (in milliseconds) and extrinsics of the block. The
    /// timestamp is taken from the `Timestamp.set` inherent.
    pub async fn block_timestamp_and_extrinsics(
        &self,
        number: u64,
    ) -> Result<(Option<u64>, Vec<Transaction>)> {
        let extrinsics = self.extrinsics_at(number).await?;

        let timestamp = extrinsics
            .iter()
            .find(|ext| ext.module == "Timestamp" && ext.call == "set")
            .and_then(|ext| ext.param("now"))
            .map(|now| now.as_u64())
            .transpose()?;

        Ok((timestamp, extrinsics))
    }
    /// Decoded events of the block with the given hash.
    pub async fn events(&self, block_hash: &str) -> Result<Vec<ChainEvent>> {
        let runtime = self.metadata(Some(block_hash)).await?;
        let key = runtime.metadata.storage_key("System", "Events", &[])?;

        match self.rpc.storage(&key.to_hex(), Some(block_hash)).await? {
            Some(raw) => self.dialect.decode_events(&runtime, &decode_hex(&raw)?),
            None => Ok(vec![]),
        }
    }
    pub async fn events_at(&self, number: u64) -> Result<Vec<ChainEvent>> {
        let hash = self.block_hash(number).await?;
        self.events(&hash).await
    }
}

pub(crate) fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(hex.trim_start_matches("0x"))?)
}

pub(crate) fn parse_hash(hash: &str) -> Result<[u8; 32]> {
    let raw = decode_hex(hash)?;
    if raw.len() != 32 {
        return Err(Error::Hex(hex::FromHexError::InvalidStringLength));
    }

    let mut out = [0; 32];
    out.copy_from_slice(&raw);
    Ok(out)
}

fn header_number(header: &Header) -> Result<u64> {
    header
        .number()
        .ok_or_else(|| Error::BlockNotFound(header.number.clone()))
}
