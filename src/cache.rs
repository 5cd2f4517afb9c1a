use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use sublink_metadata::Metadata;
use sublink_rpc::{ConnectionFactory, RpcClient};
use tokio::sync::RwLock;

/// Parsed metadata of a single runtime version.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeMetadata {
    pub spec_version: u32,
    pub tx_version: u32,
    pub metadata: Metadata,
}

#[derive(Default)]
struct State {
    versions: HashMap<u32, Arc<RuntimeMetadata>>,
    latest: Option<Arc<RuntimeMetadata>>,
}

/// Metadata by spec version, kept for the lifetime of the client. The most
/// recent runtime is tracked separately.
#[derive(Default)]
pub struct MetadataCache {
    state: RwLock<State>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Default::default()
    }
    /// Returns the metadata of the runtime at the given block (or the best
    /// block). Only the runtime version is fetched if the metadata of that
    /// version was seen before. `check` rejects metadata before it's cached.
    ///
    /// Concurrent misses of the same version may fetch twice, the first
    /// insert wins.
    pub async fn get_or_fetch<F, C>(
        &self,
        rpc: &RpcClient<F>,
        at: Option<&str>,
        check: C,
    ) -> Result<Arc<RuntimeMetadata>>
    where
        F: ConnectionFactory,
        C: FnOnce(&Metadata) -> Result<()>,
    {
        let version = rpc.runtime_version(at).await?;

        if let Some(cached) = self.get(version.spec_version).await {
            return Ok(cached);
        }

        let metadata = sublink_metadata::parse_hex_metadata(rpc.metadata(at).await?)?;
        check(&metadata)?;

        info!(
            "Caching metadata V{} of {} spec version {}",
            metadata.version, version.spec_name, version.spec_version
        );

        Ok(self.insert(RuntimeMetadata {
            spec_version: version.spec_version,
            tx_version: version.transaction_version,
            metadata,
        })
        .await)
    }
    pub async fn get(&self, spec_version: u32) -> Option<Arc<RuntimeMetadata>> {
        self.state.read().await.versions.get(&spec_version).cloned()
    }
    /// The metadata with the highest spec version seen so far.
    pub async fn latest(&self) -> Option<Arc<RuntimeMetadata>> {
        self.state.read().await.latest.clone()
    }
    pub async fn len(&self) -> usize {
        self.state.read().await.versions.len()
    }
    pub async fn insert(&self, runtime: RuntimeMetadata) -> Arc<RuntimeMetadata> {
        let mut state = self.state.write().await;

        let entry = Arc::clone(
            state
                .versions
                .entry(runtime.spec_version)
                .or_insert_with(|| Arc::new(runtime)),
        );

        let newer = state
            .latest
            .as_ref()
            .map(|latest| entry.spec_version > latest.spec_version)
            .unwrap_or(true);

        if newer {
            state.latest = Some(Arc::clone(&entry));
        }

        entry
    }
}
