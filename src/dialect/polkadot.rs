use super::{load_registry, Dialect};
use crate::cache::MetadataCache;
use crate::config::ChainType;
use crate::Result;
use std::path::Path;
use sublink_interface::common::AddressType;
use sublink_metadata::{Metadata, ModuleConstantMetadata};
use sublink_types::TypeRegistry;

const DEFAULT_TYPES: &str = include_str!("../defaults/polkadot.json");

/// Polkadot and its relatives, metadata V12 and V13.
pub struct Polkadot {
    registry: TypeRegistry,
    cache: MetadataCache,
}

impl Polkadot {
    pub fn new(address_type: AddressType, types_path: Option<&Path>) -> Result<Self> {
        Ok(Polkadot {
            registry: load_registry(DEFAULT_TYPES, address_type, types_path)?,
            cache: MetadataCache::new(),
        })
    }
}

impl Dialect for Polkadot {
    fn chain(&self) -> ChainType {
        ChainType::Polkadot
    }
    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
    fn cache(&self) -> &MetadataCache {
        &self.cache
    }
    fn supports(&self, version: u8) -> bool {
        (12..=13).contains(&version)
    }
    /// Looks up the module by its storage prefix, e.g. `PhragmenElection`
    /// for the `ElectionsPhragmen` module.
    fn find_constant<'a>(
        &self,
        metadata: &'a Metadata,
        module: &str,
        name: &str,
    ) -> Result<&'a ModuleConstantMetadata> {
        Ok(metadata.find_constant_by_prefix(module, name)?)
    }
}
