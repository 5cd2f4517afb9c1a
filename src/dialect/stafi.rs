use super::{load_registry, Dialect};
use crate::cache::MetadataCache;
use crate::config::ChainType;
use crate::Result;
use std::path::Path;
use sublink_interface::common::AddressType;
use sublink_metadata::{Metadata, ModuleConstantMetadata};
use sublink_types::TypeRegistry;

const DEFAULT_TYPES: &str = include_str!("../defaults/stafi.json");

/// Stafi runtimes, metadata V10 to V13. Constants are looked up by module
/// name.
pub struct Stafi {
    registry: TypeRegistry,
    cache: MetadataCache,
}

impl Stafi {
    pub fn new(address_type: AddressType, types_path: Option<&Path>) -> Result<Self> {
        Ok(Stafi {
            registry: load_registry(DEFAULT_TYPES, address_type, types_path)?,
            cache: MetadataCache::new(),
        })
    }
}

impl Dialect for Stafi {
    fn chain(&self) -> ChainType {
        ChainType::Stafi
    }
    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
    fn cache(&self) -> &MetadataCache {
        &self.cache
    }
    fn supports(&self, version: u8) -> bool {
        (10..=13).contains(&version)
    }
    fn find_constant<'a>(
        &self,
        metadata: &'a Metadata,
        module: &str,
        name: &str,
    ) -> Result<&'a ModuleConstantMetadata> {
        Ok(metadata.find_constant(module, name)?)
    }
}
