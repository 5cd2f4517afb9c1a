use super::{
    ErrorMetadata, EventMetadata, FunctionMetadata, ModuleConstantMetadata, StorageMetadata,
};
use crate::model::{Metadata, Module};

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct MetadataV10 {
    pub modules: Vec<ModuleMetadataV10>,
}

/// Module layout of V10 and V11. The module index is not part of the
/// metadata, it's derived from the position of the module.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ModuleMetadataV10 {
    pub name: String,
    pub storage: Option<StorageMetadata>,
    pub calls: Option<Vec<FunctionMetadata>>,
    pub events: Option<Vec<EventMetadata>>,
    pub constants: Vec<ModuleConstantMetadata>,
    pub errors: Vec<ErrorMetadata>,
}

impl ModuleMetadataV10 {
    pub(crate) fn into_module(self, position: usize) -> Module {
        Module {
            name: self.name,
            index: position as u8,
            call_index: None,
            event_index: None,
            storage: self.storage,
            calls: self.calls,
            events: self.events,
            constants: self.constants,
            errors: self.errors,
        }
    }
}

impl From<MetadataV10> for Metadata {
    fn from(val: MetadataV10) -> Self {
        let modules = val
            .modules
            .into_iter()
            .enumerate()
            .map(|(position, module)| module.into_module(position))
            .collect();

        Metadata::with_implicit_indices(10, modules, None)
    }
}
