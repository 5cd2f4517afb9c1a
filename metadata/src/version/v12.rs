use super::{
    ErrorMetadata, EventMetadata, ExtrinsicMetadata, FunctionMetadata, ModuleConstantMetadata,
    StorageMetadata,
};
use crate::model::{Metadata, Module};

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct MetadataV12 {
    pub modules: Vec<ModuleMetadataV12>,
    pub extrinsic: ExtrinsicMetadata,
}

/// Module layout of V12 and V13, which carries an explicit index. That index
/// is used for both calls and events.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ModuleMetadataV12 {
    pub name: String,
    pub storage: Option<StorageMetadata>,
    pub calls: Option<Vec<FunctionMetadata>>,
    pub events: Option<Vec<EventMetadata>>,
    pub constants: Vec<ModuleConstantMetadata>,
    pub errors: Vec<ErrorMetadata>,
    pub index: u8,
}

impl From<ModuleMetadataV12> for Module {
    fn from(val: ModuleMetadataV12) -> Self {
        let index = val.index;

        Module {
            name: val.name,
            index,
            call_index: val.calls.as_ref().map(|_| index),
            event_index: val.events.as_ref().map(|_| index),
            storage: val.storage,
            calls: val.calls,
            events: val.events,
            constants: val.constants,
            errors: val.errors,
        }
    }
}

impl From<MetadataV12> for Metadata {
    fn from(val: MetadataV12) -> Self {
        Metadata {
            version: 12,
            modules: val.modules.into_iter().map(Into::into).collect(),
            extrinsic: Some(val.extrinsic),
        }
    }
}
