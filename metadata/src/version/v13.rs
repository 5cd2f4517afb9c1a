use super::v12::ModuleMetadataV12;
use super::ExtrinsicMetadata;
use crate::model::Metadata;

/// Same layout as V12. The only change is the `NMap` storage entry type.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct MetadataV13 {
    pub modules: Vec<ModuleMetadataV12>,
    pub extrinsic: ExtrinsicMetadata,
}

impl From<MetadataV13> for Metadata {
    fn from(val: MetadataV13) -> Self {
        Metadata {
            version: 13,
            modules: val.modules.into_iter().map(Into::into).collect(),
            extrinsic: Some(val.extrinsic),
        }
    }
}
