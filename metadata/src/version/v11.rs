use super::v10::ModuleMetadataV10;
use super::ExtrinsicMetadata;
use crate::model::Metadata;

/// Same module layout as V10, adds the extrinsic information and the
/// `Identity` storage hasher.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct MetadataV11 {
    pub modules: Vec<ModuleMetadataV10>,
    pub extrinsic: ExtrinsicMetadata,
}

impl From<MetadataV11> for Metadata {
    fn from(val: MetadataV11) -> Self {
        let modules = val
            .modules
            .into_iter()
            .enumerate()
            .map(|(position, module)| module.into_module(position))
            .collect();

        Metadata::with_implicit_indices(11, modules, Some(val.extrinsic))
    }
}
