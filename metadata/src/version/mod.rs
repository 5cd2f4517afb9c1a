//! Raw, version-specific layouts of the runtime metadata as returned by
//! `state_getMetadata`. Versions V10 up to V13 are supported; those are the
//! versions which describe types by name (e.g. `"Vec<T::AccountId>"`) and
//! therefore rely on an external type registry for decoding.
//!
//! Most of the inner structures never changed between those versions, only
//! the module layout (explicit `index` since V12), the extrinsic information
//! (since V11), the `Identity` hasher (since V11) and the `NMap` storage
//! entry (since V13). New enum variants were always appended, so the shared
//! types below decode every supported version.

use crate::{Error, Result};
use parity_scale_codec::{Decode, Input};

pub mod v10;
pub mod v11;
pub mod v12;
pub mod v13;

pub use v10::MetadataV10;
pub use v11::MetadataV11;
pub use v12::MetadataV12;
pub use v13::MetadataV13;

/// Identifier of the supported Substrate metadata versions.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataVersion {
    V10(MetadataV10),
    V11(MetadataV11),
    V12(MetadataV12),
    V13(MetadataV13),
}

impl MetadataVersion {
    pub const SUPPORTED: std::ops::RangeInclusive<u8> = 10..=13;

    /// Decodes the metadata body, the `meta` magic number must already be
    /// stripped. The first byte is the version identifier.
    pub fn decode_versioned(input: &mut &[u8]) -> Result<Self> {
        let version = input.read_byte().map_err(Error::ParseRawMetadata)?;

        let metadata = match version {
            10 => MetadataVersion::V10(Decode::decode(input).map_err(Error::ParseRawMetadata)?),
            11 => MetadataVersion::V11(Decode::decode(input).map_err(Error::ParseRawMetadata)?),
            12 => MetadataVersion::V12(Decode::decode(input).map_err(Error::ParseRawMetadata)?),
            13 => MetadataVersion::V13(Decode::decode(input).map_err(Error::ParseRawMetadata)?),
            other => return Err(Error::UnsupportedVersion(other)),
        };

        Ok(metadata)
    }
    /// Returns the version number as an integer.
    pub fn version_number(&self) -> u8 {
        match self {
            MetadataVersion::V10(_) => 10,
            MetadataVersion::V11(_) => 11,
            MetadataVersion::V12(_) => 12,
            MetadataVersion::V13(_) => 13,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct StorageMetadata {
    pub prefix: String,
    pub entries: Vec<StorageEntryMetadata>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct StorageEntryMetadata {
    pub name: String,
    pub modifier: StorageEntryModifier,
    pub ty: StorageEntryType,
    pub default: Vec<u8>,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StorageEntryModifier {
    Optional,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StorageEntryType {
    Plain(String),
    Map {
        hasher: StorageHasher,
        key: String,
        value: String,
        unused: bool,
    },
    DoubleMap {
        hasher: StorageHasher,
        key1: String,
        key2: String,
        value: String,
        key2_hasher: StorageHasher,
    },
    /// Available since V13.
    NMap {
        keys: Vec<String>,
        hashers: Vec<StorageHasher>,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StorageHasher {
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
    Twox128,
    Twox256,
    Twox64Concat,
    /// Available since V11.
    Identity,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FunctionMetadata {
    pub name: String,
    pub arguments: Vec<FunctionArgumentMetadata>,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct FunctionArgumentMetadata {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct EventMetadata {
    pub name: String,
    pub arguments: Vec<String>,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ModuleConstantMetadata {
    pub name: String,
    pub ty: String,
    pub value: Vec<u8>,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ErrorMetadata {
    pub name: String,
    pub documentation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ExtrinsicMetadata {
    pub version: u8,
    pub signed_extensions: Vec<String>,
}
