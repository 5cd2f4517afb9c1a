//! Utilities to parse and process substrate metadata: decoding of the
//! versioned metadata blob, storage key building and call index resolution.
//!
//! # Example
//!
//! ```no_run
//! use sublink_metadata::*;
//!
//! // Parse runtime metadata
//! let content = std::fs::read_to_string("metadata_stafi.hex").unwrap();
//! let metadata = parse_hex_metadata(content).unwrap();
//!
//! let index = metadata.find_call_index("Balances.transfer").unwrap();
//! assert_eq!(index, CallIndex::new(4, 3));
//!
//! let key = metadata
//!     .storage_key("System", "Account", &[&[0u8; 32]])
//!     .unwrap();
//! println!("0x{}", hex::encode(key.as_bytes()));
//! ```

#[macro_use]
extern crate serde;
#[macro_use]
extern crate parity_scale_codec;

use parity_scale_codec::Error as ScaleError;
use serde_json::Error as SerdeJsonError;

pub use self::hashing::*;
pub use self::model::{CallIndex, Metadata, Module};
pub use self::storage::StorageKey;
pub use self::version::*;

pub type Result<T> = std::result::Result<T, Error>;

pub mod hashing;
pub mod model;
pub mod storage;
pub mod version;

#[cfg(test)]
mod test_utils;

/// Errors that can occur when parsing or querying Substrate metadata.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse JSON-RPC metadata response: {0}")]
    ParseJsonRpcMetadata(SerdeJsonError),
    #[error("failed to parse hex metadata: {0}")]
    ParseHexMetadata(hex::FromHexError),
    #[error("failed to decode raw metadata: {0}")]
    ParseRawMetadata(ScaleError),
    #[error("unsupported metadata version: V{0}")]
    UnsupportedVersion(u8),
    #[error("module not found: {0}")]
    ModuleNotFound(String),
    #[error("storage entry not found: {module}.{entry}")]
    StorageNotFound { module: String, entry: String },
    #[error("storage entry {module}.{entry} expects {expected} key(s), got {found}")]
    StorageArity {
        module: String,
        entry: String,
        expected: usize,
        found: usize,
    },
    #[error("malformed call name, expected \"Module.method\": {0}")]
    MalformedCall(String),
    #[error("module {module} has no calls or does not exist (in {call})")]
    CallModuleNotFound { module: String, call: String },
    #[error("call {method} not found in module {module} (in {call})")]
    CallMethodNotFound {
        method: String,
        module: String,
        call: String,
    },
    #[error("unknown call index {0}")]
    UnknownCallIndex(CallIndex),
    #[error("unknown event index {0}/{1}")]
    UnknownEventIndex(u8, u8),
    #[error("constant not found: {module}.{name}")]
    ConstantNotFound { module: String, name: String },
}

/// Helper type when dealing with the Json RPC response returned by
/// Substrates `state_getMetadata`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub result: String,
}

/// Convenience function for parsing the Json RPC response returned by Substrates
/// `state_getMetadata`.
///
/// Must fit the [`JsonRpcResponse`] structure.
pub fn parse_jsonrpc_metadata<T: AsRef<[u8]>>(json: T) -> Result<Metadata> {
    let resp = serde_json::from_slice::<JsonRpcResponse>(json.as_ref())
        .map_err(Error::ParseJsonRpcMetadata)?;

    parse_hex_metadata(resp.result.as_bytes())
}

/// Convenience function for parsing the metadata from a HEX representation, as
/// returned by `state_getMetadata`.
pub fn parse_hex_metadata<T: AsRef<[u8]>>(hex: T) -> Result<Metadata> {
    let hex = hex.as_ref();

    // The `hex` crate does not handle `0x`...
    let slice = if hex.starts_with(b"0x") {
        hex[2..].as_ref()
    } else {
        hex
    };

    parse_raw_metadata(hex::decode(slice).map_err(Error::ParseHexMetadata)?)
}

/// Parse the raw Substrate metadata.
pub fn parse_raw_metadata<T: AsRef<[u8]>>(raw: T) -> Result<Metadata> {
    parse_raw_versioned(raw).map(Metadata::from)
}

/// Like [`parse_raw_metadata`], but keeps the version-specific layout.
pub fn parse_raw_versioned<T: AsRef<[u8]>>(raw: T) -> Result<MetadataVersion> {
    let raw = raw.as_ref();

    // The hex blob returned by `state_getMetadata` starts with the magic
    // number 0x6d657461 ("meta").
    let mut slice = if raw.starts_with(b"meta") {
        raw[4..].as_ref()
    } else {
        raw
    };

    MetadataVersion::decode_versioned(&mut slice)
}

impl From<MetadataVersion> for Metadata {
    fn from(val: MetadataVersion) -> Self {
        match val {
            MetadataVersion::V10(m) => m.into(),
            MetadataVersion::V11(m) => m.into(),
            MetadataVersion::V12(m) => m.into(),
            MetadataVersion::V13(m) => m.into(),
        }
    }
}
