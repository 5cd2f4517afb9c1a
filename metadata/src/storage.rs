use crate::hashing::twox_128;
use crate::model::Metadata;
use crate::version::{StorageEntryMetadata, StorageEntryModifier, StorageEntryType, StorageHasher};
use crate::{Error, Result};

/// A fully built storage key, together with the information required to
/// decode the value stored under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    key: Vec<u8>,
    value_ty: String,
    modifier: StorageEntryModifier,
    default: Vec<u8>,
}

impl StorageKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.key
    }
    /// `0x` prefixed hex, as expected by `state_getStorage`.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.key))
    }
    /// The declared type name of the stored value.
    pub fn value_type(&self) -> &str {
        &self.value_ty
    }
    pub fn modifier(&self) -> StorageEntryModifier {
        self.modifier
    }
    /// The value to assume when nothing is stored under the key. Only
    /// available for entries with the `Default` modifier.
    pub fn default_value(&self) -> Option<&[u8]> {
        match self.modifier {
            StorageEntryModifier::Default => Some(&self.default),
            StorageEntryModifier::Optional => None,
        }
    }
}

impl StorageEntryType {
    /// The hashers of the entry, one per expected key argument.
    pub fn hashers(&self) -> Vec<StorageHasher> {
        match self {
            StorageEntryType::Plain(_) => vec![],
            StorageEntryType::Map { hasher, .. } => vec![*hasher],
            StorageEntryType::DoubleMap {
                hasher, key2_hasher, ..
            } => vec![*hasher, *key2_hasher],
            StorageEntryType::NMap { hashers, .. } => hashers.clone(),
        }
    }
    /// The type names of the expected key arguments.
    pub fn key_types(&self) -> Vec<&str> {
        match self {
            StorageEntryType::Plain(_) => vec![],
            StorageEntryType::Map { key, .. } => vec![key],
            StorageEntryType::DoubleMap { key1, key2, .. } => vec![key1, key2],
            StorageEntryType::NMap { keys, .. } => keys.iter().map(|k| k.as_str()).collect(),
        }
    }
    pub fn arity(&self) -> usize {
        match self {
            StorageEntryType::Plain(_) => 0,
            StorageEntryType::Map { .. } => 1,
            StorageEntryType::DoubleMap { .. } => 2,
            StorageEntryType::NMap { keys, .. } => keys.len(),
        }
    }
    pub fn value_type(&self) -> &str {
        match self {
            StorageEntryType::Plain(value)
            | StorageEntryType::Map { value, .. }
            | StorageEntryType::DoubleMap { value, .. }
            | StorageEntryType::NMap { value, .. } => value,
        }
    }
}

/// `twox128(prefix) ++ twox128(entry)`, the common prefix of every key of
/// the entry.
pub fn storage_prefix(prefix: &str, entry: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&twox_128(prefix.as_bytes()));
    key.extend_from_slice(&twox_128(entry.as_bytes()));
    key
}

fn build_key(
    prefix: &str,
    entry: &StorageEntryMetadata,
    keys: &[&[u8]],
) -> Result<StorageKey> {
    let arity = entry.ty.arity();
    if keys.len() != arity {
        return Err(Error::StorageArity {
            module: prefix.to_string(),
            entry: entry.name.clone(),
            expected: arity,
            found: keys.len(),
        });
    }

    let mut key = storage_prefix(prefix, &entry.name);
    for (hasher, arg) in entry.ty.hashers().iter().zip(keys) {
        key.extend(hasher.hash(arg));
    }

    Ok(StorageKey {
        key,
        value_ty: entry.ty.value_type().to_string(),
        modifier: entry.modifier,
        default: entry.default.clone(),
    })
}

impl Metadata {
    /// Builds the storage key for the entry. Each key argument must already
    /// be SCALE encoded.
    pub fn storage_key(&self, prefix: &str, entry: &str, keys: &[&[u8]]) -> Result<StorageKey> {
        let entry = self.storage_entry(prefix, entry)?;
        build_key(prefix, entry, keys)
    }
    /// The prefix shared by all keys of the entry, for iterating maps.
    pub fn storage_key_prefix(&self, prefix: &str, entry: &str) -> Result<Vec<u8>> {
        let entry = self.storage_entry(prefix, entry)?;
        Ok(storage_prefix(prefix, &entry.name))
    }
}
