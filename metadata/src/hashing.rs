//! Hashing primitives used for storage keys and signing payloads.

use crate::version::StorageHasher;
use std::hash::Hasher;
use twox_hash::XxHash64;

pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0; 16];
    out.copy_from_slice(blake2_rfc::blake2b::blake2b(16, &[], data).as_bytes());
    out
}

pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0; 32];
    out.copy_from_slice(blake2_rfc::blake2b::blake2b(32, &[], data).as_bytes());
    out
}

pub fn twox_64(data: &[u8]) -> [u8; 8] {
    let mut out = [0; 8];
    twox_into(data, &mut out);
    out
}

pub fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0; 16];
    twox_into(data, &mut out);
    out
}

pub fn twox_256(data: &[u8]) -> [u8; 32] {
    let mut out = [0; 32];
    twox_into(data, &mut out);
    out
}

// Each 8-byte chunk is a XxHash64 run seeded with the chunk index.
fn twox_into(data: &[u8], dest: &mut [u8]) {
    for (seed, chunk) in dest.chunks_mut(8).enumerate() {
        let mut hasher = XxHash64::with_seed(seed as u64);
        hasher.write(data);
        chunk.copy_from_slice(&hasher.finish().to_le_bytes());
    }
}

impl StorageHasher {
    /// Hashes the key, appending the raw key for the `Concat` variants and
    /// returning it unchanged for `Identity`.
    pub fn hash(&self, key: &[u8]) -> Vec<u8> {
        let mut out = match self {
            StorageHasher::Blake2_128 | StorageHasher::Blake2_128Concat => {
                blake2_128(key).to_vec()
            }
            StorageHasher::Blake2_256 => blake2_256(key).to_vec(),
            StorageHasher::Twox128 => twox_128(key).to_vec(),
            StorageHasher::Twox256 => twox_256(key).to_vec(),
            StorageHasher::Twox64Concat => twox_64(key).to_vec(),
            StorageHasher::Identity => Vec::with_capacity(key.len()),
        };

        if self.is_concat() {
            out.extend_from_slice(key);
        }

        out
    }
    /// Whether the raw key is recoverable from the hashed key.
    pub fn is_concat(&self) -> bool {
        matches!(
            self,
            StorageHasher::Blake2_128Concat | StorageHasher::Twox64Concat | StorageHasher::Identity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use test_case::test_case;

    #[test_case(b"System", hex!("26aa394eea5630e07c48ae0c9558cef7"); "system")]
    #[test_case(b"Events", hex!("80d41e5e16056765bc8461851072c9d7"); "events")]
    #[test_case(b"Account", hex!("b99d880ec681799c0cf30e8886371da9"); "account")]
    fn twox_128_known_vectors(input: &[u8], expected: [u8; 16]) {
        assert_eq!(twox_128(input), expected);
    }

    #[test]
    fn blake2_256_empty() {
        assert_eq!(
            blake2_256(b""),
            hex!("0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8")
        );
    }

    #[test]
    fn twox_wider_outputs_share_prefix() {
        let data = b"sublink";
        assert_eq!(twox_128(data)[..8], twox_64(data)[..]);
        assert_eq!(twox_256(data)[..16], twox_128(data)[..]);
    }

    #[test_case(StorageHasher::Blake2_128, 16; "blake2_128")]
    #[test_case(StorageHasher::Blake2_256, 32; "blake2_256")]
    #[test_case(StorageHasher::Blake2_128Concat, 16 + 4; "blake2_128_concat")]
    #[test_case(StorageHasher::Twox128, 16; "twox_128")]
    #[test_case(StorageHasher::Twox256, 32; "twox_256")]
    #[test_case(StorageHasher::Twox64Concat, 8 + 4; "twox_64_concat")]
    #[test_case(StorageHasher::Identity, 4; "identity")]
    fn hasher_output_length(hasher: StorageHasher, len: usize) {
        let key = [1u8, 2, 3, 4];
        let hashed = hasher.hash(&key);
        assert_eq!(hashed.len(), len);
        if hasher.is_concat() {
            assert!(hashed.ends_with(&key));
        }
    }
}
