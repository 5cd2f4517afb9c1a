//! Primitives for interacting with Substrate chains: accounts and addresses,
//! keypairs and signatures, mortality eras and the transaction envelope.

#[macro_use]
extern crate serde;

pub mod common;
pub mod transaction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("builder is missing field: {0}")]
    BuilderMissingField(&'static str),
    #[error("invalid SS58 address: {0}")]
    InvalidSs58(&'static str),
    #[error("invalid secret seed")]
    InvalidSeed,
    #[error("failed to decode: {0}")]
    Codec(#[from] parity_scale_codec::Error),
}

/// Blake2b hash with a 256-bit output.
pub fn blake2b(data: &[u8]) -> [u8; 32] {
    let mut hash = [0; 32];
    hash.copy_from_slice(blake2_rfc::blake2b::blake2b(32, &[], data).as_bytes());
    hash
}
