//! Websocket client for substrate-based chains. Storage, events and
//! extrinsics are decoded from the runtime metadata and the type
//! definitions of the chain dialect.
//!
//! # Example
//!
//! ```no_run
//! use sublink::{ChainType, Client, ClientConfig};
//! use sublink::common::{AccountId32, CryptoType, KeyringPair};
//! use sublink::CancellationToken;
//!
//! # async fn run() -> sublink::Result<()> {
//! let config = ClientConfig::new("wss://rpc.polkadot.io", ChainType::Polkadot);
//! let signer = KeyringPair::from_seed(CryptoType::Sr25519, &[1; 32])?;
//! let client = Client::connect(config, Some(signer)).await?;
//!
//! let dest = AccountId32::from_ss58_address("15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5")?;
//! let block = client.transfer(&dest, 10_000_000_000, &CancellationToken::new()).await?;
//! println!("included in {}", block);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

pub use self::cache::{MetadataCache, RuntimeMetadata};
pub use self::client::Client;
pub use self::config::{ChainType, ClientConfig, EraConfig};
pub use self::dialect::{new_dialect, Dialect, Polkadot, Stafi};
pub use self::error::Error;
pub use self::model::{CallArg, CallParam, ChainEvent, EventParam, OpaqueCall, Transaction};
pub use self::rtoken::{RSymbol, StakingLedger};
pub use sublink_interface::common;
pub use sublink_metadata::{CallIndex, Metadata, StorageKey};
pub use sublink_rpc::{CancellationToken, PoolConfig, RetryConfig};
pub use sublink_types::{TypeRegistry, Value};

pub type Result<T> = std::result::Result<T, Error>;

pub mod cache;
pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod model;
pub mod rtoken;
mod tx;

#[cfg(test)]
mod test_utils;
