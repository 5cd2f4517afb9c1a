//! Decoded chain data as returned by the client.

use sublink_interface::common::{AccountId32, Address};
use sublink_types::Value;

/// An argument of a call to encode.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    Value(Value),
    /// Already SCALE encoded, appended as is.
    Encoded(Vec<u8>),
}

impl From<Value> for CallArg {
    fn from(value: Value) -> Self {
        CallArg::Value(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventParam {
    pub ty: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainEvent {
    pub module: String,
    pub event: String,
    /// Index of the extrinsic which emitted the event, if any.
    pub extrinsic_index: Option<u32>,
    pub phase: Value,
    pub params: Vec<EventParam>,
    pub topics: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallParam {
    pub name: String,
    pub ty: String,
    pub value: Value,
}

/// An extrinsic of a block with its decoded call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub module: String,
    pub call: String,
    pub signer: Option<Address>,
    pub nonce: Option<u32>,
    pub tip: Option<u128>,
    pub params: Vec<CallParam>,
}

impl Transaction {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| &param.value)
    }
    pub fn signer_account(&self) -> Option<&AccountId32> {
        self.signer.as_ref().and_then(|signer| signer.account_id())
    }
}

/// A call wrapped for a multisig or proxy workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueCall {
    /// The call as unsigned extrinsic, hex encoded.
    pub extrinsic: String,
    /// The encoded call.
    pub opaque: Vec<u8>,
    /// Blake2 256 hash of the encoded call, hex encoded.
    pub call_hash: String,
}
