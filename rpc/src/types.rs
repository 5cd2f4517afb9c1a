use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest<'a, T> {
    pub id: u64,
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: T,
}

impl<'a, T> RpcRequest<'a, T> {
    pub fn new(id: u64, method: RpcMethod, params: T) -> Self {
        RpcRequest {
            id,
            jsonrpc: "2.0",
            method: method.as_str(),
            params,
        }
    }
}

/// A response to a request. The result stays untyped until it's known that
/// the node did not return an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A notification of an active subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification<T> {
    pub method: String,
    pub params: SubscriptionParams<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionParams<T> {
    pub subscription: Value,
    pub result: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    RuntimeVersion,
    Metadata,
    Storage,
    Block,
    BlockHash,
    Header,
    FinalizedHead,
    QueryInfo,
    SubmitAndWatch,
    ExtrinsicUpdate,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        use RpcMethod::*;

        match self {
            RuntimeVersion => "state_getRuntimeVersion",
            Metadata => "state_getMetadata",
            Storage => "state_getStorage",
            Block => "chain_getBlock",
            BlockHash => "chain_getBlockHash",
            Header => "chain_getHeader",
            FinalizedHead => "chain_getFinalizedHead",
            QueryInfo => "payment_queryInfo",
            SubmitAndWatch => "author_submitAndWatchExtrinsic",
            ExtrinsicUpdate => "author_extrinsicUpdate",
        }
    }
}

/// Response when calling `chain_getHeader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub digest: Value,
    #[serde(rename = "extrinsicsRoot")]
    pub extrinsics_root: String,
    pub number: String,
    #[serde(rename = "parentHash")]
    pub parent_hash: String,
    #[serde(rename = "stateRoot")]
    pub state_root: String,
}

impl Header {
    /// The block number, transmitted as `0x` prefixed hex.
    pub fn number(&self) -> Option<u64> {
        u64::from_str_radix(self.number.trim_start_matches("0x"), 16).ok()
    }
}

/// Response when calling `chain_getBlock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedBlock {
    pub block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    /// `0x` prefixed hex of each encoded extrinsic.
    pub extrinsics: Vec<String>,
}

/// Response when calling `state_getRuntimeVersion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    #[serde(default)]
    pub apis: Vec<(String, u32)>,
    #[serde(rename = "authoringVersion")]
    pub authoring_version: u32,
    #[serde(rename = "implName")]
    pub impl_name: String,
    #[serde(rename = "implVersion")]
    pub impl_version: u32,
    #[serde(rename = "specName")]
    pub spec_name: String,
    #[serde(rename = "specVersion")]
    pub spec_version: u32,
    #[serde(rename = "transactionVersion", default)]
    pub transaction_version: u32,
}

/// Response when calling `payment_queryInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentQueryInfo {
    pub weight: u64,
    pub class: String,
    #[serde(rename = "partialFee")]
    pub partial_fee: String,
}

impl PaymentQueryInfo {
    pub fn partial_fee(&self) -> Option<u128> {
        self.partial_fee.parse().ok()
    }
}

/// Status updates of a watched extrinsic, as sent by
/// `author_extrinsicUpdate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtrinsicStatus {
    Future,
    Ready,
    Broadcast(Vec<String>),
    InBlock(String),
    Retracted(String),
    FinalityTimeout(String),
    Finalized(String),
    Usurped(String),
    Dropped,
    Invalid,
}

impl ExtrinsicStatus {
    /// Whether no further updates follow for the extrinsic.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ExtrinsicStatus::Future | ExtrinsicStatus::Ready | ExtrinsicStatus::Broadcast(_)
        )
    }
}
