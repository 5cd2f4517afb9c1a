//! Runtime fixtures and a scripted node answering every request the client
//! makes.

use crate::cache::RuntimeMetadata;
use crate::{Client, ClientConfig};
use parity_scale_codec::{Compact, Encode};
use serde_json::{json, Value as Json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use sublink_interface::common::KeyringPair;
use sublink_metadata::v10::ModuleMetadataV10;
use sublink_metadata::v12::ModuleMetadataV12;
use sublink_metadata::*;
use sublink_rpc::mock::{MockFactory, MockReply};
use sublink_rpc::{Pool, RpcClient};

pub const ALICE: [u8; 32] = [1; 32];
pub const BOB: [u8; 32] = [2; 32];
pub const SPEC_VERSION: u32 = 9050;
pub const TX_VERSION: u32 = 7;

fn entry(
    name: &str,
    modifier: StorageEntryModifier,
    ty: StorageEntryType,
    default: Vec<u8>,
) -> StorageEntryMetadata {
    StorageEntryMetadata {
        name: name.to_string(),
        modifier,
        ty,
        default,
        documentation: vec![],
    }
}

fn map(key: &str, value: &str) -> StorageEntryType {
    StorageEntryType::Map {
        hasher: StorageHasher::Blake2_128Concat,
        key: key.to_string(),
        value: value.to_string(),
        unused: false,
    }
}

fn call(name: &str, args: &[(&str, &str)]) -> FunctionMetadata {
    FunctionMetadata {
        name: name.to_string(),
        arguments: args
            .iter()
            .map(|(name, ty)| FunctionArgumentMetadata {
                name: name.to_string(),
                ty: ty.to_string(),
            })
            .collect(),
        documentation: vec![],
    }
}

fn event(name: &str, args: &[&str]) -> EventMetadata {
    EventMetadata {
        name: name.to_string(),
        arguments: args.iter().map(|a| a.to_string()).collect(),
        documentation: vec![],
    }
}

fn constant(name: &str, ty: &str, value: Vec<u8>) -> ModuleConstantMetadata {
    ModuleConstantMetadata {
        name: name.to_string(),
        ty: ty.to_string(),
        value,
        documentation: vec![],
    }
}

fn module(name: &str, index: u8, prefix: Option<&str>) -> ModuleMetadataV12 {
    ModuleMetadataV12 {
        name: name.to_string(),
        storage: prefix.map(|prefix| StorageMetadata {
            prefix: prefix.to_string(),
            entries: vec![],
        }),
        calls: None,
        events: None,
        constants: vec![],
        errors: vec![],
        index,
    }
}

fn with_entries(mut module: ModuleMetadataV12, entries: Vec<StorageEntryMetadata>) -> ModuleMetadataV12 {
    if let Some(storage) = module.storage.as_mut() {
        storage.entries = entries;
    }
    module
}

pub fn metadata_v12() -> MetadataV12 {
    let lookup = "<T::Lookup as StaticLookup>::Source";

    let system = ModuleMetadataV12 {
        calls: Some(vec![call("remark", &[("_remark", "Vec<u8>")])]),
        events: Some(vec![
            event("ExtrinsicSuccess", &["DispatchInfo"]),
            event("ExtrinsicFailed", &["DispatchError", "DispatchInfo"]),
        ]),
        ..with_entries(
            module("System", 0, Some("System")),
            vec![
                entry(
                    "Account",
                    StorageEntryModifier::Default,
                    map("T::AccountId", "AccountInfo<T::Index, T::AccountData>"),
                    vec![0; 80],
                ),
                entry(
                    "Events",
                    StorageEntryModifier::Default,
                    StorageEntryType::Plain("Vec<EventRecord<T::Event, T::Hash>>".into()),
                    vec![0],
                ),
            ],
        )
    };

    let timestamp = ModuleMetadataV12 {
        calls: Some(vec![call("set", &[("now", "Compact<T::Moment>")])]),
        ..module("Timestamp", 2, Some("Timestamp"))
    };

    let balances = ModuleMetadataV12 {
        calls: Some(vec![
            call("transfer", &[("dest", lookup), ("value", "Compact<T::Balance>")]),
            call(
                "set_balance",
                &[
                    ("who", lookup),
                    ("new_free", "Compact<T::Balance>"),
                    ("new_reserved", "Compact<T::Balance>"),
                ],
            ),
            call(
                "force_transfer",
                &[
                    ("source", lookup),
                    ("dest", lookup),
                    ("value", "Compact<T::Balance>"),
                ],
            ),
            call(
                "transfer_keep_alive",
                &[("dest", lookup), ("value", "Compact<T::Balance>")],
            ),
        ]),
        events: Some(vec![event(
            "Transfer",
            &["AccountId", "AccountId", "Balance"],
        )]),
        constants: vec![constant(
            "ExistentialDeposit",
            "T::Balance",
            500u128.encode(),
        )],
        ..with_entries(
            module("Balances", 4, Some("Balances")),
            vec![entry(
                "TotalIssuance",
                StorageEntryModifier::Default,
                StorageEntryType::Plain("T::Balance".into()),
                vec![0; 16],
            )],
        )
    };

    let staking = ModuleMetadataV12 {
        calls: Some(vec![
            call("bond_extra", &[("max_additional", "Compact<BalanceOf<T>>")]),
            call("unbond", &[("value", "Compact<BalanceOf<T>>")]),
            call("withdraw_unbonded", &[("num_slashing_spans", "u32")]),
            call("nominate", &[("targets", "Vec<<T::Lookup as StaticLookup>::Source>")]),
        ]),
        ..with_entries(
            module("Staking", 6, Some("Staking")),
            vec![
                entry(
                    "Ledger",
                    StorageEntryModifier::Optional,
                    map("T::AccountId", "StakingLedger<T::AccountId, BalanceOf<T>>"),
                    vec![],
                ),
                entry(
                    "ActiveEra",
                    StorageEntryModifier::Optional,
                    StorageEntryType::Plain("ActiveEraInfo".into()),
                    vec![],
                ),
                entry(
                    "ErasStakers",
                    StorageEntryModifier::Default,
                    StorageEntryType::DoubleMap {
                        hasher: StorageHasher::Twox64Concat,
                        key1: "EraIndex".into(),
                        key2: "T::AccountId".into(),
                        value: "Exposure<T::AccountId, BalanceOf<T>>".into(),
                        key2_hasher: StorageHasher::Twox64Concat,
                    },
                    vec![0, 0, 0],
                ),
            ],
        )
    };

    let elections = ModuleMetadataV12 {
        constants: vec![constant("CandidacyBond", "BalanceOf<T>", 100u128.encode())],
        ..module("ElectionsPhragmen", 17, Some("PhragmenElection"))
    };

    let utility = ModuleMetadataV12 {
        calls: Some(vec![call("batch", &[("calls", "Vec<<T as Config>::Call>")])]),
        ..module("Utility", 26, None)
    };

    let rtoken_ledger = with_entries(
        module("RTokenLedger", 40, Some("RTokenLedger")),
        vec![
            entry("ChainEras", StorageEntryModifier::Optional, map("RSymbol", "u32"), vec![]),
            entry(
                "ActiveChangeRateLimit",
                StorageEntryModifier::Optional,
                map("RSymbol", "Perbill"),
                vec![],
            ),
            entry(
                "CurrentEraSnapShots",
                StorageEntryModifier::Optional,
                map("RSymbol", "Vec<T::Hash>"),
                vec![],
            ),
            entry(
                "Receiver",
                StorageEntryModifier::Optional,
                StorageEntryType::Plain("T::AccountId".into()),
                vec![],
            ),
        ],
    );

    let rbalances = ModuleMetadataV12 {
        events: Some(vec![event(
            "Transfer",
            &["AccountId", "AccountId", "RSymbol", "u128"],
        )]),
        ..with_entries(
            module("RBalances", 41, Some("RBalances")),
            vec![entry(
                "TotalIssuance",
                StorageEntryModifier::Default,
                map("RSymbol", "u128"),
                vec![0; 16],
            )],
        )
    };

    let rtoken_rate = with_entries(
        module("RTokenRate", 42, Some("RTokenRate")),
        vec![entry(
            "EraRate",
            StorageEntryModifier::Optional,
            StorageEntryType::DoubleMap {
                hasher: StorageHasher::Twox64Concat,
                key1: "RSymbol".into(),
                key2: "u32".into(),
                value: "RateType".into(),
                key2_hasher: StorageHasher::Twox64Concat,
            },
            vec![],
        )],
    );

    let rclaim = with_entries(
        module("RClaim", 43, Some("RClaim")),
        vec![entry(
            "MintTxHashExist",
            StorageEntryModifier::Default,
            map("Vec<u8>", "bool"),
            vec![0],
        )],
    );

    let rdex = ModuleMetadataV12 {
        events: Some(vec![
            event(
                "Swap",
                &["AccountId", "RSymbol", "u128", "u128", "u128", "bool", "u128", "u128"],
            ),
            event(
                "AddLiquidity",
                &["AccountId", "RSymbol", "u128", "u128", "u128", "u128", "u128", "u128"],
            ),
            event(
                "RemoveLiquidity",
                &[
                    "AccountId", "RSymbol", "u128", "u128", "u128", "u128", "bool", "u128",
                    "u128",
                ],
            ),
        ]),
        ..module("RDexSwap", 44, None)
    };

    let multisig = ModuleMetadataV12 {
        events: Some(vec![
            event("NewMultisig", &["AccountId", "AccountId", "CallHash"]),
            event(
                "MultisigExecuted",
                &[
                    "AccountId",
                    "Timepoint<BlockNumber>",
                    "AccountId",
                    "CallHash",
                    "DispatchResult",
                ],
            ),
        ]),
        ..module("Multisig", 45, None)
    };

    MetadataV12 {
        modules: vec![
            system,
            timestamp,
            balances,
            staking,
            elections,
            utility,
            rtoken_ledger,
            rbalances,
            rtoken_rate,
            rclaim,
            rdex,
            multisig,
        ],
        extrinsic: ExtrinsicMetadata {
            version: 4,
            signed_extensions: vec![
                "CheckSpecVersion".into(),
                "CheckTxVersion".into(),
                "CheckGenesis".into(),
                "CheckMortality".into(),
                "CheckNonce".into(),
                "CheckWeight".into(),
                "ChargeTransactionPayment".into(),
            ],
        },
    }
}

pub fn metadata() -> Metadata {
    metadata_v12().into()
}

pub fn runtime() -> RuntimeMetadata {
    RuntimeMetadata {
        spec_version: SPEC_VERSION,
        tx_version: TX_VERSION,
        metadata: metadata(),
    }
}

/// As returned by `state_getMetadata`.
pub fn metadata_hex() -> String {
    let mut raw = b"meta".to_vec();
    raw.push(12);
    metadata_v12().encode_to(&mut raw);
    format!("0x{}", hex::encode(raw))
}

/// The same runtime, in the V11 format.
pub fn metadata_v11_hex() -> String {
    let v12 = metadata_v12();
    let v11 = MetadataV11 {
        modules: v12
            .modules
            .into_iter()
            .map(|m| ModuleMetadataV10 {
                name: m.name,
                storage: m.storage,
                calls: m.calls,
                events: m.events,
                constants: m.constants,
                errors: m.errors,
            })
            .collect(),
        extrinsic: v12.extrinsic,
    };

    let mut raw = b"meta".to_vec();
    raw.push(11);
    v11.encode_to(&mut raw);
    format!("0x{}", hex::encode(raw))
}

/// `System.Events` with a successful extrinsic and a transfer of 1000 from
/// Alice to Bob.
pub fn events_raw() -> Vec<u8> {
    let mut raw = Compact(2u32).encode();

    // ApplyExtrinsic(0), System.ExtrinsicSuccess
    raw.push(0);
    0u32.encode_to(&mut raw);
    raw.extend_from_slice(&[0, 0]);
    1_000_000u64.encode_to(&mut raw);
    raw.extend_from_slice(&[0, 0]);
    raw.push(0);

    // ApplyExtrinsic(1), Balances.Transfer
    raw.push(0);
    1u32.encode_to(&mut raw);
    raw.extend_from_slice(&[4, 0]);
    raw.extend_from_slice(&ALICE);
    raw.extend_from_slice(&BOB);
    1_000u128.encode_to(&mut raw);
    raw.push(0);

    raw
}

/// `AccountInfo` of a polkadot runtime.
pub fn account_info_raw(nonce: u32, free: u128) -> Vec<u8> {
    let mut raw = nonce.encode();
    for refcount in &[0u32, 1, 0] {
        refcount.encode_to(&mut raw);
    }
    for balance in &[free, 0, 0, 0] {
        balance.encode_to(&mut raw);
    }
    raw
}

/// Key of a storage entry of the fixture runtime.
pub fn storage_key(prefix: &str, entry: &str, keys: &[&[u8]]) -> String {
    metadata().storage_key(prefix, entry, keys).unwrap().to_hex()
}

pub fn block_hash(number: u64) -> String {
    format!("0x{:064x}", number + 0x1000)
}

fn header(number: u64) -> Json {
    json!({
        "parentHash": block_hash(number.saturating_sub(1)),
        "number": format!("0x{:x}", number),
        "stateRoot": "0x00",
        "extrinsicsRoot": "0x00",
        "digest": {"logs": []},
    })
}

/// The state of the scripted node.
pub struct MockNode {
    pub spec_version: u32,
    pub metadata: String,
    /// Hex encoded values by hex encoded key.
    pub storage: HashMap<String, String>,
    /// Hex encoded extrinsics of each block, by block number.
    pub blocks: Vec<Vec<String>>,
    /// Status notifications sent after a submission.
    pub statuses: Vec<Json>,
    /// Extrinsics submitted so far.
    pub submitted: Arc<Mutex<Vec<String>>>,
}

impl Default for MockNode {
    fn default() -> Self {
        MockNode {
            spec_version: SPEC_VERSION,
            metadata: metadata_hex(),
            storage: HashMap::new(),
            blocks: vec![vec![]; 11],
            statuses: vec![json!("ready"), json!({"inBlock": block_hash(11)})],
            submitted: Arc::new(Mutex::new(vec![])),
        }
    }
}

impl MockNode {
    fn best(&self) -> u64 {
        self.blocks.len().saturating_sub(1) as u64
    }
    fn block_number(&self, hash: &str) -> Option<u64> {
        (0..=self.best()).find(|number| block_hash(*number) == hash)
    }
    fn respond(&self, method: &str, params: &Json) -> MockReply {
        let reply = match method {
            "state_getRuntimeVersion" => json!({
                "apis": [],
                "authoringVersion": 1,
                "implName": "mock-node",
                "implVersion": 1,
                "specName": "mock",
                "specVersion": self.spec_version,
                "transactionVersion": TX_VERSION,
            }),
            "state_getMetadata" => json!(self.metadata),
            "state_getStorage" => json!(params[0]
                .as_str()
                .and_then(|key| self.storage.get(key))),
            "chain_getBlockHash" => match params[0].as_u64() {
                Some(number) if number <= self.best() => json!(block_hash(number)),
                Some(_) => Json::Null,
                None => json!(block_hash(self.best())),
            },
            "chain_getFinalizedHead" => json!(block_hash(self.best())),
            "chain_getHeader" => match params[0].as_str() {
                Some(hash) => self.block_number(hash).map(header).unwrap_or(Json::Null),
                None => header(self.best()),
            },
            "chain_getBlock" => {
                let number = params[0]
                    .as_str()
                    .map(|hash| self.block_number(hash))
                    .unwrap_or_else(|| Some(self.best()));

                match number {
                    Some(number) => json!({
                        "block": {
                            "header": header(number),
                            "extrinsics": self.blocks[number as usize],
                        },
                        "justification": null,
                    }),
                    None => Json::Null,
                }
            }
            "payment_queryInfo" => json!({
                "weight": 195_000_000u64,
                "class": "normal",
                "partialFee": "15600000",
            }),
            "author_submitAndWatchExtrinsic" => {
                if let Some(ext) = params[0].as_str() {
                    self.submitted.lock().unwrap().push(ext.to_string());
                }
                return MockReply::Subscription("sub-1", self.statuses.clone());
            }
            _ => return MockReply::Error(-32601, "Method not found".to_string()),
        };

        MockReply::Result(reply)
    }
}

pub fn mock_node(node: MockNode) -> MockFactory {
    MockFactory::new(move |method, params| node.respond(method, params))
}

/// A client connected to the scripted node.
pub async fn client(
    config: ClientConfig,
    node: MockNode,
    signer: Option<KeyringPair>,
) -> (Client<MockFactory>, MockFactory) {
    let _ = env_logger::builder().is_test(true).try_init();

    let factory = mock_node(node);
    let pool = Pool::new(factory.clone(), config.pool).await.unwrap();
    let rpc = RpcClient::new(pool, config.retry);

    let client = Client::with_rpc(config, rpc, signer).await.unwrap();
    (client, factory)
}
