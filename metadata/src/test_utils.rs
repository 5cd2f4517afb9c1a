//! Metadata fixtures, built in code and SCALE encoded where needed.

use crate::model::Metadata;
use crate::version::v10::{MetadataV10, ModuleMetadataV10};
use crate::version::v12::{MetadataV12, ModuleMetadataV12};
use crate::version::v13::MetadataV13;
use crate::version::*;
use parity_scale_codec::Encode;

pub fn entry(
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

pub fn map(hasher: StorageHasher, key: &str, value: &str) -> StorageEntryType {
    StorageEntryType::Map {
        hasher,
        key: key.to_string(),
        value: value.to_string(),
        unused: false,
    }
}

pub fn call(name: &str, args: &[(&str, &str)]) -> FunctionMetadata {
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

pub fn event(name: &str, args: &[&str]) -> EventMetadata {
    EventMetadata {
        name: name.to_string(),
        arguments: args.iter().map(|a| a.to_string()).collect(),
        documentation: vec![],
    }
}

fn storage(prefix: &str, entries: Vec<StorageEntryMetadata>) -> Option<StorageMetadata> {
    Some(StorageMetadata {
        prefix: prefix.to_string(),
        entries,
    })
}

fn extrinsic() -> ExtrinsicMetadata {
    ExtrinsicMetadata {
        version: 4,
        signed_extensions: vec!["CheckSpecVersion".into(), "CheckNonce".into()],
    }
}

pub fn sample_metadata_v12_raw() -> MetadataV12 {
    let system = ModuleMetadataV12 {
        name: "System".into(),
        storage: storage(
            "System",
            vec![
                entry(
                    "Account",
                    StorageEntryModifier::Default,
                    map(
                        StorageHasher::Blake2_128Concat,
                        "T::AccountId",
                        "AccountInfo<T::Index, T::AccountData>",
                    ),
                    vec![0; 80],
                ),
                entry(
                    "Events",
                    StorageEntryModifier::Default,
                    StorageEntryType::Plain("Vec<EventRecord<T::Event, T::Hash>>".into()),
                    vec![0],
                ),
            ],
        ),
        calls: Some(vec![call("remark", &[("_remark", "Vec<u8>")])]),
        events: Some(vec![
            event("ExtrinsicSuccess", &["DispatchInfo"]),
            event("ExtrinsicFailed", &["DispatchError", "DispatchInfo"]),
        ]),
        constants: vec![],
        errors: vec![],
        index: 0,
    };

    let timestamp = ModuleMetadataV12 {
        name: "Timestamp".into(),
        storage: storage(
            "Timestamp",
            vec![entry(
                "Now",
                StorageEntryModifier::Default,
                StorageEntryType::Plain("T::Moment".into()),
                vec![0; 8],
            )],
        ),
        calls: Some(vec![call("set", &[("now", "Compact<T::Moment>")])]),
        events: None,
        constants: vec![],
        errors: vec![],
        index: 2,
    };

    let module = ModuleMetadataV12 {
        name: "Module".into(),
        storage: storage(
            "Module",
            vec![entry(
                "Entry",
                StorageEntryModifier::Optional,
                map(StorageHasher::Twox64Concat, "AccountId", "u128"),
                vec![],
            )],
        ),
        calls: None,
        events: None,
        constants: vec![],
        errors: vec![],
        index: 3,
    };

    let balances = ModuleMetadataV12 {
        name: "Balances".into(),
        storage: None,
        calls: Some(vec![
            call(
                "set_balance",
                &[
                    ("who", "<T::Lookup as StaticLookup>::Source"),
                    ("new_free", "Compact<T::Balance>"),
                    ("new_reserved", "Compact<T::Balance>"),
                ],
            ),
            call(
                "force_transfer",
                &[
                    ("source", "<T::Lookup as StaticLookup>::Source"),
                    ("dest", "<T::Lookup as StaticLookup>::Source"),
                    ("value", "Compact<T::Balance>"),
                ],
            ),
            call(
                "transfer_keep_alive",
                &[
                    ("dest", "<T::Lookup as StaticLookup>::Source"),
                    ("value", "Compact<T::Balance>"),
                ],
            ),
            call(
                "transfer",
                &[
                    ("dest", "<T::Lookup as StaticLookup>::Source"),
                    ("value", "Compact<T::Balance>"),
                ],
            ),
        ]),
        events: Some(vec![event(
            "Transfer",
            &["AccountId", "AccountId", "Balance"],
        )]),
        constants: vec![ModuleConstantMetadata {
            name: "ExistentialDeposit".into(),
            ty: "T::Balance".into(),
            value: 500u128.encode(),
            documentation: vec![],
        }],
        errors: vec![],
        index: 4,
    };

    let staking = ModuleMetadataV12 {
        name: "Staking".into(),
        storage: storage(
            "Staking",
            vec![entry(
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
            )],
        ),
        calls: None,
        events: None,
        constants: vec![],
        errors: vec![],
        index: 6,
    };

    MetadataV12 {
        modules: vec![system, timestamp, module, balances, staking],
        extrinsic: extrinsic(),
    }
}

pub fn sample_metadata_v12() -> Metadata {
    sample_metadata_v12_raw().into()
}

pub fn sample_metadata_v10_raw() -> MetadataV10 {
    let system = ModuleMetadataV10 {
        name: "System".into(),
        storage: None,
        calls: Some(vec![call("remark", &[("_remark", "Vec<u8>")])]),
        events: Some(vec![event("ExtrinsicSuccess", &["DispatchInfo"])]),
        constants: vec![],
        errors: vec![],
    };

    let timestamp = ModuleMetadataV10 {
        name: "Timestamp".into(),
        storage: None,
        calls: None,
        events: None,
        constants: vec![],
        errors: vec![],
    };

    let balances = ModuleMetadataV10 {
        name: "Balances".into(),
        storage: None,
        calls: Some(vec![call(
            "transfer",
            &[("dest", "T::AccountId"), ("value", "Compact<T::Balance>")],
        )]),
        events: Some(vec![event(
            "Transfer",
            &["AccountId", "AccountId", "Balance"],
        )]),
        constants: vec![],
        errors: vec![],
    };

    MetadataV10 {
        modules: vec![system, timestamp, balances],
    }
}

pub fn sample_metadata_v10() -> Metadata {
    sample_metadata_v10_raw().into()
}

pub fn sample_metadata_v13() -> Metadata {
    let assets = ModuleMetadataV12 {
        name: "Assets".into(),
        storage: storage(
            "Assets",
            vec![entry(
                "Metadata",
                StorageEntryModifier::Default,
                StorageEntryType::NMap {
                    keys: vec!["T::AssetId".into()],
                    hashers: vec![StorageHasher::Blake2_128Concat],
                    value: "AssetMetadata".into(),
                },
                vec![],
            )],
        ),
        calls: None,
        events: None,
        constants: vec![],
        errors: vec![],
        index: 0,
    };

    MetadataV13 {
        modules: vec![assets],
        extrinsic: extrinsic(),
    }
    .into()
}
