//! Chain dialects. Each dialect owns its type registry and metadata cache, and
//! decides which metadata versions it accepts and how constants are found.

use crate::cache::{MetadataCache, RuntimeMetadata};
use crate::config::ChainType;
use crate::model::{CallArg, CallParam, ChainEvent, EventParam, Transaction};
use crate::{Error, Result};
use parity_scale_codec::{Decode, Encode};
use std::path::Path;
use sublink_interface::blake2b;
use sublink_interface::common::AddressType;
use sublink_interface::transaction::Transaction as Envelope;
use sublink_metadata::{CallIndex, Metadata, ModuleConstantMetadata, StorageKey};
use sublink_types::{Scope, TypeDef, TypeRegistry, Value};

pub use self::polkadot::Polkadot;
pub use self::stafi::Stafi;

mod polkadot;
mod stafi;

/// Creates the dialect of the chain. `Address` and `LookupSource` follow the
/// address type, additional type definitions are read from `types_path` and
/// override the bundled ones.
pub fn new_dialect(
    chain: ChainType,
    address_type: AddressType,
    types_path: Option<&Path>,
) -> Result<Box<dyn Dialect>> {
    let dialect: Box<dyn Dialect> = match chain {
        ChainType::Stafi => Box::new(Stafi::new(address_type, types_path)?),
        ChainType::Polkadot => Box::new(Polkadot::new(address_type, types_path)?),
    };

    debug!(
        "Loaded {} type definitions for the {} dialect",
        dialect.registry().len(),
        chain
    );

    Ok(dialect)
}

fn load_registry(
    defaults: &str,
    address_type: AddressType,
    types_path: Option<&Path>,
) -> Result<TypeRegistry> {
    let mut registry = TypeRegistry::with_base_types()
        .map_err(|err| Error::Config(format!("invalid base type definitions: {}", err)))?;

    registry
        .register_json(defaults)
        .map_err(|err| Error::Config(format!("invalid bundled type definitions: {}", err)))?;

    let address = match address_type {
        AddressType::AccountId => "GenericAddress",
        AddressType::MultiAddress => "MultiAddress",
    };
    for name in &["Address", "LookupSource"] {
        registry
            .register(name, TypeDef::Alias(address.to_string()))
            .map_err(|err| Error::Config(err.to_string()))?;
    }

    if let Some(path) = types_path {
        registry
            .register_file(path)
            .map_err(|err| Error::Config(err.to_string()))?;
    }

    Ok(registry)
}

pub trait Dialect: Send + Sync {
    fn chain(&self) -> ChainType;
    fn registry(&self) -> &TypeRegistry;
    fn cache(&self) -> &MetadataCache;
    /// Whether the metadata version can be handled.
    fn supports(&self, version: u8) -> bool;
    fn find_constant<'a>(
        &self,
        metadata: &'a Metadata,
        module: &str,
        name: &str,
    ) -> Result<&'a ModuleConstantMetadata>;

    fn check_metadata(&self, metadata: &Metadata) -> Result<()> {
        if self.supports(metadata.version) {
            Ok(())
        } else {
            Err(Error::UnsupportedMetadata {
                chain: self.chain(),
                version: metadata.version,
            })
        }
    }
    fn call_index(&self, metadata: &Metadata, call: &str) -> Result<CallIndex> {
        Ok(metadata.find_call_index(call)?)
    }
    /// Encodes `Module.method` with its arguments in declaration order.
    fn encode_call(
        &self,
        runtime: &RuntimeMetadata,
        call: &str,
        args: Vec<CallArg>,
    ) -> Result<Vec<u8>> {
        let metadata = &runtime.metadata;
        let scope = Scope::new(runtime.spec_version, metadata);

        let index = self.call_index(metadata, call)?;
        let (_, func) = metadata.call_by_index(index)?;

        if args.len() != func.arguments.len() {
            return Err(Error::CallArity(
                func.arguments.len(),
                call.to_string(),
                args.len(),
            ));
        }

        let mut out = index.encode();
        for (arg, meta) in args.into_iter().zip(&func.arguments) {
            match arg {
                CallArg::Value(value) => self
                    .registry()
                    .encode_to(&meta.ty, &value, &scope, &mut out)
                    .map_err(|err| err.within(format!("{}({})", call, meta.name)))?,
                CallArg::Encoded(bytes) => out.extend_from_slice(&bytes),
            }
        }

        Ok(out)
    }
    /// Decodes a storage value. Missing values fall back to the default of
    /// the entry, unless the entry is optional.
    fn decode_storage(
        &self,
        runtime: &RuntimeMetadata,
        key: &StorageKey,
        raw: Option<&[u8]>,
    ) -> Result<Option<Value>> {
        let bytes = match raw.or_else(|| key.default_value()) {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let scope = Scope::new(runtime.spec_version, &runtime.metadata);
        let (value, _) = self.registry().decode(key.value_type(), bytes, &scope)?;

        Ok(Some(value))
    }
    fn constant(&self, runtime: &RuntimeMetadata, module: &str, name: &str) -> Result<Value> {
        let constant = self.find_constant(&runtime.metadata, module, name)?;
        let scope = Scope::new(runtime.spec_version, &runtime.metadata);

        let (value, _) = self
            .registry()
            .decode(&constant.ty, &constant.value, &scope)
            .map_err(|err| err.within(format!("{}.{}", module, name)))?;

        Ok(value)
    }
    /// Decodes the `System.Events` storage value.
    fn decode_events(&self, runtime: &RuntimeMetadata, raw: &[u8]) -> Result<Vec<ChainEvent>> {
        let scope = Scope::new(runtime.spec_version, &runtime.metadata);
        let (records, _) = self.registry().decode("Vec<EventRecord>", raw, &scope)?;

        records
            .as_sequence()?
            .iter()
            .map(|record| -> Result<ChainEvent> {
                let phase = record.field("phase")?.clone();
                let (name, args) = record.field("event")?.as_struct()?;
                let (module, event) = name.split_once('.').unwrap_or((name, ""));

                let extrinsic_index = match phase.as_variant() {
                    Ok(("ApplyExtrinsic", index)) => Some(index.as_u32()?),
                    _ => None,
                };

                Ok(ChainEvent {
                    module: module.to_string(),
                    event: event.to_string(),
                    extrinsic_index,
                    phase,
                    params: args
                        .iter()
                        .map(|(ty, value)| EventParam {
                            ty: ty.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                    topics: record.field("topics")?.as_sequence()?.to_vec(),
                })
            })
            .collect()
    }
    /// Decodes an extrinsic of a block, including its call.
    fn decode_extrinsic(
        &self,
        runtime: &RuntimeMetadata,
        address_type: AddressType,
        raw: &[u8],
    ) -> Result<Transaction> {
        let envelope = Envelope::decode_as(address_type, &mut &raw[..])
            .map_err(|source| Error::Decode {
                what: "extrinsic",
                source,
            })?;

        let metadata = &runtime.metadata;
        let scope = Scope::new(runtime.spec_version, metadata);

        let index = CallIndex::decode(&mut envelope.call.as_slice()).map_err(|source| {
            Error::Decode {
                what: "call index",
                source,
            }
        })?;
        let (module, func) = metadata.call_by_index(index)?;
        let (call, _) = self.registry().decode("Call", &envelope.call, &scope)?;
        let (_, args) = call.as_struct()?;

        let params = func
            .arguments
            .iter()
            .zip(args)
            .map(|(meta, (name, value))| CallParam {
                name: name.clone(),
                ty: meta.ty.clone(),
                value: value.clone(),
            })
            .collect();

        let (signer, nonce, tip) = match envelope.signature {
            Some(sig) => (
                Some(sig.signer),
                Some(sig.extra.nonce.0),
                Some(sig.extra.tip.0),
            ),
            None => (None, None, None),
        };

        Ok(Transaction {
            hash: format!("0x{}", hex::encode(blake2b(raw))),
            module: module.name.clone(),
            call: func.name.clone(),
            signer,
            nonce,
            tip,
            params,
        })
    }
}
