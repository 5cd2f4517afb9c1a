//! Version independent view on the runtime metadata.

use crate::version::{
    ErrorMetadata, EventMetadata, ExtrinsicMetadata, FunctionMetadata, ModuleConstantMetadata,
    StorageEntryMetadata, StorageMetadata,
};
use crate::{Error, Result};
use std::fmt;

/// The position of a call within the runtime. Those two bytes prefix every
/// encoded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct CallIndex {
    pub module: u8,
    pub method: u8,
}

impl CallIndex {
    pub fn new(module: u8, method: u8) -> Self {
        CallIndex { module, method }
    }
}

impl fmt::Display for CallIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}", self.module, self.method)
    }
}

/// Parsed runtime metadata, independent of the metadata version it was
/// decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// The metadata format version (10 to 13).
    pub version: u8,
    pub modules: Vec<Module>,
    /// Not available before V11.
    pub extrinsic: Option<ExtrinsicMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    /// Explicit index since V12, the declaration position before that.
    pub index: u8,
    /// The index used when encoding calls of this module, if it has calls.
    pub call_index: Option<u8>,
    /// The index used when encoding events of this module, if it has events.
    pub event_index: Option<u8>,
    pub storage: Option<StorageMetadata>,
    pub calls: Option<Vec<FunctionMetadata>>,
    pub events: Option<Vec<EventMetadata>>,
    pub constants: Vec<ModuleConstantMetadata>,
    pub errors: Vec<ErrorMetadata>,
}

impl Metadata {
    /// Before V12 the runtime numbered calls (and events) by counting only
    /// the modules which declare calls (and events, respectively).
    pub(crate) fn with_implicit_indices(
        version: u8,
        mut modules: Vec<Module>,
        extrinsic: Option<ExtrinsicMetadata>,
    ) -> Self {
        let mut calls = 0u8;
        let mut events = 0u8;

        for module in modules.iter_mut() {
            if module.calls.is_some() {
                module.call_index = Some(calls);
                calls = calls.wrapping_add(1);
            }
            if module.events.is_some() {
                module.event_index = Some(events);
                events = events.wrapping_add(1);
            }
        }

        Metadata {
            version,
            modules,
            extrinsic,
        }
    }
    pub fn module(&self, name: &str) -> Result<&Module> {
        self.modules
            .iter()
            .find(|module| module.name == name)
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }
    /// Finds the storage entry by the storage prefix of the module (usually,
    /// but not necessarily, the module name) and the entry name.
    pub fn storage_entry(&self, prefix: &str, entry: &str) -> Result<&StorageEntryMetadata> {
        let storage = self
            .modules
            .iter()
            .filter_map(|module| module.storage.as_ref())
            .find(|storage| storage.prefix == prefix)
            .ok_or_else(|| Error::ModuleNotFound(prefix.to_string()))?;

        storage
            .entries
            .iter()
            .find(|e| e.name == entry)
            .ok_or_else(|| Error::StorageNotFound {
                module: prefix.to_string(),
                entry: entry.to_string(),
            })
    }
    /// Resolves `"Module.method"` into its call index.
    pub fn find_call_index(&self, call: &str) -> Result<CallIndex> {
        let (module_name, method) = split_call(call)?;

        let module = self
            .modules
            .iter()
            .filter(|module| module.calls.is_some())
            .find(|module| module.name == module_name)
            .ok_or_else(|| Error::CallModuleNotFound {
                module: module_name.to_string(),
                call: call.to_string(),
            })?;

        // Both are set for any module with calls.
        let (module_index, calls) = match (module.call_index, module.calls.as_ref()) {
            (Some(index), Some(calls)) => (index, calls),
            _ => {
                return Err(Error::CallModuleNotFound {
                    module: module_name.to_string(),
                    call: call.to_string(),
                })
            }
        };

        calls
            .iter()
            .position(|func| func.name == method)
            .map(|position| CallIndex::new(module_index, position as u8))
            .ok_or_else(|| Error::CallMethodNotFound {
                method: method.to_string(),
                module: module_name.to_string(),
                call: call.to_string(),
            })
    }
    /// Reverse lookup of [`Metadata::find_call_index`].
    pub fn call_by_index(&self, index: CallIndex) -> Result<(&Module, &FunctionMetadata)> {
        self.modules
            .iter()
            .find(|module| module.call_index == Some(index.module))
            .and_then(|module| {
                module
                    .calls
                    .as_ref()?
                    .get(index.method as usize)
                    .map(|func| (module, func))
            })
            .ok_or(Error::UnknownCallIndex(index))
    }
    pub fn event_by_index(&self, module: u8, event: u8) -> Result<(&Module, &EventMetadata)> {
        self.modules
            .iter()
            .find(|m| m.event_index == Some(module))
            .and_then(|m| m.events.as_ref()?.get(event as usize).map(|e| (m, e)))
            .ok_or(Error::UnknownEventIndex(module, event))
    }
    /// Finds a constant by the module name.
    pub fn find_constant(&self, module: &str, name: &str) -> Result<&ModuleConstantMetadata> {
        self.modules
            .iter()
            .filter(|m| m.name == module)
            .flat_map(|m| m.constants.iter())
            .find(|c| c.name == name)
            .ok_or_else(|| Error::ConstantNotFound {
                module: module.to_string(),
                name: name.to_string(),
            })
    }
    /// Finds a constant by the storage prefix of the module, falling back to
    /// the module name for modules without storage.
    pub fn find_constant_by_prefix(
        &self,
        prefix: &str,
        name: &str,
    ) -> Result<&ModuleConstantMetadata> {
        self.modules
            .iter()
            .find(|m| m.storage.as_ref().map(|s| s.prefix == prefix).unwrap_or(false))
            .and_then(|m| m.constants.iter().find(|c| c.name == name))
            .map(Ok)
            .unwrap_or_else(|| self.find_constant(prefix, name))
    }
    /// The signed extensions declared by the runtime, empty before V11.
    pub fn signed_extensions(&self) -> &[String] {
        self.extrinsic
            .as_ref()
            .map(|ext| ext.signed_extensions.as_slice())
            .unwrap_or(&[])
    }
}

fn split_call(call: &str) -> Result<(&str, &str)> {
    let mut parts = call.splitn(2, '.');
    match (parts.next(), parts.next()) {
        (Some(module), Some(method)) if !module.is_empty() && !method.is_empty() => {
            Ok((module, method))
        }
        _ => Err(Error::MalformedCall(call.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn find_call_index_explicit() {
        let metadata = sample_metadata_v12();
        let index = metadata.find_call_index("Balances.transfer").unwrap();
        assert_eq!(index, CallIndex::new(4, 3));

        let (module, func) = metadata.call_by_index(index).unwrap();
        assert_eq!(module.name, "Balances");
        assert_eq!(func.name, "transfer");
    }

    #[test]
    fn find_call_index_unknown_method() {
        let metadata = sample_metadata_v12();
        let err = metadata
            .find_call_index("Balances.transfer_unknown")
            .unwrap_err();

        match &err {
            Error::CallMethodNotFound { method, module, .. } => {
                assert_eq!(method, "transfer_unknown");
                assert_eq!(module, "Balances");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let message = err.to_string();
        assert!(message.contains("transfer_unknown"));
        assert!(message.contains("Balances"));
    }

    #[test]
    fn find_call_index_unknown_module() {
        let metadata = sample_metadata_v12();
        match metadata.find_call_index("Nope.transfer") {
            Err(Error::CallModuleNotFound { module, .. }) => assert_eq!(module, "Nope"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn find_call_index_malformed() {
        let metadata = sample_metadata_v12();
        assert!(matches!(
            metadata.find_call_index("Balances"),
            Err(Error::MalformedCall(_))
        ));
    }

    #[test]
    fn implicit_indices_skip_modules_without_calls() {
        let metadata = sample_metadata_v10();

        // "System" has calls, "Timestamp" has none, "Balances" is the second
        // module with calls.
        let index = metadata.find_call_index("Balances.transfer").unwrap();
        assert_eq!(index, CallIndex::new(1, 0));

        // Events are counted separately.
        let (module, event) = metadata.event_by_index(1, 0).unwrap();
        assert_eq!(module.name, "Balances");
        assert_eq!(event.name, "Transfer");
    }

    #[test]
    fn find_constant() {
        let metadata = sample_metadata_v12();
        let constant = metadata
            .find_constant("Balances", "ExistentialDeposit")
            .unwrap();
        assert_eq!(constant.ty, "T::Balance");

        assert!(matches!(
            metadata.find_constant("Balances", "Nope"),
            Err(Error::ConstantNotFound { .. })
        ));
    }
}
