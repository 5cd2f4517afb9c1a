use crate::definition::{Primitive, TypeDef};
use crate::name::{normalize, split_generic};
use crate::{Error, Result};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

const BASE_TYPES: &str = include_str!("../res/base.json");

/// Aliases are followed at most this many times.
const MAX_ALIAS_DEPTH: usize = 64;

#[derive(Debug, Clone, Default)]
struct Registration {
    plain: Option<TypeDef>,
    /// Definitions only valid for a range of spec versions, inclusive.
    versioned: Vec<(u32, u32, TypeDef)>,
}

/// Named type definitions of a chain, used by the codec to resolve the type
/// names found in the metadata. Names are matched after normalization and
/// ignoring case.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<String, Registration>,
}

impl TypeRegistry {
    /// An empty registry, only primitives and structural types resolve.
    pub fn new() -> Self {
        Self::default()
    }
    /// A registry with the common Substrate types (`Balance`, `AccountInfo`,
    /// `EventRecord`, ...) already registered.
    pub fn with_base_types() -> Result<Self> {
        let mut registry = Self::new();
        registry.register_json(BASE_TYPES)?;
        Ok(registry)
    }
    /// Registers a single definition. The name may carry a spec version range
    /// as `Name#from-to` or `Name#from-?`. The last registration wins.
    pub fn register(&mut self, name: &str, def: TypeDef) -> Result<()> {
        let (name, range) = match name.split_once('#') {
            Some((name, range)) => (name, Some(parse_range(name, range)?)),
            None => (name, None),
        };

        let entry = self.types.entry(registry_key(name)).or_default();
        match range {
            Some((from, to)) => entry.versioned.push((from, to, def)),
            None => entry.plain = Some(def),
        }

        Ok(())
    }
    /// Registers every definition of a JSON document, returning the number
    /// of registered types.
    pub fn register_json(&mut self, json: &str) -> Result<usize> {
        let document: serde_json::Map<String, JsonValue> =
            serde_json::from_str(json).map_err(Error::ParseDefinitions)?;

        for (name, def) in &document {
            let def = TypeDef::from_json(name, def)?;
            self.register(name, def)?;
        }

        log::debug!("registered {} type definitions", document.len());
        Ok(document.len())
    }
    /// Reads and registers a JSON type definition file.
    pub fn register_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::ReadDefinitions {
            path: path.display().to_string(),
            source,
        })?;

        self.register_json(&json)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&registry_key(name))
    }
    pub fn len(&self) -> usize {
        self.types.len()
    }
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
    fn find(&self, name: &str, spec_version: Option<u32>) -> Option<&TypeDef> {
        let entry = self.types.get(&name.to_ascii_lowercase())?;

        if let Some(version) = spec_version {
            let special = entry
                .versioned
                .iter()
                .rev()
                .find(|(from, to, _)| (*from..=*to).contains(&version))
                .map(|(_, _, def)| def);

            if special.is_some() {
                return special;
            }
        }

        entry.plain.as_ref()
    }
    fn lookup(&self, name: &str, spec_version: Option<u32>) -> Result<TypeDef> {
        if let Some(def) = self.find(name, spec_version) {
            return Ok(def.clone());
        }
        if let Some(def) = TypeDef::parse_structural(name) {
            return Ok(def);
        }
        if let Some(prim) = Primitive::from_name(name) {
            return Ok(TypeDef::Primitive(prim));
        }

        // Unknown generics such as `AccountInfo<Index,AccountData>` fall back
        // to their base name.
        if let Some((base, _)) = split_generic(name) {
            if let Some(def) = self.find(base, spec_version) {
                return Ok(def.clone());
            }
            if let Some(prim) = Primitive::from_name(base) {
                return Ok(TypeDef::Primitive(prim));
            }
        }

        Err(Error::UnknownType(name.to_string()))
    }
    /// Resolves the type name into its structure, following aliases.
    pub fn resolve(&self, name: &str, spec_version: Option<u32>) -> Result<TypeDef> {
        let mut current = normalize(name);

        for _ in 0..MAX_ALIAS_DEPTH {
            match self.lookup(&current, spec_version)? {
                TypeDef::Alias(next) => current = normalize(&next),
                def => return Ok(def),
            }
        }

        Err(Error::RecursionLimit(name.to_string()))
    }
}

fn registry_key(name: &str) -> String {
    normalize(name).to_ascii_lowercase()
}

fn parse_range(name: &str, range: &str) -> Result<(u32, u32)> {
    let invalid = || Error::InvalidDefinition {
        name: name.to_string(),
        reason: format!("invalid spec version range \"{}\"", range),
    };

    let (from, to) = range.split_once('-').ok_or_else(invalid)?;
    let from = from.trim().parse::<u32>().map_err(|_| invalid())?;
    let to = match to.trim() {
        "?" => u32::MAX,
        to => to.parse::<u32>().map_err(|_| invalid())?,
    };

    if from > to {
        return Err(invalid());
    }

    Ok((from, to))
}
