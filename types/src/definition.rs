use crate::name::{normalize, split_generic, split_top_level};
use crate::{Error, Result};
use serde_json::Value as JsonValue;
use std::convert::TryFrom;

/// Types which are decoded natively, without a registered definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Null,
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    /// Compact length prefixed bytes.
    Bytes,
    Text,
    H160,
    H256,
    H512,
    AccountId,
    /// Legacy address, `0xff` followed by the account id or an account index.
    GenericAddress,
    /// A call, resolved through the metadata.
    Call,
    /// A runtime event, resolved through the metadata.
    Event,
}

impl Primitive {
    /// Looks up the primitive by its (normalized) name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        use Primitive::*;

        let prim = match name.to_ascii_lowercase().as_str() {
            "null" | "()" => Null,
            "bool" => Bool,
            "u8" => U8,
            "u16" => U16,
            "u32" => U32,
            "u64" => U64,
            "u128" => U128,
            "i8" => I8,
            "i16" => I16,
            "i32" => I32,
            "i64" => I64,
            "i128" => I128,
            "bytes" | "vec<u8>" => Bytes,
            "text" | "string" | "str" => Text,
            "h160" => H160,
            "h256" => H256,
            "h512" => H512,
            "accountid" | "accountid32" => AccountId,
            "genericaddress" => GenericAddress,
            "call" => Call,
            "event" => Event,
            _ => return None,
        };

        Some(prim)
    }
    /// Number of bytes of fixed size primitives.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            Primitive::H160 => Some(20),
            Primitive::H256 | Primitive::AccountId => Some(32),
            Primitive::H512 => Some(64),
            _ => None,
        }
    }
}

/// The structure of a type, either a primitive, a composite registered in
/// the type registry or one of the structural types (`Vec<T>`, `(A, B)`,
/// ...) parsed from the type name itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDef {
    Primitive(Primitive),
    /// Another type name, resolved on use.
    Alias(String),
    Struct(Vec<(String, String)>),
    /// Variants with their payload type, `Null` for unit variants.
    Enum(Vec<(String, String)>),
    Set {
        values: Vec<String>,
        bit_length: u32,
    },
    Vec(String),
    Option(String),
    Compact(String),
    Array(String, usize),
    Tuple(Vec<String>),
    Map(String, String),
}

impl TypeDef {
    /// Parses an alias string such as `"Vec<AccountId>"` or `"[u8; 32]"`.
    /// Names without structure are returned as [`TypeDef::Alias`].
    pub fn parse(name: &str) -> TypeDef {
        let name = normalize(name);
        Self::parse_structural(&name).unwrap_or(TypeDef::Alias(name))
    }
    /// Parses the structure of an already normalized name, if it has any.
    pub fn parse_structural(name: &str) -> Option<TypeDef> {
        if name == "()" {
            return Some(TypeDef::Primitive(Primitive::Null));
        }

        if name.starts_with('(') && name.ends_with(')') {
            let parts = split_top_level(&name[1..name.len() - 1]);
            return Some(TypeDef::Tuple(parts.into_iter().map(String::from).collect()));
        }

        if name.starts_with('[') && name.ends_with(']') {
            let inner = &name[1..name.len() - 1];
            let (elem, len) = inner.rsplit_once(';')?;
            let len = len.parse::<usize>().ok()?;
            return Some(TypeDef::Array(elem.to_string(), len));
        }

        let (base, params) = split_generic(name)?;
        let def = match (base.to_ascii_lowercase().as_str(), params.as_slice()) {
            ("vec", [elem]) if elem.eq_ignore_ascii_case("u8") => {
                TypeDef::Primitive(Primitive::Bytes)
            }
            ("vec", [elem]) | ("btreeset", [elem]) => TypeDef::Vec(elem.to_string()),
            ("option", [inner]) => TypeDef::Option(inner.to_string()),
            ("compact", [inner]) => TypeDef::Compact(inner.to_string()),
            ("box", [inner]) => TypeDef::Alias(inner.to_string()),
            ("btreemap", [key, value]) | ("hashmap", [key, value]) => {
                TypeDef::Map(key.to_string(), value.to_string())
            }
            _ => return None,
        };

        Some(def)
    }
    /// Parses a single entry of a JSON type definition document.
    pub fn from_json(name: &str, json: &JsonValue) -> Result<TypeDef> {
        let invalid = |reason: &str| Error::InvalidDefinition {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        let object = match json {
            JsonValue::String(alias) => return Ok(TypeDef::parse(alias)),
            JsonValue::Object(object) => object,
            _ => return Err(invalid("expected a string or an object")),
        };

        let kind = object
            .get("type")
            .and_then(|kind| kind.as_str())
            .ok_or_else(|| invalid("missing \"type\""))?;

        match kind {
            "struct" => Ok(TypeDef::Struct(
                parse_type_mapping(object.get("type_mapping")).ok_or_else(|| {
                    invalid("\"type_mapping\" must be a list of [name, type] pairs")
                })?,
            )),
            "enum" => {
                if let Some(mapping) = object.get("type_mapping") {
                    let variants = parse_type_mapping(Some(mapping)).ok_or_else(|| {
                        invalid("\"type_mapping\" must be a list of [name, type] pairs")
                    })?;
                    return Ok(TypeDef::Enum(variants));
                }

                let values = parse_value_list(object.get("value_list"))
                    .ok_or_else(|| invalid("enum requires \"type_mapping\" or \"value_list\""))?;
                Ok(TypeDef::Enum(
                    values
                        .into_iter()
                        .map(|value| (value, "Null".to_string()))
                        .collect(),
                ))
            }
            "set" => {
                let values = parse_value_list(object.get("value_list"))
                    .ok_or_else(|| invalid("set requires \"value_list\""))?;
                let bit_length = match object.get("bit_length") {
                    Some(len) => len
                        .as_u64()
                        .and_then(|len| u32::try_from(len).ok())
                        .ok_or_else(|| invalid("\"bit_length\" must be an unsigned integer"))?,
                    None => 8,
                };

                if bit_length == 0 || bit_length % 8 != 0 || bit_length > 128 {
                    return Err(invalid("\"bit_length\" must be a multiple of 8, at most 128"));
                }

                Ok(TypeDef::Set { values, bit_length })
            }
            other => Err(invalid(&format!("unknown type kind \"{}\"", other))),
        }
    }
}

fn parse_type_mapping(json: Option<&JsonValue>) -> Option<Vec<(String, String)>> {
    json?
        .as_array()?
        .iter()
        .map(|pair| {
            let pair = pair.as_array()?;
            match pair.as_slice() {
                [name, ty] => Some((name.as_str()?.to_string(), normalize(ty.as_str()?))),
                _ => None,
            }
        })
        .collect()
}

fn parse_value_list(json: Option<&JsonValue>) -> Option<Vec<String>> {
    json?
        .as_array()?
        .iter()
        .map(|value| value.as_str().map(String::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_structural_aliases() {
        assert_eq!(
            TypeDef::parse("Vec<T::AccountId>"),
            TypeDef::Vec("AccountId".into())
        );
        assert_eq!(TypeDef::parse("Vec<u8>"), TypeDef::Primitive(Primitive::Bytes));
        assert_eq!(
            TypeDef::parse("[u8; 32]"),
            TypeDef::Array("u8".into(), 32)
        );
        assert_eq!(
            TypeDef::parse("(AccountId, Balance)"),
            TypeDef::Tuple(vec!["AccountId".into(), "Balance".into()])
        );
        assert_eq!(
            TypeDef::parse("BTreeMap<u32, Vec<u8>>"),
            TypeDef::Map("u32".into(), "Vec<u8>".into())
        );
        assert_eq!(
            TypeDef::parse("Compact<T::Balance>"),
            TypeDef::Compact("Balance".into())
        );
        assert_eq!(TypeDef::parse("()"), TypeDef::Primitive(Primitive::Null));
        assert_eq!(
            TypeDef::parse("GenericAddress"),
            TypeDef::Alias("GenericAddress".into())
        );
    }

    #[test]
    fn parse_json_definitions() {
        let def = TypeDef::from_json(
            "Keys",
            &json!({"type": "struct", "type_mapping": [["grandpa", "T::AccountId"]]}),
        )
        .unwrap();
        assert_eq!(
            def,
            TypeDef::Struct(vec![("grandpa".into(), "AccountId".into())])
        );

        let def = TypeDef::from_json(
            "BondState",
            &json!({"type": "enum", "value_list": ["Dealing", "Fail", "Success"]}),
        )
        .unwrap();
        assert_eq!(
            def,
            TypeDef::Enum(vec![
                ("Dealing".into(), "Null".into()),
                ("Fail".into(), "Null".into()),
                ("Success".into(), "Null".into()),
            ])
        );

        let def = TypeDef::from_json(
            "Flags",
            &json!({"type": "set", "value_list": ["A", "B"], "bit_length": 16}),
        )
        .unwrap();
        assert_eq!(
            def,
            TypeDef::Set {
                values: vec!["A".into(), "B".into()],
                bit_length: 16
            }
        );
    }

    #[test]
    fn reject_invalid_json_definitions() {
        for json in &[
            json!(42),
            json!({"type": "struct"}),
            json!({"type": "enum"}),
            json!({"type": "set", "value_list": ["A"], "bit_length": 12}),
            // Would wrap around to 8 as u32.
            json!({"type": "set", "value_list": ["A"], "bit_length": 4_294_967_304u64}),
            json!({"type": "set", "value_list": ["A"], "bit_length": "8"}),
            json!({"type": "union"}),
        ] {
            assert!(matches!(
                TypeDef::from_json("Broken", json),
                Err(Error::InvalidDefinition { .. })
            ));
        }
    }
}
