use crate::{Error, Result};
use std::convert::TryFrom;
use std::fmt;

/// A decoded value whose shape is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(u128),
    Signed(i128),
    Text(String),
    Bytes(Vec<u8>),
    Sequence(Vec<Value>),
    Mapping(Vec<(Value, Value)>),
    /// Enum variant with its payload, `Value::Null` for unit variants.
    Variant(String, Box<Value>),
    /// Named struct with its fields in declaration order.
    Struct(String, Vec<(String, Value)>),
}

impl Value {
    pub fn variant<N: Into<String>>(name: N, payload: Value) -> Self {
        Value::Variant(name.into(), Box::new(payload))
    }
    pub fn unit_variant<N: Into<String>>(name: N) -> Self {
        Value::Variant(name.into(), Box::new(Value::Null))
    }
    pub fn structure<N: Into<String>>(name: N, fields: Vec<(&str, Value)>) -> Self {
        Value::Struct(
            name.into(),
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Signed(_) => "signed integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Variant(_, _) => "variant",
            Value::Struct(_, _) => "struct",
        }
    }
    fn mismatch<T>(&self, expected: &str) -> Result<T> {
        Err(Error::ValueMismatch {
            expected: expected.to_string(),
            found: self.kind(),
        })
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => self.mismatch("bool"),
        }
    }
    pub fn as_u128(&self) -> Result<u128> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::Signed(n) if *n >= 0 => Ok(*n as u128),
            _ => self.mismatch("integer"),
        }
    }
    pub fn as_u64(&self) -> Result<u64> {
        let n = self.as_u128()?;
        u64::try_from(n).map_err(|_| Error::OutOfRange {
            ty: "u64".to_string(),
            value: n.to_string(),
        })
    }
    pub fn as_u32(&self) -> Result<u32> {
        let n = self.as_u128()?;
        u32::try_from(n).map_err(|_| Error::OutOfRange {
            ty: "u32".to_string(),
            value: n.to_string(),
        })
    }
    pub fn as_i128(&self) -> Result<i128> {
        match self {
            Value::Signed(n) => Ok(*n),
            Value::Integer(n) => i128::try_from(*n).map_err(|_| Error::OutOfRange {
                ty: "i128".to_string(),
                value: n.to_string(),
            }),
            _ => self.mismatch("signed integer"),
        }
    }
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(s) => Ok(s),
            _ => self.mismatch("text"),
        }
    }
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            _ => self.mismatch("bytes"),
        }
    }
    pub fn as_sequence(&self) -> Result<&[Value]> {
        match self {
            Value::Sequence(s) => Ok(s),
            _ => self.mismatch("sequence"),
        }
    }
    pub fn as_mapping(&self) -> Result<&[(Value, Value)]> {
        match self {
            Value::Mapping(m) => Ok(m),
            _ => self.mismatch("mapping"),
        }
    }
    /// Returns the variant name and its payload.
    pub fn as_variant(&self) -> Result<(&str, &Value)> {
        match self {
            Value::Variant(name, payload) => Ok((name, payload)),
            _ => self.mismatch("variant"),
        }
    }
    pub fn as_struct(&self) -> Result<(&str, &[(String, Value)])> {
        match self {
            Value::Struct(name, fields) => Ok((name, fields)),
            _ => self.mismatch("struct"),
        }
    }
    /// Returns the struct field with the given name.
    pub fn field(&self, name: &str) -> Result<&Value> {
        let (ty, fields) = self.as_struct()?;
        fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
            .ok_or_else(|| Error::MissingField {
                ty: ty.to_string(),
                field: name.to_string(),
            })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Signed(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Variant(name, payload) if payload.is_null() => write!(f, "{}", name),
            Value::Variant(name, payload) => write!(f, "{}({})", name, payload),
            Value::Struct(name, fields) => {
                write!(f, "{} {{ ", name)?;
                for (i, (field, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Self {
                    Value::Integer(val as u128)
                }
            }
        )*
    };
}

from_unsigned!(u8, u16, u32, u64, u128);

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::Text(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<[u8; 32]> for Value {
    fn from(val: [u8; 32]) -> Self {
        Value::Bytes(val.to_vec())
    }
}
