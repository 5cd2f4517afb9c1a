//! Type registry and generic SCALE codec for values whose shape is only
//! known from the runtime metadata.
//!
//! # Example
//!
//! ```
//! use sublink_types::*;
//!
//! let mut registry = TypeRegistry::with_base_types().unwrap();
//! registry
//!     .register_json(r#"{"BondState": {"type": "enum", "value_list": ["Dealing", "Fail", "Success"]}}"#)
//!     .unwrap();
//!
//! let (value, consumed) = registry
//!     .decode("BondState", &[2], &Scope::default())
//!     .unwrap();
//!
//! assert_eq!(value, Value::unit_variant("Success"));
//! assert_eq!(consumed, 1);
//! ```

pub use self::codec::Scope;
pub use self::definition::{Primitive, TypeDef};
pub use self::name::normalize;
pub use self::registry::TypeRegistry;
pub use self::value::Value;

pub type Result<T> = std::result::Result<T, Error>;

pub mod codec;
pub mod definition;
pub mod name;
pub mod registry;
pub mod value;

/// Errors of the type registry and the codec. None of them is worth a retry,
/// they indicate a mismatch between the metadata and the type definitions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse type definitions: {0}")]
    ParseDefinitions(serde_json::Error),
    #[error("failed to read type definitions from {path}: {source}")]
    ReadDefinitions {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid type definition for {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("alias recursion limit reached while resolving {0}")]
    RecursionLimit(String),
    #[error("failed to decode {ty}: {source}")]
    Codec {
        ty: String,
        source: parity_scale_codec::Error,
    },
    #[error("invalid discriminant {index} for {ty} with {variants} variants")]
    InvalidDiscriminant {
        ty: String,
        index: u8,
        variants: usize,
    },
    #[error("invalid option tag {tag} for {ty}")]
    InvalidOptionTag { ty: String, tag: u8 },
    #[error("invalid UTF-8 text in {0}")]
    InvalidText(String),
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        expected: String,
        found: &'static str,
    },
    #[error("value {value} out of range for {ty}")]
    OutOfRange { ty: String, value: String },
    #[error("{ty} expects {expected} element(s), got {found}")]
    LengthMismatch {
        ty: String,
        expected: usize,
        found: usize,
    },
    #[error("unknown variant {variant} of {ty}")]
    UnknownVariant { ty: String, variant: String },
    #[error("missing field {field} of {ty}")]
    MissingField { ty: String, field: String },
    #[error("decoding calls and events requires metadata")]
    MissingMetadata,
    #[error(transparent)]
    Metadata(#[from] sublink_metadata::Error),
    #[error("{path}: {source}")]
    Context { path: String, source: Box<Error> },
}

impl Error {
    /// Attaches the path of the field or element which failed.
    pub fn within(self, path: String) -> Self {
        match self {
            Error::Context {
                path: inner,
                source,
            } => Error::Context {
                path: format!("{} > {}", path, inner),
                source,
            },
            err => Error::Context {
                path,
                source: Box::new(err),
            },
        }
    }
    /// Returns the error without the attached path.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root_cause(),
            err => err,
        }
    }
}
