//! Generic SCALE codec over [`Value`], driven by the type names of the
//! metadata and the definitions of a [`TypeRegistry`].

use crate::definition::{Primitive, TypeDef};
use crate::name::normalize;
use crate::registry::TypeRegistry;
use crate::value::Value;
use crate::{Error, Result};
use parity_scale_codec::{Compact, Decode, Encode, Input};
use std::convert::TryFrom;
use sublink_metadata::{CallIndex, Metadata};

/// Context of a single decode or encode operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    /// Spec version of the runtime, selects versioned type definitions.
    pub spec_version: Option<u32>,
    /// Required for `Call` and `Event` types.
    pub metadata: Option<&'a Metadata>,
}

impl<'a> Scope<'a> {
    pub fn new(spec_version: u32, metadata: &'a Metadata) -> Self {
        Scope {
            spec_version: Some(spec_version),
            metadata: Some(metadata),
        }
    }
    fn metadata(&self) -> Result<&'a Metadata> {
        self.metadata.ok_or(Error::MissingMetadata)
    }
}

fn codec_err(ty: &str) -> impl FnOnce(parity_scale_codec::Error) -> Error + '_ {
    move |source| Error::Codec {
        ty: ty.to_string(),
        source,
    }
}

fn read_fixed(ty: &str, input: &mut &[u8], len: usize) -> Result<Vec<u8>> {
    if len > input.len() {
        return Err(codec_err(ty)("Not enough data to fill buffer".into()));
    }

    let mut buf = vec![0; len];
    input.read(&mut buf).map_err(codec_err(ty))?;
    Ok(buf)
}

/// Reads a length prefix. Every element takes at least one byte, so longer
/// lengths than the remaining input are rejected.
fn read_len(ty: &str, input: &mut &[u8]) -> Result<usize> {
    let len = Compact::<u32>::decode(input).map_err(codec_err(ty))?.0 as usize;
    if len > input.len() {
        return Err(codec_err(ty)("Length prefix exceeds the remaining input".into()));
    }

    Ok(len)
}

fn is_bool(name: &str) -> bool {
    normalize(name).eq_ignore_ascii_case("bool")
}

impl TypeRegistry {
    /// Decodes a value of the given type, returning it together with the
    /// number of consumed bytes. Trailing bytes are left untouched.
    pub fn decode(&self, ty: &str, bytes: &[u8], scope: &Scope) -> Result<(Value, usize)> {
        let mut input = bytes;
        let value = self.decode_from(ty, &mut input, scope)?;
        Ok((value, bytes.len() - input.len()))
    }
    /// Decodes a value of the given type, advancing the input.
    pub fn decode_from(&self, ty: &str, input: &mut &[u8], scope: &Scope) -> Result<Value> {
        let def = self.resolve(ty, scope.spec_version)?;
        self.decode_def(ty, def, input, scope)
    }
    fn decode_def(
        &self,
        ty: &str,
        def: TypeDef,
        input: &mut &[u8],
        scope: &Scope,
    ) -> Result<Value> {
        let value = match def {
            TypeDef::Primitive(prim) => self.decode_primitive(ty, prim, input, scope)?,
            // Resolved by the registry, never returned.
            TypeDef::Alias(alias) => self.decode_from(&alias, input, scope)?,
            TypeDef::Struct(fields) => {
                let mut out = Vec::with_capacity(fields.len());
                for (name, fty) in fields {
                    let value = self
                        .decode_from(&fty, input, scope)
                        .map_err(|err| err.within(format!("{}.{}", ty, name)))?;
                    out.push((name, value));
                }
                Value::Struct(normalize(ty), out)
            }
            TypeDef::Enum(variants) => {
                let index = input.read_byte().map_err(codec_err(ty))?;
                let (name, payload_ty) =
                    variants
                        .get(index as usize)
                        .ok_or_else(|| Error::InvalidDiscriminant {
                            ty: ty.to_string(),
                            index,
                            variants: variants.len(),
                        })?;

                let payload = self
                    .decode_from(payload_ty, input, scope)
                    .map_err(|err| err.within(format!("{}::{}", ty, name)))?;
                Value::Variant(name.clone(), Box::new(payload))
            }
            TypeDef::Set { values, bit_length } => {
                let raw = read_fixed(ty, input, (bit_length / 8) as usize)?;
                let mut bits = [0u8; 16];
                bits[..raw.len()].copy_from_slice(&raw);
                let bits = u128::from_le_bytes(bits);

                Value::Sequence(
                    values
                        .into_iter()
                        .enumerate()
                        .filter(|(i, _)| *i < 128 && bits & (1u128 << *i) != 0)
                        .map(|(_, name)| Value::Text(name))
                        .collect(),
                )
            }
            TypeDef::Vec(elem) => {
                let len = read_len(ty, input)?;
                let mut out = Vec::with_capacity(len.min(input.len()));
                for i in 0..len {
                    out.push(
                        self.decode_from(&elem, input, scope)
                            .map_err(|err| err.within(format!("{}[{}]", ty, i)))?,
                    );
                }
                Value::Sequence(out)
            }
            TypeDef::Option(inner) if is_bool(&inner) => {
                // `Option<bool>` is encoded as a single byte.
                match input.read_byte().map_err(codec_err(ty))? {
                    0 => Value::Null,
                    1 => Value::Bool(true),
                    2 => Value::Bool(false),
                    tag => {
                        return Err(Error::InvalidOptionTag {
                            ty: ty.to_string(),
                            tag,
                        })
                    }
                }
            }
            TypeDef::Option(inner) => match input.read_byte().map_err(codec_err(ty))? {
                0 => Value::Null,
                1 => self
                    .decode_from(&inner, input, scope)
                    .map_err(|err| err.within(ty.to_string()))?,
                tag => {
                    return Err(Error::InvalidOptionTag {
                        ty: ty.to_string(),
                        tag,
                    })
                }
            },
            TypeDef::Compact(inner) => {
                let n = Compact::<u128>::decode(input).map_err(codec_err(ty))?.0;
                self.check_compact(ty, &inner, n, scope)?;
                Value::Integer(n)
            }
            TypeDef::Array(elem, len) if elem.eq_ignore_ascii_case("u8") => {
                Value::Bytes(read_fixed(ty, input, len)?)
            }
            TypeDef::Array(elem, len) => {
                let mut out = Vec::with_capacity(len.min(input.len()));
                for i in 0..len {
                    out.push(
                        self.decode_from(&elem, input, scope)
                            .map_err(|err| err.within(format!("{}[{}]", ty, i)))?,
                    );
                }
                Value::Sequence(out)
            }
            TypeDef::Tuple(parts) => {
                let mut out = Vec::with_capacity(parts.len());
                for (i, part) in parts.iter().enumerate() {
                    out.push(
                        self.decode_from(part, input, scope)
                            .map_err(|err| err.within(format!("{}.{}", ty, i)))?,
                    );
                }
                Value::Sequence(out)
            }
            TypeDef::Map(key_ty, value_ty) => {
                let len = read_len(ty, input)?;
                let mut out = Vec::with_capacity(len.min(input.len()));
                for i in 0..len {
                    let key = self
                        .decode_from(&key_ty, input, scope)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                    let value = self
                        .decode_from(&value_ty, input, scope)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                    out.push((key, value));
                }
                Value::Mapping(out)
            }
        };

        Ok(value)
    }
    /// Compacts share one encoding for all widths, the value must still fit
    /// the inner integer.
    fn check_compact(&self, ty: &str, inner: &str, n: u128, scope: &Scope) -> Result<()> {
        let max = match self.resolve(inner, scope.spec_version) {
            Ok(TypeDef::Primitive(Primitive::U8)) => u8::MAX as u128,
            Ok(TypeDef::Primitive(Primitive::U16)) => u16::MAX as u128,
            Ok(TypeDef::Primitive(Primitive::U32)) => u32::MAX as u128,
            Ok(TypeDef::Primitive(Primitive::U64)) => u64::MAX as u128,
            _ => u128::MAX,
        };

        if n > max {
            return Err(Error::OutOfRange {
                ty: ty.to_string(),
                value: n.to_string(),
            });
        }

        Ok(())
    }
    fn decode_primitive(
        &self,
        ty: &str,
        prim: Primitive,
        input: &mut &[u8],
        scope: &Scope,
    ) -> Result<Value> {
        let err = codec_err(ty);

        let value = match prim {
            Primitive::Null => Value::Null,
            Primitive::Bool => Value::Bool(bool::decode(input).map_err(err)?),
            Primitive::U8 => Value::Integer(u8::decode(input).map_err(err)? as u128),
            Primitive::U16 => Value::Integer(u16::decode(input).map_err(err)? as u128),
            Primitive::U32 => Value::Integer(u32::decode(input).map_err(err)? as u128),
            Primitive::U64 => Value::Integer(u64::decode(input).map_err(err)? as u128),
            Primitive::U128 => Value::Integer(u128::decode(input).map_err(err)?),
            Primitive::I8 => Value::Signed(i8::decode(input).map_err(err)? as i128),
            Primitive::I16 => Value::Signed(i16::decode(input).map_err(err)? as i128),
            Primitive::I32 => Value::Signed(i32::decode(input).map_err(err)? as i128),
            Primitive::I64 => Value::Signed(i64::decode(input).map_err(err)? as i128),
            Primitive::I128 => Value::Signed(i128::decode(input).map_err(err)?),
            Primitive::Bytes => Value::Bytes(Vec::<u8>::decode(input).map_err(err)?),
            Primitive::Text => {
                let raw = Vec::<u8>::decode(input).map_err(err)?;
                Value::Text(String::from_utf8(raw).map_err(|_| Error::InvalidText(ty.to_string()))?)
            }
            Primitive::H160 | Primitive::H256 | Primitive::H512 | Primitive::AccountId => {
                // Always `Some` for those.
                let len = prim.fixed_len().unwrap_or(32);
                Value::Bytes(read_fixed(ty, input, len)?)
            }
            Primitive::GenericAddress => match input.read_byte().map_err(err)? {
                0xff => Value::Bytes(read_fixed(ty, input, 32)?),
                0xfc => Value::Integer(u16::decode(input).map_err(codec_err(ty))? as u128),
                0xfd => Value::Integer(u32::decode(input).map_err(codec_err(ty))? as u128),
                0xfe => Value::Integer(u64::decode(input).map_err(codec_err(ty))? as u128),
                index if index < 0xf0 => Value::Integer(index as u128),
                index => {
                    return Err(Error::InvalidDiscriminant {
                        ty: ty.to_string(),
                        index,
                        variants: 0xf0,
                    })
                }
            },
            Primitive::Call => self.decode_call(input, scope)?,
            Primitive::Event => self.decode_event(input, scope)?,
        };

        Ok(value)
    }
    /// Decodes a call as `Module.method` struct with the named arguments as
    /// fields.
    fn decode_call(&self, input: &mut &[u8], scope: &Scope) -> Result<Value> {
        let metadata = scope.metadata()?;
        let index = CallIndex::decode(input).map_err(codec_err("Call"))?;
        let (module, func) = metadata.call_by_index(index)?;
        let name = format!("{}.{}", module.name, func.name);

        let mut args = Vec::with_capacity(func.arguments.len());
        for arg in &func.arguments {
            let value = self
                .decode_from(&arg.ty, input, scope)
                .map_err(|err| err.within(format!("{}({})", name, arg.name)))?;
            args.push((arg.name.clone(), value));
        }

        Ok(Value::Struct(name, args))
    }
    /// Decodes an event as `Module.Event` struct. Event arguments are not
    /// named, the fields carry the argument type instead.
    fn decode_event(&self, input: &mut &[u8], scope: &Scope) -> Result<Value> {
        let metadata = scope.metadata()?;
        let module_index = input.read_byte().map_err(codec_err("Event"))?;
        let event_index = input.read_byte().map_err(codec_err("Event"))?;
        let (module, event) = metadata.event_by_index(module_index, event_index)?;
        let name = format!("{}.{}", module.name, event.name);

        let mut args = Vec::with_capacity(event.arguments.len());
        for (i, arg) in event.arguments.iter().enumerate() {
            let value = self
                .decode_from(arg, input, scope)
                .map_err(|err| err.within(format!("{}.{}", name, i)))?;
            args.push((arg.clone(), value));
        }

        Ok(Value::Struct(name, args))
    }
    /// Encodes the value as the given type.
    pub fn encode(&self, ty: &str, value: &Value, scope: &Scope) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.encode_to(ty, value, scope, &mut out)?;
        Ok(out)
    }
    /// Encodes the value as the given type, appending to `out`.
    pub fn encode_to(&self, ty: &str, value: &Value, scope: &Scope, out: &mut Vec<u8>) -> Result<()> {
        let def = self.resolve(ty, scope.spec_version)?;
        self.encode_def(ty, def, value, scope, out)
    }
    fn encode_def(
        &self,
        ty: &str,
        def: TypeDef,
        value: &Value,
        scope: &Scope,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let mismatch = |expected: &str| Error::ValueMismatch {
            expected: format!("{} for {}", expected, ty),
            found: value.kind(),
        };

        match def {
            TypeDef::Primitive(prim) => self.encode_primitive(ty, prim, value, scope, out)?,
            TypeDef::Alias(alias) => self.encode_to(&alias, value, scope, out)?,
            TypeDef::Struct(fields) => match value {
                Value::Struct(_, values) => {
                    for (name, fty) in &fields {
                        let field = values
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, v)| v)
                            .ok_or_else(|| Error::MissingField {
                                ty: ty.to_string(),
                                field: name.clone(),
                            })?;

                        self.encode_to(fty, field, scope, out)
                            .map_err(|err| err.within(format!("{}.{}", ty, name)))?;
                    }
                }
                Value::Sequence(values) if values.len() == fields.len() => {
                    for ((name, fty), field) in fields.iter().zip(values) {
                        self.encode_to(fty, field, scope, out)
                            .map_err(|err| err.within(format!("{}.{}", ty, name)))?;
                    }
                }
                _ => return Err(mismatch("struct")),
            },
            TypeDef::Enum(variants) => {
                let (name, payload) = match value {
                    Value::Variant(name, payload) => (name.as_str(), payload.as_ref()),
                    Value::Text(name) => (name.as_str(), &Value::Null),
                    _ => return Err(mismatch("variant")),
                };

                let index = variants
                    .iter()
                    .position(|(variant, _)| variant == name)
                    .or_else(|| {
                        variants
                            .iter()
                            .position(|(variant, _)| variant.eq_ignore_ascii_case(name))
                    })
                    .ok_or_else(|| Error::UnknownVariant {
                        ty: ty.to_string(),
                        variant: name.to_string(),
                    })?;

                out.push(index as u8);
                self.encode_to(&variants[index].1, payload, scope, out)
                    .map_err(|err| err.within(format!("{}::{}", ty, name)))?;
            }
            TypeDef::Set { values, bit_length } => {
                let bits = match value {
                    Value::Integer(bits) => *bits,
                    Value::Sequence(flags) => {
                        let mut bits = 0u128;
                        for flag in flags {
                            let flag = flag.as_str()?;
                            let pos = values
                                .iter()
                                .position(|v| v == flag)
                                .filter(|pos| *pos < bit_length as usize)
                                .ok_or_else(|| Error::UnknownVariant {
                                    ty: ty.to_string(),
                                    variant: flag.to_string(),
                                })?;
                            bits |= 1u128 << pos;
                        }
                        bits
                    }
                    _ => return Err(mismatch("sequence of flags")),
                };

                out.extend_from_slice(&bits.to_le_bytes()[..(bit_length / 8) as usize]);
            }
            TypeDef::Vec(elem) => {
                let items = value.as_sequence().map_err(|_| mismatch("sequence"))?;
                Compact(items.len() as u32).encode_to(out);
                for (i, item) in items.iter().enumerate() {
                    self.encode_to(&elem, item, scope, out)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                }
            }
            TypeDef::Option(inner) if is_bool(&inner) => match value {
                Value::Null => out.push(0),
                Value::Bool(true) => out.push(1),
                Value::Bool(false) => out.push(2),
                _ => return Err(mismatch("bool or null")),
            },
            TypeDef::Option(inner) => match value {
                Value::Null => out.push(0),
                value => {
                    out.push(1);
                    self.encode_to(&inner, value, scope, out)
                        .map_err(|err| err.within(ty.to_string()))?;
                }
            },
            TypeDef::Compact(inner) => {
                let n = value.as_u128().map_err(|_| mismatch("integer"))?;
                self.check_compact(ty, &inner, n, scope)?;
                Compact(n).encode_to(out);
            }
            TypeDef::Array(elem, len) if elem.eq_ignore_ascii_case("u8") => {
                let bytes = value.as_bytes().map_err(|_| mismatch("bytes"))?;
                if bytes.len() != len {
                    return Err(Error::LengthMismatch {
                        ty: ty.to_string(),
                        expected: len,
                        found: bytes.len(),
                    });
                }
                out.extend_from_slice(bytes);
            }
            TypeDef::Array(elem, len) => {
                let items = value.as_sequence().map_err(|_| mismatch("sequence"))?;
                if items.len() != len {
                    return Err(Error::LengthMismatch {
                        ty: ty.to_string(),
                        expected: len,
                        found: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    self.encode_to(&elem, item, scope, out)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                }
            }
            TypeDef::Tuple(parts) => {
                let items = value.as_sequence().map_err(|_| mismatch("sequence"))?;
                if items.len() != parts.len() {
                    return Err(Error::LengthMismatch {
                        ty: ty.to_string(),
                        expected: parts.len(),
                        found: items.len(),
                    });
                }
                for (i, (part, item)) in parts.iter().zip(items).enumerate() {
                    self.encode_to(part, item, scope, out)
                        .map_err(|err| err.within(format!("{}.{}", ty, i)))?;
                }
            }
            TypeDef::Map(key_ty, value_ty) => {
                let entries = value.as_mapping().map_err(|_| mismatch("mapping"))?;
                Compact(entries.len() as u32).encode_to(out);
                for (i, (key, value)) in entries.iter().enumerate() {
                    self.encode_to(&key_ty, key, scope, out)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                    self.encode_to(&value_ty, value, scope, out)
                        .map_err(|err| err.within(format!("{}[{}]", ty, i)))?;
                }
            }
        }

        Ok(())
    }
    fn encode_primitive(
        &self,
        ty: &str,
        prim: Primitive,
        value: &Value,
        scope: &Scope,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        let mismatch = |expected: &str| Error::ValueMismatch {
            expected: format!("{} for {}", expected, ty),
            found: value.kind(),
        };

        macro_rules! unsigned {
            ($int:ty) => {{
                let n = value.as_u128().map_err(|_| mismatch("integer"))?;
                <$int>::try_from(n)
                    .map_err(|_| Error::OutOfRange {
                        ty: ty.to_string(),
                        value: n.to_string(),
                    })?
                    .encode_to(out)
            }};
        }

        macro_rules! signed {
            ($int:ty) => {{
                let n = value.as_i128().map_err(|_| mismatch("signed integer"))?;
                <$int>::try_from(n)
                    .map_err(|_| Error::OutOfRange {
                        ty: ty.to_string(),
                        value: n.to_string(),
                    })?
                    .encode_to(out)
            }};
        }

        match prim {
            Primitive::Null => {}
            Primitive::Bool => value
                .as_bool()
                .map_err(|_| mismatch("bool"))?
                .encode_to(out),
            Primitive::U8 => unsigned!(u8),
            Primitive::U16 => unsigned!(u16),
            Primitive::U32 => unsigned!(u32),
            Primitive::U64 => unsigned!(u64),
            Primitive::U128 => unsigned!(u128),
            Primitive::I8 => signed!(i8),
            Primitive::I16 => signed!(i16),
            Primitive::I32 => signed!(i32),
            Primitive::I64 => signed!(i64),
            Primitive::I128 => signed!(i128),
            Primitive::Bytes => match value {
                Value::Bytes(bytes) => bytes.encode_to(out),
                Value::Text(text) => text.as_bytes().encode_to(out),
                _ => return Err(mismatch("bytes")),
            },
            Primitive::Text => value
                .as_str()
                .map_err(|_| mismatch("text"))?
                .encode_to(out),
            Primitive::H160 | Primitive::H256 | Primitive::H512 | Primitive::AccountId => {
                let len = prim.fixed_len().unwrap_or(32);
                let bytes = value.as_bytes().map_err(|_| mismatch("bytes"))?;
                if bytes.len() != len {
                    return Err(Error::LengthMismatch {
                        ty: ty.to_string(),
                        expected: len,
                        found: bytes.len(),
                    });
                }
                out.extend_from_slice(bytes);
            }
            Primitive::GenericAddress => match value {
                Value::Bytes(bytes) if bytes.len() == 32 => {
                    out.push(0xff);
                    out.extend_from_slice(bytes);
                }
                Value::Integer(index) if *index < 0xf0 => out.push(*index as u8),
                Value::Integer(index) if *index <= u16::MAX as u128 => {
                    out.push(0xfc);
                    (*index as u16).encode_to(out);
                }
                Value::Integer(index) if *index <= u32::MAX as u128 => {
                    out.push(0xfd);
                    (*index as u32).encode_to(out);
                }
                Value::Integer(index) if *index <= u64::MAX as u128 => {
                    out.push(0xfe);
                    (*index as u64).encode_to(out);
                }
                _ => return Err(mismatch("32 byte account id or account index")),
            },
            Primitive::Call => self.encode_call(value, scope, out)?,
            Primitive::Event => self.encode_event(value, scope, out)?,
        }

        Ok(())
    }
    /// Encodes a `Module.method` struct (or variant) as call. Arguments are
    /// taken positionally.
    fn encode_call(&self, value: &Value, scope: &Scope, out: &mut Vec<u8>) -> Result<()> {
        let metadata = scope.metadata()?;
        let (name, args) = value.as_struct().map_err(|_| Error::ValueMismatch {
            expected: "struct for Call".to_string(),
            found: value.kind(),
        })?;

        let index = metadata.find_call_index(name)?;
        let (_, func) = metadata.call_by_index(index)?;

        if args.len() != func.arguments.len() {
            return Err(Error::LengthMismatch {
                ty: name.to_string(),
                expected: func.arguments.len(),
                found: args.len(),
            });
        }

        index.encode_to(out);
        for (arg, (_, value)) in func.arguments.iter().zip(args) {
            self.encode_to(&arg.ty, value, scope, out)
                .map_err(|err| err.within(format!("{}({})", name, arg.name)))?;
        }

        Ok(())
    }
    fn encode_event(&self, value: &Value, scope: &Scope, out: &mut Vec<u8>) -> Result<()> {
        let metadata = scope.metadata()?;
        let (name, args) = value.as_struct().map_err(|_| Error::ValueMismatch {
            expected: "struct for Event".to_string(),
            found: value.kind(),
        })?;

        let (module_name, event_name) = name
            .split_once('.')
            .ok_or_else(|| sublink_metadata::Error::MalformedCall(name.to_string()))?;

        let module = metadata.module(module_name)?;
        let (event_index, event) = module
            .events
            .as_ref()
            .and_then(|events| events.iter().enumerate().find(|(_, e)| e.name == event_name))
            .ok_or_else(|| Error::UnknownVariant {
                ty: module_name.to_string(),
                variant: event_name.to_string(),
            })?;

        let module_index = module.event_index.ok_or_else(|| Error::UnknownVariant {
            ty: module_name.to_string(),
            variant: event_name.to_string(),
        })?;

        if args.len() != event.arguments.len() {
            return Err(Error::LengthMismatch {
                ty: name.to_string(),
                expected: event.arguments.len(),
                found: args.len(),
            });
        }

        out.push(module_index);
        out.push(event_index as u8);
        for (i, (arg, (_, value))) in event.arguments.iter().zip(args).enumerate() {
            self.encode_to(arg, value, scope, out)
                .map_err(|err| err.within(format!("{}.{}", name, i)))?;
        }

        Ok(())
    }
}
