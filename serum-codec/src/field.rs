//! Typed fields and the values that flow through them.
//!
//! A [`FieldSpec`] knows how to write one value at the writer's end and how to
//! read one value at a [`ByteReader`]'s position. Specs are only encoded or
//! decoded through a [`LayoutSchema`](crate::schema::LayoutSchema), which
//! validates them once at composition.

use std::{collections::BTreeMap, fmt};

use solana_pubkey::Pubkey;

use crate::{
    cursor::{self, ByteReader},
    error::{CodecError, Result},
};

/// Width of a public key field.
pub const PUBKEY_LEN: usize = 32;
/// Width of the length prefix in front of a string field.
pub const STRING_PREFIX_LEN: usize = 4;

/// Decoded flag bits, keyed by declared name.
pub type FlagSet = BTreeMap<&'static str, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian unsigned integer of 1, 2, 4, 8 or 16 bytes.
    Unsigned,
    /// Opaque fixed-size byte blob.
    Blob,
    /// 32-byte public key.
    Pubkey,
    /// Named booleans packed into 1 to 8 little-endian bytes, first name at bit 0.
    Flags(&'static [&'static str]),
    /// Content ignored on decode, written as zeros on encode.
    Padding,
    /// u32 little-endian byte length followed by UTF-8 bytes.
    String,
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Unsigned => "unsigned integer",
            FieldKind::Blob => "byte blob",
            FieldKind::Pubkey => "public key",
            FieldKind::Flags(_) => "flag set",
            FieldKind::Padding => "padding",
            FieldKind::String => "string",
        }
    }
}

/// One named, typed slot of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    width: usize,
}

impl FieldSpec {
    /// Raw constructor. Consistency between `kind` and `width` is checked when
    /// the field is composed into a schema.
    pub const fn new(name: &'static str, kind: FieldKind, width: usize) -> Self {
        Self { name, kind, width }
    }

    pub const fn u8(name: &'static str) -> Self {
        Self::new(name, FieldKind::Unsigned, 1)
    }

    pub const fn u16(name: &'static str) -> Self {
        Self::new(name, FieldKind::Unsigned, 2)
    }

    pub const fn u32(name: &'static str) -> Self {
        Self::new(name, FieldKind::Unsigned, 4)
    }

    pub const fn u64(name: &'static str) -> Self {
        Self::new(name, FieldKind::Unsigned, 8)
    }

    pub const fn u128(name: &'static str) -> Self {
        Self::new(name, FieldKind::Unsigned, 16)
    }

    pub const fn blob(name: &'static str, width: usize) -> Self {
        Self::new(name, FieldKind::Blob, width)
    }

    pub const fn pubkey(name: &'static str) -> Self {
        Self::new(name, FieldKind::Pubkey, PUBKEY_LEN)
    }

    pub const fn flags(name: &'static str, width: usize, names: &'static [&'static str]) -> Self {
        Self::new(name, FieldKind::Flags(names), width)
    }

    pub const fn padding(width: usize) -> Self {
        Self::new("", FieldKind::Padding, width)
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::String, STRING_PREFIX_LEN)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Fixed width in bytes; for strings, the width of the length prefix.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, FieldKind::String)
    }

    /// Padding carries no value and is never required on encode.
    pub fn carries_value(&self) -> bool {
        !matches!(self.kind, FieldKind::Padding)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(CodecError::OverlappingOrInvalidSchema(reason));
        if self.carries_value() && self.name.is_empty() {
            return invalid(format!("{} field has no name", self.kind.describe()));
        }
        match self.kind {
            FieldKind::Unsigned if !matches!(self.width, 1 | 2 | 4 | 8 | 16) => {
                invalid(format!("integer field `{}` has width {}", self.name, self.width))
            }
            FieldKind::Pubkey if self.width != PUBKEY_LEN => invalid(format!(
                "public key field `{}` has width {}, expected {PUBKEY_LEN}",
                self.name, self.width
            )),
            FieldKind::String if self.width != STRING_PREFIX_LEN => invalid(format!(
                "string field `{}` has prefix width {}, expected {STRING_PREFIX_LEN}",
                self.name, self.width
            )),
            FieldKind::Flags(names) => {
                if !(1..=8).contains(&self.width) {
                    return invalid(format!(
                        "flag field `{}` has width {}, expected 1 to 8",
                        self.name, self.width
                    ));
                }
                if names.len() > self.width * 8 {
                    return invalid(format!(
                        "flag field `{}` declares {} bits in {} bytes",
                        self.name,
                        names.len(),
                        self.width
                    ));
                }
                for (index, flag) in names.iter().enumerate() {
                    if names[..index].contains(flag) {
                        return invalid(format!(
                            "flag field `{}` declares `{flag}` twice",
                            self.name
                        ));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The form `value` takes after an encode/decode round trip. Flag sets
    /// list every declared name and raw key bytes become a public key.
    pub(crate) fn canonical(&self, value: &FieldValue) -> FieldValue {
        match (self.kind, value) {
            (FieldKind::Flags(names), FieldValue::Flags(set)) => FieldValue::Flags(
                names
                    .iter()
                    .map(|name| (*name, set.get(name).copied().unwrap_or(false)))
                    .collect(),
            ),
            (FieldKind::Pubkey, FieldValue::Bytes(bytes)) => {
                match <[u8; PUBKEY_LEN]>::try_from(bytes.as_slice()) {
                    Ok(array) => FieldValue::Pubkey(Pubkey::new_from_array(array)),
                    Err(_) => value.clone(),
                }
            }
            _ => value.clone(),
        }
    }

    /// Bytes this field occupies for `value`.
    pub(crate) fn encoded_len(&self, value: Option<&FieldValue>) -> usize {
        match (self.kind, value) {
            (FieldKind::String, Some(FieldValue::Str(s))) => STRING_PREFIX_LEN + s.len(),
            _ => self.width,
        }
    }

    pub(crate) fn encode(&self, value: Option<&FieldValue>, out: &mut Vec<u8>) -> Result<()> {
        if let FieldKind::Padding = self.kind {
            out.resize(out.len() + self.width, 0);
            return Ok(());
        }
        let value = value.ok_or(CodecError::MissingField(self.name))?;
        match (self.kind, value) {
            (FieldKind::Unsigned, FieldValue::Unsigned(v)) => self.encode_unsigned(*v, out),
            (FieldKind::Blob | FieldKind::Pubkey, FieldValue::Bytes(bytes)) => {
                if bytes.len() != self.width {
                    return Err(CodecError::SizeMismatch {
                        field: self.name,
                        expected: self.width,
                        actual: bytes.len(),
                    });
                }
                out.extend_from_slice(bytes);
                Ok(())
            }
            (FieldKind::Pubkey, FieldValue::Pubkey(key)) => {
                out.extend_from_slice(&key.to_bytes());
                Ok(())
            }
            (FieldKind::Flags(names), FieldValue::Flags(set)) => {
                let mut bits = 0u64;
                for (flag, enabled) in set {
                    let position = names.iter().position(|name| name == flag).ok_or_else(|| {
                        CodecError::UnknownFlag {
                            field: self.name,
                            flag: flag.to_string(),
                        }
                    })?;
                    if *enabled {
                        bits |= 1 << position;
                    }
                }
                out.extend_from_slice(&bits.to_le_bytes()[..self.width]);
                Ok(())
            }
            (FieldKind::String, FieldValue::Str(s)) => cursor::write(out, s.as_str()),
            (kind, _) => Err(CodecError::KindMismatch {
                field: self.name,
                expected: kind.describe(),
            }),
        }
    }

    fn encode_unsigned(&self, value: u128, out: &mut Vec<u8>) -> Result<()> {
        let out_of_range = |_| CodecError::OutOfRange {
            field: self.name,
            width: self.width,
            value,
        };
        match self.width {
            1 => cursor::write(out, &u8::try_from(value).map_err(out_of_range)?),
            2 => cursor::write(out, &u16::try_from(value).map_err(out_of_range)?),
            4 => cursor::write(out, &u32::try_from(value).map_err(out_of_range)?),
            8 => cursor::write(out, &u64::try_from(value).map_err(out_of_range)?),
            _ => cursor::write(out, &value),
        }
    }

    /// Read this field at the reader's position. Padding yields `None`.
    pub(crate) fn decode(&self, reader: &mut ByteReader<'_>) -> Result<Option<FieldValue>> {
        let value = match self.kind {
            FieldKind::Padding => {
                reader.skip(self.width)?;
                return Ok(None);
            }
            FieldKind::Unsigned => FieldValue::Unsigned(match self.width {
                1 => reader.read::<u8>(1)?.into(),
                2 => reader.read::<u16>(2)?.into(),
                4 => reader.read::<u32>(4)?.into(),
                8 => reader.read::<u64>(8)?.into(),
                _ => reader.read::<u128>(16)?,
            }),
            FieldKind::Blob => FieldValue::Bytes(reader.take(self.width)?.to_vec()),
            FieldKind::Pubkey => {
                FieldValue::Pubkey(Pubkey::new_from_array(reader.read::<[u8; 32]>(PUBKEY_LEN)?))
            }
            FieldKind::Flags(names) => {
                let mut raw = [0u8; 8];
                raw[..self.width].copy_from_slice(reader.take(self.width)?);
                let bits = u64::from_le_bytes(raw);
                FieldValue::Flags(
                    names
                        .iter()
                        .enumerate()
                        .map(|(position, name)| (*name, bits & (1 << position) != 0))
                        .collect(),
                )
            }
            FieldKind::String => {
                let len = reader.read::<u32>(STRING_PREFIX_LEN)? as usize;
                let bytes = reader.take(len)?;
                let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8(self.name))?;
                FieldValue::Str(s.to_owned())
            }
        };
        Ok(Some(value))
    }
}

/// A value supplied to or produced by a field.
///
/// Integers of every width share one variant; the declared width decides
/// whether a value fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Unsigned(u128),
    Bytes(Vec<u8>),
    Pubkey(Pubkey),
    Flags(FlagSet),
    Str(String),
}

macro_rules! unsigned_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Unsigned(value.into())
                }
            }
        )*
    };
}

unsigned_from!(u8, u16, u32, u64, u128);

impl From<Pubkey> for FieldValue {
    fn from(value: Pubkey) -> Self {
        FieldValue::Pubkey(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<FlagSet> for FieldValue {
    fn from(value: FlagSet) -> Self {
        FieldValue::Flags(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_owned())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{v}"),
            FieldValue::Bytes(bytes) => write!(f, "{}", bs58::encode(bytes).into_string()),
            FieldValue::Pubkey(key) => write!(f, "{key}"),
            FieldValue::Flags(set) => {
                let enabled: Vec<&str> = set
                    .iter()
                    .filter(|(_, on)| **on)
                    .map(|(name, _)| *name)
                    .collect();
                if enabled.is_empty() {
                    write!(f, "-")
                } else {
                    write!(f, "{}", enabled.join("|"))
                }
            }
            FieldValue::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Named values for one schema, in field-name order.
///
/// Encoding accepts partial flag sets (missing names are false) and raw
/// 32-byte blobs for key fields. Decoding always yields the canonical form,
/// which [`LayoutSchema::normalize`](crate::schema::LayoutSchema::normalize)
/// computes without a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(BTreeMap<&'static str, FieldValue>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name, value.into());
        self
    }

    pub fn insert(&mut self, name: &'static str, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name, value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    fn require(&self, name: &'static str) -> Result<&FieldValue> {
        self.0.get(name).ok_or(CodecError::MissingField(name))
    }

    pub fn unsigned(&self, name: &'static str) -> Result<u128> {
        match self.require(name)? {
            FieldValue::Unsigned(v) => Ok(*v),
            _ => Err(CodecError::KindMismatch {
                field: name,
                expected: FieldKind::Unsigned.describe(),
            }),
        }
    }

    pub fn u8(&self, name: &'static str) -> Result<u8> {
        self.narrow(name, 1)
    }

    pub fn u16(&self, name: &'static str) -> Result<u16> {
        self.narrow(name, 2)
    }

    pub fn u32(&self, name: &'static str) -> Result<u32> {
        self.narrow(name, 4)
    }

    pub fn u64(&self, name: &'static str) -> Result<u64> {
        self.narrow(name, 8)
    }

    fn narrow<T: TryFrom<u128>>(&self, name: &'static str, width: usize) -> Result<T> {
        let value = self.unsigned(name)?;
        T::try_from(value).map_err(|_| CodecError::OutOfRange {
            field: name,
            width,
            value,
        })
    }

    pub fn pubkey(&self, name: &'static str) -> Result<Pubkey> {
        match self.require(name)? {
            FieldValue::Pubkey(key) => Ok(*key),
            _ => Err(CodecError::KindMismatch {
                field: name,
                expected: FieldKind::Pubkey.describe(),
            }),
        }
    }

    pub fn bytes(&self, name: &'static str) -> Result<&[u8]> {
        match self.require(name)? {
            FieldValue::Bytes(bytes) => Ok(bytes),
            _ => Err(CodecError::KindMismatch {
                field: name,
                expected: FieldKind::Blob.describe(),
            }),
        }
    }

    pub fn string(&self, name: &'static str) -> Result<&str> {
        match self.require(name)? {
            FieldValue::Str(s) => Ok(s),
            _ => Err(CodecError::KindMismatch {
                field: name,
                expected: FieldKind::String.describe(),
            }),
        }
    }

    pub fn flags(&self, name: &'static str) -> Result<&FlagSet> {
        match self.require(name)? {
            FieldValue::Flags(set) => Ok(set),
            _ => Err(CodecError::KindMismatch {
                field: name,
                expected: "flag set",
            }),
        }
    }

    /// Read one bit from a flag field; bits absent from the set are false.
    pub fn flag(&self, field: &'static str, bit: &str) -> Result<bool> {
        Ok(self.flags(field)?.get(bit).copied().unwrap_or(false))
    }
}

impl FromIterator<(&'static str, FieldValue)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (&'static str, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
