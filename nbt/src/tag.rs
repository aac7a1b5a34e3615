//! The NBT tag tree: an owned, dynamically-typed sum type mirroring the 13
//! tag kinds of the binary format, plus the ordered [`Compound`] map that
//! backs tag id 10.
//!
//! This plays the same role `fastnbt::Value` plays elsewhere, but is
//! produced by [`crate::decode::parse`] directly rather than through a
//! `serde::Deserializer`, since the wire format is polymorphic across
//! Minecraft versions in a way static per-version structs fight against.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Numeric tag ids as they appear on the wire.
pub const END_TAG: u8 = 0;
pub const BYTE_TAG: u8 = 1;
pub const SHORT_TAG: u8 = 2;
pub const INT_TAG: u8 = 3;
pub const LONG_TAG: u8 = 4;
pub const FLOAT_TAG: u8 = 5;
pub const DOUBLE_TAG: u8 = 6;
pub const BYTE_ARRAY_TAG: u8 = 7;
pub const STRING_TAG: u8 = 8;
pub const LIST_TAG: u8 = 9;
pub const COMPOUND_TAG: u8 = 10;
pub const INT_ARRAY_TAG: u8 = 11;
pub const LONG_ARRAY_TAG: u8 = 12;

/// An ordered `name -> Tag` map. Each `Compound` exclusively owns its
/// children; lookups are case-sensitive and insertion order is preserved
/// (some tools, and our own round-trip tests, rely on stable iteration
/// order).
pub type Compound = IndexMap<String, Tag>;

/// A single decoded NBT value. The root of any NBT document is always a
/// named [`Tag::Compound`] (see [`crate::decode::parse`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// A homogeneous NBT list. `elem_tag` is retained even for an empty list so
/// that re-encoding (if ever needed) preserves the original element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub elem_tag: u8,
    pub items: Vec<Tag>,
}

impl Tag {
    /// The wire tag id for this value's kind.
    pub fn id(&self) -> u8 {
        match self {
            Tag::Byte(_) => BYTE_TAG,
            Tag::Short(_) => SHORT_TAG,
            Tag::Int(_) => INT_TAG,
            Tag::Long(_) => LONG_TAG,
            Tag::Float(_) => FLOAT_TAG,
            Tag::Double(_) => DOUBLE_TAG,
            Tag::ByteArray(_) => BYTE_ARRAY_TAG,
            Tag::String(_) => STRING_TAG,
            Tag::List(_) => LIST_TAG,
            Tag::Compound(_) => COMPOUND_TAG,
            Tag::IntArray(_) => INT_ARRAY_TAG,
            Tag::LongArray(_) => LONG_ARRAY_TAG,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(*v as i64),
            Tag::Short(v) => Some(*v as i64),
            Tag::Int(v) => Some(*v as i64),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(v) => Some(*v),
            Tag::Int(v) => i8::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(l) => Some(&l.items),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            Tag::ByteArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Tag::IntArray(v) => Some(v),
            _ => None,
        }
    }
}

/// Look up a dotted path (`"Level.Sections"`) inside a compound, trying
/// each `.`-separated segment as a nested compound key. Returns `None` as
/// soon as any segment is missing or not itself a compound (except for the
/// final segment, which may be any tag kind).
///
/// This is the mechanism `anvil`'s chunk walker uses to try the historical
/// section paths in order without needing a distinct Rust type per
/// Minecraft version.
pub fn path<'a>(root: &'a Compound, dotted: &str) -> Option<&'a Tag> {
    let mut segments = dotted.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for seg in segments {
        current = current.as_compound()?.get(seg)?;
    }
    Some(current)
}
