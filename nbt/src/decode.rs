//! The recursive-descent NBT decoder.
//!
//! Produces an owned [`crate::tag::Tag`] tree from a byte buffer. The
//! decoder is pure: it never retains a reference into `bytes`, and it has
//! no side effects beyond the bytes it reads.

use crate::error::{Error, Result};
use crate::reader::ByteReader;
use crate::tag::{self, Compound, List, Tag};

/// Maximum nesting depth (compounds within compounds, lists within lists)
/// before decoding is aborted with [`Error::TooDeep`]. Chosen comfortably
/// above any legitimate chunk or schematic nesting while still well short
/// of exhausting the stack.
pub const MAX_DEPTH: usize = 512;

/// Decode a complete NBT document: `[tag id][name][payload]` at the top
/// level. The root tag must be a [`Tag::Compound`]; Java Edition always
/// names the root compound (often with an empty string).
pub fn parse(bytes: &[u8]) -> Result<(String, Compound)> {
    let mut r = ByteReader::new(bytes);
    let tag_id = r.u8()?;
    if tag_id != tag::COMPOUND_TAG {
        return Err(Error::NoRootCompound);
    }
    let name = read_string(&mut r)?;
    let compound = read_compound_body(&mut r, 0)?;
    Ok((name, compound))
}

fn read_compound_body(r: &mut ByteReader, depth: usize) -> Result<Compound> {
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep { limit: MAX_DEPTH });
    }

    let mut map = Compound::new();
    loop {
        let tag_id = r.u8()?;
        if tag_id == tag::END_TAG {
            break;
        }
        let name = read_string(r)?;
        let value = read_payload(r, tag_id, depth + 1)?;
        map.insert(name, value);
    }
    Ok(map)
}

fn read_list(r: &mut ByteReader, depth: usize) -> Result<List> {
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep { limit: MAX_DEPTH });
    }

    let elem_tag = r.u8()?;
    let len = r.i32()?;
    if len < 0 {
        return Err(Error::InvalidSize(len));
    }
    if elem_tag == tag::END_TAG && len > 0 {
        return Err(Error::BadListKind);
    }

    // Deliberately not `Vec::with_capacity(len)`: `len` comes straight off
    // the wire and a hostile input could name a huge value cheaply. Growing
    // as we go means a truncated buffer fails fast instead of allocating
    // first.
    let mut items = Vec::new();
    for _ in 0..len {
        items.push(read_payload(r, elem_tag, depth + 1)?);
    }
    Ok(List { elem_tag, items })
}

fn read_payload(r: &mut ByteReader, tag_id: u8, depth: usize) -> Result<Tag> {
    match tag_id {
        tag::BYTE_TAG => Ok(Tag::Byte(r.i8()?)),
        tag::SHORT_TAG => Ok(Tag::Short(r.i16()?)),
        tag::INT_TAG => Ok(Tag::Int(r.i32()?)),
        tag::LONG_TAG => Ok(Tag::Long(r.i64()?)),
        tag::FLOAT_TAG => Ok(Tag::Float(r.f32()?)),
        tag::DOUBLE_TAG => Ok(Tag::Double(r.f64()?)),
        tag::BYTE_ARRAY_TAG => {
            let len = read_array_len(r)?;
            let bytes = r.slice(len)?;
            Ok(Tag::ByteArray(bytes.iter().map(|&b| b as i8).collect()))
        }
        tag::STRING_TAG => Ok(Tag::String(read_string(r)?)),
        tag::LIST_TAG => Ok(Tag::List(read_list(r, depth)?)),
        tag::COMPOUND_TAG => Ok(Tag::Compound(read_compound_body(r, depth)?)),
        tag::INT_ARRAY_TAG => {
            let len = read_array_len(r)?;
            let mut v = Vec::new();
            for _ in 0..len {
                v.push(r.i32()?);
            }
            Ok(Tag::IntArray(v))
        }
        tag::LONG_ARRAY_TAG => {
            let len = read_array_len(r)?;
            let mut v = Vec::new();
            for _ in 0..len {
                v.push(r.i64()?);
            }
            Ok(Tag::LongArray(v))
        }
        other => Err(Error::InvalidTag(other)),
    }
}

fn read_array_len(r: &mut ByteReader) -> Result<usize> {
    let len = r.i32()?;
    if len < 0 {
        return Err(Error::InvalidSize(len));
    }
    Ok(len as usize)
}

fn read_string(r: &mut ByteReader) -> Result<String> {
    let len = r.u16()? as usize;
    let bytes = r.slice(len)?;
    decode_modified_utf8(bytes)
}

/// Decode Java's "modified UTF-8": standard UTF-8 except `U+0000` is
/// encoded as the two-byte sequence `0xC0 0x80`, and characters outside the
/// Basic Multilingual Plane are encoded as a surrogate pair, each surrogate
/// individually encoded as a three-byte sequence (six bytes total) rather
/// than the single four-byte UTF-8 sequence a real codepoint would use.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    // First pass: decode the CESU-8-like byte stream into UTF-16 code
    // units, since surrogate halves arrive as independent 3-byte
    // sequences and must be reunited before we can form a `char`.
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes.get(i + 1).ok_or_else(|| Error::NonUnicodeString(bytes.to_vec()))?;
            if b1 & 0xC0 != 0x80 {
                return Err(Error::NonUnicodeString(bytes.to_vec()));
            }
            units.push((((b0 & 0x1F) as u16) << 6) | (b1 & 0x3F) as u16);
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *bytes.get(i + 1).ok_or_else(|| Error::NonUnicodeString(bytes.to_vec()))?;
            let b2 = *bytes.get(i + 2).ok_or_else(|| Error::NonUnicodeString(bytes.to_vec()))?;
            if b1 & 0xC0 != 0x80 || b2 & 0xC0 != 0x80 {
                return Err(Error::NonUnicodeString(bytes.to_vec()));
            }
            units.push((((b0 & 0x0F) as u16) << 12) | (((b1 & 0x3F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 3;
        } else {
            return Err(Error::NonUnicodeString(bytes.to_vec()));
        }
    }

    // Second pass: reunite surrogate pairs into supplementary codepoints.
    let mut out = String::with_capacity(units.len());
    let mut j = 0;
    while j < units.len() {
        let u = units[j];
        if (0xD800..=0xDBFF).contains(&u) {
            if let Some(&lo) = units.get(j + 1) {
                if (0xDC00..=0xDFFF).contains(&lo) {
                    let hi = (u as u32) - 0xD800;
                    let lo = (lo as u32) - 0xDC00;
                    let cp = 0x10000 + (hi << 10) + lo;
                    out.push(char::from_u32(cp).ok_or_else(|| Error::NonUnicodeString(bytes.to_vec()))?);
                    j += 2;
                    continue;
                }
            }
            return Err(Error::NonUnicodeString(bytes.to_vec()));
        }
        out.push(char::from_u32(u as u32).ok_or_else(|| Error::NonUnicodeString(bytes.to_vec()))?);
        j += 1;
    }
    Ok(out)
}
