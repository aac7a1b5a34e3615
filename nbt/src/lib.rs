//! Named Binary Tag decoding.
//!
//! This crate provides the innermost layers of the read path: a
//! bounds-checked [`reader::ByteReader`], a gzip/zlib/raw-deflate
//! [`decompress`] front-end, and a recursive-descent [`decode`]r that
//! produces an owned [`tag::Tag`] tree.
//!
//! It deliberately knows nothing about regions, chunks, or block palettes;
//! that's `anvil`'s job, built on top of this crate.

pub mod decode;
pub mod decompress;
pub mod error;
pub mod reader;
pub mod tag;

pub use decompress::{detect, inflate, inflate_bounded, Compression};
pub use error::{Error, Result};
pub use reader::ByteReader;
pub use tag::{path, Compound, List, Tag};

/// Decode a complete NBT document, returning the root compound's name and
/// its contents.
pub fn parse(bytes: &[u8]) -> Result<(String, Compound)> {
    decode::parse(bytes)
}

/// Inflate a gzip/zlib-compressed buffer and decode it as NBT in one step,
/// the shape `level.dat` and individual chunk payloads both come in.
pub fn parse_compressed(bytes: &[u8]) -> Result<(String, Compound)> {
    let inflated = inflate(bytes)?;
    parse(&inflated)
}
