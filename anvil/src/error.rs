//! Errors produced while reading region files, walking chunks/sections, or
//! decoding schematics.

use std::fmt;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Wraps an error from the underlying `nbt` crate (decompression or
    /// tag decoding).
    Nbt(nbt::Error),
    /// A region filename didn't match `r.<x>.<z>.mca`.
    BadRegionFilename(String),
    /// The region buffer was shorter than the mandatory 8 KiB header.
    BadRegionHeader { len: usize },
    /// A chunk's location-table entry pointed past the end of the file, or
    /// its declared length didn't fit in its allotted sectors.
    ChunkDecodeFailed(String),
    /// A packed long-array value decoded to an index `>= palette_len`.
    PackedIndexOutOfRange { value: u32, palette_len: usize },
    /// The `LongArray` backing a packed section didn't have enough words
    /// for the number of values it was supposed to encode.
    PackedArrayTooShort { need_longs: usize, have_longs: usize },
    /// A section had neither a modern palette+data-array nor a legacy
    /// `Blocks`/`Data` pair.
    UnsupportedSectionLayout,
    /// A schematic's root compound didn't match any known format, or a
    /// recognised format was missing a required field.
    UnsupportedSchematic(String),
    /// Cooperative cancellation was observed at a chunk/section boundary.
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Nbt(e) => write!(f, "{e}"),
            Error::BadRegionFilename(name) => {
                write!(f, "region filename {name:?} is not of the form r.<x>.<z>.mca")
            }
            Error::BadRegionHeader { len } => {
                write!(f, "region buffer too short for header: {len} bytes")
            }
            Error::ChunkDecodeFailed(msg) => write!(f, "chunk decode failed: {msg}"),
            Error::PackedIndexOutOfRange { value, palette_len } => write!(
                f,
                "packed index {value} out of range for palette of length {palette_len}"
            ),
            Error::PackedArrayTooShort { need_longs, have_longs } => write!(
                f,
                "packed long array too short: need {need_longs} longs, have {have_longs}"
            ),
            Error::UnsupportedSectionLayout => {
                write!(f, "section has neither a modern nor legacy block layout")
            }
            Error::UnsupportedSchematic(msg) => write!(f, "unsupported schematic: {msg}"),
            Error::Cancelled => write!(f, "conversion was cancelled"),
        }
    }
}

impl std::error::Error for Error {}

impl From<nbt::Error> for Error {
    fn from(e: nbt::Error) -> Self {
        Error::Nbt(e)
    }
}
