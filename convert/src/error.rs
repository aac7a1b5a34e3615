//! Errors produced above the `nbt`/`anvil` read path: catalog loading,
//! archive traversal, and the conversion driver itself.

use std::fmt;

#[derive(Debug)]
#[non_exhaustive]
pub enum ConvertError {
    /// Wraps a decode-path error from `anvil` (which itself wraps `nbt`).
    Anvil(anvil::Error),
    /// The input couldn't be read as a ZIP archive, or didn't contain a
    /// `level.dat`.
    Archive(String),
    /// `zip` itself failed to open or read an entry.
    Zip(zip::result::ZipError),
    /// Filesystem I/O failure reading the input or writing the output.
    Io(std::io::Error),
    /// The block-type catalog JSON was malformed or empty.
    CatalogMissing(String),
    /// Two catalog entries (or a catalog entry and a block mapping)
    /// declared the same target id.
    CatalogDuplicateId(u16),
    /// The input file's extension/contents matched none of the supported
    /// formats (ZIP-with-region, `.litematic`, `.schem`).
    UnsupportedFormat(String),
    /// Cooperative cancellation was observed at a chunk/region boundary.
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Anvil(e) => write!(f, "{e}"),
            ConvertError::Archive(msg) => write!(f, "archive error: {msg}"),
            ConvertError::Zip(e) => write!(f, "zip error: {e}"),
            ConvertError::Io(e) => write!(f, "io error: {e}"),
            ConvertError::CatalogMissing(msg) => write!(f, "catalog error: {msg}"),
            ConvertError::CatalogDuplicateId(id) => {
                write!(f, "catalog declares target id {id} more than once")
            }
            ConvertError::UnsupportedFormat(msg) => write!(f, "unsupported input format: {msg}"),
            ConvertError::Cancelled => write!(f, "conversion was cancelled"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<anvil::Error> for ConvertError {
    fn from(e: anvil::Error) -> Self {
        ConvertError::Anvil(e)
    }
}

impl From<nbt::Error> for ConvertError {
    fn from(e: nbt::Error) -> Self {
        ConvertError::Anvil(anvil::Error::Nbt(e))
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(e: zip::result::ZipError) -> Self {
        ConvertError::Zip(e)
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        ConvertError::Io(e)
    }
}
