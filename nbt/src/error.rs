//! Errors produced while reading bytes, inflating compressed streams, and
//! decoding NBT tag trees.

/// Various errors that can occur while reading raw bytes or decoding NBT.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A read ran past the end of the available bytes.
    Truncated { offset: usize, need: usize, have: usize },
    /// The gzip/zlib/deflate stream could not be inflated.
    DecompressFailed(std::sync::Arc<std::io::Error>),
    /// Decompression was aborted because it exceeded the configured bound.
    DecompressTooLarge { limit: usize },
    /// The chunk compression byte named a scheme we don't support.
    UnsupportedCompression(u8),
    /// A tag byte did not correspond to any known NBT tag id.
    InvalidTag(u8),
    /// A `List`/array length field was negative or otherwise nonsensical.
    InvalidSize(i32),
    /// A `List` declared element tag `End` but had a non-zero length.
    BadListKind,
    /// Nesting exceeded the configured depth limit.
    TooDeep { limit: usize },
    /// A string was not valid modified UTF-8.
    NonUnicodeString(Vec<u8>),
    /// The root tag was not a `Compound`.
    NoRootCompound,
    UnexpectedEof,
    Custom(String),
}

/// Convenience type for Result.
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Truncated { offset, need, have } => write!(
                f,
                "truncated input: need {need} bytes at offset {offset}, have {have}"
            ),
            Error::DecompressFailed(e) => write!(f, "decompression failed: {e}"),
            Error::DecompressTooLarge { limit } => {
                write!(f, "decompressed output exceeded {limit} byte cap")
            }
            Error::UnsupportedCompression(scheme) => {
                write!(f, "unsupported compression scheme: {scheme}")
            }
            Error::InvalidTag(tag) => write!(f, "invalid nbt tag value: {}", tag),
            Error::InvalidSize(size) => write!(f, "invalid nbt list/array size: {}", size),
            Error::BadListKind => write!(f, "list declared End element kind with nonzero length"),
            Error::TooDeep { limit } => write!(f, "nbt nesting exceeded depth limit of {limit}"),
            Error::NonUnicodeString(data) => write!(
                f,
                "invalid nbt string: nonunicode: {}",
                String::from_utf8_lossy(data)
            ),
            Error::NoRootCompound => write!(f, "invalid nbt: no root compound"),
            Error::UnexpectedEof => write!(f, "eof: unexpectedly ran out of input"),
            Error::Custom(s) => f.write_str(s),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::DecompressFailed(std::sync::Arc::new(e))
    }
}
