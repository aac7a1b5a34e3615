//! Gzip/zlib/raw-deflate auto-detection and bounded inflation.
//!
//! Minecraft compresses `level.dat` and individual chunks with gzip or
//! zlib; region files additionally allow an uncompressed or raw-deflate
//! chunk payload (see [`crate::ChunkCompression`]). A malicious or corrupt
//! archive can claim an enormous decompressed size, so every inflate here
//! is capped.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{Error, Result};

/// Decompressed output larger than this is rejected with
/// [`Error::DecompressTooLarge`]. Chosen well above any legitimate section
/// or `level.dat` payload, while still bounding zip-bomb amplification.
pub const MAX_INFLATED_SIZE: usize = 32 * 1024 * 1024;

/// How a chunk (or an otherwise-ambiguous payload) is compressed, as named
/// by the region file's per-chunk compression byte (see `anvil`'s region
/// reader) or inferred from the standalone-file magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zlib,
    /// Raw deflate with no zlib/gzip envelope. Only produced when the
    /// caller explicitly names it (region chunk compression byte `3`).
    RawDeflate,
    /// Region chunk compression byte `4`. Optional per the format; this
    /// build has no lz4 decoder compiled in, so it is always rejected with
    /// [`Error::UnsupportedCompression`] rather than silently misread as
    /// something else.
    Lz4,
}

/// Sniff the compression scheme from the leading bytes of a standalone
/// file (`level.dat`, a `.litematic`, a `.schem`). Raw deflate has no
/// reliable magic bytes, so it is never returned here; it must be named
/// explicitly by the caller (chunk compression byte `3`).
pub fn detect(bytes: &[u8]) -> Option<Compression> {
    if bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B {
        return Some(Compression::Gzip);
    }
    if bytes.len() >= 2 && bytes[0] == 0x78 && matches!(bytes[1], 0x01 | 0x9C | 0xDA) {
        return Some(Compression::Zlib);
    }
    None
}

/// Inflate `bytes` under the given scheme, bounded at `limit` bytes of
/// output. Auto-detects gzip/zlib when `scheme` is `None` and the magic
/// bytes match; raw deflate and explicit "uncompressed" must be requested.
pub fn inflate_bounded(
    bytes: &[u8],
    scheme: Option<Compression>,
    limit: usize,
) -> Result<Vec<u8>> {
    let scheme = match scheme {
        Some(s) => Some(s),
        None => {
            let detected = detect(bytes);
            log::debug!("auto-detected compression scheme: {detected:?}");
            detected
        }
    };

    let out = match scheme {
        Some(Compression::Gzip) => read_bounded(GzDecoder::new(bytes), limit)?,
        Some(Compression::Zlib) => read_bounded(ZlibDecoder::new(bytes), limit)?,
        Some(Compression::RawDeflate) => {
            read_bounded(flate2::read::DeflateDecoder::new(bytes), limit)?
        }
        Some(Compression::Lz4) => {
            return Err(Error::UnsupportedCompression(4));
        }
        None => {
            return Err(Error::UnsupportedCompression(0xFF));
        }
    };

    Ok(out)
}

/// Convenience wrapper: auto-detect and inflate with the default bound.
pub fn inflate(bytes: &[u8]) -> Result<Vec<u8>> {
    inflate_bounded(bytes, None, MAX_INFLATED_SIZE)
}

fn read_bounded<R: Read>(mut r: R, limit: usize) -> Result<Vec<u8>> {
    // Read one byte past the limit so we can tell "exactly at the limit"
    // apart from "would have kept going".
    let mut out = Vec::new();
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = r.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        if out.len() + n > limit {
            return Err(Error::DecompressTooLarge { limit });
        }
        out.extend_from_slice(&chunk[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression as FlateCompression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut e = GzEncoder::new(Vec::new(), FlateCompression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut e = ZlibEncoder::new(Vec::new(), FlateCompression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    #[test]
    fn detects_and_inflates_gzip() {
        let payload = b"hello minecraft world".to_vec();
        let compressed = gzip(&payload);
        assert_eq!(detect(&compressed), Some(Compression::Gzip));
        assert_eq!(inflate(&compressed).unwrap(), payload);
    }

    #[test]
    fn detects_and_inflates_zlib() {
        let payload = b"hello minecraft world".repeat(100);
        let compressed = zlib(&payload);
        assert_eq!(detect(&compressed), Some(Compression::Zlib));
        assert_eq!(inflate(&compressed).unwrap(), payload);
    }

    #[test]
    fn oversized_output_is_rejected() {
        let payload = vec![0u8; 1024];
        let compressed = zlib(&payload);
        let err = inflate_bounded(&compressed, None, 100).unwrap_err();
        assert!(matches!(err, Error::DecompressTooLarge { limit: 100 }));
    }

    #[test]
    fn unrecognised_bytes_without_explicit_scheme_fail() {
        let err = inflate_bounded(b"not compressed", None, 1024).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(_)));
    }
}
