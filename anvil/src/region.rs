//! The Anvil region-file container.
//!
//! A region file packs up to 1024 chunks (a 32x32 grid) into 4096-byte
//! sectors: an 8 KiB header (4 KiB location table + 4 KiB ignored timestamp
//! table) followed by `[4-byte length][1-byte compression][payload]` blocks.
//!
//! Follows `fastnbt::anvil`'s region reader and the `owengage/fastnbt`
//! `Region<S>`/`Builder` test-fixture pattern.

use std::fmt;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

const HEADER_LEN: usize = 8192;
const SECTOR_LEN: usize = 4096;
const SLOT_COUNT: usize = 1024;

/// An axis-aligned bounding box in world block coordinates, inclusive on
/// both ends. Used to pre-filter chunks and cells without decoding them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl Aabb {
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.min.0
            && x <= self.max.0
            && y >= self.min.1
            && y <= self.max.1
            && z >= self.min.2
            && z <= self.max.2
    }

    /// Whether any point of the 16x256x16 (or similar) column at
    /// `(chunk_x, chunk_z)` could possibly intersect this box.
    fn intersects_chunk_column(&self, chunk_x: i32, chunk_z: i32) -> bool {
        let x0 = chunk_x * 16;
        let z0 = chunk_z * 16;
        let x1 = x0 + 15;
        let z1 = z0 + 15;
        x1 >= self.min.0 && x0 <= self.max.0 && z1 >= self.min.2 && z0 <= self.max.2
    }
}

/// Compression scheme named by a region chunk's header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkCompression {
    Gzip,
    Zlib,
    RawDeflate,
    /// Chunk compression byte `4`: lz4. Optional per the format; this build
    /// carries no lz4 decoder, so it is accepted here only to be rejected
    /// uniformly as `UnsupportedCompression` downstream, rather than being
    /// mistaken for an unknown byte.
    Lz4,
}

impl ChunkCompression {
    fn from_byte(b: u8) -> Option<ChunkCompression> {
        match b {
            1 => Some(ChunkCompression::Gzip),
            2 => Some(ChunkCompression::Zlib),
            3 => Some(ChunkCompression::RawDeflate),
            4 => Some(ChunkCompression::Lz4),
            _ => None,
        }
    }

    fn as_nbt_scheme(self) -> nbt::Compression {
        match self {
            ChunkCompression::Gzip => nbt::Compression::Gzip,
            ChunkCompression::Zlib => nbt::Compression::Zlib,
            ChunkCompression::RawDeflate => nbt::Compression::RawDeflate,
            ChunkCompression::Lz4 => nbt::Compression::Lz4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Location {
    sector_offset: u32,
    sector_count: u8,
}

impl Location {
    fn is_empty(self) -> bool {
        self.sector_offset == 0 && self.sector_count == 0
    }
}

/// A parsed region file: `r.<region_x>.<region_z>.mca`.
pub struct Region<'a> {
    pub region_x: i32,
    pub region_z: i32,
    bytes: &'a [u8],
    locations: [Location; SLOT_COUNT],
}

impl<'a> fmt::Debug for Region<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("region_x", &self.region_x)
            .field("region_z", &self.region_z)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Parse `r.<x>.<z>.mca` (negative coordinates included), returning
/// `(x, z)`.
pub fn parse_region_filename(name: &str) -> Result<(i32, i32)> {
    let stem = name.strip_suffix(".mca").ok_or_else(|| Error::BadRegionFilename(name.to_string()))?;
    let mut parts = stem.split('.');
    let r = parts.next();
    let x = parts.next();
    let z = parts.next();
    let rest = parts.next();

    if rest.is_some() || r != Some("r") {
        return Err(Error::BadRegionFilename(name.to_string()));
    }

    let x: i32 = x
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::BadRegionFilename(name.to_string()))?;
    let z: i32 = z
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::BadRegionFilename(name.to_string()))?;

    Ok((x, z))
}

impl<'a> Region<'a> {
    /// Parse a region file's header. Validates only the overall length and
    /// location table; chunk payloads are read lazily by `load_chunk`.
    pub fn open(bytes: &'a [u8], region_x: i32, region_z: i32) -> Result<Region<'a>> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::BadRegionHeader { len: bytes.len() });
        }

        let mut locations = [Location { sector_offset: 0, sector_count: 0 }; SLOT_COUNT];
        for (i, loc) in locations.iter_mut().enumerate() {
            let entry = &bytes[i * 4..i * 4 + 4];
            let sector_offset = ((entry[0] as u32) << 16) | ((entry[1] as u32) << 8) | entry[2] as u32;
            let sector_count = entry[3];
            *loc = Location { sector_offset, sector_count };
        }

        Ok(Region { region_x, region_z, bytes, locations })
    }

    fn slot_index(cx: i32, cz: i32) -> usize {
        ((cz.rem_euclid(32)) * 32 + cx.rem_euclid(32)) as usize
    }

    /// Whether the location table marks `(cx, cz)` as present. `cx`/`cz`
    /// are chunk-local (0..32) within this region.
    pub fn has_chunk(&self, cx: i32, cz: i32) -> bool {
        !self.locations[Self::slot_index(cx, cz)].is_empty()
    }

    /// Load and decode one chunk's NBT root compound. `cx`/`cz` are
    /// chunk-local coordinates (0..32) within this region. Returns `Ok(None)`
    /// for an empty slot. A chunk whose header or payload is malformed is
    /// reported via `Err` so the caller can log and skip it; this method
    /// never panics on untrusted input.
    pub fn load_chunk(&self, cx: i32, cz: i32) -> Result<Option<nbt::Compound>> {
        let loc = self.locations[Self::slot_index(cx, cz)];
        if loc.is_empty() {
            return Ok(None);
        }

        let start = loc.sector_offset as usize * SECTOR_LEN;
        let sector_bytes = loc.sector_count as usize * SECTOR_LEN;

        if sector_bytes < 5 {
            return Err(Error::ChunkDecodeFailed(format!(
                "chunk ({cx},{cz}) has a zero-sized sector allocation"
            )));
        }
        if start + sector_bytes > self.bytes.len() {
            return Err(Error::ChunkDecodeFailed(format!(
                "chunk ({cx},{cz}) sector range [{start}, {}) exceeds region length {}",
                start + sector_bytes,
                self.bytes.len()
            )));
        }

        let mut header = &self.bytes[start..start + 5];
        let length = header.read_u32::<BigEndian>().map_err(|e| {
            Error::ChunkDecodeFailed(format!("chunk ({cx},{cz}) header read failed: {e}"))
        })? as usize;
        let compression_byte = header.read_u8().map_err(|e| {
            Error::ChunkDecodeFailed(format!("chunk ({cx},{cz}) header read failed: {e}"))
        })?;

        if length == 0 {
            return Err(Error::ChunkDecodeFailed(format!("chunk ({cx},{cz}) declared zero length")));
        }
        if length > sector_bytes.saturating_sub(4) {
            return Err(Error::ChunkDecodeFailed(format!(
                "chunk ({cx},{cz}) length {length} exceeds its {sector_bytes}-byte sector allocation"
            )));
        }

        let payload_start = start + 5;
        let payload_len = length - 1;
        if payload_start + payload_len > self.bytes.len() {
            return Err(Error::ChunkDecodeFailed(format!(
                "chunk ({cx},{cz}) payload runs past end of file"
            )));
        }
        let payload = &self.bytes[payload_start..payload_start + payload_len];

        let scheme = ChunkCompression::from_byte(compression_byte)
            .ok_or_else(|| Error::ChunkDecodeFailed(format!("chunk ({cx},{cz}) unknown compression byte {compression_byte}")))?;

        let inflated = nbt::inflate_bounded(payload, Some(scheme.as_nbt_scheme()), nbt::decompress::MAX_INFLATED_SIZE)?;
        let (_name, root) = nbt::parse(&inflated)?;
        Ok(Some(root))
    }

    /// Iterate over every non-empty chunk slot in world-chunk coordinates,
    /// yielding the chunk coordinate and its decode result. `bounds`, when
    /// given, skips whole chunk columns that cannot intersect it before any
    /// decompression happens.
    pub fn iter_chunks<'r>(&'r self, bounds: Option<Aabb>) -> impl Iterator<Item = (i32, i32, Result<nbt::Compound>)> + 'r {
        let region_x = self.region_x;
        let region_z = self.region_z;
        (0..SLOT_COUNT).filter_map(move |slot| {
            let local_x = (slot % 32) as i32;
            let local_z = (slot / 32) as i32;
            if self.locations[slot].is_empty() {
                return None;
            }

            let world_cx = region_x * 32 + local_x;
            let world_cz = region_z * 32 + local_z;

            if let Some(b) = bounds {
                if !b.intersects_chunk_column(world_cx, world_cz) {
                    return None;
                }
            }

            let result = match self.load_chunk(local_x, local_z) {
                Ok(Some(root)) => Ok(root),
                Ok(None) => return None,
                Err(e) => Err(e),
            };
            Some((world_cx, world_cz, result))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a minimal valid region file byte buffer for tests, following
    /// `fastnbt`'s own `Builder`-struct fixture convention.
    struct Builder {
        locations: [(u32, u8); SLOT_COUNT],
        chunks: Vec<(usize, Vec<u8>)>,
    }

    impl Builder {
        fn new() -> Self {
            Builder { locations: [(0, 0); SLOT_COUNT], chunks: Vec::new() }
        }

        /// Registers chunk-local slot `(cx, cz)` with a zlib-compressed NBT
        /// payload built from `compound`.
        fn chunk(mut self, cx: i32, cz: i32, compound: &nbt::Compound) -> Self {
            let encoded = encode_compound("", compound);
            let mut zlib = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            zlib.write_all(&encoded).unwrap();
            let compressed = zlib.finish().unwrap();

            let slot = Region::slot_index(cx, cz);
            self.chunks.push((slot, compressed));
            self
        }

        fn build(self) -> Vec<u8> {
            let mut sector_cursor = 2u32; // sectors 0,1 are the header
            let mut locations = self.locations;
            let mut body = Vec::new();

            for (slot, compressed) in &self.chunks {
                let mut block = Vec::new();
                block.extend_from_slice(&((compressed.len() + 1) as u32).to_be_bytes());
                block.push(2); // zlib
                block.extend_from_slice(compressed);
                let sectors = (block.len() + SECTOR_LEN - 1) / SECTOR_LEN;
                let padded = sectors * SECTOR_LEN;
                let mut padded_block = block.clone();
                padded_block.resize(padded, 0);

                locations[*slot] = (sector_cursor, sectors as u8);
                sector_cursor += sectors as u32;
                body.extend_from_slice(&padded_block);
            }

            let mut out = Vec::with_capacity(HEADER_LEN + body.len());
            for (offset, count) in locations {
                out.push((offset >> 16) as u8);
                out.push((offset >> 8) as u8);
                out.push(offset as u8);
                out.push(count);
            }
            out.resize(HEADER_LEN, 0);
            out.extend_from_slice(&body);
            out
        }
    }

    /// Minimal big-endian NBT encoder, used only by test fixtures. Mirrors
    /// the subset of tag kinds our tests construct.
    fn encode_compound(name: &str, compound: &nbt::Compound) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(nbt::tag::COMPOUND_TAG);
        write_modified_utf8(&mut out, name);
        encode_compound_body(&mut out, compound);
        out
    }

    fn encode_compound_body(out: &mut Vec<u8>, compound: &nbt::Compound) {
        for (key, value) in compound {
            out.push(value.id());
            write_modified_utf8(out, key);
            encode_payload(out, value);
        }
        out.push(nbt::tag::END_TAG);
    }

    fn encode_payload(out: &mut Vec<u8>, tag: &nbt::Tag) {
        match tag {
            nbt::Tag::Byte(v) => out.push(*v as u8),
            nbt::Tag::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
            nbt::Tag::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            nbt::Tag::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            nbt::Tag::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
            nbt::Tag::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
            nbt::Tag::ByteArray(v) => {
                out.extend_from_slice(&(v.len() as i32).to_be_bytes());
                for b in v {
                    out.push(*b as u8);
                }
            }
            nbt::Tag::String(s) => write_modified_utf8(out, s),
            nbt::Tag::List(l) => {
                out.push(l.elem_tag);
                out.extend_from_slice(&(l.items.len() as i32).to_be_bytes());
                for item in &l.items {
                    encode_payload(out, item);
                }
            }
            nbt::Tag::Compound(c) => encode_compound_body(out, c),
            nbt::Tag::IntArray(v) => {
                out.extend_from_slice(&(v.len() as i32).to_be_bytes());
                for i in v {
                    out.extend_from_slice(&i.to_be_bytes());
                }
            }
            nbt::Tag::LongArray(v) => {
                out.extend_from_slice(&(v.len() as i32).to_be_bytes());
                for l in v {
                    out.extend_from_slice(&l.to_be_bytes());
                }
            }
        }
    }

    fn write_modified_utf8(out: &mut Vec<u8>, s: &str) {
        let bytes = s.as_bytes();
        out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(bytes);
    }

    #[test]
    fn empty_region_has_no_chunks() {
        let bytes = Builder::new().build();
        let region = Region::open(&bytes, 0, 0).unwrap();
        assert!(!region.has_chunk(0, 0));
        assert_eq!(region.iter_chunks(None).count(), 0);
    }

    #[test]
    fn rejects_buffer_shorter_than_header() {
        let err = Region::open(&[0u8; 100], 0, 0).unwrap_err();
        assert!(matches!(err, Error::BadRegionHeader { len: 100 }));
    }

    #[test]
    fn round_trips_a_single_chunk() {
        let mut compound = nbt::Compound::new();
        compound.insert("xPos".to_string(), nbt::Tag::Int(5));
        compound.insert("zPos".to_string(), nbt::Tag::Int(7));

        let bytes = Builder::new().chunk(5, 7, &compound).build();
        let region = Region::open(&bytes, 0, 0).unwrap();

        assert!(region.has_chunk(5, 7));
        let loaded = region.load_chunk(5, 7).unwrap().unwrap();
        assert_eq!(loaded.get("xPos").and_then(|t| t.as_i32()), Some(5));
        assert_eq!(loaded.get("zPos").and_then(|t| t.as_i32()), Some(7));
    }

    #[test]
    fn iter_chunks_reports_world_coordinates() {
        let mut compound = nbt::Compound::new();
        compound.insert("marker".to_string(), nbt::Tag::Byte(1));

        let bytes = Builder::new().chunk(3, 4, &compound).build();
        let region = Region::open(&bytes, -1, 2).unwrap();

        let found: Vec<_> = region.iter_chunks(None).collect();
        assert_eq!(found.len(), 1);
        let (wx, wz, result) = &found[0];
        assert_eq!(*wx, -1 * 32 + 3);
        assert_eq!(*wz, 2 * 32 + 4);
        assert!(result.is_ok());
    }

    #[test]
    fn aabb_filters_out_distant_chunks() {
        let mut compound = nbt::Compound::new();
        compound.insert("marker".to_string(), nbt::Tag::Byte(1));

        let bytes = Builder::new().chunk(0, 0, &compound).build();
        let region = Region::open(&bytes, 10, 10).unwrap();

        let bounds = Aabb { min: (0, 0, 0), max: (15, 255, 15) };
        assert_eq!(region.iter_chunks(Some(bounds)).count(), 0);
    }

    #[test]
    fn parses_negative_region_coordinates() {
        assert_eq!(parse_region_filename("r.-1.-2.mca").unwrap(), (-1, -2));
        assert_eq!(parse_region_filename("r.3.4.mca").unwrap(), (3, 4));
        assert!(parse_region_filename("r.3.4.mcx").is_err());
        assert!(parse_region_filename("region.3.4.mca").is_err());
    }

    #[test]
    fn chunk_header_claiming_past_eof_is_an_error() {
        let mut compound = nbt::Compound::new();
        compound.insert("x".to_string(), nbt::Tag::Int(1));
        let mut bytes = Builder::new().chunk(0, 0, &compound).build();

        // Corrupt the declared length to something absurd.
        let corrupt_len: u32 = 0x7FFF_FFFF;
        bytes[HEADER_LEN..HEADER_LEN + 4].copy_from_slice(&corrupt_len.to_be_bytes());

        let region = Region::open(&bytes, 0, 0).unwrap();
        assert!(region.load_chunk(0, 0).is_err());
    }
}
