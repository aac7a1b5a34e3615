//! Schematic file reader: Litematica, WorldEdit Sponge v2/v3, and
//! (best-effort) classic pre-1.13 `.schematic`.
//!
//! An alternate front-end over [`crate::packed`] and the `nbt` crate for
//! single-structure files rather than whole worlds. Follows the
//! Litematica/Sponge auto-detection and varint decoding conventions used by
//! WorldEdit-schematic reference implementations, reworked around our own
//! dynamic [`nbt::Tag`] tree.

use nbt::{Compound, Tag};

use crate::chunk::Cell;
use crate::error::{Error, Result};
use crate::packed::{self, Layout};

/// Minimum bits per palette index for schematic formats (Litematica,
/// sponge v2/v3 all tolerate a 2-entry palette in 2 bits; chunks require 4,
/// see [`crate::packed::CHUNK_MIN_BITS`]).
pub const SCHEMATIC_MIN_BITS: u32 = 2;

const AIR_NAMES: &[&str] = &["minecraft:air", "minecraft:cave_air", "minecraft:void_air"];

fn is_air(name: &str) -> bool {
    AIR_NAMES.contains(&name)
}

/// A decoded schematic: its extent plus the non-air cells it contains, in
/// the schematic's own local coordinate system (no chunk/region offset).
#[derive(Debug, Clone, PartialEq)]
pub struct Schematic {
    pub width: i32,
    pub height: i32,
    pub length: i32,
    /// Whether the original (possibly negative) Litematica `Size` indicated
    /// the region is mirrored on each axis. Always `false` for sponge
    /// formats, which have no sign convention. A negative Litematica size
    /// means the region extends in the negative direction from its origin;
    /// we normalize the extent to positive and record the mirror here
    /// instead of propagating signed dimensions further down the pipeline.
    pub mirrored_x: bool,
    pub mirrored_y: bool,
    pub mirrored_z: bool,
    pub cells: Vec<Cell>,
}

/// Detect and decode a schematic from its root NBT compound.
pub fn load_schematic(root: &Compound) -> Result<Schematic> {
    if let Some(Tag::Compound(regions)) = root.get("Regions") {
        return load_litematica(regions);
    }

    if let Some(Tag::Compound(schematic)) = root.get("Schematic") {
        return load_sponge(schematic);
    }

    // Classic pre-flattening `.schematic` files also carry flat
    // Width/Height/Length tags alongside `Blocks`/`Data` byte arrays, so
    // this check must run before the generic sponge-v2 shape below.
    if root.get("Blocks").is_some() && root.get("Data").is_some() {
        return load_classic(root);
    }

    if root.get("Width").is_some() && root.get("Height").is_some() && root.get("Length").is_some() {
        return load_sponge(root);
    }

    Err(Error::UnsupportedSchematic("root compound matched no known schematic shape".to_string()))
}

fn load_litematica(regions: &Compound) -> Result<Schematic> {
    let (_name, region) = regions
        .iter()
        .next()
        .ok_or_else(|| Error::UnsupportedSchematic("Litematica file has no regions".to_string()))?;
    let region = region
        .as_compound()
        .ok_or_else(|| Error::UnsupportedSchematic("Litematica region entry is not a compound".to_string()))?;

    let size = region
        .get("Size")
        .and_then(Tag::as_compound)
        .ok_or_else(|| Error::UnsupportedSchematic("Litematica region missing Size".to_string()))?;
    let raw_x = size.get("x").and_then(Tag::as_i32).ok_or_else(|| missing("Size.x"))?;
    let raw_y = size.get("y").and_then(Tag::as_i32).ok_or_else(|| missing("Size.y"))?;
    let raw_z = size.get("z").and_then(Tag::as_i32).ok_or_else(|| missing("Size.z"))?;

    let width = raw_x.abs();
    let height = raw_y.abs();
    let length = raw_z.abs();

    let palette = region
        .get("BlockStatePalette")
        .and_then(Tag::as_list)
        .ok_or_else(|| missing("BlockStatePalette"))?;
    let names = palette_names(palette)?;

    let longs = region
        .get("BlockStates")
        .and_then(Tag::as_long_array)
        .ok_or_else(|| missing("BlockStates"))?;

    let count = (width as usize) * (height as usize) * (length as usize);
    let bits = packed::bits_per_value(names.len(), SCHEMATIC_MIN_BITS);
    let indices = packed::unpack(longs, bits, count, Layout::Dense, names.len())?;

    let cells = decode_cells(&indices, &names, width, height, length);

    Ok(Schematic {
        width,
        height,
        length,
        mirrored_x: raw_x < 0,
        mirrored_y: raw_y < 0,
        mirrored_z: raw_z < 0,
        cells,
    })
}

fn load_sponge(data_root: &Compound) -> Result<Schematic> {
    let width = data_root.get("Width").and_then(Tag::as_i64).ok_or_else(|| missing("Width"))? as i32;
    let height = data_root.get("Height").and_then(Tag::as_i64).ok_or_else(|| missing("Height"))? as i32;
    let length = data_root.get("Length").and_then(Tag::as_i64).ok_or_else(|| missing("Length"))? as i32;
    let count = (width as usize) * (height as usize) * (length as usize);

    // Sponge v3 nests block storage under `Blocks`; v2 keeps it at the top
    // level of the data root.
    let blocks_root = match data_root.get("Blocks").and_then(Tag::as_compound) {
        Some(c) => c,
        None => data_root,
    };

    let palette_compound = blocks_root
        .get("Palette")
        .and_then(Tag::as_compound)
        .ok_or_else(|| missing("Palette"))?;
    let names = invert_palette(palette_compound)?;

    let indices = if let Some(data_longs) = blocks_root.get("Data").and_then(Tag::as_long_array) {
        // v3: aligned packed longs.
        let bits = packed::bits_per_value(names.len(), SCHEMATIC_MIN_BITS);
        packed::unpack(data_longs, bits, count, Layout::Aligned, names.len())?
    } else if let Some(block_data) = blocks_root.get("BlockData").and_then(Tag::as_byte_array) {
        // v2: varint-encoded indices, one per cell, no packing.
        decode_varints(block_data, count)?
    } else {
        return Err(Error::UnsupportedSchematic("sponge schematic missing Data/BlockData".to_string()));
    };

    let cells = decode_cells(&indices, &names, width, height, length);

    Ok(Schematic { width, height, length, mirrored_x: false, mirrored_y: false, mirrored_z: false, cells })
}

/// Best-effort classic pre-1.13 `.schematic` reader. This format's
/// byte-array layout is only decoded when `Blocks`/`Data` are both present
/// and internally consistent; anything else is `UnsupportedSchematic`
/// rather than a guess.
fn load_classic(root: &Compound) -> Result<Schematic> {
    let width = root.get("Width").and_then(Tag::as_i64).ok_or_else(|| missing("Width"))? as i32;
    let height = root.get("Height").and_then(Tag::as_i64).ok_or_else(|| missing("Height"))? as i32;
    let length = root.get("Length").and_then(Tag::as_i64).ok_or_else(|| missing("Length"))? as i32;
    let count = (width as usize) * (height as usize) * (length as usize);

    let blocks = root
        .get("Blocks")
        .and_then(Tag::as_byte_array)
        .ok_or_else(|| missing("Blocks"))?;
    let data = root.get("Data").and_then(Tag::as_byte_array).ok_or_else(|| missing("Data"))?;

    if blocks.len() != count || data.len() != count {
        return Err(Error::UnsupportedSchematic(format!(
            "classic schematic byte arrays ({}, {}) do not match declared extent {count}",
            blocks.len(),
            data.len()
        )));
    }

    let mut cells = Vec::new();
    for i in 0..count {
        let id = blocks[i] as u8;
        if id == 0 {
            continue;
        }
        let value = (data[i] as u8) & 0x0F;
        let name = crate::legacy::resolve(id, value);
        if is_air(name) {
            continue;
        }
        let (x, y, z) = local_coords_3d(i, width, height, length);
        cells.push(Cell { x, y, z, name: name.to_string() });
    }

    Ok(Schematic { width, height, length, mirrored_x: false, mirrored_y: false, mirrored_z: false, cells })
}

fn palette_names(palette: &[Tag]) -> Result<Vec<String>> {
    palette
        .iter()
        .map(|entry| {
            entry
                .as_compound()
                .and_then(|c| c.get("Name"))
                .and_then(Tag::as_str)
                .map(|s| s.to_string())
                .ok_or_else(|| Error::UnsupportedSchematic("palette entry missing Name".to_string()))
        })
        .collect()
}

/// Sponge's `Palette` maps `name -> index`; invert it into `index -> name`
/// so it lines up with the positional palettes used elsewhere.
fn invert_palette(palette: &Compound) -> Result<Vec<String>> {
    let mut max_index = 0usize;
    let mut entries = Vec::with_capacity(palette.len());
    for (name, idx_tag) in palette {
        let idx = idx_tag
            .as_i64()
            .ok_or_else(|| Error::UnsupportedSchematic(format!("palette entry {name} has non-integer index")))?;
        let idx = idx as usize;
        max_index = max_index.max(idx);
        entries.push((idx, name.clone()));
    }

    let mut names = vec![String::new(); max_index + 1];
    for (idx, name) in entries {
        names[idx] = name;
    }
    Ok(names)
}

fn decode_varints(data: &[i8], expected_count: usize) -> Result<Vec<u32>> {
    let mut out = Vec::with_capacity(expected_count);
    let bytes: Vec<u8> = data.iter().map(|&b| b as u8).collect();
    let mut i = 0;

    while i < bytes.len() && out.len() < expected_count {
        let mut value: u32 = 0;
        let mut shift = 0u32;
        loop {
            if i >= bytes.len() {
                return Err(Error::UnsupportedSchematic("truncated varint block data".to_string()));
            }
            let byte = bytes[i];
            i += 1;
            value |= ((byte & 0x7F) as u32) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
            if shift >= 35 {
                return Err(Error::UnsupportedSchematic("varint too large in block data".to_string()));
            }
        }
        out.push(value);
    }

    if out.len() != expected_count {
        return Err(Error::UnsupportedSchematic(format!(
            "varint block data decoded {} values, expected {expected_count}",
            out.len()
        )));
    }

    Ok(out)
}

fn decode_cells(indices: &[u32], names: &[String], width: i32, height: i32, length: i32) -> Vec<Cell> {
    let mut cells = Vec::new();
    for (i, &idx) in indices.iter().enumerate() {
        let name = match names.get(idx as usize) {
            Some(n) if !n.is_empty() => n,
            _ => continue,
        };
        if is_air(name) {
            continue;
        }
        let (x, y, z) = local_coords_3d(i, width, height, length);
        cells.push(Cell { x, y, z, name: name.clone() });
    }
    cells
}

fn local_coords_3d(index: usize, width: i32, _height: i32, length: i32) -> (i32, i32, i32) {
    let w = width as usize;
    let l = length as usize;
    let x = (index % w) as i32;
    let z = ((index / w) % l) as i32;
    let y = (index / (w * l)) as i32;
    (x, y, z)
}

fn missing(field: &str) -> Error {
    Error::UnsupportedSchematic(format!("missing required field {field}"))
}
