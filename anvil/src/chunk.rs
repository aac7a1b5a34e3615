//! The chunk/section walker.
//!
//! Locates a chunk's section list across the five historical NBT shapes,
//! decodes each section's palette and packed block-state array, and yields
//! `(world_x, world_y, world_z, block_name)` cells in section-local
//! `(y, z, x)` order. Air-like blocks are elided here; name-to-target-id
//! resolution happens one layer up, in `convert`.
//!
//! Follows `fastanvil::java`'s section-path fallback and
//! `Pre18Section`/`Pre18Blockstates` bit-unpacking, reworked around our own
//! [`crate::packed`] codec and the dynamic [`nbt::Tag`] tree instead of
//! serde-typed structs.

use nbt::{Compound, Tag};

use crate::error::{Error, Result};
use crate::legacy;
use crate::packed::{self, Layout};
use crate::region::Aabb;

/// Data version at and after which block-state long arrays use the
/// word-aligned packing convention rather than the straddling dense one.
pub const ALIGNED_PACKING_DATA_VERSION: i32 = 2504;

const SECTION_PATHS: &[&str] =
    &["sections", "Sections", "Level.Sections", "Data.Sections", "Data.sections"];

/// Block names elided from the output entirely.
const AIR_NAMES: &[&str] = &["minecraft:air", "minecraft:cave_air", "minecraft:void_air"];

fn is_air(name: &str) -> bool {
    AIR_NAMES.contains(&name)
}

/// One non-air decoded cell, in world block coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub name: String,
}

/// Walk every section of `chunk`, yielding non-air cells in world
/// coordinates. `chunk_x`/`chunk_z` are world-chunk coordinates (already
/// resolved from the region's location table, not trusted from the NBT
/// `xPos`/`zPos` fields). `data_version` selects dense vs aligned packing.
/// `bounds`, when given, elides cells (and skips whole sections) outside
/// the box before any per-cell work.
pub fn walk_chunk(
    chunk: &Compound,
    chunk_x: i32,
    chunk_z: i32,
    data_version: i32,
    bounds: Option<Aabb>,
) -> Result<Vec<Cell>> {
    walk_chunk_cancellable(chunk, chunk_x, chunk_z, data_version, bounds, None)
}

/// As [`walk_chunk`], but checks `cancel` (if given) between sections so a
/// caller can abort partway through an unusually tall chunk, checked at each
/// chunk boundary and between sections of a large chunk.
pub fn walk_chunk_cancellable(
    chunk: &Compound,
    chunk_x: i32,
    chunk_z: i32,
    data_version: i32,
    bounds: Option<Aabb>,
    cancel: Option<&dyn Fn() -> bool>,
) -> Result<Vec<Cell>> {
    let sections = find_sections(chunk)?;
    let layout = if data_version >= ALIGNED_PACKING_DATA_VERSION { Layout::Aligned } else { Layout::Dense };

    let mut cells = Vec::new();

    for section in sections {
        if cancel.is_some_and(|c| c()) {
            return Err(Error::Cancelled);
        }

        let Tag::Compound(section) = section else { continue };
        let section_y = read_section_y(section)?;

        if let Some(b) = bounds {
            let y0 = section_y * 16;
            let y1 = y0 + 15;
            if y1 < b.min.1 || y0 > b.max.1 {
                continue;
            }
        }

        walk_section(section, chunk_x, chunk_z, section_y, layout, bounds, &mut cells)?;
    }

    Ok(cells)
}

fn find_sections(chunk: &Compound) -> Result<Vec<Tag>> {
    for path in SECTION_PATHS {
        if let Some(tag) = nbt::path(chunk, path) {
            if let Some(items) = tag.as_list() {
                log::debug!("section list found at path \"{path}\"");
                return Ok(items.to_vec());
            }
        }
    }
    Err(Error::UnsupportedSectionLayout)
}

fn read_section_y(section: &Compound) -> Result<i32> {
    match section.get("Y") {
        Some(Tag::Byte(v)) => Ok(*v as i32),
        Some(Tag::Int(v)) => Ok(*v),
        _ => Err(Error::ChunkDecodeFailed("section missing Y index".to_string())),
    }
}

/// Try the modern `block_states` wrapper (1.18+) first, then the flatter
/// `Palette`/`BlockStates` pair used by 1.13-1.17, then the legacy
/// `Blocks`/`Data` byte arrays.
fn walk_section(
    section: &Compound,
    chunk_x: i32,
    chunk_z: i32,
    section_y: i32,
    layout: Layout,
    bounds: Option<Aabb>,
    out: &mut Vec<Cell>,
) -> Result<()> {
    if let Some(Tag::Compound(block_states)) = section.get("block_states") {
        return walk_palette_section(block_states, chunk_x, chunk_z, section_y, layout, bounds, out);
    }

    if section.get("Palette").is_some() || section.get("BlockStates").is_some() {
        return walk_palette_section(section, chunk_x, chunk_z, section_y, layout, bounds, out);
    }

    if let (Some(Tag::ByteArray(blocks)), Some(Tag::ByteArray(data))) =
        (section.get("Blocks"), section.get("Data"))
    {
        log::debug!("chunk ({chunk_x},{chunk_z}) section y={section_y} using legacy Blocks/Data layout");
        return walk_legacy_section(blocks, data, chunk_x, chunk_z, section_y, bounds, out);
    }

    Err(Error::UnsupportedSectionLayout)
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
                .ok_or_else(|| Error::ChunkDecodeFailed("palette entry missing Name".to_string()))
        })
        .collect()
}

fn walk_palette_section(
    container: &Compound,
    chunk_x: i32,
    chunk_z: i32,
    section_y: i32,
    layout: Layout,
    bounds: Option<Aabb>,
    out: &mut Vec<Cell>,
) -> Result<()> {
    let palette_tag = container
        .get("Palette")
        .or_else(|| container.get("palette"))
        .ok_or(Error::UnsupportedSectionLayout)?;
    let palette = palette_tag.as_list().ok_or(Error::UnsupportedSectionLayout)?;
    let names = palette_names(palette)?;

    if names.len() == 1 {
        if is_air(&names[0]) {
            return Ok(());
        }
        emit_uniform_section(&names[0], chunk_x, chunk_z, section_y, bounds, out);
        return Ok(());
    }

    let data_tag = container
        .get("BlockStates")
        .or_else(|| container.get("data"))
        .ok_or(Error::UnsupportedSectionLayout)?;
    let longs = data_tag.as_long_array().ok_or(Error::UnsupportedSectionLayout)?;

    let bits = packed::bits_per_value(names.len(), packed::CHUNK_MIN_BITS);
    let indices = packed::unpack(longs, bits, 4096, layout, names.len())?;

    for (i, idx) in indices.into_iter().enumerate() {
        let name = &names[idx as usize];
        if is_air(name) {
            continue;
        }
        let (lx, ly, lz) = local_coords(i);
        let (wx, wy, wz) = world_coords(chunk_x, chunk_z, section_y, lx, ly, lz);
        if let Some(b) = bounds {
            if !b.contains(wx, wy, wz) {
                continue;
            }
        }
        out.push(Cell { x: wx, y: wy, z: wz, name: name.clone() });
    }

    Ok(())
}

fn walk_legacy_section(
    blocks: &[i8],
    data: &[i8],
    chunk_x: i32,
    chunk_z: i32,
    section_y: i32,
    bounds: Option<Aabb>,
    out: &mut Vec<Cell>,
) -> Result<()> {
    if blocks.len() != 4096 || data.len() != 2048 {
        return Err(Error::ChunkDecodeFailed(format!(
            "legacy section has {} block bytes and {} data bytes, expected 4096/2048",
            blocks.len(),
            data.len()
        )));
    }

    for i in 0..4096 {
        let id = blocks[i] as u8;
        if id == 0 {
            continue;
        }
        let nibble = data[i / 2] as u8;
        let value = if i % 2 == 0 { nibble & 0x0F } else { (nibble >> 4) & 0x0F };
        let name = legacy::resolve(id, value);
        if is_air(name) {
            continue;
        }

        let (lx, ly, lz) = local_coords(i);
        let (wx, wy, wz) = world_coords(chunk_x, chunk_z, section_y, lx, ly, lz);
        if let Some(b) = bounds {
            if !b.contains(wx, wy, wz) {
                continue;
            }
        }
        out.push(Cell { x: wx, y: wy, z: wz, name: name.to_string() });
    }

    Ok(())
}

fn emit_uniform_section(
    name: &str,
    chunk_x: i32,
    chunk_z: i32,
    section_y: i32,
    bounds: Option<Aabb>,
    out: &mut Vec<Cell>,
) {
    for i in 0..4096 {
        let (lx, ly, lz) = local_coords(i);
        let (wx, wy, wz) = world_coords(chunk_x, chunk_z, section_y, lx, ly, lz);
        if let Some(b) = bounds {
            if !b.contains(wx, wy, wz) {
                continue;
            }
        }
        out.push(Cell { x: wx, y: wy, z: wz, name: name.to_string() });
    }
}

/// Section-local `(x, y, z)` from a flat index in `y*256 + z*16 + x` order.
fn local_coords(index: usize) -> (i32, i32, i32) {
    let x = (index % 16) as i32;
    let z = ((index / 16) % 16) as i32;
    let y = (index / 256) as i32;
    (x, y, z)
}

fn world_coords(chunk_x: i32, chunk_z: i32, section_y: i32, lx: i32, ly: i32, lz: i32) -> (i32, i32, i32) {
    (chunk_x * 16 + lx, section_y * 16 + ly, chunk_z * 16 + lz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbt::{List, Tag};

    fn palette_entry(name: &str) -> Tag {
        let mut c = Compound::new();
        c.insert("Name".to_string(), Tag::String(name.to_string()));
        Tag::Compound(c)
    }

    fn section_with_palette(y: i8, names: &[&str], longs: Option<Vec<i64>>) -> Tag {
        let mut section = Compound::new();
        section.insert("Y".to_string(), Tag::Byte(y));
        let palette = List { elem_tag: nbt::tag::COMPOUND_TAG, items: names.iter().map(|n| palette_entry(n)).collect() };
        section.insert("Palette".to_string(), Tag::List(palette));
        if let Some(longs) = longs {
            section.insert("BlockStates".to_string(), Tag::LongArray(longs));
        }
        Tag::Compound(section)
    }

    fn chunk_with_sections(sections: Vec<Tag>) -> Compound {
        let mut chunk = Compound::new();
        chunk.insert("sections".to_string(), Tag::List(List { elem_tag: nbt::tag::COMPOUND_TAG, items: sections }));
        chunk
    }

    #[test]
    fn single_entry_palette_fills_whole_section_except_air() {
        let section = section_with_palette(0, &["minecraft:stone"], None);
        let chunk = chunk_with_sections(vec![section]);

        let cells = walk_chunk(&chunk, 0, 0, 3000, None).unwrap();
        assert_eq!(cells.len(), 4096);
        assert!(cells.iter().all(|c| c.name == "minecraft:stone"));
    }

    #[test]
    fn single_entry_air_palette_yields_no_cells() {
        let section = section_with_palette(0, &["minecraft:air"], None);
        let chunk = chunk_with_sections(vec![section]);

        let cells = walk_chunk(&chunk, 0, 0, 3000, None).unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn two_block_aligned_section_decodes_correctly() {
        // B=4: alternate indices 0 (air) and 1 (stone) packed one nibble apiece.
        let mut word: u64 = 0;
        for i in 0..16u64 {
            let v = i % 2;
            word |= v << (i * 4);
        }
        let longs = vec![word as i64; 256];
        let section = section_with_palette(0, &["minecraft:air", "minecraft:stone"], Some(longs));
        let chunk = chunk_with_sections(vec![section]);

        let cells = walk_chunk(&chunk, 0, 0, ALIGNED_PACKING_DATA_VERSION, None).unwrap();
        assert_eq!(cells.len(), 2048);
        assert!(cells.iter().all(|c| c.name == "minecraft:stone"));
    }

    #[test]
    fn negative_chunk_coordinates_localize_correctly() {
        let section = section_with_palette(0, &["minecraft:stone"], None);
        let chunk = chunk_with_sections(vec![section]);

        let cells = walk_chunk(&chunk, -1, -1, 3000, None).unwrap();
        assert!(cells.iter().all(|c| c.x >= -16 && c.x <= -1 && c.z >= -16 && c.z <= -1));
    }

    #[test]
    fn aabb_elides_cells_outside_the_box() {
        let section = section_with_palette(0, &["minecraft:stone"], None);
        let chunk = chunk_with_sections(vec![section]);
        let bounds = Aabb { min: (0, 0, 0), max: (7, 15, 15) };

        let cells = walk_chunk(&chunk, 0, 0, 3000, Some(bounds)).unwrap();
        assert!(cells.iter().all(|c| c.x <= 7));
        assert_eq!(cells.len(), 8 * 16 * 16);
    }

    #[test]
    fn missing_section_layout_is_an_error() {
        let mut section = Compound::new();
        section.insert("Y".to_string(), Tag::Byte(0));
        let chunk = chunk_with_sections(vec![Tag::Compound(section)]);

        assert!(walk_chunk(&chunk, 0, 0, 3000, None).is_err());
    }

    #[test]
    fn legacy_blocks_data_pair_resolves_via_table() {
        let mut blocks = vec![0i8; 4096];
        blocks[0] = 1; // stone
        let data = vec![0i8; 2048];

        let mut section = Compound::new();
        section.insert("Y".to_string(), Tag::Byte(0));
        section.insert("Blocks".to_string(), Tag::ByteArray(blocks));
        section.insert("Data".to_string(), Tag::ByteArray(data));

        let chunk = chunk_with_sections(vec![Tag::Compound(section)]);
        let cells = walk_chunk(&chunk, 0, 0, 100, None).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].name, "minecraft:stone");
    }

    #[test]
    fn cancellation_is_observed_between_sections() {
        let sections = vec![
            section_with_palette(0, &["minecraft:stone"], None),
            section_with_palette(1, &["minecraft:stone"], None),
        ];
        let chunk = chunk_with_sections(sections);
        let cancel: &dyn Fn() -> bool = &|| true;

        let err = walk_chunk_cancellable(&chunk, 0, 0, 3000, None, Some(cancel)).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn alternate_section_path_is_found() {
        let section = section_with_palette(0, &["minecraft:stone"], None);
        let mut level = Compound::new();
        level.insert("Sections".to_string(), Tag::List(List { elem_tag: nbt::tag::COMPOUND_TAG, items: vec![section] }));
        let mut chunk = Compound::new();
        chunk.insert("Level".to_string(), Tag::Compound(level));

        let cells = walk_chunk(&chunk, 0, 0, 100, None).unwrap();
        assert_eq!(cells.len(), 4096);
    }
}
