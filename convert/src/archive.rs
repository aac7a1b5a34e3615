//! The ZIP archive front-end.
//!
//! Locates `level.dat` and enumerates region files inside a save archive,
//! and extracts just enough of `level.dat`'s metadata to drive the rest of
//! the conversion (most importantly `DataVersion`, which selects dense vs
//! aligned packing in [`anvil::packed`] and [`anvil::chunk`]).
//!
//! `nbt`/`anvil` have no knowledge of ZIP, so this module is the only place
//! it appears, built on the `zip` crate.

use std::io::{Cursor, Read};

use nbt::{Compound, Tag};
use zip::ZipArchive;

use crate::error::{ConvertError, Result};

/// Candidate `level.dat` locations tried before falling back to a
/// suffix/equality scan over every entry name.
const LEVEL_DAT_CANDIDATES: &[&str] = &["level.dat", "world/level.dat", "saves/level.dat"];

/// A region file entry discovered inside the archive.
#[derive(Debug, Clone)]
pub struct RegionEntry {
    pub path: String,
    pub region_x: i32,
    pub region_z: i32,
}

/// The subset of `level.dat`'s `Data` compound this converter cares about.
#[derive(Debug, Clone, Default)]
pub struct WorldMetadata {
    pub level_name: Option<String>,
    pub version_name: Option<String>,
    pub data_version: i32,
    pub spawn: Option<(i32, i32, i32)>,
}

/// An opened save archive: `level.dat` located, region files enumerated.
pub struct WorldArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    level_dat_path: String,
    /// The directory containing `level.dat`, with a trailing `/` (or empty
    /// for a root-level save).
    world_base: String,
}

impl WorldArchive {
    /// Open a ZIP buffer and locate `level.dat` within it. Does not decode
    /// `level.dat` yet; that happens in [`WorldArchive::metadata`].
    pub fn open(bytes: Vec<u8>) -> Result<WorldArchive> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let level_dat_path = find_level_dat(&mut archive)?;
        let world_base = match level_dat_path.rfind('/') {
            Some(idx) => level_dat_path[..=idx].to_string(),
            None => String::new(),
        };
        Ok(WorldArchive { archive, level_dat_path, world_base })
    }

    /// Read and decode `level.dat`'s metadata.
    pub fn metadata(&mut self) -> Result<WorldMetadata> {
        let bytes = self.read_entry(&self.level_dat_path.clone())?;
        let (_name, root) = nbt::parse_compressed(&bytes)?;

        if let Some(Tag::Compound(data)) = root.get("Data") {
            return Ok(metadata_from_data(data));
        }

        // Bedrock dumps / partial saves: recursively search for the keys
        // we need instead of trusting the standard `Data` wrapper exists.
        Ok(recursive_metadata_search(&root))
    }

    /// Enumerate `r.<x>.<z>.mca` entries under `<base>region/` and, for the
    /// overworld, `<base>DIM0/region/` when present.
    pub fn region_entries(&mut self) -> Result<Vec<RegionEntry>> {
        let region_dirs = [format!("{}region/", self.world_base), format!("{}DIM0/region/", self.world_base)];

        let mut entries = Vec::new();
        let names: Vec<String> = self.archive.file_names().map(|s| s.to_string()).collect();

        for name in names {
            for dir in &region_dirs {
                if let Some(rest) = name.strip_prefix(dir.as_str()) {
                    if rest.contains('/') {
                        continue; // nested directory, not a region file itself
                    }
                    if let Ok((region_x, region_z)) = anvil::parse_region_filename(rest) {
                        entries.push(RegionEntry { path: name.clone(), region_x, region_z });
                    }
                }
            }
        }

        Ok(entries)
    }

    /// Read one archive entry's full, decompressed-by-zip bytes.
    pub fn read_entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(path)?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

fn find_level_dat(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> Result<String> {
    for candidate in LEVEL_DAT_CANDIDATES {
        if archive.by_name(candidate).is_ok() {
            return Ok(candidate.to_string());
        }
    }

    for name in archive.file_names() {
        if name == "level.dat" || name.ends_with("/level.dat") {
            return Ok(name.to_string());
        }
    }

    Err(ConvertError::Archive("no level.dat found in archive".to_string()))
}

fn metadata_from_data(data: &Compound) -> WorldMetadata {
    let level_name = data.get("LevelName").and_then(Tag::as_str).map(|s| s.to_string());
    let version_name = data
        .get("Version")
        .and_then(Tag::as_compound)
        .and_then(|v| v.get("Name"))
        .and_then(Tag::as_str)
        .map(|s| s.to_string());
    let data_version = data.get("DataVersion").and_then(Tag::as_i32).unwrap_or(0);
    let spawn = match (
        data.get("SpawnX").and_then(Tag::as_i32),
        data.get("SpawnY").and_then(Tag::as_i32),
        data.get("SpawnZ").and_then(Tag::as_i32),
    ) {
        (Some(x), Some(y), Some(z)) => Some((x, y, z)),
        _ => None,
    };

    WorldMetadata { level_name, version_name, data_version, spawn }
}

/// Fallback for archives where the standard `Data` wrapper is missing:
/// search every compound in the tree for the keys we need.
fn recursive_metadata_search(root: &Compound) -> WorldMetadata {
    let mut meta = WorldMetadata::default();
    search(root, &mut meta);
    meta
}

fn search(compound: &Compound, meta: &mut WorldMetadata) {
    if meta.level_name.is_none() {
        if let Some(s) = compound.get("LevelName").and_then(Tag::as_str) {
            meta.level_name = Some(s.to_string());
        }
    }
    if meta.data_version == 0 {
        if let Some(v) = compound.get("DataVersion").and_then(Tag::as_i32) {
            meta.data_version = v;
        }
    }
    if meta.spawn.is_none() {
        if let (Some(x), Some(y), Some(z)) = (
            compound.get("SpawnX").and_then(Tag::as_i32),
            compound.get("SpawnY").and_then(Tag::as_i32),
            compound.get("SpawnZ").and_then(Tag::as_i32),
        ) {
            meta.spawn = Some((x, y, z));
        }
    }
    for value in compound.values() {
        if let Tag::Compound(inner) = value {
            search(inner, meta);
        }
    }
}
