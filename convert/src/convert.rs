//! The conversion driver (everything but CLI parsing; see
//! [`crate::main`]).
//!
//! Ties the archive front-end, region/chunk/section read path (`anvil`),
//! and block-name resolver together: fans `.mca` files out across a
//! `rayon` thread pool, merges each worker's block map and unmapped-log
//! into one accumulator, and produces the final output and result JSON
//! documents.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use anvil::Aabb;

use crate::archive::WorldArchive;
use crate::catalog::Catalog;
use crate::error::{ConvertError, Result};
use crate::resolve::{Resolver, UnmappedEntry};

/// Options threaded through a single conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub bounds: Option<Aabb>,
}

/// Cooperative cancellation token, checked at each chunk/region boundary.
/// Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancellationToken(std::sync::Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken(std::sync::Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The accumulated result of a successful conversion: the sparse block map
/// plus enough bookkeeping to build both the output JSON and the result
/// object.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub block_map: HashMap<(i32, i32, i32), u16>,
    pub unmapped: HashMap<String, UnmappedEntry>,
    pub world_name: Option<String>,
}

impl ConversionReport {
    pub fn block_count(&self) -> u64 {
        self.block_map.len() as u64
    }
}

/// Convert a ZIP-archived Java Edition save. Errors returned here are
/// fatal (archive/catalog-level failures); per-chunk and per-region
/// failures are logged and skipped internally.
pub fn convert_archive(
    bytes: Vec<u8>,
    catalog: &Catalog,
    opts: &ConversionOptions,
    cancel: &CancellationToken,
) -> Result<ConversionReport> {
    let mut archive = WorldArchive::open(bytes)?;
    let metadata = archive.metadata()?;
    let region_entries = archive.region_entries()?;

    log::info!(
        "loaded {} (data version {}), {} region files",
        metadata.level_name.as_deref().unwrap_or("<unnamed>"),
        metadata.data_version,
        region_entries.len()
    );

    // Region bytes are read up front (sequentially, against the single
    // archive handle) so the rayon fan-out below only touches independent,
    // already-owned buffers, one region per worker, without needing a
    // shared, lockable archive handle.
    let mut region_buffers = Vec::with_capacity(region_entries.len());
    for entry in &region_entries {
        if cancel.is_cancelled() {
            return Err(ConvertError::Cancelled);
        }
        match archive.read_entry(&entry.path) {
            Ok(bytes) => region_buffers.push((entry.clone(), bytes)),
            Err(e) => log::warn!("skipping region {}: {e}", entry.path),
        }
    }

    let data_version = metadata.data_version;
    let bounds = opts.bounds;

    let partials: Vec<(HashMap<(i32, i32, i32), u16>, HashMap<String, UnmappedEntry>)> = region_buffers
        .par_iter()
        .map(|(entry, bytes)| {
            convert_one_region(bytes, entry.region_x, entry.region_z, data_version, bounds, catalog, cancel)
        })
        .collect();

    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    let mut report = ConversionReport { world_name: metadata.level_name, ..Default::default() };
    for (map, unmapped) in partials {
        merge_block_map(&mut report.block_map, map);
        Resolver::merge_unmapped(&mut report.unmapped, unmapped);
    }

    log::info!("decoded {} blocks", report.block_count());
    Ok(report)
}

fn convert_one_region(
    bytes: &[u8],
    region_x: i32,
    region_z: i32,
    data_version: i32,
    bounds: Option<Aabb>,
    catalog: &Catalog,
    cancel: &CancellationToken,
) -> (HashMap<(i32, i32, i32), u16>, HashMap<String, UnmappedEntry>) {
    let mut map = HashMap::new();
    let mut resolver = Resolver::new(catalog);

    let region = match anvil::Region::open(bytes, region_x, region_z) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("skipping region ({region_x},{region_z}): {e}");
            return (map, resolver.into_unmapped());
        }
    };

    for (cx, cz, chunk_result) in region.iter_chunks(bounds) {
        if cancel.is_cancelled() {
            break;
        }

        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                log::warn!("skipping chunk ({cx},{cz}): {e}");
                continue;
            }
        };

        let cancel_check: &dyn Fn() -> bool = &|| cancel.is_cancelled();
        let cells = match anvil::walk_chunk_cancellable(&chunk, cx, cz, data_version, bounds, Some(cancel_check)) {
            Ok(c) => c,
            Err(anvil::Error::Cancelled) => break,
            Err(e) => {
                log::warn!("skipping chunk ({cx},{cz}): {e}");
                continue;
            }
        };

        for cell in cells {
            let id = resolver.resolve(&cell.name, (cell.x, cell.y, cell.z));
            map.insert((cell.x, cell.y, cell.z), id);
        }
    }

    (map, resolver.into_unmapped())
}

/// Convert a standalone schematic file (`.litematic`/`.schem`/`.schematic`).
/// No ZIP, no region files, no chunk offsets; the schematic's own local
/// coordinates become the output coordinates directly.
pub fn convert_schematic(bytes: Vec<u8>, catalog: &Catalog, opts: &ConversionOptions) -> Result<ConversionReport> {
    let inflated = nbt::inflate(&bytes)?;
    let (_name, root) = nbt::parse(&inflated)?;
    let schematic = anvil::load_schematic(&root)?;

    let mut map = HashMap::new();
    let mut resolver = Resolver::new(catalog);

    for cell in &schematic.cells {
        if let Some(b) = opts.bounds {
            if !b.contains(cell.x, cell.y, cell.z) {
                continue;
            }
        }
        let id = resolver.resolve(&cell.name, (cell.x, cell.y, cell.z));
        map.insert((cell.x, cell.y, cell.z), id);
    }

    Ok(ConversionReport { block_map: map, unmapped: resolver.into_unmapped(), world_name: None })
}

fn merge_block_map(
    dest: &mut HashMap<(i32, i32, i32), u16>,
    src: HashMap<(i32, i32, i32), u16>,
) {
    for (coord, id) in src {
        // Last-writer-wins on a colliding coordinate; this should only
        // happen for genuinely malformed, overlapping region data.
        if let Some(prev) = dest.insert(coord, id) {
            if prev != id {
                log::warn!("coordinate {coord:?} written by more than one source (ids {prev} and {id}); keeping {id}");
            }
        }
    }
}

/// Build the output voxel-world JSON document: the subset of `blockTypes`
/// actually used, plus the sparse coordinate map with comma-joined
/// signed-decimal keys.
pub fn build_output_json(report: &ConversionReport, catalog: &Catalog) -> serde_json::Value {
    let used_ids: std::collections::HashSet<u16> = report.block_map.values().copied().collect();
    let block_types = catalog.subset(&used_ids);

    let mut blocks = serde_json::Map::with_capacity(report.block_map.len());
    for (&(x, y, z), &id) in &report.block_map {
        blocks.insert(format!("{x},{y},{z}"), serde_json::Value::from(id));
    }

    serde_json::json!({
        "blockTypes": block_types,
        "blocks": blocks,
    })
}

/// Build the result object returned to the caller: whether the conversion
/// succeeded, how many blocks it produced, and the unmapped log.
pub fn build_result_json(report: &ConversionReport) -> serde_json::Value {
    let unmapped = if report.unmapped.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::to_value(&report.unmapped).unwrap_or(serde_json::Value::Null)
    };

    serde_json::json!({
        "success": true,
        "block_count": report.block_count(),
        "unmapped": unmapped,
        "world_name": report.world_name,
    })
}

/// Build the result object for a fatal failure.
pub fn build_failure_json(error: &dyn std::fmt::Display) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> Catalog {
        Catalog::parse(
            r#"{
                "blockTypes": [{"id": 19, "name": "stone", "textureUri": "s.png"}],
                "blocks": {"minecraft:stone": {"id": 19, "hytopiaBlock": "stone", "textureUri": "s.png"}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn output_json_only_includes_used_block_types() {
        let mut report = ConversionReport::default();
        report.block_map.insert((0, 0, 0), 19);
        let catalog = test_catalog();

        let json = build_output_json(&report, &catalog);
        assert_eq!(json["blockTypes"].as_array().unwrap().len(), 1);
        assert_eq!(json["blocks"]["0,0,0"], 19);
    }

    #[test]
    fn result_json_reports_zero_blocks_as_success() {
        let report = ConversionReport::default();
        let json = build_result_json(&report);
        assert_eq!(json["success"], true);
        assert_eq!(json["block_count"], 0);
        assert!(json["unmapped"].is_null());
    }

    #[test]
    fn failure_json_has_no_block_count() {
        let json = build_failure_json(&"boom");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("block_count").is_none());
    }

    #[test]
    fn merge_block_map_is_last_writer_wins() {
        let mut dest = HashMap::new();
        dest.insert((0, 0, 0), 1);
        let mut src = HashMap::new();
        src.insert((0, 0, 0), 2);
        merge_block_map(&mut dest, src);
        assert_eq!(dest[&(0, 0, 0)], 2);
    }
}
