//! The block-name resolver.
//!
//! Maps a Minecraft block-state name (e.g.
//! `minecraft:oak_stairs[facing=east,half=bottom]`) to a target-catalog
//! id, in four steps: exact match, state-stripped match, ordered substring
//! fallback, default id. Pure and allocation-light; the only mutation is
//! recording unmapped names for the caller's final report.
//!
//! Follows `fastanvil::java::Block::encoded_description`'s bracket-stripping
//! approach, generalized into a standalone function with no property-string
//! construction.

use std::collections::HashMap;

use crate::catalog::Catalog;

/// Category substrings tried, in order, against the lowercased,
/// namespace-stripped stem when an exact/state-stripped lookup misses.
/// First match wins, so the ordering is deterministic regardless of which
/// way a `HashMap` would have iterated. Matched against the catalog's own
/// `blockTypes` names at [`Resolver::new`] time; a category whose target
/// name isn't present in the loaded catalog is skipped.
const FALLBACK_CATEGORIES: &[(&str, &str)] = &[
    ("leaves", "leaves"),
    ("log", "wood"),
    ("planks", "wood"),
    ("wood", "wood"),
    ("stairs", "stone"),
    ("slab", "stone"),
    ("wall", "stone"),
    ("fence", "wood"),
    ("door", "wood"),
    ("ore", "stone"),
    ("stone", "stone"),
    ("dirt", "dirt"),
    ("grass", "grass"),
    ("sand", "sand"),
    ("gravel", "gravel"),
    ("glass", "glass"),
    ("wool", "wool"),
    ("water", "water"),
    ("lava", "lava"),
    ("ice", "ice"),
];

/// One unmapped source name's accumulated report, as it will be embedded
/// in the final `unmapped` result object.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnmappedEntry {
    pub count: u64,
    pub positions: Vec<(i32, i32, i32)>,
    #[serde(rename = "fallback_id")]
    pub fallback_id: u16,
}

const MAX_SAMPLE_POSITIONS: usize = 5;

/// Resolves source block names against a loaded [`Catalog`], recording
/// every non-exact match in its unmapped log.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    fallback_chain: Vec<(&'static str, u16)>,
    default_id: u16,
    unmapped: HashMap<String, UnmappedEntry>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Resolver<'a> {
        let fallback_chain = FALLBACK_CATEGORIES
            .iter()
            .filter_map(|&(substr, type_name)| {
                catalog.id_for_block_type_name(type_name).map(|id| (substr, id))
            })
            .collect();

        let default_id = catalog.block_types[0].id;

        Resolver { catalog, fallback_chain, default_id, unmapped: HashMap::new() }
    }

    /// Resolve `source_name` (possibly carrying `[prop=value,...]` block
    /// state) to a target id, recording the position for later reporting
    /// if this wasn't an exact match.
    pub fn resolve(&mut self, source_name: &str, pos: (i32, i32, i32)) -> u16 {
        if let Some(mapping) = self.catalog.mapping.get(source_name) {
            return mapping.id;
        }

        let stem = source_name.split('[').next().unwrap_or(source_name);
        if stem != source_name {
            if let Some(mapping) = self.catalog.mapping.get(stem) {
                return mapping.id;
            }
        }

        let normalized = stem.strip_prefix("minecraft:").unwrap_or(stem).to_lowercase();
        for &(substr, id) in &self.fallback_chain {
            if normalized.contains(substr) {
                self.record_unmapped(source_name, pos, id);
                return id;
            }
        }

        self.record_unmapped(source_name, pos, self.default_id);
        self.default_id
    }

    fn record_unmapped(&mut self, source_name: &str, pos: (i32, i32, i32), fallback_id: u16) {
        let entry = self.unmapped.entry(source_name.to_string()).or_insert_with(|| UnmappedEntry {
            count: 0,
            positions: Vec::new(),
            fallback_id,
        });
        entry.count += 1;
        if entry.positions.len() < MAX_SAMPLE_POSITIONS {
            entry.positions.push(pos);
        }
    }

    /// Consume the resolver, returning its accumulated unmapped-block log.
    pub fn into_unmapped(self) -> HashMap<String, UnmappedEntry> {
        self.unmapped
    }

    /// Merge another worker's unmapped log into this one, once all workers
    /// finish. Counts add; sample positions are capped again at
    /// [`MAX_SAMPLE_POSITIONS`] total.
    pub fn merge_unmapped(dest: &mut HashMap<String, UnmappedEntry>, src: HashMap<String, UnmappedEntry>) {
        for (name, entry) in src {
            let existing = dest.entry(name).or_insert_with(|| UnmappedEntry {
                count: 0,
                positions: Vec::new(),
                fallback_id: entry.fallback_id,
            });
            existing.count += entry.count;
            for pos in entry.positions {
                if existing.positions.len() >= MAX_SAMPLE_POSITIONS {
                    break;
                }
                existing.positions.push(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> Catalog {
        Catalog::parse(
            r#"{
                "blockTypes": [
                    {"id": 1, "name": "stone", "textureUri": "s.png"},
                    {"id": 2, "name": "leaves", "textureUri": "l.png"}
                ],
                "blocks": {
                    "minecraft:oak_stairs": {"id": 42, "hytopiaBlock": "stairs", "textureUri": "x.png"}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn exact_match_has_no_unmapped_entry() {
        let catalog = test_catalog();
        let mut r = Resolver::new(&catalog);
        let id = r.resolve("minecraft:oak_stairs", (0, 0, 0));
        assert_eq!(id, 42);
        assert!(r.into_unmapped().is_empty());
    }

    #[test]
    fn strips_block_state_before_lookup() {
        let catalog = test_catalog();
        let mut r = Resolver::new(&catalog);
        let id = r.resolve("minecraft:oak_stairs[facing=east,half=bottom]", (1, 2, 3));
        assert_eq!(id, 42);
        assert!(r.into_unmapped().is_empty());
    }

    #[test]
    fn unknown_block_falls_back_to_category() {
        let catalog = test_catalog();
        let mut r = Resolver::new(&catalog);
        let id = r.resolve("minecraft:cherry_leaves", (1, 2, 3));
        assert_eq!(id, 2);
        let unmapped = r.into_unmapped();
        assert_eq!(unmapped["minecraft:cherry_leaves"].fallback_id, 2);
    }

    #[test]
    fn completely_unknown_block_uses_default_id() {
        let catalog = test_catalog();
        let mut r = Resolver::new(&catalog);
        let id = r.resolve("minecraft:some_modded_block", (0, 0, 0));
        assert_eq!(id, catalog.block_types[0].id);
    }

    #[test]
    fn sample_positions_are_capped_at_five() {
        let catalog = test_catalog();
        let mut r = Resolver::new(&catalog);
        for i in 0..10 {
            r.resolve("minecraft:modded_thing", (i, 0, 0));
        }
        let unmapped = r.into_unmapped();
        let entry = &unmapped["minecraft:modded_thing"];
        assert_eq!(entry.count, 10);
        assert_eq!(entry.positions.len(), 5);
    }

    #[test]
    fn merge_adds_counts_and_caps_positions() {
        let mut a = HashMap::new();
        a.insert(
            "minecraft:x".to_string(),
            UnmappedEntry { count: 3, positions: vec![(0, 0, 0), (1, 1, 1)], fallback_id: 9 },
        );
        let mut b = HashMap::new();
        b.insert(
            "minecraft:x".to_string(),
            UnmappedEntry { count: 4, positions: vec![(2, 2, 2), (3, 3, 3), (4, 4, 4), (5, 5, 5)], fallback_id: 9 },
        );
        Resolver::merge_unmapped(&mut a, b);
        assert_eq!(a["minecraft:x"].count, 7);
        assert_eq!(a["minecraft:x"].positions.len(), 5);
    }
}
