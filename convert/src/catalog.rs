//! The block-type catalog loader.
//!
//! Loads and validates the target voxel-world's block-type table (the only
//! ids the resolver is allowed to emit) and builds the two lookup tables
//! [`crate::resolve::Resolver`] needs: an exact source-name map and an
//! ordered substring fallback chain.
//!
//! Uses the same `serde_json`-based config loading style as the rest of
//! this workspace.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{ConvertError, Result};

/// One entry of the output `blockTypes` array: a target-catalog block with
/// a stable, unique id.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct BlockType {
    pub id: u16,
    pub name: String,
    #[serde(rename = "textureUri")]
    pub texture_uri: String,
}

/// One entry of the `blocks` map: an explicit `minecraft:name -> target`
/// mapping, carrying enough of the target's own metadata to regenerate a
/// `BlockType` row if the name is otherwise absent from `blockTypes`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockMapping {
    pub id: u16,
    #[serde(rename = "hytopiaBlock")]
    pub hytopia_block: String,
    #[serde(rename = "textureUri")]
    pub texture_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogDoc {
    #[serde(rename = "blockTypes")]
    block_types: Vec<BlockType>,
    #[serde(default)]
    blocks: HashMap<String, BlockMapping>,
}

/// The loaded, validated catalog: the full `blockTypes` table plus the
/// explicit source-name mapping. Read-only after construction and safe to
/// share across worker threads.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub block_types: Vec<BlockType>,
    pub mapping: HashMap<String, BlockMapping>,
}

/// The embedded default catalog, used when no `--mapping` path is given.
/// A small but real overworld block set, not a placeholder fixture.
pub const DEFAULT_CATALOG_JSON: &str = include_str!("../assets/default_catalog.json");

impl Catalog {
    /// Parse and validate a catalog document. Ids must be unique across
    /// `blockTypes`; a `blocks` entry referencing an id absent from
    /// `blockTypes` is accepted (the mapping is allowed to name ids the
    /// caller's terrain builder knows about even if this particular
    /// catalog snapshot doesn't enumerate them), but duplicate ids within
    /// `blockTypes` itself are rejected.
    pub fn parse(json: &str) -> Result<Catalog> {
        let doc: CatalogDoc = serde_json::from_str(json)
            .map_err(|e| ConvertError::CatalogMissing(format!("invalid catalog json: {e}")))?;

        if doc.block_types.is_empty() {
            return Err(ConvertError::CatalogMissing("blockTypes is empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for bt in &doc.block_types {
            if !seen.insert(bt.id) {
                return Err(ConvertError::CatalogDuplicateId(bt.id));
            }
        }

        Ok(Catalog { block_types: doc.block_types, mapping: doc.blocks })
    }

    /// Load the embedded default catalog.
    pub fn default_catalog() -> Catalog {
        Catalog::parse(DEFAULT_CATALOG_JSON).expect("embedded default catalog must be valid")
    }

    /// Look up a block type's id by name, if present in `blockTypes`.
    pub fn id_for_block_type_name(&self, name: &str) -> Option<u16> {
        self.block_types.iter().find(|bt| bt.name == name).map(|bt| bt.id)
    }

    /// The subset of `blockTypes` actually referenced by `used_ids`, in
    /// catalog order; this is what gets embedded in the output JSON's
    /// `blockTypes` array.
    pub fn subset(&self, used_ids: &std::collections::HashSet<u16>) -> Vec<BlockType> {
        self.block_types.iter().filter(|bt| used_ids.contains(&bt.id)).cloned().collect()
    }
}
