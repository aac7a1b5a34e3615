//! Converts a Minecraft Java Edition save (ZIP) or standalone schematic
//! file into a target voxel-world JSON document: a palette of block types
//! plus a sparse `(x,y,z) -> id` map.
//!
//! This crate wires together the `nbt` and `anvil` read-path crates with
//! the pieces that sit above them: the block-name resolver ([`resolve`]),
//! the ZIP archive front-end ([`archive`]), the catalog loader
//! ([`catalog`]), and the conversion driver ([`convert`]). [`main`] (the
//! `convert` binary) adds CLI parsing and logging setup on top.

pub mod archive;
pub mod catalog;
pub mod convert;
pub mod error;
pub mod resolve;

pub use catalog::Catalog;
pub use convert::{
    build_failure_json, build_output_json, build_result_json, convert_archive, convert_schematic,
    CancellationToken, ConversionOptions, ConversionReport,
};
pub use error::{ConvertError, Result};

/// Input formats this crate's driver recognises by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    ZipArchive,
    Schematic,
}

/// Detect an input format from its filename extension.
/// Returns `None` for anything else, which the caller should treat as
/// exit code 4 ("unsupported format").
pub fn detect_input_format(path: &std::path::Path) -> Option<InputFormat> {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
        Some(ext) if ext == "zip" => Some(InputFormat::ZipArchive),
        Some(ext) if ext == "litematic" || ext == "schem" || ext == "schematic" => Some(InputFormat::Schematic),
        _ => None,
    }
}
