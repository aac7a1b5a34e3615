//! Minecraft Anvil region files, chunk/section decoding, and schematic
//! formats, built on top of the `nbt` crate.
//!
//! Provides the packed long-array codec ([`packed`]), the region file
//! container ([`region`]), the chunk/section walker ([`chunk`]), and the
//! schematic front-end ([`schematic`]). [`legacy`] backs the pre-1.13
//! numeric block id fallback used by both [`chunk`] and [`schematic`].

pub mod chunk;
pub mod error;
pub mod legacy;
pub mod packed;
pub mod region;
pub mod schematic;

pub use chunk::{walk_chunk, walk_chunk_cancellable, Cell};
pub use error::{Error, Result};
pub use packed::{bits_per_value, Layout};
pub use region::{parse_region_filename, Aabb, Region};
pub use schematic::{load_schematic, Schematic};
