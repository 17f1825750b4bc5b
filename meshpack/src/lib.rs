//! # RedLilium Engine Mesh Packing
//!
//! Turns in-memory meshes into compact glTF accessors:
//!
//! - [`accessor`] - Typed views over encoded, strided byte buffers
//! - [`weld`] - Insertion-ordered sets used to deduplicate vertices
//! - [`source`] - Welded source primitives and meshes
//! - [`pack`] - Per-mesh packing and the buffer merge pass
//! - [`gltf`] - GLB writer and accessor reader (feature `gltf`)

pub mod accessor;
pub mod encoding;
pub mod error;
#[cfg(feature = "gltf")]
pub mod gltf;
pub mod math;
pub mod pack;
pub mod profiling;
pub mod settings;
pub mod source;
pub mod target;
pub mod vertex;
pub mod weld;

pub use error::{PackError, PackResult};

/// Mesh packing library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
