//! glTF 2.0 binary (GLB) output and accessor input.
//!
//! # Writing
//!
//! ```
//! use redlilium_meshpack::gltf::write_glb;
//! use redlilium_meshpack::math::Vec3;
//! use redlilium_meshpack::pack::pack_meshes;
//! use redlilium_meshpack::settings::PackSettings;
//! use redlilium_meshpack::source::{SourceMesh, SourcePrimitive};
//! use redlilium_meshpack::vertex::VertexPosition;
//!
//! let mut lines = SourcePrimitive::lines("wire");
//! lines.add_line(
//!     &VertexPosition::new(Vec3::zeros()),
//!     &VertexPosition::new(Vec3::x()),
//! );
//!
//! let settings = PackSettings::default();
//! let model = pack_meshes(&[SourceMesh::new().with_primitive(lines)], &settings).unwrap();
//! let glb = write_glb(&model, &settings).unwrap();
//! assert_eq!(&glb[0..4], b"glTF");
//! ```
//!
//! # Reading
//!
//! [`GltfReader`] resolves the document's buffers once and hands out
//! accessors that point into them, either as recorded meshes or one
//! accessor at a time.

mod reader;
mod writer;

pub use reader::{AccessorSource, GltfReader};
pub use writer::{GltfWriter, write_glb};
