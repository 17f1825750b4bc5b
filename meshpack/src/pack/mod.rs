//! Packing source meshes into accessors and shared buffers.
//!
//! The pipeline runs in two phases:
//!
//! 1. [`pack_mesh`] turns each [`SourceMesh`] into a [`PackedMesh`]. Meshes
//!    are independent in this phase; each owns its accessors and buffers.
//! 2. [`merge_buffers`] runs once over all packed meshes and coalesces their
//!    buffers. It is the barrier between packing and serialization; after it
//!    every buffer is read-only.
//!
//! [`pack_meshes`] runs both phases.
//!
//! ```
//! use redlilium_meshpack::math::Vec3;
//! use redlilium_meshpack::pack::pack_meshes;
//! use redlilium_meshpack::settings::PackSettings;
//! use redlilium_meshpack::source::{SourceMesh, SourcePrimitive};
//! use redlilium_meshpack::vertex::VertexPositionNormal;
//!
//! let v = |x: f32, y: f32| VertexPositionNormal::new(Vec3::new(x, y, 0.0), Vec3::z());
//! let mut triangle = SourcePrimitive::triangles("default");
//! triangle.add_triangle(&v(0.0, 0.0), &v(1.0, 0.0), &v(0.0, 1.0));
//!
//! let model = pack_meshes(&[SourceMesh::new().with_primitive(triangle)], &PackSettings::default())
//!     .unwrap();
//! assert_eq!(model.buffers.len(), 2);
//! ```

mod merge;
mod mesh;
mod primitive;

pub use merge::{BufferGroup, BufferTarget, MergedBuffers, PackedBuffer, merge_buffers};
pub use mesh::{PackedMesh, pack_mesh};
pub use primitive::{MORPH_DELTA_SUFFIX, PackedPrimitive, RecordKey, VertexLayout};

use crate::error::PackResult;
use crate::settings::PackSettings;
use crate::source::{PackVertex, SourceMesh};

/// Packed meshes and the buffers their accessors read from.
#[derive(Debug, Clone)]
pub struct PackedModel<M> {
    pub meshes: Vec<PackedMesh<M>>,
    pub buffers: MergedBuffers,
}

/// Pack every mesh, then merge their buffers.
///
/// Fails on the first mesh that cannot be packed.
pub fn pack_meshes<M: Clone, V: PackVertex>(
    meshes: &[SourceMesh<M, V>],
    settings: &PackSettings,
) -> PackResult<PackedModel<M>> {
    crate::profile_function!();

    let mut packed = meshes
        .iter()
        .enumerate()
        .map(|(i, mesh)| pack_mesh(i, mesh, settings))
        .collect::<PackResult<Vec<_>>>()?;

    let buffers = merge_buffers(&mut packed, settings.merge_buffers);
    Ok(PackedModel {
        meshes: packed,
        buffers,
    })
}
