//! Coalescing accessor buffers.
//!
//! After every mesh is packed, accessors describing the same attribute
//! identity are moved into one shared buffer:
//!
//! - all index accessors share one buffer,
//! - interleaved vertices share one buffer per [`RecordKey`],
//! - planar attributes and morph deltas share one buffer per
//!   `(attribute name, item byte length)`.
//!
//! Source buffers are appended in the order they are first seen, each at a
//! 4-byte aligned offset, and every accessor is redirected to the merged
//! buffer with its offset rebased. The pass is O(n) and deterministic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::accessor::MemoryAccessor;

use super::mesh::PackedMesh;
use super::primitive::{RecordKey, VertexLayout};

/// Which accessors may share a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BufferGroup {
    /// Index accessors.
    Indices,
    /// Interleaved vertex records of one record type.
    Interleaved(RecordKey),
    /// Planar attributes or morph deltas.
    Attribute { name: String, item_length: u32 },
}

/// Binding target of a buffer view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attributes.
    ArrayBuffer,
    /// Indices.
    ElementArrayBuffer,
}

/// One physical buffer produced by the merge pass.
#[derive(Debug, Clone)]
pub struct PackedBuffer {
    /// The bytes every accessor of the group reads from.
    pub data: Arc<Vec<u8>>,
    pub target: BufferTarget,
    /// Stride to declare on the buffer view; `None` for indices.
    pub byte_stride: Option<u32>,
    pub group: BufferGroup,
}

/// The physical buffers of a packed model.
#[derive(Debug, Clone, Default)]
pub struct MergedBuffers {
    buffers: Vec<PackedBuffer>,
}

impl MergedBuffers {
    pub fn buffers(&self) -> &[PackedBuffer] {
        &self.buffers
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Index of the buffer `accessor` reads from.
    pub fn buffer_index(&self, accessor: &MemoryAccessor) -> Option<usize> {
        self.buffers
            .iter()
            .position(|b| Arc::ptr_eq(&b.data, accessor.data()))
    }

    /// Sum of all buffer lengths.
    pub fn total_byte_length(&self) -> usize {
        self.buffers.iter().map(|b| b.data.len()).sum()
    }
}

#[derive(Default)]
struct GroupBuilder {
    sources: Vec<Arc<Vec<u8>>>,
    offsets: HashMap<*const Vec<u8>, u32>,
    length: u32,
}

impl GroupBuilder {
    fn append(&mut self, data: &Arc<Vec<u8>>) {
        let ptr = Arc::as_ptr(data);
        if self.offsets.contains_key(&ptr) {
            return;
        }
        let offset = self.length.next_multiple_of(4);
        self.offsets.insert(ptr, offset);
        self.length = offset + data.len() as u32;
        self.sources.push(Arc::clone(data));
    }

    fn build(&self) -> Arc<Vec<u8>> {
        let mut bytes = vec![0u8; self.length as usize];
        for source in &self.sources {
            let offset = self.offsets[&Arc::as_ptr(source)] as usize;
            bytes[offset..offset + source.len()].copy_from_slice(source);
        }
        Arc::new(bytes)
    }
}

/// Visit every accessor of `meshes` with its buffer group.
fn for_each_accessor<M>(
    meshes: &mut [PackedMesh<M>],
    mut f: impl FnMut(BufferGroup, &mut MemoryAccessor),
) {
    for mesh in meshes {
        for primitive in &mut mesh.primitives {
            for accessor in &mut primitive.vertex_accessors {
                let group = match &primitive.vertex_layout {
                    VertexLayout::Interleaved(key) => BufferGroup::Interleaved(key.clone()),
                    VertexLayout::Planar => attribute_group(accessor),
                };
                f(group, accessor);
            }
            if let Some(indices) = &mut primitive.index_accessor {
                f(BufferGroup::Indices, indices);
            }
            for target in &mut primitive.morph_targets {
                for accessor in target {
                    f(attribute_group(accessor), accessor);
                }
            }
        }
    }
}

fn attribute_group(accessor: &MemoryAccessor) -> BufferGroup {
    BufferGroup::Attribute {
        name: accessor.name().to_string(),
        item_length: accessor.info().byte_length(),
    }
}

/// Collect the buffers of `meshes`, coalescing them when `coalesce` is set.
///
/// Without coalescing every distinct source buffer becomes its own
/// [`PackedBuffer`]; accessors are left untouched.
pub fn merge_buffers<M>(meshes: &mut [PackedMesh<M>], coalesce: bool) -> MergedBuffers {
    crate::profile_function!();

    // Without coalescing, the source pointer is part of the key so no two
    // source buffers share a group.
    let mut order: Vec<(BufferGroup, usize)> = Vec::new();
    let mut groups: HashMap<(BufferGroup, usize), GroupBuilder> = HashMap::new();

    for_each_accessor(meshes, |group, accessor| {
        let split = if coalesce {
            0
        } else {
            Arc::as_ptr(accessor.data()) as usize
        };
        let key = (group, split);
        let builder = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            GroupBuilder::default()
        });
        builder.append(accessor.data());
    });

    let mut merged: HashMap<(BufferGroup, usize), Arc<Vec<u8>>> = HashMap::new();
    let mut buffers = Vec::with_capacity(order.len());
    for key in &order {
        let builder = &groups[key];
        let data = if builder.sources.len() == 1 {
            Arc::clone(&builder.sources[0])
        } else {
            builder.build()
        };
        log::trace!(
            "Merged {} source buffers into {} bytes for {:?}",
            builder.sources.len(),
            data.len(),
            key.0
        );
        crate::profile_plot!("merged buffer bytes", data.len() as f64);

        let (target, byte_stride) = match &key.0 {
            BufferGroup::Indices => (BufferTarget::ElementArrayBuffer, None),
            BufferGroup::Interleaved(record) => (BufferTarget::ArrayBuffer, Some(record.stride())),
            BufferGroup::Attribute { item_length, .. } => {
                (BufferTarget::ArrayBuffer, Some(*item_length))
            }
        };
        merged.insert(key.clone(), Arc::clone(&data));
        buffers.push(PackedBuffer {
            data,
            target,
            byte_stride,
            group: key.0.clone(),
        });
    }

    for_each_accessor(meshes, |group, accessor| {
        let split = if coalesce {
            0
        } else {
            Arc::as_ptr(accessor.data()) as usize
        };
        let key = (group, split);
        let (Some(builder), Some(data)) = (groups.get(&key), merged.get(&key)) else {
            return;
        };
        if Arc::ptr_eq(data, accessor.data()) {
            return;
        }
        let base = builder.offsets[&Arc::as_ptr(accessor.data())];
        accessor.relocate(Arc::clone(data), base);
    });

    log::debug!(
        "Merged accessors into {} buffers ({} bytes)",
        buffers.len(),
        buffers.iter().map(|b| b.data.len()).sum::<usize>()
    );
    MergedBuffers { buffers }
}
