//! Accessors binding a layout to a shared byte buffer.

use std::sync::Arc;

use crate::error::{PackError, PackResult};
use crate::math::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::array::{Element, EncodedArray, EncodedArrayMut, IndexArray, IndexArrayMut};
use super::info::MemoryAccessInfo;

/// A typed array over a byte buffer.
///
/// Several accessors may share one buffer (interleaved vertices, or many
/// primitives after buffer merging); the buffer is reference counted and
/// treated as read-only once shared. Mutable views detach the buffer first
/// (copy-on-write), so writes through one accessor never leak into another.
///
/// Accessors are either created bound to existing bytes ([`new`](Self::new))
/// or unbound ([`create`](Self::create)) and later given their bytes through
/// [`set_vertex_data_source`](Self::set_vertex_data_source) or
/// [`set_index_data_source`](Self::set_index_data_source).
#[derive(Debug, Clone)]
pub struct MemoryAccessor {
    data: Arc<Vec<u8>>,
    info: MemoryAccessInfo,
}

impl MemoryAccessor {
    /// Bind `info` to an existing buffer.
    pub fn new(data: Arc<Vec<u8>>, info: MemoryAccessInfo) -> Self {
        Self { data, info }
    }

    /// Bind `info` to an owned buffer.
    pub fn from_vec(data: Vec<u8>, info: MemoryAccessInfo) -> Self {
        Self::new(Arc::new(data), info)
    }

    /// Create an accessor with no bytes yet.
    pub fn create(info: MemoryAccessInfo) -> Self {
        Self::new(Arc::new(Vec::new()), info)
    }

    /// Whether the accessor has bytes for every element of its layout.
    pub fn is_bound(&self) -> bool {
        self.info.byte_end() <= self.data.len() as u64
    }

    /// Bind vertex data, finalizing offset, count and stride.
    pub fn set_vertex_data_source(
        &mut self,
        data: Arc<Vec<u8>>,
        byte_offset: u32,
        item_count: u32,
        byte_stride: u32,
    ) -> PackResult<()> {
        let mut info = self.info.clone();
        info.byte_offset = byte_offset;
        info.item_count = item_count;
        info.byte_stride = byte_stride;
        info.validate_vertex_attribute()?;
        self.bind(data, info)
    }

    /// Bind index data, finalizing offset and count. Indices are tightly packed.
    pub fn set_index_data_source(
        &mut self,
        data: Arc<Vec<u8>>,
        byte_offset: u32,
        item_count: u32,
    ) -> PackResult<()> {
        let mut info = self.info.clone();
        info.byte_offset = byte_offset;
        info.item_count = item_count;
        info.byte_stride = 0;
        info.validate_indexer()?;
        self.bind(data, info)
    }

    fn bind(&mut self, data: Arc<Vec<u8>>, info: MemoryAccessInfo) -> PackResult<()> {
        let end = info.byte_end();
        if end > data.len() as u64 {
            return Err(PackError::Bounds(format!(
                "{}: layout spans {end} bytes but the buffer has {}",
                info.name,
                data.len()
            )));
        }
        self.data = data;
        self.info = info;
        Ok(())
    }

    /// The layout.
    pub fn info(&self) -> &MemoryAccessInfo {
        &self.info
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Rename the accessor.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.info.name = name.into();
    }

    /// The whole backing buffer.
    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// The bytes covered by this accessor's elements.
    pub fn byte_range(&self) -> &[u8] {
        let len = self.data.len() as u64;
        let start = u64::from(self.info.byte_offset).min(len);
        let end = self.info.byte_end().min(len);
        &self.data[start as usize..end as usize]
    }

    /// Whether both accessors read from the same buffer allocation.
    pub fn shares_buffer(&self, other: &MemoryAccessor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// A new accessor over the same bytes with a replaced layout.
    pub fn with_info(&self, info: MemoryAccessInfo) -> Self {
        Self::new(Arc::clone(&self.data), info)
    }

    /// A new accessor over `count` elements starting at `start`.
    pub fn slice(&self, start: u32, count: u32) -> PackResult<Self> {
        Ok(self.with_info(self.info.slice(start, count)?))
    }

    /// Point the accessor into `data`, shifting its offset by `base`.
    pub(crate) fn relocate(&mut self, data: Arc<Vec<u8>>, base: u32) {
        self.data = data;
        self.info.byte_offset += base;
    }

    /// Read view with an arbitrary element type.
    pub fn as_array<T: Element>(&self) -> PackResult<EncodedArray<'_, T>> {
        EncodedArray::new(&self.data, &self.info)
    }

    /// Write view with an arbitrary element type.
    ///
    /// Detaches the buffer if it is shared with another accessor.
    pub fn as_array_mut<T: Element>(&mut self) -> PackResult<EncodedArrayMut<'_, T>> {
        let data = Arc::make_mut(&mut self.data);
        EncodedArrayMut::new(data.as_mut_slice(), &self.info)
    }

    /// Read the accessor as scalars.
    pub fn as_scalar_array(&self) -> PackResult<EncodedArray<'_, f32>> {
        self.as_array()
    }

    /// Read the accessor as 2D vectors.
    pub fn as_vector2_array(&self) -> PackResult<EncodedArray<'_, Vec2>> {
        self.as_array()
    }

    /// Read the accessor as 3D vectors.
    pub fn as_vector3_array(&self) -> PackResult<EncodedArray<'_, Vec3>> {
        self.as_array()
    }

    /// Read the accessor as 4D vectors.
    pub fn as_vector4_array(&self) -> PackResult<EncodedArray<'_, Vec4>> {
        self.as_array()
    }

    /// Read the accessor as `[x, y, z, w]` quaternions.
    pub fn as_quaternion_array(&self) -> PackResult<EncodedArray<'_, Quat>> {
        self.as_array()
    }

    /// Read the accessor as column-major 4x4 matrices.
    pub fn as_matrix4x4_array(&self) -> PackResult<EncodedArray<'_, Mat4>> {
        self.as_array()
    }

    /// Write view over scalars.
    pub fn as_scalar_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, f32>> {
        self.as_array_mut()
    }

    /// Write view over 2D vectors.
    pub fn as_vector2_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, Vec2>> {
        self.as_array_mut()
    }

    /// Write view over 3D vectors.
    pub fn as_vector3_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, Vec3>> {
        self.as_array_mut()
    }

    /// Write view over 4D vectors.
    pub fn as_vector4_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, Vec4>> {
        self.as_array_mut()
    }

    /// Write view over quaternions.
    pub fn as_quaternion_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, Quat>> {
        self.as_array_mut()
    }

    /// Write view over 4x4 matrices.
    pub fn as_matrix4x4_array_mut(&mut self) -> PackResult<EncodedArrayMut<'_, Mat4>> {
        self.as_array_mut()
    }

    /// Read the accessor as integer indices.
    pub fn as_index_array(&self) -> PackResult<IndexArray<'_>> {
        IndexArray::new(&self.data, &self.info)
    }

    /// Write view over integer indices.
    pub fn as_index_array_mut(&mut self) -> PackResult<IndexArrayMut<'_>> {
        let data = Arc::make_mut(&mut self.data);
        IndexArrayMut::new(data.as_mut_slice(), &self.info)
    }

    /// Per-component minimum and maximum over all elements.
    ///
    /// Returns empty vectors for an empty accessor.
    pub fn bounds(&self) -> PackResult<(Vec<f32>, Vec<f32>)> {
        let codec = self.info.codec()?;
        let n = self.info.dimensions.component_count() as usize;
        if self.info.item_count == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        if !self.is_bound() {
            return Err(PackError::Bounds(format!(
                "{}: accessor is not bound to enough bytes",
                self.info.name
            )));
        }

        let mut min = vec![f32::MAX; n];
        let mut max = vec![f32::MIN; n];
        let stride = self.info.step_byte_length() as usize;
        let width = codec.byte_width();

        for i in 0..self.info.item_count as usize {
            let base = self.info.byte_offset as usize + i * stride;
            for c in 0..n {
                let v = codec.decode(&self.data[base + c * width..]);
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }
        Ok((min, max))
    }
}
