//! Typed, strided views over encoded bytes.
//!
//! An element at `index` starts at `byte_offset + index * stride`; its
//! component `c` lives `c * component_width` bytes further and is decoded
//! through the layout's [`ComponentCodec`].

use std::marker::PhantomData;

use crate::encoding::{self, ComponentCodec, Dimensionality, EncodingKind};
use crate::error::{PackError, PackResult};
use crate::math::{self, Mat4, Quat, Vec2, Vec3, Vec4};

use super::info::MemoryAccessInfo;

/// A value type that a typed view can decode and encode.
pub trait Element: Copy {
    /// Shape of the element in the accessor layout.
    const DIMENSIONS: Dimensionality;

    /// Build the element from `DIMENSIONS.component_count()` components.
    fn from_components(c: &[f32]) -> Self;

    /// Write the element's components into `out`.
    fn to_components(&self, out: &mut [f32]);
}

impl Element for f32 {
    const DIMENSIONS: Dimensionality = Dimensionality::Scalar;

    fn from_components(c: &[f32]) -> Self {
        c[0]
    }

    fn to_components(&self, out: &mut [f32]) {
        out[0] = *self;
    }
}

impl Element for Vec2 {
    const DIMENSIONS: Dimensionality = Dimensionality::Vec2;

    fn from_components(c: &[f32]) -> Self {
        Vec2::new(c[0], c[1])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..2].copy_from_slice(self.as_slice());
    }
}

impl Element for Vec3 {
    const DIMENSIONS: Dimensionality = Dimensionality::Vec3;

    fn from_components(c: &[f32]) -> Self {
        Vec3::new(c[0], c[1], c[2])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..3].copy_from_slice(self.as_slice());
    }
}

impl Element for Vec4 {
    const DIMENSIONS: Dimensionality = Dimensionality::Vec4;

    fn from_components(c: &[f32]) -> Self {
        Vec4::new(c[0], c[1], c[2], c[3])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..4].copy_from_slice(self.as_slice());
    }
}

impl Element for Quat {
    const DIMENSIONS: Dimensionality = Dimensionality::Vec4;

    fn from_components(c: &[f32]) -> Self {
        math::quat_from_array([c[0], c[1], c[2], c[3]])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..4].copy_from_slice(&math::quat_to_array(*self));
    }
}

impl Element for Mat4 {
    const DIMENSIONS: Dimensionality = Dimensionality::Mat4;

    fn from_components(c: &[f32]) -> Self {
        Mat4::from_column_slice(&c[..16])
    }

    fn to_components(&self, out: &mut [f32]) {
        out[..16].copy_from_slice(self.as_slice());
    }
}

/// Resolved addressing shared by read and write views.
#[derive(Debug, Clone, Copy)]
struct Addressing {
    offset: usize,
    stride: usize,
    count: usize,
    codec: ComponentCodec,
}

impl Addressing {
    fn resolve(
        bytes_len: usize,
        info: &MemoryAccessInfo,
        dimensions: Dimensionality,
    ) -> PackResult<Self> {
        if info.dimensions != dimensions {
            return Err(PackError::InvalidLayout(format!(
                "{}: cannot view {:?} data as {:?}",
                info.name, info.dimensions, dimensions
            )));
        }
        let codec = info
            .codec()
            .map_err(|e| PackError::InvalidLayout(format!("{}: {e}", info.name)))?;
        if info.byte_stride > 0 && info.byte_stride < info.byte_length() {
            return Err(PackError::InvalidLayout(format!(
                "{}: stride {} is smaller than element size {}",
                info.name,
                info.byte_stride,
                info.byte_length()
            )));
        }
        check_range(bytes_len, info)?;
        Ok(Self {
            offset: info.byte_offset as usize,
            stride: info.step_byte_length() as usize,
            count: info.item_count as usize,
            codec,
        })
    }

    #[inline]
    fn element_start(&self, index: usize) -> usize {
        assert!(
            index < self.count,
            "index {index} out of range for accessor of {} items",
            self.count
        );
        self.offset + index * self.stride
    }
}

fn check_range(bytes_len: usize, info: &MemoryAccessInfo) -> PackResult<()> {
    let end = info.byte_end();
    if end > bytes_len as u64 {
        return Err(PackError::Bounds(format!(
            "{}: layout spans {end} bytes but only {bytes_len} are available",
            info.name
        )));
    }
    Ok(())
}

fn read_element<T: Element>(bytes: &[u8], at: usize, codec: &ComponentCodec) -> T {
    let n = T::DIMENSIONS.component_count() as usize;
    let width = codec.byte_width();
    let mut scratch = [0.0f32; 16];
    for (c, slot) in scratch[..n].iter_mut().enumerate() {
        *slot = codec.decode(&bytes[at + c * width..]);
    }
    T::from_components(&scratch[..n])
}

fn write_element<T: Element>(bytes: &mut [u8], at: usize, codec: &ComponentCodec, value: &T) {
    let n = T::DIMENSIONS.component_count() as usize;
    let width = codec.byte_width();
    let mut scratch = [0.0f32; 16];
    value.to_components(&mut scratch);
    for (c, component) in scratch[..n].iter().enumerate() {
        codec.encode(*component, &mut bytes[at + c * width..]);
    }
}

/// Read-only typed view over encoded bytes.
#[derive(Debug, Clone, Copy)]
pub struct EncodedArray<'a, T> {
    bytes: &'a [u8],
    addr: Addressing,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> EncodedArray<'a, T> {
    /// Create a view of `bytes` laid out as `info`.
    pub fn new(bytes: &'a [u8], info: &MemoryAccessInfo) -> PackResult<Self> {
        Ok(Self {
            bytes,
            addr: Addressing::resolve(bytes.len(), info, T::DIMENSIONS)?,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.addr.count
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.addr.count == 0
    }

    /// Decode the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> T {
        read_element(self.bytes, self.addr.element_start(index), &self.addr.codec)
    }

    /// Decode the element at `index`, or `None` when out of range.
    pub fn try_get(&self, index: usize) -> Option<T> {
        (index < self.addr.count).then(|| self.get(index))
    }

    /// Iterate over all elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.addr.count).map(move |i| self.get(i))
    }

    /// Decode every element into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

/// Writable typed view over encoded bytes.
#[derive(Debug)]
pub struct EncodedArrayMut<'a, T> {
    bytes: &'a mut [u8],
    addr: Addressing,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> EncodedArrayMut<'a, T> {
    /// Create a writable view of `bytes` laid out as `info`.
    ///
    /// Writes are only allowed through layouts that satisfy the vertex
    /// attribute rules.
    pub fn new(bytes: &'a mut [u8], info: &MemoryAccessInfo) -> PackResult<Self> {
        info.validate_vertex_attribute()?;
        let addr = Addressing::resolve(bytes.len(), info, T::DIMENSIONS)?;
        Ok(Self {
            bytes,
            addr,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.addr.count
    }

    /// Whether the view has no elements.
    pub fn is_empty(&self) -> bool {
        self.addr.count == 0
    }

    /// Decode the element at `index`.
    pub fn get(&self, index: usize) -> T {
        read_element(self.bytes, self.addr.element_start(index), &self.addr.codec)
    }

    /// Encode `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) {
        let at = self.addr.element_start(index);
        write_element(self.bytes, at, &self.addr.codec, &value);
    }

    /// Encode `values` starting at element 0.
    pub fn fill(&mut self, values: &[T]) -> PackResult<()> {
        if values.len() > self.addr.count {
            return Err(PackError::Bounds(format!(
                "{} values do not fit in an accessor of {} items",
                values.len(),
                self.addr.count
            )));
        }
        for (i, value) in values.iter().enumerate() {
            self.set(i, *value);
        }
        Ok(())
    }
}

/// Read-only view over an index array.
///
/// Indices are read as integers, never through `f32`.
#[derive(Debug, Clone, Copy)]
pub struct IndexArray<'a> {
    bytes: &'a [u8],
    offset: usize,
    stride: usize,
    count: usize,
    encoding: EncodingKind,
}

impl<'a> IndexArray<'a> {
    /// Create a view of `bytes` laid out as the index layout `info`.
    pub fn new(bytes: &'a [u8], info: &MemoryAccessInfo) -> PackResult<Self> {
        info.validate_indexer()?;
        check_range(bytes.len(), info)?;
        Ok(Self {
            bytes,
            offset: info.byte_offset as usize,
            stride: info.step_byte_length() as usize,
            count: info.item_count as usize,
            encoding: info.encoding,
        })
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the view has no indices.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Read the index at `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn get(&self, i: usize) -> u32 {
        assert!(i < self.count, "index {i} out of range ({})", self.count);
        encoding::read_unsigned(self.encoding, &self.bytes[self.offset + i * self.stride..])
    }

    /// Iterate over all indices in order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count).map(move |i| self.get(i))
    }

    /// Decode every index into a `Vec`.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

/// Writable view over an index array.
#[derive(Debug)]
pub struct IndexArrayMut<'a> {
    bytes: &'a mut [u8],
    offset: usize,
    stride: usize,
    count: usize,
    encoding: EncodingKind,
}

impl<'a> IndexArrayMut<'a> {
    /// Create a writable view of `bytes` laid out as the index layout `info`.
    pub fn new(bytes: &'a mut [u8], info: &MemoryAccessInfo) -> PackResult<Self> {
        info.validate_indexer()?;
        check_range(bytes.len(), info)?;
        Ok(Self {
            offset: info.byte_offset as usize,
            stride: info.step_byte_length() as usize,
            count: info.item_count as usize,
            encoding: info.encoding,
            bytes,
        })
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the view has no indices.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Write `value` at `i`, failing if the encoding cannot represent it.
    pub fn set(&mut self, i: usize, value: u32) -> PackResult<()> {
        if i >= self.count {
            return Err(PackError::Bounds(format!(
                "index slot {i} out of range ({})",
                self.count
            )));
        }
        let max = match self.encoding {
            EncodingKind::UInt8 => u8::MAX as u32,
            EncodingKind::UInt16 => u16::MAX as u32,
            _ => u32::MAX,
        };
        if value > max {
            return Err(PackError::Configuration(format!(
                "index {value} does not fit in {:?}",
                self.encoding
            )));
        }
        encoding::write_unsigned(
            self.encoding,
            value,
            &mut self.bytes[self.offset + i * self.stride..],
        );
        Ok(())
    }

    /// Write `values` starting at slot 0.
    pub fn fill(&mut self, values: &[u32]) -> PackResult<()> {
        for (i, &value) in values.iter().enumerate() {
            self.set(i, value)?;
        }
        Ok(())
    }
}
