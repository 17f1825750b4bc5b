//! Sparse accessors: a dense bottom layer with index-addressed overrides.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{PackError, PackResult};
use crate::math::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::array::{Element, EncodedArray};
use super::memory::MemoryAccessor;

/// A virtual dense array built from a dense `bottom` accessor, a list of
/// `keys` and a `top` accessor holding one replacement per key.
///
/// Reading logical index `i` yields `top[p]` when `keys[p] == i`, otherwise
/// `bottom[i]`.
#[derive(Debug, Clone)]
pub struct SparseOverlay {
    bottom: MemoryAccessor,
    keys: Vec<u32>,
    top: MemoryAccessor,
    /// `(key, position in top)` sorted by key.
    lookup: Vec<(u32, u32)>,
}

/// Build a [`SparseOverlay`], validating shapes and keys.
///
/// Fails with [`PackError::InvalidLayout`] when the layers differ in shape or
/// encoding, and with [`PackError::Bounds`] when the keys do not match the
/// top layer, outnumber the bottom layer, exceed it, or repeat.
pub fn create_sparse(
    bottom: MemoryAccessor,
    keys: Vec<u32>,
    top: MemoryAccessor,
) -> PackResult<SparseOverlay> {
    let (b, t) = (bottom.info(), top.info());
    if b.dimensions != t.dimensions {
        return Err(PackError::InvalidLayout(format!(
            "sparse layers differ in shape: {:?} vs {:?}",
            b.dimensions, t.dimensions
        )));
    }
    if b.encoding != t.encoding || b.normalized != t.normalized {
        return Err(PackError::InvalidLayout(format!(
            "sparse layers differ in encoding: {:?} vs {:?}",
            b.encoding, t.encoding
        )));
    }
    if keys.len() != t.item_count as usize {
        return Err(PackError::Bounds(format!(
            "{} sparse keys but {} sparse values",
            keys.len(),
            t.item_count
        )));
    }
    if keys.len() > b.item_count as usize {
        return Err(PackError::Bounds(format!(
            "{} sparse keys exceed the {} dense items",
            keys.len(),
            b.item_count
        )));
    }
    if let Some(&key) = keys.iter().find(|&&k| k >= b.item_count) {
        return Err(PackError::Bounds(format!(
            "sparse key {key} out of range for {} dense items",
            b.item_count
        )));
    }

    let mut lookup: Vec<(u32, u32)> = keys
        .iter()
        .enumerate()
        .map(|(p, &k)| (k, p as u32))
        .collect();
    lookup.sort_unstable_by_key(|&(k, _)| k);
    if let Some(w) = lookup.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(PackError::Bounds(format!("sparse key {} repeats", w[0].0)));
    }

    Ok(SparseOverlay {
        bottom,
        keys,
        top,
        lookup,
    })
}

impl SparseOverlay {
    /// The dense layer.
    pub fn bottom(&self) -> &MemoryAccessor {
        &self.bottom
    }

    /// The override keys, in top-layer order.
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// The override values.
    pub fn top(&self) -> &MemoryAccessor {
        &self.top
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.bottom.info().item_count as usize
    }

    /// Whether there are no logical elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position in the top layer overriding logical index `index`.
    pub fn override_position(&self, index: u32) -> Option<usize> {
        self.lookup
            .binary_search_by_key(&index, |&(k, _)| k)
            .ok()
            .map(|i| self.lookup[i].1 as usize)
    }

    /// Read view with an arbitrary element type.
    pub fn as_array<T: Element>(&self) -> PackResult<SparseArray<'_, T>> {
        Ok(SparseArray {
            overlay: self,
            bottom: self.bottom.as_array()?,
            top: self.top.as_array()?,
            _marker: PhantomData,
        })
    }

    /// Read the overlay as scalars.
    pub fn as_scalar_array(&self) -> PackResult<SparseArray<'_, f32>> {
        self.as_array()
    }

    /// Read the overlay as 2D vectors.
    pub fn as_vector2_array(&self) -> PackResult<SparseArray<'_, Vec2>> {
        self.as_array()
    }

    /// Read the overlay as 3D vectors.
    pub fn as_vector3_array(&self) -> PackResult<SparseArray<'_, Vec3>> {
        self.as_array()
    }

    /// Read the overlay as 4D vectors.
    pub fn as_vector4_array(&self) -> PackResult<SparseArray<'_, Vec4>> {
        self.as_array()
    }

    /// Read the overlay as quaternions.
    pub fn as_quaternion_array(&self) -> PackResult<SparseArray<'_, Quat>> {
        self.as_array()
    }

    /// Read the overlay as 4x4 matrices.
    pub fn as_matrix4x4_array(&self) -> PackResult<SparseArray<'_, Mat4>> {
        self.as_array()
    }

    /// Materialize the overlay into a dense, tightly packed accessor with the
    /// bottom layer's name and encoding.
    pub fn to_dense(&self) -> PackResult<MemoryAccessor> {
        let b = self.bottom.info();
        let mut info = b.clone();
        info.byte_offset = 0;
        info.byte_stride = 0;

        let mut data = Vec::with_capacity(info.padded_byte_length() as usize);
        let len = b.byte_length() as usize;
        let bottom_step = b.step_byte_length() as usize;
        let top_step = self.top.info().step_byte_length() as usize;
        let bottom_bytes = self.bottom.data();
        let top_bytes = self.top.data();

        for i in 0..b.item_count {
            let (bytes, start) = match self.override_position(i) {
                Some(p) => (top_bytes, self.top.info().byte_offset as usize + p * top_step),
                None => (bottom_bytes, b.byte_offset as usize + i as usize * bottom_step),
            };
            let element = bytes.get(start..start + len).ok_or_else(|| {
                PackError::Bounds(format!("{}: element {i} lies outside its buffer", b.name))
            })?;
            data.extend_from_slice(element);
        }

        Ok(MemoryAccessor::new(Arc::new(data), info))
    }
}

/// Typed read view over a [`SparseOverlay`].
#[derive(Debug, Clone, Copy)]
pub struct SparseArray<'a, T> {
    overlay: &'a SparseOverlay,
    bottom: EncodedArray<'a, T>,
    top: EncodedArray<'a, T>,
    _marker: PhantomData<T>,
}

impl<'a, T: Element> SparseArray<'a, T> {
    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.bottom.len()
    }

    /// Whether there are no logical elements.
    pub fn is_empty(&self) -> bool {
        self.bottom.is_empty()
    }

    /// Resolve logical index `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn get(&self, index: usize) -> T {
        match self.overlay.override_position(index as u32) {
            Some(p) => self.top.get(p),
            None => self.bottom.get(index),
        }
    }

    /// Iterate over all logical elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Decode every logical element into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}
