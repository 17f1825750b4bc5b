//! Typed accessor codec.
//!
//! This module interprets raw byte ranges as arrays of scalars, vectors,
//! quaternions or matrices:
//!
//! - [`MemoryAccessInfo`] - Layout descriptor (name, offset, count, stride,
//!   shape, encoding, normalization)
//! - [`MemoryAccessor`] - A layout bound to a shared byte buffer
//! - [`EncodedArray`] / [`EncodedArrayMut`] - Typed, strided element views
//! - [`IndexArray`] / [`IndexArrayMut`] - Integer views for index buffers
//! - [`SparseOverlay`] - Dense base plus index-addressed overrides
//!
//! # Example
//!
//! ```
//! use redlilium_meshpack::accessor::{set_interleaved_info, MemoryAccessInfo, MemoryAccessor};
//! use redlilium_meshpack::math::Vec3;
//! use std::sync::Arc;
//!
//! let mut attrs = vec![
//!     MemoryAccessInfo::create("POSITION").unwrap(),
//!     MemoryAccessInfo::create("NORMAL").unwrap(),
//! ];
//! let stride = set_interleaved_info(&mut attrs, 0, 3);
//! assert_eq!(stride, 24);
//!
//! let mut positions = MemoryAccessor::from_vec(vec![0u8; 72], attrs[0].clone());
//! positions
//!     .as_vector3_array_mut()
//!     .unwrap()
//!     .set(2, Vec3::new(1.0, 2.0, 3.0));
//! assert_eq!(positions.as_vector3_array().unwrap().get(2).z, 3.0);
//! ```

mod array;
mod info;
mod memory;
mod sparse;

pub use array::{Element, EncodedArray, EncodedArrayMut, IndexArray, IndexArrayMut};
pub use info::{
    INDEX_ATTRIBUTE, MAX_BYTE_STRIDE, MemoryAccessInfo, set_interleaved_info, set_planar_info,
};
pub use memory::MemoryAccessor;
pub use sparse::{SparseArray, SparseOverlay, create_sparse};

pub(crate) use info::attribute_set;
