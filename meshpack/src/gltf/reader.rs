//! Reading glTF accessors back into [`MemoryAccessor`]s.
//!
//! Buffers are resolved once and shared, so every accessor read from a
//! document points into the same `Arc` allocation as its neighbours.

use std::sync::Arc;

use crate::accessor::{
    INDEX_ATTRIBUTE, MemoryAccessInfo, MemoryAccessor, SparseOverlay, create_sparse,
};
use crate::encoding::{Dimensionality, EncodingKind};
use crate::error::{PackError, PackResult};
use crate::target::{MeshTarget, PrimitiveMode, RecordedMesh};

/// A glTF accessor as stored in the document.
#[derive(Debug, Clone)]
pub enum AccessorSource {
    /// Elements read straight from a buffer view.
    Dense(MemoryAccessor),
    /// A dense base with sparse overrides.
    Sparse(SparseOverlay),
}

impl AccessorSource {
    /// Resolve to a dense accessor, applying sparse overrides.
    pub fn into_dense(self) -> PackResult<MemoryAccessor> {
        match self {
            Self::Dense(accessor) => Ok(accessor),
            Self::Sparse(overlay) => overlay.to_dense(),
        }
    }
}

/// A parsed glTF document with its buffers resolved.
pub struct GltfReader {
    document: gltf_dep::Document,
    buffers: Vec<Arc<Vec<u8>>>,
}

impl GltfReader {
    /// Parse a `.glb` (or embedded-buffer-free `.gltf`) file.
    pub fn from_slice(data: &[u8]) -> PackResult<Self> {
        crate::profile_function!();
        let gltf = gltf_dep::Gltf::from_slice(data)?;
        let blob = gltf.blob.clone();
        let buffers = resolve_buffers(&gltf.document, blob)?;
        log::debug!(
            "Loaded glTF document: {} meshes, {} accessors, {} buffers",
            gltf.document.meshes().len(),
            gltf.document.accessors().len(),
            buffers.len()
        );
        Ok(Self {
            document: gltf.document,
            buffers,
        })
    }

    pub fn document(&self) -> &gltf_dep::Document {
        &self.document
    }

    pub fn buffers(&self) -> &[Arc<Vec<u8>>] {
        &self.buffers
    }

    /// Read accessor `index`, naming it `name`.
    pub fn read_accessor(&self, index: usize, name: &str) -> PackResult<AccessorSource> {
        let accessor = self.document.accessors().nth(index).ok_or_else(|| {
            PackError::Bounds(format!("accessor {index} out of range"))
        })?;
        self.read(&accessor, name)
    }

    /// Read every primitive of mesh `index` into a [`RecordedMesh`].
    ///
    /// Materials are reported by document index. Sparse accessors are
    /// resolved to dense ones.
    pub fn read_mesh(&self, index: usize) -> PackResult<RecordedMesh<Option<usize>>> {
        crate::profile_function!();
        let mesh = self
            .document
            .meshes()
            .nth(index)
            .ok_or_else(|| PackError::Bounds(format!("mesh {index} out of range")))?;

        let mut recorded = RecordedMesh::new();
        for primitive in mesh.primitives() {
            let p = recorded.add_primitive(primitive.material().index())?;

            for (semantic, accessor) in primitive.attributes() {
                let name = semantic_name(&semantic);
                let accessor = self.read(&accessor, &name)?.into_dense()?;
                recorded.with_vertex_accessor(p, &name, &accessor)?;
            }

            let mode = map_mode(primitive.mode())?;
            let indices = match primitive.indices() {
                Some(accessor) => Some(self.read(&accessor, INDEX_ATTRIBUTE)?.into_dense()?),
                None => None,
            };
            recorded.with_indices_accessor(p, mode, indices.as_ref())?;

            for (t, target) in primitive.morph_targets().enumerate() {
                let mut deltas = Vec::new();
                for (name, accessor) in [
                    ("POSITION", target.positions()),
                    ("NORMAL", target.normals()),
                    ("TANGENT", target.tangents()),
                ] {
                    if let Some(accessor) = accessor {
                        deltas.push(self.read(&accessor, name)?.into_dense()?);
                    }
                }
                recorded.with_morph_target_accessors(p, t, &deltas)?;
            }
        }
        Ok(recorded)
    }

    fn read(&self, accessor: &gltf_dep::Accessor, name: &str) -> PackResult<AccessorSource> {
        let mut info = MemoryAccessInfo::new(
            name,
            map_dimensions(accessor.dimensions()),
            map_data_type(accessor.data_type()),
            accessor.normalized(),
        );
        info.item_count = file_u32(accessor.count(), name, "count")?;

        let bottom = match accessor.view() {
            Some(view) => {
                info.byte_offset = file_offset(view.offset(), accessor.offset(), name)?;
                info.byte_stride = file_u32(view.stride().unwrap_or(0), name, "stride")?;
                self.bind(view.buffer().index(), info.clone())?
            }
            // No view: the base layer is all zeros.
            None => {
                let len = usize::try_from(info.padded_byte_length()).map_err(|_| {
                    PackError::Bounds(format!("{name}: zero-filled layer is too large"))
                })?;
                MemoryAccessor::from_vec(vec![0u8; len], info.clone())
            }
        };

        let Some(sparse) = accessor.sparse() else {
            return Ok(AccessorSource::Dense(bottom));
        };

        let count = file_u32(sparse.count(), name, "sparse count")?;
        let indices = sparse.indices();
        let index_encoding = match indices.index_type() {
            gltf_dep::accessor::sparse::IndexType::U8 => EncodingKind::UInt8,
            gltf_dep::accessor::sparse::IndexType::U16 => EncodingKind::UInt16,
            gltf_dep::accessor::sparse::IndexType::U32 => EncodingKind::UInt32,
        };
        let mut key_info = MemoryAccessInfo::index(index_encoding);
        key_info.byte_offset = file_offset(indices.view().offset(), indices.offset(), name)?;
        key_info.item_count = count;
        let keys = self
            .bind(indices.view().buffer().index(), key_info)?
            .as_index_array()?
            .to_vec();

        let values = sparse.values();
        let mut top_info = info;
        top_info.byte_offset = file_offset(values.view().offset(), values.offset(), name)?;
        top_info.item_count = count;
        top_info.byte_stride = 0;
        let top = self.bind(values.view().buffer().index(), top_info)?;

        Ok(AccessorSource::Sparse(create_sparse(bottom, keys, top)?))
    }

    fn bind(&self, buffer: usize, info: MemoryAccessInfo) -> PackResult<MemoryAccessor> {
        let data = self
            .buffers
            .get(buffer)
            .ok_or_else(|| PackError::Bounds(format!("buffer index {buffer} out of range")))?;
        let accessor = MemoryAccessor::new(Arc::clone(data), info);
        if !accessor.is_bound() {
            return Err(PackError::Bounds(format!(
                "{}: accessor spans past the end of buffer {buffer}",
                accessor.name()
            )));
        }
        Ok(accessor)
    }
}

/// A count or stride read from the file, rejected past `u32::MAX`.
fn file_u32(value: usize, name: &str, what: &str) -> PackResult<u32> {
    u32::try_from(value)
        .map_err(|_| PackError::Bounds(format!("{name}: {what} {value} exceeds the 32-bit range")))
}

/// View offset plus accessor offset, rejected on overflow.
fn file_offset(view_offset: usize, accessor_offset: usize, name: &str) -> PackResult<u32> {
    view_offset
        .checked_add(accessor_offset)
        .and_then(|offset| u32::try_from(offset).ok())
        .ok_or_else(|| {
            PackError::Bounds(format!(
                "{name}: byte offset {view_offset} + {accessor_offset} exceeds the 32-bit range"
            ))
        })
}

/// Collect the bytes of every buffer in `document`.
///
/// Only the GLB binary chunk is supported as a buffer source.
fn resolve_buffers(
    document: &gltf_dep::Document,
    blob: Option<Vec<u8>>,
) -> PackResult<Vec<Arc<Vec<u8>>>> {
    let blob = blob.map(Arc::new);
    let mut buffers = Vec::new();

    for buffer in document.buffers() {
        match buffer.source() {
            gltf_dep::buffer::Source::Bin => {
                let data = blob.as_ref().ok_or_else(|| {
                    PackError::Bounds("binary buffer referenced but no blob present".into())
                })?;
                buffers.push(Arc::clone(data));
            }
            gltf_dep::buffer::Source::Uri(uri) => {
                return Err(PackError::Configuration(format!(
                    "external buffer URIs not supported: {uri}"
                )));
            }
        }
    }

    Ok(buffers)
}

fn semantic_name(semantic: &gltf_dep::Semantic) -> String {
    match semantic {
        gltf_dep::Semantic::Positions => "POSITION".into(),
        gltf_dep::Semantic::Normals => "NORMAL".into(),
        gltf_dep::Semantic::Tangents => "TANGENT".into(),
        gltf_dep::Semantic::Colors(set) => format!("COLOR_{set}"),
        gltf_dep::Semantic::TexCoords(set) => format!("TEXCOORD_{set}"),
        gltf_dep::Semantic::Joints(set) => format!("JOINTS_{set}"),
        gltf_dep::Semantic::Weights(set) => format!("WEIGHTS_{set}"),
    }
}

fn map_mode(mode: gltf_dep::mesh::Mode) -> PackResult<PrimitiveMode> {
    match mode {
        gltf_dep::mesh::Mode::Points => Ok(PrimitiveMode::Points),
        gltf_dep::mesh::Mode::Lines => Ok(PrimitiveMode::Lines),
        gltf_dep::mesh::Mode::Triangles => Ok(PrimitiveMode::Triangles),
        other => Err(PackError::Configuration(format!(
            "primitive mode {other:?} is not supported"
        ))),
    }
}

fn map_data_type(data_type: gltf_dep::accessor::DataType) -> EncodingKind {
    match data_type {
        gltf_dep::accessor::DataType::I8 => EncodingKind::Int8,
        gltf_dep::accessor::DataType::U8 => EncodingKind::UInt8,
        gltf_dep::accessor::DataType::I16 => EncodingKind::Int16,
        gltf_dep::accessor::DataType::U16 => EncodingKind::UInt16,
        gltf_dep::accessor::DataType::U32 => EncodingKind::UInt32,
        gltf_dep::accessor::DataType::F32 => EncodingKind::Float32,
    }
}

fn map_dimensions(dimensions: gltf_dep::accessor::Dimensions) -> Dimensionality {
    match dimensions {
        gltf_dep::accessor::Dimensions::Scalar => Dimensionality::Scalar,
        gltf_dep::accessor::Dimensions::Vec2 => Dimensionality::Vec2,
        gltf_dep::accessor::Dimensions::Vec3 => Dimensionality::Vec3,
        gltf_dep::accessor::Dimensions::Vec4 => Dimensionality::Vec4,
        gltf_dep::accessor::Dimensions::Mat2 => Dimensionality::Mat2,
        gltf_dep::accessor::Dimensions::Mat3 => Dimensionality::Mat3,
        gltf_dep::accessor::Dimensions::Mat4 => Dimensionality::Mat4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf::write_glb;
    use crate::math::Vec3;
    use crate::pack::pack_meshes;
    use crate::settings::PackSettings;
    use crate::source::{SourceMesh, SourcePrimitive};
    use crate::vertex::VertexPositionNormal;

    fn quad_glb(settings: &PackSettings) -> Vec<u8> {
        let v = |x: f32, y: f32| VertexPositionNormal::new(Vec3::new(x, y, 0.0), Vec3::z());
        let mut prim = SourcePrimitive::triangles("default");
        prim.add_triangle(&v(0.0, 0.0), &v(1.0, 0.0), &v(1.0, 1.0));
        prim.add_triangle(&v(0.0, 0.0), &v(1.0, 1.0), &v(0.0, 1.0));
        let model = pack_meshes(&[SourceMesh::new().with_primitive(prim)], settings).unwrap();
        write_glb(&model, settings).unwrap()
    }

    #[test]
    fn test_read_welded_quad() {
        let reader = GltfReader::from_slice(&quad_glb(&PackSettings::default())).unwrap();
        let mesh = reader.read_mesh(0).unwrap();
        let prim = &mesh.primitives[0];

        assert_eq!(prim.mode, PrimitiveMode::Triangles);
        assert_eq!(prim.material, Some(0));

        let positions = prim.attribute("POSITION").unwrap();
        assert_eq!(positions.info().item_count, 4);
        assert_eq!(positions.info().byte_stride, 24);
        assert_eq!(
            positions.as_vector3_array().unwrap().get(2),
            Vec3::new(1.0, 1.0, 0.0)
        );

        let indices = prim.indices.as_ref().unwrap();
        assert_eq!(indices.info().encoding, EncodingKind::UInt8);
        assert_eq!(indices.as_index_array().unwrap().to_vec(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_accessors_share_one_buffer() {
        let settings = PackSettings::default().with_interleaved(false);
        let reader = GltfReader::from_slice(&quad_glb(&settings)).unwrap();
        assert_eq!(reader.buffers().len(), 1);

        let normal = reader.read_accessor(1, "NORMAL").unwrap().into_dense().unwrap();
        let position = reader.read_accessor(0, "POSITION").unwrap().into_dense().unwrap();
        assert!(normal.shares_buffer(&position));
        assert_eq!(normal.as_vector3_array().unwrap().get(3), Vec3::z());
    }

    fn glb_with_json(json: &str, bin: &[u8]) -> Vec<u8> {
        let json = json.as_bytes();
        let json_len = json.len().next_multiple_of(4);
        let total = 12 + 8 + json_len + 8 + bin.len();
        let mut glb = Vec::new();
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json_len as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(json);
        glb.resize(20 + json_len, b' ');
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(bin);
        glb
    }

    #[test]
    fn test_huge_count_is_bounds_error() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": 64}],
            "bufferViews": [{"buffer": 0, "byteLength": 64}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 400000000, "type": "VEC3"}]
        }"#;
        let glb = glb_with_json(json, &[0u8; 64]);
        let result = GltfReader::from_slice(&glb).and_then(|r| r.read_accessor(0, "POSITION"));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_values_past_u32_rejected() {
        assert_eq!(file_u32(7, "POSITION", "count").unwrap(), 7);
        assert!(matches!(
            file_offset(u32::MAX as usize, 1, "POSITION"),
            Err(PackError::Bounds(_))
        ));
        assert!(matches!(
            file_offset(usize::MAX, 1, "POSITION"),
            Err(PackError::Bounds(_))
        ));
    }

    #[test]
    fn test_accessor_out_of_range() {
        let reader = GltfReader::from_slice(&quad_glb(&PackSettings::default())).unwrap();
        assert!(matches!(
            reader.read_accessor(99, "POSITION"),
            Err(PackError::Bounds(_))
        ));
        assert!(matches!(reader.read_mesh(1), Err(PackError::Bounds(_))));
    }

    #[test]
    fn test_semantic_names() {
        assert_eq!(semantic_name(&gltf_dep::Semantic::Colors(1)), "COLOR_1");
        assert_eq!(semantic_name(&gltf_dep::Semantic::Positions), "POSITION");
    }
}
