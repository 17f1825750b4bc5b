//! Writing packed meshes into a binary glTF 2.0 document.
//!
//! Every [`PackedBuffer`] becomes one buffer view inside a single GLB binary
//! chunk. Accessors are deduplicated by the buffer they read and their
//! layout, so an accessor shared by several primitives is emitted once.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gltf_dep::json as gj;

use crate::accessor::{MAX_BYTE_STRIDE, MemoryAccessInfo, MemoryAccessor, attribute_set};
use crate::encoding::{Dimensionality, EncodingKind};
use crate::error::{PackError, PackResult};
use crate::pack::{BufferTarget, MergedBuffers, PackedMesh, PackedModel};
use crate::settings::PackSettings;
use crate::target::{MeshTarget, PrimitiveMode};

const DEFAULT_GENERATOR: &str = "RedLilium Engine";

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LENGTH: usize = 12;
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
const GLB_CHUNK_BIN: u32 = 0x004E_4942;

/// Accumulates a glTF document and its binary chunk.
pub struct GltfWriter {
    root: gj::Root,
    buffer_data: Vec<u8>,
    /// Buffer view of each source buffer, keyed by allocation.
    view_map: HashMap<*const Vec<u8>, u32>,
    /// Keeps keyed allocations alive so their addresses stay unique.
    retained: Vec<Arc<Vec<u8>>>,
    accessor_map: HashMap<(*const Vec<u8>, MemoryAccessInfo), u32>,
    material_map: HashMap<String, u32>,
}

impl GltfWriter {
    pub fn new(settings: &PackSettings) -> Self {
        let mut root = gj::Root::default();
        root.asset = gj::Asset {
            generator: Some(
                settings
                    .generator
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GENERATOR.into()),
            ),
            version: "2.0".into(),
            ..Default::default()
        };
        Self {
            root,
            buffer_data: Vec::new(),
            view_map: HashMap::new(),
            retained: Vec::new(),
            accessor_map: HashMap::new(),
            material_map: HashMap::new(),
        }
    }

    /// The document built so far.
    pub fn root(&self) -> &gj::Root {
        &self.root
    }

    /// Register every merged buffer as a buffer view, in order.
    pub fn add_buffers(&mut self, buffers: &MergedBuffers) -> PackResult<()> {
        crate::profile_function!();
        for buffer in buffers.buffers() {
            let ptr = Arc::as_ptr(&buffer.data);
            if self.view_map.contains_key(&ptr) {
                continue;
            }
            let view = self.push_buffer_view(&buffer.data, buffer.byte_stride, buffer.target)?;
            self.view_map.insert(ptr, view);
            self.retained.push(Arc::clone(&buffer.data));
        }
        Ok(())
    }

    /// Index of the material called `name`, creating it on first use.
    pub fn material(&mut self, name: &str) -> u32 {
        if let Some(&index) = self.material_map.get(name) {
            return index;
        }
        let index = self.root.materials.len() as u32;
        self.root.materials.push(gj::Material {
            name: Some(name.to_string()),
            alpha_cutoff: None,
            alpha_mode: gj::validation::Checked::Valid(gj::material::AlphaMode::Opaque),
            double_sided: false,
            pbr_metallic_roughness: gj::material::PbrMetallicRoughness {
                base_color_factor: gj::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
                base_color_texture: None,
                metallic_factor: gj::material::StrengthFactor(1.0),
                roughness_factor: gj::material::StrengthFactor(1.0),
                metallic_roughness_texture: None,
                extensions: None,
                extras: gj::Extras::default(),
            },
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: gj::material::EmissiveFactor([0.0, 0.0, 0.0]),
            extensions: None,
            extras: gj::Extras::default(),
        });
        self.material_map.insert(name.to_string(), index);
        index
    }

    /// Emit `mesh` as a glTF mesh. Returns its index.
    ///
    /// Buffers not registered through [`add_buffers`](Self::add_buffers)
    /// get a buffer view on first use.
    ///
    /// glTF morph targets hold POSITION, NORMAL and TANGENT deltas only.
    /// Other deltas are dropped with a warning, and a target left with none
    /// of the three fails with `InvalidState`.
    pub fn add_mesh<M>(
        &mut self,
        mesh: &PackedMesh<M>,
        material_resolver: impl FnMut(&M) -> Option<u32>,
    ) -> PackResult<u32> {
        crate::profile_function!();
        let mesh_index = self.root.meshes.len();
        self.root.meshes.push(gj::Mesh {
            name: mesh.name().map(String::from),
            primitives: Vec::new(),
            weights: None,
            extensions: None,
            extras: gj::Extras::default(),
        });

        let mut sink = MeshSink {
            writer: self,
            mesh: mesh_index,
        };
        mesh.copy_to(&mut sink, material_resolver)?;

        let gltf_mesh = &mut self.root.meshes[mesh_index];
        let target_count = gltf_mesh
            .primitives
            .first()
            .and_then(|p| p.targets.as_ref())
            .map_or(0, Vec::len);
        if target_count > 0 {
            gltf_mesh.weights = Some(vec![0.0; target_count]);
        }

        log::debug!(
            "Wrote mesh {mesh_index} ({}): {} primitives, {} morph targets",
            mesh.name().unwrap_or("unnamed"),
            gltf_mesh.primitives.len(),
            target_count
        );
        Ok(mesh_index as u32)
    }

    /// Emit the buffers and meshes of `model`. Returns the mesh indices.
    pub fn add_model<M>(
        &mut self,
        model: &PackedModel<M>,
        mut material_resolver: impl FnMut(&M) -> Option<u32>,
    ) -> PackResult<Vec<u32>> {
        self.add_buffers(&model.buffers)?;
        model
            .meshes
            .iter()
            .map(|mesh| self.add_mesh(mesh, &mut material_resolver))
            .collect()
    }

    /// Finish the document and serialize it as GLB.
    ///
    /// When no scene was added, every mesh is placed in a node of one
    /// default scene.
    pub fn into_glb(mut self) -> PackResult<Vec<u8>> {
        crate::profile_function!();
        if self.root.scenes.is_empty() && !self.root.meshes.is_empty() {
            self.add_default_scene();
        }
        self.push_binary_buffer();
        self.to_glb()
    }

    fn add_default_scene(&mut self) {
        let first_node = self.root.nodes.len() as u32;
        for mesh in 0..self.root.meshes.len() as u32 {
            self.root.nodes.push(gj::Node {
                mesh: Some(gj::Index::new(mesh)),
                ..gj::Node::default()
            });
        }
        let last_node = self.root.nodes.len() as u32;
        self.root.scenes.push(gj::Scene {
            name: None,
            nodes: (first_node..last_node).map(gj::Index::new).collect(),
            extensions: None,
            extras: gj::Extras::default(),
        });
        self.root.scene = Some(gj::Index::new(0));
    }

    // -- Buffer/accessor helpers ---------------------------------------------

    fn align_buffer(&mut self) {
        let aligned = self.buffer_data.len().next_multiple_of(4);
        self.buffer_data.resize(aligned, 0);
    }

    fn push_buffer_view(
        &mut self,
        data: &[u8],
        stride: Option<u32>,
        target: BufferTarget,
    ) -> PackResult<u32> {
        if let Some(stride) = stride {
            if !(4..=MAX_BYTE_STRIDE).contains(&stride) || stride % 4 != 0 {
                return Err(PackError::InvalidLayout(format!(
                    "buffer view stride {stride} must be a multiple of 4 in 4..={MAX_BYTE_STRIDE}"
                )));
            }
        }

        self.align_buffer();
        let offset = self.buffer_data.len();
        self.buffer_data.extend_from_slice(data);

        let view_idx = self.root.buffer_views.len() as u32;
        self.root.buffer_views.push(gj::buffer::View {
            buffer: gj::Index::new(0),
            byte_offset: Some(gj::validation::USize64(offset as u64)),
            byte_length: gj::validation::USize64(data.len() as u64),
            byte_stride: stride.map(|s| gj::buffer::Stride(s as usize)),
            target: Some(gj::validation::Checked::Valid(map_target(target))),
            name: None,
            extensions: None,
            extras: gj::Extras::default(),
        });

        Ok(view_idx)
    }

    /// Buffer view for `accessor`'s buffer, creating one if needed.
    fn view_for(&mut self, accessor: &MemoryAccessor, target: BufferTarget) -> PackResult<u32> {
        let ptr = Arc::as_ptr(accessor.data());
        if let Some(&view) = self.view_map.get(&ptr) {
            return Ok(view);
        }
        let stride = match target {
            BufferTarget::ArrayBuffer => Some(accessor.info().step_byte_length()),
            BufferTarget::ElementArrayBuffer => None,
        };
        let view = self.push_buffer_view(accessor.data(), stride, target)?;
        self.view_map.insert(ptr, view);
        self.retained.push(Arc::clone(accessor.data()));
        Ok(view)
    }

    /// Index of the glTF accessor describing `accessor`.
    fn accessor_index(
        &mut self,
        accessor: &MemoryAccessor,
        target: BufferTarget,
    ) -> PackResult<u32> {
        let key = (Arc::as_ptr(accessor.data()), accessor.info().clone());
        if let Some(&index) = self.accessor_map.get(&key) {
            return Ok(index);
        }

        let info = accessor.info();
        let view = self.view_for(accessor, target)?;
        if let Some(gj::buffer::Stride(stride)) = self.root.buffer_views[view as usize].byte_stride {
            if stride as u32 != info.step_byte_length() {
                return Err(PackError::InvalidLayout(format!(
                    "{}: element step {} does not match buffer view stride {stride}",
                    info.name,
                    info.step_byte_length()
                )));
            }
        }

        let (min, max) = if info.name == "POSITION" {
            let (min, max) = accessor.bounds()?;
            (Some(bounds_value(&min)), Some(bounds_value(&max)))
        } else {
            (None, None)
        };

        let index = self.push_accessor(view, info, min, max);
        self.accessor_map.insert(key, index);
        Ok(index)
    }

    fn push_accessor(
        &mut self,
        buffer_view: u32,
        info: &MemoryAccessInfo,
        min: Option<gj::Value>,
        max: Option<gj::Value>,
    ) -> u32 {
        let acc_idx = self.root.accessors.len() as u32;
        self.root.accessors.push(gj::Accessor {
            buffer_view: Some(gj::Index::new(buffer_view)),
            byte_offset: Some(gj::validation::USize64(info.byte_offset as u64)),
            count: gj::validation::USize64(info.item_count as u64),
            component_type: gj::validation::Checked::Valid(gj::accessor::GenericComponentType(
                map_component_type(info.encoding),
            )),
            type_: gj::validation::Checked::Valid(map_dimensions(info.dimensions)),
            min,
            max,
            normalized: info.normalized,
            name: None,
            sparse: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
        acc_idx
    }

    /// Declare the binary chunk as buffer 0, if anything was written.
    fn push_binary_buffer(&mut self) {
        if self.buffer_data.is_empty() {
            return;
        }
        self.root.buffers.push(gj::Buffer {
            byte_length: gj::validation::USize64(self.buffer_data.len() as u64),
            name: None,
            uri: None,
            extensions: None,
            extras: gj::Extras::default(),
        });
    }

    // -- GLB assembly --------------------------------------------------------

    fn to_glb(&self) -> PackResult<Vec<u8>> {
        let json = self.root.to_vec().map_err(|e| {
            PackError::Export(format!(
                "document with {} meshes and {} accessors could not be serialized: {e}",
                self.root.meshes.len(),
                self.root.accessors.len()
            ))
        })?;

        let mut chunks = vec![(GLB_CHUNK_JSON, json.as_slice(), b' ')];
        if !self.buffer_data.is_empty() {
            chunks.push((GLB_CHUNK_BIN, self.buffer_data.as_slice(), 0u8));
        }
        let total_length = GLB_HEADER_LENGTH
            + chunks
                .iter()
                .map(|(_, payload, _)| 8 + payload.len().next_multiple_of(4))
                .sum::<usize>();
        let total_length_u32 = u32::try_from(total_length).map_err(|_| {
            PackError::Export(format!(
                "GLB of {total_length} bytes exceeds the 4 GiB container limit"
            ))
        })?;

        let mut glb = Vec::with_capacity(total_length);
        glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
        glb.extend_from_slice(&total_length_u32.to_le_bytes());
        for (kind, payload, pad) in chunks {
            let padded = payload.len().next_multiple_of(4);
            glb.extend_from_slice(&(padded as u32).to_le_bytes());
            glb.extend_from_slice(&kind.to_le_bytes());
            glb.extend_from_slice(payload);
            glb.resize(glb.len() + padded - payload.len(), pad);
        }

        log::debug!(
            "Wrote GLB: {} bytes ({} bytes JSON, {} bytes binary)",
            glb.len(),
            json.len(),
            self.buffer_data.len()
        );
        Ok(glb)
    }
}

/// Pack-side view of one glTF mesh under construction.
struct MeshSink<'a> {
    writer: &'a mut GltfWriter,
    mesh: usize,
}

impl MeshSink<'_> {
    fn primitive_mut(&mut self, index: usize) -> PackResult<&mut gj::mesh::Primitive> {
        let primitives = &mut self.writer.root.meshes[self.mesh].primitives;
        let count = primitives.len();
        primitives.get_mut(index).ok_or_else(|| {
            PackError::Bounds(format!("primitive {index} out of range for {count} primitives"))
        })
    }
}

impl MeshTarget<Option<u32>> for MeshSink<'_> {
    fn add_primitive(&mut self, material: Option<u32>) -> PackResult<usize> {
        let primitives = &mut self.writer.root.meshes[self.mesh].primitives;
        primitives.push(gj::mesh::Primitive {
            attributes: BTreeMap::new(),
            extensions: None,
            extras: gj::Extras::default(),
            indices: None,
            material: material.map(gj::Index::new),
            mode: gj::validation::Checked::Valid(gj::mesh::Mode::Triangles),
            targets: None,
        });
        Ok(primitives.len() - 1)
    }

    fn with_vertex_accessor(
        &mut self,
        primitive: usize,
        name: &str,
        accessor: &MemoryAccessor,
    ) -> PackResult<()> {
        let semantic = map_semantic(name).ok_or_else(|| {
            PackError::Configuration(format!("attribute '{name}' has no glTF semantic"))
        })?;
        let index = self
            .writer
            .accessor_index(accessor, BufferTarget::ArrayBuffer)?;
        self.primitive_mut(primitive)?
            .attributes
            .insert(gj::validation::Checked::Valid(semantic), gj::Index::new(index));
        Ok(())
    }

    fn with_indices_accessor(
        &mut self,
        primitive: usize,
        mode: PrimitiveMode,
        accessor: Option<&MemoryAccessor>,
    ) -> PackResult<()> {
        let indices = match accessor {
            Some(accessor) => Some(gj::Index::new(
                self.writer
                    .accessor_index(accessor, BufferTarget::ElementArrayBuffer)?,
            )),
            None => None,
        };
        let prim = self.primitive_mut(primitive)?;
        prim.mode = gj::validation::Checked::Valid(map_mode(mode));
        prim.indices = indices;
        Ok(())
    }

    fn with_morph_target_accessors(
        &mut self,
        primitive: usize,
        target: usize,
        accessors: &[MemoryAccessor],
    ) -> PackResult<()> {
        let mut morph = gj::mesh::MorphTarget {
            positions: None,
            normals: None,
            tangents: None,
        };
        for accessor in accessors {
            let slot = match accessor.name() {
                "POSITION" => &mut morph.positions,
                "NORMAL" => &mut morph.normals,
                "TANGENT" => &mut morph.tangents,
                other => {
                    log::warn!(
                        "Morph target {target} of primitive {primitive}: '{other}' deltas cannot be written, skipping"
                    );
                    continue;
                }
            };
            let index = self
                .writer
                .accessor_index(accessor, BufferTarget::ArrayBuffer)?;
            *slot = Some(gj::Index::new(index));
        }
        if morph.positions.is_none() && morph.normals.is_none() && morph.tangents.is_none() {
            return Err(PackError::InvalidState(format!(
                "morph target {target} of primitive {primitive} has no POSITION, NORMAL or TANGENT deltas"
            )));
        }

        let targets = self.primitive_mut(primitive)?.targets.get_or_insert_with(Vec::new);
        while targets.len() <= target {
            targets.push(gj::mesh::MorphTarget {
                positions: None,
                normals: None,
                tangents: None,
            });
        }
        targets[target] = morph;
        Ok(())
    }
}

/// Pack `model` into a GLB file.
///
/// One material is created per distinct material name.
pub fn write_glb<M: AsRef<str>>(
    model: &PackedModel<M>,
    settings: &PackSettings,
) -> PackResult<Vec<u8>> {
    let mut writer = GltfWriter::new(settings);

    let mut materials: HashMap<String, u32> = HashMap::new();
    for primitive in model.meshes.iter().flat_map(|m| m.primitives()) {
        let name = primitive.material().as_ref();
        if !materials.contains_key(name) {
            materials.insert(name.to_string(), writer.material(name));
        }
    }

    writer.add_model(model, |material| materials.get(material.as_ref()).copied())?;
    writer.into_glb()
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// glTF semantic of an attribute name.
fn map_semantic(name: &str) -> Option<gj::mesh::Semantic> {
    match name {
        "POSITION" => Some(gj::mesh::Semantic::Positions),
        "NORMAL" => Some(gj::mesh::Semantic::Normals),
        "TANGENT" => Some(gj::mesh::Semantic::Tangents),
        _ => match attribute_set(name)? {
            ("COLOR", set) => Some(gj::mesh::Semantic::Colors(set)),
            ("TEXCOORD", set) => Some(gj::mesh::Semantic::TexCoords(set)),
            ("JOINTS", set) => Some(gj::mesh::Semantic::Joints(set)),
            ("WEIGHTS", set) => Some(gj::mesh::Semantic::Weights(set)),
            _ => None,
        },
    }
}

fn map_mode(mode: PrimitiveMode) -> gj::mesh::Mode {
    match mode {
        PrimitiveMode::Points => gj::mesh::Mode::Points,
        PrimitiveMode::Lines => gj::mesh::Mode::Lines,
        PrimitiveMode::Triangles => gj::mesh::Mode::Triangles,
    }
}

fn map_target(target: BufferTarget) -> gj::buffer::Target {
    match target {
        BufferTarget::ArrayBuffer => gj::buffer::Target::ArrayBuffer,
        BufferTarget::ElementArrayBuffer => gj::buffer::Target::ElementArrayBuffer,
    }
}

fn map_component_type(encoding: EncodingKind) -> gj::accessor::ComponentType {
    match encoding {
        EncodingKind::Int8 => gj::accessor::ComponentType::I8,
        EncodingKind::UInt8 => gj::accessor::ComponentType::U8,
        EncodingKind::Int16 => gj::accessor::ComponentType::I16,
        EncodingKind::UInt16 => gj::accessor::ComponentType::U16,
        EncodingKind::UInt32 => gj::accessor::ComponentType::U32,
        EncodingKind::Float32 => gj::accessor::ComponentType::F32,
    }
}

fn map_dimensions(dimensions: Dimensionality) -> gj::accessor::Type {
    match dimensions {
        Dimensionality::Scalar => gj::accessor::Type::Scalar,
        Dimensionality::Vec2 => gj::accessor::Type::Vec2,
        Dimensionality::Vec3 => gj::accessor::Type::Vec3,
        Dimensionality::Vec4 => gj::accessor::Type::Vec4,
        Dimensionality::Mat2 => gj::accessor::Type::Mat2,
        Dimensionality::Mat3 => gj::accessor::Type::Mat3,
        Dimensionality::Mat4 => gj::accessor::Type::Mat4,
    }
}

/// Accessor `min`/`max` as a JSON number array.
fn bounds_value(values: &[f32]) -> gj::Value {
    gj::Value::from(values.iter().map(|&v| f64::from(v)).collect::<Vec<f64>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec3, Vec4};
    use crate::pack::pack_meshes;
    use crate::source::{SourceMesh, SourcePrimitive};
    use crate::vertex::{VertexPosition, VertexPositionNormal, VertexPositionNormalColor};

    fn triangle_model(settings: &PackSettings) -> PackedModel<&'static str> {
        let v = |x: f32, y: f32| VertexPositionNormal::new(Vec3::new(x, y, 0.0), Vec3::z());
        let mut prim = SourcePrimitive::triangles("default");
        prim.add_triangle(&v(0.0, 0.0), &v(1.0, 0.0), &v(0.0, 2.0));
        pack_meshes(&[SourceMesh::new().with_primitive(prim)], settings).unwrap()
    }

    #[test]
    fn test_semantic_mapping() {
        assert_eq!(map_semantic("POSITION"), Some(gj::mesh::Semantic::Positions));
        assert_eq!(map_semantic("TEXCOORD_1"), Some(gj::mesh::Semantic::TexCoords(1)));
        assert_eq!(map_semantic("JOINTS_0"), Some(gj::mesh::Semantic::Joints(0)));
        assert_eq!(map_semantic("CUSTOM_0"), None);
        assert_eq!(map_semantic("COLOR"), None);
    }

    #[test]
    fn test_buffer_views_follow_merged_buffers() {
        let settings = PackSettings::default();
        let model = triangle_model(&settings);
        let mut writer = GltfWriter::new(&settings);
        writer.add_model(&model, |_| None).unwrap();

        let root = writer.root();
        assert_eq!(root.buffer_views.len(), 2);
        assert_eq!(root.buffer_views[0].byte_stride.as_ref().map(|s| s.0), Some(24));
        assert!(root.buffer_views[1].byte_stride.is_none());
        // POSITION, NORMAL and INDEX.
        assert_eq!(root.accessors.len(), 3);
        assert_eq!(root.meshes[0].primitives.len(), 1);
        assert_eq!(root.asset.generator.as_deref(), Some("RedLilium Engine"));
    }

    #[test]
    fn test_position_accessor_has_bounds() {
        let settings = PackSettings::default().with_generator("meshpack tests");
        let model = triangle_model(&settings);
        let mut writer = GltfWriter::new(&settings);
        writer.add_model(&model, |_| None).unwrap();

        let root = writer.root();
        let position = &root.accessors[0];
        assert_eq!(position.min, Some(bounds_value(&[0.0, 0.0, 0.0])));
        assert_eq!(position.max, Some(bounds_value(&[1.0, 2.0, 0.0])));
        assert!(root.accessors[1].min.is_none());
        assert_eq!(root.asset.generator.as_deref(), Some("meshpack tests"));
    }

    #[test]
    fn test_materials_are_deduplicated() {
        let mut writer = GltfWriter::new(&PackSettings::default());
        assert_eq!(writer.material("steel"), 0);
        assert_eq!(writer.material("wood"), 1);
        assert_eq!(writer.material("steel"), 0);
        assert_eq!(writer.root().materials.len(), 2);
    }

    #[test]
    fn test_points_have_no_indices() {
        let mut prim = SourcePrimitive::points("default");
        prim.add_point(&VertexPosition::new(Vec3::new(1.0, 2.0, 3.0)));
        let settings = PackSettings::default();
        let model = pack_meshes(&[SourceMesh::new().with_primitive(prim)], &settings).unwrap();

        let mut writer = GltfWriter::new(&settings);
        writer.add_model(&model, |_| None).unwrap();
        let primitive = &writer.root().meshes[0].primitives[0];
        assert!(primitive.indices.is_none());
        assert!(matches!(
            primitive.mode,
            gj::validation::Checked::Valid(gj::mesh::Mode::Points)
        ));
    }

    fn recolored_point(move_position: bool) -> PackedModel<&'static str> {
        let mut prim = SourcePrimitive::points("default");
        prim.add_point(&VertexPositionNormalColor::new(
            Vec3::zeros(),
            Vec3::y(),
            Vec4::new(1.0, 0.0, 0.0, 1.0),
        ));
        prim.add_morph_target_with(|base| {
            let mut moved = *base;
            moved.color = [0.0, 1.0, 0.0, 1.0];
            if move_position {
                moved.position[1] = 1.0;
            }
            moved
        });
        pack_meshes(&[SourceMesh::new().with_primitive(prim)], &PackSettings::default()).unwrap()
    }

    #[test]
    fn test_color_only_morph_target_is_rejected() {
        let model = recolored_point(false);
        let err = write_glb(&model, &PackSettings::default()).unwrap_err();
        assert!(matches!(err, PackError::InvalidState(_)));
    }

    #[test]
    fn test_color_deltas_skipped_beside_positions() {
        let model = recolored_point(true);
        let mut writer = GltfWriter::new(&PackSettings::default());
        writer.add_model(&model, |_| None).unwrap();

        let targets = writer.root().meshes[0].primitives[0].targets.as_ref().unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets[0].positions.is_some());
        assert!(targets[0].normals.is_none());
    }

    #[test]
    fn test_glb_header() {
        let settings = PackSettings::default();
        let glb = write_glb(&triangle_model(&settings), &settings).unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(glb[4..8].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(glb[8..12].try_into().unwrap()) as usize,
            glb.len()
        );
        assert_eq!(glb.len() % 4, 0);
    }
}
