//! Packing one source primitive into accessors.

use std::any::TypeId;
use std::sync::Arc;

use crate::accessor::{
    Element, EncodedArrayMut, MAX_BYTE_STRIDE, MemoryAccessInfo, MemoryAccessor, attribute_set,
    set_interleaved_info,
};
use crate::encoding::{Dimensionality, EncodingKind};
use crate::error::{PackError, PackResult};
use crate::math::Vec4;
use crate::settings::EncodingPolicy;
use crate::source::{PackVertex, SourcePrimitive};
use crate::target::{MeshTarget, PrimitiveMode};

/// Suffix marking morph delta accessors until they are attached.
pub const MORPH_DELTA_SUFFIX: &str = "DELTA";

/// Identity of an interleaved vertex record.
///
/// Two primitives whose vertices share a record key can share one
/// interleaved buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    vertex_type: TypeId,
    attributes: Vec<(String, EncodingKind, bool)>,
    stride: u32,
}

impl RecordKey {
    fn new<V: 'static>(infos: &[MemoryAccessInfo], stride: u32) -> Self {
        Self {
            vertex_type: TypeId::of::<V>(),
            attributes: infos
                .iter()
                .map(|i| (i.name.clone(), i.encoding, i.normalized))
                .collect(),
            stride,
        }
    }

    /// Byte size of one record.
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

/// How the vertex accessors of a primitive are laid out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VertexLayout {
    /// All attributes share one record buffer.
    Interleaved(RecordKey),
    /// Every attribute has its own tightly packed buffer.
    #[default]
    Planar,
}

/// Accessors of one packed primitive.
#[derive(Debug, Clone)]
pub struct PackedPrimitive<M> {
    material: M,
    vertices_per_primitive: u32,
    vertex_count: u32,
    pub(crate) vertex_layout: VertexLayout,
    pub(crate) vertex_accessors: Vec<MemoryAccessor>,
    pub(crate) index_accessor: Option<MemoryAccessor>,
    pub(crate) morph_targets: Vec<Vec<MemoryAccessor>>,
}

impl<M> PackedPrimitive<M> {
    /// Create a primitive with no accessors yet.
    pub fn new(material: M, vertices_per_primitive: u32) -> Self {
        Self {
            material,
            vertices_per_primitive,
            vertex_count: 0,
            vertex_layout: VertexLayout::Planar,
            vertex_accessors: Vec::new(),
            index_accessor: None,
            morph_targets: Vec::new(),
        }
    }

    pub fn material(&self) -> &M {
        &self.material
    }

    pub fn vertices_per_primitive(&self) -> u32 {
        self.vertices_per_primitive
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.vertex_layout
    }

    pub fn vertex_accessors(&self) -> &[MemoryAccessor] {
        &self.vertex_accessors
    }

    /// Vertex accessor by attribute name.
    pub fn vertex_accessor(&self, name: &str) -> Option<&MemoryAccessor> {
        self.vertex_accessors.iter().find(|a| a.name() == name)
    }

    pub fn index_accessor(&self) -> Option<&MemoryAccessor> {
        self.index_accessor.as_ref()
    }

    /// Delta accessors per morph target, still carrying the delta suffix.
    pub fn morph_targets(&self) -> &[Vec<MemoryAccessor>] {
        &self.morph_targets
    }

    /// Build the vertex accessors over one interleaved record buffer.
    pub fn set_strided_vertices<S, V: PackVertex>(
        &mut self,
        src: &SourcePrimitive<S, V>,
        policy: &EncodingPolicy,
    ) -> PackResult<()> {
        let mut infos = attribute_infos::<V>(policy)?;
        let count = src.vertex_count() as u32;
        let stride = set_interleaved_info(&mut infos, 0, count);
        if stride > MAX_BYTE_STRIDE {
            return Err(PackError::InvalidLayout(format!(
                "interleaved record of {stride} bytes exceeds {MAX_BYTE_STRIDE}"
            )));
        }

        let mut bytes = vec![0u8; (stride * count) as usize];
        for (a, info) in infos.iter().enumerate() {
            encode_attribute(&mut bytes, info, src.vertices().iter().map(|v| v.attribute(a)))?;
        }

        let data = Arc::new(bytes);
        let mut accessors = Vec::with_capacity(infos.len());
        for info in &infos {
            let mut accessor = MemoryAccessor::create(info.clone());
            accessor.set_vertex_data_source(Arc::clone(&data), info.byte_offset, count, stride)?;
            accessors.push(accessor);
        }

        self.vertex_layout = VertexLayout::Interleaved(RecordKey::new::<V>(&infos, stride));
        self.vertex_accessors = accessors;
        self.vertex_count = count;
        Ok(())
    }

    /// Build one tightly packed accessor per attribute.
    pub fn set_streamed_vertices<S, V: PackVertex>(
        &mut self,
        src: &SourcePrimitive<S, V>,
        policy: &EncodingPolicy,
    ) -> PackResult<()> {
        let infos = attribute_infos::<V>(policy)?;
        let count = src.vertex_count() as u32;

        let mut accessors = Vec::with_capacity(infos.len());
        for (a, info) in infos.into_iter().enumerate() {
            let mut bytes = vec![0u8; (info.byte_length() * count) as usize];
            let mut laid_out = info.clone();
            laid_out.item_count = count;
            encode_attribute(&mut bytes, &laid_out, src.vertices().iter().map(|v| v.attribute(a)))?;

            let mut accessor = MemoryAccessor::create(info);
            accessor.set_vertex_data_source(Arc::new(bytes), 0, count, 0)?;
            accessors.push(accessor);
        }

        self.vertex_layout = VertexLayout::Planar;
        self.vertex_accessors = accessors;
        self.vertex_count = count;
        Ok(())
    }

    /// Build the index accessor.
    ///
    /// Points take no indices; lines and triangles require them.
    pub fn set_indices<S, V: PackVertex>(
        &mut self,
        src: &SourcePrimitive<S, V>,
        index_encoding: EncodingKind,
    ) -> PackResult<()> {
        let indices = src.indices();
        if src.vertices_per_primitive() == 1 {
            if !indices.is_empty() {
                return Err(PackError::Configuration(
                    "point primitives cannot have an index accessor".into(),
                ));
            }
            self.index_accessor = None;
            return Ok(());
        }
        if indices.is_empty() {
            return Err(PackError::Configuration(format!(
                "primitives with {} vertices each require indices",
                src.vertices_per_primitive()
            )));
        }

        let info = MemoryAccessInfo::index(index_encoding);
        let count = indices.len() as u32;
        let bytes = vec![0u8; (info.byte_length() * count) as usize];

        let mut accessor = MemoryAccessor::create(info);
        accessor.set_index_data_source(Arc::new(bytes), 0, count)?;
        accessor.as_index_array_mut()?.fill(indices)?;
        self.index_accessor = Some(accessor);
        Ok(())
    }

    /// Build delta accessors for every morph target of `src`.
    ///
    /// A delta that is zero for every vertex is dropped unless its attribute
    /// is listed in `required`. A target may end up with no accessors; that
    /// is reported when the primitive is emitted.
    pub fn set_morph_targets<S, V: PackVertex>(
        &mut self,
        src: &SourcePrimitive<S, V>,
        policy: &EncodingPolicy,
        required: &[String],
    ) -> PackResult<()> {
        let count = src.vertex_count() as u32;
        let mut targets = Vec::with_capacity(src.morph_targets().len());

        for target in src.morph_targets() {
            let mut accessors = Vec::new();
            for (a, name) in V::ATTRIBUTES.iter().enumerate() {
                let Some(dimensions) = morph_dimensions(name) else {
                    continue;
                };
                let deltas = morph_deltas(src, target, a);
                let keep = required.iter().any(|r| r == name)
                    || !is_zero_delta(&deltas, dimensions.component_count() as usize);
                if !keep {
                    continue;
                }
                if matches!(attribute_set(name), Some(("COLOR", _)))
                    && policy.colors != EncodingKind::Float32
                {
                    return Err(PackError::Configuration(format!(
                        "{name} morph deltas require Float32 colors, policy uses {:?}",
                        policy.colors
                    )));
                }

                let mut info = MemoryAccessInfo::new(
                    format!("{name}{MORPH_DELTA_SUFFIX}"),
                    dimensions,
                    EncodingKind::Float32,
                    false,
                );
                info.item_count = count;
                let mut bytes = vec![0u8; (info.byte_length() * count) as usize];
                encode_attribute(&mut bytes, &info, deltas.into_iter())?;
                accessors.push(MemoryAccessor::from_vec(bytes, info));
            }
            targets.push(accessors);
        }

        self.morph_targets = targets;
        Ok(())
    }

    /// Fail if a recorded morph target contributes no accessor.
    pub fn check_morph_targets(&self) -> PackResult<()> {
        match self.morph_targets.iter().position(Vec::is_empty) {
            Some(t) => Err(PackError::InvalidState(format!(
                "morph target {t} has no non-zero attribute to emit"
            ))),
            None => Ok(()),
        }
    }

    /// Emit this primitive into `dst`. Returns the new primitive's index.
    pub fn copy_to_mesh<D, T>(
        &self,
        dst: &mut T,
        material_resolver: impl FnOnce(&M) -> D,
    ) -> PackResult<usize>
    where
        T: MeshTarget<D> + ?Sized,
    {
        self.check_morph_targets()?;
        let mode = PrimitiveMode::from_vertices_per_primitive(self.vertices_per_primitive)?;

        let p = dst.add_primitive(material_resolver(&self.material))?;
        for accessor in &self.vertex_accessors {
            dst.with_vertex_accessor(p, accessor.name(), accessor)?;
        }
        dst.with_indices_accessor(p, mode, self.index_accessor.as_ref())?;

        for (t, accessors) in self.morph_targets.iter().enumerate() {
            let attached: Vec<MemoryAccessor> = accessors
                .iter()
                .map(|a| {
                    let name = a.name();
                    let base = name.strip_suffix(MORPH_DELTA_SUFFIX).unwrap_or(name);
                    a.with_info(a.info().clone().with_name(base))
                })
                .collect();
            dst.with_morph_target_accessors(p, t, &attached)?;
        }
        Ok(p)
    }
}

/// Morphable attributes of `src` whose delta is non-zero in any target.
pub(crate) fn nonzero_morph_attributes<S, V: PackVertex>(
    src: &SourcePrimitive<S, V>,
) -> Vec<&'static str> {
    V::ATTRIBUTES
        .iter()
        .enumerate()
        .filter_map(|(a, name)| {
            let dimensions = morph_dimensions(name)?;
            let components = dimensions.component_count() as usize;
            src.morph_targets()
                .iter()
                .any(|target| !is_zero_delta(&morph_deltas(src, target, a), components))
                .then_some(*name)
        })
        .collect()
}

/// Whether `name` can carry a morph delta.
pub(crate) fn is_morphable(name: &str) -> bool {
    morph_dimensions(name).is_some()
}

fn attribute_infos<V: PackVertex>(policy: &EncodingPolicy) -> PackResult<Vec<MemoryAccessInfo>> {
    V::ATTRIBUTES
        .iter()
        .map(|name| policy.attribute_info(name))
        .collect()
}

/// Shape of the delta for a morphable attribute, `None` if it never morphs.
fn morph_dimensions(name: &str) -> Option<Dimensionality> {
    match name {
        "POSITION" | "NORMAL" | "TANGENT" => Some(Dimensionality::Vec3),
        _ => match attribute_set(name) {
            Some(("COLOR", _)) => Some(Dimensionality::Vec4),
            Some(("TEXCOORD", _)) => Some(Dimensionality::Vec2),
            _ => None,
        },
    }
}

fn morph_deltas<S, V: PackVertex>(src: &SourcePrimitive<S, V>, target: &[V], a: usize) -> Vec<Vec4> {
    src.vertices()
        .iter()
        .zip(target)
        .map(|(base, moved)| moved.attribute(a) - base.attribute(a))
        .collect()
}

fn is_zero_delta(deltas: &[Vec4], components: usize) -> bool {
    deltas
        .iter()
        .all(|d| d.iter().take(components).all(|&c| c == 0.0))
}

/// Encode `values` into `bytes` at the layout `info`, narrowing each
/// four-component value to the accessor's shape.
fn encode_attribute(
    bytes: &mut [u8],
    info: &MemoryAccessInfo,
    values: impl Iterator<Item = Vec4>,
) -> PackResult<()> {
    match info.dimensions {
        Dimensionality::Scalar => write_elements(bytes, info, values.map(|v| v.x)),
        Dimensionality::Vec2 => write_elements(bytes, info, values.map(|v| v.xy())),
        Dimensionality::Vec3 => write_elements(bytes, info, values.map(|v| v.xyz())),
        Dimensionality::Vec4 => write_elements(bytes, info, values),
        other => Err(PackError::InvalidLayout(format!(
            "{}: {other:?} is not a vertex attribute shape",
            info.name
        ))),
    }
}

fn write_elements<T: Element>(
    bytes: &mut [u8],
    info: &MemoryAccessInfo,
    values: impl Iterator<Item = T>,
) -> PackResult<()> {
    let mut array = EncodedArrayMut::<T>::new(bytes, info)?;
    for (i, value) in values.take(info.item_count as usize).enumerate() {
        array.set(i, value);
    }
    Ok(())
}
