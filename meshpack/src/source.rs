//! Source geometry fed to the packer.
//!
//! A [`SourcePrimitive`] collects points, lines or triangles of one
//! material. Vertices are welded on insertion: emitting the same vertex
//! twice stores it once and reuses its index. Morph targets are full
//! displaced copies of the vertex list; the packer turns them into deltas.

use crate::accessor::attribute_set;
use crate::error::{PackError, PackResult};
use crate::math::Vec4;
use crate::weld::{BytewiseComparer, ValueComparer, ValueListSet};

/// A vertex record the packer can split into glTF attributes.
///
/// Records are compared bytewise when welding, so they must be plain old
/// data without padding.
pub trait PackVertex: bytemuck::Pod + 'static {
    /// glTF attribute names, in record order.
    const ATTRIBUTES: &'static [&'static str];

    /// Value of attribute `index` widened to four components.
    ///
    /// Unused trailing components are ignored by the packer.
    fn attribute(&self, index: usize) -> Vec4;

    /// Largest joint index referenced by any `JOINTS_n` attribute.
    fn max_joint_index(&self) -> u32 {
        Self::ATTRIBUTES
            .iter()
            .enumerate()
            .filter(|(_, name)| matches!(attribute_set(name), Some(("JOINTS", _))))
            .map(|(i, _)| {
                let j = self.attribute(i);
                j.x.max(j.y).max(j.z).max(j.w).max(0.0) as u32
            })
            .max()
            .unwrap_or(0)
    }
}

/// Geometry of one material with welded vertices.
#[derive(Debug, Clone)]
pub struct SourcePrimitive<M, V> {
    material: M,
    vertices_per_primitive: u32,
    vertices: ValueListSet<V, BytewiseComparer>,
    indices: Vec<u32>,
    morph_targets: Vec<Vec<V>>,
}

impl<M, V: PackVertex> SourcePrimitive<M, V> {
    /// Create an empty primitive. `vertices_per_primitive` is 1 for points,
    /// 2 for lines and 3 for triangles.
    pub fn new(material: M, vertices_per_primitive: u32) -> Self {
        Self {
            material,
            vertices_per_primitive,
            vertices: ValueListSet::new(0, BytewiseComparer),
            indices: Vec::new(),
            morph_targets: Vec::new(),
        }
    }

    /// Create an empty point primitive.
    pub fn points(material: M) -> Self {
        Self::new(material, 1)
    }

    /// Create an empty line primitive.
    pub fn lines(material: M) -> Self {
        Self::new(material, 2)
    }

    /// Create an empty triangle primitive.
    pub fn triangles(material: M) -> Self {
        Self::new(material, 3)
    }

    /// Build a primitive from an indexed vertex list, welding duplicates and
    /// remapping the indices.
    ///
    /// Indices are not checked here; out-of-range ones stay out of range and
    /// are reported by [`validate`](Self::validate).
    pub fn from_indexed(
        material: M,
        vertices_per_primitive: u32,
        vertices: &[V],
        indices: &[u32],
    ) -> Self {
        let mut primitive = Self::new(material, vertices_per_primitive);
        let remap: Vec<u32> = vertices
            .iter()
            .map(|v| primitive.vertices.use_value(v) as u32)
            .collect();
        primitive.indices = indices
            .iter()
            .map(|&i| remap.get(i as usize).copied().unwrap_or(i))
            .collect();
        primitive
    }

    /// The material.
    pub fn material(&self) -> &M {
        &self.material
    }

    /// 1 for points, 2 for lines, 3 for triangles.
    pub fn vertices_per_primitive(&self) -> u32 {
        self.vertices_per_primitive
    }

    /// The welded vertex list.
    pub fn vertices(&self) -> &ValueListSet<V, BytewiseComparer> {
        &self.vertices
    }

    /// Number of welded vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Indices into [`vertices`](Self::vertices). Empty for points.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Morph targets as displaced vertex lists.
    pub fn morph_targets(&self) -> &[Vec<V>] {
        &self.morph_targets
    }

    /// Add a point. Returns its vertex index.
    pub fn add_point(&mut self, a: &V) -> u32 {
        self.vertices.use_value(a) as u32
    }

    /// Add a line. Degenerate lines are skipped and return `None`.
    ///
    /// A skipped line leaves the vertex list untouched.
    pub fn add_line(&mut self, a: &V, b: &V) -> Option<[u32; 2]> {
        if self.same_vertex(a, b) {
            return None;
        }
        let ia = self.vertices.use_value(a) as u32;
        let ib = self.vertices.use_value(b) as u32;
        self.indices.extend([ia, ib]);
        Some([ia, ib])
    }

    /// Add a triangle. Degenerate triangles are skipped and return `None`.
    ///
    /// A skipped triangle leaves the vertex list untouched.
    pub fn add_triangle(&mut self, a: &V, b: &V, c: &V) -> Option<[u32; 3]> {
        if self.same_vertex(a, b) || self.same_vertex(b, c) || self.same_vertex(c, a) {
            return None;
        }
        let ia = self.vertices.use_value(a) as u32;
        let ib = self.vertices.use_value(b) as u32;
        let ic = self.vertices.use_value(c) as u32;
        self.indices.extend([ia, ib, ic]);
        Some([ia, ib, ic])
    }

    fn same_vertex(&self, a: &V, b: &V) -> bool {
        self.vertices.comparer().equals(a, b)
    }

    /// Add a morph target given the displaced version of every vertex.
    ///
    /// Returns the target index.
    pub fn add_morph_target(&mut self, displaced: Vec<V>) -> usize {
        self.morph_targets.push(displaced);
        self.morph_targets.len() - 1
    }

    /// Add a morph target by displacing every current vertex with `f`.
    pub fn add_morph_target_with(&mut self, f: impl FnMut(&V) -> V) -> usize {
        let displaced = self.vertices.iter().map(f).collect();
        self.add_morph_target(displaced)
    }

    /// Rewrite every vertex, e.g. to transform positions into another space.
    pub fn transform_vertices(&mut self, f: impl FnMut(&V) -> V) {
        self.vertices.apply_transform(f);
    }

    /// Largest joint index used by any vertex.
    pub fn max_joint_index(&self) -> u32 {
        self.vertices
            .iter()
            .map(|v| v.max_joint_index())
            .max()
            .unwrap_or(0)
    }

    /// Check structural consistency.
    ///
    /// `mesh` and `primitive` only label the error.
    pub fn validate(&self, mesh: usize, primitive: usize) -> PackResult<()> {
        let fail = |reason: String| -> PackResult<()> {
            Err(PackError::validation(mesh, primitive, reason))
        };

        let vpp = self.vertices_per_primitive;
        if !(1..=3).contains(&vpp) {
            return fail(format!("{vpp} vertices per primitive is not 1, 2 or 3"));
        }
        if self.indices.len() % vpp as usize != 0 {
            return fail(format!(
                "{} indices is not a multiple of {vpp}",
                self.indices.len()
            ));
        }
        let count = self.vertices.len();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return fail(format!("index {bad} out of range for {count} vertices"));
        }
        for (t, target) in self.morph_targets.iter().enumerate() {
            if target.len() != count {
                return fail(format!(
                    "morph target {t} has {} vertices, expected {count}",
                    target.len()
                ));
            }
        }
        Ok(())
    }
}

/// A named list of primitives.
#[derive(Debug, Clone)]
pub struct SourceMesh<M, V> {
    name: Option<String>,
    primitives: Vec<SourcePrimitive<M, V>>,
}

impl<M, V: PackVertex> SourceMesh<M, V> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            name: None,
            primitives: Vec::new(),
        }
    }

    /// Builder-style name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mesh name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Append a primitive, returning its index.
    pub fn add_primitive(&mut self, primitive: SourcePrimitive<M, V>) -> usize {
        self.primitives.push(primitive);
        self.primitives.len() - 1
    }

    /// Builder-style [`add_primitive`](Self::add_primitive).
    pub fn with_primitive(mut self, primitive: SourcePrimitive<M, V>) -> Self {
        self.primitives.push(primitive);
        self
    }

    /// The primitives.
    pub fn primitives(&self) -> &[SourcePrimitive<M, V>] {
        &self.primitives
    }

    /// Mutable access to primitive `index`.
    pub fn primitive_mut(&mut self, index: usize) -> Option<&mut SourcePrimitive<M, V>> {
        self.primitives.get_mut(index)
    }
}

impl<M, V: PackVertex> Default for SourceMesh<M, V> {
    fn default() -> Self {
        Self::new()
    }
}
