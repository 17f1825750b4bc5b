//! Interfaces through which packed primitives are handed to a document.
//!
//! [`MeshTarget`] is implemented by whatever owns the output mesh (the glTF
//! writer, or the in-memory [`RecordedMesh`]). Primitives are addressed by
//! the index returned from [`MeshTarget::add_primitive`] instead of by
//! reference, so the target keeps sole ownership of its storage.

use crate::accessor::MemoryAccessor;
use crate::error::{PackError, PackResult};

/// Topology of an emitted primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    /// One vertex per point, no indices.
    Points,
    /// Two indices per line.
    Lines,
    /// Three indices per triangle.
    #[default]
    Triangles,
}

impl PrimitiveMode {
    /// Mode for a primitive with `n` vertices per element.
    pub fn from_vertices_per_primitive(n: u32) -> PackResult<Self> {
        match n {
            1 => Ok(Self::Points),
            2 => Ok(Self::Lines),
            3 => Ok(Self::Triangles),
            _ => Err(PackError::Configuration(format!(
                "{n} vertices per primitive is not supported"
            ))),
        }
    }

    /// Vertices per element.
    pub fn vertices_per_primitive(self) -> u32 {
        match self {
            Self::Points => 1,
            Self::Lines => 2,
            Self::Triangles => 3,
        }
    }

    /// glTF `mode` code.
    pub fn gltf_mode(self) -> u32 {
        match self {
            Self::Points => 0,
            Self::Lines => 1,
            Self::Triangles => 4,
        }
    }
}

/// A document mesh that accepts finished accessors.
///
/// `D` is the document-side material handle produced by the caller's
/// material resolver.
pub trait MeshTarget<D> {
    /// Start a new primitive using `material`. Returns its index.
    fn add_primitive(&mut self, material: D) -> PackResult<usize>;

    /// Attach a vertex attribute accessor to a primitive.
    fn with_vertex_accessor(
        &mut self,
        primitive: usize,
        name: &str,
        accessor: &MemoryAccessor,
    ) -> PackResult<()>;

    /// Set the topology and, except for points, the index accessor.
    fn with_indices_accessor(
        &mut self,
        primitive: usize,
        mode: PrimitiveMode,
        accessor: Option<&MemoryAccessor>,
    ) -> PackResult<()>;

    /// Attach the delta accessors of morph target `target`.
    ///
    /// Accessors carry their base attribute name (`POSITION`, `NORMAL`, ...).
    fn with_morph_target_accessors(
        &mut self,
        primitive: usize,
        target: usize,
        accessors: &[MemoryAccessor],
    ) -> PackResult<()>;
}

/// One primitive captured by [`RecordedMesh`].
#[derive(Debug, Clone)]
pub struct RecordedPrimitive<D> {
    pub material: D,
    pub mode: PrimitiveMode,
    pub attributes: Vec<(String, MemoryAccessor)>,
    pub indices: Option<MemoryAccessor>,
    pub morph_targets: Vec<Vec<MemoryAccessor>>,
}

impl<D> RecordedPrimitive<D> {
    /// Attribute accessor by name.
    pub fn attribute(&self, name: &str) -> Option<&MemoryAccessor> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }
}

/// A [`MeshTarget`] that simply keeps what it is given.
#[derive(Debug, Clone)]
pub struct RecordedMesh<D> {
    pub primitives: Vec<RecordedPrimitive<D>>,
}

impl<D> Default for RecordedMesh<D> {
    fn default() -> Self {
        Self {
            primitives: Vec::new(),
        }
    }
}

impl<D> RecordedMesh<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn primitive_mut(&mut self, index: usize) -> PackResult<&mut RecordedPrimitive<D>> {
        let count = self.primitives.len();
        self.primitives.get_mut(index).ok_or_else(|| {
            PackError::Bounds(format!("primitive {index} out of range for {count} primitives"))
        })
    }
}

impl<D> MeshTarget<D> for RecordedMesh<D> {
    fn add_primitive(&mut self, material: D) -> PackResult<usize> {
        self.primitives.push(RecordedPrimitive {
            material,
            mode: PrimitiveMode::default(),
            attributes: Vec::new(),
            indices: None,
            morph_targets: Vec::new(),
        });
        Ok(self.primitives.len() - 1)
    }

    fn with_vertex_accessor(
        &mut self,
        primitive: usize,
        name: &str,
        accessor: &MemoryAccessor,
    ) -> PackResult<()> {
        let prim = self.primitive_mut(primitive)?;
        prim.attributes.retain(|(n, _)| n != name);
        prim.attributes.push((name.to_string(), accessor.clone()));
        Ok(())
    }

    fn with_indices_accessor(
        &mut self,
        primitive: usize,
        mode: PrimitiveMode,
        accessor: Option<&MemoryAccessor>,
    ) -> PackResult<()> {
        let prim = self.primitive_mut(primitive)?;
        prim.mode = mode;
        prim.indices = accessor.cloned();
        Ok(())
    }

    fn with_morph_target_accessors(
        &mut self,
        primitive: usize,
        target: usize,
        accessors: &[MemoryAccessor],
    ) -> PackResult<()> {
        let prim = self.primitive_mut(primitive)?;
        if prim.morph_targets.len() <= target {
            prim.morph_targets.resize_with(target + 1, Vec::new);
        }
        prim.morph_targets[target] = accessors.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::MemoryAccessInfo;

    #[test]
    fn test_mode_from_vertices_per_primitive() {
        assert_eq!(PrimitiveMode::from_vertices_per_primitive(1).unwrap(), PrimitiveMode::Points);
        assert_eq!(PrimitiveMode::from_vertices_per_primitive(3).unwrap().gltf_mode(), 4);
        assert!(PrimitiveMode::from_vertices_per_primitive(4).is_err());
    }

    #[test]
    fn test_recorded_mesh() {
        let mut mesh = RecordedMesh::new();
        let p = mesh.add_primitive("steel").unwrap();
        let position = MemoryAccessor::create(MemoryAccessInfo::create("POSITION").unwrap());

        mesh.with_vertex_accessor(p, "POSITION", &position).unwrap();
        mesh.with_indices_accessor(p, PrimitiveMode::Points, None).unwrap();
        mesh.with_morph_target_accessors(p, 1, &[position.clone()]).unwrap();

        let prim = &mesh.primitives[p];
        assert_eq!(prim.material, "steel");
        assert_eq!(prim.mode, PrimitiveMode::Points);
        assert!(prim.attribute("POSITION").is_some());
        assert_eq!(prim.morph_targets.len(), 2);
        assert!(prim.morph_targets[0].is_empty());

        assert!(matches!(
            mesh.with_vertex_accessor(5, "POSITION", &position),
            Err(PackError::Bounds(_))
        ));
    }
}
