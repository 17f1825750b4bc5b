//! Packing one source mesh with a mesh-wide encoding policy.

use crate::accessor::attribute_set;
use crate::encoding::EncodingKind;
use crate::error::{PackError, PackResult};
use crate::settings::{EncodingPolicy, PackSettings};
use crate::source::{PackVertex, SourceMesh};
use crate::target::MeshTarget;

use super::primitive::{PackedPrimitive, is_morphable, nonzero_morph_attributes};

/// The packed primitives of one mesh.
#[derive(Debug, Clone)]
pub struct PackedMesh<M> {
    name: Option<String>,
    policy: EncodingPolicy,
    morph_attributes: Vec<String>,
    pub(crate) primitives: Vec<PackedPrimitive<M>>,
}

impl<M> PackedMesh<M> {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The encoding decisions shared by every primitive.
    pub fn policy(&self) -> &EncodingPolicy {
        &self.policy
    }

    /// Attributes emitted in every morph target.
    pub fn morph_attributes(&self) -> &[String] {
        &self.morph_attributes
    }

    /// Packed primitives. Empty source primitives are not represented.
    pub fn primitives(&self) -> &[PackedPrimitive<M>] {
        &self.primitives
    }

    /// Emit every primitive into `dst`, resolving each material once.
    pub fn copy_to<D, T>(
        &self,
        dst: &mut T,
        mut material_resolver: impl FnMut(&M) -> D,
    ) -> PackResult<()>
    where
        T: MeshTarget<D> + ?Sized,
    {
        for primitive in &self.primitives {
            primitive.copy_to_mesh(&mut *dst, &mut material_resolver)?;
        }
        Ok(())
    }
}

/// Pack `src` into accessors.
///
/// `mesh_index` only labels validation errors. Any error rejects the whole
/// mesh; no partially packed mesh is returned.
pub fn pack_mesh<M: Clone, V: PackVertex>(
    mesh_index: usize,
    src: &SourceMesh<M, V>,
    settings: &PackSettings,
) -> PackResult<PackedMesh<M>> {
    crate::profile_function!();
    settings.validate()?;

    for (p, primitive) in src.primitives().iter().enumerate() {
        primitive.validate(mesh_index, p)?;
    }

    let non_empty: Vec<(usize, _)> = src
        .primitives()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.vertex_count() > 0)
        .collect();

    // Every index stays below the vertex count, so the largest value of the
    // chosen type is never used.
    let max_vertices = non_empty.iter().map(|(_, p)| p.vertex_count()).max().unwrap_or(0);
    let max_joint = non_empty.iter().map(|(_, p)| p.max_joint_index()).max().unwrap_or(0);

    let mut policy = EncodingPolicy::from_settings(settings);
    policy.indices = EncodingKind::smallest_index_encoding(max_vertices as u32);
    policy.joints = EncodingKind::smallest_joint_encoding(max_joint)?;

    let target_count = non_empty
        .iter()
        .map(|(_, p)| p.morph_targets().len())
        .max()
        .unwrap_or(0);
    let has_morph = target_count > 0;

    let mut morph_attributes: Vec<String> = Vec::new();
    if has_morph {
        if let Some((p, _)) = non_empty
            .iter()
            .find(|(_, p)| p.morph_targets().len() != target_count)
        {
            return Err(PackError::validation(
                mesh_index,
                *p,
                format!("every primitive of a morphed mesh needs {target_count} morph targets"),
            ));
        }

        for (_, primitive) in &non_empty {
            for name in nonzero_morph_attributes(*primitive) {
                if !morph_attributes.iter().any(|m| m == name) {
                    morph_attributes.push(name.to_string());
                }
            }
        }
        for name in &settings.required_morph_attributes {
            if is_morphable(name)
                && V::ATTRIBUTES.contains(&name.as_str())
                && !morph_attributes.contains(name)
            {
                morph_attributes.push(name.clone());
            }
        }

        policy.interleaved = false;
        if morph_attributes
            .iter()
            .any(|name| matches!(attribute_set(name), Some(("COLOR", _))))
        {
            policy.colors = EncodingKind::Float32;
        }
    }

    log::debug!(
        "Packing mesh {mesh_index} ({}): {} primitives, interleaved={}, indices={:?}, joints={:?}, morph targets={target_count}",
        src.name().unwrap_or("unnamed"),
        non_empty.len(),
        policy.interleaved,
        policy.indices,
        policy.joints,
    );

    let mut primitives = Vec::with_capacity(non_empty.len());
    for (p, source) in src.primitives().iter().enumerate() {
        if source.vertex_count() == 0 {
            log::debug!("Skipping empty primitive {p} of mesh {mesh_index}");
            continue;
        }

        let mut packed =
            PackedPrimitive::new(source.material().clone(), source.vertices_per_primitive());
        if policy.interleaved {
            packed.set_strided_vertices(source, &policy)?;
        } else {
            packed.set_streamed_vertices(source, &policy)?;
        }
        packed.set_indices(source, policy.indices)?;
        if has_morph {
            packed.set_morph_targets(source, &policy, &morph_attributes)?;
            packed.check_morph_targets()?;
        }
        primitives.push(packed);
    }

    Ok(PackedMesh {
        name: src.name().map(str::to_string),
        policy,
        morph_attributes,
        primitives,
    })
}
