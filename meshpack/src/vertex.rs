//! Ready-made vertex records.
//!
//! Each record is `#[repr(C)]` plain old data so it can be welded bytewise,
//! and implements [`PackVertex`] to name its attributes.

use crate::math::{Vec2, Vec3, Vec4};
use crate::source::PackVertex;

#[inline]
fn vec3(v: [f32; 3]) -> Vec4 {
    Vec4::new(v[0], v[1], v[2], 0.0)
}

#[inline]
fn vec2(v: [f32; 2]) -> Vec4 {
    Vec4::new(v[0], v[1], 0.0, 0.0)
}

/// Position only.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPosition {
    pub position: [f32; 3],
}

impl VertexPosition {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.into(),
        }
    }
}

impl PackVertex for VertexPosition {
    const ATTRIBUTES: &'static [&'static str] = &["POSITION"];

    fn attribute(&self, _index: usize) -> Vec4 {
        vec3(self.position)
    }
}

/// Position and normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPositionNormal {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexPositionNormal {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
        }
    }
}

impl PackVertex for VertexPositionNormal {
    const ATTRIBUTES: &'static [&'static str] = &["POSITION", "NORMAL"];

    fn attribute(&self, index: usize) -> Vec4 {
        match index {
            0 => vec3(self.position),
            _ => vec3(self.normal),
        }
    }
}

/// Position, normal and linear RGBA color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPositionNormalColor {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl VertexPositionNormalColor {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            color: color.into(),
        }
    }
}

impl PackVertex for VertexPositionNormalColor {
    const ATTRIBUTES: &'static [&'static str] = &["POSITION", "NORMAL", "COLOR_0"];

    fn attribute(&self, index: usize) -> Vec4 {
        match index {
            0 => vec3(self.position),
            1 => vec3(self.normal),
            _ => Vec4::from(self.color),
        }
    }
}

/// Position, normal and one UV set (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPositionNormalTexcoord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

impl VertexPositionNormalTexcoord {
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            texcoord: texcoord.into(),
        }
    }
}

impl PackVertex for VertexPositionNormalTexcoord {
    const ATTRIBUTES: &'static [&'static str] = &["POSITION", "NORMAL", "TEXCOORD_0"];

    fn attribute(&self, index: usize) -> Vec4 {
        match index {
            0 => vec3(self.position),
            1 => vec3(self.normal),
            _ => vec2(self.texcoord),
        }
    }
}

/// Skinned vertex with four joint influences.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexSkinned {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
    pub joints: [u16; 4],
    pub weights: [f32; 4],
}

impl VertexSkinned {
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            texcoord: texcoord.into(),
            joints: [0; 4],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Builder-style joint influences.
    pub fn with_skin(mut self, joints: [u16; 4], weights: [f32; 4]) -> Self {
        self.joints = joints;
        self.weights = weights;
        self
    }
}

impl PackVertex for VertexSkinned {
    const ATTRIBUTES: &'static [&'static str] =
        &["POSITION", "NORMAL", "TEXCOORD_0", "JOINTS_0", "WEIGHTS_0"];

    fn attribute(&self, index: usize) -> Vec4 {
        match index {
            0 => vec3(self.position),
            1 => vec3(self.normal),
            2 => vec2(self.texcoord),
            3 => Vec4::from(self.joints.map(f32::from)),
            _ => Vec4::from(self.weights),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<VertexPosition>(), 12);
        assert_eq!(std::mem::size_of::<VertexPositionNormal>(), 24);
        assert_eq!(std::mem::size_of::<VertexPositionNormalColor>(), 40);
        assert_eq!(std::mem::size_of::<VertexPositionNormalTexcoord>(), 32);
        assert_eq!(std::mem::size_of::<VertexSkinned>(), 56);
    }

    #[test]
    fn test_skinned_attributes() {
        let v = VertexSkinned::new(Vec3::new(1.0, 2.0, 3.0), Vec3::y(), Vec2::new(0.5, 0.25))
            .with_skin([3, 7, 0, 0], [0.75, 0.25, 0.0, 0.0]);

        assert_eq!(v.attribute(0), Vec4::new(1.0, 2.0, 3.0, 0.0));
        assert_eq!(v.attribute(2), Vec4::new(0.5, 0.25, 0.0, 0.0));
        assert_eq!(v.attribute(3), Vec4::new(3.0, 7.0, 0.0, 0.0));
        assert_eq!(v.max_joint_index(), 7);
    }
}
