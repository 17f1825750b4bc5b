//! Shared mesh builders for integration tests.

#![allow(dead_code)]

use std::f32::consts::PI;

use redlilium_meshpack::math::{Vec2, Vec3};
use redlilium_meshpack::source::SourcePrimitive;
use redlilium_meshpack::vertex::{VertexPosition, VertexPositionNormalTexcoord};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// UV sphere. The seam and pole vertices are duplicated per texcoord.
pub fn uv_sphere(
    radius: f32,
    segments: u32,
    rings: u32,
) -> SourcePrimitive<&'static str, VertexPositionNormalTexcoord> {
    let vertex = |seg: u32, ring: u32| {
        let u = seg as f32 / segments as f32;
        let v = ring as f32 / rings as f32;
        let theta = u * 2.0 * PI;
        let phi = v * PI;
        let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
        VertexPositionNormalTexcoord::new(normal * radius, normal, Vec2::new(u, v))
    };

    let mut prim = SourcePrimitive::triangles("sphere");
    for ring in 0..rings {
        for seg in 0..segments {
            let a = vertex(seg, ring);
            let b = vertex(seg + 1, ring);
            let c = vertex(seg + 1, ring + 1);
            let d = vertex(seg, ring + 1);
            prim.add_triangle(&a, &c, &b);
            prim.add_triangle(&a, &d, &c);
        }
    }
    prim
}

/// `count` distinct points along the x axis, each used by one
/// degenerate-free triangle fan around vertex 0.
pub fn fan(count: usize) -> SourcePrimitive<&'static str, VertexPosition> {
    let vertices: Vec<VertexPosition> = (0..count)
        .map(|i| VertexPosition::new(Vec3::new(i as f32, (i % 2) as f32, 0.0)))
        .collect();
    let indices: Vec<u32> = (1..count as u32 - 1).flat_map(|i| [0, i, i + 1]).collect();
    SourcePrimitive::from_indexed("fan", 3, &vertices, &indices)
}
