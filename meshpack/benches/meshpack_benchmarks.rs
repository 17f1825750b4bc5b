use criterion::{Criterion, black_box, criterion_group, criterion_main};

use redlilium_meshpack::math::{Vec2, Vec3};
use redlilium_meshpack::pack::{merge_buffers, pack_mesh, pack_meshes};
use redlilium_meshpack::settings::PackSettings;
use redlilium_meshpack::source::{SourceMesh, SourcePrimitive};
use redlilium_meshpack::vertex::VertexPositionNormalTexcoord;
use redlilium_meshpack::weld::{BytewiseComparer, ValueListSet};

type Vertex = VertexPositionNormalTexcoord;

fn sphere_vertices(segments: u32, rings: u32) -> Vec<[Vertex; 3]> {
    let vertex = |seg: u32, ring: u32| {
        let u = seg as f32 / segments as f32;
        let v = ring as f32 / rings as f32;
        let theta = u * std::f32::consts::TAU;
        let phi = v * std::f32::consts::PI;
        let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
        Vertex::new(n, n, Vec2::new(u, v))
    };
    let mut triangles = Vec::new();
    for ring in 0..rings {
        for seg in 0..segments {
            let (a, b) = (vertex(seg, ring), vertex(seg + 1, ring));
            let (c, d) = (vertex(seg + 1, ring + 1), vertex(seg, ring + 1));
            triangles.push([a, c, b]);
            triangles.push([a, d, c]);
        }
    }
    triangles
}

fn sphere(segments: u32, rings: u32) -> SourceMesh<(), Vertex> {
    let mut prim = SourcePrimitive::triangles(());
    for [a, b, c] in sphere_vertices(segments, rings) {
        prim.add_triangle(&a, &b, &c);
    }
    SourceMesh::new().with_primitive(prim)
}

// ---------------------------------------------------------------------------
// Welding
// ---------------------------------------------------------------------------

fn bench_weld_sphere(c: &mut Criterion) {
    let triangles = sphere_vertices(64, 32);
    c.bench_function("weld_sphere_64x32", |b| {
        b.iter(|| {
            let mut set = ValueListSet::new(0, BytewiseComparer);
            for triangle in &triangles {
                for vertex in triangle {
                    set.use_value(black_box(vertex));
                }
            }
            black_box(set.len())
        });
    });
}

fn bench_weld_presized(c: &mut Criterion) {
    let triangles = sphere_vertices(64, 32);
    c.bench_function("weld_sphere_64x32_presized", |b| {
        b.iter(|| {
            let mut set = ValueListSet::<Vertex, BytewiseComparer>::with_capacity(65 * 33);
            for triangle in &triangles {
                for vertex in triangle {
                    set.use_value(black_box(vertex));
                }
            }
            black_box(set.len())
        });
    });
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

fn bench_pack_interleaved(c: &mut Criterion) {
    let mesh = sphere(128, 64);
    let settings = PackSettings::default();
    c.bench_function("pack_sphere_128x64_interleaved", |b| {
        b.iter(|| pack_mesh(0, black_box(&mesh), &settings));
    });
}

fn bench_pack_planar(c: &mut Criterion) {
    let mesh = sphere(128, 64);
    let settings = PackSettings::default().with_interleaved(false);
    c.bench_function("pack_sphere_128x64_planar", |b| {
        b.iter(|| pack_mesh(0, black_box(&mesh), &settings));
    });
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

fn bench_merge_many_meshes(c: &mut Criterion) {
    let meshes: Vec<_> = (0..64).map(|_| sphere(16, 8)).collect();
    let settings = PackSettings::default().with_merge_buffers(false);
    let packed = pack_meshes(&meshes, &settings).map(|model| model.meshes);
    let Ok(packed) = packed else {
        return;
    };
    c.bench_function("merge_64_spheres", |b| {
        b.iter_batched(
            || packed.clone(),
            |mut meshes| merge_buffers(&mut meshes, true),
            criterion::BatchSize::SmallInput,
        );
    });
}

#[cfg(feature = "gltf")]
fn bench_write_glb(c: &mut Criterion) {
    use redlilium_meshpack::gltf::GltfWriter;

    let settings = PackSettings::default();
    let Ok(model) = pack_meshes(&[sphere(64, 32)], &settings) else {
        return;
    };
    c.bench_function("write_glb_sphere_64x32", |b| {
        b.iter(|| {
            let mut writer = GltfWriter::new(&settings);
            writer.add_model(&model, |_| None).map(|_| writer.into_glb())
        });
    });
}

#[cfg(not(feature = "gltf"))]
fn bench_write_glb(_c: &mut Criterion) {}

criterion_group!(
    benches,
    bench_weld_sphere,
    bench_weld_presized,
    bench_pack_interleaved,
    bench_pack_planar,
    bench_merge_many_meshes,
    bench_write_glb,
);
criterion_main!(benches);
