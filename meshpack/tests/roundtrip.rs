//! Roundtrip: pack → GLB → parse and compare accessor contents.

mod common;

use redlilium_meshpack::encoding::EncodingKind;
use redlilium_meshpack::gltf::{GltfReader, GltfWriter, write_glb};
use redlilium_meshpack::math::{Vec3, Vec4};
use redlilium_meshpack::pack::pack_meshes;
use redlilium_meshpack::settings::PackSettings;
use redlilium_meshpack::source::{SourceMesh, SourcePrimitive};
use redlilium_meshpack::target::PrimitiveMode;
use redlilium_meshpack::vertex::{VertexPositionNormal, VertexPositionNormalColor};
use rstest::rstest;

use common::{init_logging, uv_sphere};

#[rstest]
#[case::interleaved(true)]
#[case::planar(false)]
fn test_sphere_roundtrip(#[case] interleaved: bool) {
    init_logging();
    let settings = PackSettings::default().with_interleaved(interleaved);
    let sphere = uv_sphere(2.0, 16, 8);
    let source_vertices = sphere.vertices().to_vec();
    let source_indices = sphere.indices().to_vec();

    let mesh = SourceMesh::new().with_name("sphere").with_primitive(sphere);
    let model = pack_meshes(&[mesh], &settings).unwrap();
    let glb = write_glb(&model, &settings).expect("failed to export glb");

    let reader = GltfReader::from_slice(&glb).expect("failed to parse exported glb");
    assert_eq!(reader.document().meshes().len(), 1);
    assert_eq!(reader.document().meshes().next().unwrap().name(), Some("sphere"));
    assert_eq!(reader.document().materials().len(), 1);

    let recorded = reader.read_mesh(0).unwrap();
    assert_eq!(recorded.primitives.len(), 1);
    let prim = &recorded.primitives[0];

    let positions = prim.attribute("POSITION").unwrap().as_vector3_array().unwrap();
    let texcoords = prim.attribute("TEXCOORD_0").unwrap().as_vector2_array().unwrap();
    assert_eq!(positions.len(), source_vertices.len());
    for (i, vertex) in source_vertices.iter().enumerate() {
        assert_eq!(positions.get(i), Vec3::from(vertex.position));
        assert_eq!(texcoords.get(i).x, vertex.texcoord[0]);
    }

    let indices = prim.indices.as_ref().unwrap();
    assert_eq!(indices.info().encoding, EncodingKind::UInt8);
    assert_eq!(indices.as_index_array().unwrap().to_vec(), source_indices);
}

#[test]
fn test_position_bounds_written() {
    init_logging();
    let settings = PackSettings::default();
    let model = pack_meshes(&[SourceMesh::new().with_primitive(uv_sphere(1.0, 8, 4))], &settings)
        .unwrap();
    let reader = GltfReader::from_slice(&write_glb(&model, &settings).unwrap()).unwrap();

    let mesh = reader.document().meshes().next().unwrap();
    let primitive = mesh.primitives().next().unwrap();
    let bounds = primitive.bounding_box();
    for axis in 0..3 {
        assert!((bounds.min[axis] + 1.0).abs() < 1e-5);
        assert!((bounds.max[axis] - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_morph_targets_roundtrip() {
    init_logging();
    let v = |x: f32, y: f32| VertexPositionNormal::new(Vec3::new(x, y, 0.0), Vec3::z());
    let mut prim = SourcePrimitive::triangles("blend");
    prim.add_triangle(&v(0.0, 0.0), &v(1.0, 0.0), &v(0.0, 1.0));
    prim.add_morph_target_with(|base| {
        let mut moved = *base;
        moved.position[2] = 0.5;
        moved
    });

    let settings = PackSettings::default();
    let model = pack_meshes(&[SourceMesh::new().with_primitive(prim)], &settings).unwrap();
    let reader = GltfReader::from_slice(&write_glb(&model, &settings).unwrap()).unwrap();

    let gltf_mesh = reader.document().meshes().next().unwrap();
    assert_eq!(gltf_mesh.weights(), Some(&[0.0][..]));

    let recorded = reader.read_mesh(0).unwrap();
    let prim = &recorded.primitives[0];
    assert_eq!(prim.morph_targets.len(), 1);
    let deltas = &prim.morph_targets[0];
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].name(), "POSITION");
    let delta = deltas[0].as_vector3_array().unwrap();
    assert_eq!(delta.get(1), Vec3::new(0.0, 0.0, 0.5));
}

#[test]
fn test_normalized_colors_roundtrip() {
    init_logging();
    let mut prim = SourcePrimitive::points("points");
    prim.add_point(&VertexPositionNormalColor::new(
        Vec3::zeros(),
        Vec3::y(),
        Vec4::new(1.0, 0.5, 0.0, 1.0),
    ));

    let settings = PackSettings::default();
    let model = pack_meshes(&[SourceMesh::new().with_primitive(prim)], &settings).unwrap();
    let reader = GltfReader::from_slice(&write_glb(&model, &settings).unwrap()).unwrap();
    let recorded = reader.read_mesh(0).unwrap();
    let prim = &recorded.primitives[0];

    assert_eq!(prim.mode, PrimitiveMode::Points);
    assert!(prim.indices.is_none());
    let color = prim.attribute("COLOR_0").unwrap();
    assert_eq!(color.info().encoding, EncodingKind::UInt8);
    assert!(color.info().normalized);
    let value = color.as_vector4_array().unwrap().get(0);
    assert_eq!(value.x, 1.0);
    assert!((value.y - 128.0 / 255.0).abs() < 1e-6);
}

#[test]
fn test_unmerged_buffers_get_own_views() {
    init_logging();
    let settings = PackSettings::default().with_merge_buffers(false);
    let meshes = [
        SourceMesh::new().with_primitive(uv_sphere(1.0, 4, 2)),
        SourceMesh::new().with_primitive(uv_sphere(2.0, 4, 2)),
    ];
    let model = pack_meshes(&meshes, &settings).unwrap();
    assert_eq!(model.buffers.len(), 4);

    let mut writer = GltfWriter::new(&settings);
    writer.add_model(&model, |_| None).unwrap();
    assert_eq!(writer.root().buffer_views.len(), 4);

    let reader = GltfReader::from_slice(&writer.into_glb().unwrap()).unwrap();
    assert_eq!(reader.document().scenes().len(), 1);
    assert_eq!(reader.document().nodes().len(), 2);
    let second = reader.read_mesh(1).unwrap();
    let positions = second.primitives[0].attribute("POSITION").unwrap();
    assert_eq!(positions.info().byte_offset % 4, 0);
}
