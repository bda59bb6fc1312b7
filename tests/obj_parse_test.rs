//! End-to-end CPU path: OBJ text into a node graph, normalized and ready
//! for upload.

use cgmath::InnerSpace;
use verseview::{
    data_structures::node::TARGET_EXTENT,
    resources::obj::parse_obj,
};

const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 2.0 0.0 0.0
v 0.0 2.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

const TWO_OBJECTS_OBJ: &str = "\
o left
v -3.0 0.0 0.0
v -1.0 0.0 0.0
v -2.0 1.0 0.0
f 1 2 3
o right
v 1.0 0.0 0.0
v 3.0 0.0 0.0
v 2.0 1.0 0.0
f 4 5 6
";

const QUAD_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";

#[test]
fn parses_a_single_mesh() {
    let graph = parse_obj(TRIANGLE_OBJ, "triangle.obj").unwrap();
    assert_eq!(graph.drawable_count(), 1);

    let mesh = graph.mesh.as_ref().unwrap();
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.triangle_count(), 1);
}

#[test]
fn flips_texture_coordinates_vertically() {
    let graph = parse_obj(TRIANGLE_OBJ, "triangle.obj").unwrap();
    let mesh = graph.mesh.as_ref().unwrap();
    // OBJ vt origin is bottom-left, sampling origin is top-left
    assert_eq!(mesh.uvs[0], [0.0, 1.0]);
    assert_eq!(mesh.uvs[2], [0.0, 0.0]);
}

#[test]
fn multiple_objects_become_sibling_drawables() {
    let graph = parse_obj(TWO_OBJECTS_OBJ, "pair.obj").unwrap();
    assert!(graph.mesh.is_none());
    assert_eq!(graph.children.len(), 2);
    assert_eq!(graph.drawable_count(), 2);
}

#[test]
fn quads_are_triangulated() {
    let graph = parse_obj(QUAD_OBJ, "quad.obj").unwrap();
    let mesh = graph.mesh.as_ref().unwrap();
    assert_eq!(mesh.triangle_count(), 2);
}

#[test]
fn garbage_and_empty_inputs_fail() {
    assert!(parse_obj("", "empty.obj").is_err());
    // comments and stray vertices without faces carry no geometry
    assert!(parse_obj("# nothing\nv 0 0 0\n", "no-faces.obj").is_err());
}

#[test]
fn parsed_graph_normalizes_like_any_other() {
    let graph = parse_obj(TWO_OBJECTS_OBJ, "pair.obj").unwrap();
    let normalized = graph.normalized(TARGET_EXTENT);

    let aabb = normalized.bounds().unwrap();
    assert!(aabb.center().magnitude() < 1e-4);
    assert!((aabb.max_extent() - TARGET_EXTENT).abs() < 1e-4);
    assert_eq!(normalized.drawable_count(), 2);
}
