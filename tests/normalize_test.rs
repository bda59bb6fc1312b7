use cgmath::{InnerSpace, Quaternion, Rotation3, Vector3};
use verseview::{
    Shape,
    data_structures::{
        instance::Instance,
        node::{NodeData, TARGET_EXTENT},
    },
};

fn offset_cube(position: [f32; 3], scale: f32) -> NodeData {
    let mut node = NodeData::from_mesh(Shape::Cube.mesh());
    node.transform = Instance {
        position: position.into(),
        scale: Vector3::new(scale, scale, scale),
        ..Instance::default()
    };
    node
}

#[test]
fn normalization_centers_and_scales_a_single_mesh() {
    let node = offset_cube([10.0, -3.0, 5.0], 2.0);
    let normalized = node.normalized(TARGET_EXTENT);

    let aabb = normalized.bounds().expect("cube graph has bounds");
    let center = aabb.center();
    assert!(center.magnitude() < 1e-4, "center is {:?}", center);
    assert!((aabb.max_extent() - TARGET_EXTENT).abs() < 1e-4);
}

#[test]
fn normalization_scales_uniformly() {
    // An elongated arrangement: two cubes far apart along X. Uniform scaling
    // must not squash the Y/Z proportions.
    let mut root = NodeData::container();
    root.children.push(offset_cube([-10.0, 0.0, 0.0], 1.0));
    root.children.push(offset_cube([10.0, 0.0, 0.0], 1.0));

    let raw = root.bounds().unwrap();
    let ratio = raw.extents().y / raw.extents().x;

    let normalized = root.normalized(TARGET_EXTENT);
    let aabb = normalized.bounds().unwrap();
    assert!((aabb.max_extent() - TARGET_EXTENT).abs() < 1e-4);
    let scaled_ratio = aabb.extents().y / aabb.extents().x;
    assert!((ratio - scaled_ratio).abs() < 1e-4);
}

#[test]
fn normalization_handles_nested_transforms() {
    let mut inner = offset_cube([0.0, 4.0, 0.0], 0.5);
    inner.transform.rotation = Quaternion::from_angle_z(cgmath::Deg(45.0));

    let mut middle = NodeData::container();
    middle.transform = Instance {
        position: Vector3::new(-2.0, 0.0, 7.0),
        scale: Vector3::new(3.0, 3.0, 3.0),
        ..Instance::default()
    };
    middle.children.push(inner);

    let mut root = NodeData::container();
    root.children.push(middle);
    assert_eq!(root.drawable_count(), 1);

    let normalized = root.normalized(TARGET_EXTENT);
    let aabb = normalized.bounds().unwrap();
    assert!(aabb.center().magnitude() < 1e-3);
    assert!((aabb.max_extent() - TARGET_EXTENT).abs() < 1e-3);
    // the wrapper adds structure, not geometry
    assert_eq!(normalized.drawable_count(), 1);
}

#[test]
fn degenerate_graphs_pass_through_unscaled() {
    let empty = NodeData::container();
    let normalized = empty.normalized(TARGET_EXTENT);
    assert!(normalized.bounds().is_none());
    assert_eq!(normalized.transform, Instance::default());

    // a single point has zero extent and must not divide by it
    let mut point_mesh = verseview::data_structures::mesh::MeshData::with_capacity("point", 1, 3);
    point_mesh.positions.push([1.0, 2.0, 3.0]);
    point_mesh.indices.extend_from_slice(&[0, 0, 0]);
    let node = NodeData::from_mesh(point_mesh);
    let normalized = node.normalized(TARGET_EXTENT);
    assert_eq!(normalized.transform, Instance::default());
}

#[test]
fn every_shape_normalizes_to_the_target_extent() {
    for shape in [
        Shape::Cube,
        Shape::Sphere,
        Shape::Torus,
        Shape::Knot,
        Shape::Capsule,
        Shape::Pyramid,
    ] {
        let normalized = NodeData::from_mesh(shape.mesh()).normalized(TARGET_EXTENT);
        let aabb = normalized.bounds().unwrap();
        assert!(
            (aabb.max_extent() - TARGET_EXTENT).abs() < 1e-3,
            "{:?} extent {}",
            shape,
            aabb.max_extent()
        );
        assert!(aabb.center().magnitude() < 1e-3, "{:?} off-center", shape);
    }
}
