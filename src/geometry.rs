//! Procedural shape catalog.
//!
//! Pure mapping from a [`Shape`] identifier to a freshly built [`MeshData`]
//! with fixed canonical parameters. No state, no side effects; the viewer
//! normalizes and uploads the result like any loaded asset.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::mesh::MeshData;

/// Built-in parametric shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Cube,
    Sphere,
    Torus,
    Knot,
    Capsule,
    Pyramid,
}

impl Shape {
    /// Build the canonical mesh for this shape.
    pub fn mesh(&self) -> MeshData {
        match self {
            Shape::Cube => cube(2.0),
            Shape::Sphere => sphere(1.5, 16, 32),
            Shape::Torus => torus(1.2, 0.4, 48, 24),
            Shape::Knot => torus_knot(1.0, 0.3, 2, 3, 128, 16),
            Shape::Capsule => capsule(1.0, 2.0, 16, 32),
            Shape::Pyramid => pyramid(2.0, 2.0),
        }
    }
}

/// Axis-aligned cube centered at the origin, per-face normals and UVs.
pub fn cube(side: f32) -> MeshData {
    let h = side / 2.0;
    let mut mesh = MeshData::with_capacity("cube", 24, 36);

    let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
        (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()),
        (-Vector3::unit_x(), Vector3::unit_y(), -Vector3::unit_z()),
        (Vector3::unit_y(), Vector3::unit_z(), Vector3::unit_x()),
        (-Vector3::unit_y(), Vector3::unit_z(), -Vector3::unit_x()),
        (Vector3::unit_z(), Vector3::unit_y(), -Vector3::unit_x()),
        (-Vector3::unit_z(), Vector3::unit_y(), Vector3::unit_x()),
    ];

    for (normal, up, right) in faces {
        let origin = (normal - right - up) * h;
        let corners = [
            origin,
            origin + right * side,
            origin + right * side + up * side,
            origin + up * side,
        ];
        let uv = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        let base = mesh.vertex_count() as u32;
        for (corner, uv) in corners.iter().zip(uv.iter()) {
            mesh.positions.push([corner.x, corner.y, corner.z]);
            mesh.normals.push([normal.x, normal.y, normal.z]);
            mesh.uvs.push(*uv);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}

/// UV sphere centered at the origin.
pub fn sphere(radius: f32, rings: u32, segments: u32) -> MeshData {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = MeshData::with_capacity(
        "sphere",
        ((rings + 1) * (segments + 1)) as usize,
        (rings * segments * 6) as usize,
    );

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let theta = v * PI;
        let y = theta.cos() * radius;
        let r = theta.sin() * radius;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * TAU;
            let x = r * phi.cos();
            let z = r * phi.sin();
            let normal = unit_or_zero(Vector3::new(x, y, z));
            mesh.positions.push([x, y, z]);
            mesh.normals.push([normal.x, normal.y, normal.z]);
            mesh.uvs.push([u, v]);
        }
    }
    stitch_rings(&mut mesh, rings, segments);

    mesh
}

/// Torus in the XZ plane centered at the origin.
pub fn torus(major_radius: f32, minor_radius: f32, major_segments: u32, minor_segments: u32) -> MeshData {
    let major_segments = major_segments.max(3);
    let minor_segments = minor_segments.max(3);
    let mut mesh = MeshData::with_capacity(
        "torus",
        ((major_segments + 1) * (minor_segments + 1)) as usize,
        (major_segments * minor_segments * 6) as usize,
    );

    for i in 0..=major_segments {
        let u = i as f32 / major_segments as f32;
        let phi = u * TAU;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let center = Vector3::new(major_radius * cos_phi, 0.0, major_radius * sin_phi);

        for j in 0..=minor_segments {
            let v = j as f32 / minor_segments as f32;
            let theta = v * TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let offset = Vector3::new(
                minor_radius * cos_theta * cos_phi,
                minor_radius * sin_theta,
                minor_radius * cos_theta * sin_phi,
            );
            let pos = center + offset;
            let normal = unit_or_zero(offset);
            mesh.positions.push([pos.x, pos.y, pos.z]);
            mesh.normals.push([normal.x, normal.y, normal.z]);
            mesh.uvs.push([u, v]);
        }
    }
    stitch_rings(&mut mesh, major_segments, minor_segments);

    mesh
}

/// (p, q) torus knot swept with a circular tube.
pub fn torus_knot(
    radius: f32,
    tube_radius: f32,
    p: u32,
    q: u32,
    tubular_segments: u32,
    radial_segments: u32,
) -> MeshData {
    let tubular_segments = tubular_segments.max(3);
    let radial_segments = radial_segments.max(3);
    let mut mesh = MeshData::with_capacity(
        "knot",
        ((tubular_segments + 1) * (radial_segments + 1)) as usize,
        (tubular_segments * radial_segments * 6) as usize,
    );

    let curve = |t: f32| -> Vector3<f32> {
        let (su, cu) = t.sin_cos();
        let qu_over_p = q as f32 / p as f32 * t;
        let (sq, cq) = qu_over_p.sin_cos();
        Vector3::new(
            radius * (2.0 + cq) * 0.5 * cu,
            radius * (2.0 + cq) * 0.5 * su,
            radius * sq * 0.5,
        )
    };

    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32;
        let t = u * p as f32 * TAU;
        let p1 = curve(t);
        let p2 = curve(t + 0.01);

        // Frenet-ish frame along the curve
        let tangent = unit_or_zero(p2 - p1);
        let mut normal = unit_or_zero(p2 + p1);
        let binormal = unit_or_zero(tangent.cross(normal));
        normal = unit_or_zero(binormal.cross(tangent));

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32;
            let theta = v * TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let offset = normal * (-tube_radius * cos_theta) + binormal * (tube_radius * sin_theta);
            let pos = p1 + offset;
            let n = unit_or_zero(offset);
            mesh.positions.push([pos.x, pos.y, pos.z]);
            mesh.normals.push([n.x, n.y, n.z]);
            mesh.uvs.push([u, v]);
        }
    }
    stitch_rings(&mut mesh, tubular_segments, radial_segments);

    mesh
}

/// Capsule along the Y axis: a cylinder of `mid_height` with hemispherical
/// caps of `radius`, centered at the origin.
pub fn capsule(radius: f32, mid_height: f32, cap_rings: u32, segments: u32) -> MeshData {
    let cap_rings = cap_rings.max(1);
    let segments = segments.max(3);
    let half = mid_height / 2.0;
    let rows = cap_rings * 2 + 1;
    let mut mesh = MeshData::with_capacity(
        "capsule",
        ((rows + 1) * (segments + 1)) as usize,
        (rows * segments * 6) as usize,
    );

    // Profile sweep: top pole to equator, then (after the straight side)
    // bottom equator to pole. The two equator rows share ring radius, so
    // stitching consecutive rows yields the cylinder side for free.
    let mut profile = Vec::with_capacity((rows + 1) as usize);
    for i in 0..=cap_rings {
        let theta = i as f32 / cap_rings as f32 * (PI / 2.0);
        profile.push((half + radius * theta.cos(), theta));
    }
    for i in 0..=cap_rings {
        let theta = PI / 2.0 + i as f32 / cap_rings as f32 * (PI / 2.0);
        profile.push((-half + radius * theta.cos(), theta));
    }

    for (row, (y, theta)) in profile.iter().enumerate() {
        let ring_r = radius * theta.sin();
        let v = row as f32 / rows as f32;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let phi = u * TAU;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vector3::new(theta.sin() * cos_phi, theta.cos(), theta.sin() * sin_phi);
            mesh.positions
                .push([ring_r * cos_phi, *y, ring_r * sin_phi]);
            mesh.normals.push([normal.x, normal.y, normal.z]);
            mesh.uvs.push([u, v]);
        }
    }
    stitch_rings(&mut mesh, rows, segments);

    mesh
}

/// Square pyramid: base `side` x `side`, apex `height` above the base,
/// vertically centered at the origin. Flat-shaded faces.
pub fn pyramid(side: f32, height: f32) -> MeshData {
    let h = side / 2.0;
    let top = height / 2.0;
    let bottom = -top;
    let apex = Vector3::new(0.0, top, 0.0);
    let corners = [
        Vector3::new(-h, bottom, -h),
        Vector3::new(h, bottom, -h),
        Vector3::new(h, bottom, h),
        Vector3::new(-h, bottom, h),
    ];

    let mut mesh = MeshData::with_capacity("pyramid", 16, 18);

    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let normal = unit_or_zero((b - a).cross(apex - a));
        let base = mesh.vertex_count() as u32;
        for (pos, uv) in [(a, [0.0, 1.0]), (b, [1.0, 1.0]), (apex, [0.5, 0.0])] {
            mesh.positions.push([pos.x, pos.y, pos.z]);
            mesh.normals.push([normal.x, normal.y, normal.z]);
            mesh.uvs.push(uv);
        }
        mesh.indices.extend_from_slice(&[base, base + 2, base + 1]);
    }

    // base quad, facing down
    let base = mesh.vertex_count() as u32;
    let uv = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (corner, uv) in corners.iter().zip(uv.iter()) {
        mesh.positions.push([corner.x, corner.y, corner.z]);
        mesh.normals.push([0.0, -1.0, 0.0]);
        mesh.uvs.push(*uv);
    }
    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);

    mesh
}

fn unit_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > f32::EPSILON {
        v.normalize()
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    }
}

/// Stitch a (rows x segments) vertex grid into triangle pairs.
fn stitch_rings(mesh: &mut MeshData, rows: u32, segments: u32) {
    for row in 0..rows {
        for seg in 0..segments {
            let a = row * (segments + 1) + seg;
            let b = a + segments + 1;
            mesh.indices
                .extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_expected_counts_and_extent() {
        let mesh = Shape::Cube.mesh();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let aabb = mesh.aabb().unwrap();
        assert_eq!(aabb.max_extent(), 2.0);
        assert_eq!(aabb.center(), cgmath::Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn sphere_radius_is_canonical() {
        let mesh = Shape::Sphere.mesh();
        let aabb = mesh.aabb().unwrap();
        assert!((aabb.max_extent() - 3.0).abs() < 1e-4);
        for p in &mesh.positions {
            let r = cgmath::Vector3::from(*p).magnitude();
            assert!(r <= 1.5 + 1e-4);
        }
    }

    #[test]
    fn normals_are_unit_length() {
        for shape in [Shape::Sphere, Shape::Torus, Shape::Knot, Shape::Capsule] {
            let mesh = shape.mesh();
            for n in &mesh.normals {
                let len = cgmath::Vector3::from(*n).magnitude();
                assert!((len - 1.0).abs() < 1e-3, "{:?}: |n| = {}", shape, len);
            }
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        for shape in [
            Shape::Cube,
            Shape::Sphere,
            Shape::Torus,
            Shape::Knot,
            Shape::Capsule,
            Shape::Pyramid,
        ] {
            let mesh = shape.mesh();
            assert!(!mesh.is_empty(), "{:?} produced an empty mesh", shape);
            assert_eq!(mesh.indices.len() % 3, 0);
            let max = *mesh.indices.iter().max().unwrap();
            assert!((max as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn capsule_total_height_is_mid_plus_caps() {
        let mesh = Shape::Capsule.mesh();
        let aabb = mesh.aabb().unwrap();
        // cylinder of height 2 plus two caps of radius 1
        assert!((aabb.extents().y - 4.0).abs() < 1e-4);
        assert!((aabb.extents().x - 2.0).abs() < 1e-4);
    }
}
