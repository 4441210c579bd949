use cgmath::{InnerSpace, Vector3};

use kiln::data_structures::geometry;

fn v3(a: [f32; 3]) -> Vector3<f32> {
    Vector3::new(a[0], a[1], a[2])
}

#[test]
fn quad_is_two_clockwise_triangles() {
    let quad = geometry::quad_normal_tangent_tex();
    assert_eq!(quad.vertices.len(), 4);
    assert_eq!(quad.indices, vec![0, 1, 2, 2, 3, 0]);
    assert_eq!(quad.triangle_count(), 2);
}

#[test]
fn cube_has_unshared_faces() {
    let cube = geometry::cube_normal_tangent_tex();
    assert_eq!(cube.vertices.len(), 24);
    assert_eq!(cube.indices.len(), 36);
    assert_eq!(cube.triangle_count(), 12);

    // Clockwise winding seen from outside: the geometric triangle normal
    // points against the stored surface normal.
    for tri in cube.indices.chunks_exact(3) {
        let a = v3(cube.vertices[tri[0] as usize].position);
        let b = v3(cube.vertices[tri[1] as usize].position);
        let c = v3(cube.vertices[tri[2] as usize].position);
        let n = v3(cube.vertices[tri[0] as usize].normal);
        let winding = (b - a).cross(c - a);
        assert!(winding.dot(n) < 0.0, "face wound the wrong way: {:?}", tri);
    }
}

#[test]
fn cube_adjacency_covers_twelve_triangles() {
    let cube = geometry::cube_adjacency();
    assert_eq!(cube.vertices.len(), 8);
    // 12 triangles at 6 indices each: the triangle in slots 0/2/4, the
    // opposing vertices of the adjacent triangles in slots 1/3/5.
    assert_eq!(cube.indices.len(), 72);
    assert!(cube.indices.iter().all(|&i| (i as usize) < 8));

    // Every triangle edge is some other triangle's edge in reverse, which is
    // what makes silhouette extraction watertight.
    let mut edges = std::collections::HashMap::new();
    for tri in cube.indices.chunks_exact(6) {
        for (s, e) in [(tri[0], tri[2]), (tri[2], tri[4]), (tri[4], tri[0])] {
            *edges.entry((s, e)).or_insert(0) += 1;
        }
    }
    for ((s, e), count) in &edges {
        assert_eq!(*count, 1);
        assert_eq!(edges.get(&(*e, *s)), Some(&1), "unmatched edge {}->{}", s, e);
    }
}

#[test]
fn tetrahedron_normals_are_unit_and_outward() {
    let tetra = geometry::tetrahedron();
    assert_eq!(tetra.vertices.len(), 12);
    assert_eq!(tetra.triangle_count(), 4);

    let centroid = tetra
        .vertices
        .iter()
        .map(|v| v3(v.position))
        .sum::<Vector3<f32>>()
        / tetra.vertices.len() as f32;

    for face in tetra.vertices.chunks_exact(3) {
        let n = v3(face[0].normal);
        assert!((n.magnitude() - 1.0).abs() < 1e-5);
        let center = (v3(face[0].position) + v3(face[1].position) + v3(face[2].position)) / 3.0;
        assert!(n.dot(center - centroid) > 0.0, "normal points inward");
    }
}

#[test]
fn icosahedron_is_a_unit_sphere_proxy() {
    let ico = geometry::icosahedron();
    assert_eq!(ico.vertices.len(), 12);
    assert_eq!(ico.indices.len(), 60);
    assert_eq!(ico.triangle_count(), 20);
    for vertex in &ico.vertices {
        let r = v3(vertex.position).magnitude();
        assert!((r - 1.0).abs() < 1e-3, "vertex off the unit sphere: {}", r);
    }
}
