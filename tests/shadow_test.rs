use cgmath::{Matrix4, SquareMatrix, Vector3};

use kiln::data_structures::geometry::cube_adjacency;
use kiln::shadow::extrude_silhouette;

#[test]
fn overhead_light_extrudes_the_top_silhouette() {
    // A light straight above a unit cube: only the two top triangles face
    // it, their four outer edges form the silhouette. That makes
    // 4 edges * 6 + 2 front cap triangles * 3 + 2 back cap triangles * 3
    // = 36 volume vertices.
    let cube = cube_adjacency();
    let mut out = Vec::new();
    extrude_silhouette(
        &cube,
        &Matrix4::identity(),
        Vector3::new(0.0, 5.0, 0.0),
        &mut out,
    );

    assert_eq!(out.len(), 36);

    let far = out.iter().filter(|v| v.position[3] == 0.0).count();
    let near = out.iter().filter(|v| v.position[3] == 1.0).count();
    assert_eq!(far, 18);
    assert_eq!(near, 18);

    // Near vertices start on the top face and are nudged down, away from
    // the light.
    for v in out.iter().filter(|v| v.position[3] == 1.0) {
        assert!(v.position[1] < 0.5);
        assert!(v.position[1] > 0.49);
    }

    // Far vertices are directions pointing away from the light.
    for v in out.iter().filter(|v| v.position[3] == 0.0) {
        assert!(v.position[1] < 0.0);
    }
}

#[test]
fn volume_grows_with_instances() {
    let cube = cube_adjacency();
    let light = Vector3::new(3.0, 10.0, -2.0);
    let mut single = Vec::new();
    extrude_silhouette(&cube, &Matrix4::identity(), light, &mut single);

    let mut both = Vec::new();
    extrude_silhouette(&cube, &Matrix4::identity(), light, &mut both);
    extrude_silhouette(
        &cube,
        &Matrix4::from_translation(Vector3::new(4.0, 0.0, 0.0)),
        light,
        &mut both,
    );

    assert!(!single.is_empty());
    assert!(both.len() > single.len());
    for (a, b) in both.iter().zip(single.iter()) {
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn every_vertex_is_near_or_far() {
    let cube = cube_adjacency();
    let mut out = Vec::new();
    extrude_silhouette(
        &cube,
        &Matrix4::from_scale(2.0),
        Vector3::new(1.0, 8.0, 1.0),
        &mut out,
    );
    assert!(out.len() % 3 == 0);
    for v in &out {
        assert!(v.position[3] == 0.0 || v.position[3] == 1.0);
    }
}
