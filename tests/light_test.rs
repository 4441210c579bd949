use cgmath::{Point3, Vector3, Vector4};

use kiln::data_structures::light::{
    light_radius, lissajous, luminous_intensity, LightRig, PointLight, AMBIENT_INTENSITY,
};

#[test]
fn lissajous_starts_at_the_curve_origin() {
    // sin(0) = 0 and cos(0) = 1 regardless of the curve parameters.
    for p in [
        Vector4::new(0.0, 1.0, 0.0, 0.0),
        Vector4::new(0.34, 0.29, 0.12, 0.5),
        Vector4::new(-1.7, 0.4, 1.9, -0.2),
    ] {
        let at_zero = lissajous(p, 0.0);
        assert_eq!(at_zero, Vector3::new(0.0, 1.0, 0.0));
    }
}

#[test]
fn white_has_unit_luminous_intensity() {
    let i = luminous_intensity(Vector3::new(1.0, 1.0, 1.0));
    assert!((i - 1.0).abs() < 1e-6);
}

#[test]
fn radius_follows_inverse_square_cutoff() {
    // Intensity 10 against the 0.1 cutoff reaches sqrt(100) = 10 units.
    let r = light_radius(Vector3::new(10.0, 10.0, 10.0));
    assert!((r - 10.0).abs() < 1e-4);
}

#[test]
fn raw_light_carries_radius_and_attenuated_colour() {
    let light = PointLight::new(
        Vector3::new(1.0, 2.0, 3.0),
        Vector4::new(40.0, 40.0, 40.0, AMBIENT_INTENSITY),
        Vector4::new(0.0, 0.0, 0.0, 0.0),
    );
    let raw = light.to_raw(0.5);
    assert_eq!(raw.position_radius[0], 1.0);
    assert_eq!(raw.position_radius[3], light.radius);
    assert_eq!(raw.colour[0], 20.0);
    assert_eq!(raw.colour[3], AMBIENT_INTENSITY);
}

fn test_rig() -> LightRig {
    let key = PointLight::new(
        Vector3::new(0.0, 0.0, 0.0),
        Vector4::new(100.0, 100.0, 100.0, AMBIENT_INTENSITY),
        Vector4::new(0.0, 1.0, 0.0, 0.0),
    );
    let fill = PointLight::new(
        Vector3::new(0.0, 0.0, 0.0),
        Vector4::new(25.0, 0.0, 0.0, AMBIENT_INTENSITY),
        Vector4::new(1.0, 1.0, 1.0, 1.0),
    );
    LightRig::new(
        vec![key, fill],
        Vector3::new(13.0, 2.0, 13.0),
        Vector3::new(0.0, 3.0, 0.0),
        Some(Vector3::new(-3.0, 2.0, 0.0)),
    )
}

#[test]
fn anchored_light_moves_on_the_raw_curve() {
    let rig = test_rig();
    // At t = 0 the curve evaluates to (0, 1, 0): the key light sits one unit
    // above its anchor, the fill light one curve-scale unit above the offset.
    assert_eq!(rig.lights[0].position, Vector3::new(-3.0, 3.0, 0.0));
    assert_eq!(rig.lights[1].position, Vector3::new(0.0, 5.0, 0.0));
}

#[test]
fn advance_moves_the_lights() {
    let mut rig = test_rig();
    let before = rig.lights[1].position;
    rig.advance(0.5);
    assert!((rig.time() - 0.5).abs() < 1e-6);
    assert_ne!(rig.lights[1].position, before);
}

#[test]
fn partition_splits_lights_around_the_eye() {
    let rig = test_rig();
    // Next to the key light, inside its volume.
    let (inside, outside) = rig.partition(Point3::new(-3.0, 3.5, 0.0));
    assert!(inside.contains(&0));
    assert!(!outside.contains(&0));

    // Far away from everything.
    let (inside, outside) = rig.partition(Point3::new(500.0, 0.0, 0.0));
    assert!(inside.is_empty());
    assert_eq!(outside, vec![0, 1]);
}
