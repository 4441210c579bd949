use cgmath::{Deg, Quaternion, Rotation3, Vector3};

use kiln::data_structures::instance::{self, Instance};

#[test]
fn default_instance_is_identity() {
    let raw = Instance::default().to_raw();
    let expected = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    assert_eq!(raw.model, expected);
    assert_eq!(raw.normal, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
}

#[test]
fn translation_lands_in_the_last_column() {
    let raw = Instance::from(Vector3::new(3.0, -1.0, 7.5)).to_raw();
    // cgmath matrices are column major, the translation sits in column 3.
    assert_eq!(raw.model[3], [3.0, -1.0, 7.5, 1.0]);
    assert_eq!(raw.model[0], [1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn normal_matrix_ignores_scale() {
    let rotation = Quaternion::from_axis_angle(Vector3::unit_y(), Deg(90.0));
    let scaled = Instance {
        position: Vector3::new(0.0, 0.0, 0.0),
        rotation,
        scale: Vector3::new(5.0, 0.25, 5.0),
    }
    .to_raw();
    let unscaled = Instance {
        position: Vector3::new(0.0, 0.0, 0.0),
        rotation,
        scale: Vector3::new(1.0, 1.0, 1.0),
    }
    .to_raw();

    assert_eq!(scaled.normal, unscaled.normal);

    // Columns of the normal matrix stay unit length.
    for col in scaled.normal {
        let len_sq: f32 = col.iter().map(|c| c * c).sum();
        assert!((len_sq - 1.0).abs() < 1e-5);
    }
}

#[test]
fn slice_conversion_preserves_order() {
    let instances = vec![
        Instance::from(Vector3::new(1.0, 0.0, 0.0)),
        Instance::from(Vector3::new(2.0, 0.0, 0.0)),
        Instance::from(Vector3::new(3.0, 0.0, 0.0)),
    ];
    let raw = instance::to_raw(&instances);
    assert_eq!(raw.len(), 3);
    for (i, r) in raw.iter().enumerate() {
        assert_eq!(r.model[3][0], (i + 1) as f32);
    }
}
