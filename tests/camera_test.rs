use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use instant::Duration;

use kiln::camera::{Camera, CameraController, CameraUniform, Projection};

fn approx_identity(m: Matrix4<f32>, tolerance: f32) {
    let id = Matrix4::<f32>::identity();
    for col in 0..4 {
        for row in 0..4 {
            assert!(
                (m[col][row] - id[col][row]).abs() < tolerance,
                "element [{}][{}] = {} is off identity",
                col,
                row,
                m[col][row]
            );
        }
    }
}

#[test]
fn inverse_view_proj_inverts_view_proj() {
    let camera = Camera::new(Point3::new(3.0, 4.0, -5.0), Deg(-70.0), Deg(-15.0));
    let projection = Projection::new(1280, 720, Deg(45.0), 0.1, 100.0);
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, &projection);

    let vp = Matrix4::from(uniform.view_proj);
    let inv = Matrix4::from(uniform.inv_view_proj);
    approx_identity(vp * inv, 1e-4);
}

#[test]
fn uniform_carries_position_and_planes() {
    let camera = Camera::new(Point3::new(1.0, 2.0, 3.0), Deg(0.0), Deg(0.0));
    let projection = Projection::new(800, 600, Deg(60.0), 0.5, 250.0);
    let mut uniform = CameraUniform::new();
    uniform.update_view_proj(&camera, &projection);

    assert_eq!(uniform.view_position, [1.0, 2.0, 3.0, 1.0]);
    assert_eq!(uniform.planes, [0.5, 250.0, 800.0 / 600.0, 0.0]);
}

#[test]
fn resize_only_touches_aspect() {
    let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
    projection.resize(1920, 1080);
    assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    assert_eq!(projection.znear, 0.1);
    assert_eq!(projection.zfar, 100.0);
}

#[test]
fn direction_is_unit_length() {
    let camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(123.0), Deg(-42.0));
    let dir = camera.direction();
    assert!((dir.magnitude() - 1.0).abs() < 1e-6);

    let level = Camera::new(Point3::new(0.0, 0.0, 0.0), Deg(0.0), Deg(0.0));
    let dir = level.direction();
    assert!((dir - Vector3::unit_x()).magnitude() < 1e-6);
}

#[test]
fn controller_clamps_pitch() {
    let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
    let mut controller = CameraController::new(4.0, 1000.0);
    for _ in 0..100 {
        controller.handle_mouse(0.0, -500.0);
        controller.update(&mut camera, Duration::from_millis(16));
    }
    assert!(camera.pitch.0 < std::f32::consts::FRAC_PI_2);
    assert!(camera.pitch.0 > 1.5);
}
