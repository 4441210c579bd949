//! The WGSL side of every pipeline assumes a fixed byte layout for the Pod
//! types we upload. These tests pin those sizes so a struct edit that shifts
//! an offset fails loudly instead of rendering garbage.

use std::mem::size_of;

use kiln::camera::CameraUniform;
use kiln::data_structures::geometry::{VertexP, VertexPN, VertexPNTT};
use kiln::data_structures::instance::InstanceRaw;
use kiln::data_structures::light::LightRaw;
use kiln::pipelines::flock::{FlockMember, SimParams};
use kiln::pipelines::point::PointUniform;
use kiln::pipelines::triangle::TriangleVertex;
use kiln::shadow::VolumeVertex;

#[test]
fn vertex_strides() {
    assert_eq!(size_of::<VertexP>(), 12);
    assert_eq!(size_of::<VertexPN>(), 24);
    assert_eq!(size_of::<VertexPNTT>(), 44);
    assert_eq!(size_of::<TriangleVertex>(), 24);
    assert_eq!(size_of::<VolumeVertex>(), 16);
}

#[test]
fn instance_stride() {
    // mat4 model + mat3 normal matrix, tightly packed.
    assert_eq!(size_of::<InstanceRaw>(), 100);
}

#[test]
fn uniform_and_storage_sizes() {
    assert_eq!(size_of::<CameraUniform>(), 160);
    assert_eq!(size_of::<LightRaw>(), 32);
    assert_eq!(size_of::<PointUniform>(), 32);
    assert_eq!(size_of::<SimParams>(), 16);
    // mat4 transformation + vec4 velocity, mirrored in the compute kernel.
    assert_eq!(size_of::<FlockMember>(), 80);
}
