//! CPU-side stencil shadow volume extraction.
//!
//! For every triangle of an adjacency mesh that faces the light, the
//! silhouette edges (edges whose neighbouring triangle does not face the
//! light) are extruded away from the light to infinity, producing the sides
//! of the shadow volume. Light-facing triangles become the front cap, pushed
//! slightly away from the light to avoid z-fighting, and projected copies at
//! infinity close the volume as the back cap.
//!
//! "Infinity" is expressed through homogeneous coordinates: far vertices have
//! `w == 0` and are pure directions after the view-projection transform, so
//! the volume stays closed no matter how far the light reaches.

use cgmath::{InnerSpace, Matrix4, Vector3};

use crate::data_structures::geometry::{MeshData, VertexP};

/// Offset applied to near cap and extruded edge vertices, away from the
/// light, to keep the volume from z-fighting with the geometry that casts it.
pub const VOLUME_EPSILON: f32 = 0.001;

/// A homogeneous shadow volume vertex. `w == 1` for near vertices and
/// `w == 0` for the ones projected to infinity.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VolumeVertex {
    pub position: [f32; 4],
}

impl crate::data_structures::geometry::Vertex for VolumeVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VolumeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x4,
            }],
        }
    }
}

fn near(position: Vector3<f32>, light_dir: Vector3<f32>) -> VolumeVertex {
    let p = position + light_dir * VOLUME_EPSILON;
    VolumeVertex {
        position: [p.x, p.y, p.z, 1.0],
    }
}

fn far(direction: Vector3<f32>) -> VolumeVertex {
    VolumeVertex {
        position: [direction.x, direction.y, direction.z, 0.0],
    }
}

/// Emit one extruded silhouette edge as two triangles: the quad between the
/// edge itself (pushed out by epsilon) and its projection to infinity.
fn extrude_edge(start: Vector3<f32>, end: Vector3<f32>, light_pos: Vector3<f32>, out: &mut Vec<VolumeVertex>) {
    let start_dir = (start - light_pos).normalize();
    let end_dir = (end - light_pos).normalize();

    let a = near(start, start_dir);
    let b = far(start_dir);
    let c = near(end, end_dir);
    let d = far(end_dir);

    out.extend_from_slice(&[a, b, c, c, b, d]);
}

/// Append the shadow volume of one mesh instance to `out`.
///
/// `mesh` must carry triangle adjacency indices (6 per triangle, as produced
/// by [`crate::data_structures::geometry::cube_adjacency`]): slots 0, 2 and 4
/// form the triangle, slots 1, 3 and 5 are the vertices across each edge.
/// `model` places the mesh in the world, `light_pos` is the light position in
/// world space. The output triangles are world-space and only need the
/// view-projection transform when drawn.
pub fn extrude_silhouette(
    mesh: &MeshData<VertexP>,
    model: &Matrix4<f32>,
    light_pos: Vector3<f32>,
    out: &mut Vec<VolumeVertex>,
) {
    let world: Vec<Vector3<f32>> = mesh
        .vertices
        .iter()
        .map(|v| {
            let p = model * cgmath::Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
            Vector3::new(p.x, p.y, p.z)
        })
        .collect();

    for tri in mesh.indices.chunks_exact(6) {
        let v = [
            world[tri[0] as usize],
            world[tri[1] as usize],
            world[tri[2] as usize],
            world[tri[3] as usize],
            world[tri[4] as usize],
            world[tri[5] as usize],
        ];

        let e1 = v[2] - v[0];
        let e2 = v[4] - v[0];
        let e3 = v[1] - v[0];
        let e4 = v[3] - v[2];
        let e5 = v[4] - v[2];
        let e6 = v[5] - v[0];

        let light_dir = (light_pos - v[0]).normalize();
        let normal = e2.cross(e1);

        // Only light-facing triangles contribute to the volume.
        if normal.dot(light_dir) <= 0.0 {
            continue;
        }

        // An edge is on the silhouette when the triangle across it does not
        // face the light.
        if e1.cross(e3).dot(light_dir) <= 0.0 {
            extrude_edge(v[0], v[2], light_pos, out);
        }
        if e5.cross(e4).dot(light_pos - v[2]) <= 0.0 {
            extrude_edge(v[2], v[4], light_pos, out);
        }
        if e6.cross(e2).dot(light_pos - v[4]) <= 0.0 {
            extrude_edge(v[4], v[0], light_pos, out);
        }

        // Front cap, pushed away from the light by epsilon.
        let d0 = (v[0] - light_pos).normalize();
        let d2 = (v[2] - light_pos).normalize();
        let d4 = (v[4] - light_pos).normalize();
        out.extend_from_slice(&[near(v[0], d0), near(v[2], d2), near(v[4], d4)]);

        // Back cap at infinity, reversed winding so it faces outward.
        out.extend_from_slice(&[
            far(v[0] - light_pos),
            far(v[4] - light_pos),
            far(v[2] - light_pos),
        ]);
    }
}
