//! Procedural mesh geometry.
//!
//! All meshes the scenes draw are generated here: a textured ground quad, a
//! textured cube, a cube with adjacency indices for silhouette extraction, a
//! low-poly tetrahedron used for flock members and a unit icosahedron used as
//! light volume proxy. Vertices come in three flavours depending on how much
//! surface data the shading needs.

use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

/// Anything that can describe its vertex buffer layout to a pipeline.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Position-only vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexP {
    pub position: [f32; 3],
}

impl Vertex for VertexP {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexP>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Vertex with a face normal, enough for flat shading.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPN {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for VertexPN {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPN>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Full surface vertex: position, normal, tangent and texture coordinates.
/// The bitangent is derived in the shader as `cross(tangent, normal)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPNTT {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for VertexPNTT {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPNTT>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 9]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// CPU-side mesh representation before upload.
#[derive(Debug, Clone)]
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

impl<V: bytemuck::Pod> MeshData<V> {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn upload(&self, device: &wgpu::Device, label: &str) -> Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", label)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Mesh {
            vertex_buffer,
            index_buffer,
            num_indices: self.indices.len() as u32,
        }
    }
}

/// An uploaded mesh ready for drawing.
#[derive(Debug)]
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Bind the mesh buffers in slot 0 and draw `instances` copies.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instances: std::ops::Range<u32>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, instances);
    }
}

/// Unit quad in the xz plane facing up, with tangent along +x.
pub fn quad_normal_tangent_tex() -> MeshData<VertexPNTT> {
    let normal = [0.0, 1.0, 0.0];
    let tangent = [1.0, 0.0, 0.0];
    MeshData {
        vertices: vec![
            VertexPNTT {
                position: [-0.5, 0.0, -0.5],
                normal,
                tangent,
                tex_coords: [0.0, 0.0],
            },
            VertexPNTT {
                position: [0.5, 0.0, -0.5],
                normal,
                tangent,
                tex_coords: [1.0, 0.0],
            },
            VertexPNTT {
                position: [0.5, 0.0, 0.5],
                normal,
                tangent,
                tex_coords: [1.0, 1.0],
            },
            VertexPNTT {
                position: [-0.5, 0.0, 0.5],
                normal,
                tangent,
                tex_coords: [0.0, 1.0],
            },
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Unit cube with per-face normals, tangents and texture coordinates.
/// 24 vertices as no face shares vertex data with another.
pub fn cube_normal_tangent_tex() -> MeshData<VertexPNTT> {
    struct Face {
        corners: [[f32; 3]; 4],
        normal: [f32; 3],
        tangent: [f32; 3],
    }
    let faces = [
        // top
        Face {
            corners: [
                [-0.5, 0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
            ],
            normal: [0.0, 1.0, 0.0],
            tangent: [1.0, 0.0, 0.0],
        },
        // bottom
        Face {
            corners: [
                [0.5, -0.5, -0.5],
                [-0.5, -0.5, -0.5],
                [-0.5, -0.5, 0.5],
                [0.5, -0.5, 0.5],
            ],
            normal: [0.0, -1.0, 0.0],
            tangent: [-1.0, 0.0, 0.0],
        },
        // front
        Face {
            corners: [
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [-0.5, 0.5, -0.5],
            ],
            normal: [0.0, 0.0, -1.0],
            tangent: [1.0, 0.0, 0.0],
        },
        // back
        Face {
            corners: [
                [0.5, -0.5, 0.5],
                [-0.5, -0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
            ],
            normal: [0.0, 0.0, 1.0],
            tangent: [-1.0, 0.0, 0.0],
        },
        // left
        Face {
            corners: [
                [-0.5, -0.5, 0.5],
                [-0.5, -0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [-0.5, 0.5, 0.5],
            ],
            normal: [-1.0, 0.0, 0.0],
            tangent: [0.0, 0.0, -1.0],
        },
        // right
        Face {
            corners: [
                [0.5, -0.5, -0.5],
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [0.5, 0.5, -0.5],
            ],
            normal: [1.0, 0.0, 0.0],
            tangent: [0.0, 0.0, 1.0],
        },
    ];

    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in &faces {
        let base = vertices.len() as u32;
        for (corner, uv) in face.corners.iter().zip(uvs) {
            vertices.push(VertexPNTT {
                position: *corner,
                normal: face.normal,
                tangent: face.tangent,
                tex_coords: uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    MeshData { vertices, indices }
}

/// Unit cube with triangle adjacency indices.
///
/// Each triangle is stored as 6 indices. Indices 0, 2 and 4 are the triangle
/// itself, indices 1, 3 and 5 the vertices opposite each edge in the
/// neighbouring triangles. This is the input for silhouette extraction: an
/// edge lies on the silhouette when its triangle faces the light and the
/// adjacent triangle does not.
pub fn cube_adjacency() -> MeshData<VertexP> {
    let vertices = vec![
        // top
        VertexP {
            position: [-0.5, 0.5, -0.5],
        },
        VertexP {
            position: [0.5, 0.5, -0.5],
        },
        VertexP {
            position: [0.5, 0.5, 0.5],
        },
        VertexP {
            position: [-0.5, 0.5, 0.5],
        },
        // bottom
        VertexP {
            position: [0.5, -0.5, -0.5],
        },
        VertexP {
            position: [-0.5, -0.5, -0.5],
        },
        VertexP {
            position: [-0.5, -0.5, 0.5],
        },
        VertexP {
            position: [0.5, -0.5, 0.5],
        },
    ];
    #[rustfmt::skip]
    let indices = vec![
        // top
        0, 5, 1, 4, 2, 3,
        2, 7, 3, 6, 0, 1,
        // bottom
        4, 1, 5, 0, 6, 7,
        6, 3, 7, 2, 4, 5,
        // front
        5, 6, 4, 2, 1, 0,
        1, 2, 0, 6, 5, 4,
        // back
        7, 4, 6, 0, 3, 2,
        3, 0, 2, 4, 7, 6,
        // left
        6, 4, 5, 1, 0, 3,
        0, 2, 3, 7, 6, 5,
        // right
        4, 6, 7, 3, 2, 1,
        2, 0, 1, 5, 4, 7,
    ];
    MeshData { vertices, indices }
}

/// Elongated tetrahedron used as the flock member body. Flat shaded, so each
/// of the four faces carries its own three vertices.
pub fn tetrahedron() -> MeshData<VertexPN> {
    let v0 = Vector3::new(-0.5, -0.3, -0.5);
    let v1 = Vector3::new(0.5, -0.3, -0.5);
    let v2 = Vector3::new(0.0, -0.3, 1.5);
    let v3 = Vector3::new(0.0, 0.2, 0.0);

    let e0 = v1 - v0;
    let e1 = v2 - v0;
    let e2 = v3 - v0;
    let e3 = v3 - v1;
    let e4 = v2 - v1;

    let n0 = e0.cross(e1).normalize();
    let n1 = e1.cross(e2).normalize();
    let n2 = e2.cross(e0).normalize();
    let n3 = e3.cross(e4).normalize();

    let face = |a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>, n: Vector3<f32>| {
        [
            VertexPN {
                position: a.into(),
                normal: n.into(),
            },
            VertexPN {
                position: b.into(),
                normal: n.into(),
            },
            VertexPN {
                position: c.into(),
                normal: n.into(),
            },
        ]
    };

    let mut vertices = Vec::with_capacity(12);
    vertices.extend_from_slice(&face(v0, v2, v1, n0)); // bottom
    vertices.extend_from_slice(&face(v0, v3, v2, n1)); // left
    vertices.extend_from_slice(&face(v0, v1, v3, n2)); // back
    vertices.extend_from_slice(&face(v1, v2, v3, n3)); // right

    MeshData {
        vertices,
        indices: (0..12).collect(),
    }
}

/// Regular icosahedron with circumradius 1, used as light volume proxy.
/// Coarse on purpose, the light pass only needs a convex hull around the
/// light's range.
pub fn icosahedron() -> MeshData<VertexP> {
    // Golden ratio coordinates scaled so every vertex sits on the unit sphere.
    let scale = 1.902;
    let unit = 1.0 / scale;
    let phi = 1.618 / scale;

    #[rustfmt::skip]
    let positions: [[f32; 3]; 12] = [
        [-phi, unit, 0.0],
        [0.0, phi, -unit],
        [phi, unit, 0.0],
        [0.0, phi, unit],
        [-unit, 0.0, -phi],
        [unit, 0.0, -phi],
        [unit, 0.0, phi],
        [-unit, 0.0, phi],
        [-phi, -unit, 0.0],
        [0.0, -phi, unit],
        [phi, -unit, 0.0],
        [0.0, -phi, -unit],
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 4, 1,   0, 1, 3,   0, 3, 7,   4, 5, 1,   6, 7, 3,
        2, 6, 3,   2, 3, 1,   2, 1, 5,   0, 7, 8,   0, 8, 4,
        2, 5, 10,  2, 10, 6,  8, 7, 9,   8, 9, 11,  8, 11, 4,
        5, 4, 11,  7, 6, 9,   10, 9, 6,  10, 11, 9, 10, 5, 11,
    ];

    MeshData {
        vertices: positions
            .into_iter()
            .map(|position| VertexP { position })
            .collect(),
        indices,
    }
}
