//! GPU flocking: a compute pipeline advancing the simulation and a render
//! pipeline drawing each member as an instanced tetrahedron.
//!
//! The simulation ping-pongs between two storage buffers. Each frame the
//! compute pass reads the previous state from binding 0 and writes the new
//! state to binding 1; the draw pass then sources its transforms from the
//! freshly written buffer.

use crate::data_structures::geometry::{Vertex, VertexPN};
use crate::data_structures::targets;
use crate::data_structures::texture::Texture;
use crate::pipelines::uniform_layout;

/// Threads per workgroup of the update kernel; the flock size must be a
/// multiple of this.
pub const WORKGROUP_SIZE: u32 = 256;

/// One flock member as laid out in the storage buffers. The transformation
/// columns are (aside, up, direction, position).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlockMember {
    pub transformation: [[f32; 4]; 4],
    pub velocity: [f32; 4],
}

/// Uniform parameters of one simulation step: the goal position the flock
/// seeks in xyz and the time step in w.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    pub goal_dt: [f32; 4],
}

/// Bind group layout of the update kernel: previous state, next state and
/// the step parameters.
pub fn flock_compute_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("flock_compute_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

pub fn mk_flock_compute_pipeline(device: &wgpu::Device) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Flock Compute Layout"),
        bind_group_layouts: &[&flock_compute_layout(device)],
        push_constant_ranges: &[],
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Flock Update Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("flock_update.wgsl").into()),
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Flock Compute Pipeline"),
        layout: Some(&layout),
        module: &shader,
        entry_point: Some("cs_main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

/// Instanced draw over the current member buffer into the HDR target.
pub fn mk_flock_draw_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Flock Draw Layout"),
        bind_group_layouts: &[
            &crate::pipelines::storage_layout(
                device,
                wgpu::ShaderStages::VERTEX,
                "flock_members_layout",
            ),
            camera_bind_group_layout,
            &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "light_uniform_layout",
            ),
        ],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Flock Draw Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("flock_draw.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Flock Draw Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexPN::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets::HDR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_STENCIL_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
