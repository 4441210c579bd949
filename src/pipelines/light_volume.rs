//! Lighting passes of the deferred renderer: the fullscreen ambient pass and
//! the instanced per-light volume passes accumulating into the HDR target.

use crate::data_structures::geometry::{Vertex, VertexP};
use crate::data_structures::instance::InstanceRaw;
use crate::data_structures::targets;
use crate::data_structures::texture::Texture;
use crate::pipelines::shadow::ADDITIVE_BLEND;
use crate::pipelines::{storage_layout, uniform_layout};

fn light_volume_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Light Volume Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("light_volume.wgsl").into()),
    })
}

fn light_volume_layout(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Light Volume Pipeline Layout"),
        bind_group_layouts: &[
            &targets::gbuffer_read_layout(device),
            camera_bind_group_layout,
            &storage_layout(
                device,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                "lights_layout",
            ),
        ],
        push_constant_ranges: &[],
    })
}

/// Fullscreen ambient pass. Runs in its own render pass without a depth
/// attachment and is the pass that clears the HDR target.
pub fn mk_ambient_pipeline(device: &wgpu::Device) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Ambient Pipeline Layout"),
        bind_group_layouts: &[
            &targets::gbuffer_read_layout(device),
            &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "ambient_params_layout",
            ),
        ],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Ambient Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("ambient.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Ambient Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets::HDR_FORMAT,
                blend: Some(ADDITIVE_BLEND),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// Per-light volume pass.
///
/// When the camera is outside a light's volume its front faces are drawn
/// depth-tested against the scene; for volumes containing the camera the
/// back faces are drawn without depth testing, otherwise the near plane
/// would clip the whole volume away. The G-buffer depth stays attached
/// read-only so it can be sampled in the same pass.
pub fn mk_light_volume_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    camera_inside: bool,
) -> wgpu::RenderPipeline {
    let layout = light_volume_layout(device, camera_bind_group_layout);
    let shader = light_volume_shader(device);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Light Volume Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_volume"),
            buffers: &[VertexP::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_light"),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets::HDR_FORMAT,
                blend: Some(ADDITIVE_BLEND),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(if camera_inside {
                wgpu::Face::Front
            } else {
                wgpu::Face::Back
            }),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: if camera_inside {
                wgpu::CompareFunction::Always
            } else {
                wgpu::CompareFunction::LessEqual
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// Flat-coloured marker volumes visualising the light positions.
pub fn mk_marker_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = light_volume_layout(device, camera_bind_group_layout);
    let shader = light_volume_shader(device);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Light Marker Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_volume"),
            buffers: &[VertexP::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_marker"),
            targets: &[Some(wgpu::ColorTargetState {
                format: targets::HDR_FORMAT,
                blend: Some(ADDITIVE_BLEND),
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
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
