//! Tone mapping to the surface: the deferred variant with G-buffer debug
//! modes and a plain HDR blit for the forward scenes.

use crate::data_structures::targets;
use crate::pipelines::uniform_layout;

/// Debug visualisation selected through the tone map parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    Shaded,
    Albedo,
    Depth,
    Normal,
    Specularity,
    Occlusion,
}

impl DebugMode {
    pub fn as_index(self) -> u32 {
        match self {
            DebugMode::Shaded => 0,
            DebugMode::Albedo => 1,
            DebugMode::Depth => 2,
            DebugMode::Normal => 3,
            DebugMode::Specularity => 4,
            DebugMode::Occlusion => 5,
        }
    }

    /// Cycle to the next mode, wrapping back to the shaded output.
    pub fn next(self) -> Self {
        match self {
            DebugMode::Shaded => DebugMode::Albedo,
            DebugMode::Albedo => DebugMode::Depth,
            DebugMode::Depth => DebugMode::Normal,
            DebugMode::Normal => DebugMode::Specularity,
            DebugMode::Specularity => DebugMode::Occlusion,
            DebugMode::Occlusion => DebugMode::Shaded,
        }
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: wgpu::ShaderModuleDescriptor,
    color_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
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
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
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

/// Deferred tone map pass reading the whole G-buffer for the debug modes.
pub fn mk_tonemap_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Tonemap Pipeline Layout"),
        bind_group_layouts: &[
            &targets::tonemap_layout(device),
            &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "tonemap_params_layout",
            ),
        ],
        push_constant_ranges: &[],
    });
    fullscreen_pipeline(
        device,
        &layout,
        wgpu::ShaderModuleDescriptor {
            label: Some("Tonemap Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("tonemap.wgsl").into()),
        },
        color_format,
        "Tonemap Pipeline",
    )
}

/// Plain Reinhard blit from an HDR target to the surface.
pub fn mk_hdr_blit_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("HDR Blit Pipeline Layout"),
        bind_group_layouts: &[&targets::hdr_read_layout(device)],
        push_constant_ranges: &[],
    });
    fullscreen_pipeline(
        device,
        &layout,
        wgpu::ShaderModuleDescriptor {
            label: Some("HDR Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("blit.wgsl").into()),
        },
        color_format,
        "HDR Blit Pipeline",
    )
}
