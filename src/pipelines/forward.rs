//! Forward Blinn-Phong pipeline for instanced, normal-mapped geometry lit by
//! a single point light. The shadow volume scene reuses the same shader for
//! its per-light passes with different blend and stencil states.

use crate::data_structures::geometry::{Vertex, VertexPNTT};
use crate::data_structures::instance::InstanceRaw;
use crate::pipelines::{material_layout, mk_render_pipeline, uniform_layout};

/// Pipeline layout shared by every pass running `forward.wgsl`:
/// material in group 0, camera in group 1, light uniform in group 2.
pub fn forward_pipeline_layout(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Forward Pipeline Layout"),
        bind_group_layouts: &[
            &material_layout(device),
            camera_bind_group_layout,
            &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "light_uniform_layout",
            ),
        ],
        push_constant_ranges: &[],
    })
}

pub fn forward_shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Forward Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("forward.wgsl").into()),
    }
}

pub fn mk_forward_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
) -> wgpu::RenderPipeline {
    let layout = forward_pipeline_layout(device, camera_bind_group_layout);
    mk_render_pipeline(
        device,
        &layout,
        color_format,
        blend,
        depth_format,
        &[VertexPNTT::desc(), InstanceRaw::desc()],
        forward_shader(),
    )
}
