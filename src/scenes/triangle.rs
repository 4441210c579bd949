//! Hello-triangle scene: one vertex-coloured triangle, no camera, no depth.

use wgpu::util::DeviceExt;

use crate::context::{Context, InitContext};
use crate::flow::GraphicsFlow;
use crate::pipelines::triangle::{mk_triangle_pipeline, TriangleVertex};
use crate::scenes::SceneEvent;

pub struct TriangleScene {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
}

impl TriangleScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let pipeline = mk_triangle_pipeline(&ctx.device, &ctx.config);

        // Clockwise winding, like all geometry in this crate.
        let vertices = [
            TriangleVertex {
                position: [0.0, 0.5, 0.0],
                colour: [1.0, 0.0, 0.0],
            },
            TriangleVertex {
                position: [0.5, -0.5, 0.0],
                colour: [0.0, 1.0, 0.0],
            },
            TriangleVertex {
                position: [-0.5, -0.5, 0.0],
                colour: [0.0, 0.0, 1.0],
            },
        ];
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Triangle Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        Ok(Self {
            pipeline,
            vertex_buffer,
        })
    }
}

impl GraphicsFlow<(), SceneEvent> for TriangleScene {
    fn on_render(
        &mut self,
        ctx: &Context,
        _state: &mut (),
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Triangle Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..3, 0..1);
    }
}
