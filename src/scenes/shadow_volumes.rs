//! Stencil shadow volume scene.
//!
//! Cubes above a checkered floor cast hard shadows from several moving HDR
//! point lights. Each frame lays down scene depth once, then accumulates per
//! light: the cube silhouettes are extruded into shadow volumes on the CPU,
//! counted into the stencil buffer, and a stencil-tested additive lighting
//! pass shades only the unshadowed fragments. Lighting accumulates in an
//! HDR target that a final pass tone maps to the surface.
//!
//! `C` toggles between Carmack's reverse and the classic depth-pass stencil
//! counting.

use cgmath::{Vector3, Vector4};
use instant::Duration;
use rand::Rng;
use std::ops::Range;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::context::{Context, InitContext};
use crate::data_structures::geometry::{self, Mesh, MeshData, VertexP};
use crate::data_structures::instance::{self, Instance};
use crate::data_structures::light::{LightRig, PointLight, AMBIENT_INTENSITY};
use crate::data_structures::targets::{self, HdrTarget};
use crate::flow::{GraphicsFlow, Out};
use crate::pipelines::point::{mk_point_pipeline, PointUniform};
use crate::pipelines::shadow::{mk_depth_prepass_pipeline, mk_lit_pipeline, mk_volume_pipeline};
use crate::pipelines::tonemap::mk_hdr_blit_pipeline;
use crate::pipelines::{material_layout, uniform_layout};
use crate::scenes::{
    forward_light_raw,
    instancing::{background_instances, cube_material, floor_material, scatter_cubes},
    Material, SceneEvent,
};
use crate::shadow::{extrude_silhouette, VolumeVertex};

const NUM_LIGHTS: usize = 5;
const NUM_CUBES: usize = 15;

/// Upper bound on volume vertices: every triangle of every adjacency cube
/// can contribute at most three extruded edges plus both caps.
const MAX_VOLUME_VERTICES: usize = NUM_LIGHTS * NUM_CUBES * 12 * 24;

struct PerLight {
    direct_buffer: wgpu::Buffer,
    direct_bind_group: wgpu::BindGroup,
    ambient_buffer: wgpu::Buffer,
    ambient_bind_group: wgpu::BindGroup,
    point_buffer: wgpu::Buffer,
    point_bind_group: wgpu::BindGroup,
}

pub struct ShadowVolumeScene {
    prepass_pipeline: wgpu::RenderPipeline,
    volume_carmack: wgpu::RenderPipeline,
    volume_classic: wgpu::RenderPipeline,
    lit_pipeline: wgpu::RenderPipeline,
    ambient_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    carmack_reverse: bool,
    hdr: HdrTarget,
    floor: Material,
    cubes: Material,
    quad_mesh: Mesh,
    cube_mesh: Mesh,
    adjacency: MeshData<VertexP>,
    background_buffer: wgpu::Buffer,
    cube_instances: Vec<Instance>,
    cube_buffer: wgpu::Buffer,
    lights: LightRig,
    per_light: Vec<PerLight>,
    volume_buffer: wgpu::Buffer,
    volume_ranges: Vec<Range<u32>>,
}

impl ShadowVolumeScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let device = &ctx.device;

        let prepass_pipeline = mk_depth_prepass_pipeline(device, &ctx.camera_bind_group_layout);
        let volume_carmack =
            mk_volume_pipeline(device, &ctx.camera_bind_group_layout, true, ctx.depth_clamp);
        let volume_classic =
            mk_volume_pipeline(device, &ctx.camera_bind_group_layout, false, ctx.depth_clamp);
        let lit_pipeline = mk_lit_pipeline(
            device,
            &ctx.camera_bind_group_layout,
            targets::HDR_FORMAT,
            true,
        );
        let ambient_pipeline = mk_lit_pipeline(
            device,
            &ctx.camera_bind_group_layout,
            targets::HDR_FORMAT,
            false,
        );
        let point_pipeline = mk_point_pipeline(
            device,
            &ctx.camera_bind_group_layout,
            targets::HDR_FORMAT,
            crate::data_structures::texture::Texture::DEPTH_STENCIL_FORMAT,
        );
        let blit_pipeline = mk_hdr_blit_pipeline(device, ctx.config.format);

        let hdr = HdrTarget::new(device, ctx.config.width, ctx.config.height);

        let materials = material_layout(device);
        let floor = floor_material(device, &ctx.queue, &materials)?;
        let cubes = cube_material(device, &ctx.queue, &materials)?;

        let quad_mesh = geometry::quad_normal_tangent_tex().upload(device, "quad");
        let cube_mesh = geometry::cube_normal_tangent_tex().upload(device, "cube");
        let adjacency = geometry::cube_adjacency();

        let background_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Instance Buffer"),
            contents: bytemuck::cast_slice(&instance::to_raw(&background_instances())),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_instances = scatter_cubes(NUM_CUBES);
        let cube_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Instance Buffer"),
            contents: bytemuck::cast_slice(&instance::to_raw(&cube_instances)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut rng = rand::thread_rng();
        let mut lights = vec![PointLight::new(
            Vector3::new(-3.0, 2.0, 0.0),
            Vector4::new(100.0, 100.0, 100.0, AMBIENT_INTENSITY),
            Vector4::new(0.0, 1.0, 0.0, 0.0),
        )];
        for _ in 1..NUM_LIGHTS {
            lights.push(PointLight::new(
                Vector3::new(0.0, 0.0, 0.0),
                Vector4::new(
                    rng.gen_range(0.0..50.0),
                    rng.gen_range(0.0..50.0),
                    rng.gen_range(0.0..50.0),
                    AMBIENT_INTENSITY,
                ),
                Vector4::new(
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-2.0..2.0),
                    rng.gen_range(-2.0..2.0),
                ),
            ));
        }
        let lights = LightRig::new(
            lights,
            Vector3::new(13.0, 2.0, 13.0),
            Vector3::new(0.0, 3.0, 0.0),
            Some(Vector3::new(-3.0, 2.0, 0.0)),
        );

        let light_layout =
            uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "light_uniform_layout");
        let point_layout = crate::pipelines::point::point_layout(device);
        let uniform_with_group = |buffer: &wgpu::Buffer, layout, label| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };
        let per_light = lights
            .lights
            .iter()
            .map(|light| {
                let direct_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Direct Light Buffer"),
                    contents: bytemuck::cast_slice(&[forward_light_raw(light, 1.0, 0.0)]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let ambient_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Ambient Light Buffer"),
                    contents: bytemuck::cast_slice(&[forward_light_raw(
                        light,
                        0.0,
                        AMBIENT_INTENSITY,
                    )]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let point_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Point Marker Buffer"),
                    contents: bytemuck::cast_slice(&[point_uniform(light)]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                PerLight {
                    direct_bind_group: uniform_with_group(
                        &direct_buffer,
                        &light_layout,
                        "direct_light_bind_group",
                    ),
                    direct_buffer,
                    ambient_bind_group: uniform_with_group(
                        &ambient_buffer,
                        &light_layout,
                        "ambient_light_bind_group",
                    ),
                    ambient_buffer,
                    point_bind_group: uniform_with_group(
                        &point_buffer,
                        &point_layout,
                        "point_marker_bind_group",
                    ),
                    point_buffer,
                }
            })
            .collect();

        let volume_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shadow Volume Buffer"),
            size: (MAX_VOLUME_VERTICES * std::mem::size_of::<VolumeVertex>())
                as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            prepass_pipeline,
            volume_carmack,
            volume_classic,
            lit_pipeline,
            ambient_pipeline,
            point_pipeline,
            blit_pipeline,
            carmack_reverse: true,
            hdr,
            floor,
            cubes,
            quad_mesh,
            cube_mesh,
            adjacency,
            background_buffer,
            cube_instances,
            cube_buffer,
            lights,
            per_light,
            volume_buffer,
            volume_ranges: Vec::new(),
        })
    }
}

fn point_uniform(light: &PointLight) -> PointUniform {
    PointUniform {
        position_size: [
            light.position.x,
            light.position.y,
            light.position.z,
            0.02,
        ],
        colour: [
            light.colour.x * 0.05,
            light.colour.y * 0.05,
            light.colour.z * 0.05,
            1.0,
        ],
    }
}

impl GraphicsFlow<(), SceneEvent> for ShadowVolumeScene {
    fn on_update(&mut self, _ctx: &Context, _state: &mut (), dt: Duration) -> Out<(), SceneEvent> {
        self.lights.advance(dt.as_secs_f32());
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _ctx: &Context,
        _state: &mut (),
        event: &WindowEvent,
    ) -> Out<(), SceneEvent> {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::KeyC),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            self.carmack_reverse = !self.carmack_reverse;
            log::info!(
                "stencil counting: {}",
                if self.carmack_reverse {
                    "depth fail (Carmack's reverse)"
                } else {
                    "depth pass"
                }
            );
        }
        Out::Empty
    }

    fn on_resize(
        &mut self,
        ctx: &Context,
        _state: &mut (),
        width: u32,
        height: u32,
    ) -> Out<(), SceneEvent> {
        self.hdr = HdrTarget::new(&ctx.device, width, height);
        Out::Empty
    }

    fn on_render(
        &mut self,
        ctx: &Context,
        _state: &mut (),
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        // Upload this frame's light state and shadow volumes before any pass
        // is recorded; all writes land ahead of the submit.
        let mut volume_vertices: Vec<VolumeVertex> = Vec::new();
        self.volume_ranges.clear();
        for (light, per_light) in self.lights.lights.iter().zip(&self.per_light) {
            ctx.queue.write_buffer(
                &per_light.direct_buffer,
                0,
                bytemuck::cast_slice(&[forward_light_raw(light, 1.0, 0.0)]),
            );
            ctx.queue.write_buffer(
                &per_light.ambient_buffer,
                0,
                bytemuck::cast_slice(&[forward_light_raw(light, 0.0, AMBIENT_INTENSITY)]),
            );
            ctx.queue.write_buffer(
                &per_light.point_buffer,
                0,
                bytemuck::cast_slice(&[point_uniform(light)]),
            );

            let start = volume_vertices.len() as u32;
            for cube in &self.cube_instances {
                extrude_silhouette(
                    &self.adjacency,
                    &cube.to_matrix(),
                    light.position,
                    &mut volume_vertices,
                );
            }
            self.volume_ranges.push(start..volume_vertices.len() as u32);
        }
        ctx.queue
            .write_buffer(&self.volume_buffer, 0, bytemuck::cast_slice(&volume_vertices));

        // Depth prepass over the whole scene.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Depth Prepass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.prepass_pipeline);
            pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            pass.set_vertex_buffer(1, self.background_buffer.slice(..));
            self.quad_mesh.draw(&mut pass, 0..3);
            pass.set_vertex_buffer(1, self.cube_buffer.slice(..));
            self.cube_mesh.draw(&mut pass, 0..NUM_CUBES as u32);
        }

        for (i, per_light) in self.per_light.iter().enumerate() {
            // Count the light's shadow volume into the stencil buffer.
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Volume Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(0),
                            store: wgpu::StoreOp::Store,
                        }),
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(if self.carmack_reverse {
                    &self.volume_carmack
                } else {
                    &self.volume_classic
                });
                pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
                pass.set_vertex_buffer(0, self.volume_buffer.slice(..));
                pass.draw(self.volume_ranges[i].clone(), 0..1);
            }

            // Direct lighting, masked to unshadowed fragments. The first
            // light's pass clears the HDR target.
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Direct Light Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &self.hdr.view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: if i == 0 {
                                wgpu::LoadOp::Clear(wgpu::Color::BLACK)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&self.lit_pipeline);
                pass.set_stencil_reference(0);
                pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
                pass.set_bind_group(2, &per_light.direct_bind_group, &[]);
                pass.set_bind_group(0, &self.floor.bind_group, &[]);
                pass.set_vertex_buffer(1, self.background_buffer.slice(..));
                self.quad_mesh.draw(&mut pass, 0..3);
                pass.set_bind_group(0, &self.cubes.bind_group, &[]);
                pass.set_vertex_buffer(1, self.cube_buffer.slice(..));
                self.cube_mesh.draw(&mut pass, 0..NUM_CUBES as u32);
            }

            // Ambient reaches shadowed fragments too, plus the light marker.
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Ambient Light Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &self.hdr.view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&self.ambient_pipeline);
                pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
                pass.set_bind_group(2, &per_light.ambient_bind_group, &[]);
                pass.set_bind_group(0, &self.floor.bind_group, &[]);
                pass.set_vertex_buffer(1, self.background_buffer.slice(..));
                self.quad_mesh.draw(&mut pass, 0..3);
                pass.set_bind_group(0, &self.cubes.bind_group, &[]);
                pass.set_vertex_buffer(1, self.cube_buffer.slice(..));
                self.cube_mesh.draw(&mut pass, 0..NUM_CUBES as u32);

                pass.set_pipeline(&self.point_pipeline);
                pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
                pass.set_bind_group(1, &per_light.point_bind_group, &[]);
                pass.draw(0..6, 0..1);
            }
        }

        // Tone map the accumulated HDR lighting to the surface.
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HDR Blit Pass"),
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
        pass.set_pipeline(&self.blit_pipeline);
        pass.set_bind_group(0, &self.hdr.read_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
