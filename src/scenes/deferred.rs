//! Deferred shading scene.
//!
//! Geometry renders once into a compact G-buffer (albedo, packed normal,
//! material parameters and depth). Lighting then runs per light over an
//! instanced proxy volume scaled to the light's range, reconstructing world
//! positions from depth, and accumulates into an HDR target. A final pass
//! tone maps to the surface and doubles as a G-buffer inspector: `M` cycles
//! through the debug visualisation modes.

use cgmath::{One, Quaternion, Vector3, Vector4};
use instant::Duration;
use rand::Rng;
use wgpu::util::DeviceExt;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::context::{Context, InitContext};
use crate::data_structures::geometry::{self, Mesh};
use crate::data_structures::instance::{self, Instance, InstanceRaw};
use crate::data_structures::light::{LightRaw, LightRig, PointLight, AMBIENT_INTENSITY};
use crate::data_structures::targets::RenderTargets;
use crate::flow::{GraphicsFlow, Out};
use crate::pipelines::gbuffer::mk_gbuffer_pipeline;
use crate::pipelines::light_volume::{
    mk_ambient_pipeline, mk_light_volume_pipeline, mk_marker_pipeline,
};
use crate::pipelines::tonemap::{mk_tonemap_pipeline, DebugMode};
use crate::pipelines::{material_layout, storage_layout, uniform_layout};
use crate::scenes::{
    instancing::{background_instances, cube_material, floor_material, scatter_cubes},
    Material, SceneEvent,
};

const NUM_CUBES: usize = 15;
const NUM_LIGHTS: usize = 32;

/// Ambient term applied once in the fullscreen pass.
const AMBIENT_LIGHT: f32 = 0.1;

/// Scale of the marker volumes relative to a unit icosahedron.
const MARKER_SCALE: f32 = 0.1;

/// A storage buffer of [`LightRaw`] entries paired with a matching instance
/// buffer of proxy volume transforms, both rewritten every frame.
struct LightBatch {
    lights: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instances: wgpu::Buffer,
    count: u32,
}

impl LightBatch {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let lights = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (NUM_LIGHTS * std::mem::size_of::<LightRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lights.as_entire_binding(),
            }],
        });
        let instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (NUM_LIGHTS * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            lights,
            bind_group,
            instances,
            count: 0,
        }
    }

    /// Upload the given subset of the rig's lights, proxy volumes scaled by
    /// `scale(light)` and colours by `attenuation`.
    fn upload(
        &mut self,
        queue: &wgpu::Queue,
        rig: &LightRig,
        indices: impl Iterator<Item = usize>,
        scale: fn(&PointLight) -> f32,
        attenuation: f32,
    ) {
        let mut raws = Vec::new();
        let mut transforms = Vec::new();
        for i in indices {
            let light = &rig.lights[i];
            raws.push(light.to_raw(attenuation));
            let s = scale(light);
            transforms.push(
                Instance {
                    position: light.position,
                    rotation: Quaternion::one(),
                    scale: Vector3::new(s, s, s),
                }
                .to_raw(),
            );
        }
        self.count = raws.len() as u32;
        if self.count > 0 {
            queue.write_buffer(&self.lights, 0, bytemuck::cast_slice(&raws));
            queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&transforms));
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline, mesh: &Mesh) {
        if self.count == 0 {
            log::warn!("you attempted to render something with zero instances");
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(2, &self.bind_group, &[]);
        pass.set_vertex_buffer(1, self.instances.slice(..));
        mesh.draw(pass, 0..self.count);
    }
}

fn cleared(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        depth_slice: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        },
    })
}

pub struct DeferredScene {
    gbuffer_pipeline: wgpu::RenderPipeline,
    ambient_pipeline: wgpu::RenderPipeline,
    outside_pipeline: wgpu::RenderPipeline,
    inside_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,
    tonemap_pipeline: wgpu::RenderPipeline,
    targets: RenderTargets,
    floor: Material,
    cubes: Material,
    quad_mesh: Mesh,
    cube_mesh: Mesh,
    volume_mesh: Mesh,
    background_buffer: wgpu::Buffer,
    cube_buffer: wgpu::Buffer,
    lights: LightRig,
    outside: LightBatch,
    inside: LightBatch,
    markers: LightBatch,
    ambient_bind_group: wgpu::BindGroup,
    tonemap_buffer: wgpu::Buffer,
    tonemap_bind_group: wgpu::BindGroup,
    debug_mode: DebugMode,
}

impl DeferredScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let device = &ctx.device;

        let gbuffer_pipeline = mk_gbuffer_pipeline(device, &ctx.camera_bind_group_layout);
        let ambient_pipeline = mk_ambient_pipeline(device);
        let outside_pipeline =
            mk_light_volume_pipeline(device, &ctx.camera_bind_group_layout, false);
        let inside_pipeline = mk_light_volume_pipeline(device, &ctx.camera_bind_group_layout, true);
        let marker_pipeline = mk_marker_pipeline(device, &ctx.camera_bind_group_layout);
        let tonemap_pipeline = mk_tonemap_pipeline(device, ctx.config.format);

        let targets = RenderTargets::new(device, ctx.config.width, ctx.config.height);

        let materials = material_layout(device);
        let floor = floor_material(device, &ctx.queue, &materials)?;
        let cubes = cube_material(device, &ctx.queue, &materials)?;

        let quad_mesh = geometry::quad_normal_tangent_tex().upload(device, "quad");
        let cube_mesh = geometry::cube_normal_tangent_tex().upload(device, "cube");
        let volume_mesh = geometry::icosahedron().upload(device, "light_volume");

        let background_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Instance Buffer"),
            contents: bytemuck::cast_slice(&instance::to_raw(&background_instances())),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let cube_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube Instance Buffer"),
            contents: bytemuck::cast_slice(&instance::to_raw(&scatter_cubes(NUM_CUBES))),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut rng = rand::thread_rng();
        let mut lights = vec![PointLight::new(
            Vector3::new(-3.0, 2.0, 0.0),
            Vector4::new(50.0, 50.0, 50.0, AMBIENT_INTENSITY),
            Vector4::new(0.0, 1.0, 0.0, 0.0),
        )];
        for _ in 1..NUM_LIGHTS {
            lights.push(PointLight::new(
                Vector3::new(0.0, 0.0, 0.0),
                Vector4::new(
                    rng.gen_range(0.0..25.0),
                    rng.gen_range(0.0..25.0),
                    rng.gen_range(0.0..25.0),
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

        let lights_layout = storage_layout(
            device,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            "lights_layout",
        );
        let outside = LightBatch::new(device, &lights_layout, "outside_lights");
        let inside = LightBatch::new(device, &lights_layout, "inside_lights");
        let markers = LightBatch::new(device, &lights_layout, "marker_lights");

        let ambient_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ambient Params Buffer"),
            contents: bytemuck::cast_slice(&[[AMBIENT_LIGHT, AMBIENT_LIGHT, AMBIENT_LIGHT, 1.0f32]]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let ambient_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ambient_params_bind_group"),
            layout: &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "ambient_params_layout",
            ),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ambient_buffer.as_entire_binding(),
            }],
        });

        let tonemap_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tonemap Params Buffer"),
            size: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let tonemap_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tonemap_params_bind_group"),
            layout: &uniform_layout(
                device,
                wgpu::ShaderStages::FRAGMENT,
                "tonemap_params_layout",
            ),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: tonemap_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            gbuffer_pipeline,
            ambient_pipeline,
            outside_pipeline,
            inside_pipeline,
            marker_pipeline,
            tonemap_pipeline,
            targets,
            floor,
            cubes,
            quad_mesh,
            cube_mesh,
            volume_mesh,
            background_buffer,
            cube_buffer,
            lights,
            outside,
            inside,
            markers,
            ambient_bind_group,
            tonemap_buffer,
            tonemap_bind_group,
            debug_mode: DebugMode::Shaded,
        })
    }
}

impl GraphicsFlow<(), SceneEvent> for DeferredScene {
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
                    physical_key: PhysicalKey::Code(KeyCode::KeyM),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            self.debug_mode = self.debug_mode.next();
            log::info!("debug mode: {:?}", self.debug_mode);
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
        self.targets = RenderTargets::new(&ctx.device, width, height);
        Out::Empty
    }

    fn on_render(
        &mut self,
        ctx: &Context,
        _state: &mut (),
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        // Split the lights around the camera and upload this frame's batches.
        let (inside, outside) = self.lights.partition(ctx.camera.camera.position);
        self.outside.upload(
            &ctx.queue,
            &self.lights,
            outside.into_iter(),
            |light| light.radius,
            1.0,
        );
        self.inside.upload(
            &ctx.queue,
            &self.lights,
            inside.into_iter(),
            |light| light.radius,
            1.0,
        );
        self.markers.upload(
            &ctx.queue,
            &self.lights,
            0..self.lights.lights.len(),
            |_| MARKER_SCALE,
            0.05,
        );
        ctx.queue.write_buffer(
            &self.tonemap_buffer,
            0,
            bytemuck::cast_slice(&[[
                ctx.projection.znear,
                ctx.projection.zfar,
                self.debug_mode.as_index() as f32,
                0.0f32,
            ]]),
        );

        // Geometry into the G-buffer.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("G-Buffer Pass"),
                color_attachments: &[
                    cleared(&self.targets.albedo_view),
                    cleared(&self.targets.normal_view),
                    cleared(&self.targets.material_view),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.gbuffer_pipeline);
            pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            pass.set_bind_group(0, &self.floor.bind_group, &[]);
            pass.set_vertex_buffer(1, self.background_buffer.slice(..));
            self.quad_mesh.draw(&mut pass, 0..3);
            pass.set_bind_group(0, &self.cubes.bind_group, &[]);
            pass.set_vertex_buffer(1, self.cube_buffer.slice(..));
            self.cube_mesh.draw(&mut pass, 0..NUM_CUBES as u32);
        }

        // Fullscreen ambient, clearing the HDR target.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Ambient Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.hdr.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.ambient_pipeline);
            pass.set_bind_group(0, &self.targets.read_bind_group, &[]);
            pass.set_bind_group(1, &self.ambient_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        // Per-light volumes, depth attached read-only so the same depth can
        // be sampled for position reconstruction.
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Light Volume Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.hdr.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: None,
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.targets.read_bind_group, &[]);
            pass.set_bind_group(1, &ctx.camera.bind_group, &[]);

            self.outside
                .draw(&mut pass, &self.outside_pipeline, &self.volume_mesh);
            // The camera sits outside every light most frames, so an empty
            // inside set is skipped without complaint.
            if self.inside.count > 0 {
                self.inside
                    .draw(&mut pass, &self.inside_pipeline, &self.volume_mesh);
            }
            self.markers
                .draw(&mut pass, &self.marker_pipeline, &self.volume_mesh);
        }

        // Tone map (or debug-visualise) to the surface.
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Tonemap Pass"),
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
        pass.set_pipeline(&self.tonemap_pipeline);
        pass.set_bind_group(0, &self.targets.tonemap_bind_group, &[]);
        pass.set_bind_group(1, &self.tonemap_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
