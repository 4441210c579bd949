//! Forward-shaded scene: a checkered floor with two walls and a field of
//! instanced cubes, lit by a single moving point light. Everything renders
//! in one pass straight to the surface.

use cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3, Vector4};
use instant::Duration;
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::context::{Context, InitContext};
use crate::data_structures::geometry::{self, Mesh};
use crate::data_structures::instance::{self, Instance};
use crate::data_structures::light::{LightRig, PointLight};
use crate::data_structures::texture::Texture;
use crate::flow::{GraphicsFlow, Out};
use crate::pipelines::forward::mk_forward_pipeline;
use crate::pipelines::{material_layout, uniform_layout};
use crate::scenes::{forward_light_raw, Material, SceneEvent};

const NUM_CUBES: usize = 10;

/// Scatter cubes over the floor: the first one sits at the origin, the rest
/// are placed randomly and rotated in 20 degree steps around (1, 1, 1).
pub(crate) fn scatter_cubes(count: usize) -> Vec<Instance> {
    let mut rng = rand::thread_rng();
    let axis = Vector3::new(1.0, 1.0, 1.0).normalize();
    (0..count)
        .map(|i| {
            let position = if i == 0 {
                Vector3::new(0.0, 0.5, 0.0)
            } else {
                Vector3::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(1.0..5.0),
                    rng.gen_range(-5.0..5.0),
                )
            };
            Instance {
                position,
                rotation: Quaternion::from_axis_angle(axis, Deg(i as f32 * 20.0)),
                scale: Vector3::new(1.0, 1.0, 1.0),
            }
        })
        .collect()
}

/// The floor plus the two far walls, all instances of the unit quad.
pub(crate) fn background_instances() -> Vec<Instance> {
    vec![
        Instance {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::from_angle_x(Deg(0.0)),
            scale: Vector3::new(30.0, 1.0, 30.0),
        },
        Instance {
            position: Vector3::new(0.0, 0.0, 15.0),
            rotation: Quaternion::from_angle_x(Deg(-90.0)),
            scale: Vector3::new(30.0, 1.0, 30.0),
        },
        Instance {
            position: Vector3::new(15.0, 0.0, 0.0),
            rotation: Quaternion::from_angle_z(Deg(90.0)),
            scale: Vector3::new(30.0, 1.0, 30.0),
        },
    ]
}

pub(crate) fn floor_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<Material> {
    Ok(Material::new(
        device,
        layout,
        Texture::checkerboard(device, queue, 256, 16, [255, 255, 255], [127, 127, 127])?,
        Texture::create_default_normal_map(1, 1, device, queue),
        Texture::single_colour(device, queue, [64, 64, 64], true)?,
        Texture::single_colour(device, queue, [255, 255, 255], true)?,
        "floor_material",
    ))
}

pub(crate) fn cube_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<Material> {
    Ok(Material::new(
        device,
        layout,
        Texture::checkerboard(device, queue, 64, 8, [230, 150, 60], [60, 90, 200])?,
        Texture::create_default_normal_map(1, 1, device, queue),
        Texture::single_colour(device, queue, [200, 200, 200], true)?,
        Texture::single_colour(device, queue, [255, 255, 255], true)?,
        "cube_material",
    ))
}

pub struct InstancingScene {
    pipeline: wgpu::RenderPipeline,
    floor: Material,
    cubes: Material,
    quad_mesh: Mesh,
    cube_mesh: Mesh,
    background_buffer: wgpu::Buffer,
    cube_buffer: wgpu::Buffer,
    lights: LightRig,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
}

impl InstancingScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let device = &ctx.device;
        let pipeline = mk_forward_pipeline(
            device,
            &ctx.camera_bind_group_layout,
            ctx.config.format,
            Some(wgpu::BlendState::REPLACE),
            Some(Texture::DEPTH_STENCIL_FORMAT),
        );

        let materials = material_layout(device);
        let floor = floor_material(device, &ctx.queue, &materials)?;
        let cubes = cube_material(device, &ctx.queue, &materials)?;

        let quad_mesh = geometry::quad_normal_tangent_tex().upload(device, "quad");
        let cube_mesh = geometry::cube_normal_tangent_tex().upload(device, "cube");

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

        // One LDR light bobbing above the cubes.
        let lights = LightRig::new(
            vec![PointLight::new(
                Vector3::new(-3.0, 3.0, 0.0),
                Vector4::new(20.0, 20.0, 20.0, 0.005),
                Vector4::new(0.0, 1.0, 0.0, 0.0),
            )],
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 0.0, 0.0),
            Some(Vector3::new(-3.0, 3.0, 0.0)),
        );

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[forward_light_raw(&lights.lights[0], 1.0, 0.005)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light_bind_group"),
            layout: &uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "light_uniform_layout"),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            pipeline,
            floor,
            cubes,
            quad_mesh,
            cube_mesh,
            background_buffer,
            cube_buffer,
            lights,
            light_buffer,
            light_bind_group,
        })
    }
}

impl GraphicsFlow<(), SceneEvent> for InstancingScene {
    fn on_update(&mut self, _ctx: &Context, _state: &mut (), dt: Duration) -> Out<(), SceneEvent> {
        self.lights.advance(dt.as_secs_f32());
        Out::Empty
    }

    fn on_render(
        &mut self,
        ctx: &Context,
        _state: &mut (),
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        ctx.queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[forward_light_raw(&self.lights.lights[0], 1.0, 0.005)]),
        );

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Instancing Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
            })],
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

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
        render_pass.set_bind_group(2, &self.light_bind_group, &[]);

        render_pass.set_bind_group(0, &self.floor.bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.background_buffer.slice(..));
        self.quad_mesh.draw(&mut render_pass, 0..3);

        render_pass.set_bind_group(0, &self.cubes.bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.cube_buffer.slice(..));
        self.cube_mesh.draw(&mut render_pass, 0..NUM_CUBES as u32);
    }
}
