//! GPU compute flocking scene.
//!
//! A flock of a few thousand tetrahedral members chases a goal moving on a
//! Lissajous curve, which doubles as the scene's point light. The simulation
//! runs entirely on the GPU in a compute pass, ping-ponging between two
//! storage buffers; the draw pass renders the freshly written state.
//!
//! `T` toggles turbo mode (the simulation runs at ten times speed), `R` reads
//! the first member back to the CPU and logs its position.

use cgmath::{InnerSpace, Vector3, Vector4};
use instant::Duration;
use rand::Rng;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::context::{Context, InitContext};
use crate::data_structures::geometry::{self, Mesh};
use crate::data_structures::light::{LightRig, PointLight, AMBIENT_INTENSITY};
use crate::data_structures::targets::{self, HdrTarget};
use crate::data_structures::texture::Texture;
use crate::flow::{GraphicsFlow, Out};
use crate::pipelines::flock::{
    flock_compute_layout, mk_flock_compute_pipeline, mk_flock_draw_pipeline, FlockMember,
    SimParams, WORKGROUP_SIZE,
};
use crate::pipelines::point::{mk_point_pipeline, point_layout, PointUniform};
use crate::pipelines::tonemap::mk_hdr_blit_pipeline;
use crate::pipelines::{storage_layout, uniform_layout};
use crate::scenes::{forward_light_raw, SceneEvent};

const FLOCK_SIZE: u32 = 2048;
const TURBO_FACTOR: f32 = 10.0;

/// Build a member transform from its position and flight direction. The
/// columns are (aside, up, direction, position).
fn member_transform(position: Vector3<f32>, direction: Vector3<f32>) -> [[f32; 4]; 4] {
    let aside = Vector3::unit_y().cross(direction).normalize();
    let up = direction.cross(aside).normalize();
    [
        [aside.x, aside.y, aside.z, 0.0],
        [up.x, up.y, up.z, 0.0],
        [direction.x, direction.y, direction.z, 0.0],
        [position.x, position.y, position.z, 1.0],
    ]
}

/// Random starting state: positions spread through a large cube, small
/// random velocities.
pub(crate) fn initial_members(count: u32) -> Vec<FlockMember> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let position = Vector3::new(
                rng.gen_range(-150.0..150.0),
                rng.gen_range(-150.0..150.0),
                rng.gen_range(-150.0..150.0),
            );
            let velocity = Vector3::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
                rng.gen_range(-0.5..0.5),
            );
            let direction = if velocity.magnitude2() > 0.0 {
                velocity.normalize()
            } else {
                Vector3::unit_z()
            };
            FlockMember {
                transformation: member_transform(position, direction),
                velocity: [velocity.x, velocity.y, velocity.z, 0.0],
            }
        })
        .collect()
}

pub struct FlockingScene {
    compute_pipeline: wgpu::ComputePipeline,
    draw_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    hdr: HdrTarget,
    tetra_mesh: Mesh,
    member_buffers: [wgpu::Buffer; 2],
    compute_bind_groups: [wgpu::BindGroup; 2],
    draw_bind_groups: [wgpu::BindGroup; 2],
    sim_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    point_buffer: wgpu::Buffer,
    point_bind_group: wgpu::BindGroup,
    readback_buffer: wgpu::Buffer,
    lights: LightRig,
    frame: u32,
    frame_dt: f32,
    turbo: bool,
    read_requested: bool,
    readback_pending: bool,
}

impl FlockingScene {
    pub async fn new(ctx: &InitContext) -> anyhow::Result<Self> {
        let device = &ctx.device;

        let compute_pipeline = mk_flock_compute_pipeline(device);
        let draw_pipeline = mk_flock_draw_pipeline(device, &ctx.camera_bind_group_layout);
        let point_pipeline = mk_point_pipeline(
            device,
            &ctx.camera_bind_group_layout,
            targets::HDR_FORMAT,
            Texture::DEPTH_STENCIL_FORMAT,
        );
        let blit_pipeline = mk_hdr_blit_pipeline(device, ctx.config.format);
        let hdr = HdrTarget::new(device, ctx.config.width, ctx.config.height);

        let tetra_mesh = geometry::tetrahedron().upload(device, "tetrahedron");

        let members = initial_members(FLOCK_SIZE);
        let member_size =
            (FLOCK_SIZE as usize * std::mem::size_of::<FlockMember>()) as wgpu::BufferAddress;
        let mk_member_buffer = |label| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: member_size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST
                    | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            });
            ctx.queue
                .write_buffer(&buffer, 0, bytemuck::cast_slice(&members));
            buffer
        };
        let member_buffers = [
            mk_member_buffer("Flock Member Buffer A"),
            mk_member_buffer("Flock Member Buffer B"),
        ];

        let sim_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Sim Buffer"),
            size: std::mem::size_of::<SimParams>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let compute_layout = flock_compute_layout(device);
        let mk_compute_bind_group = |read: usize, write: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("flock_compute_bind_group"),
                layout: &compute_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: member_buffers[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: member_buffers[write].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: sim_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let compute_bind_groups = [mk_compute_bind_group(0, 1), mk_compute_bind_group(1, 0)];

        let draw_layout =
            storage_layout(device, wgpu::ShaderStages::VERTEX, "flock_members_layout");
        let mk_draw_bind_group = |i: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("flock_draw_bind_group"),
                layout: &draw_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: member_buffers[i].as_entire_binding(),
                }],
            })
        };
        let draw_bind_groups = [mk_draw_bind_group(0), mk_draw_bind_group(1)];

        // The goal the flock chases is also the scene's light.
        let lights = LightRig::new(
            vec![PointLight::new(
                Vector3::new(0.0, 0.0, 0.0),
                Vector4::new(100.0, 100.0, 100.0, AMBIENT_INTENSITY),
                Vector4::new(0.34, 0.29, 0.12, 0.5),
            )],
            Vector3::new(35.0, 25.0, 60.0),
            Vector3::new(0.0, 0.0, 0.0),
            None,
        );

        let light_layout =
            uniform_layout(device, wgpu::ShaderStages::FRAGMENT, "light_uniform_layout");
        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Light Buffer"),
            size: std::mem::size_of::<crate::data_structures::light::LightRaw>()
                as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flock_light_bind_group"),
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let point_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Marker Buffer"),
            size: std::mem::size_of::<PointUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let point_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flock_marker_bind_group"),
            layout: &point_layout(device),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: point_buffer.as_entire_binding(),
            }],
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Flock Readback Buffer"),
            size: std::mem::size_of::<FlockMember>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            compute_pipeline,
            draw_pipeline,
            point_pipeline,
            blit_pipeline,
            hdr,
            tetra_mesh,
            member_buffers,
            compute_bind_groups,
            draw_bind_groups,
            sim_buffer,
            light_buffer,
            light_bind_group,
            point_buffer,
            point_bind_group,
            readback_buffer,
            lights,
            frame: 0,
            frame_dt: 0.0,
            turbo: false,
            read_requested: false,
            readback_pending: false,
        })
    }

    /// Map the staging buffer filled by the last frame's copy and log the
    /// first member's position.
    async fn log_first_member(&self, device: &wgpu::Device) -> anyhow::Result<()> {
        let slice = self.readback_buffer.slice(..);
        // The mapping has to be created and then polled before awaiting the
        // result, otherwise the application freezes.
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })?;
        match rx.receive().await {
            Some(Ok(())) => (),
            _ => anyhow::bail!("mapping the readback buffer failed"),
        }
        {
            let data = slice.get_mapped_range();
            let member: &FlockMember = bytemuck::from_bytes(&data);
            let p = member.transformation[3];
            log::info!("flock member 0 at ({:.2}, {:.2}, {:.2})", p[0], p[1], p[2]);
        }
        self.readback_buffer.unmap();
        Ok(())
    }
}

impl GraphicsFlow<(), SceneEvent> for FlockingScene {
    fn on_update(&mut self, ctx: &Context, _state: &mut (), dt: Duration) -> Out<(), SceneEvent> {
        let dt = dt.as_secs_f32();
        self.lights.advance(dt);
        self.frame_dt = if self.turbo { dt * TURBO_FACTOR } else { dt };

        if self.readback_pending {
            self.readback_pending = false;
            if let Err(e) = futures::executor::block_on(self.log_first_member(&ctx.device)) {
                log::error!("flock readback failed: {}", e);
            }
        }
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
                    physical_key: PhysicalKey::Code(code),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            match code {
                KeyCode::KeyT => {
                    self.turbo = !self.turbo;
                    log::info!("turbo: {}", self.turbo);
                }
                KeyCode::KeyR => self.read_requested = true,
                _ => (),
            }
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
        let light = &self.lights.lights[0];
        let goal = light.position;
        ctx.queue.write_buffer(
            &self.sim_buffer,
            0,
            bytemuck::cast_slice(&[SimParams {
                goal_dt: [goal.x, goal.y, goal.z, self.frame_dt],
            }]),
        );
        ctx.queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[forward_light_raw(light, 1.0, AMBIENT_INTENSITY)]),
        );
        ctx.queue.write_buffer(
            &self.point_buffer,
            0,
            bytemuck::cast_slice(&[PointUniform {
                position_size: [goal.x, goal.y, goal.z, 0.02],
                colour: [
                    light.colour.x * 0.05,
                    light.colour.y * 0.05,
                    light.colour.z * 0.05,
                    1.0,
                ],
            }]),
        );

        let read = (self.frame & 1) as usize;
        let write = read ^ 1;

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flock Update Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.compute_pipeline);
            pass.set_bind_group(0, &self.compute_bind_groups[read], &[]);
            pass.dispatch_workgroups(FLOCK_SIZE / WORKGROUP_SIZE, 1, 1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Flock Draw Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr.view,
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
            pass.set_pipeline(&self.draw_pipeline);
            pass.set_bind_group(0, &self.draw_bind_groups[write], &[]);
            pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            pass.set_bind_group(2, &self.light_bind_group, &[]);
            self.tetra_mesh.draw(&mut pass, 0..FLOCK_SIZE);

            pass.set_pipeline(&self.point_pipeline);
            pass.set_bind_group(0, &ctx.camera.bind_group, &[]);
            pass.set_bind_group(1, &self.point_bind_group, &[]);
            pass.draw(0..6, 0..1);
        }

        if self.read_requested {
            self.read_requested = false;
            encoder.copy_buffer_to_buffer(
                &self.member_buffers[write],
                0,
                &self.readback_buffer,
                0,
                std::mem::size_of::<FlockMember>() as wgpu::BufferAddress,
            );
            self.readback_pending = true;
        }

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

        self.frame += 1;
    }
}
