use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;
use winit::window::Window;

use crate::camera::{self, CameraResources, CameraUniform, Projection};
use crate::data_structures::texture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

#[derive(Debug)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
}

/// Central GPU state shared by every scene: window, surface, device/queue,
/// the surface-sized depth-stencil buffer and the camera resources.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub mouse: MouseState,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
    /// Whether the adapter supports unclipped depth. The shadow volume
    /// pipelines use it in place of depth clamping so far caps never get
    /// clipped away.
    pub depth_clamp: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Context> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let depth_clamp = adapter
            .features()
            .contains(wgpu::Features::DEPTH_CLIP_CONTROL);
        let mut required_features = wgpu::Features::empty();
        if depth_clamp {
            required_features |= wgpu::Features::DEPTH_CLIP_CONTROL;
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The WGSL in this crate assumes an Srgb surface format.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface supports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::Camera::new((0.0, 6.0, -14.0), cgmath::Deg(90.0), cgmath::Deg(-15.0));
        let projection =
            camera::Projection::new(config.width, config.height, cgmath::Deg(45.0), 0.1, 500.0);
        let camera_controller = camera::CameraController::new(5.0, 0.5);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let bind_group_layout = camera_bind_group_layout.clone();

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controller: camera_controller,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout,
        };

        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        Ok(Context {
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            mouse: MouseState {
                coords: PhysicalPosition::new(0.0, 0.0),
                pressed: MouseButtonState::None,
            },
            clear_colour: wgpu::Color {
                r: 0.01,
                g: 0.02,
                b: 0.04,
                a: 1.0,
            },
            tick_duration_millis: 16,
            depth_clamp,
            window,
            depth_texture,
        })
    }
}

/// The subset of [`Context`] handed to flow constructors. All wgpu handles
/// are reference counted, cloning them out of the context is cheap.
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub depth_clamp: bool,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        InitContext {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            config: ctx.config.clone(),
            camera_bind_group_layout: ctx.camera.bind_group_layout.clone(),
            depth_clamp: ctx.depth_clamp,
        }
    }
}
