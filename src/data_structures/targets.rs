//! Offscreen render targets: the G-buffer and the HDR accumulation target.
//!
//! Deferred shading renders surface data into a set of screen-sized
//! attachments first and computes lighting from them afterwards. The layout
//! is kept deliberately small:
//!
//! * albedo:   Rgba8Unorm
//! * normal:   Rg16Float, xz of the world normal; y is reconstructed from the
//!             unit length with its sign tucked into the material target
//! * material: Rgba8Uint, (specularity, occlusion, sign bit of normal y, 0)
//! * depth:    Depth32Float, sampled by the lighting passes to reconstruct
//!             world positions
//!
//! Lighting accumulates into an Rgba16Float HDR target which a final pass
//! tone maps to the surface. Forward scenes with HDR light colours reuse
//! [`HdrTarget`] on its own.

use crate::data_structures::texture::Texture;

pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;
pub const MATERIAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Uint;
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

fn colour_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type,
        },
        count: None,
    }
}

/// Layout for the lighting passes reading the G-buffer: depth, albedo,
/// normal and material in bindings 0 to 3. Everything is read via
/// `textureLoad`, so nothing needs to be filterable.
pub fn gbuffer_read_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("gbuffer_read_layout"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(2, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(3, wgpu::TextureSampleType::Uint),
        ],
    })
}

/// Layout for the tone mapping pass: the G-buffer bindings plus the HDR
/// accumulation target in binding 4, for the debug visualisation modes.
pub fn tonemap_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("tonemap_layout"),
        entries: &[
            texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(2, wgpu::TextureSampleType::Float { filterable: false }),
            texture_entry(3, wgpu::TextureSampleType::Uint),
            texture_entry(4, wgpu::TextureSampleType::Float { filterable: false }),
        ],
    })
}

/// Layout for a pass reading a single HDR texture in binding 0.
pub fn hdr_read_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("hdr_read_layout"),
        entries: &[texture_entry(
            0,
            wgpu::TextureSampleType::Float { filterable: false },
        )],
    })
}

/// Screen-sized HDR accumulation target with a bind group for reading it
/// back in a tone mapping pass.
pub struct HdrTarget {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub read_bind_group: wgpu::BindGroup,
}

impl HdrTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (texture, view) = colour_target(device, width, height, HDR_FORMAT, "hdr_target");
        let layout = hdr_read_layout(device);
        let read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hdr_read_bind_group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });
        Self {
            texture,
            view,
            read_bind_group,
        }
    }
}

/// The full set of deferred shading attachments plus the bind groups the
/// lighting and tone mapping passes read them through. Recreated wholesale
/// on resize.
pub struct RenderTargets {
    #[allow(unused)]
    pub albedo: wgpu::Texture,
    pub albedo_view: wgpu::TextureView,
    #[allow(unused)]
    pub normal: wgpu::Texture,
    pub normal_view: wgpu::TextureView,
    #[allow(unused)]
    pub material: wgpu::Texture,
    pub material_view: wgpu::TextureView,
    #[allow(unused)]
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub hdr: HdrTarget,
    pub read_bind_group: wgpu::BindGroup,
    pub tonemap_bind_group: wgpu::BindGroup,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (albedo, albedo_view) =
            colour_target(device, width, height, ALBEDO_FORMAT, "gbuffer_albedo");
        let (normal, normal_view) =
            colour_target(device, width, height, NORMAL_FORMAT, "gbuffer_normal");
        let (material, material_view) =
            colour_target(device, width, height, MATERIAL_FORMAT, "gbuffer_material");

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gbuffer_depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Texture::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let hdr = HdrTarget::new(device, width, height);

        let read_layout = gbuffer_read_layout(device);
        let read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gbuffer_read_bind_group"),
            layout: &read_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&albedo_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&material_view),
                },
            ],
        });

        let tonemap_layout = tonemap_layout(device);
        let tonemap_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tonemap_bind_group"),
            layout: &tonemap_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&albedo_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&material_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&hdr.view),
                },
            ],
        });

        Self {
            albedo,
            albedo_view,
            normal,
            normal_view,
            material,
            material_view,
            depth,
            depth_view,
            hdr,
            read_bind_group,
            tonemap_bind_group,
        }
    }
}
