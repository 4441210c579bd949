//! The sample scenes, one per technique, each implemented as a
//! [`crate::flow::GraphicsFlow`] and run from its own binary under `demos/`.

use crate::data_structures::light::{LightRaw, PointLight};
use crate::data_structures::texture::Texture;

pub mod deferred;
pub mod flocking;
pub mod instancing;
pub mod shadow_volumes;
pub mod triangle;

/// Custom event type shared by the scenes. None of them sends custom events,
/// the type only fixes the flow's event parameter.
pub enum SceneEvent {}

/// A surface material: diffuse, normal, specular and occlusion maps bound
/// together with a shared sampler, matching
/// [`crate::pipelines::material_layout`].
pub struct Material {
    pub bind_group: wgpu::BindGroup,
    // The bind group only borrows the views, the textures have to outlive it.
    _textures: [Texture; 4],
    _sampler: wgpu::Sampler,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        diffuse: Texture,
        normal: Texture,
        specular: Texture,
        occlusion: Texture,
        label: &str,
    ) -> Self {
        let sampler = crate::data_structures::texture::create_default_sampler(device);
        let textures = [diffuse, normal, specular, occlusion];
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures[0].view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures[1].view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures[2].view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&textures[3].view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        Self {
            bind_group,
            _textures: textures,
            _sampler: sampler,
        }
    }
}

/// Light data for the forward shader, which repurposes the fourth position
/// component as a scale on the direct lighting terms.
pub(crate) fn forward_light_raw(light: &PointLight, direct: f32, ambient: f32) -> LightRaw {
    let mut raw = light.to_raw(1.0);
    raw.position_radius[3] = direct;
    raw.colour[3] = ambient;
    raw
}
