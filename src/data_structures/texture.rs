//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helper methods for creating depth textures, procedural checkerboards and
//! solid colours, and loading textures from image data.

use anyhow::*;
use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

/// A GPU texture with a view and optional sampler.
///
/// Wraps WGPU texture objects along with associated views and samplers.
/// Textures are used for colour maps, normal maps, depth, and other data
/// bound to shaders. Typically created via [`from_bytes`](Self::from_bytes),
/// [`checkerboard`](Self::checkerboard) or
/// [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Depth format for sampleable depth targets (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Combined depth-stencil format used by the window-sized depth buffer.
    /// The stencil aspect is what the shadow volume passes count into.
    pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat =
        wgpu::TextureFormat::Depth24PlusStencil8;

    /// Create the window-sized depth-stencil texture.
    ///
    /// The returned texture is suitable for use as a `RENDER_ATTACHMENT` in
    /// render passes, both for plain depth-testing and for stencil counting.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_STENCIL_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create a default normal map (neutral blue, representing no deformation).
    ///
    /// Returns a solid blue texture suitable as a default when no normal map is provided.
    /// This avoids the need to change shaders when normal maps are optional.
    pub fn create_default_normal_map(
        width: u32,
        height: u32,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Texture {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        // The blue/purple-ish colour that represents the default for normal maps
        let data: Vec<u8> = [127, 127, 255, 255]
            .iter()
            .cycle()
            .take(width as usize * height as usize * 4)
            .copied()
            .collect();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("default normal map"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Create a procedural checkerboard texture.
    ///
    /// `odd` and `even` are the two field colours, `checker_size` the edge
    /// length of one field in pixels.
    pub fn checkerboard(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u32,
        checker_size: u32,
        odd: [u8; 3],
        even: [u8; 3],
    ) -> Result<Self> {
        let pixels = checkerboard_pixels(size, checker_size, odd, even);
        let img = image::RgbaImage::from_raw(size, size, pixels)
            .context("checkerboard dimensions do not match the generated pixel data")?;
        Self::from_image(
            device,
            queue,
            &image::DynamicImage::ImageRgba8(img),
            Some("checkerboard"),
            false,
        )
    }

    /// Create a 1x1 solid colour texture.
    ///
    /// With `linear` set the data is treated as raw values rather than sRGB,
    /// which is what material property maps (specular, occlusion) want.
    pub fn single_colour(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        colour: [u8; 3],
        linear: bool,
    ) -> Result<Self> {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([colour[0], colour[1], colour[2], 255]));
        Self::from_image(
            device,
            queue,
            &image::DynamicImage::ImageRgba8(img),
            Some("single colour"),
            linear,
        )
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format`  is an optional file format hint (e.g., "png"). If None, auto-detect.
    /// * `is_normal_map` toggles between sRGB (false) and linear (true) colour space
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let img = match format {
            None => image::load_from_memory(bytes)?,
            Some(fmt) => {
                let format = ImageFormat::from_extension(fmt)
                    .with_context(|| format!("unknown image format hint {fmt}"))?;
                load_from_memory_with_format(bytes, format)?
            }
        };
        Self::from_image(device, queue, &img, Some(label), is_normal_map)
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        is_normal_map: bool,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_normal_map {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// RGBA pixel data of a square checkerboard. A field is odd when the sum of
/// its x and y field indices is odd.
pub fn checkerboard_pixels(size: u32, checker_size: u32, odd: [u8; 3], even: [u8; 3]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let is_odd = ((x / checker_size + y / checker_size) & 1) > 0;
            let colour = if is_odd { odd } else { even };
            pixels.extend_from_slice(&[colour[0], colour[1], colour[2], 255]);
        }
    }
    pixels
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
