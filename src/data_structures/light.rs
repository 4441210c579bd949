//! Point lights and their animation along Lissajous curves.
//!
//! Every lit scene drives its lights along a parametric curve: each light
//! carries four curve parameters and the scene advances a shared time value.
//! Light range is derived from luminous intensity so attenuation can be cut
//! off once the contribution drops below a threshold.

use cgmath::{InnerSpace, Point3, Vector3, Vector4};

/// Ambient contribution carried in the alpha channel of light colours.
pub const AMBIENT_INTENSITY: f32 = 1e-3;

/// Attenuation value below which a light is treated as having no reach.
const INTENSITY_CUTOFF: f32 = 0.1;

/// Point on the Lissajous curve described by parameters `p` at time `t`.
pub fn lissajous(p: Vector4<f32>, t: f32) -> Vector3<f32> {
    Vector3::new(
        (p.x * t).sin(),
        (p.y * t).cos(),
        (p.z * t).sin() * (p.w * t).cos(),
    )
}

/// Perceived intensity of an HDR colour (Rec. 709 luma weights).
pub fn luminous_intensity(colour: Vector3<f32>) -> f32 {
    0.2126 * colour.x + 0.7152 * colour.y + 0.0722 * colour.z
}

/// Distance at which a light's inverse-square contribution falls below the
/// cutoff. Light volumes are scaled by this radius.
pub fn light_radius(colour: Vector3<f32>) -> f32 {
    (luminous_intensity(colour) / INTENSITY_CUTOFF).sqrt()
}

/// A point light moving along a Lissajous curve.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub position: Vector3<f32>,
    /// HDR colour in rgb, ambient intensity in alpha.
    pub colour: Vector4<f32>,
    /// Lissajous curve parameters.
    pub movement: Vector4<f32>,
    pub radius: f32,
}

impl PointLight {
    pub fn new(position: Vector3<f32>, colour: Vector4<f32>, movement: Vector4<f32>) -> Self {
        let radius = light_radius(colour.truncate());
        Self {
            position,
            colour,
            movement,
            radius,
        }
    }

    /// GPU representation, with the colour scaled by `attenuation`. The
    /// position's fourth component carries the radius.
    pub fn to_raw(&self, attenuation: f32) -> LightRaw {
        LightRaw {
            position_radius: [
                self.position.x,
                self.position.y,
                self.position.z,
                self.radius,
            ],
            colour: [
                self.colour.x * attenuation,
                self.colour.y * attenuation,
                self.colour.z * attenuation,
                self.colour.w,
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightRaw {
    pub position_radius: [f32; 4],
    pub colour: [f32; 4],
}

/// A set of animated point lights sharing a curve scale and offset.
///
/// The first light of a rig is the anchored key light: it moves on its raw
/// (unscaled) curve around `anchor` instead of the shared scaled curve. All
/// other lights move on `offset + lissajous(movement, t) * scale`.
#[derive(Debug)]
pub struct LightRig {
    pub lights: Vec<PointLight>,
    pub curve_scale: Vector3<f32>,
    pub curve_offset: Vector3<f32>,
    pub anchor: Option<Vector3<f32>>,
    time: f32,
}

impl LightRig {
    pub fn new(
        lights: Vec<PointLight>,
        curve_scale: Vector3<f32>,
        curve_offset: Vector3<f32>,
        anchor: Option<Vector3<f32>>,
    ) -> Self {
        let mut rig = Self {
            lights,
            curve_scale,
            curve_offset,
            anchor,
            time: 0.0,
        };
        rig.advance(0.0);
        rig
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the shared curve time and move every light to its new position.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        let t = self.time;
        let scale = self.curve_scale;
        let offset = self.curve_offset;
        let anchor = self.anchor;
        for (i, light) in self.lights.iter_mut().enumerate() {
            let curve = lissajous(light.movement, t);
            light.position = match (i, anchor) {
                (0, Some(anchor)) => anchor + curve,
                _ => {
                    offset
                        + Vector3::new(curve.x * scale.x, curve.y * scale.y, curve.z * scale.z)
                }
            };
        }
    }

    /// Split light indices into those whose volume contains `eye` and those
    /// whose volume doesn't. Inside volumes must be drawn back-facing with
    /// depth testing off, otherwise the front faces get clipped away.
    pub fn partition(&self, eye: Point3<f32>) -> (Vec<usize>, Vec<usize>) {
        let eye = Vector3::new(eye.x, eye.y, eye.z);
        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for (i, light) in self.lights.iter().enumerate() {
            let d = light.position - eye;
            if d.magnitude2() < light.radius * light.radius {
                inside.push(i);
            } else {
                outside.push(i);
            }
        }
        (inside, outside)
    }
}
