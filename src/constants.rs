//! Default Constant Blocks
//!
//! GPU-layout structs for the three conventional constant-buffer
//! categories. All are `#[repr(C)]` Pod types with explicit padding, sized
//! for std140-style binding; the library itself is generic over any Pod
//! constant types, these are the ones the classic terrain/water frame loop
//! uses.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Maximum number of lights carried in the pass constants.
pub const MAX_LIGHTS: usize = 16;

/// Per-object constants: one world matrix.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: Mat4,
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
        }
    }
}

/// One light, in the packed layout shared by directional, point and spot
/// lights. Unused fields stay zero for the variants that do not need them.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Light {
    /// Light color.
    pub strength: Vec3,
    /// Point/spot only.
    pub falloff_start: f32,
    /// Directional/spot only.
    pub direction: Vec3,
    /// Point/spot only.
    pub falloff_end: f32,
    /// Point/spot only.
    pub position: Vec3,
    /// Spot only.
    pub spot_power: f32,
}

/// Pass-global constants: camera matrices, timers, fog and lights.
/// Rewritten into the current frame slot every frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    pub view: Mat4,
    pub inv_view: Mat4,
    pub proj: Mat4,
    pub inv_proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,

    pub eye_pos: Vec3,
    pub near_z: f32,

    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub _pad0: f32,

    pub ambient_light: Vec4,

    pub fog_color: Vec4,
    pub fog_start: f32,
    pub fog_range: f32,
    pub _pad1: [f32; 2],

    pub lights: [Light; MAX_LIGHTS],
}

impl Default for PassConstants {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            inv_view_proj: Mat4::IDENTITY,
            eye_pos: Vec3::ZERO,
            near_z: 0.0,
            far_z: 0.0,
            total_time: 0.0,
            delta_time: 0.0,
            _pad0: 0.0,
            ambient_light: Vec4::ZERO,
            fog_color: Vec4::ZERO,
            fog_start: 0.0,
            fog_range: 0.0,
            _pad1: [0.0; 2],
            lights: [Light::default(); MAX_LIGHTS],
        }
    }
}

/// Per-material constants.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub diffuse_albedo: Vec4,
    pub fresnel_r0: Vec3,
    pub roughness: f32,
    /// UV transform, used by texture mapping.
    pub transform: Mat4,
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse_albedo: Vec4::ONE,
            fresnel_r0: Vec3::splat(0.01),
            roughness: 0.25,
            transform: Mat4::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_blocks_have_no_implicit_padding() {
        // Pod derivation already rejects implicit padding at compile time;
        // these pin the wire sizes so a field edit is a conscious choice.
        assert_eq!(size_of::<ObjectConstants>(), 64);
        assert_eq!(size_of::<Light>(), 48);
        assert_eq!(size_of::<MaterialConstants>(), 96);
        assert_eq!(
            size_of::<PassConstants>(),
            6 * 64 + 16 + 16 + 16 + 16 + 16 + MAX_LIGHTS * 48
        );
    }
}
