// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-layout uniform blocks shared with the WGSL kernels. Layouts are
//! positional; the `#[repr(C)]` structs here are the single source of truth
//! on the CPU side and the size assertions pin them at compile time.

use bytemuck::{Pod, Zeroable};

use crate::camera::CameraBasis;
use crate::render::settings::RenderSettings;
use crate::scene::SceneDescriptor;

/// Must match the WGSL `TracerUniforms` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct RayGenUniforms {
    pub resolution: [f32; 2],
    pub frame_index: u32,
    pub flags: u32,
    pub cam_pos: [f32; 4],
    pub cam_u: [f32; 4],
    pub cam_v: [f32; 4],
    pub cam_w: [f32; 4],
    pub sky_color: [f32; 3],
    pub sky_intensity: f32,
}

const _: () = assert!(std::mem::size_of::<RayGenUniforms>() == 96);

impl RayGenUniforms {
    pub fn new(
        width: u32,
        height: u32,
        frame_index: u32,
        basis: &CameraBasis,
        scene: &SceneDescriptor,
        settings: &RenderSettings,
    ) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            frame_index,
            flags: settings.preset.as_u32(),
            cam_pos: basis.origin.extend(0.0).into(),
            cam_u: basis.right.extend(0.0).into(),
            cam_v: basis.up.extend(0.0).into(),
            cam_w: basis.forward.extend(0.0).into(),
            sky_color: scene.sky_color,
            sky_intensity: scene.sky_intensity,
        }
    }
}

/// Must match the WGSL `TemporalUniforms` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TemporalUniforms {
    pub resolution: [f32; 2],
    pub frame_index: u32,
    pub flags: u32,
}

const _: () = assert!(std::mem::size_of::<TemporalUniforms>() == 16);

impl TemporalUniforms {
    pub fn new(width: u32, height: u32, frame_index: u32, settings: &RenderSettings) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            frame_index,
            flags: settings.temporal_filter as u32,
        }
    }
}

/// Must match the WGSL `SpatialUniforms` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpatialUniforms {
    pub resolution: [f32; 2],
    pub step_width: u32,
    pub flags: u32,
}

const _: () = assert!(std::mem::size_of::<SpatialUniforms>() == 16);

impl SpatialUniforms {
    pub fn new(width: u32, height: u32, step_width: u32, settings: &RenderSettings) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            step_width,
            flags: settings.spatial_filter as u32,
        }
    }
}

/// Must match the WGSL `PresentUniforms` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PresentUniforms {
    pub debug_view: u32,
    pub _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<PresentUniforms>() == 16);

impl PresentUniforms {
    pub fn new(settings: &RenderSettings) -> Self {
        Self {
            debug_view: settings.debug_view.as_u32(),
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::render::settings::QualityPreset;

    #[test]
    fn test_raygen_block_field_offsets() {
        // The kernels address this block positionally; pin the offsets.
        assert_eq!(std::mem::offset_of!(RayGenUniforms, resolution), 0);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, frame_index), 8);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, flags), 12);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, cam_pos), 16);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, cam_u), 32);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, cam_v), 48);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, cam_w), 64);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, sky_color), 80);
        assert_eq!(std::mem::offset_of!(RayGenUniforms, sky_intensity), 92);
    }

    #[test]
    fn test_raygen_block_carries_scaled_basis() {
        let cam = Camera::default();
        let basis = cam.basis(1920.0 / 1080.0);
        let scene = SceneDescriptor::demo();
        let settings = RenderSettings::default();
        let u = RayGenUniforms::new(1920, 1080, 7, &basis, &scene, &settings);

        assert_eq!(u.resolution, [1920.0, 1080.0]);
        assert_eq!(u.frame_index, 7);
        assert_eq!(u.flags, QualityPreset::Ultra.as_u32());
        assert_eq!(u.cam_u[..3], <[f32; 3]>::from(basis.right)[..]);
        assert_eq!(u.cam_v[..3], <[f32; 3]>::from(basis.up)[..]);
        assert_eq!(u.cam_w[..3], <[f32; 3]>::from(basis.forward)[..]);
        assert_eq!(u.cam_pos[3], 0.0);
    }

    #[test]
    fn test_feature_flags_pack_as_integers() {
        let settings = RenderSettings {
            temporal_filter: false,
            spatial_filter: true,
            ..Default::default()
        };
        assert_eq!(TemporalUniforms::new(8, 8, 1, &settings).flags, 0);
        assert_eq!(SpatialUniforms::new(8, 8, 2, &settings).flags, 1);
    }

    #[test]
    fn test_spatial_block_embeds_step_width() {
        let settings = RenderSettings::default();
        for step in [1, 2, 4] {
            assert_eq!(SpatialUniforms::new(8, 8, step, &settings).step_width, step);
        }
    }
}
