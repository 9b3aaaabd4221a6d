// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Every intermediate image of the pipeline, owned in one place and recreated
//! together on resize. Nothing outside this pool holds a texture view across
//! a resize; the renderer rebuilds its bind groups from the fresh pool.

use wgpu::TextureUsages as Tu;

use crate::constants::MOMENTS_BYTES_PER_PIXEL;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
// Motion and id/depth carry exact per-pixel values, not color; full f32.
pub const GEOMETRY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

pub struct Target {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

pub struct RenderTargets {
    pub width: u32,
    pub height: u32,

    // Ray-generation outputs, overwritten every frame
    pub radiance: Target,
    pub albedo: Target,
    pub normal_depth: Target,
    pub motion: Target,
    pub id_depth: Target,
    /// Last frame's id/depth, copied at the end of each batch; the temporal
    /// pass uses it to reject mismatched history.
    pub id_depth_prev: Target,

    // Temporal accumulation state, alternated by the frame parity
    pub history_color: [Target; 2],
    pub history_moments: [Target; 2],

    // Spatial filter scratch, reused across the three passes of one frame
    pub spatial_ping: Target,
    pub spatial_pong: Target,

    // Cached zero block for moments resets; avoids a multi-MB allocation
    // every time the camera moves.
    zero_block: Vec<u8>,
}

impl RenderTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let color = |label, extra: Tu| {
            create_target(
                device,
                width,
                height,
                COLOR_FORMAT,
                Tu::STORAGE_BINDING | Tu::TEXTURE_BINDING | extra,
                label,
            )
        };

        Self {
            width,
            height,
            radiance: color("radiance", Tu::COPY_SRC),
            albedo: color("albedo", Tu::empty()),
            normal_depth: color("normal_depth", Tu::empty()),
            motion: create_target(
                device,
                width,
                height,
                GEOMETRY_FORMAT,
                Tu::STORAGE_BINDING | Tu::TEXTURE_BINDING,
                "motion",
            ),
            id_depth: create_target(
                device,
                width,
                height,
                GEOMETRY_FORMAT,
                Tu::STORAGE_BINDING | Tu::TEXTURE_BINDING | Tu::COPY_SRC,
                "id_depth",
            ),
            id_depth_prev: create_target(
                device,
                width,
                height,
                GEOMETRY_FORMAT,
                Tu::TEXTURE_BINDING | Tu::COPY_DST,
                "id_depth_prev",
            ),
            history_color: [
                color("history_color_0", Tu::COPY_DST),
                color("history_color_1", Tu::COPY_DST),
            ],
            history_moments: [
                color("history_moments_0", Tu::COPY_DST),
                color("history_moments_1", Tu::COPY_DST),
            ],
            spatial_ping: color("spatial_ping", Tu::empty()),
            spatial_pong: color("spatial_pong", Tu::empty()),
            zero_block: vec![0u8; (width * height * MOMENTS_BYTES_PER_PIXEL) as usize],
        }
    }

    /// Zero-fill both moments buffers. Queue writes land before the frame's
    /// command batch executes, so this pairs with the in-batch seed copy.
    pub fn zero_moments(&self, queue: &wgpu::Queue) {
        for target in &self.history_moments {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &target.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &self.zero_block,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.width * MOMENTS_BYTES_PER_PIXEL),
                    rows_per_image: Some(self.height),
                },
                self.extent(),
            );
        }
    }

    /// Seed the given history slot with the just-traced radiance so
    /// accumulation restarts from one real sample instead of black.
    /// Must be recorded after the ray-generation dispatch.
    pub fn seed_history_color(&self, encoder: &mut wgpu::CommandEncoder, slot: usize) {
        encoder.copy_texture_to_texture(
            self.radiance.texture.as_image_copy(),
            self.history_color[slot].texture.as_image_copy(),
            self.extent(),
        );
    }

    /// Preserve this frame's id/depth for next frame's history rejection.
    /// Must be recorded after the temporal dispatch has consumed the old copy.
    pub fn carry_id_depth(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_texture(
            self.id_depth.texture.as_image_copy(),
            self.id_depth_prev.texture.as_image_copy(),
            self.extent(),
        );
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

fn create_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: Tu,
    label: &str,
) -> Target {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    Target { texture, view }
}
