// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! Executes [`FramePlan`]s against the GPU: owns the kernel pipelines, the
//! target pool, the uniform buffers and the per-parity bind groups, and
//! records one command batch per frame in strict RayGen -> Temporal ->
//! Spatial x3 -> Present order. Cross-frame ordering relies on queue
//! submission order; nothing is read back on the CPU.

use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use crate::camera::CameraBasis;
use crate::constants::SPATIAL_STEP_WIDTHS;
use crate::gpu::buffers::{create_storage_buffer, create_uniform_buffer, update_uniform_buffer};
use crate::gpu::{GpuContext, noise, pipeline};
use crate::render::frame;
use crate::render::plan::{FramePlan, FrameState, Pass};
use crate::render::settings::RenderSettings;
use crate::render::targets::{COLOR_FORMAT, GEOMETRY_FORMAT, RenderTargets};
use crate::render::uniforms::{PresentUniforms, RayGenUniforms, SpatialUniforms, TemporalUniforms};
use crate::scene::SceneDescriptor;
use crate::shaders::ShaderLibrary;

pub struct Renderer {
    pub gpu: GpuContext,
    state: FrameState,
    targets: RenderTargets,
    scene: SceneDescriptor,

    raygen_pipeline: wgpu::ComputePipeline,
    temporal_pipeline: wgpu::ComputePipeline,
    spatial_pipeline: wgpu::ComputePipeline,
    present_pipeline: wgpu::RenderPipeline,

    layouts: Layouts,
    statics: StaticBindings,
    groups: BindGroups,
}

/// Bind group layouts, kept so the groups can be rebuilt after a resize.
struct Layouts {
    raygen_bg0: wgpu::BindGroupLayout,
    raygen_bg1: wgpu::BindGroupLayout,
    temporal: wgpu::BindGroupLayout,
    spatial: wgpu::BindGroupLayout,
    present: wgpu::BindGroupLayout,
}

/// Resources that survive a resize: uniform buffers, immutable scene data,
/// the noise tile and the samplers.
struct StaticBindings {
    raygen_uniforms: wgpu::Buffer,
    temporal_uniforms: wgpu::Buffer,
    // One buffer per filter pass: all three are uploaded before the batch is
    // submitted, so a shared buffer would leave every pass reading the last
    // step width.
    spatial_uniforms: [wgpu::Buffer; 3],
    present_uniforms: wgpu::Buffer,

    material_buffer: wgpu::Buffer,
    plane_buffer: wgpu::Buffer,
    sphere_buffer: wgpu::Buffer,
    cylinder_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,

    noise_view: wgpu::TextureView,
    noise_sampler: wgpu::Sampler,
    present_sampler: wgpu::Sampler,
}

/// One bind group per kernel role; the double-buffered stages carry one
/// precomputed group per parity so a frame only selects, never mutates.
struct BindGroups {
    raygen_bg0: wgpu::BindGroup,
    raygen_bg1: wgpu::BindGroup,
    /// Indexed by the frame's read parity.
    temporal: [wgpu::BindGroup; 2],
    /// `spatial[parity][pass]`; the pass chain is read-slot -> ping ->
    /// pong -> ping, so the final image is always in `spatial_ping`.
    spatial: [[wgpu::BindGroup; 3]; 2],
    present: wgpu::BindGroup,
}

impl Renderer {
    pub fn new(window: Arc<Window>, scene: SceneDescriptor) -> Result<Self> {
        let gpu = GpuContext::new(window)?;
        let device = &gpu.device;
        let width = gpu.width();
        let height = gpu.height();

        let shaders = ShaderLibrary::builtin();
        let tracer_source = shaders.compose("tracer")?;
        let temporal_source = shaders.compose("svgf_temporal")?;
        let spatial_source = shaders.compose("svgf_spatial")?;
        let present_source = shaders.compose("present")?;

        let targets = RenderTargets::new(device, width, height);
        let (noise_texture, noise_view) = noise::create_noise_texture(device, &gpu.queue);
        // The view keeps the texture alive; the texture handle itself is not
        // needed again.
        drop(noise_texture);

        let noise_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("noise sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let present_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("present sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let settings = RenderSettings::default();
        let statics = StaticBindings {
            raygen_uniforms: create_uniform_buffer(
                device,
                &RayGenUniforms::new(
                    width,
                    height,
                    1,
                    &CameraBasis::look_along(glam::Vec3::ZERO, glam::Vec3::NEG_Z, 1.0, 1.0),
                    &scene,
                    &settings,
                ),
                "raygen uniforms",
            ),
            temporal_uniforms: create_uniform_buffer(
                device,
                &TemporalUniforms::new(width, height, 1, &settings),
                "temporal uniforms",
            ),
            spatial_uniforms: SPATIAL_STEP_WIDTHS.map(|step| {
                create_uniform_buffer(
                    device,
                    &SpatialUniforms::new(width, height, step, &settings),
                    &format!("spatial uniforms step {step}"),
                )
            }),
            present_uniforms: create_uniform_buffer(
                device,
                &PresentUniforms::new(&settings),
                "present uniforms",
            ),
            material_buffer: create_scene_buffer(device, &scene.gpu_materials(), "materials"),
            plane_buffer: create_scene_buffer(device, &scene.gpu_planes(), "planes"),
            sphere_buffer: create_scene_buffer(device, &scene.gpu_spheres(), "spheres"),
            cylinder_buffer: create_scene_buffer(device, &scene.gpu_cylinders(), "cylinders"),
            light_buffer: create_scene_buffer(device, &scene.gpu_rect_lights(), "rect_lights"),
            noise_view,
            noise_sampler,
            present_sampler,
        };

        let layouts = Layouts::new(device);

        let raygen_pipeline = pipeline::create_compute_pipeline(
            device,
            &tracer_source,
            &[&layouts.raygen_bg0, &layouts.raygen_bg1],
            "ray gen",
        );
        let temporal_pipeline = pipeline::create_compute_pipeline(
            device,
            &temporal_source,
            &[&layouts.temporal],
            "svgf temporal",
        );
        let spatial_pipeline = pipeline::create_compute_pipeline(
            device,
            &spatial_source,
            &[&layouts.spatial],
            "svgf spatial",
        );
        let present_pipeline = pipeline::create_present_pipeline(
            device,
            &present_source,
            gpu.surface_format(),
            &layouts.present,
        );

        let groups = BindGroups::new(device, &layouts, &statics, &targets);

        log::info!("Renderer initialized at {width}x{height}");

        Ok(Self {
            gpu,
            state: FrameState::new(),
            targets,
            scene,
            raygen_pipeline,
            temporal_pipeline,
            spatial_pipeline,
            present_pipeline,
            layouts,
            statics,
            groups,
        })
    }

    pub fn width(&self) -> u32 {
        self.gpu.width()
    }

    pub fn height(&self) -> u32 {
        self.gpu.height()
    }

    pub fn aspect(&self) -> f32 {
        self.gpu.width() as f32 / self.gpu.height() as f32
    }

    pub fn frame_index(&self) -> u32 {
        self.state.frame_index()
    }

    /// Recreate every viewport-sized resource and restart accumulation.
    /// All-or-nothing: the pool and every bind group referencing it are
    /// replaced before the next frame can observe them.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.targets = RenderTargets::new(&self.gpu.device, width, height);
        self.groups = BindGroups::new(&self.gpu.device, &self.layouts, &self.statics, &self.targets);
        self.state.invalidate_history();
        log::debug!("Resized render targets to {width}x{height}");
    }

    /// Discard accumulated history before the next frame (operator command).
    pub fn reset_history(&mut self) {
        self.state.invalidate_history();
    }

    /// Render one frame. A step is atomic from the caller's perspective:
    /// uniforms are captured, one command batch is recorded and submitted,
    /// and the history parity rotates for the next frame.
    pub fn step(&mut self, basis: &CameraBasis, pose_changed: bool, settings: &RenderSettings) {
        let plan = self.state.plan(pose_changed);
        self.upload_uniforms(&plan, basis, settings);

        if plan.seed_history {
            self.targets.zero_moments(&self.gpu.queue);
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.resize(self.gpu.width(), self.gpu.height());
                return;
            }
            Err(e) => {
                log::error!("Surface error: {e}");
                return;
            }
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let (width, height) = (self.targets.width, self.targets.height);
        for pass in plan.passes() {
            match pass {
                Pass::RayGen => frame::dispatch_kernel(
                    &mut encoder,
                    &self.raygen_pipeline,
                    &[&self.groups.raygen_bg0, &self.groups.raygen_bg1],
                    width,
                    height,
                    "ray gen pass",
                ),
                Pass::SeedHistory => {
                    self.targets.seed_history_color(&mut encoder, plan.history_read);
                }
                Pass::Temporal => frame::dispatch_kernel(
                    &mut encoder,
                    &self.temporal_pipeline,
                    &[&self.groups.temporal[plan.history_read]],
                    width,
                    height,
                    "svgf temporal pass",
                ),
                Pass::Spatial { pass_index, .. } => frame::dispatch_kernel(
                    &mut encoder,
                    &self.spatial_pipeline,
                    &[&self.groups.spatial[plan.history_read][pass_index]],
                    width,
                    height,
                    "svgf spatial pass",
                ),
                Pass::Present => frame::present_pass(
                    &mut encoder,
                    &self.present_pipeline,
                    &self.groups.present,
                    &surface_view,
                ),
            }
        }
        // Recorded after the temporal pass has consumed the previous copy.
        self.targets.carry_id_depth(&mut encoder);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Non-blocking poll reclaims completed resources; vsync paces frames.
        self.gpu.device.poll(wgpu::Maintain::Poll);

        self.state.advance(&plan);
    }

    /// Pack the per-frame uniform blocks. Each block is written once per
    /// frame before submission, so the batch captures consistent values.
    fn upload_uniforms(&self, plan: &FramePlan, basis: &CameraBasis, settings: &RenderSettings) {
        let (width, height) = (self.targets.width, self.targets.height);
        let queue = &self.gpu.queue;

        update_uniform_buffer(
            queue,
            &self.statics.raygen_uniforms,
            &RayGenUniforms::new(width, height, plan.frame_index, basis, &self.scene, settings),
        );
        update_uniform_buffer(
            queue,
            &self.statics.temporal_uniforms,
            &TemporalUniforms::new(width, height, plan.frame_index, settings),
        );
        for (buffer, &step) in self
            .statics
            .spatial_uniforms
            .iter()
            .zip(plan.spatial_steps.iter())
        {
            update_uniform_buffer(
                queue,
                buffer,
                &SpatialUniforms::new(width, height, step, settings),
            );
        }
        update_uniform_buffer(
            queue,
            &self.statics.present_uniforms,
            &PresentUniforms::new(settings),
        );
    }
}

/// wgpu requires non-empty buffers; a single zeroed record stands in for an
/// absent geometry class. Zeroed records are degenerate (zero radius, zero
/// area) and the kernels skip them.
fn create_scene_buffer<T: bytemuck::Pod + bytemuck::Zeroable>(
    device: &wgpu::Device,
    data: &[T],
    label: &str,
) -> wgpu::Buffer {
    if data.is_empty() {
        create_storage_buffer(device, &[T::zeroed()], label)
    } else {
        create_storage_buffer(device, data, label)
    }
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            raygen_bg0: create_raygen_bg0_layout(device),
            raygen_bg1: create_raygen_bg1_layout(device),
            temporal: create_temporal_bg_layout(device),
            spatial: create_spatial_bg_layout(device),
            present: create_present_bg_layout(device),
        }
    }
}

impl BindGroups {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        statics: &StaticBindings,
        targets: &RenderTargets,
    ) -> Self {
        let raygen_bg0 = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raygen bg0"),
            layout: &layouts.raygen_bg0,
            entries: &[
                buffer_entry(0, &statics.raygen_uniforms),
                texture_entry(1, &targets.radiance.view),
                texture_entry(2, &targets.albedo.view),
                texture_entry(3, &targets.normal_depth.view),
                texture_entry(4, &targets.motion.view),
                texture_entry(5, &targets.id_depth.view),
                texture_entry(6, &statics.noise_view),
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(&statics.noise_sampler),
                },
            ],
        });

        let raygen_bg1 = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raygen bg1"),
            layout: &layouts.raygen_bg1,
            entries: &[
                buffer_entry(0, &statics.material_buffer),
                buffer_entry(1, &statics.plane_buffer),
                buffer_entry(2, &statics.sphere_buffer),
                buffer_entry(3, &statics.cylinder_buffer),
                buffer_entry(4, &statics.light_buffer),
            ],
        });

        // read parity selects the "previous" history pair; the write pair is
        // always the opposite slot.
        let temporal = [0usize, 1].map(|read| {
            let write = read ^ 1;
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("temporal bg"),
                layout: &layouts.temporal,
                entries: &[
                    buffer_entry(0, &statics.temporal_uniforms),
                    texture_entry(1, &targets.radiance.view),
                    texture_entry(2, &targets.motion.view),
                    texture_entry(3, &targets.id_depth.view),
                    texture_entry(4, &targets.id_depth_prev.view),
                    texture_entry(5, &targets.history_color[read].view),
                    texture_entry(6, &targets.history_moments[read].view),
                    texture_entry(7, &targets.history_color[write].view),
                    texture_entry(8, &targets.history_moments[write].view),
                ],
            })
        });

        let spatial = [0usize, 1].map(|read| {
            let write = read ^ 1;
            let chain = [
                (&targets.history_color[write].view, &targets.spatial_ping.view),
                (&targets.spatial_ping.view, &targets.spatial_pong.view),
                (&targets.spatial_pong.view, &targets.spatial_ping.view),
            ];
            let mut pass_index = 0usize;
            chain.map(|(input, output)| {
                let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("spatial bg"),
                    layout: &layouts.spatial,
                    entries: &[
                        buffer_entry(0, &statics.spatial_uniforms[pass_index]),
                        texture_entry(1, input),
                        texture_entry(2, &targets.normal_depth.view),
                        texture_entry(3, &targets.history_moments[write].view),
                        texture_entry(4, output),
                    ],
                });
                pass_index += 1;
                bg
            })
        });

        let present = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("present bg"),
            layout: &layouts.present,
            entries: &[
                buffer_entry(0, &statics.present_uniforms),
                texture_entry(1, &targets.spatial_ping.view),
                texture_entry(2, &targets.radiance.view),
                texture_entry(3, &targets.normal_depth.view),
                texture_entry(4, &targets.motion.view),
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&statics.present_sampler),
                },
            ],
        });

        Self {
            raygen_bg0,
            raygen_bg1,
            temporal,
            spatial,
            present,
        }
    }
}

fn buffer_entry<'a>(binding: u32, buffer: &'a wgpu::Buffer) -> wgpu::BindGroupEntry<'a> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

fn texture_entry<'a>(binding: u32, view: &'a wgpu::TextureView) -> wgpu::BindGroupEntry<'a> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(view),
    }
}

fn uniform_layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_buffer_layout_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_texture_layout_entry(
    binding: u32,
    format: wgpu::TextureFormat,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

fn sampled_texture_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn create_raygen_bg0_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("raygen bg0 layout"),
        entries: &[
            uniform_layout_entry(0, wgpu::ShaderStages::COMPUTE),
            storage_texture_layout_entry(1, COLOR_FORMAT),
            storage_texture_layout_entry(2, COLOR_FORMAT),
            storage_texture_layout_entry(3, COLOR_FORMAT),
            storage_texture_layout_entry(4, GEOMETRY_FORMAT),
            storage_texture_layout_entry(5, GEOMETRY_FORMAT),
            sampled_texture_layout_entry(6, wgpu::ShaderStages::COMPUTE, true),
            wgpu::BindGroupLayoutEntry {
                binding: 7,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_raygen_bg1_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("raygen bg1 layout"),
        entries: &[
            storage_buffer_layout_entry(0),
            storage_buffer_layout_entry(1),
            storage_buffer_layout_entry(2),
            storage_buffer_layout_entry(3),
            storage_buffer_layout_entry(4),
        ],
    })
}

fn create_temporal_bg_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("temporal bg layout"),
        entries: &[
            uniform_layout_entry(0, wgpu::ShaderStages::COMPUTE),
            sampled_texture_layout_entry(1, wgpu::ShaderStages::COMPUTE, true),
            // rg32float is not filterable; the kernel uses textureLoad.
            sampled_texture_layout_entry(2, wgpu::ShaderStages::COMPUTE, false),
            sampled_texture_layout_entry(3, wgpu::ShaderStages::COMPUTE, false),
            sampled_texture_layout_entry(4, wgpu::ShaderStages::COMPUTE, false),
            sampled_texture_layout_entry(5, wgpu::ShaderStages::COMPUTE, true),
            sampled_texture_layout_entry(6, wgpu::ShaderStages::COMPUTE, true),
            storage_texture_layout_entry(7, COLOR_FORMAT),
            storage_texture_layout_entry(8, COLOR_FORMAT),
        ],
    })
}

fn create_spatial_bg_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("spatial bg layout"),
        entries: &[
            uniform_layout_entry(0, wgpu::ShaderStages::COMPUTE),
            sampled_texture_layout_entry(1, wgpu::ShaderStages::COMPUTE, true),
            sampled_texture_layout_entry(2, wgpu::ShaderStages::COMPUTE, true),
            sampled_texture_layout_entry(3, wgpu::ShaderStages::COMPUTE, true),
            storage_texture_layout_entry(4, COLOR_FORMAT),
        ],
    })
}

fn create_present_bg_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("present bg layout"),
        entries: &[
            uniform_layout_entry(0, wgpu::ShaderStages::FRAGMENT),
            sampled_texture_layout_entry(1, wgpu::ShaderStages::FRAGMENT, true),
            sampled_texture_layout_entry(2, wgpu::ShaderStages::FRAGMENT, true),
            sampled_texture_layout_entry(3, wgpu::ShaderStages::FRAGMENT, true),
            sampled_texture_layout_entry(4, wgpu::ShaderStages::FRAGMENT, false),
            wgpu::BindGroupLayoutEntry {
                binding: 5,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}
