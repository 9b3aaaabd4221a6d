// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::f32::consts::FRAC_PI_2;

// GPU / compute
pub const WORKGROUP_SIZE: u32 = 8;

// Edge-aware filter passes run with dyadic step widths, in this order.
pub const SPATIAL_STEP_WIDTHS: [u32; 3] = [1, 2, 4];

// Camera defaults
pub const DEFAULT_FOV_Y_DEG: f32 = 45.0;
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 1.0, 1.9];
pub const DEFAULT_CAMERA_YAW: f32 = -FRAC_PI_2;
pub const DEFAULT_CAMERA_PITCH: f32 = -0.1;

// Camera controller
pub const CAMERA_MOVE_SPEED: f32 = 2.0;
pub const CAMERA_DEFAULT_SENSITIVITY: f32 = 0.002; // radians per pixel
pub const CAMERA_PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
pub const CAMERA_RAW_ABSOLUTE_THRESHOLD: f64 = 5000.0;
pub const CAMERA_RAW_SCALE: f32 = 0.05;
pub const CAMERA_RAW_JUMP_THRESHOLD: f32 = 500.0;

// Pose deltas below this are sensor jitter, not movement; history survives them.
pub const POSE_EPSILON: f32 = 1e-5;

// Moments history: rgba16float = 8 bytes per pixel
pub const MOMENTS_BYTES_PER_PIXEL: u32 = 8;

// Screen-space noise tile
pub const NOISE_TEXTURE_SIZE: u32 = 128;

// Sky defaults
pub const DEFAULT_SKY_COLOR: [f32; 3] = [0.5, 0.7, 1.0];
pub const DEFAULT_SKY_INTENSITY: f32 = 0.3;

// Window defaults
pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;
