// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

#[allow(clippy::module_inception)]
pub mod camera;
pub mod controller;

pub use camera::{Camera, CameraBasis, PoseTracker};
pub use controller::CameraController;
