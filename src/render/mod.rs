// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod frame;
pub mod plan;
pub mod renderer;
pub mod settings;
pub mod targets;
pub mod uniforms;

pub use renderer::Renderer;
pub use settings::{Command, RenderSettings};
