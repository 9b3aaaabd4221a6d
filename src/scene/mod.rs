// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod descriptor;
pub mod loader;

pub use descriptor::SceneDescriptor;
