// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::descriptor::SceneDescriptor;

/// Load and validate a scene description from a JSON file.
pub fn load_scene(path: &Path) -> Result<SceneDescriptor> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

    let scene: SceneDescriptor = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON scene file: {}", path.display()))?;

    scene
        .validate()
        .with_context(|| format!("Invalid scene file: {}", path.display()))?;

    log::info!(
        "Loaded scene: {} materials, {} planes, {} spheres, {} cylinders, {} lights",
        scene.materials.len(),
        scene.planes.len(),
        scene.spheres.len(),
        scene.cylinders.len(),
        scene.rect_lights.len(),
    );

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_round_trips_through_json() {
        let json = serde_json::to_string(&SceneDescriptor::demo()).unwrap();
        let scene: SceneDescriptor = serde_json::from_str(&json).unwrap();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.spheres.len(), 2);
    }

    #[test]
    fn test_minimal_scene_uses_defaults() {
        let json = r#"{
            "materials": [{ "base_color": [0.5, 0.5, 0.5] }],
            "spheres": [{ "center": [0, 1, 0], "radius": 1.0, "material": 0 }]
        }"#;
        let scene: SceneDescriptor = serde_json::from_str(json).unwrap();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.materials[0].roughness, 0.5);
        assert!(scene.planes.is_empty());
        assert!(scene.sky_intensity > 0.0);
    }
}
