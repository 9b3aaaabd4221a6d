// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_SKY_COLOR, DEFAULT_SKY_INTENSITY};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("{kind} {index} references material {material}, but only {count} materials exist")]
    MaterialIndexOutOfBounds {
        kind: &'static str,
        index: usize,
        material: u32,
        count: usize,
    },
    #[error("scene has no materials")]
    NoMaterials,
}

/// PBR metallic-roughness material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub base_color: [f32; 3],

    #[serde(default = "default_roughness")]
    pub roughness: f32,

    #[serde(default)]
    pub metallic: f32,

    #[serde(default)]
    pub emission: [f32; 3],
}

fn default_roughness() -> f32 {
    0.5
}

/// Infinite plane: `dot(n, p) + d = 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plane {
    pub normal: [f32; 3],
    pub distance: f32,
    pub material: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: u32,
}

/// Capped cylinder with a vertical (Y) axis; `center` is the midpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cylinder {
    pub center: [f32; 3],
    pub radius: f32,
    pub height: f32,
    pub material: u32,
}

/// Rectangular area light: center plus two edge half-vectors, emitting
/// `exitance` from the face the edge vectors span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectLight {
    pub center: [f32; 3],
    pub edge_u: [f32; 3],
    pub edge_v: [f32; 3],
    pub exitance: [f32; 3],
}

/// Immutable scene content, built once at startup and uploaded to the GPU.
/// Material indices are validated at construction; render code never checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub materials: Vec<Material>,

    #[serde(default)]
    pub planes: Vec<Plane>,

    #[serde(default)]
    pub spheres: Vec<Sphere>,

    #[serde(default)]
    pub cylinders: Vec<Cylinder>,

    #[serde(default)]
    pub rect_lights: Vec<RectLight>,

    #[serde(default = "default_sky_color")]
    pub sky_color: [f32; 3],

    #[serde(default = "default_sky_intensity")]
    pub sky_intensity: f32,
}

fn default_sky_color() -> [f32; 3] {
    DEFAULT_SKY_COLOR
}

fn default_sky_intensity() -> f32 {
    DEFAULT_SKY_INTENSITY
}

impl SceneDescriptor {
    /// The built-in demo scene: a dark room with a pedestal, a metal base,
    /// a small emissive marker and a ceiling area light.
    pub fn demo() -> Self {
        let scene = Self {
            materials: vec![
                Material {
                    base_color: [0.02, 0.02, 0.02],
                    roughness: 0.6,
                    metallic: 0.0,
                    emission: [0.0; 3],
                },
                Material {
                    base_color: [0.08, 0.08, 0.08],
                    roughness: 0.25,
                    metallic: 0.0,
                    emission: [0.0; 3],
                },
                Material {
                    base_color: [0.1, 0.1, 0.1],
                    roughness: 0.3,
                    metallic: 1.0,
                    emission: [0.0; 3],
                },
                Material {
                    base_color: [0.0, 0.0, 0.0],
                    roughness: 0.0,
                    metallic: 0.0,
                    emission: [25.0, 25.0, 25.0],
                },
            ],
            planes: vec![
                Plane {
                    normal: [0.0, 1.0, 0.0],
                    distance: 0.0,
                    material: 0,
                },
                Plane {
                    normal: [0.0, 0.0, 1.0],
                    distance: 3.0,
                    material: 0,
                },
            ],
            spheres: vec![
                Sphere {
                    center: [-0.45, 1.05, -2.2],
                    radius: 0.12,
                    material: 1,
                },
                Sphere {
                    center: [-0.45, 0.12, -2.2],
                    radius: 0.03,
                    material: 3,
                },
            ],
            cylinders: vec![
                Cylinder {
                    center: [-0.45, 0.5, -2.2],
                    radius: 0.12,
                    height: 1.0,
                    material: 1,
                },
                Cylinder {
                    center: [-0.45, 0.06, -2.2],
                    radius: 0.14,
                    height: 0.12,
                    material: 2,
                },
            ],
            rect_lights: vec![RectLight {
                center: [0.0, 2.4, -1.6],
                edge_u: [0.8, 0.0, 0.0],
                edge_v: [0.0, 0.0, -0.3],
                exitance: [3.0, 3.0, 3.0],
            }],
            sky_color: DEFAULT_SKY_COLOR,
            sky_intensity: DEFAULT_SKY_INTENSITY,
        };
        debug_assert!(scene.validate().is_ok());
        scene
    }

    /// Check every geometry record's material index against the material
    /// list. Called once at construction/load; failure is fatal.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.materials.is_empty() {
            return Err(SceneError::NoMaterials);
        }
        let count = self.materials.len();

        let check = |kind: &'static str, index: usize, material: u32| {
            if material as usize >= count {
                Err(SceneError::MaterialIndexOutOfBounds {
                    kind,
                    index,
                    material,
                    count,
                })
            } else {
                Ok(())
            }
        };

        for (i, p) in self.planes.iter().enumerate() {
            check("plane", i, p.material)?;
        }
        for (i, s) in self.spheres.iter().enumerate() {
            check("sphere", i, s.material)?;
        }
        for (i, c) in self.cylinders.iter().enumerate() {
            check("cylinder", i, c.material)?;
        }
        Ok(())
    }

    pub fn gpu_materials(&self) -> Vec<GpuMaterial> {
        self.materials.iter().map(GpuMaterial::from).collect()
    }

    pub fn gpu_planes(&self) -> Vec<GpuPlane> {
        self.planes
            .iter()
            .map(|p| {
                let n = glam::Vec3::from(p.normal).normalize_or_zero();
                GpuPlane {
                    normal: n.into(),
                    distance: p.distance,
                    material: p.material,
                    _pad: [0; 3],
                }
            })
            .collect()
    }

    pub fn gpu_spheres(&self) -> Vec<GpuSphere> {
        self.spheres
            .iter()
            .map(|s| GpuSphere {
                center: s.center,
                radius: s.radius,
                material: s.material,
                _pad: [0; 3],
            })
            .collect()
    }

    pub fn gpu_cylinders(&self) -> Vec<GpuCylinder> {
        self.cylinders
            .iter()
            .map(|c| GpuCylinder {
                center: c.center,
                radius: c.radius,
                height: c.height,
                material: c.material,
                _pad: [0; 2],
            })
            .collect()
    }

    pub fn gpu_rect_lights(&self) -> Vec<GpuRectLight> {
        self.rect_lights
            .iter()
            .map(|l| GpuRectLight {
                center: l.center,
                _pad0: 0.0,
                edge_u: l.edge_u,
                _pad1: 0.0,
                edge_v: l.edge_v,
                _pad2: 0.0,
                exitance: l.exitance,
                _pad3: 0.0,
            })
            .collect()
    }
}

/// Must match the WGSL `Material` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuMaterial {
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub emission: [f32; 3],
    pub metallic: f32,
}

impl From<&Material> for GpuMaterial {
    fn from(mat: &Material) -> Self {
        Self {
            base_color: mat.base_color,
            roughness: mat.roughness.max(0.04), // clamp to avoid singularity in GGX
            emission: mat.emission,
            metallic: mat.metallic,
        }
    }
}

/// Must match the WGSL `Plane` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuPlane {
    pub normal: [f32; 3],
    pub distance: f32,
    pub material: u32,
    pub _pad: [u32; 3],
}

/// Must match the WGSL `Sphere` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: u32,
    pub _pad: [u32; 3],
}

/// Must match the WGSL `Cylinder` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuCylinder {
    pub center: [f32; 3],
    pub radius: f32,
    pub height: f32,
    pub material: u32,
    pub _pad: [u32; 2],
}

/// Must match the WGSL `RectLight` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuRectLight {
    pub center: [f32; 3],
    pub _pad0: f32,
    pub edge_u: [f32; 3],
    pub _pad1: f32,
    pub edge_v: [f32; 3],
    pub _pad2: f32,
    pub exitance: [f32; 3],
    pub _pad3: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_validates() {
        assert!(SceneDescriptor::demo().validate().is_ok());
    }

    #[test]
    fn test_bad_material_index_rejected() {
        let mut scene = SceneDescriptor::demo();
        scene.spheres[0].material = 99;
        let err = scene.validate().unwrap_err();
        assert!(matches!(
            err,
            SceneError::MaterialIndexOutOfBounds {
                kind: "sphere",
                index: 0,
                material: 99,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_material_list_rejected() {
        let mut scene = SceneDescriptor::demo();
        scene.materials.clear();
        assert!(matches!(scene.validate(), Err(SceneError::NoMaterials)));
    }

    #[test]
    fn test_gpu_struct_sizes() {
        use std::mem::size_of;
        assert_eq!(size_of::<GpuMaterial>(), 32);
        assert_eq!(size_of::<GpuPlane>(), 32);
        assert_eq!(size_of::<GpuSphere>(), 32);
        assert_eq!(size_of::<GpuCylinder>(), 32);
        assert_eq!(size_of::<GpuRectLight>(), 64);
    }

    #[test]
    fn test_gpu_plane_normal_is_normalized() {
        let mut scene = SceneDescriptor::demo();
        scene.planes[0].normal = [0.0, 2.0, 0.0];
        let gpu = scene.gpu_planes();
        assert!((glam::Vec3::from(gpu[0].normal).length() - 1.0).abs() < 1e-6);
    }
}
