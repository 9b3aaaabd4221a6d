// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use glam::Vec3;

use crate::constants::{
    DEFAULT_CAMERA_PITCH, DEFAULT_CAMERA_POSITION, DEFAULT_CAMERA_YAW, DEFAULT_FOV_Y_DEG,
    POSE_EPSILON,
};

/// Free-look camera pose. Yaw/pitch in radians; yaw 0 looks down +X,
/// yaw -pi/2 looks down -Z.
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32, // vertical field of view, radians
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32, fov_y: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            fov_y,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        )
    }

    /// Horizontal strafe direction, independent of pitch.
    pub fn right_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn basis(&self, aspect: f32) -> CameraBasis {
        CameraBasis::look_along(self.position, self.forward(), aspect, self.fov_y)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::from(DEFAULT_CAMERA_POSITION),
            yaw: DEFAULT_CAMERA_YAW,
            pitch: DEFAULT_CAMERA_PITCH,
            fov_y: DEFAULT_FOV_Y_DEG.to_radians(),
        }
    }
}

/// Orthonormal right-handed view basis with `right`/`up` pre-scaled by the
/// viewport half extents, so a normalized pixel coordinate in [-1,1]^2 maps
/// to a ray direction as `forward + u*right + v*up`.
#[derive(Debug, Clone, Copy)]
pub struct CameraBasis {
    pub origin: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    pub fn look_along(origin: Vec3, dir: Vec3, aspect: f32, fov_y: f32) -> Self {
        let forward = dir.normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        // Wide viewports keep the vertical FOV fixed and widen horizontally;
        // tall viewports keep the horizontal FOV fixed instead.
        let (half_w, half_h) = if aspect >= 1.0 {
            let half_h = (fov_y * 0.5).tan();
            (half_h * aspect, half_h)
        } else {
            let half_w = (fov_y * 0.5).tan();
            (half_w, half_w / aspect)
        };

        Self {
            origin,
            right: right * half_w,
            up: up * half_h,
            forward,
        }
    }

    pub fn look_at(origin: Vec3, target: Vec3, aspect: f32, fov_y: f32) -> Self {
        Self::look_along(origin, target - origin, aspect, fov_y)
    }
}

/// Detects pose changes between frames. Deltas below `POSE_EPSILON` are
/// jitter and do not count as movement, so accumulated history survives them.
pub struct PoseTracker {
    last_position: Vec3,
    last_yaw: f32,
    last_pitch: f32,
}

impl PoseTracker {
    pub fn new(camera: &Camera) -> Self {
        Self {
            last_position: camera.position,
            last_yaw: camera.yaw,
            last_pitch: camera.pitch,
        }
    }

    /// Compare the camera pose against the last sampled one. Returns true
    /// (and re-baselines) if the camera moved or rotated beyond the epsilon.
    pub fn sample(&mut self, camera: &Camera) -> bool {
        let moved = camera.position.distance(self.last_position) > POSE_EPSILON
            || (camera.yaw - self.last_yaw).abs() > POSE_EPSILON
            || (camera.pitch - self.last_pitch).abs() > POSE_EPSILON;

        if moved {
            self.last_position = camera.position;
            self.last_yaw = camera.yaw;
            self.last_pitch = camera.pitch;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-5;

    fn default_basis(aspect: f32) -> CameraBasis {
        let cam = Camera::default();
        cam.basis(aspect)
    }

    #[test]
    fn test_basis_orthogonal_unit_forward() {
        for aspect in [0.4, 0.75, 1.0, 16.0 / 9.0, 3.2] {
            let b = default_basis(aspect);
            assert!((b.forward.length() - 1.0).abs() < TOL, "aspect {aspect}");
            assert!(b.right.dot(b.up).abs() < TOL);
            assert!(b.right.dot(b.forward).abs() < TOL);
            assert!(b.up.dot(b.forward).abs() < TOL);
        }
    }

    #[test]
    fn test_wide_aspect_scales_right_by_aspect() {
        for aspect in [1.0, 1.5, 16.0 / 9.0, 2.39] {
            let b = default_basis(aspect);
            assert!(
                (b.right.length() / b.up.length() - aspect).abs() < 1e-4,
                "aspect {aspect}"
            );
            // Vertical FOV held constant across wide aspects
            let expected_half_h = (Camera::default().fov_y * 0.5).tan();
            assert!((b.up.length() - expected_half_h).abs() < TOL);
        }
    }

    #[test]
    fn test_tall_aspect_holds_horizontal_fov() {
        let expected_half_w = (Camera::default().fov_y * 0.5).tan();
        for aspect in [0.3, 0.5, 0.9] {
            let b = default_basis(aspect);
            assert!(
                (b.right.length() - expected_half_w).abs() < TOL,
                "aspect {aspect}"
            );
            assert!((b.right.length() / b.up.length() - aspect).abs() < 1e-4);
        }
    }

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let b = default_basis(16.0 / 9.0);
        assert!(b.forward.z < 0.0);
        assert!(b.right.x > 0.0);
    }

    #[test]
    fn test_pose_tracker_epsilon_thresholds() {
        let mut cam = Camera::default();
        let mut tracker = PoseTracker::new(&cam);

        // Sub-epsilon jitter must not register as movement
        cam.position.x += 1e-6;
        assert!(!tracker.sample(&cam));

        // A real move must
        cam.position.z -= 1e-3;
        assert!(tracker.sample(&cam));

        // Once re-baselined, the same pose is quiescent again
        assert!(!tracker.sample(&cam));
    }

    #[test]
    fn test_pose_tracker_detects_rotation() {
        let mut cam = Camera::default();
        let mut tracker = PoseTracker::new(&cam);

        cam.yaw += 1e-3;
        assert!(tracker.sample(&cam));
        cam.pitch -= 1e-3;
        assert!(tracker.sample(&cam));
    }
}
