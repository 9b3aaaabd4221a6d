use glam::Vec3;

use super::camera::Camera;
use crate::constants::{
    CAMERA_DEFAULT_SENSITIVITY, CAMERA_MOVE_SPEED, CAMERA_PITCH_LIMIT,
    CAMERA_RAW_ABSOLUTE_THRESHOLD, CAMERA_RAW_JUMP_THRESHOLD, CAMERA_RAW_SCALE,
};

/// FPS-style camera controller (WASD + mouse look).
pub struct CameraController {
    pub move_speed: f32,
    pub look_sensitivity: f32,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub mouse_captured: bool,
    pub mouse_look_key: bool,
    mouse_delta: (f32, f32),
    // Last raw device position (for VM absolute-coordinate detection)
    last_raw_pos: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            move_speed: CAMERA_MOVE_SPEED,
            look_sensitivity: Self::resolve_sensitivity(),
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            mouse_captured: false,
            mouse_look_key: false,
            mouse_delta: (0.0, 0.0),
            last_raw_pos: None,
        }
    }

    fn resolve_sensitivity() -> f32 {
        let Ok(val) = std::env::var("SVGF_MOUSE_SENS") else {
            return CAMERA_DEFAULT_SENSITIVITY;
        };
        match val.parse::<f32>() {
            Ok(sens) if sens > 0.0 && sens.is_finite() => {
                log::info!("SVGF_MOUSE_SENS={sens}");
                sens
            }
            _ => {
                log::warn!("SVGF_MOUSE_SENS={val:?} invalid, using default");
                CAMERA_DEFAULT_SENSITIVITY
            }
        }
    }

    /// Integrate held movement keys into the camera position. Movement rate
    /// is scaled by `dt` so it is independent of frame rate.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) {
        let step = self.move_speed * dt;
        let cam_forward = camera.forward();
        let cam_right = camera.right_flat();

        let mut delta = Vec3::ZERO;
        if self.forward {
            delta += cam_forward;
        }
        if self.backward {
            delta -= cam_forward;
        }
        if self.right {
            delta += cam_right;
        }
        if self.left {
            delta -= cam_right;
        }
        if self.up {
            delta += Vec3::Y;
        }
        if self.down {
            delta -= Vec3::Y;
        }

        if delta != Vec3::ZERO {
            camera.position += delta * step;
        }
    }

    /// Accumulate mouse movement from `DeviceEvent::MouseMotion`.
    ///
    /// Some VMs report absolute tablet coordinates (values in the thousands)
    /// instead of relative deltas. A threshold separates the two cases and
    /// converts absolute positions to relative deltas via frame differencing.
    pub fn accumulate_raw_delta(&mut self, x: f64, y: f64) {
        let is_absolute =
            x.abs() > CAMERA_RAW_ABSOLUTE_THRESHOLD || y.abs() > CAMERA_RAW_ABSOLUTE_THRESHOLD;

        let (dx, dy) = if !is_absolute {
            self.last_raw_pos = None;
            (x as f32, y as f32)
        } else {
            let delta = self.last_raw_pos.and_then(|(lx, ly)| {
                let dx = (x - lx) as f32;
                let dy = (y - ly) as f32;
                if (dx != 0.0 || dy != 0.0)
                    && dx.abs() < CAMERA_RAW_JUMP_THRESHOLD
                    && dy.abs() < CAMERA_RAW_JUMP_THRESHOLD
                {
                    Some((dx * CAMERA_RAW_SCALE, dy * CAMERA_RAW_SCALE))
                } else {
                    None
                }
            });
            self.last_raw_pos = Some((x, y));
            match delta {
                Some(d) => d,
                None => return,
            }
        };

        if self.mouse_captured || self.mouse_look_key {
            self.mouse_delta.0 += dx;
            self.mouse_delta.1 += dy;
        }
    }

    /// Apply accumulated mouse delta to camera rotation (called once per frame).
    /// Pitch is clamped short of the poles to keep the view basis well formed.
    pub fn apply_mouse_look(&mut self, camera: &mut Camera) {
        let (dx, dy) = self.mouse_delta;
        self.mouse_delta = (0.0, 0.0);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        camera.yaw -= dx * self.look_sensitivity;
        camera.pitch =
            (camera.pitch - dy * self.look_sensitivity).clamp(-CAMERA_PITCH_LIMIT, CAMERA_PITCH_LIMIT);
    }

    /// Discard buffered mouse delta (call when toggling mouse capture to avoid a jump).
    pub fn clear_mouse_delta(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.last_raw_pos = None;
    }

    /// Reset all movement flags (call on focus loss to prevent runaway movement).
    pub fn clear_movement(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
        self.up = false;
        self.down = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_is_frame_rate_independent() {
        let mut controller = CameraController::new();
        controller.forward = true;

        let mut cam_a = Camera::default();
        controller.update(&mut cam_a, 1.0);

        let mut cam_b = Camera::default();
        for _ in 0..10 {
            controller.update(&mut cam_b, 0.1);
        }

        assert!(cam_a.position.distance(cam_b.position) < 1e-4);
    }

    #[test]
    fn test_pitch_clamped_at_poles() {
        let mut controller = CameraController::new();
        controller.mouse_captured = true;
        let mut cam = Camera::default();

        // Large relative delta, still below the absolute-coordinate threshold
        controller.accumulate_raw_delta(0.0, -4000.0);
        controller.apply_mouse_look(&mut cam);
        assert!(cam.pitch <= CAMERA_PITCH_LIMIT);

        controller.accumulate_raw_delta(0.0, 4000.0);
        controller.apply_mouse_look(&mut cam);
        assert!(cam.pitch >= -CAMERA_PITCH_LIMIT);
    }

    #[test]
    fn test_absolute_coordinates_are_frame_differenced() {
        let mut controller = CameraController::new();
        controller.mouse_captured = true;
        let mut cam = Camera::default();
        let yaw = cam.yaw;

        // First absolute sample only establishes the baseline
        controller.accumulate_raw_delta(20_000.0, 10_000.0);
        controller.apply_mouse_look(&mut cam);
        assert_eq!(cam.yaw, yaw);

        // Second sample yields a small scaled delta
        controller.accumulate_raw_delta(20_010.0, 10_000.0);
        controller.apply_mouse_look(&mut cam);
        assert!((cam.yaw - yaw).abs() > 0.0);
    }

    #[test]
    fn test_uncaptured_mouse_is_ignored() {
        let mut controller = CameraController::new();
        let mut cam = Camera::default();
        let yaw = cam.yaw;

        controller.accumulate_raw_delta(50.0, 0.0);
        controller.apply_mouse_look(&mut cam);
        assert_eq!(cam.yaw, yaw);
    }
}
