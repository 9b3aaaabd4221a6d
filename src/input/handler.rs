use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::CameraController;
use crate::render::Command;

/// Feed a window event into the camera controller. Movement keys set held
/// flags; command keys map 1:1 to the closed [`Command`] set and are
/// returned for the caller to dispatch.
pub fn handle_window_event(
    event: &WindowEvent,
    controller: &mut CameraController,
) -> Option<Command> {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state,
                    ..
                },
            ..
        } => {
            let pressed = *state == ElementState::Pressed;
            match key {
                KeyCode::KeyW => controller.forward = pressed,
                KeyCode::KeyS => controller.backward = pressed,
                KeyCode::KeyA => controller.left = pressed,
                KeyCode::KeyD => controller.right = pressed,
                KeyCode::Space => controller.up = pressed,
                KeyCode::ShiftLeft | KeyCode::ShiftRight => controller.down = pressed,
                KeyCode::KeyM => {
                    if pressed {
                        controller.mouse_look_key = !controller.mouse_look_key;
                    }
                }
                KeyCode::KeyT if pressed => return Some(Command::ToggleTemporal),
                KeyCode::KeyF if pressed => return Some(Command::ToggleSpatial),
                KeyCode::KeyV if pressed => return Some(Command::CycleDebugView),
                KeyCode::KeyP if pressed => return Some(Command::TogglePreset),
                KeyCode::KeyR if pressed => return Some(Command::ResetHistory),
                _ => {}
            }
            None
        }
        WindowEvent::MouseInput {
            button: MouseButton::Right,
            state,
            ..
        } => {
            controller.mouse_captured = *state == ElementState::Pressed;
            None
        }
        _ => None,
    }
}
