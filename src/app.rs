// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::{Camera, CameraController, PoseTracker};
use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::input::handler;
use crate::render::{Renderer, RenderSettings};
use crate::scene::SceneDescriptor;

pub fn run(scene_path: Option<String>) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(scene_path);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    scene_path: Option<String>,
    state: Option<AppState>,
}

impl App {
    fn new(scene_path: Option<String>) -> Self {
        Self {
            scene_path,
            state: None,
        }
    }
}

struct AppState {
    window: Arc<Window>,
    renderer: Renderer,
    camera: Camera,
    controller: CameraController,
    pose: PoseTracker,
    settings: RenderSettings,
    last_frame: Instant,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop, &self.scene_path) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Failed to initialize: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        if let WindowEvent::KeyboardInput {
            event: key_event, ..
        } = &event
            && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
        {
            if state.controller.mouse_look_key {
                state.controller.mouse_look_key = false;
                state.set_cursor_grabbed(false);
                state.controller.clear_mouse_delta();
            } else if state.controller.mouse_captured {
                state.controller.mouse_captured = false;
            } else {
                event_loop.exit();
            }
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.handle_resize(*size);
            }
            WindowEvent::RedrawRequested => {
                state.update_and_render();
                state.window.request_redraw();
            }
            // Focus loss: release cursor and clear all input state so camera
            // doesn't keep moving when the user alt-tabs away.
            WindowEvent::Focused(false) => {
                state.controller.mouse_look_key = false;
                state.controller.mouse_captured = false;
                state.controller.clear_movement();
                state.controller.clear_mouse_delta();
                state.set_cursor_grabbed(false);
            }
            _ => {
                let was_mouse_look = state.controller.mouse_look_key;
                let was_captured = state.controller.mouse_captured;
                if let Some(command) = handler::handle_window_event(&event, &mut state.controller) {
                    if command.apply(&mut state.settings) {
                        state.renderer.reset_history();
                    }
                }
                if state.controller.mouse_look_key != was_mouse_look {
                    state.set_cursor_grabbed(state.controller.mouse_look_key);
                    state.controller.clear_mouse_delta();
                }
                if state.controller.mouse_captured != was_captured {
                    state.controller.clear_mouse_delta();
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state
            && let DeviceEvent::MouseMotion { delta: (dx, dy) } = event
        {
            state.controller.accumulate_raw_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }
}

impl AppState {
    fn new(event_loop: &ActiveEventLoop, scene_path: &Option<String>) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("SVGF Renderer")
                    .with_inner_size(PhysicalSize::new(
                        DEFAULT_WINDOW_WIDTH,
                        DEFAULT_WINDOW_HEIGHT,
                    )),
            )?,
        );

        let scene = match scene_path {
            Some(path) => crate::scene::loader::load_scene(Path::new(path))?,
            None => SceneDescriptor::demo(),
        };

        let renderer = Renderer::new(window.clone(), scene)?;
        let camera = Camera::default();
        let pose = PoseTracker::new(&camera);

        Ok(Self {
            window,
            renderer,
            camera,
            controller: CameraController::new(),
            pose,
            settings: RenderSettings::default(),
            last_frame: Instant::now(),
        })
    }

    fn set_cursor_grabbed(&self, grabbed: bool) {
        use winit::window::CursorGrabMode;
        self.window.set_cursor_visible(!grabbed);
        if grabbed {
            // Locked = true pointer lock (hides cursor, raw relative motion).
            // Supported on Windows, macOS, Wayland. Not supported on X11.
            // Confined = keeps cursor inside window bounds. Fallback for X11.
            if self.window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = self.window.set_cursor_grab(CursorGrabMode::Confined);
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.renderer.resize(size.width, size.height);
    }

    fn update_and_render(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.controller.update(&mut self.camera, dt);
        self.controller.apply_mouse_look(&mut self.camera);
        let pose_changed = self.pose.sample(&self.camera);

        let basis = self.camera.basis(self.renderer.aspect());
        self.renderer.step(&basis, pose_changed, &self.settings);
    }
}
