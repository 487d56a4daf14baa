use glam::Vec3;

use super::input::{InputState, Key, MouseButton};
use crate::scene::Camera;

/// World units per pixel of middle-button drag.
pub const PAN_SPEED: f32 = 0.008;

/// Fly-through controls for a [`Camera`].
///
/// - WASD moves in the view plane, Q/E down and up; Shift doubles the speed.
/// - Middle drag pans along the camera's right and up axes.
/// - Right drag looks around; pitch stays within the camera's limit.
/// - The wheel zooms by narrowing the field of view.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub pan_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            pan_speed: PAN_SPEED,
            zoom_speed: 1.0,
        }
    }
}

impl CameraController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame of input; returns whether the camera changed.
    pub fn update(&self, camera: &mut Camera, input: &InputState) -> bool {
        let mut moved = false;

        let mut velocity = camera.speed * input.delta_time;
        if input.is_key_pressed(Key::Shift) {
            velocity *= 2.0;
        }

        let bindings = [
            (Key::W, camera.front()),
            (Key::S, -camera.front()),
            (Key::A, -camera.right()),
            (Key::D, camera.right()),
            (Key::E, camera.up()),
            (Key::Q, -camera.up()),
        ];
        let mut step = Vec3::ZERO;
        for (key, direction) in bindings {
            if input.is_key_pressed(key) {
                step += direction;
            }
        }
        if step != Vec3::ZERO {
            camera.position += step * velocity;
            moved = true;
        }

        let delta = input.cursor_delta;
        if input.is_button_pressed(MouseButton::Middle) && delta.length_squared() > 0.0 {
            camera.position += (-camera.right() * delta.x + camera.up() * delta.y) * self.pan_speed;
            moved = true;
        }

        if moved {
            camera.update_view();
        }

        if input.is_button_pressed(MouseButton::Right) && delta.length_squared() > 0.0 {
            let yaw = camera.yaw() + delta.x * camera.sensitivity;
            let pitch = camera.pitch() - delta.y * camera.sensitivity;
            camera.set_orientation(yaw, pitch);
            moved = true;
        }

        if input.scroll_delta.y.abs() > f32::EPSILON {
            camera.zoom(input.scroll_delta.y * self.zoom_speed);
            moved = true;
        }

        moved
    }
}
