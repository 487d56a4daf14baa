use glam::Vec2;
use rustc_hash::FxHashSet;

/// Keys the camera controller reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Shift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Per-frame keyboard and mouse state supplied by the platform layer.
#[derive(Default, Debug, Clone)]
pub struct InputState {
    pub cursor_position: Vec2,
    /// Cursor motion since the previous frame, in pixels.
    pub cursor_delta: Vec2,
    /// Wheel motion since the previous frame.
    pub scroll_delta: Vec2,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    keys: FxHashSet<Key>,
    mouse_buttons: FxHashSet<MouseButton>,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-frame deltas.
    pub fn end_frame(&mut self) {
        self.cursor_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    pub fn handle_cursor_move(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        // first event only establishes the position
        if self.cursor_position != Vec2::ZERO {
            self.cursor_delta += position - self.cursor_position;
        }
        self.cursor_position = position;
    }

    pub fn handle_scroll(&mut self, x: f32, y: f32) {
        self.scroll_delta += Vec2::new(x, y);
    }

    pub fn set_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.mouse_buttons.insert(button);
        } else {
            self.mouse_buttons.remove(&button);
        }
    }

    #[must_use]
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }
}
