use std::collections::HashSet;

use crate::coords::Vec2;

use super::types::{InputEvent, Key, MouseButton, TextEvent};

/// Transitions and motion accumulated during one frame.
///
/// [`InputState`](super::InputState) holds what is down right now; the frame
/// holds what changed since [`clear`](Self::clear) was last called.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,

    /// Pointer motion this frame, logical pixels.
    pub pointer_delta: Vec2,
    /// Wheel motion this frame, logical pixels.
    pub scroll_delta: Vec2,

    pub text: Vec<TextEvent>,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_delta = Vec2::zero();
        self.scroll_delta = Vec2::zero();
        self.text.clear();
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    pub fn pointer_moved(&self) -> bool {
        self.pointer_delta != Vec2::zero()
    }

    pub fn scrolled(&self) -> bool {
        self.scroll_delta != Vec2::zero()
    }
}
