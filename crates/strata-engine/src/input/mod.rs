//! Input model.
//!
//! Platform-agnostic: [`platform`] translates windowing events into
//! [`InputEvent`]s, which [`InputState`] folds into held state and a
//! per-frame [`InputFrame`].

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
    PointerButtonEvent, PointerMoveEvent, TextEvent,
};
