use std::fmt;

use strata_engine::coords::Vec2;
use strata_engine::error::{CoreError, Result};
use strata_engine::input::{InputFrame, InputState, Key, MouseButton};
use strata_engine::ObjectId;

/// Kind of interaction a widget can react to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ActionTarget {
    /// Bound input went down this frame.
    Pressed,
    /// Bound input went up this frame.
    Released,
    /// Bound input is down.
    Held,
    /// Bound mouse button is down and the pointer moved. Mouse only.
    Dragged,
    /// Pointer is over the widget and nothing is on top of it.
    Hovered,
    /// Wheel moved while hovered.
    Scrolled,
}

impl ActionTarget {
    pub const ALL: [ActionTarget; 6] = [
        ActionTarget::Pressed,
        ActionTarget::Released,
        ActionTarget::Held,
        ActionTarget::Dragged,
        ActionTarget::Hovered,
        ActionTarget::Scrolled,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionTarget::Pressed => "pressed",
            ActionTarget::Released => "released",
            ActionTarget::Held => "held",
            ActionTarget::Dragged => "dragged",
            ActionTarget::Hovered => "hovered",
            ActionTarget::Scrolled => "scrolled",
        }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input a button-style slot listens to. A slot holds exactly one, so binding
/// a mouse button replaces a key binding and vice versa.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum InputBinding {
    Mouse(MouseButton),
    Key(Key),
}

/// Delivered to a callback when its slot fires.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    pub widget: ObjectId,
    pub action: ActionTarget,
    pub binding: Option<InputBinding>,
    /// Pointer position, logical pixels.
    pub pointer: Option<Vec2>,
    pub pointer_delta: Vec2,
    pub scroll_delta: Vec2,
}

pub type EventCallback = Box<dyn FnMut(&WidgetEvent)>;

struct BoundSlot {
    binding: InputBinding,
    callback: EventCallback,
}

/// Per-widget callbacks, at most one per [`ActionTarget`].
///
/// Assigning a callback replaces the previous one silently.
#[derive(Default)]
pub struct EventTable {
    pressed: Option<BoundSlot>,
    released: Option<BoundSlot>,
    held: Option<BoundSlot>,
    dragged: Option<BoundSlot>,
    hovered: Option<EventCallback>,
    scrolled: Option<EventCallback>,
}

/// What the scene knows about one widget for one frame.
#[derive(Debug, Copy, Clone)]
pub struct DispatchInput<'a> {
    /// Whether the widget is the topmost hit under the pointer.
    pub hovered: bool,
    pub state: &'a InputState,
    pub frame: &'a InputFrame,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `action` to `button`. Hover and scroll take no binding.
    pub fn set_mouse_event(
        &mut self,
        action: ActionTarget,
        button: MouseButton,
        callback: impl FnMut(&WidgetEvent) + 'static,
    ) -> Result<()> {
        let slot = self.bound_slot_mut(action, "mouse")?;
        *slot = Some(BoundSlot {
            binding: InputBinding::Mouse(button),
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Binds `action` to `key`. Dragging is mouse-only.
    pub fn set_key_event(
        &mut self,
        action: ActionTarget,
        key: Key,
        callback: impl FnMut(&WidgetEvent) + 'static,
    ) -> Result<()> {
        if action == ActionTarget::Dragged {
            return Err(unsupported(action, "key"));
        }
        let slot = self.bound_slot_mut(action, "key")?;
        *slot = Some(BoundSlot {
            binding: InputBinding::Key(key),
            callback: Box::new(callback),
        });
        Ok(())
    }

    pub fn set_hover_event(&mut self, callback: impl FnMut(&WidgetEvent) + 'static) {
        self.hovered = Some(Box::new(callback));
    }

    pub fn set_scroll_event(&mut self, callback: impl FnMut(&WidgetEvent) + 'static) {
        self.scrolled = Some(Box::new(callback));
    }

    pub fn binding(&self, action: ActionTarget) -> Option<InputBinding> {
        self.bound_slot(action)?.as_ref().map(|s| s.binding)
    }

    pub fn mouse_binding(&self, action: ActionTarget) -> Option<MouseButton> {
        match self.binding(action)? {
            InputBinding::Mouse(b) => Some(b),
            InputBinding::Key(_) => None,
        }
    }

    pub fn key_binding(&self, action: ActionTarget) -> Option<Key> {
        match self.binding(action)? {
            InputBinding::Key(k) => Some(k),
            InputBinding::Mouse(_) => None,
        }
    }

    pub fn is_set(&self, action: ActionTarget) -> bool {
        match action {
            ActionTarget::Hovered => self.hovered.is_some(),
            ActionTarget::Scrolled => self.scrolled.is_some(),
            other => self.binding(other).is_some(),
        }
    }

    /// Drops the callback and its binding.
    pub fn clear(&mut self, action: ActionTarget) {
        match action {
            ActionTarget::Pressed => self.pressed = None,
            ActionTarget::Released => self.released = None,
            ActionTarget::Held => self.held = None,
            ActionTarget::Dragged => self.dragged = None,
            ActionTarget::Hovered => self.hovered = None,
            ActionTarget::Scrolled => self.scrolled = None,
        }
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// Actions whose condition holds this frame, in [`ActionTarget::ALL`] order.
    ///
    /// Mouse-bound slots need the widget hovered; key-bound slots do not.
    pub fn triggered(&self, input: &DispatchInput<'_>) -> Vec<ActionTarget> {
        ActionTarget::ALL
            .into_iter()
            .filter(|&action| self.condition_holds(action, input))
            .collect()
    }

    fn condition_holds(&self, action: ActionTarget, input: &DispatchInput<'_>) -> bool {
        let DispatchInput { hovered, state, frame } = *input;
        match action {
            ActionTarget::Hovered => self.hovered.is_some() && hovered,
            ActionTarget::Scrolled => self.scrolled.is_some() && hovered && frame.scrolled(),
            _ => match self.binding(action) {
                None => false,
                Some(InputBinding::Mouse(button)) => {
                    hovered
                        && match action {
                            ActionTarget::Pressed => frame.button_pressed(button),
                            ActionTarget::Released => frame.button_released(button),
                            ActionTarget::Held => state.button_down(button),
                            ActionTarget::Dragged => state.button_down(button) && frame.pointer_moved(),
                            _ => false,
                        }
                }
                Some(InputBinding::Key(key)) => match action {
                    ActionTarget::Pressed => frame.key_pressed(key),
                    ActionTarget::Released => frame.key_released(key),
                    ActionTarget::Held => state.key_down(key),
                    _ => false,
                },
            },
        }
    }

    /// Invokes the callback for `event.action`, if any.
    pub fn invoke(&mut self, event: &WidgetEvent) {
        let callback = match event.action {
            ActionTarget::Pressed => self.pressed.as_mut().map(|s| &mut s.callback),
            ActionTarget::Released => self.released.as_mut().map(|s| &mut s.callback),
            ActionTarget::Held => self.held.as_mut().map(|s| &mut s.callback),
            ActionTarget::Dragged => self.dragged.as_mut().map(|s| &mut s.callback),
            ActionTarget::Hovered => self.hovered.as_mut(),
            ActionTarget::Scrolled => self.scrolled.as_mut(),
        };
        if let Some(cb) = callback {
            cb(event);
        }
    }

    fn bound_slot(&self, action: ActionTarget) -> Option<&Option<BoundSlot>> {
        match action {
            ActionTarget::Pressed => Some(&self.pressed),
            ActionTarget::Released => Some(&self.released),
            ActionTarget::Held => Some(&self.held),
            ActionTarget::Dragged => Some(&self.dragged),
            ActionTarget::Hovered | ActionTarget::Scrolled => None,
        }
    }

    fn bound_slot_mut(&mut self, action: ActionTarget, binding: &'static str) -> Result<&mut Option<BoundSlot>> {
        match action {
            ActionTarget::Pressed => Ok(&mut self.pressed),
            ActionTarget::Released => Ok(&mut self.released),
            ActionTarget::Held => Ok(&mut self.held),
            ActionTarget::Dragged => Ok(&mut self.dragged),
            ActionTarget::Hovered | ActionTarget::Scrolled => Err(unsupported(action, binding)),
        }
    }
}

impl fmt::Debug for EventTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTable")
            .field("pressed", &self.binding(ActionTarget::Pressed))
            .field("released", &self.binding(ActionTarget::Released))
            .field("held", &self.binding(ActionTarget::Held))
            .field("dragged", &self.binding(ActionTarget::Dragged))
            .field("hovered", &self.hovered.is_some())
            .field("scrolled", &self.scrolled.is_some())
            .finish()
    }
}

fn unsupported(action: ActionTarget, binding: &'static str) -> CoreError {
    log::error!(target: "widget", "{action} events cannot be bound to {binding} input");
    CoreError::UnsupportedAction {
        action: action.name(),
        binding,
    }
}
