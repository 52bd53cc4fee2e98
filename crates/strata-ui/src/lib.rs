//! Strata UI: a retained scene of 2D widgets on top of `strata-engine`.
//!
//! A [`UiScene`](scene::UiScene) owns the widgets of one render context.
//! Widgets are textured quads (or single glyphs) with a parent/child
//! transform hierarchy, a z-order, hit testing and an event table.
//!
//! ```rust,ignore
//! use strata_ui::prelude::*;
//!
//! let mut scene = UiScene::new(&gfx, ctx, SceneConfig { default_shader: Some(shader), ..Default::default() })?;
//! let button = scene.create_image(&mut gfx, "button", Vec2::new(120.0, 40.0), Vec2::new(200.0, 48.0))?;
//! if let Some(w) = scene.widget_mut(button) {
//!     w.events_mut()
//!         .set_mouse_event(ActionTarget::Released, MouseButton::Left, |_| println!("clicked"))?;
//! }
//!
//! // Every frame:
//! scene.poll_events(&gfx, &input_state, &input_frame);
//! scene.render_all(&mut gfx, surface, viewport.projection())?;
//! ```

pub mod event;
pub mod order;
pub mod scene;
pub mod transform;
pub mod widget;

/// Everything needed to build a scene.
pub mod prelude {
    pub use crate::event::{ActionTarget, EventTable, InputBinding, WidgetEvent};
    pub use crate::order::{StackKey, ZOrder, MAX_Z_ORDER};
    pub use crate::scene::{SceneConfig, UiScene};
    pub use crate::transform::{Transform2D, TransformPart};
    pub use crate::widget::{Anchor, HitTarget, RenderState, TextVisual, Widget, WidgetKind};

    pub use strata_engine::coords::{Rect, Rgb, Vec2, Viewport};
    pub use strata_engine::input::{Key, MouseButton};
    pub use strata_engine::ObjectId;
}
