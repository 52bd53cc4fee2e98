use std::fmt;

use strata_engine::backend::MeshHandles;
use strata_engine::context::ContextId;
use strata_engine::coords::{Rgb, Vec2, Viewport};
use strata_engine::error::Result;
use strata_engine::graphics::Vertex;
use strata_engine::id::validate_name;
use strata_engine::ObjectId;

use crate::event::EventTable;
use crate::order::ZOrder;
use crate::transform::Transform2D;

/// How a widget decides whether a point is on it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum HitTarget {
    /// Anywhere inside the bounding box.
    #[default]
    Quad,
    /// Only where the bound texture is not fully transparent. Falls back to
    /// [`HitTarget::Quad`] without a texture or alpha data.
    Texture,
}

/// Point of a rectangle, used to pin a widget to the viewport.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Anchor {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    /// Position inside a unit rectangle, `(0, 0)` top-left.
    pub fn fraction(self) -> Vec2 {
        let (x, y) = match self {
            Anchor::TopLeft => (0.0, 0.0),
            Anchor::Top => (0.5, 0.0),
            Anchor::TopRight => (1.0, 0.0),
            Anchor::Left => (0.0, 0.5),
            Anchor::Center => (0.5, 0.5),
            Anchor::Right => (1.0, 0.5),
            Anchor::BottomLeft => (0.0, 1.0),
            Anchor::Bottom => (0.5, 1.0),
            Anchor::BottomRight => (1.0, 1.0),
        };
        Vec2::new(x, y)
    }
}

/// Everything needed to draw one widget.
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Hidden widgets are skipped by rendering and hit testing.
    pub visible: bool,
    /// Clips descendants to this widget's bounds.
    pub clipping: bool,
    pub color: Rgb,
    /// `0.0..=1.0`.
    pub opacity: f32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub mesh: Option<MeshHandles>,
    pub shader: Option<ObjectId>,
    pub texture: Option<ObjectId>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            visible: true,
            clipping: false,
            color: Rgb::WHITE,
            opacity: 1.0,
            vertices: Vec::new(),
            indices: Vec::new(),
            mesh: None,
            shader: None,
            texture: None,
        }
    }
}

/// A single rendered glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextVisual {
    pub font: ObjectId,
    pub glyph: u32,
    /// R8 coverage texture created for this widget and released with it.
    pub texture: ObjectId,
    /// Quad center relative to the pen position.
    pub origin: Vec2,
    pub advance: f32,
}

impl TextVisual {
    /// Pen position on the baseline, given the widget's center.
    pub fn pen(&self, center: Vec2) -> Vec2 {
        center - self.origin
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WidgetKind {
    Image,
    Text(TextVisual),
}

/// A quad in the widget scene.
///
/// Structure (parent, children) lives in the scene's registry; the widget
/// only holds its own state.
pub struct Widget {
    id: ObjectId,
    context: ContextId,
    name: String,
    pub(crate) transform: Transform2D,
    pub(crate) render: RenderState,
    z: ZOrder,
    interactable: bool,
    hit_target: HitTarget,
    events: EventTable,
    pub(crate) kind: WidgetKind,
}

impl Widget {
    pub(crate) fn new(
        id: ObjectId,
        context: ContextId,
        name: String,
        transform: Transform2D,
        render: RenderState,
        kind: WidgetKind,
    ) -> Self {
        Self {
            id,
            context,
            name,
            transform,
            render,
            z: ZOrder::BOTTOM,
            interactable: true,
            hit_target: HitTarget::Quad,
            events: EventTable::new(),
            kind,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the widget. Names are 1 to 50 characters.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.name = name.to_owned();
        Ok(())
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, WidgetKind::Text(_))
    }

    // ── transform ─────────────────────────────────────────────────────────

    pub fn transform(&self) -> &Transform2D {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform2D {
        &mut self.transform
    }

    pub fn position(&self) -> Vec2 {
        self.transform.world.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.transform.world.position = position;
    }

    pub fn size(&self) -> Vec2 {
        self.transform.world.size
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.transform.world.size = size;
    }

    pub fn rotation(&self) -> f32 {
        self.transform.world.rotation
    }

    /// Degrees, clockwise on screen.
    pub fn set_rotation(&mut self, degrees: f32) {
        self.transform.world.rotation = degrees;
    }

    /// Places the widget so its own `anchor` point sits on the viewport's
    /// `anchor` point, shifted by `offset`.
    pub fn anchor_to_viewport(&mut self, viewport: Viewport, anchor: Anchor, offset: Vec2) {
        let f = anchor.fraction();
        let size = self.transform.world.size;
        let half = Vec2::splat(0.5);
        self.transform.world.position =
            viewport.size().scale(f) + offset + size.scale(half - f);
    }

    // ── appearance ────────────────────────────────────────────────────────

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn color(&self) -> Rgb {
        self.render.color
    }

    /// Channels are clamped to `0.0..=1.0`.
    pub fn set_color(&mut self, r: f32, g: f32, b: f32) {
        self.render.color = Rgb::normalized(r, g, b);
    }

    pub fn set_color_rgb8(&mut self, r: u8, g: u8, b: u8) {
        self.render.color = Rgb::from_rgb8(r, g, b);
    }

    pub fn color_rgb8(&self) -> [u8; 3] {
        self.render.color.to_rgb8()
    }

    pub fn opacity(&self) -> f32 {
        self.render.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.render.opacity = if opacity.is_nan() { 0.0 } else { opacity.clamp(0.0, 1.0) };
    }

    pub fn is_visible(&self) -> bool {
        self.render.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.render.visible = visible;
    }

    pub fn is_clipping(&self) -> bool {
        self.render.clipping
    }

    pub fn set_clipping(&mut self, clipping: bool) {
        self.render.clipping = clipping;
    }

    pub fn shader(&self) -> Option<ObjectId> {
        self.render.shader
    }

    pub fn texture(&self) -> Option<ObjectId> {
        self.render.texture
    }

    // ── ordering + interaction ────────────────────────────────────────────

    pub fn z_order(&self) -> ZOrder {
        self.z
    }

    pub fn set_z_order(&mut self, z: u32) {
        self.z = ZOrder::new(z);
    }

    pub(crate) fn set_z(&mut self, z: ZOrder) {
        self.z = z;
    }

    pub fn is_interactable(&self) -> bool {
        self.interactable
    }

    pub fn set_interactable(&mut self, interactable: bool) {
        self.interactable = interactable;
    }

    pub fn hit_target(&self) -> HitTarget {
        self.hit_target
    }

    pub fn set_hit_target(&mut self, target: HitTarget) {
        self.hit_target = target;
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventTable {
        &mut self.events
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("z", &self.z.get())
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        if self.render.mesh.is_some() {
            log::error!(
                target: "widget",
                "widget '{}' ({}) dropped while still holding its mesh",
                self.name,
                self.id
            );
        }
    }
}
