use glam::{Mat4, Vec3};

use strata_engine::backend::{GraphicsBackend, MeshHandles};
use strata_engine::context::{ContextId, SurfaceHandle};
use strata_engine::coords::{Rect, Vec2};
use strata_engine::error::{CoreError, Result};
use strata_engine::graphics::{
    Graphics, TextureData, TextureFormat, Vertex, QUAD_INDICES, QUAD_VERTICES,
};
use strata_engine::id::validate_name;
use strata_engine::input::{InputFrame, InputState};
use strata_engine::registry::{Attach, Registry};
use strata_engine::text::{Glyph, GlyphSource};
use strata_engine::ObjectId;

use crate::event::{DispatchInput, WidgetEvent};
use crate::order::{StackKey, ZOrder};
use crate::transform::{Transform2D, TransformPart};
use crate::widget::{HitTarget, RenderState, TextVisual, Widget, WidgetKind};

/// Defaults applied to every widget a [`UiScene`] creates.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub default_hit_target: HitTarget,
    pub default_interactable: bool,
    /// Shader assigned to new widgets; must exist when a widget is created.
    pub default_shader: Option<ObjectId>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            default_hit_target: HitTarget::Quad,
            default_interactable: true,
            default_shader: None,
        }
    }
}

/// Widgets of one render context.
///
/// Owns every widget and their parent/child structure. Backend resources a
/// widget holds (mesh, glyph texture) are released through [`remove`] or
/// [`clear`], which is why most operations take the [`Graphics`] value.
///
/// [`remove`]: UiScene::remove
/// [`clear`]: UiScene::clear
#[derive(Debug)]
pub struct UiScene {
    context: ContextId,
    config: SceneConfig,
    widgets: Registry<Widget>,
}

struct GlyphResources {
    texture: ObjectId,
    mesh: MeshHandles,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl UiScene {
    /// Creates an empty scene on `ctx`, which must be registered.
    pub fn new<B: GraphicsBackend>(gfx: &Graphics<B>, ctx: ContextId, config: SceneConfig) -> Result<Self> {
        gfx.contexts().record(ctx)?;
        log::debug!(target: "scene", "created scene on context '{ctx}'");
        Ok(Self {
            context: ctx,
            config,
            widgets: Registry::new("widget"),
        })
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn widget(&self, id: ObjectId) -> Option<&Widget> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: ObjectId) -> Option<&mut Widget> {
        self.widgets.get_mut(id)
    }

    pub fn widgets(&self) -> &Registry<Widget> {
        &self.widgets
    }

    // ── creation ──────────────────────────────────────────────────────────

    /// Creates a textured quad centered on `position`.
    pub fn create_image<B: GraphicsBackend>(
        &mut self,
        gfx: &mut Graphics<B>,
        name: &str,
        position: Vec2,
        size: Vec2,
    ) -> Result<ObjectId> {
        self.check_create(gfx, name)?;

        let mesh = gfx.upload_mesh(&QUAD_VERTICES, &QUAD_INDICES)?;
        let id = match gfx.next_id() {
            Ok(id) => id,
            Err(e) => {
                gfx.delete_mesh(mesh);
                return Err(e);
            }
        };

        let render = RenderState {
            vertices: QUAD_VERTICES.to_vec(),
            indices: QUAD_INDICES.to_vec(),
            mesh: Some(mesh),
            shader: self.config.default_shader,
            ..RenderState::default()
        };
        self.insert(Widget::new(
            id,
            self.context,
            name.to_owned(),
            Transform2D::new(position, size),
            render,
            WidgetKind::Image,
        ))?;
        log::debug!(target: "widget", "created image '{name}' ({id})");
        Ok(id)
    }

    /// Creates a widget showing one glyph with its pen at `pen`.
    ///
    /// The glyph bitmap is uploaded as an R8 texture owned by the widget.
    pub fn create_text<B: GraphicsBackend, G: GlyphSource>(
        &mut self,
        gfx: &mut Graphics<B>,
        glyphs: &G,
        name: &str,
        font: ObjectId,
        glyph_index: u32,
        pen: Vec2,
    ) -> Result<ObjectId> {
        self.check_create(gfx, name)?;
        let glyph = load_glyph(glyphs, font, glyph_index)?;

        let res = build_glyph(gfx, glyphs, self.context, name, &glyph)?;
        let id = match gfx.next_id() {
            Ok(id) => id,
            Err(e) => {
                release_glyph(gfx, res);
                return Err(e);
            }
        };

        let visual = TextVisual {
            font,
            glyph: glyph_index,
            texture: res.texture,
            origin: glyph.center(),
            advance: glyph.advance,
        };
        let render = RenderState {
            vertices: res.vertices,
            indices: res.indices,
            mesh: Some(res.mesh),
            shader: self.config.default_shader,
            texture: Some(res.texture),
            ..RenderState::default()
        };
        self.insert(Widget::new(
            id,
            self.context,
            name.to_owned(),
            Transform2D::new(pen + glyph.center(), glyph.size()),
            render,
            WidgetKind::Text(visual),
        ))?;
        log::debug!(target: "text", "created text '{name}' ({id}) glyph {glyph_index} of font {font}");
        Ok(id)
    }

    /// Switches a text widget to `font`, keeping its glyph index and pen.
    pub fn set_text_font<B: GraphicsBackend, G: GlyphSource>(
        &mut self,
        gfx: &mut Graphics<B>,
        glyphs: &G,
        id: ObjectId,
        font: ObjectId,
    ) -> Result<()> {
        let visual = self.text_visual(id)?;
        self.rebuild_text(gfx, glyphs, id, font, visual.glyph)
    }

    /// Switches a text widget to another glyph of its font.
    pub fn set_text_glyph<B: GraphicsBackend, G: GlyphSource>(
        &mut self,
        gfx: &mut Graphics<B>,
        glyphs: &G,
        id: ObjectId,
        glyph_index: u32,
    ) -> Result<()> {
        let visual = self.text_visual(id)?;
        self.rebuild_text(gfx, glyphs, id, visual.font, glyph_index)
    }

    fn text_visual(&self, id: ObjectId) -> Result<TextVisual> {
        match self.widgets.lookup(id)?.kind {
            WidgetKind::Text(visual) => Ok(visual),
            WidgetKind::Image => {
                log::error!(target: "text", "widget ({id}) is not a text widget");
                Err(CoreError::NotFound { kind: "text widget", id })
            }
        }
    }

    fn rebuild_text<B: GraphicsBackend, G: GlyphSource>(
        &mut self,
        gfx: &mut Graphics<B>,
        glyphs: &G,
        id: ObjectId,
        font: ObjectId,
        glyph_index: u32,
    ) -> Result<()> {
        let glyph = load_glyph(glyphs, font, glyph_index)?;
        let name = self.widgets.lookup(id)?.name().to_owned();
        let res = build_glyph(gfx, glyphs, self.context, &name, &glyph)?;

        let widget = self.widgets.lookup_mut(id)?;
        let WidgetKind::Text(old) = widget.kind else {
            release_glyph(gfx, res);
            return Err(CoreError::NotFound { kind: "text widget", id });
        };

        let pen = old.pen(widget.transform.world.position);
        widget.transform.world.position = pen + glyph.center();
        widget.transform.world.size = glyph.size();
        widget.kind = WidgetKind::Text(TextVisual {
            font,
            glyph: glyph_index,
            texture: res.texture,
            origin: glyph.center(),
            advance: glyph.advance,
        });
        if widget.render.texture == Some(old.texture) {
            widget.render.texture = Some(res.texture);
        }
        widget.render.vertices = res.vertices;
        widget.render.indices = res.indices;
        let old_mesh = widget.render.mesh.replace(res.mesh);

        if let Some(mesh) = old_mesh {
            gfx.delete_mesh(mesh);
        }
        if let Err(e) = gfx.remove_texture(old.texture) {
            log::warn!(target: "text", "glyph texture of '{name}' was already gone: {e}");
        }
        log::debug!(target: "text", "rebuilt '{name}' ({id}) with glyph {glyph_index} of font {font}");
        Ok(())
    }

    fn check_create<B: GraphicsBackend>(&self, gfx: &Graphics<B>, name: &str) -> Result<()> {
        validate_name(name)?;
        gfx.contexts().record(self.context)?;
        if let Some(shader) = self.config.default_shader {
            gfx.shaders().lookup(shader)?;
        }
        Ok(())
    }

    fn insert(&mut self, mut widget: Widget) -> Result<()> {
        widget.set_interactable(self.config.default_interactable);
        widget.set_hit_target(self.config.default_hit_target);
        self.widgets.add(widget.id(), widget)?;
        Ok(())
    }

    // ── removal ───────────────────────────────────────────────────────────

    /// Removes `id` and all of its descendants, releasing their meshes and
    /// glyph textures. Returns how many widgets were removed.
    pub fn remove<B: GraphicsBackend>(&mut self, gfx: &mut Graphics<B>, id: ObjectId) -> Result<usize> {
        let removed = self.widgets.remove(id)?;
        let count = removed.len();
        for (_, mut widget) in removed {
            release_widget(gfx, &mut widget);
        }
        Ok(count)
    }

    /// Removes every widget.
    pub fn clear<B: GraphicsBackend>(&mut self, gfx: &mut Graphics<B>) {
        for (_, mut widget) in self.widgets.drain() {
            release_widget(gfx, &mut widget);
        }
    }

    // ── hierarchy + transforms ────────────────────────────────────────────

    /// Attaches `child` under `parent`. The child's local transform is reset
    /// only when the edge actually changed.
    pub fn set_parent(&mut self, child: ObjectId, parent: ObjectId) -> Result<Attach> {
        let attach = self.widgets.set_parent(child, parent)?;
        if attach.changed() {
            self.widgets.lookup_mut(child)?.transform.reset_local();
        }
        Ok(attach)
    }

    /// Detaches `child` from its parent, returning the former parent.
    pub fn remove_parent(&mut self, child: ObjectId) -> Result<Option<ObjectId>> {
        let previous = self.widgets.remove_parent(child)?;
        if previous.is_some() {
            self.widgets.lookup_mut(child)?.transform.reset_local();
        }
        Ok(previous)
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.widgets.parent(id)
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.widgets.children(id)
    }

    /// Transform in scene space: every ancestor's transform applied from the
    /// root down.
    pub fn combined_transform(&self, id: ObjectId) -> Result<TransformPart> {
        let own = self.widgets.lookup(id)?.transform.own();
        let chain: Vec<ObjectId> = self.widgets.ancestors(id).collect();
        let mut acc: Option<TransformPart> = None;
        for ancestor in chain.into_iter().rev() {
            let part = self.widgets.lookup(ancestor)?.transform.own();
            acc = Some(match acc {
                None => part,
                Some(parent) => parent.compose(part),
            });
        }
        Ok(match acc {
            None => own,
            Some(parent) => parent.compose(own),
        })
    }

    /// Axis-aligned bounds of the combined transform.
    pub fn aabb(&self, id: ObjectId) -> Result<Rect> {
        Ok(self.combined_transform(id)?.aabb())
    }

    pub fn model_matrix(&self, id: ObjectId) -> Result<Mat4> {
        Ok(self.combined_transform(id)?.model_matrix())
    }

    // ── z-order ───────────────────────────────────────────────────────────

    pub fn set_z_order(&mut self, id: ObjectId, z: u32) -> Result<()> {
        self.widgets.lookup_mut(id)?.set_z_order(z);
        Ok(())
    }

    /// Places `id` one step above `target`, saturating at the top.
    pub fn move_above(&mut self, id: ObjectId, target: ObjectId) -> Result<()> {
        let target_z = self.ordering_target(id, target)?;
        self.widgets.lookup_mut(id)?.set_z(target_z.above());
        Ok(())
    }

    /// Places `id` one step below `target`. Nothing happens when `target` is
    /// already at the bottom.
    pub fn move_below(&mut self, id: ObjectId, target: ObjectId) -> Result<()> {
        let target_z = self.ordering_target(id, target)?;
        match target_z.below() {
            Some(z) => self.widgets.lookup_mut(id)?.set_z(z),
            None => log::debug!(target: "scene", "cannot move ({id}) below ({target}) at the bottom"),
        }
        Ok(())
    }

    fn ordering_target(&self, id: ObjectId, target: ObjectId) -> Result<ZOrder> {
        if id == target {
            log::error!(target: "scene", "widget ({id}) cannot be ordered relative to itself");
            return Err(CoreError::SelfOrdering(id));
        }
        self.widgets.lookup(id)?;
        Ok(self.widgets.lookup(target)?.z_order())
    }

    fn stack_key(&self, id: ObjectId) -> Option<StackKey> {
        self.widgets.get(id).map(|w| StackKey::new(w.z_order(), id))
    }

    // ── hit testing ───────────────────────────────────────────────────────

    /// Visible, interactable widgets under `p`, topmost first.
    pub fn hit_widgets<B: GraphicsBackend>(&self, gfx: &Graphics<B>, p: Vec2) -> Vec<ObjectId> {
        let mut hits: Vec<StackKey> = self
            .widgets
            .iter()
            .filter(|(_, w)| w.is_interactable() && w.is_visible())
            .filter(|&(id, w)| self.contains_point(gfx, id, w, p))
            .map(|(id, w)| StackKey::new(w.z_order(), id))
            .collect();
        hits.sort_unstable_by(|a, b| b.cmp(a));
        hits.into_iter().map(|k| k.id).collect()
    }

    /// Whether `id` is the topmost widget under `p`.
    pub fn is_hovered<B: GraphicsBackend>(&self, gfx: &Graphics<B>, id: ObjectId, p: Vec2) -> bool {
        self.hit_widgets(gfx, p).first() == Some(&id)
    }

    fn contains_point<B: GraphicsBackend>(&self, gfx: &Graphics<B>, id: ObjectId, w: &Widget, p: Vec2) -> bool {
        let Ok(t) = self.combined_transform(id) else {
            return false;
        };
        if !t.aabb().contains(p) {
            return false;
        }
        if w.hit_target() == HitTarget::Quad {
            return true;
        }

        let mask = w
            .texture()
            .and_then(|tex| gfx.texture(tex))
            .and_then(|tex| tex.alpha_mask());
        match mask {
            Some(mask) => t
                .to_uv(p)
                .and_then(|uv| mask.sample(uv))
                .is_some_and(|alpha| alpha > 0),
            None => true,
        }
    }

    // ── events ────────────────────────────────────────────────────────────

    /// Runs the event table of every interactable widget against this
    /// frame's input and returns the events that fired, in widget order.
    pub fn poll_events<B: GraphicsBackend>(
        &mut self,
        gfx: &Graphics<B>,
        state: &InputState,
        frame: &InputFrame,
    ) -> Vec<WidgetEvent> {
        let hovered = state.pointer.and_then(|p| self.hit_widgets(gfx, p).first().copied());
        let ids: Vec<ObjectId> = self.widgets.ids().collect();

        let mut fired = Vec::new();
        for id in ids {
            fired.extend(self.dispatch(id, hovered == Some(id), state, frame));
        }
        fired
    }

    /// Runs one widget's event table. Non-interactable widgets never fire.
    pub fn poll_widget_events<B: GraphicsBackend>(
        &mut self,
        gfx: &Graphics<B>,
        id: ObjectId,
        state: &InputState,
        frame: &InputFrame,
    ) -> Result<Vec<WidgetEvent>> {
        self.widgets.lookup(id)?;
        let hovered = state.pointer.is_some_and(|p| self.is_hovered(gfx, id, p));
        Ok(self.dispatch(id, hovered, state, frame))
    }

    fn dispatch(&mut self, id: ObjectId, hovered: bool, state: &InputState, frame: &InputFrame) -> Vec<WidgetEvent> {
        let Some(widget) = self.widgets.get_mut(id) else {
            return Vec::new();
        };
        if !widget.is_interactable() {
            return Vec::new();
        }

        let input = DispatchInput { hovered, state, frame };
        let actions = widget.events().triggered(&input);
        let mut fired = Vec::with_capacity(actions.len());
        for action in actions {
            let event = WidgetEvent {
                widget: id,
                action,
                binding: widget.events().binding(action),
                pointer: state.pointer,
                pointer_delta: frame.pointer_delta,
                scroll_delta: frame.scroll_delta,
            };
            log::trace!(target: "widget", "'{}' ({id}) {action}", widget.name());
            widget.events_mut().invoke(&event);
            fired.push(event);
        }
        fired
    }

    // ── rendering ─────────────────────────────────────────────────────────

    /// Draws one widget on this scene's context.
    pub fn render<B: GraphicsBackend>(
        &self,
        gfx: &mut Graphics<B>,
        id: ObjectId,
        surface: SurfaceHandle,
        projection: Mat4,
    ) -> Result<()> {
        let widget = self.widgets.lookup(id)?;
        if !widget.is_visible() {
            log::error!(target: "widget", "cannot render hidden widget '{}' ({id})", widget.name());
            return Err(CoreError::RenderDisabled(id));
        }
        self.bind_context(gfx, surface)?;
        self.draw(gfx, id, projection)
    }

    /// Draws every visible widget bottom to top, clipping each to the
    /// intersection of its clipping ancestors. Failures are logged and the
    /// widget skipped. Returns how many widgets were drawn.
    pub fn render_all<B: GraphicsBackend>(
        &self,
        gfx: &mut Graphics<B>,
        surface: SurfaceHandle,
        projection: Mat4,
    ) -> Result<usize> {
        self.bind_context(gfx, surface)?;

        let mut order: Vec<StackKey> = self
            .widgets
            .iter()
            .filter(|(_, w)| w.is_visible())
            .map(|(id, w)| StackKey::new(w.z_order(), id))
            .collect();
        order.sort_unstable();

        let mut drawn = 0;
        for key in order {
            let Some(clip) = self.clip_rect(key.id) else {
                log::trace!(target: "scene", "widget ({}) is fully clipped", key.id);
                continue;
            };
            if let Some(c) = clip {
                let visible = self.aabb(key.id).is_ok_and(|r| r.intersect(c).is_some());
                if !visible {
                    log::trace!(target: "scene", "widget ({}) is outside its clip", key.id);
                    continue;
                }
            }
            gfx.set_scissor(clip);
            match self.draw(gfx, key.id, projection) {
                Ok(()) => drawn += 1,
                Err(e) => log::warn!(target: "scene", "skipped widget ({}): {e}", key.id),
            }
        }
        gfx.set_scissor(None);
        Ok(drawn)
    }

    /// Scissor for `id`: `Some(None)` when unclipped, `None` when clipped away.
    fn clip_rect(&self, id: ObjectId) -> Option<Option<Rect>> {
        let mut clip: Option<Rect> = None;
        for ancestor in self.widgets.ancestors(id) {
            let clipping = self.widgets.get(ancestor).is_some_and(Widget::is_clipping);
            if !clipping {
                continue;
            }
            let bounds = self.aabb(ancestor).ok()?;
            clip = Some(match clip {
                None => bounds,
                Some(c) => c.intersect(bounds)?,
            });
        }
        Some(clip)
    }

    fn bind_context<B: GraphicsBackend>(&self, gfx: &mut Graphics<B>, surface: SurfaceHandle) -> Result<()> {
        gfx.make_current(self.context, surface)?;
        if !gfx.is_context_valid(self.context) {
            return Err(CoreError::InvalidContext(self.context));
        }
        Ok(())
    }

    fn draw<B: GraphicsBackend>(&self, gfx: &mut Graphics<B>, id: ObjectId, projection: Mat4) -> Result<()> {
        let widget = self.widgets.lookup(id)?;
        let Some(shader) = widget.shader() else {
            log::error!(target: "widget", "widget '{}' ({id}) has no shader", widget.name());
            return Err(CoreError::NoShader(id));
        };
        let mesh = widget
            .render
            .mesh
            .ok_or(CoreError::NotFound { kind: "mesh", id })?;
        let index_count = widget.render.indices.len() as u32;
        let texture = widget.texture();
        let color = widget.color();
        let opacity = widget.opacity();
        let model = self.model_matrix(id)?;

        let textured_alpha = texture
            .and_then(|t| gfx.texture(t))
            .is_some_and(|t| t.has_alpha());
        let translucent = opacity < 1.0 || textured_alpha;

        gfx.set_uniform(self.context, shader, "uModel", model)?;
        gfx.set_uniform(self.context, shader, "uProjection", projection)?;
        gfx.set_uniform(self.context, shader, "uColor", Vec3::from_array(color.to_array()))?;
        gfx.set_uniform(self.context, shader, "uOpacity", opacity)?;
        gfx.set_uniform(self.context, shader, "uTexture", 0i32)?;
        gfx.set_uniform(self.context, shader, "uUseTexture", texture.is_some())?;
        gfx.bind_texture(0, texture)?;

        if translucent {
            gfx.set_blend(true);
            gfx.set_depth_write(false);
        }
        gfx.draw_indexed(mesh, index_count);
        if translucent {
            gfx.set_blend(false);
            gfx.set_depth_write(true);
        }

        if texture.is_some() {
            gfx.bind_texture(0, None)?;
        }
        Ok(())
    }

    // ── render state ──────────────────────────────────────────────────────

    /// Replaces the widget's vertices and indices and re-uploads its mesh.
    /// On failure the previous mesh stays in use.
    pub fn set_geometry<B: GraphicsBackend>(
        &mut self,
        gfx: &mut Graphics<B>,
        id: ObjectId,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<()> {
        self.widgets.lookup(id)?;
        let mesh = gfx.upload_mesh(vertices, indices)?;

        let widget = self.widgets.lookup_mut(id)?;
        widget.render.vertices = vertices.to_vec();
        widget.render.indices = indices.to_vec();
        if let Some(old) = widget.render.mesh.replace(mesh) {
            gfx.delete_mesh(old);
        }
        Ok(())
    }

    pub fn set_shader<B: GraphicsBackend>(
        &mut self,
        gfx: &Graphics<B>,
        id: ObjectId,
        shader: Option<ObjectId>,
    ) -> Result<()> {
        if let Some(shader) = shader {
            gfx.shaders().lookup(shader)?;
        }
        self.widgets.lookup_mut(id)?.render.shader = shader;
        Ok(())
    }

    /// Binds `texture` to the widget, or clears it with `None`.
    pub fn set_texture<B: GraphicsBackend>(
        &mut self,
        gfx: &Graphics<B>,
        id: ObjectId,
        texture: Option<ObjectId>,
    ) -> Result<()> {
        if let Some(texture) = texture {
            gfx.textures().lookup(texture)?;
        }
        self.widgets.lookup_mut(id)?.render.texture = texture;
        Ok(())
    }
}

fn load_glyph<G: GlyphSource>(glyphs: &G, font: ObjectId, index: u32) -> Result<Glyph> {
    if !glyphs.has_font(font) {
        log::error!(target: "text", "font ({font}) is not loaded");
        return Err(CoreError::NotFound { kind: "font", id: font });
    }
    glyphs.glyph(font, index)
}

/// Uploads the glyph texture and a unit-space quad built from the glyph's
/// corners. Releases the texture if the mesh upload fails.
fn build_glyph<B: GraphicsBackend, G: GlyphSource>(
    gfx: &mut Graphics<B>,
    glyphs: &G,
    ctx: ContextId,
    name: &str,
    glyph: &Glyph,
) -> Result<GlyphResources> {
    let texture = gfx.create_texture(
        ctx,
        name,
        TextureData {
            width: glyph.width,
            height: glyph.height,
            format: TextureFormat::R8,
            pixels: &glyph.pixels,
        },
    )?;

    let center = glyph.center();
    let size = glyph.size();
    let unit = |v: f32, c: f32, s: f32| if s == 0.0 { 0.0 } else { (v - c) / s };
    let vertices: Vec<Vertex> = glyph
        .vertices
        .iter()
        .zip(glyph.uvs.iter())
        .map(|(v, uv)| Vertex::new([unit(v.x, center.x, size.x), unit(v.y, center.y, size.y)], [uv.x, uv.y]))
        .collect();
    let indices = glyphs.quad_indices().to_vec();

    match gfx.upload_mesh(&vertices, &indices) {
        Ok(mesh) => Ok(GlyphResources {
            texture,
            mesh,
            vertices,
            indices,
        }),
        Err(e) => {
            if let Err(cleanup) = gfx.remove_texture(texture) {
                log::warn!(target: "text", "failed to release glyph texture of '{name}': {cleanup}");
            }
            Err(e)
        }
    }
}

fn release_glyph<B: GraphicsBackend>(gfx: &mut Graphics<B>, res: GlyphResources) {
    gfx.delete_mesh(res.mesh);
    if let Err(e) = gfx.remove_texture(res.texture) {
        log::warn!(target: "text", "failed to release glyph texture ({}): {e}", res.texture);
    }
}

fn release_widget<B: GraphicsBackend>(gfx: &mut Graphics<B>, widget: &mut Widget) {
    if let Some(mesh) = widget.render.mesh.take() {
        gfx.delete_mesh(mesh);
    }
    if let WidgetKind::Text(visual) = widget.kind {
        if let Err(e) = gfx.remove_texture(visual.texture) {
            log::warn!(target: "text", "glyph texture of '{}' was already gone: {e}", widget.name());
        }
    }
    log::debug!(target: "widget", "released widget '{}' ({})", widget.name(), widget.id());
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use strata_engine::backend::{HeadlessBackend, Uniform};
    use strata_engine::context::NativeContext;
    use strata_engine::coords::Viewport;
    use strata_engine::fatal::FatalHandler;
    use strata_engine::graphics::{GraphicsInit, ShaderSource, ShaderStage};
    use strata_engine::input::{
        InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, MouseWheelDelta,
        PointerButtonEvent, PointerMoveEvent,
    };

    use super::*;
    use crate::event::{ActionTarget, InputBinding};

    struct Fixture {
        gfx: Graphics<HeadlessBackend>,
        scene: UiScene,
        shader: ObjectId,
    }

    fn fixture() -> Fixture {
        let mut gfx =
            Graphics::new(HeadlessBackend::new(), GraphicsInit::default(), FatalHandler::halt()).unwrap();
        let ctx = gfx.create_context(NativeContext::from_raw(0x10)).unwrap();
        let shader = gfx
            .create_shader(
                ctx,
                "quad",
                &[
                    ShaderSource::inline(ShaderStage::Vertex, "void main() {}"),
                    ShaderSource::inline(ShaderStage::Fragment, "void main() {}"),
                ],
            )
            .unwrap();
        let config = SceneConfig {
            default_shader: Some(shader),
            ..SceneConfig::default()
        };
        let scene = UiScene::new(&gfx, ctx, config).unwrap();
        Fixture { gfx, scene, shader }
    }

    fn surface() -> SurfaceHandle {
        SurfaceHandle::from_raw(1).unwrap()
    }

    fn projection() -> Mat4 {
        Viewport::new(800.0, 600.0).projection()
    }

    fn image(f: &mut Fixture, name: &str, pos: (f32, f32), size: (f32, f32)) -> ObjectId {
        f.scene
            .create_image(&mut f.gfx, name, Vec2::new(pos.0, pos.1), Vec2::new(size.0, size.1))
            .unwrap()
    }

    fn move_to(state: &mut InputState, frame: &mut InputFrame, x: f32, y: f32) {
        state.apply_event(frame, InputEvent::PointerMoved(PointerMoveEvent { x, y }));
    }

    fn click(state: &mut InputState, frame: &mut InputFrame, st: MouseButtonState) {
        let p = state.pointer_or_outside();
        state.apply_event(
            frame,
            InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: st,
                x: p.x,
                y: p.y,
                modifiers: Modifiers::default(),
            }),
        );
    }

    fn wheel(state: &mut InputState, frame: &mut InputFrame, y: f32) {
        state.apply_event(
            frame,
            InputEvent::MouseWheel {
                delta: MouseWheelDelta::Pixel { x: 0.0, y },
                modifiers: Modifiers::default(),
            },
        );
    }

    /// Records `(widget, action)` for every callback run.
    type Fired = Rc<RefCell<Vec<(ObjectId, ActionTarget)>>>;

    fn record_hover_and_scroll(f: &mut Fixture, id: ObjectId, log: &Fired) {
        let events = f.scene.widget_mut(id).unwrap().events_mut();
        let sink = Rc::clone(log);
        events.set_hover_event(move |e| sink.borrow_mut().push((e.widget, e.action)));
        let sink = Rc::clone(log);
        events.set_scroll_event(move |e| sink.borrow_mut().push((e.widget, e.action)));
    }

    struct FakeGlyphs;

    impl GlyphSource for FakeGlyphs {
        fn has_font(&self, font: ObjectId) -> bool {
            font.get() == 900
        }

        fn glyph(&self, font: ObjectId, index: u32) -> Result<Glyph> {
            if index > 1 {
                return Err(CoreError::GlyphOutOfRange { font, index });
            }
            let w = 4 + index * 2;
            Ok(Glyph {
                width: w,
                height: 6,
                pixels: vec![255; (w * 6) as usize],
                vertices: [
                    Vec2::new(1.0, -6.0),
                    Vec2::new(1.0 + w as f32, -6.0),
                    Vec2::new(1.0 + w as f32, 0.0),
                    Vec2::new(1.0, 0.0),
                ],
                uvs: [
                    Vec2::new(0.0, 0.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(0.0, 1.0),
                ],
                advance: w as f32 + 2.0,
            })
        }
    }

    fn font() -> ObjectId {
        ObjectId::new(900).unwrap()
    }

    #[test]
    fn create_image_applies_config_and_uploads_quad() {
        let mut f = fixture();
        let id = image(&mut f, "panel", (50.0, 50.0), (20.0, 10.0));
        let w = f.scene.widget(id).unwrap();
        assert_eq!(w.shader(), Some(f.shader));
        assert_eq!(w.render_state().indices, QUAD_INDICES.to_vec());
        assert!(w.is_interactable());
        assert_eq!(f.gfx.backend().live_meshes(), 1);
    }

    #[test]
    fn invalid_name_acquires_nothing() {
        let mut f = fixture();
        let last = f.gfx.ids().last_issued();
        assert!(f.scene.create_image(&mut f.gfx, "", Vec2::zero(), Vec2::zero()).is_err());
        assert_eq!(f.gfx.ids().last_issued(), last);
        assert_eq!(f.gfx.backend().live_meshes(), 0);
        assert!(f.scene.is_empty());
    }

    #[test]
    fn failed_mesh_upload_registers_nothing() {
        let mut f = fixture();
        f.gfx.backend_mut().fail_next_mesh("out of memory");
        assert!(f.scene.create_image(&mut f.gfx, "a", Vec2::zero(), Vec2::zero()).is_err());
        assert!(f.scene.is_empty());
    }

    #[test]
    fn equal_z_newest_is_hit_first() {
        let mut f = fixture();
        let a = image(&mut f, "a", (50.0, 50.0), (40.0, 40.0));
        let b = image(&mut f, "b", (50.0, 50.0), (40.0, 40.0));
        f.scene.set_z_order(a, 5).unwrap();
        f.scene.set_z_order(b, 5).unwrap();

        let p = Vec2::new(50.0, 50.0);
        assert_eq!(f.scene.hit_widgets(&f.gfx, p), vec![b, a]);
        assert!(f.scene.is_hovered(&f.gfx, b, p));
        assert!(!f.scene.is_hovered(&f.gfx, a, p));

        f.scene.move_above(a, b).unwrap();
        assert_eq!(f.scene.widget(a).unwrap().z_order().get(), 6);
        assert_eq!(f.scene.hit_widgets(&f.gfx, p), vec![a, b]);
    }

    #[test]
    fn hidden_and_inert_widgets_are_not_hit() {
        let mut f = fixture();
        let a = image(&mut f, "a", (50.0, 50.0), (40.0, 40.0));
        let b = image(&mut f, "b", (50.0, 50.0), (40.0, 40.0));
        f.scene.widget_mut(a).unwrap().set_visible(false);
        f.scene.widget_mut(b).unwrap().set_interactable(false);
        assert!(f.scene.hit_widgets(&f.gfx, Vec2::new(50.0, 50.0)).is_empty());
    }

    #[test]
    fn z_order_moves_saturate_and_reject_self() {
        let mut f = fixture();
        let a = image(&mut f, "a", (0.0, 0.0), (1.0, 1.0));
        let b = image(&mut f, "b", (0.0, 0.0), (1.0, 1.0));

        f.scene.set_z_order(b, 5000).unwrap();
        f.scene.move_above(a, b).unwrap();
        assert_eq!(f.scene.widget(a).unwrap().z_order(), ZOrder::TOP);

        f.scene.set_z_order(b, 0).unwrap();
        f.scene.move_below(a, b).unwrap();
        assert_eq!(f.scene.widget(a).unwrap().z_order(), ZOrder::TOP);

        assert!(matches!(f.scene.move_above(a, a), Err(CoreError::SelfOrdering(_))));
        let ghost = ObjectId::new(9999).unwrap();
        assert!(matches!(f.scene.move_below(a, ghost), Err(CoreError::NotFound { .. })));
        assert_eq!(f.scene.widget(a).unwrap().z_order(), ZOrder::TOP);
    }

    #[test]
    fn reparenting_resets_local_only_on_change() {
        let mut f = fixture();
        let p = image(&mut f, "p", (0.0, 0.0), (10.0, 10.0));
        let q = image(&mut f, "q", (0.0, 0.0), (10.0, 10.0));
        let c = image(&mut f, "c", (0.0, 0.0), (10.0, 10.0));

        f.scene.widget_mut(c).unwrap().transform_mut().local.position = Vec2::new(3.0, 3.0);
        assert_eq!(f.scene.set_parent(c, p).unwrap(), Attach::Attached);
        assert_eq!(f.scene.widget(c).unwrap().transform().local, TransformPart::IDENTITY);

        f.scene.widget_mut(c).unwrap().transform_mut().local.position = Vec2::new(3.0, 3.0);
        assert_eq!(f.scene.set_parent(c, p).unwrap(), Attach::Unchanged);
        assert_eq!(f.scene.widget(c).unwrap().transform().local.position, Vec2::new(3.0, 3.0));

        assert_eq!(f.scene.set_parent(c, q).unwrap(), Attach::Reattached { previous: p });
        assert_eq!(f.scene.widget(c).unwrap().transform().local, TransformPart::IDENTITY);
        assert!(f.scene.children(p).is_empty());

        f.scene.widget_mut(c).unwrap().transform_mut().local.position = Vec2::new(1.0, 0.0);
        assert_eq!(f.scene.remove_parent(c).unwrap(), Some(q));
        assert_eq!(f.scene.widget(c).unwrap().transform().local, TransformPart::IDENTITY);
        assert_eq!(f.scene.remove_parent(c).unwrap(), None);
    }

    #[test]
    fn parenting_cycles_are_rejected() {
        let mut f = fixture();
        let a = image(&mut f, "a", (0.0, 0.0), (1.0, 1.0));
        let b = image(&mut f, "b", (0.0, 0.0), (1.0, 1.0));
        f.scene.set_parent(b, a).unwrap();
        assert!(matches!(f.scene.set_parent(a, b), Err(CoreError::InvalidParent { .. })));
        assert!(f.scene.set_parent(a, a).is_err());
    }

    #[test]
    fn remove_takes_descendants_and_their_meshes() {
        let mut f = fixture();
        let root = image(&mut f, "root", (0.0, 0.0), (1.0, 1.0));
        let mid = image(&mut f, "mid", (0.0, 0.0), (1.0, 1.0));
        let leaf = image(&mut f, "leaf", (0.0, 0.0), (1.0, 1.0));
        let other = image(&mut f, "other", (0.0, 0.0), (1.0, 1.0));
        f.scene.set_parent(mid, root).unwrap();
        f.scene.set_parent(leaf, mid).unwrap();

        assert_eq!(f.scene.remove(&mut f.gfx, root).unwrap(), 3);
        for id in [root, mid, leaf] {
            assert!(f.scene.widget(id).is_none());
        }
        assert!(f.scene.widget(other).is_some());
        assert_eq!(f.gfx.backend().live_meshes(), 1);
        assert!(matches!(f.scene.remove(&mut f.gfx, root), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn combined_transform_follows_parent() {
        let mut f = fixture();
        let parent = image(&mut f, "parent", (100.0, 100.0), (50.0, 50.0));
        let child = image(&mut f, "child", (10.0, 0.0), (4.0, 4.0));
        f.scene.set_parent(child, parent).unwrap();

        assert_eq!(f.scene.aabb(child).unwrap(), Rect::new(108.0, 98.0, 4.0, 4.0));

        f.scene.widget_mut(parent).unwrap().set_position(Vec2::new(200.0, 100.0));
        assert_eq!(f.scene.aabb(child).unwrap(), Rect::new(208.0, 98.0, 4.0, 4.0));

        f.scene.widget_mut(parent).unwrap().set_rotation(90.0);
        let c = f.scene.combined_transform(child).unwrap();
        assert!((c.position - Vec2::new(200.0, 110.0)).length() < 1e-4);
        assert_eq!(c.rotation, 90.0);
    }

    #[test]
    fn texture_hit_target_uses_alpha() {
        let mut f = fixture();
        let ctx = f.scene.context();
        // Left texel transparent, right texel opaque.
        let pixels = [0u8, 0, 0, 0, 255, 255, 255, 255];
        let tex = f
            .gfx
            .create_texture(
                ctx,
                "half",
                TextureData { width: 2, height: 1, format: TextureFormat::Rgba8, pixels: &pixels },
            )
            .unwrap();
        let w = image(&mut f, "icon", (10.0, 10.0), (20.0, 20.0));
        f.scene.widget_mut(w).unwrap().set_hit_target(HitTarget::Texture);

        // No texture yet: falls back to the quad.
        assert_eq!(f.scene.hit_widgets(&f.gfx, Vec2::new(2.0, 10.0)), vec![w]);

        f.scene.set_texture(&f.gfx, w, Some(tex)).unwrap();
        assert!(f.scene.hit_widgets(&f.gfx, Vec2::new(2.0, 10.0)).is_empty());
        assert_eq!(f.scene.hit_widgets(&f.gfx, Vec2::new(18.0, 10.0)), vec![w]);
    }

    #[test]
    fn poll_events_dispatches_to_hovered_widget_only() {
        let mut f = fixture();
        let back = image(&mut f, "back", (50.0, 50.0), (40.0, 40.0));
        let front = image(&mut f, "front", (50.0, 50.0), (40.0, 40.0));

        let log = Rc::new(RefCell::new(Vec::new()));
        for id in [back, front] {
            let sink = Rc::clone(&log);
            f.scene
                .widget_mut(id)
                .unwrap()
                .events_mut()
                .set_mouse_event(ActionTarget::Pressed, MouseButton::Left, move |e| {
                    sink.borrow_mut().push(e.widget)
                })
                .unwrap();
        }

        let mut state = InputState::new();
        let mut frame = InputFrame::new();
        move_to(&mut state, &mut frame, 50.0, 50.0);
        click(&mut state, &mut frame, MouseButtonState::Pressed);

        let fired = f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].widget, front);
        assert_eq!(*log.borrow(), vec![front]);
    }

    #[test]
    fn release_fires_on_the_frame_after_press() {
        let mut f = fixture();
        let back = image(&mut f, "back", (50.0, 50.0), (40.0, 40.0));
        let front = image(&mut f, "front", (50.0, 50.0), (40.0, 40.0));

        let log: Fired = Rc::new(RefCell::new(Vec::new()));
        for id in [back, front] {
            let sink = Rc::clone(&log);
            f.scene
                .widget_mut(id)
                .unwrap()
                .events_mut()
                .set_mouse_event(ActionTarget::Released, MouseButton::Left, move |e| {
                    sink.borrow_mut().push((e.widget, e.action))
                })
                .unwrap();
        }

        let mut state = InputState::new();
        let mut frame = InputFrame::new();
        move_to(&mut state, &mut frame, 50.0, 50.0);
        click(&mut state, &mut frame, MouseButtonState::Pressed);
        assert!(f.scene.poll_events(&f.gfx, &state, &frame).is_empty());

        frame.clear();
        click(&mut state, &mut frame, MouseButtonState::Released);
        let fired = f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].binding, Some(InputBinding::Mouse(MouseButton::Left)));
        assert_eq!(*log.borrow(), vec![(front, ActionTarget::Released)]);

        // Released elsewhere: nothing under the pointer.
        frame.clear();
        click(&mut state, &mut frame, MouseButtonState::Pressed);
        frame.clear();
        move_to(&mut state, &mut frame, 200.0, 200.0);
        click(&mut state, &mut frame, MouseButtonState::Released);
        assert!(f.scene.poll_events(&f.gfx, &state, &frame).is_empty());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn hover_fires_only_on_the_topmost_widget() {
        let mut f = fixture();
        let low = image(&mut f, "low", (50.0, 50.0), (40.0, 40.0));
        let high = image(&mut f, "high", (60.0, 60.0), (40.0, 40.0));
        let log: Fired = Rc::new(RefCell::new(Vec::new()));
        record_hover_and_scroll(&mut f, low, &log);
        record_hover_and_scroll(&mut f, high, &log);

        let mut state = InputState::new();
        let mut frame = InputFrame::new();

        // Overlap: only the higher widget hears it.
        move_to(&mut state, &mut frame, 60.0, 60.0);
        f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(*log.borrow(), vec![(high, ActionTarget::Hovered)]);

        // Raising the lower one swaps the winner.
        log.borrow_mut().clear();
        f.scene.move_above(low, high).unwrap();
        frame.clear();
        f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(*log.borrow(), vec![(low, ActionTarget::Hovered)]);

        // Outside both.
        log.borrow_mut().clear();
        frame.clear();
        move_to(&mut state, &mut frame, 300.0, 300.0);
        assert!(f.scene.poll_events(&f.gfx, &state, &frame).is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn scroll_needs_hover_and_wheel_movement() {
        let mut f = fixture();
        let low = image(&mut f, "low", (50.0, 50.0), (40.0, 40.0));
        let high = image(&mut f, "high", (50.0, 50.0), (40.0, 40.0));
        let log: Fired = Rc::new(RefCell::new(Vec::new()));
        record_hover_and_scroll(&mut f, low, &log);
        record_hover_and_scroll(&mut f, high, &log);

        let mut state = InputState::new();
        let mut frame = InputFrame::new();
        move_to(&mut state, &mut frame, 50.0, 50.0);

        // Hovered, no wheel.
        f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(*log.borrow(), vec![(high, ActionTarget::Hovered)]);

        log.borrow_mut().clear();
        frame.clear();
        wheel(&mut state, &mut frame, -12.0);
        let fired = f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(
            *log.borrow(),
            vec![(high, ActionTarget::Hovered), (high, ActionTarget::Scrolled)]
        );
        let scroll = fired.iter().find(|e| e.action == ActionTarget::Scrolled).unwrap();
        assert_eq!(scroll.scroll_delta, Vec2::new(0.0, -12.0));
        assert_eq!(scroll.binding, None);

        // Wheel off every widget.
        log.borrow_mut().clear();
        frame.clear();
        move_to(&mut state, &mut frame, 300.0, 300.0);
        wheel(&mut state, &mut frame, -12.0);
        assert!(f.scene.poll_events(&f.gfx, &state, &frame).is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn key_events_fire_without_hover_and_inert_widgets_stay_quiet() {
        let mut f = fixture();
        let a = image(&mut f, "a", (50.0, 50.0), (10.0, 10.0));
        let b = image(&mut f, "b", (50.0, 50.0), (10.0, 10.0));
        for id in [a, b] {
            f.scene
                .widget_mut(id)
                .unwrap()
                .events_mut()
                .set_key_event(ActionTarget::Pressed, Key::Enter, |_| {})
                .unwrap();
        }
        f.scene.widget_mut(b).unwrap().set_interactable(false);

        let mut state = InputState::new();
        let mut frame = InputFrame::new();
        state.apply_event(
            &mut frame,
            InputEvent::Key {
                key: Key::Enter,
                state: KeyState::Pressed,
                modifiers: Modifiers::default(),
                code: 0,
                repeat: false,
            },
        );

        let fired = f.scene.poll_events(&f.gfx, &state, &frame);
        assert_eq!(fired.iter().map(|e| e.widget).collect::<Vec<_>>(), vec![a]);
        assert!(f.scene.poll_widget_events(&f.gfx, b, &state, &frame).unwrap().is_empty());
    }

    #[test]
    fn render_pushes_uniforms_and_draws() {
        let mut f = fixture();
        let w = image(&mut f, "panel", (100.0, 50.0), (20.0, 10.0));
        f.scene.widget_mut(w).unwrap().set_color(1.0, 0.5, 0.0);

        f.scene.render(&mut f.gfx, w, surface(), projection()).unwrap();

        let program = f.gfx.shader(f.shader).unwrap().program().unwrap();
        let b = f.gfx.backend();
        assert_eq!(b.draws().len(), 1);
        assert_eq!(b.draws()[0].index_count, 6);
        assert!(!b.draws()[0].blend);
        assert_eq!(b.uniform(program, "uOpacity"), Some(Uniform::Float(1.0)));
        assert_eq!(b.uniform(program, "uUseTexture"), Some(Uniform::Bool(false)));
        assert_eq!(b.uniform(program, "uColor"), Some(Uniform::Vec3(Vec3::new(1.0, 0.5, 0.0))));
        assert_eq!(
            b.uniform(program, "uModel"),
            Some(Uniform::Mat4(f.scene.model_matrix(w).unwrap()))
        );
    }

    #[test]
    fn scenes_on_two_contexts_each_bind_a_shared_shader() {
        let mut f = fixture();
        let other = f.gfx.create_context(NativeContext::from_raw(0x20)).unwrap();
        let mut second = UiScene::new(
            &f.gfx,
            other,
            SceneConfig {
                default_shader: Some(f.shader),
                ..SceneConfig::default()
            },
        )
        .unwrap();
        let a = image(&mut f, "a", (10.0, 10.0), (5.0, 5.0));
        let b = second
            .create_image(&mut f.gfx, "b", Vec2::new(10.0, 10.0), Vec2::new(5.0, 5.0))
            .unwrap();

        f.scene.render(&mut f.gfx, a, surface(), projection()).unwrap();
        second.render(&mut f.gfx, b, surface(), projection()).unwrap();

        let program = f.gfx.shader(f.shader).unwrap().program().unwrap();
        assert_eq!(f.gfx.backend().use_program_calls(), 2);
        assert_eq!(f.gfx.contexts().last_program(f.scene.context()).unwrap(), Some(program));
        assert_eq!(f.gfx.contexts().last_program(other).unwrap(), Some(program));
        assert_eq!(f.gfx.backend().draws().len(), 2);

        second.clear(&mut f.gfx);
    }

    #[test]
    fn translucent_render_restores_blend_and_depth() {
        let mut f = fixture();
        let w = image(&mut f, "ghost", (10.0, 10.0), (5.0, 5.0));
        f.scene.widget_mut(w).unwrap().set_opacity(0.5);

        f.scene.render(&mut f.gfx, w, surface(), projection()).unwrap();
        let b = f.gfx.backend();
        assert!(b.draws()[0].blend);
        assert!(!b.draws()[0].depth_write);
        assert!(!b.blend_enabled());
        assert!(b.depth_write_enabled());
    }

    #[test]
    fn render_rejects_hidden_and_unshaded_widgets() {
        let mut f = fixture();
        let w = image(&mut f, "w", (10.0, 10.0), (5.0, 5.0));

        f.scene.widget_mut(w).unwrap().set_visible(false);
        assert!(matches!(
            f.scene.render(&mut f.gfx, w, surface(), projection()),
            Err(CoreError::RenderDisabled(_))
        ));

        f.scene.widget_mut(w).unwrap().set_visible(true);
        f.scene.set_shader(&f.gfx, w, None).unwrap();
        assert!(matches!(
            f.scene.render(&mut f.gfx, w, surface(), projection()),
            Err(CoreError::NoShader(_))
        ));
        assert!(f.gfx.backend().draws().is_empty());
    }

    #[test]
    fn render_all_orders_and_clips() {
        let mut f = fixture();
        let top = image(&mut f, "top", (50.0, 50.0), (10.0, 10.0));
        let clip = image(&mut f, "clip", (50.0, 50.0), (20.0, 20.0));
        let inside = image(&mut f, "inside", (55.0, 50.0), (30.0, 4.0));
        let outside = image(&mut f, "outside", (100.0, 0.0), (4.0, 4.0));
        f.scene.set_z_order(top, 10).unwrap();
        f.scene.widget_mut(clip).unwrap().set_clipping(true);
        f.scene.set_parent(inside, clip).unwrap();
        f.scene.set_parent(outside, clip).unwrap();
        // Child positions are now relative to `clip`.
        f.scene.widget_mut(inside).unwrap().set_position(Vec2::new(5.0, 0.0));

        let drawn = f.scene.render_all(&mut f.gfx, surface(), projection()).unwrap();
        assert_eq!(drawn, 3);

        let draws = f.gfx.backend_mut().take_draws();
        let mesh_of = |id: ObjectId| f.scene.widget(id).unwrap().render_state().mesh.unwrap();
        assert_eq!(draws.iter().map(|d| d.mesh).collect::<Vec<_>>(), vec![
            mesh_of(clip),
            mesh_of(inside),
            mesh_of(top),
        ]);
        assert_eq!(draws[0].scissor, None);
        assert_eq!(draws[1].scissor, Some(Rect::new(40.0, 40.0, 20.0, 20.0)));
        assert_eq!(f.gfx.backend().scissor(), None);
    }

    #[test]
    fn text_widget_owns_its_glyph_texture() {
        let mut f = fixture();
        let textures_before = f.gfx.backend().live_textures();
        let id = f
            .scene
            .create_text(&mut f.gfx, &FakeGlyphs, "a", font(), 0, Vec2::new(100.0, 100.0))
            .unwrap();

        let w = f.scene.widget(id).unwrap();
        assert!(w.is_text());
        assert_eq!(w.size(), Vec2::new(4.0, 6.0));
        assert_eq!(w.position(), Vec2::new(103.0, 97.0));
        assert_eq!(w.render_state().vertices[0].pos, [-0.5, -0.5]);
        let tex = w.texture().unwrap();
        assert_eq!(f.gfx.texture(tex).unwrap().format(), TextureFormat::R8);
        assert_eq!(f.gfx.backend().live_textures(), textures_before + 1);

        f.scene.set_text_glyph(&mut f.gfx, &FakeGlyphs, id, 1).unwrap();
        let w = f.scene.widget(id).unwrap();
        assert_eq!(w.size(), Vec2::new(6.0, 6.0));
        assert_eq!(w.position(), Vec2::new(104.0, 97.0));
        assert!(f.gfx.texture(tex).is_none());
        assert_eq!(f.gfx.backend().live_textures(), textures_before + 1);

        f.scene.remove(&mut f.gfx, id).unwrap();
        assert_eq!(f.gfx.backend().live_textures(), textures_before);
    }

    #[test]
    fn text_rejects_unknown_font_and_glyph() {
        let mut f = fixture();
        let ghost = ObjectId::new(901).unwrap();
        assert!(matches!(
            f.scene.create_text(&mut f.gfx, &FakeGlyphs, "x", ghost, 0, Vec2::zero()),
            Err(CoreError::NotFound { kind: "font", .. })
        ));
        let id = f
            .scene
            .create_text(&mut f.gfx, &FakeGlyphs, "x", font(), 0, Vec2::zero())
            .unwrap();
        assert!(matches!(
            f.scene.set_text_glyph(&mut f.gfx, &FakeGlyphs, id, 7),
            Err(CoreError::GlyphOutOfRange { .. })
        ));
        assert!(f.scene.set_text_font(&mut f.gfx, &FakeGlyphs, id, ghost).is_err());
        assert_eq!(f.scene.widget(id).unwrap().size(), Vec2::new(4.0, 6.0));

        let img = image(&mut f, "img", (0.0, 0.0), (1.0, 1.0));
        assert!(f.scene.set_text_glyph(&mut f.gfx, &FakeGlyphs, img, 0).is_err());
    }

    #[test]
    fn set_geometry_replaces_mesh() {
        let mut f = fixture();
        let w = image(&mut f, "tri", (0.0, 0.0), (1.0, 1.0));
        let old = f.scene.widget(w).unwrap().render_state().mesh;
        let tri = [QUAD_VERTICES[0], QUAD_VERTICES[1], QUAD_VERTICES[2]];
        f.scene.set_geometry(&mut f.gfx, w, &tri, &[0, 1, 2]).unwrap();

        let state = f.scene.widget(w).unwrap().render_state();
        assert_ne!(state.mesh, old);
        assert_eq!(state.indices, vec![0, 1, 2]);
        assert_eq!(f.gfx.backend().live_meshes(), 1);
    }

    #[test]
    fn clear_releases_everything() {
        let mut f = fixture();
        image(&mut f, "a", (0.0, 0.0), (1.0, 1.0));
        f.scene
            .create_text(&mut f.gfx, &FakeGlyphs, "t", font(), 0, Vec2::zero())
            .unwrap();
        f.scene.clear(&mut f.gfx);
        assert!(f.scene.is_empty());
        assert_eq!(f.gfx.backend().live_meshes(), 0);
        assert_eq!(f.gfx.backend().live_textures(), 0);
    }
}
