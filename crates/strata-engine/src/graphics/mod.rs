//! Context-bound graphics objects and the state that owns them.
//!
//! [`Graphics`] is the single owner of everything the backend allocates:
//! - the identifier source
//! - the context store
//! - shader, texture and camera registries
//!
//! Every entry point takes it explicitly; there is no global state.

mod camera;
mod geometry;
mod shader;
mod texture;

use crate::backend::{
    describe_errors, drain_errors, ErrorCode, GpuHandle, GraphicsBackend, MeshHandles, Uniform,
};
use crate::context::{ContextId, ContextStore, NativeContext, SurfaceHandle, VSyncMode};
use crate::coords::Rect;
use crate::error::{CoreError, Result};
use crate::fatal::FatalHandler;
use crate::id::{validate_name, IdSource, ObjectId};
use crate::registry::Registry;

pub use camera::{Camera, CameraDesc};
pub use geometry::{Vertex, QUAD_INDICES, QUAD_VERTICES};
pub use shader::{Shader, ShaderSource, ShaderStage, SourceText};
pub use texture::{AlphaMask, Texture, TextureData, TextureFormat};

/// Startup configuration for [`Graphics`].
#[derive(Debug, Clone)]
pub struct GraphicsInit {
    /// Upper bound on error codes popped per drain.
    pub error_drain_limit: usize,
    /// Logs every stage's source at trace level before compiling it.
    pub log_shader_sources: bool,
}

impl Default for GraphicsInit {
    fn default() -> Self {
        Self {
            error_drain_limit: 64,
            log_shader_sources: false,
        }
    }
}

pub struct Graphics<B: GraphicsBackend> {
    backend: B,
    ids: IdSource,
    contexts: ContextStore,
    fatal: FatalHandler,
    init: GraphicsInit,

    shaders: Registry<Shader>,
    textures: Registry<Texture>,
    cameras: Registry<Camera>,
}

impl<B: GraphicsBackend> Graphics<B> {
    /// Verifies the backend's mandatory entry points and takes ownership.
    ///
    /// A missing entry point is fatal: `fatal` is invoked, and if it returns
    /// the error is reported as [`CoreError::Fatal`].
    pub fn new(mut backend: B, init: GraphicsInit, mut fatal: FatalHandler) -> Result<Self> {
        if let Err(name) = backend.load_entry_points() {
            let err = fatal.escalate(
                "backend",
                format!("failed to resolve mandatory entry point '{name}'"),
            );
            return Err(CoreError::Fatal(err.to_string()));
        }

        log::info!(
            target: "backend",
            "graphics initialized (error drain limit {})",
            init.error_drain_limit
        );

        Ok(Self {
            backend,
            ids: IdSource::new(),
            contexts: ContextStore::new(),
            fatal,
            init,
            shaders: Registry::new("shader"),
            textures: Registry::new("texture"),
            cameras: Registry::new("camera"),
        })
    }

    pub fn init(&self) -> &GraphicsInit {
        &self.init
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Issues an identifier from the shared source. Widgets and fonts draw
    /// from the same counter so identifiers stay unique across kinds.
    pub fn next_id(&mut self) -> Result<ObjectId> {
        self.ids.issue().inspect_err(|e| log::error!(target: "registry", "{e}"))
    }

    pub fn ids(&self) -> &IdSource {
        &self.ids
    }

    // ── contexts ──────────────────────────────────────────────────────────

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextStore {
        &mut self.contexts
    }

    /// Registers a new context, optionally with its native handle.
    pub fn create_context(&mut self, native: Option<NativeContext>) -> Result<ContextId> {
        let id = ContextId::from(self.next_id()?);
        self.contexts.register(id)?;
        if let Some(native) = native {
            self.contexts.set_native(id, native)?;
        }
        Ok(id)
    }

    /// Unregisters `ctx` and releases every shader, texture and camera
    /// created on it.
    pub fn destroy_context(&mut self, ctx: ContextId) -> Result<()> {
        self.contexts.record(ctx)?;

        let shaders: Vec<ObjectId> = owned_by(&self.shaders, ctx, Shader::context);
        for id in shaders {
            // Already gone if removed with an earlier parent.
            if self.shaders.contains(id) {
                self.remove_shader(id)?;
            }
        }
        let textures: Vec<ObjectId> = owned_by(&self.textures, ctx, Texture::context);
        for id in textures {
            if self.textures.contains(id) {
                self.remove_texture(id)?;
            }
        }
        let cameras: Vec<ObjectId> = owned_by(&self.cameras, ctx, Camera::context);
        for id in cameras {
            if self.cameras.contains(id) {
                self.cameras.remove(id)?;
            }
        }

        self.contexts.unregister(ctx)?;
        Ok(())
    }

    /// Binds `ctx` to `surface` unless its native context is already current.
    pub fn make_current(&mut self, ctx: ContextId, surface: SurfaceHandle) -> Result<()> {
        let native = self.contexts.native(ctx)?;
        if self.backend.current_context() == Some(native) {
            log::trace!(target: "context", "context '{ctx}' is already current");
            return Ok(());
        }
        if !self.backend.make_current(surface, native) {
            log::error!(target: "context", "failed to make context '{ctx}' current");
            return Err(CoreError::Backend {
                action: "make context current",
                message: describe_errors(&self.drain_error_codes()),
            });
        }
        Ok(())
    }

    /// Whether `ctx` is the backend's current context.
    ///
    /// An unregistered or unassigned context, or no current context at all,
    /// is reported and yields `false`. A *different* current context means
    /// the thread/context bookkeeping is corrupted and escalates as fatal.
    pub fn is_context_valid(&mut self, ctx: ContextId) -> bool {
        let Ok(native) = self.contexts.native(ctx) else {
            return false;
        };
        match self.backend.current_context() {
            None => {
                log::error!(target: "context", "context '{ctx}' is invalid because no context is current");
                false
            }
            Some(current) if current != native => {
                self.fatal.escalate(
                    "context",
                    format!(
                        "current context {:#x} does not match stored context {:#x} of '{ctx}'",
                        current.raw(),
                        native.raw()
                    ),
                );
                false
            }
            Some(_) => true,
        }
    }

    /// Applies and records a swap interval. Without the swap-control
    /// extension the previous mode stays in effect.
    pub fn set_vsync(&mut self, ctx: ContextId, mode: VSyncMode) -> Result<()> {
        self.contexts.record(ctx)?;
        if !self.backend.supports_swap_interval() {
            log::error!(
                target: "context",
                "cannot set vsync of '{ctx}' because the swap control extension is not loaded"
            );
            return Err(CoreError::ExtensionUnavailable("swap_control"));
        }
        self.backend.set_swap_interval(mode.interval());
        self.contexts.set_vsync_mode(ctx, mode)
    }

    pub fn swap_buffers(&mut self, ctx: ContextId, surface: SurfaceHandle) -> Result<()> {
        self.contexts.record(ctx)?;
        self.backend.swap_buffers(surface);
        Ok(())
    }

    // ── backend errors ────────────────────────────────────────────────────

    pub fn drain_error_codes(&mut self) -> Vec<ErrorCode> {
        drain_errors(&mut self.backend, self.init.error_drain_limit)
    }

    /// All pending error codes joined with `", "`. Empty if none.
    pub fn drain_errors(&mut self) -> String {
        describe_errors(&self.drain_error_codes())
    }

    /// Logs a warning naming `label` if any backend errors were pending.
    pub fn check_errors(&mut self, label: &str) -> bool {
        let codes = self.drain_error_codes();
        if codes.is_empty() {
            return false;
        }
        log::warn!(target: "backend", "{label}: {}", describe_errors(&codes));
        true
    }

    // ── shaders ───────────────────────────────────────────────────────────

    pub fn create_shader(
        &mut self,
        ctx: ContextId,
        name: &str,
        sources: &[ShaderSource],
    ) -> Result<ObjectId> {
        validate_name(name)?;
        self.contexts.record(ctx)?;
        let sources = shader::select_sources(name, sources)?;
        let id = self.next_id()?;

        let program = shader::build_program(
            &mut self.backend,
            name,
            &sources,
            self.init.log_shader_sources,
        )?;

        self.shaders
            .add(id, Shader::new(name.to_owned(), ctx, program, sources))?;
        log::debug!(target: "shader", "created shader '{name}' ({id}) on context '{ctx}'");
        Ok(id)
    }

    pub fn shader(&self, id: ObjectId) -> Option<&Shader> {
        self.shaders.get(id)
    }

    pub fn shaders(&self) -> &Registry<Shader> {
        &self.shaders
    }

    /// Makes the shader's program current on `ctx`, skipping the call if
    /// `ctx` already has it bound.
    pub fn bind_shader(&mut self, ctx: ContextId, id: ObjectId) -> Result<GpuHandle> {
        let shader = self.shaders.lookup(id)?;
        let program = shader.program().ok_or(CoreError::NotFound { kind: "program", id })?;

        if self.contexts.last_program(ctx)? != Some(program) {
            self.backend.use_program(program);
            self.contexts.set_last_program(ctx, Some(program))?;
        }
        Ok(program)
    }

    /// Binds the shader on `ctx` and uploads one uniform.
    pub fn set_uniform(
        &mut self,
        ctx: ContextId,
        id: ObjectId,
        name: &str,
        value: impl Into<Uniform>,
    ) -> Result<()> {
        let program = self.bind_shader(ctx, id)?;
        self.backend.set_uniform(program, name, value.into());
        Ok(())
    }

    /// Re-reads path-backed stages and relinks. On failure the previous
    /// program stays in use.
    pub fn reload_shader(&mut self, id: ObjectId) -> Result<()> {
        let shader = self.shaders.lookup(id)?;
        let name = shader.name().to_owned();
        let sources = shader.sources().to_vec();

        let program = shader::build_program(
            &mut self.backend,
            &name,
            &sources,
            self.init.log_shader_sources,
        )
        .inspect_err(|_| {
            log::warn!(target: "shader", "keeping previous program of '{name}' after failed reload");
        })?;

        let old = self.shaders.lookup_mut(id)?.replace_program(program);
        if let Some(old) = old {
            self.contexts.forget_program(old);
            self.backend.delete_program(old);
        }
        log::info!(target: "shader", "reloaded shader '{name}' ({id})");
        Ok(())
    }

    /// Removes the shader and its descendants, releasing their programs.
    pub fn remove_shader(&mut self, id: ObjectId) -> Result<()> {
        for (_, mut shader) in self.shaders.remove(id)? {
            if let Some(program) = shader.program() {
                self.contexts.forget_program(program);
            }
            shader.release(&mut self.backend);
        }
        Ok(())
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn create_texture(
        &mut self,
        ctx: ContextId,
        name: &str,
        data: TextureData<'_>,
    ) -> Result<ObjectId> {
        validate_name(name)?;
        self.contexts.record(ctx)?;
        data.validate()
            .inspect_err(|e| log::error!(target: "texture", "cannot create '{name}': {e}"))?;
        let id = self.next_id()?;

        let desc = data.desc();
        let handle = self
            .backend
            .create_texture(desc, data.pixels)
            .map_err(|message| {
                log::error!(target: "texture", "backend rejected '{name}': {message}");
                CoreError::Backend {
                    action: "create texture",
                    message,
                }
            })?;

        let texture = Texture::new(name.to_owned(), ctx, handle, desc, AlphaMask::from_data(&data));
        self.textures.add(id, texture)?;
        log::debug!(
            target: "texture",
            "created texture '{name}' ({id}) {}x{} {:?}",
            desc.width,
            desc.height,
            desc.format
        );
        Ok(id)
    }

    /// Decodes an encoded image (PNG, JPEG, ...) and uploads it as RGBA8.
    pub fn create_texture_from_image(
        &mut self,
        ctx: ContextId,
        name: &str,
        encoded: &[u8],
    ) -> Result<ObjectId> {
        let image = image::load_from_memory(encoded)
            .inspect_err(|e| log::error!(target: "texture", "cannot decode '{name}': {e}"))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        self.create_texture(
            ctx,
            name,
            TextureData {
                width,
                height,
                format: TextureFormat::Rgba8,
                pixels: image.as_raw(),
            },
        )
    }

    pub fn texture(&self, id: ObjectId) -> Option<&Texture> {
        self.textures.get(id)
    }

    pub fn textures(&self) -> &Registry<Texture> {
        &self.textures
    }

    /// Binds `texture` to `unit`, or unbinds the unit with `None`.
    pub fn bind_texture(&mut self, unit: u32, texture: Option<ObjectId>) -> Result<()> {
        let handle = match texture {
            Some(id) => Some(
                self.textures
                    .lookup(id)?
                    .handle()
                    .ok_or(CoreError::NotFound { kind: "texture handle", id })?,
            ),
            None => None,
        };
        self.backend.bind_texture(unit, handle);
        Ok(())
    }

    pub fn remove_texture(&mut self, id: ObjectId) -> Result<()> {
        for (_, mut texture) in self.textures.remove(id)? {
            texture.release(&mut self.backend);
        }
        Ok(())
    }

    // ── cameras ───────────────────────────────────────────────────────────

    /// Creates a camera on `ctx`, which must have a native handle assigned.
    pub fn create_camera(&mut self, ctx: ContextId, desc: CameraDesc) -> Result<ObjectId> {
        self.contexts.native(ctx)?;
        let id = self.next_id()?;
        self.cameras.add(id, Camera::new(ctx, desc))?;
        log::debug!(target: "camera", "created camera ({id}) on context '{ctx}'");
        Ok(id)
    }

    pub fn camera(&self, id: ObjectId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    pub fn camera_mut(&mut self, id: ObjectId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    pub fn remove_camera(&mut self, id: ObjectId) -> Result<()> {
        self.cameras.remove(id)?;
        Ok(())
    }

    // ── geometry + draw state ─────────────────────────────────────────────

    pub fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> Result<MeshHandles> {
        self.backend
            .create_mesh(&Vertex::LAYOUT, bytemuck::cast_slice(vertices), indices)
            .map_err(|message| {
                log::error!(target: "backend", "mesh upload failed: {message}");
                CoreError::Backend {
                    action: "create mesh",
                    message,
                }
            })
    }

    pub fn delete_mesh(&mut self, mesh: MeshHandles) {
        self.backend.delete_mesh(mesh);
    }

    pub fn draw_indexed(&mut self, mesh: MeshHandles, index_count: u32) {
        self.backend.draw_indexed(mesh, index_count);
    }

    pub fn set_blend(&mut self, enabled: bool) {
        self.backend.set_blend(enabled);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.backend.set_depth_write(enabled);
    }

    pub fn set_scissor(&mut self, rect: Option<Rect>) {
        self.backend.set_scissor(rect);
    }
}

impl<B: GraphicsBackend> Drop for Graphics<B> {
    fn drop(&mut self) {
        for (_, mut shader) in self.shaders.drain() {
            shader.release(&mut self.backend);
        }
        for (_, mut texture) in self.textures.drain() {
            texture.release(&mut self.backend);
        }
    }
}

fn owned_by<T>(registry: &Registry<T>, ctx: ContextId, context_of: fn(&T) -> ContextId) -> Vec<ObjectId> {
    registry
        .iter()
        .filter(|(_, obj)| context_of(obj) == ctx)
        .map(|(id, _)| id)
        .collect()
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Uniform {
            fn from(value: $ty) -> Self {
                Uniform::$variant(value)
            }
        })*
    };
}

uniform_from! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    glam::Vec2 => Vec2,
    glam::Vec3 => Vec3,
    glam::Vec4 => Vec4,
    glam::Mat2 => Mat2,
    glam::Mat3 => Mat3,
    glam::Mat4 => Mat4,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::fatal::FatalError;

    const VERT: &str = "void main() { gl_Position = vec4(0.0); }";
    const FRAG: &str = "void main() {}";

    fn native(v: usize) -> NativeContext {
        NativeContext::from_raw(v).unwrap()
    }

    fn surface() -> SurfaceHandle {
        SurfaceHandle::from_raw(0x51).unwrap()
    }

    fn recording_handler() -> (FatalHandler, Rc<RefCell<Vec<FatalError>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (FatalHandler::new(move |e| sink.borrow_mut().push(e.clone())), seen)
    }

    fn gfx() -> Graphics<HeadlessBackend> {
        Graphics::new(HeadlessBackend::new(), GraphicsInit::default(), FatalHandler::halt()).unwrap()
    }

    fn quad_sources() -> [ShaderSource; 2] {
        [
            ShaderSource::inline(ShaderStage::Vertex, VERT),
            ShaderSource::inline(ShaderStage::Fragment, FRAG),
        ]
    }

    #[test]
    fn missing_entry_point_escalates() {
        let (handler, seen) = recording_handler();
        let backend = HeadlessBackend::new().with_missing_entry_point("glCreateProgram");
        let result = Graphics::new(backend, GraphicsInit::default(), handler);

        assert!(matches!(result, Err(CoreError::Fatal(_))));
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].reason.contains("glCreateProgram"));
    }

    #[test]
    fn native_handle_is_unavailable_until_assigned() {
        let mut g = gfx();
        let c1 = g.create_context(None).unwrap();
        assert!(g.contexts().native(c1).is_err());

        g.contexts_mut().set_native(c1, native(0xAA)).unwrap();
        assert_eq!(g.contexts().native(c1).unwrap(), native(0xAA));
    }

    #[test]
    fn make_current_skips_redundant_binds() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();

        g.make_current(c, surface()).unwrap();
        g.make_current(c, surface()).unwrap();
        assert_eq!(g.backend().make_current_calls(), 1);
    }

    #[test]
    fn make_current_requires_an_assigned_handle() {
        let mut g = gfx();
        let c = g.create_context(None).unwrap();
        assert!(matches!(
            g.make_current(c, surface()),
            Err(CoreError::ContextHandleUnassigned(_))
        ));
        assert_eq!(g.backend().make_current_calls(), 0);
    }

    #[test]
    fn context_validity() {
        let (handler, seen) = recording_handler();
        let mut g = Graphics::new(HeadlessBackend::new(), GraphicsInit::default(), handler).unwrap();
        let c = g.create_context(Some(native(1))).unwrap();

        // Nothing current yet: reported, not fatal.
        assert!(!g.is_context_valid(c));
        assert!(seen.borrow().is_empty());

        g.make_current(c, surface()).unwrap();
        assert!(g.is_context_valid(c));

        // Someone else bound a different context behind our back.
        g.backend_mut().force_current(Some(native(2)));
        assert!(!g.is_context_valid(c));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].target, "context");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "fatal graphics error")]
    fn context_mismatch_halts_without_a_handler() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        g.backend_mut().force_current(Some(native(2)));
        g.is_context_valid(c);
    }

    #[test]
    fn vsync_requires_the_extension() {
        let backend = HeadlessBackend::new().without_swap_interval();
        let mut g = Graphics::new(backend, GraphicsInit::default(), FatalHandler::halt()).unwrap();
        let c = g.create_context(Some(native(1))).unwrap();

        assert!(matches!(
            g.set_vsync(c, VSyncMode::Off),
            Err(CoreError::ExtensionUnavailable(_))
        ));
        assert_eq!(g.contexts().vsync_mode(c).unwrap(), VSyncMode::On);
    }

    #[test]
    fn vsync_applies_and_records() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        g.set_vsync(c, VSyncMode::On).unwrap();
        assert_eq!(g.backend().swap_interval(), 1);
        g.set_vsync(c, VSyncMode::Off).unwrap();
        assert_eq!(g.backend().swap_interval(), 0);
        assert_eq!(g.contexts().vsync_mode(c).unwrap(), VSyncMode::Off);
    }

    #[test]
    fn drain_collects_every_pending_error() {
        let mut g = gfx();
        g.backend_mut().push_error(ErrorCode::InvalidEnum);
        g.backend_mut().push_error(ErrorCode::InvalidValue);
        g.backend_mut().push_error(ErrorCode::OutOfMemory);

        assert_eq!(g.drain_errors(), "GL_INVALID_ENUM, GL_INVALID_VALUE, GL_OUT_OF_MEMORY");
        assert_eq!(g.drain_errors(), "");
        assert!(!g.check_errors("idle"));
    }

    #[test]
    fn drain_is_bounded() {
        let init = GraphicsInit {
            error_drain_limit: 2,
            ..GraphicsInit::default()
        };
        let mut g = Graphics::new(HeadlessBackend::new(), init, FatalHandler::halt()).unwrap();
        for _ in 0..5 {
            g.backend_mut().push_error(ErrorCode::InvalidOperation);
        }
        assert_eq!(g.drain_error_codes().len(), 2);
        assert_eq!(g.backend().pending_errors(), 3);
    }

    #[test]
    fn shader_lifecycle_and_program_cache() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        let s = g.create_shader(c, "quad", &quad_sources()).unwrap();

        let program = g.bind_shader(c, s).unwrap();
        g.bind_shader(c, s).unwrap();
        assert_eq!(g.backend().use_program_calls(), 1);
        assert_eq!(g.contexts().last_program(c).unwrap(), Some(program));

        g.set_uniform(c, s, "uOpacity", 0.5f32).unwrap();
        assert_eq!(g.backend().uniform(program, "uOpacity"), Some(Uniform::Float(0.5)));

        g.remove_shader(s).unwrap();
        assert!(g.shader(s).is_none());
        assert_eq!(g.backend().live_programs(), 0);
        assert_eq!(g.contexts().last_program(c).unwrap(), None);
    }

    #[test]
    fn program_cache_is_per_render_context() {
        let mut g = gfx();
        let a = g.create_context(Some(native(0x10))).unwrap();
        let b = g.create_context(Some(native(0x20))).unwrap();
        let s = g.create_shader(a, "quad", &quad_sources()).unwrap();

        let program = g.bind_shader(a, s).unwrap();
        g.bind_shader(b, s).unwrap();
        g.bind_shader(b, s).unwrap();
        assert_eq!(g.backend().use_program_calls(), 2);
        assert_eq!(g.contexts().last_program(a).unwrap(), Some(program));
        assert_eq!(g.contexts().last_program(b).unwrap(), Some(program));

        g.remove_shader(s).unwrap();
        assert_eq!(g.contexts().last_program(a).unwrap(), None);
        assert_eq!(g.contexts().last_program(b).unwrap(), None);
    }

    #[test]
    fn binding_on_an_unregistered_context_fails() {
        let mut g = gfx();
        let a = g.create_context(Some(native(1))).unwrap();
        let b = g.create_context(Some(native(2))).unwrap();
        let s = g.create_shader(a, "quad", &quad_sources()).unwrap();
        g.destroy_context(b).unwrap();
        assert!(matches!(g.bind_shader(b, s), Err(CoreError::ContextNotRegistered(_))));
        assert_eq!(g.backend().use_program_calls(), 0);
    }

    #[test]
    fn failed_shader_leaves_nothing_registered() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        g.backend_mut().fail_next_link("undefined reference to main");

        let err = g.create_shader(c, "quad", &quad_sources()).unwrap_err();
        assert!(matches!(err, CoreError::ShaderLink { .. }));
        assert!(g.shaders().is_empty());
        assert_eq!(g.backend().live_programs(), 0);
        assert_eq!(g.backend().live_stages(), 0);
    }

    #[test]
    fn shader_on_unregistered_context_is_rejected() {
        let mut g = gfx();
        let ghost = ContextId::new(99).unwrap();
        assert!(matches!(
            g.create_shader(ghost, "quad", &quad_sources()),
            Err(CoreError::ContextNotRegistered(_))
        ));
    }

    #[test]
    fn reload_failure_keeps_previous_program() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        let s = g.create_shader(c, "quad", &quad_sources()).unwrap();
        let before = g.shader(s).unwrap().program();

        g.backend_mut().fail_next_link("boom");
        assert!(g.reload_shader(s).is_err());
        assert_eq!(g.shader(s).unwrap().program(), before);

        g.reload_shader(s).unwrap();
        let after = g.shader(s).unwrap().program();
        assert_ne!(after, before);
        assert_eq!(g.backend().live_programs(), 1);
    }

    #[test]
    fn texture_keeps_alpha_mask_and_releases_once() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        let pixels = [255, 255, 255, 255, 0, 0, 0, 0];
        let t = g
            .create_texture(
                c,
                "icon",
                TextureData { width: 2, height: 1, format: TextureFormat::Rgba8, pixels: &pixels },
            )
            .unwrap();

        let tex = g.texture(t).unwrap();
        assert!(tex.has_alpha());
        assert_eq!(tex.alpha_mask().unwrap().alpha_at(1, 0), Some(0));

        g.remove_texture(t).unwrap();
        assert_eq!(g.backend().live_textures(), 0);
        assert!(g.remove_texture(t).is_err());
        assert_eq!(g.drain_errors(), "");
    }

    #[test]
    fn texture_from_encoded_image() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 128]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        let t = g.create_texture_from_image(c, "png", &png).unwrap();
        let tex = g.texture(t).unwrap();
        assert_eq!((tex.width(), tex.height()), (3, 2));
        assert_eq!(tex.alpha_mask().unwrap().alpha_at(2, 1), Some(128));

        assert!(matches!(
            g.create_texture_from_image(c, "junk", b"not an image"),
            Err(CoreError::ImageDecode(_))
        ));
    }

    #[test]
    fn camera_requires_native_handle() {
        let mut g = gfx();
        let c = g.create_context(None).unwrap();
        assert!(g.create_camera(c, CameraDesc::default()).is_err());

        g.contexts_mut().set_native(c, native(3)).unwrap();
        let cam = g.create_camera(c, CameraDesc::default()).unwrap();
        g.camera_mut(cam).unwrap().set_aspect_from_size(100, 50);
        assert_eq!(g.camera(cam).unwrap().aspect(), 2.0);
        g.remove_camera(cam).unwrap();
        assert!(g.camera(cam).is_none());
    }

    #[test]
    fn destroy_context_releases_its_objects() {
        let mut g = gfx();
        let a = g.create_context(Some(native(1))).unwrap();
        let b = g.create_context(Some(native(2))).unwrap();
        g.create_shader(a, "a", &quad_sources()).unwrap();
        let kept = g.create_shader(b, "b", &quad_sources()).unwrap();

        g.destroy_context(a).unwrap();
        assert!(!g.contexts().contains(a));
        assert_eq!(g.shaders().len(), 1);
        assert!(g.shader(kept).is_some());
        assert_eq!(g.backend().live_programs(), 1);
    }

    #[test]
    fn ids_are_shared_across_kinds() {
        let mut g = gfx();
        let c = g.create_context(Some(native(1))).unwrap();
        let s = g.create_shader(c, "quad", &quad_sources()).unwrap();
        let cam = g.create_camera(c, CameraDesc::default()).unwrap();
        assert_eq!(c.get(), 1);
        assert!(s < cam);
    }
}
