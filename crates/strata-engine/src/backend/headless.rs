use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroU32;

use crate::context::{NativeContext, SurfaceHandle};
use crate::coords::Rect;
use crate::graphics::ShaderStage;

use super::{ErrorCode, GpuHandle, GraphicsBackend, MeshHandles, TextureDesc, Uniform, VertexLayout};

/// Snapshot of the pipeline state at one `draw_indexed` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: GpuHandle,
    pub mesh: MeshHandles,
    pub index_count: u32,
    pub texture: Option<GpuHandle>,
    pub blend: bool,
    pub depth_write: bool,
    pub scissor: Option<Rect>,
}

#[derive(Debug)]
struct MeshRecord {
    handles: MeshHandles,
    index_count: usize,
}

/// In-memory backend.
///
/// Allocates handles from a counter, tracks every live object and state
/// toggle, and records draws instead of rasterizing. Misuse that a real
/// driver would flag (unknown handles, drawing without a program) is pushed
/// onto the error queue rather than panicking.
#[derive(Debug)]
pub struct HeadlessBackend {
    next_handle: u32,

    current: Option<NativeContext>,
    surface: Option<SurfaceHandle>,
    missing_entry_point: Option<String>,
    swap_interval_supported: bool,
    swap_interval: i32,

    stages: HashMap<GpuHandle, ShaderStage>,
    programs: HashSet<GpuHandle>,
    textures: HashMap<GpuHandle, TextureDesc>,
    meshes: HashMap<GpuHandle, MeshRecord>,

    active_program: Option<GpuHandle>,
    bound_textures: HashMap<u32, GpuHandle>,
    uniforms: HashMap<(GpuHandle, String), Uniform>,

    blend: bool,
    depth_write: bool,
    scissor: Option<Rect>,

    fail_next_link: Option<String>,
    fail_next_mesh: Option<String>,
    errors: VecDeque<ErrorCode>,

    draws: Vec<DrawRecord>,
    make_current_calls: usize,
    use_program_calls: usize,
    presents: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            next_handle: 0,
            current: None,
            surface: None,
            missing_entry_point: None,
            swap_interval_supported: true,
            swap_interval: 0,
            stages: HashMap::new(),
            programs: HashSet::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            active_program: None,
            bound_textures: HashMap::new(),
            uniforms: HashMap::new(),
            blend: false,
            depth_write: true,
            scissor: None,
            fail_next_link: None,
            fail_next_mesh: None,
            errors: VecDeque::new(),
            draws: Vec::new(),
            make_current_calls: 0,
            use_program_calls: 0,
            presents: 0,
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    // ── fault injection ───────────────────────────────────────────────────

    /// Reports `name` as unresolved from `load_entry_points`.
    pub fn with_missing_entry_point(mut self, name: impl Into<String>) -> Self {
        self.missing_entry_point = Some(name.into());
        self
    }

    pub fn without_swap_interval(mut self) -> Self {
        self.swap_interval_supported = false;
        self
    }

    pub fn push_error(&mut self, code: ErrorCode) {
        self.errors.push_back(code);
    }

    /// Simulates another thread or library binding (or unbinding) a context.
    pub fn force_current(&mut self, context: Option<NativeContext>) {
        self.current = context;
    }

    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.fail_next_link = Some(log.into());
    }

    pub fn fail_next_mesh(&mut self, message: impl Into<String>) {
        self.fail_next_mesh = Some(message.into());
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_program_live(&self, program: GpuHandle) -> bool {
        self.programs.contains(&program)
    }

    pub fn texture_desc(&self, texture: GpuHandle) -> Option<TextureDesc> {
        self.textures.get(&texture).copied()
    }

    pub fn active_program(&self) -> Option<GpuHandle> {
        self.active_program
    }

    pub fn bound_texture(&self, unit: u32) -> Option<GpuHandle> {
        self.bound_textures.get(&unit).copied()
    }

    pub fn uniform(&self, program: GpuHandle, name: &str) -> Option<Uniform> {
        self.uniforms.get(&(program, name.to_owned())).copied()
    }

    pub fn blend_enabled(&self) -> bool {
        self.blend
    }

    pub fn depth_write_enabled(&self) -> bool {
        self.depth_write
    }

    pub fn scissor(&self) -> Option<Rect> {
        self.scissor
    }

    pub fn swap_interval(&self) -> i32 {
        self.swap_interval
    }

    pub fn bound_surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn take_draws(&mut self) -> Vec<DrawRecord> {
        std::mem::take(&mut self.draws)
    }

    pub fn make_current_calls(&self) -> usize {
        self.make_current_calls
    }

    pub fn use_program_calls(&self) -> usize {
        self.use_program_calls
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn pending_errors(&self) -> usize {
        self.errors.len()
    }

    fn allocate(&mut self) -> GpuHandle {
        let handle = GpuHandle(NonZeroU32::MIN.saturating_add(self.next_handle));
        self.next_handle += 1;
        handle
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn load_entry_points(&mut self) -> Result<(), String> {
        match &self.missing_entry_point {
            Some(name) => Err(name.clone()),
            None => Ok(()),
        }
    }

    fn current_context(&self) -> Option<NativeContext> {
        self.current
    }

    fn make_current(&mut self, surface: SurfaceHandle, context: NativeContext) -> bool {
        self.make_current_calls += 1;
        self.current = Some(context);
        self.surface = Some(surface);
        true
    }

    fn swap_buffers(&mut self, surface: SurfaceHandle) {
        if self.surface != Some(surface) {
            self.errors.push_back(ErrorCode::InvalidOperation);
            return;
        }
        self.presents += 1;
    }

    fn supports_swap_interval(&self) -> bool {
        self.swap_interval_supported
    }

    fn set_swap_interval(&mut self, interval: i32) {
        if !self.swap_interval_supported {
            self.errors.push_back(ErrorCode::InvalidOperation);
            return;
        }
        self.swap_interval = interval;
    }

    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<GpuHandle, String> {
        if source.trim().is_empty() {
            return Err(format!("0:1(1): error: empty {stage} shader source"));
        }
        let handle = self.allocate();
        self.stages.insert(handle, stage);
        Ok(handle)
    }

    fn delete_stage(&mut self, stage: GpuHandle) {
        if self.stages.remove(&stage).is_none() {
            self.errors.push_back(ErrorCode::InvalidValue);
        }
    }

    fn link_program(&mut self, stages: &[GpuHandle]) -> Result<GpuHandle, String> {
        if let Some(log) = self.fail_next_link.take() {
            return Err(log);
        }
        if let Some(unknown) = stages.iter().find(|s| !self.stages.contains_key(s)) {
            return Err(format!("stage {unknown} is not a compiled shader object"));
        }
        let handle = self.allocate();
        self.programs.insert(handle);
        Ok(handle)
    }

    fn delete_program(&mut self, program: GpuHandle) {
        if !self.programs.remove(&program) {
            self.errors.push_back(ErrorCode::InvalidValue);
            return;
        }
        if self.active_program == Some(program) {
            self.active_program = None;
        }
        self.uniforms.retain(|(p, _), _| *p != program);
    }

    fn use_program(&mut self, program: GpuHandle) {
        self.use_program_calls += 1;
        if !self.programs.contains(&program) {
            self.errors.push_back(ErrorCode::InvalidValue);
            return;
        }
        self.active_program = Some(program);
    }

    fn set_uniform(&mut self, program: GpuHandle, name: &str, value: Uniform) {
        if self.active_program != Some(program) {
            self.errors.push_back(ErrorCode::InvalidOperation);
            return;
        }
        self.uniforms.insert((program, name.to_owned()), value);
    }

    fn create_texture(&mut self, desc: TextureDesc, pixels: &[u8]) -> Result<GpuHandle, String> {
        if desc.width == 0 || desc.height == 0 {
            return Err(format!("invalid texture size {}x{}", desc.width, desc.height));
        }
        if pixels.len() != desc.byte_len() {
            return Err(format!(
                "expected {} bytes of pixel data, got {}",
                desc.byte_len(),
                pixels.len()
            ));
        }
        let handle = self.allocate();
        self.textures.insert(handle, desc);
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: GpuHandle) {
        if self.textures.remove(&texture).is_none() {
            self.errors.push_back(ErrorCode::InvalidValue);
            return;
        }
        self.bound_textures.retain(|_, t| *t != texture);
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<GpuHandle>) {
        match texture {
            Some(t) if !self.textures.contains_key(&t) => {
                self.errors.push_back(ErrorCode::InvalidValue);
            }
            Some(t) => {
                self.bound_textures.insert(unit, t);
            }
            None => {
                self.bound_textures.remove(&unit);
            }
        }
    }

    fn create_mesh(
        &mut self,
        layout: &VertexLayout,
        vertices: &[u8],
        indices: &[u32],
    ) -> Result<MeshHandles, String> {
        if let Some(message) = self.fail_next_mesh.take() {
            return Err(message);
        }
        let stride = layout.stride as usize;
        if stride == 0 || vertices.is_empty() || vertices.len() % stride != 0 {
            return Err(format!(
                "vertex data of {} bytes does not match stride {stride}",
                vertices.len()
            ));
        }
        let vertex_count = vertices.len() / stride;
        if indices.is_empty() {
            return Err("index buffer is empty".to_owned());
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(format!("index {bad} out of range for {vertex_count} vertices"));
        }

        let handles = MeshHandles {
            vao: self.allocate(),
            vbo: self.allocate(),
            ebo: self.allocate(),
        };
        self.meshes.insert(
            handles.vao,
            MeshRecord {
                handles,
                index_count: indices.len(),
            },
        );
        Ok(handles)
    }

    fn delete_mesh(&mut self, mesh: MeshHandles) {
        match self.meshes.get(&mesh.vao) {
            Some(record) if record.handles == mesh => {
                self.meshes.remove(&mesh.vao);
            }
            _ => self.errors.push_back(ErrorCode::InvalidValue),
        }
    }

    fn draw_indexed(&mut self, mesh: MeshHandles, index_count: u32) {
        let Some(program) = self.active_program else {
            self.errors.push_back(ErrorCode::InvalidOperation);
            return;
        };
        let Some(record) = self.meshes.get(&mesh.vao) else {
            self.errors.push_back(ErrorCode::InvalidOperation);
            return;
        };
        if index_count as usize > record.index_count {
            self.errors.push_back(ErrorCode::InvalidValue);
            return;
        }
        self.draws.push(DrawRecord {
            program,
            mesh,
            index_count,
            texture: self.bound_textures.get(&0).copied(),
            blend: self.blend,
            depth_write: self.depth_write,
            scissor: self.scissor,
        });
    }

    fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        self.scissor = rect;
    }

    fn poll_error(&mut self) -> Option<ErrorCode> {
        self.errors.pop_front()
    }
}
