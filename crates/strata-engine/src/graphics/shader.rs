use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::backend::{GpuHandle, GraphicsBackend};
use crate::context::ContextId;
use crate::error::{CoreError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [ShaderStage::Vertex, ShaderStage::Fragment, ShaderStage::Geometry];

    /// Vertex and fragment stages must always be present.
    pub fn is_required(self) -> bool {
        !matches!(self, ShaderStage::Geometry)
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
        })
    }
}

/// Where the text of one stage comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    Inline(String),
    /// Read at creation and again on every reload.
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub text: SourceText,
}

impl ShaderSource {
    pub fn inline(stage: ShaderStage, text: impl Into<String>) -> Self {
        Self {
            stage,
            text: SourceText::Inline(text.into()),
        }
    }

    pub fn path(stage: ShaderStage, path: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            text: SourceText::Path(path.into()),
        }
    }

    fn load(&self) -> Result<String> {
        match &self.text {
            SourceText::Inline(text) => Ok(text.clone()),
            SourceText::Path(path) => fs::read_to_string(path).map_err(|source| {
                log::error!(
                    target: "shader",
                    "failed to read {} stage from '{}': {source}",
                    self.stage,
                    path.display()
                );
                CoreError::ShaderSource {
                    stage: self.stage,
                    path: path.clone(),
                    source,
                }
            }),
        }
    }
}

/// Picks one source per stage. Inline text wins over a path for the same
/// stage; among sources of the same kind the first one wins.
pub(crate) fn select_sources(name: &str, sources: &[ShaderSource]) -> Result<Vec<ShaderSource>> {
    let mut selected = Vec::new();
    for stage in ShaderStage::ALL {
        let first = sources.iter().find(|s| s.stage == stage);
        let inline = sources
            .iter()
            .find(|s| s.stage == stage && matches!(s.text, SourceText::Inline(_)));

        match inline.or(first) {
            Some(source) => selected.push(source.clone()),
            None if stage.is_required() => {
                log::error!(target: "shader", "shader '{name}' has no {stage} stage");
                return Err(CoreError::MissingShaderStage {
                    name: name.to_owned(),
                    stage,
                });
            }
            None => {}
        }
    }
    Ok(selected)
}

/// Compiles and links `sources` into a program.
///
/// Stage objects are deleted once linking finishes, whatever the outcome.
pub(crate) fn build_program<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    name: &str,
    sources: &[ShaderSource],
    log_sources: bool,
) -> Result<GpuHandle> {
    // Read everything first so an unreadable file never costs backend objects.
    let texts = sources
        .iter()
        .map(|s| s.load().map(|text| (s.stage, text)))
        .collect::<Result<Vec<_>>>()?;

    let mut stages = Vec::with_capacity(texts.len());
    for (stage, text) in &texts {
        if log_sources {
            log::trace!(target: "shader", "compiling {stage} stage of '{name}':\n{text}");
        }
        match backend.compile_stage(*stage, text) {
            Ok(handle) => stages.push(handle),
            Err(log) => {
                for handle in stages {
                    backend.delete_stage(handle);
                }
                log::error!(target: "shader", "failed to compile {stage} stage of '{name}': {log}");
                return Err(CoreError::ShaderCompile {
                    name: name.to_owned(),
                    stage: *stage,
                    log,
                });
            }
        }
    }

    let linked = backend.link_program(&stages);
    for handle in stages {
        backend.delete_stage(handle);
    }

    linked.map_err(|log| {
        log::error!(target: "shader", "failed to link '{name}': {log}");
        CoreError::ShaderLink {
            name: name.to_owned(),
            log,
        }
    })
}

/// Linked program plus the sources it was built from.
pub struct Shader {
    name: String,
    context: ContextId,
    program: Option<GpuHandle>,
    sources: Vec<ShaderSource>,
}

impl Shader {
    pub(crate) fn new(name: String, context: ContextId, program: GpuHandle, sources: Vec<ShaderSource>) -> Self {
        Self {
            name,
            context,
            program: Some(program),
            sources,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// `None` only after the shader has been released.
    pub fn program(&self) -> Option<GpuHandle> {
        self.program
    }

    pub fn has_stage(&self, stage: ShaderStage) -> bool {
        self.sources.iter().any(|s| s.stage == stage)
    }

    pub fn source(&self, stage: ShaderStage) -> Option<&ShaderSource> {
        self.sources.iter().find(|s| s.stage == stage)
    }

    pub fn sources(&self) -> &[ShaderSource] {
        &self.sources
    }

    /// Swaps in a freshly linked program and returns the old one.
    pub(crate) fn replace_program(&mut self, program: GpuHandle) -> Option<GpuHandle> {
        self.program.replace(program)
    }

    pub(crate) fn release<B: GraphicsBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(program) = self.program.take() {
            backend.delete_program(program);
        }
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("program", &self.program)
            .finish()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if let Some(program) = self.program {
            log::error!(
                target: "shader",
                "shader '{}' dropped while still owning program {program}; remove it through Graphics",
                self.name
            );
        }
    }
}
