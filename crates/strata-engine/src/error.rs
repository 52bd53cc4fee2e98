use std::path::PathBuf;

use thiserror::Error;

use crate::context::ContextId;
use crate::graphics::ShaderStage;
use crate::id::ObjectId;

/// Recoverable failures reported by engine and UI operations.
///
/// Every variant is also logged at the point of failure; the value returned
/// to the caller lets it decide whether to retry or abandon the higher-level
/// action. No variant implies corrupted state.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("identifier space exhausted")]
    IdsExhausted,

    #[error("{kind} with ID '{id}' is already registered")]
    DuplicateId { kind: &'static str, id: ObjectId },

    #[error("{kind} with ID '{id}' does not exist")]
    NotFound { kind: &'static str, id: ObjectId },

    #[error("cannot attach '{child}' under '{parent}': {reason}")]
    InvalidParent {
        child: ObjectId,
        parent: ObjectId,
        reason: &'static str,
    },

    #[error("context '{0}' is not registered")]
    ContextNotRegistered(ContextId),

    #[error("context '{0}' is already registered")]
    ContextAlreadyRegistered(ContextId),

    #[error("context '{0}' has no native context handle assigned")]
    ContextHandleUnassigned(ContextId),

    #[error("context '{0}' has no shared parent context assigned")]
    SharedContextUnassigned(ContextId),

    #[error("context '{0}' is not valid for rendering")]
    InvalidContext(ContextId),

    #[error("backend extension '{0}' is not available")]
    ExtensionUnavailable(&'static str),

    #[error("invalid name '{0}': names must be 1 to 50 characters")]
    InvalidName(String),

    #[error("shader '{name}' is missing its {stage} stage")]
    MissingShaderStage { name: String, stage: ShaderStage },

    #[error("failed to read {stage} shader source '{}'", path.display())]
    ShaderSource {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {stage} stage of shader '{name}': {log}")]
    ShaderCompile {
        name: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("failed to link shader '{name}': {log}")]
    ShaderLink { name: String, log: String },

    #[error("invalid texture data: {0}")]
    InvalidTexture(String),

    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("backend failed to {action}: {message}")]
    Backend {
        action: &'static str,
        message: String,
    },

    #[error("failed to load font: {0}")]
    FontLoad(String),

    #[error("glyph index '{index}' is out of range for font '{font}'")]
    GlyphOutOfRange { font: ObjectId, index: u32 },

    #[error("widget '{0}' has rendering disabled")]
    RenderDisabled(ObjectId),

    #[error("widget '{0}' has no shader bound")]
    NoShader(ObjectId),

    #[error("{action} events cannot be bound to {binding} input")]
    UnsupportedAction {
        action: &'static str,
        binding: &'static str,
    },

    #[error("widget '{0}' cannot be ordered relative to itself")]
    SelfOrdering(ObjectId),

    #[error("fatal: {0}")]
    Fatal(String),
}

/// Engine-wide result alias.
pub type Result<T> = std::result::Result<T, CoreError>;
