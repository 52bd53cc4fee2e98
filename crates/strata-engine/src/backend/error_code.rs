use std::fmt;

use super::GraphicsBackend;

/// Error flag reported by the backend's error queue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidIndex,
    InvalidOperation,
    StackOverflow,
    StackUnderflow,
    InvalidFramebufferOperation,
    OutOfMemory,
    Unknown(u32),
}

impl ErrorCode {
    /// Maps a raw GL error enum.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x0500 => ErrorCode::InvalidEnum,
            0x0501 => ErrorCode::InvalidValue,
            0x0502 => ErrorCode::InvalidOperation,
            0x0503 => ErrorCode::StackOverflow,
            0x0504 => ErrorCode::StackUnderflow,
            0x0505 => ErrorCode::OutOfMemory,
            0x0506 => ErrorCode::InvalidFramebufferOperation,
            0xFFFF_FFFF => ErrorCode::InvalidIndex,
            other => ErrorCode::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::InvalidEnum => "GL_INVALID_ENUM",
            ErrorCode::InvalidValue => "GL_INVALID_VALUE",
            ErrorCode::InvalidIndex => "GL_INVALID_INDEX",
            ErrorCode::InvalidOperation => "GL_INVALID_OPERATION",
            ErrorCode::StackOverflow => "GL_STACK_OVERFLOW",
            ErrorCode::StackUnderflow => "GL_STACK_UNDERFLOW",
            ErrorCode::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
            ErrorCode::OutOfMemory => "GL_OUT_OF_MEMORY",
            ErrorCode::Unknown(_) => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unknown(raw) => write!(f, "Unknown error (0x{raw:X})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Pops every pending error, up to `limit`.
///
/// A single call can leave several flags set, so this keeps polling until the
/// queue is empty. `limit` bounds the loop for backends that report an error
/// on every poll (a lost context, for example).
pub fn drain_errors<B: GraphicsBackend + ?Sized>(backend: &mut B, limit: usize) -> Vec<ErrorCode> {
    let mut codes = Vec::new();
    while codes.len() < limit {
        match backend.poll_error() {
            Some(code) => codes.push(code),
            None => break,
        }
    }
    codes
}

/// Joins codes into one line, e.g. `"GL_INVALID_ENUM, GL_OUT_OF_MEMORY"`.
pub fn describe_errors(codes: &[ErrorCode]) -> String {
    codes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
