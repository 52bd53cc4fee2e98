//! Per-window / per-surface graphics context state.
//!
//! The store only records state. Operations that also touch the backend
//! (make current, validity checks, vsync, present) live on
//! [`Graphics`](crate::graphics::Graphics), which owns both.

mod handle;
mod store;

pub use handle::{ContextId, NativeContext, SurfaceHandle, VSyncMode};
pub use store::{ContextRecord, ContextStore};
