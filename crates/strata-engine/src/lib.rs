//! Strata engine crate.
//!
//! Graphics-object runtime over a stateful, context-bound backend:
//! identifiers, the generic object registry, per-context state, shaders,
//! textures, cameras, fonts and the input model. Higher layers (the widget
//! scene) build on [`graphics::Graphics`].

pub mod backend;
pub mod context;
pub mod coords;
pub mod error;
pub mod fatal;
pub mod graphics;
pub mod id;
pub mod input;
pub mod logging;
pub mod registry;
pub mod text;

pub use error::{CoreError, Result};
pub use id::ObjectId;
