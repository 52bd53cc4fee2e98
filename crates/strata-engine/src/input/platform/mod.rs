//! Windowing adapters.

pub mod winit;
