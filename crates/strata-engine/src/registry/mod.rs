//! Generic object ownership with a parent/child side table.
//!
//! One [`Registry`] per object kind. The hierarchy logic lives in
//! [`Hierarchy`] and does not depend on the stored type.

mod hierarchy;
mod store;

pub use hierarchy::{Ancestors, Attach, Hierarchy};
pub use store::Registry;
