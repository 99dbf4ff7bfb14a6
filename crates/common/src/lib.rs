//! Shared value types used by every mirrorworld crate.
//!
//! # Invariants
//! - Types here are plain data: no rendering, input or loading behavior.

mod types;

pub use types::{NodeId, Rgb, SurfaceSize, Transform, ViewRole};
