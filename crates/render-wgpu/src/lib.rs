//! wgpu render backend for mirrorworld.
//!
//! Draws a `Frame` in three stages: a directional shadow map, the lit and
//! fogged scene into an offscreen target (multisampled when antialiasing is
//! on, downsampled when a pixelation pass is present), then a blit to the
//! window that applies bloom and can substitute a captured freeze frame.
//!
//! # Invariants
//! - The surface never mutates scene or camera state.
//! - A captured freeze frame survives resizes of the live target.

mod context;
mod gpu;
mod shaders;
mod surface;

pub use context::GpuContext;
pub use surface::{OverlayPainter, PaintContext, WgpuSurface};
