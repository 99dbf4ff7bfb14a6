//! Developer Tooling: frame statistics behind the diagnostics overlay.
//!
//! # Invariants
//! - Stats only observe frame timing; they never influence the tick.

mod stats;

pub use stats::{FrameStats, StatsSummary};

pub fn crate_info() -> &'static str {
    "mirrorworld-tools v0.1.0"
}
