//! Motion Estimator
//!
//! Hierarchical three-level coarse-to-fine block matcher (`spec.md` §4.2):
//! pyramid construction, coarse (tiny) search with candidate prediction,
//! backward consistency search, and medium/fine refine passes. Pure scalar
//! cost/confidence math lives in [`cost`] so it is unit-testable without a
//! GPU context; the GPU dispatch plumbing lives in [`passes`].

pub mod cost;
pub mod motion_field;
pub mod pyramid;
mod passes;

pub use passes::MotionEstimator;

use crate::gpu::GpuContext;
use pyramid::LumaPyramid;

/// The previous/current luma pyramid pair the estimator reads each tick,
/// mirroring the Frame Queue's `(prev, curr)` window.
pub struct PyramidPair {
    pub prev: LumaPyramid,
    pub curr: LumaPyramid,
}

impl PyramidPair {
    #[must_use]
    pub fn allocate(ctx: &GpuContext, width: u32, height: u32) -> Self {
        Self {
            prev: LumaPyramid::allocate(ctx, width, height, "prev-pyramid"),
            curr: LumaPyramid::allocate(ctx, width, height, "curr-pyramid"),
        }
    }

    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32) {
        self.prev.resize(ctx, width, height, "prev-pyramid");
        self.curr.resize(ctx, width, height, "curr-pyramid");
    }

    /// Swaps prev/curr in place so the tick's newly-built curr pyramid
    /// becomes next tick's prev, avoiding a reallocation.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.curr);
    }
}
