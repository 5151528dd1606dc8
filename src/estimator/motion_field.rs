//! Motion Field
//!
//! The grid of per-pixel motion vectors and confidence the estimator
//! produces (`spec.md` §3 "Motion Field"): a forward field at "half"
//! resolution, a backward field at "tiny" resolution for consistency
//! rejection, and a coarse "tiny"-resolution field retained from the
//! previous output tick as the temporal prediction input.

use crate::gpu::{GpuContext, GpuTexture, TextureKind};

/// Forward motion vectors plus confidence at half resolution, the
/// estimator's primary output consumed by the post-processor and
/// interpolator.
pub struct MotionField {
    pub vectors: GpuTexture,
    pub confidence: GpuTexture,
}

impl MotionField {
    #[must_use]
    pub fn allocate(ctx: &GpuContext, width: u32, height: u32, label: &str) -> Self {
        Self {
            vectors: GpuTexture::allocate(ctx, TextureKind::MotionField, width, height, &format!("{label}-mv")),
            confidence: GpuTexture::allocate(ctx, TextureKind::Confidence, width, height, &format!("{label}-conf")),
        }
    }

    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32, label: &str) {
        self.vectors.resize(ctx, width, height, &format!("{label}-mv"));
        self.confidence.resize(ctx, width, height, &format!("{label}-conf"));
    }
}

/// Backward (current->previous) field at tiny resolution, used only for
/// consistency rejection — never consumed directly by the interpolator
/// outside minimal-pipeline mode. Carries its own confidence texture,
/// distinct from the forward coarse field's, since forward and backward
/// confidence are independent signals feeding different downstream
/// consumers (`spec.md` §4.2).
pub struct BackwardField {
    pub vectors: GpuTexture,
    pub confidence: GpuTexture,
}

impl BackwardField {
    #[must_use]
    pub fn allocate(ctx: &GpuContext, tiny_width: u32, tiny_height: u32) -> Self {
        Self {
            vectors: GpuTexture::allocate(ctx, TextureKind::MotionField, tiny_width, tiny_height, "backward-tiny-mv"),
            confidence: GpuTexture::allocate(ctx, TextureKind::Confidence, tiny_width, tiny_height, "backward-tiny-conf"),
        }
    }

    pub fn resize(&mut self, ctx: &GpuContext, tiny_width: u32, tiny_height: u32) {
        self.vectors.resize(ctx, tiny_width, tiny_height, "backward-tiny-mv");
        self.confidence.resize(ctx, tiny_width, tiny_height, "backward-tiny-conf");
    }
}

/// Coarse ("tiny"-resolution) motion retained from the previous output
/// tick, sampled by the coarse search as its temporal prediction candidate.
/// Shares the tiny-level grid the coarse-search kernel actually dispatches
/// and bounds-checks against, so the swap with `FrameGenerator`'s
/// coarse-scratch field at the end of a tick exchanges like-sized textures.
pub struct CoarseHistory {
    pub vectors: GpuTexture,
    pub confidence: GpuTexture,
    /// `false` until the first tick has populated the history (the
    /// coarse-search shader must not sample an uninitialized prediction).
    pub populated: bool,
}

impl CoarseHistory {
    #[must_use]
    pub fn allocate(ctx: &GpuContext, tiny_width: u32, tiny_height: u32) -> Self {
        Self {
            vectors: GpuTexture::allocate(ctx, TextureKind::MotionField, tiny_width, tiny_height, "coarse-history-mv"),
            confidence: GpuTexture::allocate(ctx, TextureKind::Confidence, tiny_width, tiny_height, "coarse-history-conf"),
            populated: false,
        }
    }

    pub fn resize(&mut self, ctx: &GpuContext, tiny_width: u32, tiny_height: u32) {
        self.vectors.resize(ctx, tiny_width, tiny_height, "coarse-history-mv");
        self.confidence.resize(ctx, tiny_width, tiny_height, "coarse-history-conf");
        self.populated = false;
    }

    pub fn invalidate(&mut self) {
        self.populated = false;
    }
}

/// Per-level vector-magnitude bound, `min(W, H) / 4` (`spec.md` §3 "Motion
/// Field" invariant).
#[must_use]
pub fn magnitude_bound(width: u32, height: u32) -> f32 {
    (width.min(height) as f32 / 4.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_bound_scales_with_smaller_dimension() {
        assert!((magnitude_bound(100, 200) - 25.0).abs() < 1e-6);
        assert!((magnitude_bound(40, 40) - 10.0).abs() < 1e-6);
    }
}
