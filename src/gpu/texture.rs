//! GPU Texture Allocation
//!
//! Thin wrapper around `wgpu::Texture` plus its default view, grounded on
//! the data-model entities in `SPEC_FULL.md` §3 (Frame Slot, Luma Pyramid
//! level, Motion Field, History Texture). Each [`TextureKind`] fixes the
//! format and usage flags a stage needs so call sites don't repeat the
//! `wgpu::TextureDescriptor` boilerplate for every allocation.

use crate::gpu::GpuContext;

/// The families of textures the pipeline allocates. Each variant maps to a
/// single `wgpu::TextureFormat` and a fixed usage set; stages pick a kind
/// instead of assembling a descriptor by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Captured or presented color frame (Frame Slot payload).
    Color,
    /// Single-channel luma, used by every pyramid level.
    Luma,
    /// Two-channel motion vector field (`Rg16Float`, signed sub-pixel
    /// offsets in source-pixel units).
    MotionField,
    /// Single-channel confidence map, `[0, 1]`.
    Confidence,
    /// History texture retained across ticks for temporal stabilization.
    History,
}

impl TextureKind {
    #[must_use]
    const fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Color => wgpu::TextureFormat::Bgra8Unorm,
            Self::Luma | Self::Confidence => wgpu::TextureFormat::R16Float,
            Self::MotionField | Self::History => wgpu::TextureFormat::Rg16Float,
        }
    }

    #[must_use]
    const fn usage(self) -> wgpu::TextureUsages {
        wgpu::TextureUsages::TEXTURE_BINDING
            .union(wgpu::TextureUsages::STORAGE_BINDING)
            .union(wgpu::TextureUsages::COPY_SRC)
            .union(wgpu::TextureUsages::COPY_DST)
    }
}

/// An allocated texture plus its full-extent default view. Cheap to clone
/// (`wgpu::Texture`/`wgpu::TextureView` are `Arc`-backed handles) — cloning
/// shares the same GPU resource, it does not allocate a copy.
#[derive(Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
}

impl GpuTexture {
    /// Allocates a new texture of `kind` sized `width x height`.
    #[must_use]
    pub fn allocate(ctx: &GpuContext, kind: TextureKind, width: u32, height: u32, label: &str) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: kind.usage(),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            kind,
            width,
            height,
        }
    }

    /// Reallocates in place if `width`/`height` differ from the current
    /// size; a no-op otherwise. Mirrors the resize path `spec.md` §6
    /// requires of `resize(new_width, new_height)`.
    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32, label: &str) {
        if self.width == width && self.height == height {
            return;
        }
        *self = Self::allocate(ctx, self.kind, width, height, label);
    }
}
