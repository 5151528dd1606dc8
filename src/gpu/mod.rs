//! GPU Resource Layer
//!
//! Owns the `wgpu` device/queue, a compute-pipeline cache keyed by shader
//! source hash, and texture-allocation helpers shared by every pipeline
//! stage. No stage in [`crate::estimator`], [`crate::postprocess`] or
//! [`crate::interpolate`] creates a `wgpu::Device` itself; all of them borrow
//! this layer, matching the single-device-context concurrency model.

pub mod bind;
mod context;
mod pipeline_cache;
mod shader_manager;
mod texture;

pub use bind::{storage_entry, texture_entry, uniform_entry, KernelSlot};
pub use context::GpuContext;
pub use pipeline_cache::{ComputePipelineCache, ComputePipelineId, ComputePipelineKey};
pub use shader_manager::ShaderManager;
pub use texture::{GpuTexture, TextureKind};
