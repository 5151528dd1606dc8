//! Shader Module Cache
//!
//! Compiles each of the crate's compute programs (pyramid downsample,
//! motion-estimate, motion-refine, motion-smooth, motion-temporal,
//! interpolate, copy-scale, debug-view — see `spec.md` §6 "Files/pipelines")
//! exactly once per `wgpu::Device`, keyed by an xxh3 hash of the WGSL source.
//! Grounded on the teacher's `ShaderManager::get_or_compile_raw` pattern
//! (`renderer::graph::passes::brdf_lut_compute`), simplified: this crate's
//! shaders are static `include_str!` sources with no templating, so the
//! manager does not need the teacher's Jinja2 layer.

use std::sync::Arc;

use parking_lot::RwLock;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{FrameGenError, Result};

/// Caches compiled `wgpu::ShaderModule`s by a hash of their source text.
#[derive(Default)]
pub struct ShaderManager {
    modules: RwLock<std::collections::HashMap<u64, Arc<wgpu::ShaderModule>>>,
}

impl ShaderManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cached module for `source`, compiling it on first use.
    ///
    /// Returns the module plus the hash used as its cache key, so callers
    /// can fold the hash into a pipeline-cache key without re-hashing.
    pub fn get_or_compile(
        &self,
        device: &wgpu::Device,
        label: &'static str,
        source: &'static str,
    ) -> (Arc<wgpu::ShaderModule>, u64) {
        let hash = xxh3_64(source.as_bytes());

        if let Some(module) = self.modules.read().get(&hash) {
            return (module.clone(), hash);
        }

        let module = Arc::new(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }));

        self.modules.write().insert(hash, module.clone());
        (module, hash)
    }

    /// Like [`Self::get_or_compile`] but surfaces compile errors through
    /// `FrameGenError` instead of relying on `wgpu`'s validation-layer
    /// panic/log path, for callers that want `Result`-based error handling
    /// at pipeline-creation time (currently used in tests only, since
    /// `wgpu` validates shader modules asynchronously via the device's
    /// uncaptured-error callback in production).
    pub fn try_get_or_compile(
        &self,
        device: &wgpu::Device,
        label: &'static str,
        source: &'static str,
    ) -> Result<(Arc<wgpu::ShaderModule>, u64)> {
        if source.trim().is_empty() {
            return Err(FrameGenError::ShaderCompilationFailed {
                pipeline: label,
                detail: "empty shader source".into(),
            });
        }
        Ok(self.get_or_compile(device, label, source))
    }
}
