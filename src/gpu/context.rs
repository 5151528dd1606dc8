//! GPU Context
//!
//! Thin holder for the `wgpu::Device`/`wgpu::Queue` pair the whole core
//! pipeline shares. The core never creates a surface or a window; per
//! `spec.md` §6 the caller owns `initialize(gpu_device)` and hands us an
//! already-created device, so this struct is constructed from an existing
//! `(Device, Queue)` rather than requesting an adapter itself. A standalone
//! constructor that does request an adapter is provided for tests and
//! demos that have no surrounding application to supply one.

use std::sync::Arc;

use crate::errors::{FrameGenError, Result};

/// Shared GPU device/queue pair.
///
/// Cheap to clone (both fields are `Arc`-backed in `wgpu`); every pipeline
/// stage holds a `GpuContext` by value rather than by reference so that
/// `prepare`/`run` methods don't need a lifetime parameter back to the
/// owning [`crate::FrameGenerator`].
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Wraps an already-created device/queue pair (the `initialize`
    /// entry point's normal path).
    #[must_use]
    pub fn from_device(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    /// Requests a fresh adapter/device/queue for standalone use (tests,
    /// demos). Not used by [`crate::FrameGenerator::initialize`], which
    /// receives a device from the caller instead.
    pub async fn request_standalone() -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| FrameGenError::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("framepace device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::from_device(Arc::new(device), Arc::new(queue)))
    }
}
