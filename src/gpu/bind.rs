//! Bind-Group-Layout Helpers
//!
//! Shared by every multi-kernel component's GPU dispatch module
//! (`estimator::passes`, `postprocess`, `interpolate`): a lazily-compiled
//! pipeline slot plus the three binding-entry shapes every WGSL kernel in
//! this crate uses (a write-only storage texture, a sampled texture, a
//! uniform buffer). Pulled out once three components had grown byte-for-byte
//! identical copies of the same dozen lines.

use crate::gpu::{ComputePipelineId, ComputePipelineKey};
use crate::graph::PrepareContext;

/// Lazily-compiled pipeline plus the bind group layout it was built from.
/// `ensure` compiles the shader and creates the pipeline on first call and
/// is a no-op thereafter, mirroring the teacher's `ensure_pipeline` pattern.
pub struct KernelSlot {
    pub(crate) layout: wgpu::BindGroupLayout,
    pipeline: Option<ComputePipelineId>,
}

impl KernelSlot {
    #[must_use]
    pub fn new(layout: wgpu::BindGroupLayout) -> Self {
        Self { layout, pipeline: None }
    }

    pub fn ensure(&mut self, ctx: &mut PrepareContext<'_>, label: &'static str, source: &'static str) -> ComputePipelineId {
        if let Some(id) = self.pipeline {
            return id;
        }

        let (module, hash) = ctx.shaders.get_or_compile(&ctx.gpu.device, label, source);
        let pipeline_layout = ctx.gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[Some(&self.layout)],
            immediate_size: 0,
        });

        let key = ComputePipelineKey {
            shader_hash: hash,
            entry_point: "main",
        };
        let id = ctx.pipelines.get_or_create(key, || {
            ctx.gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        });
        self.pipeline = Some(id);
        id
    }
}

#[must_use]
pub const fn storage_entry(binding: u32, format: wgpu::TextureFormat) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format,
            view_dimension: wgpu::TextureViewDimension::D2,
        },
        count: None,
    }
}

#[must_use]
pub const fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

#[must_use]
pub const fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
