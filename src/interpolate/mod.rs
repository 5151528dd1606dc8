//! Interpolator
//!
//! Bidirectional motion-compensated warp producing the presented output
//! frame (`spec.md` §4.4). The masking/candidate-selection/halo-clamp
//! scalar math is restated in [`reference`] for unit testing; this module
//! owns the GPU dispatch for `execute`, `blit`, and `debug`.

pub mod reference;

use bytemuck::{Pod, Zeroable};

use crate::config::{DebugViewMode, QualityMode};
use crate::estimator::motion_field::MotionField;
use crate::gpu::{storage_entry, texture_entry, uniform_entry, ComputePipelineCache, ComputePipelineId, GpuContext, GpuTexture, KernelSlot};
use crate::graph::{ExecuteContext, PrepareContext};

const INTERPOLATE_SRC: &str = include_str!("../gpu/shaders/interpolate.wgsl");
const COPY_SCALE_SRC: &str = include_str!("../gpu/shaders/copy_scale.wgsl");
const DEBUG_VIEW_SRC: &str = include_str!("../gpu/shaders/debug_view.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct InterpParamsGpu {
    alpha: f32,
    motion_sample_scale: f32,
    diff_scale: f32,
    text_protect_strength: f32,
    edge_threshold: f32,
    quality_high: u32,
    _pad0: u32,
    _pad1: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DebugParamsGpu {
    mode: u32,
    motion_scale: f32,
    diff_scale: f32,
    _pad: f32,
}

impl DebugViewMode {
    #[must_use]
    const fn shader_code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::MotionFlow => 1,
            Self::ConfidenceHeatmap => 2,
            Self::MotionNeedles => 3,
            Self::ResidualError => 4,
            Self::SplitScreen => 5,
            Self::Occlusion => 6,
            Self::GhostMask => 7,
            Self::StructureGradient => 8,
        }
    }
}

/// Owns the `execute`/`blit`/`debug` compute dispatches. Per
/// `spec.md` §4.4, `execute` is the crate's hottest entry point: its
/// uniform buffer is allocated once at construction and only ever
/// `write_buffer`-updated, never reallocated per call.
pub struct Interpolator {
    interpolate: KernelSlot,
    copy_scale: KernelSlot,
    debug_view: KernelSlot,
    interp_uniform: wgpu::Buffer,
    debug_uniform: wgpu::Buffer,
    dispatch: Option<(ComputePipelineId, wgpu::BindGroup, (u32, u32, u32))>,
}

impl Interpolator {
    #[must_use]
    pub fn new(ctx: &GpuContext) -> Self {
        let interpolate_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("interpolate-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                storage_entry(4, wgpu::TextureFormat::Bgra8Unorm),
                uniform_entry(5),
            ],
        });
        let copy_scale_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("copy-scale-layout"),
            entries: &[texture_entry(0), storage_entry(1, wgpu::TextureFormat::Bgra8Unorm)],
        });
        let debug_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("debug-view-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                storage_entry(4, wgpu::TextureFormat::Bgra8Unorm),
                uniform_entry(5),
            ],
        });

        Self {
            interpolate: KernelSlot::new(interpolate_layout),
            copy_scale: KernelSlot::new(copy_scale_layout),
            debug_view: KernelSlot::new(debug_layout),
            interp_uniform: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("interp-params"),
                size: std::mem::size_of::<InterpParamsGpu>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            debug_uniform: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("debug-params"),
                size: std::mem::size_of::<DebugParamsGpu>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            dispatch: None,
        }
    }

    /// Prepares the `execute` dispatch: bidirectional warp of `prev`/`curr`
    /// by `field` at phase `alpha`, writing into `output`.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_execute(
        &mut self,
        ctx: &mut PrepareContext<'_>,
        prev: &GpuTexture,
        curr: &GpuTexture,
        field: &MotionField,
        output: &GpuTexture,
        alpha: f32,
        motion_sample_scale: f32,
        quality_mode: QualityMode,
        text_protect_strength: f32,
        edge_threshold: f32,
        diff_scale: f32,
    ) {
        let params = InterpParamsGpu {
            alpha,
            motion_sample_scale,
            diff_scale,
            text_protect_strength,
            edge_threshold,
            quality_high: u32::from(quality_mode == QualityMode::High),
            _pad0: 0,
            _pad1: 0,
        };
        ctx.gpu.queue.write_buffer(&self.interp_uniform, 0, bytemuck::bytes_of(&params));

        let id = self.interpolate.ensure(ctx, "interpolate", INTERPOLATE_SRC);
        let bind_group = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("interpolate-bg"),
            layout: &self.interpolate.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&prev.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&curr.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&field.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&field.confidence.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&output.view) },
                wgpu::BindGroupEntry { binding: 5, resource: self.interp_uniform.as_entire_binding() },
            ],
        });
        self.dispatch = Some((id, bind_group, workgroups_for(output.width, output.height)));
    }

    /// Prepares a passthrough `blit` dispatch.
    pub fn prepare_blit(&mut self, ctx: &mut PrepareContext<'_>, src: &GpuTexture, output: &GpuTexture) {
        let id = self.copy_scale.ensure(ctx, "copy-scale", COPY_SCALE_SRC);
        let bind_group = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("copy-scale-bg"),
            layout: &self.copy_scale.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&src.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&output.view) },
            ],
        });
        self.dispatch = Some((id, bind_group, workgroups_for(output.width, output.height)));
    }

    /// Prepares a `debug` visualization dispatch.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_debug(
        &mut self,
        ctx: &mut PrepareContext<'_>,
        prev: &GpuTexture,
        curr: &GpuTexture,
        field: &MotionField,
        output: &GpuTexture,
        mode: DebugViewMode,
        motion_scale: f32,
        diff_scale: f32,
    ) {
        let params = DebugParamsGpu { mode: mode.shader_code(), motion_scale, diff_scale, _pad: 0.0 };
        ctx.gpu.queue.write_buffer(&self.debug_uniform, 0, bytemuck::bytes_of(&params));

        let id = self.debug_view.ensure(ctx, "debug-view", DEBUG_VIEW_SRC);
        let bind_group = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("debug-view-bg"),
            layout: &self.debug_view.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&prev.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&curr.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&field.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&field.confidence.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&output.view) },
                wgpu::BindGroupEntry { binding: 5, resource: self.debug_uniform.as_entire_binding() },
            ],
        });
        self.dispatch = Some((id, bind_group, workgroups_for(output.width, output.height)));
    }

    pub fn run(&self, _ctx: &ExecuteContext<'_>, encoder: &mut wgpu::CommandEncoder, pipelines: &ComputePipelineCache) {
        let Some((pipeline, bind_group, (x, y, z))) = &self.dispatch else {
            return;
        };
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("interpolator"),
            timestamp_writes: None,
        });
        cpass.set_pipeline(pipelines.get(*pipeline));
        cpass.set_bind_group(0, bind_group, &[]);
        cpass.dispatch_workgroups(*x, *y, *z);
    }
}

#[must_use]
fn workgroups_for(width: u32, height: u32) -> (u32, u32, u32) {
    (width.div_ceil(8), height.div_ceil(8), 1)
}
