//! Motion Post-Processor
//!
//! Edge-aware spatial smoothing of the half-resolution motion field plus
//! optional temporal accumulation (`spec.md` §4.3). As with the estimator,
//! the scalar weight/blend formulas are kept in plain functions
//! ([`weights`]) separate from the GPU dispatch plumbing ([`MotionPostProcessor`]),
//! so they are unit-testable without a device.

mod weights;

pub use weights::*;

use bytemuck::{Pod, Zeroable};

use crate::config::TemporalStabilizationSettings;
use crate::estimator::motion_field::MotionField;
use crate::gpu::{storage_entry, texture_entry, uniform_entry, ComputePipelineCache, ComputePipelineId, GpuContext, GpuTexture, KernelSlot, TextureKind};
use crate::graph::{ExecuteContext, PrepareContext};

const MOTION_SMOOTH_SRC: &str = include_str!("../gpu/shaders/motion_smooth.wgsl");
const MOTION_TEMPORAL_SRC: &str = include_str!("../gpu/shaders/motion_temporal.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SmoothParamsGpu {
    edge_scale: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TemporalParamsGpu {
    neighborhood: i32,
    history_weight: f32,
    confidence_influence: f32,
    reset: u32,
}

/// History motion field retained across ticks, owned by the post-processor
/// (`spec.md` §9: "each component exclusively owns the GPU resources it
/// creates"). Reset whenever the scheduler signals a pair-identity change.
pub struct TemporalHistory {
    pub field: GpuTexture,
    pub valid: bool,
}

impl TemporalHistory {
    #[must_use]
    pub fn allocate(ctx: &GpuContext, width: u32, height: u32) -> Self {
        Self {
            field: GpuTexture::allocate(ctx, TextureKind::History, width, height, "temporal-history"),
            valid: false,
        }
    }

    pub fn resize(&mut self, ctx: &GpuContext, width: u32, height: u32) {
        self.field.resize(ctx, width, height, "temporal-history");
        self.valid = false;
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

/// Spatial bilateral smoothing plus optional temporal stabilization of the
/// motion field produced by [`crate::estimator::MotionEstimator`].
pub struct MotionPostProcessor {
    smooth: KernelSlot,
    temporal: KernelSlot,
    smooth_uniform: wgpu::Buffer,
    temporal_uniform: wgpu::Buffer,
    dispatches: Vec<(ComputePipelineId, wgpu::BindGroup, (u32, u32, u32))>,
}

impl MotionPostProcessor {
    #[must_use]
    pub fn new(ctx: &GpuContext) -> Self {
        let smooth_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("motion-smooth-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                storage_entry(3, wgpu::TextureFormat::Rg16Float),
                storage_entry(4, wgpu::TextureFormat::R16Float),
                uniform_entry(5),
            ],
        });
        let temporal_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("motion-temporal-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                storage_entry(3, wgpu::TextureFormat::Rg16Float),
                uniform_entry(4),
            ],
        });

        Self {
            smooth: KernelSlot::new(smooth_layout),
            temporal: KernelSlot::new(temporal_layout),
            smooth_uniform: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("smooth-params"),
                size: std::mem::size_of::<SmoothParamsGpu>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            temporal_uniform: ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("temporal-params"),
                size: std::mem::size_of::<TemporalParamsGpu>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            dispatches: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn prepare_tick(
        &mut self,
        ctx: &mut PrepareContext<'_>,
        raw_field: &MotionField,
        curr_luma_half: &GpuTexture,
        smoothed_field: &MotionField,
        history: &mut TemporalHistory,
        stabilized_field: &MotionField,
        enable_temporal: bool,
        reset_history: bool,
        settings: &TemporalStabilizationSettings,
        edge_scale: f32,
    ) {
        self.dispatches.clear();

        let smooth_params = SmoothParamsGpu { edge_scale, _pad0: 0.0, _pad1: 0.0, _pad2: 0.0 };
        ctx.gpu.queue.write_buffer(&self.smooth_uniform, 0, bytemuck::bytes_of(&smooth_params));
        let smooth_id = self.smooth.ensure(ctx, "motion-smooth", MOTION_SMOOTH_SRC);
        let smooth_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motion-smooth-bg"),
            layout: &self.smooth.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&raw_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&raw_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&curr_luma_half.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&smoothed_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&smoothed_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 5, resource: self.smooth_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push((smooth_id, smooth_bg, workgroups_for(smoothed_field.vectors.width, smoothed_field.vectors.height)));

        if !enable_temporal {
            return;
        }

        let temporal_params = TemporalParamsGpu {
            neighborhood: settings.neighborhood as i32,
            history_weight: settings.history_weight,
            confidence_influence: settings.confidence_influence,
            reset: u32::from(reset_history || !history.valid),
        };
        ctx.gpu.queue.write_buffer(&self.temporal_uniform, 0, bytemuck::bytes_of(&temporal_params));
        let temporal_id = self.temporal.ensure(ctx, "motion-temporal", MOTION_TEMPORAL_SRC);
        let temporal_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motion-temporal-bg"),
            layout: &self.temporal.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&smoothed_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&smoothed_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&history.field.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&stabilized_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 4, resource: self.temporal_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push((temporal_id, temporal_bg, workgroups_for(stabilized_field.vectors.width, stabilized_field.vectors.height)));
        history.valid = true;
    }

    pub fn run_tick(&self, _ctx: &ExecuteContext<'_>, encoder: &mut wgpu::CommandEncoder, pipelines: &ComputePipelineCache) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("motion-post-processor"),
            timestamp_writes: None,
        });
        for (pipeline, bind_group, (x, y, z)) in &self.dispatches {
            cpass.set_pipeline(pipelines.get(*pipeline));
            cpass.set_bind_group(0, bind_group, &[]);
            cpass.dispatch_workgroups(*x, *y, *z);
        }
    }
}

#[must_use]
fn workgroups_for(width: u32, height: u32) -> (u32, u32, u32) {
    (width.div_ceil(8), height.div_ceil(8), 1)
}
