//! Motion Estimator GPU Passes
//!
//! The coarse (tiny-level), backward, medium-refine (small-level), and
//! fine-refine (half-level) compute dispatches, each with the teacher's
//! `prepare` (lazy pipeline/bind-group setup) / `run` (dispatch-only) split.
//! A single [`MotionEstimator`] owns all four and implements
//! [`PipelineStage`] itself, since the passes share uniform buffers and a
//! strict dependency order (`spec.md` §5) rather than being independently
//! reorderable nodes.

use bytemuck::{Pod, Zeroable};

use crate::config::FrameGenSettings;
use crate::estimator::cost::clamp_search_radius;
use crate::estimator::motion_field::{BackwardField, CoarseHistory, MotionField};
use crate::estimator::pyramid::LumaPyramid;
use crate::gpu::{storage_entry, texture_entry, uniform_entry, ComputePipelineCache, ComputePipelineId, GpuContext, GpuTexture, KernelSlot};
use crate::graph::{ExecuteContext, PrepareContext};

const LUMA_DOWNSAMPLE_SRC: &str = include_str!("../gpu/shaders/luma_downsample.wgsl");
const PYRAMID_DOWNSAMPLE_SRC: &str = include_str!("../gpu/shaders/pyramid_downsample.wgsl");
const MOTION_ESTIMATE_SRC: &str = include_str!("../gpu/shaders/motion_estimate.wgsl");
const MOTION_REFINE_SRC: &str = include_str!("../gpu/shaders/motion_refine.wgsl");

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct EstimateParamsGpu {
    radius: i32,
    use_prediction: u32,
    swap_sources: u32,
    _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct RefineParamsGpu {
    radius: i32,
    scale: f32,
    use_backward: u32,
    _pad: u32,
}

/// Coarse-to-fine motion estimator: produces a forward half-resolution
/// motion field and confidence (`spec.md` §4.2), plus a backward tiny field
/// for consistency rejection.
pub struct MotionEstimator {
    luma_downsample: KernelSlot,
    pyramid_downsample: KernelSlot,
    coarse_estimate: KernelSlot,
    medium_refine: KernelSlot,
    fine_refine: KernelSlot,

    estimate_uniform: wgpu::Buffer,
    backward_uniform: wgpu::Buffer,
    medium_uniform: wgpu::Buffer,
    fine_uniform: wgpu::Buffer,

    dispatches: Vec<PreparedDispatch>,
}

struct PreparedDispatch {
    pipeline: ComputePipelineId,
    bind_group: wgpu::BindGroup,
    workgroups: (u32, u32, u32),
    label: &'static str,
}

impl MotionEstimator {
    #[must_use]
    pub fn new(ctx: &GpuContext) -> Self {
        let estimate_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("coarse-estimate-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                storage_entry(3, wgpu::TextureFormat::Rg16Float),
                storage_entry(4, wgpu::TextureFormat::R16Float),
                uniform_entry(5),
            ],
        });
        let refine_layout = refine_bind_group_layout(ctx);
        let fine_refine_layout = refine_bind_group_layout(ctx);
        let luma_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("luma-downsample-layout"),
            entries: &[texture_entry(0), storage_entry(1, wgpu::TextureFormat::R16Float)],
        });
        let pyramid_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pyramid-downsample-layout"),
            entries: &[texture_entry(0), storage_entry(1, wgpu::TextureFormat::R16Float)],
        });

        let make_uniform = |label: &str, size: u64| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            luma_downsample: KernelSlot::new(luma_layout),
            pyramid_downsample: KernelSlot::new(pyramid_layout),
            coarse_estimate: KernelSlot::new(estimate_layout),
            medium_refine: KernelSlot::new(refine_layout),
            fine_refine: KernelSlot::new(fine_refine_layout),
            estimate_uniform: make_uniform("estimate-params", std::mem::size_of::<EstimateParamsGpu>() as u64),
            backward_uniform: make_uniform("backward-estimate-params", std::mem::size_of::<EstimateParamsGpu>() as u64),
            medium_uniform: make_uniform("medium-refine-params", std::mem::size_of::<RefineParamsGpu>() as u64),
            fine_uniform: make_uniform("fine-refine-params", std::mem::size_of::<RefineParamsGpu>() as u64),
            dispatches: Vec::new(),
        }
    }

    /// Lazily compiles every kernel and builds this tick's bind groups and
    /// uniform contents from `curr_pyramid`/`prev_pyramid`/`history`. Called
    /// from [`PipelineStage::prepare`]; performs no dispatch recording.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare_tick(
        &mut self,
        ctx: &mut PrepareContext<'_>,
        curr_color: &GpuTexture,
        curr_pyramid: &LumaPyramid,
        prev_pyramid: &LumaPyramid,
        backward_field: &BackwardField,
        history: &mut CoarseHistory,
        forward_field: &MotionField,
        coarse_field: &MotionField,
        settings: &FrameGenSettings,
    ) {
        self.dispatches.clear();

        // Luma downsample (source color -> half luma for curr).
        let luma_id = self.luma_downsample.ensure(ctx, "luma-downsample", LUMA_DOWNSAMPLE_SRC);
        let luma_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("luma-downsample-bg"),
            layout: &self.luma_downsample.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&curr_color.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&curr_pyramid.half.view) },
            ],
        });
        self.dispatches.push(PreparedDispatch {
            pipeline: luma_id,
            bind_group: luma_bg,
            workgroups: workgroups_for(curr_pyramid.half.width, curr_pyramid.half.height),
            label: "luma-downsample",
        });

        // Pyramid downsample half -> small -> tiny.
        let pyr_id = self.pyramid_downsample.ensure(ctx, "pyramid-downsample", PYRAMID_DOWNSAMPLE_SRC);
        for (src, dst) in [(&curr_pyramid.half, &curr_pyramid.small), (&curr_pyramid.small, &curr_pyramid.tiny)] {
            let bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("pyramid-downsample-bg"),
                layout: &self.pyramid_downsample.layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&src.view) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&dst.view) },
                ],
            });
            self.dispatches.push(PreparedDispatch {
                pipeline: pyr_id,
                bind_group: bg,
                workgroups: workgroups_for(dst.width, dst.height),
                label: "pyramid-downsample",
            });
        }

        let model = settings.motion_model;
        let radius = clamp_search_radius(model.tiny_radius(), curr_pyramid.tiny.width, curr_pyramid.tiny.height);
        let use_prediction = history.populated && (settings.motion_prediction || model.widens_without_prediction());

        // Forward coarse search.
        let coarse_params = EstimateParamsGpu {
            radius: radius as i32,
            use_prediction: u32::from(use_prediction),
            swap_sources: 0,
            _pad: 0,
        };
        ctx.gpu.queue.write_buffer(&self.estimate_uniform, 0, bytemuck::bytes_of(&coarse_params));
        let coarse_id = self.coarse_estimate.ensure(ctx, "motion-estimate", MOTION_ESTIMATE_SRC);
        let coarse_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("coarse-estimate-bg"),
            layout: &self.coarse_estimate.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&curr_pyramid.tiny.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&prev_pyramid.tiny.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&history.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&coarse_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&coarse_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 5, resource: self.estimate_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push(PreparedDispatch {
            pipeline: coarse_id,
            bind_group: coarse_bg,
            workgroups: workgroups_for(curr_pyramid.tiny.width, curr_pyramid.tiny.height),
            label: "motion-estimate-forward",
        });

        // Backward coarse search: swapped sources, no prediction, smaller radius.
        let backward_radius = clamp_search_radius(radius.saturating_sub(1).max(1), curr_pyramid.tiny.width, curr_pyramid.tiny.height);
        let backward_params = EstimateParamsGpu {
            radius: backward_radius as i32,
            use_prediction: 0,
            swap_sources: 1,
            _pad: 0,
        };
        ctx.gpu.queue.write_buffer(&self.backward_uniform, 0, bytemuck::bytes_of(&backward_params));
        let backward_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("backward-estimate-bg"),
            layout: &self.coarse_estimate.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&prev_pyramid.tiny.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&curr_pyramid.tiny.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&history.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&backward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&backward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 5, resource: self.backward_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push(PreparedDispatch {
            pipeline: coarse_id,
            bind_group: backward_bg,
            workgroups: workgroups_for(curr_pyramid.tiny.width, curr_pyramid.tiny.height),
            label: "motion-estimate-backward",
        });

        if settings.minimal_pipeline {
            history.populated = true;
            return;
        }

        // Medium refine (small level) — reads the tiny-level coarse field
        // (one pyramid-halving step below "small") and its own confidence
        // texture so the regularization/backward-penalty weights can be
        // sampled per pixel instead of fixed per dispatch.
        let medium_radius = clamp_search_radius(model.small_radius(), curr_pyramid.small.width, curr_pyramid.small.height);
        let medium_params = RefineParamsGpu {
            radius: medium_radius as i32,
            scale: 2.0,
            use_backward: u32::from(model.enforces_backward_consistency()),
            _pad: 0,
        };
        ctx.gpu.queue.write_buffer(&self.medium_uniform, 0, bytemuck::bytes_of(&medium_params));
        let medium_id = self.medium_refine.ensure(ctx, "motion-refine-medium", MOTION_REFINE_SRC);
        let medium_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("medium-refine-bg"),
            layout: &self.medium_refine.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&curr_pyramid.small.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&prev_pyramid.small.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&coarse_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&coarse_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&backward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 5, resource: wgpu::BindingResource::TextureView(&backward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 6, resource: wgpu::BindingResource::TextureView(&forward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 7, resource: wgpu::BindingResource::TextureView(&forward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 8, resource: self.medium_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push(PreparedDispatch {
            pipeline: medium_id,
            bind_group: medium_bg,
            workgroups: workgroups_for(curr_pyramid.small.width, curr_pyramid.small.height),
            label: "motion-refine-medium",
        });

        // Fine refine (half level) — reuses the same shader; its "coarse"
        // input is the field medium refine just wrote, one pyramid-halving
        // step below "half".
        let fine_radius = clamp_search_radius(model.full_radius(), curr_pyramid.half.width, curr_pyramid.half.height);
        let fine_params = RefineParamsGpu {
            radius: fine_radius as i32,
            scale: 2.0,
            use_backward: u32::from(model.enforces_backward_consistency()),
            _pad: 0,
        };
        ctx.gpu.queue.write_buffer(&self.fine_uniform, 0, bytemuck::bytes_of(&fine_params));
        let fine_id = self.fine_refine.ensure(ctx, "motion-refine-fine", MOTION_REFINE_SRC);
        let fine_bg = ctx.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fine-refine-bg"),
            layout: &self.fine_refine.layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&curr_pyramid.half.view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&prev_pyramid.half.view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(&forward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(&forward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 4, resource: wgpu::BindingResource::TextureView(&backward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 5, resource: wgpu::BindingResource::TextureView(&backward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 6, resource: wgpu::BindingResource::TextureView(&forward_field.vectors.view) },
                wgpu::BindGroupEntry { binding: 7, resource: wgpu::BindingResource::TextureView(&forward_field.confidence.view) },
                wgpu::BindGroupEntry { binding: 8, resource: self.fine_uniform.as_entire_binding() },
            ],
        });
        self.dispatches.push(PreparedDispatch {
            pipeline: fine_id,
            bind_group: fine_bg,
            workgroups: workgroups_for(curr_pyramid.half.width, curr_pyramid.half.height),
            label: "motion-refine-fine",
        });

        history.populated = true;
    }

    /// Records every dispatch prepared by [`Self::prepare_tick`].
    pub fn run_tick(&self, ctx: &ExecuteContext<'_>, encoder: &mut wgpu::CommandEncoder, pipelines: &ComputePipelineCache) {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("motion-estimator"),
            timestamp_writes: None,
        });
        for dispatch in &self.dispatches {
            let _ = ctx;
            cpass.set_pipeline(pipelines.get(dispatch.pipeline));
            cpass.set_bind_group(0, &dispatch.bind_group, &[]);
            let (x, y, z) = dispatch.workgroups;
            cpass.dispatch_workgroups(x, y, z);
            let _ = dispatch.label;
        }
    }
}

#[must_use]
fn workgroups_for(width: u32, height: u32) -> (u32, u32, u32) {
    (width.div_ceil(8), height.div_ceil(8), 1)
}

/// Bind group layout shape shared by the medium and fine refine kernels:
/// luma pair, coarse vectors + coarse confidence, backward vectors +
/// backward confidence, then the storage outputs and uniform.
fn refine_bind_group_layout(ctx: &GpuContext) -> wgpu::BindGroupLayout {
    ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("refine-layout"),
        entries: &[
            texture_entry(0),
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            texture_entry(4),
            texture_entry(5),
            storage_entry(6, wgpu::TextureFormat::Rg16Float),
            storage_entry(7, wgpu::TextureFormat::R16Float),
            uniform_entry(8),
        ],
    })
}
