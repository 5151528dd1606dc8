//! Top-Level Frame Generator
//!
//! Ties together the Frame Queue, hierarchical motion estimator, motion
//! post-processor, interpolator, and presentation scheduler into the single
//! type the surrounding application drives (`spec.md` §6). Owns every GPU
//! resource the core allocates; the application supplies only the device
//! (`initialize`) and capture frames (`push_captured_frame`).

use std::sync::Arc;

use crate::capture::Frame;
use crate::config::{DebugViewMode, FrameGenSettings};
use crate::errors::{FrameGenError, Result};
use crate::estimator::motion_field::{BackwardField, CoarseHistory, MotionField};
use crate::estimator::{MotionEstimator, PyramidPair};
use crate::fps::FpsCounter;
use crate::gpu::{ComputePipelineCache, GpuContext, GpuTexture, ShaderManager, TextureKind};
use crate::graph::{ExecuteContext, PrepareContext};
use crate::interpolate::Interpolator;
use crate::postprocess::{MotionPostProcessor, TemporalHistory};
use crate::queue::{FrameQueue, OverflowPolicy};
use crate::scheduler::wait::WaitStrategy;
use crate::scheduler::{PairIdentity, SchedulerState};

/// Number of color slots in the Frame Queue's ring buffer (`spec.md` §3
/// "Entity: Frame Slot").
const SLOT_COUNT: usize = 12;

/// Outcome of one [`FrameGenerator::present_tick`] call: what got presented,
/// and the read-only observables a host typically surfaces in an overlay.
pub struct TickOutcome {
    pub alpha: f32,
    pub interpolated: bool,
    pub presented: bool,
}

/// Read-only observables from `spec.md` §6 ("capture fps, present fps,
/// target fps, last α, interpolated-this-tick flag, average interval,
/// unstable flag").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observables {
    pub capture_fps: f32,
    pub present_fps: f32,
    pub target_fps: f32,
    pub last_alpha: f32,
    pub interpolated_this_tick: bool,
    pub average_interval_100ns: i64,
    pub unstable: bool,
}

/// The motion-compensated frame-generation core. Constructed via
/// [`FrameGenerator::initialize`] from an application-owned `wgpu::Device`;
/// every GPU resource it allocates (slots, pyramids, motion fields, output
/// texture) is reallocated on [`FrameGenerator::resize`] and torn down on
/// drop. No process-global state — a host can run more than one instance
/// against independent capture sources.
pub struct FrameGenerator {
    gpu: GpuContext,
    shaders: ShaderManager,
    pipelines: ComputePipelineCache,
    settings: FrameGenSettings,

    slots: Vec<GpuTexture>,
    queue: FrameQueue,
    next_slot: usize,

    pyramids: PyramidPair,
    backward_field: BackwardField,
    coarse_history: CoarseHistory,
    coarse_scratch: MotionField,
    forward_field: MotionField,
    smoothed_field: MotionField,
    stabilized_field: MotionField,
    temporal_history: TemporalHistory,
    output: GpuTexture,

    estimator: MotionEstimator,
    postprocessor: MotionPostProcessor,
    interpolator: Interpolator,
    scheduler: SchedulerState,

    src_width: u32,
    src_height: u32,

    capture_fps: FpsCounter,
    present_fps: FpsCounter,
    status: Option<String>,

    next_present_instant: Option<std::time::Instant>,
    /// Anchors the wall clock used for pacing to the capture clock, so a
    /// paced `wait` deadline can be mapped back into 100-ns capture ticks
    /// for the scheduler's phase computation. Set from the first observed
    /// pair; never moves once set (re-anchored only by [`Self::resize`]).
    clock_origin: Option<(std::time::Instant, i64)>,
}

impl FrameGenerator {
    /// Builds every GPU resource the core owns against an already-created
    /// `(device, queue)` pair (`spec.md` §6 "initialize(gpu_device)"; the
    /// core never creates its own adapter outside tests —
    /// see [`GpuContext::request_standalone`]).
    #[must_use]
    pub fn initialize(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, src_width: u32, src_height: u32, out_width: u32, out_height: u32) -> Self {
        let gpu = GpuContext::from_device(device, queue);
        let settings = FrameGenSettings::default();

        let slots = (0..SLOT_COUNT)
            .map(|i| GpuTexture::allocate(&gpu, TextureKind::Color, src_width, src_height, &format!("frame-slot-{i}")))
            .collect();

        let (half_w, half_h) = crate::estimator::pyramid::PyramidLevel::Half.dims_from(src_width, src_height);
        let (tiny_w, tiny_h) = crate::estimator::pyramid::PyramidLevel::Tiny.dims_from(src_width, src_height);

        Self {
            queue: FrameQueue::new(settings.max_queue_size, Self::overflow_policy(&settings), settings.jitter_suppression),
            pyramids: PyramidPair::allocate(&gpu, src_width, src_height),
            backward_field: BackwardField::allocate(&gpu, tiny_w, tiny_h),
            coarse_history: CoarseHistory::allocate(&gpu, tiny_w, tiny_h),
            coarse_scratch: MotionField::allocate(&gpu, tiny_w, tiny_h, "coarse-scratch"),
            forward_field: MotionField::allocate(&gpu, half_w, half_h, "forward"),
            smoothed_field: MotionField::allocate(&gpu, half_w, half_h, "smoothed"),
            stabilized_field: MotionField::allocate(&gpu, half_w, half_h, "stabilized"),
            temporal_history: TemporalHistory::allocate(&gpu, half_w, half_h),
            output: GpuTexture::allocate(&gpu, TextureKind::Color, out_width, out_height, "output"),
            estimator: MotionEstimator::new(&gpu),
            postprocessor: MotionPostProcessor::new(&gpu),
            interpolator: Interpolator::new(&gpu),
            scheduler: SchedulerState::new(),
            shaders: ShaderManager::new(),
            pipelines: ComputePipelineCache::new(),
            slots,
            next_slot: 0,
            src_width,
            src_height,
            capture_fps: FpsCounter::new(),
            present_fps: FpsCounter::new(),
            status: None,
            next_present_instant: None,
            clock_origin: None,
            gpu,
            settings,
        }
    }

    fn overflow_policy(settings: &FrameGenSettings) -> OverflowPolicy {
        if settings.never_drop {
            OverflowPolicy::NeverDrop
        } else {
            OverflowPolicy::DropOldest
        }
    }

    /// Releases the slots and the queue is left to drop; no special
    /// teardown is required of `wgpu` resources, but callers that want to
    /// stop a capture-drain worker should join it before dropping `self`.
    pub fn shutdown(self) {
        drop(self);
    }

    /// Reallocates every slot, pyramid, and motion-field texture at the new
    /// dimensions and invalidates retained history (`spec.md` §5 "Source
    /// resize triggers: drain queue, reallocate all slot textures and
    /// pyramid/motion textures at new dimensions, invalidate the
    /// temporal-history of the post-processor. Target resize similarly
    /// reallocates the output chain.").
    pub fn resize(&mut self, src_width: u32, src_height: u32, out_width: u32, out_height: u32) {
        self.queue.clear();
        self.next_slot = 0;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.resize(&self.gpu, src_width, src_height, &format!("frame-slot-{i}"));
        }
        self.pyramids.resize(&self.gpu, src_width, src_height);

        let (half_w, half_h) = crate::estimator::pyramid::PyramidLevel::Half.dims_from(src_width, src_height);
        let (tiny_w, tiny_h) = crate::estimator::pyramid::PyramidLevel::Tiny.dims_from(src_width, src_height);

        self.backward_field.resize(&self.gpu, tiny_w, tiny_h);
        self.coarse_history.resize(&self.gpu, tiny_w, tiny_h);
        self.coarse_scratch.resize(&self.gpu, tiny_w, tiny_h, "coarse-scratch");
        self.forward_field.resize(&self.gpu, half_w, half_h, "forward");
        self.smoothed_field.resize(&self.gpu, half_w, half_h, "smoothed");
        self.stabilized_field.resize(&self.gpu, half_w, half_h, "stabilized");
        self.temporal_history.resize(&self.gpu, half_w, half_h);
        self.output.resize(&self.gpu, out_width, out_height, "output");

        self.src_width = src_width;
        self.src_height = src_height;
        self.queue.set_dimensions_ready();
        self.next_present_instant = None;
        self.clock_origin = None;
    }

    /// Copies a just-captured [`Frame`] into the next free ring-buffer slot
    /// and pushes it onto the queue, per §5's "capture drain... copies into
    /// the next free slot and pushes onto the queue". `qpc_now` is the
    /// caller's high-resolution performance-counter sample.
    pub fn push_captured_frame(&mut self, frame: &Frame, qpc_now: f64) -> Result<()> {
        if frame.width != self.src_width || frame.height != self.src_height {
            self.resize(frame.width, frame.height, self.output.width, self.output.height);
        }

        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % self.slots.len();

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("capture-slot-copy"),
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &frame.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &self.slots[slot].texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: self.src_width,
                height: self.src_height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        self.queue.push(slot, frame.capture_time_100ns, qpc_now);
        self.capture_fps.tick();
        Ok(())
    }

    /// One output tick (`spec.md` §4.5): paces against `wait`, pulls the
    /// scheduler's phase for the current `(prev, curr)` pair, and runs the
    /// full estimate/post-process/interpolate chain. Returns `Ok(None)` if
    /// fewer than two frames are queued yet (capture-transient).
    pub fn present_tick<W: WaitStrategy>(&mut self, wait: &mut W, monitor_refresh_hz: f64, source_rate_hz: f64) -> Result<Option<TickOutcome>> {
        let Some((prev, curr)) = self.queue.peek_pair() else {
            return Ok(None);
        };

        let target_rate = crate::scheduler::select_target_rate(self.settings.output_mode, self.settings.multiplier, source_rate_hz, monitor_refresh_hz);
        let interval_duration = std::time::Duration::from_secs_f64(1.0 / target_rate.max(1.0));
        let deadline = self.next_present_instant.unwrap_or_else(|| wait.now()) + interval_duration;
        wait.wait_until(deadline);
        self.next_present_instant = Some(deadline);

        let &mut (origin_instant, origin_ticks) = self.clock_origin.get_or_insert((wait.now(), prev.smoothed_ts));
        let elapsed_ticks = (deadline.saturating_duration_since(origin_instant)).as_nanos() as i64 / 100;
        let display_time = (origin_ticks + elapsed_ticks) as f64;
        let average_interval = self.queue.average_interval() as f64;
        let actual_interval = (curr.capture_ts - prev.capture_ts) as f64;

        let pair = PairIdentity {
            prev_slot: prev.slot_index,
            curr_slot: curr.slot_index,
            prev_ts: prev.capture_ts,
            curr_ts: curr.capture_ts,
        };
        let tick = self.scheduler.tick(
            pair,
            display_time,
            average_interval,
            actual_interval,
            self.settings.jitter_suppression,
            source_rate_hz,
            self.settings.output_mode,
            self.settings.multiplier,
            self.settings.force_interpolation,
            self.settings.never_drop,
        );

        self.execute_internal(prev.slot_index, curr.slot_index, tick.alpha, tick.reset_temporal)?;

        if tick.should_pop_front {
            self.queue.pop_front();
        }
        self.present_fps.tick();

        Ok(Some(TickOutcome {
            alpha: tick.alpha,
            interpolated: tick.interpolated,
            presented: true,
        }))
    }

    fn execute_internal(&mut self, prev_slot: usize, curr_slot: usize, alpha: f32, reset_history: bool) -> Result<()> {
        // Clone (cheap: Arc-backed handles) rather than borrow, since
        // `run_pipeline` needs `&mut self` for pipeline-cache/prepare state
        // while slot textures are also read.
        let prev = self.slots[prev_slot].clone();
        let curr = self.slots[curr_slot].clone();
        self.run_pipeline(&prev, &curr, alpha, reset_history)
    }

    /// Runs the estimate -> post-process -> interpolate chain directly
    /// against two application-supplied frames (`spec.md` §6
    /// "execute(prev_srv, curr_srv, alpha)"), bypassing the internal queue
    /// and scheduler. For hosts that own their own pacing.
    pub fn execute(&mut self, prev: &GpuTexture, curr: &GpuTexture, alpha: f32) -> Result<()> {
        self.run_pipeline(prev, curr, alpha, false)
    }

    fn run_pipeline(&mut self, prev: &GpuTexture, curr: &GpuTexture, alpha: f32, reset_history: bool) -> Result<()> {
        self.pyramids.swap();

        let mut prepare_ctx = PrepareContext {
            gpu: &self.gpu,
            shaders: &self.shaders,
            pipelines: &mut self.pipelines,
        };

        self.estimator.prepare_tick(
            &mut prepare_ctx,
            curr,
            &self.pyramids.curr,
            &self.pyramids.prev,
            &self.backward_field,
            &mut self.coarse_history,
            &self.forward_field,
            &self.coarse_scratch,
            &self.settings,
        );

        // Minimal-pipeline mode (`spec.md` §4.2/§8 Scenario 6) skips
        // smoothing and temporal stabilization entirely and routes the
        // tiny motion field the reduced estimator produced straight to the
        // interpolator; `forward_field` is never populated in this mode.
        let run_postprocess = !self.settings.minimal_pipeline;
        let (interpolation_field, motion_sample_scale) = if run_postprocess {
            self.postprocessor.prepare_tick(
                &mut prepare_ctx,
                &self.forward_field,
                &self.pyramids.curr.half,
                &self.smoothed_field,
                &mut self.temporal_history,
                &self.stabilized_field,
                self.settings.temporal_stabilization,
                reset_history,
                &self.settings.temporal,
                self.settings.edge_scale,
            );
            let field = if self.settings.temporal_stabilization {
                &self.stabilized_field
            } else {
                &self.smoothed_field
            };
            (field, 1.0)
        } else {
            let scale = self.forward_field.vectors.width as f32 / self.coarse_scratch.vectors.width.max(1) as f32;
            (&self.coarse_scratch, scale)
        };

        self.interpolator.prepare_execute(
            &mut prepare_ctx,
            prev,
            curr,
            interpolation_field,
            &self.output,
            alpha,
            motion_sample_scale,
            self.settings.quality_mode,
            self.settings.text_protect_strength,
            self.settings.edge_threshold,
            1.0,
        );

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("framepace tick"),
        });
        let execute_ctx = ExecuteContext { gpu: &self.gpu };

        encoder.push_debug_group("motion-estimator");
        self.estimator.run_tick(&execute_ctx, &mut encoder, &self.pipelines);
        encoder.pop_debug_group();

        if run_postprocess {
            encoder.push_debug_group("motion-post-processor");
            self.postprocessor.run_tick(&execute_ctx, &mut encoder, &self.pipelines);
            encoder.pop_debug_group();
        }

        encoder.push_debug_group("interpolator");
        self.interpolator.run(&execute_ctx, &mut encoder, &self.pipelines);
        encoder.pop_debug_group();

        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        // This tick's freshly-computed coarse (tiny-res) field becomes next
        // tick's temporal-prediction history; swap rather than copy to avoid
        // a GPU-side blit every tick.
        std::mem::swap(&mut self.coarse_scratch.vectors, &mut self.coarse_history.vectors);
        std::mem::swap(&mut self.coarse_scratch.confidence, &mut self.coarse_history.confidence);

        Ok(())
    }

    /// Passthrough blit of `src` into the output, for when the scheduler
    /// decides not to interpolate this tick (`spec.md` §6 "blit(srv)").
    pub fn blit(&mut self, src: &GpuTexture) -> Result<()> {
        let mut prepare_ctx = PrepareContext {
            gpu: &self.gpu,
            shaders: &self.shaders,
            pipelines: &mut self.pipelines,
        };
        self.interpolator.prepare_blit(&mut prepare_ctx, src, &self.output);

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("blit") });
        let execute_ctx = ExecuteContext { gpu: &self.gpu };
        self.interpolator.run(&execute_ctx, &mut encoder, &self.pipelines);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Renders a debug visualization of the last-computed motion field
    /// (`spec.md` §6 "debug(prev_srv, curr_srv, mode, motion_scale,
    /// diff_scale)").
    pub fn debug(&mut self, prev: &GpuTexture, curr: &GpuTexture, mode: DebugViewMode, motion_scale: f32, diff_scale: f32) -> Result<()> {
        let interpolation_field = if self.settings.temporal_stabilization {
            &self.stabilized_field
        } else {
            &self.smoothed_field
        };
        let mut prepare_ctx = PrepareContext {
            gpu: &self.gpu,
            shaders: &self.shaders,
            pipelines: &mut self.pipelines,
        };
        self.interpolator.prepare_debug(&mut prepare_ctx, prev, curr, interpolation_field, &self.output, mode, motion_scale, diff_scale);

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("debug-view") });
        let execute_ctx = ExecuteContext { gpu: &self.gpu };
        self.interpolator.run(&execute_ctx, &mut encoder, &self.pipelines);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    #[must_use]
    pub fn output_texture(&self) -> &GpuTexture {
        &self.output
    }

    #[must_use]
    pub fn settings(&self) -> &FrameGenSettings {
        &self.settings
    }

    /// Replaces the configuration snapshot, validating first (`spec.md` §6
    /// setters list; this crate exposes one coherent snapshot setter rather
    /// than twenty independent ones, since every field is read together
    /// once per render iteration anyway).
    pub fn set_settings(&mut self, settings: FrameGenSettings) -> Result<()> {
        settings.validate().map_err(|e| match e {
            FrameGenError::InvalidConfig { field, detail } => FrameGenError::InvalidConfig { field, detail },
            other => other,
        })?;
        self.queue.set_jitter_suppression(settings.jitter_suppression);
        self.settings = settings;
        Ok(())
    }

    #[must_use]
    pub fn observables(&self, monitor_refresh_hz: f64, source_rate_hz: f64) -> Observables {
        let target_fps = crate::scheduler::select_target_rate(self.settings.output_mode, self.settings.multiplier, source_rate_hz, monitor_refresh_hz);
        Observables {
            capture_fps: self.capture_fps.current(),
            present_fps: self.present_fps.current(),
            target_fps: target_fps as f32,
            last_alpha: self.scheduler.last_alpha,
            interpolated_this_tick: self.scheduler.interpolated_this_tick,
            average_interval_100ns: self.queue.average_interval(),
            unstable: self.scheduler.unstable,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
