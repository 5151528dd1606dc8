//! Dataflow Executor
//!
//! A minimal render-graph analog for the compute-only pipeline this crate
//! drives: a [`PipelineStage`] trait with the teacher's `prepare`
//! (mutable, resource/pipeline setup) / `run` (read-only, command
//! recording) split, plus a [`StageGraph`] that runs a fixed ordered list of
//! stages against one shared `wgpu::CommandEncoder` — grounded on the
//! teacher's `RenderNode`/`RenderGraph` (`renderer::graph::node`,
//! `renderer::graph::graph`), simplified from the teacher's
//! dependency-resolved DAG to a fixed pipeline order, since `spec.md` §5
//! fixes the dispatch order itself ("estimation, smoothing, temporal, and
//! interpolation are issued in strict dependency order").

use smallvec::SmallVec;

use crate::gpu::{ComputePipelineCache, GpuContext, ShaderManager};

/// Mutable context handed to [`PipelineStage::prepare`]: everything a stage
/// needs to lazily compile its pipeline and build this tick's bind group.
pub struct PrepareContext<'a> {
    pub gpu: &'a GpuContext,
    pub shaders: &'a ShaderManager,
    pub pipelines: &'a mut ComputePipelineCache,
}

/// Read-only context handed to [`PipelineStage::run`].
pub struct ExecuteContext<'a> {
    pub gpu: &'a GpuContext,
}

/// One dataflow stage: a single compute dispatch with a prepare/run split.
/// Mutation — pipeline compilation, bind group construction — happens only
/// in `prepare`; `run` only records the dispatch.
pub trait PipelineStage {
    fn name(&self) -> &'static str;

    fn prepare(&mut self, ctx: &mut PrepareContext<'_>);

    fn run(&self, ctx: &ExecuteContext<'_>, encoder: &mut wgpu::CommandEncoder);
}

/// Runs a fixed ordered sequence of stages against one command encoder per
/// tick, matching the single-device, single-threaded submission model of
/// `spec.md` §5.
#[derive(Default)]
pub struct StageGraph {
    stages: SmallVec<[Box<dyn PipelineStage>; 8]>,
}

impl StageGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Box<dyn PipelineStage>) {
        self.stages.push(stage);
    }

    /// Runs `prepare` then `run` for every stage in insertion order,
    /// submitting one command buffer for the whole tick.
    pub fn execute(&mut self, gpu: &GpuContext, shaders: &ShaderManager, pipelines: &mut ComputePipelineCache) {
        {
            let mut prepare_ctx = PrepareContext {
                gpu,
                shaders,
                pipelines,
            };
            for stage in &mut self.stages {
                stage.prepare(&mut prepare_ctx);
            }
        }

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("framepace tick encoder"),
        });

        let execute_ctx = ExecuteContext { gpu };
        for stage in &self.stages {
            encoder.push_debug_group(stage.name());
            stage.run(&execute_ctx, &mut encoder);
            encoder.pop_debug_group();
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
