//! Runtime Configuration
//!
//! This module defines the user-tunable configuration for the
//! frame-generation core. There is no persisted state (see `spec.md` §6):
//! every field here is runtime-only and is read coherently once per render
//! iteration as a single-writer snapshot, matching the concurrency model's
//! "Configuration is a single-writer snapshot read coherently once per
//! render iteration" rule.
//!
//! # Example
//!
//! ```rust,ignore
//! use framepace::config::{FrameGenSettings, MotionModel, QualityMode, OutputMode};
//!
//! let settings = FrameGenSettings {
//!     multiplier: 2,
//!     quality_mode: QualityMode::High,
//!     motion_model: MotionModel::Adaptive,
//!     ..Default::default()
//! };
//! ```

/// Motion-model preset selecting search radii and backward-consistency use.
///
/// `Adaptive` additionally widens radii when no temporal prediction is
/// available or when temporal stabilization is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionModel {
    Adaptive,
    Stable,
    Balanced,
    Coverage,
}

impl MotionModel {
    /// Search radius at the tiny level, in tiny-grid pixels.
    #[must_use]
    pub const fn tiny_radius(self) -> u32 {
        match self {
            Self::Adaptive | Self::Coverage => 4,
            Self::Balanced => 3,
            Self::Stable => 2,
        }
    }

    /// Search radius at the small (medium refine) level.
    #[must_use]
    pub const fn small_radius(self) -> u32 {
        match self {
            Self::Adaptive | Self::Coverage => 4,
            Self::Balanced => 3,
            Self::Stable => 2,
        }
    }

    /// Search radius at the half (fine refine) level.
    #[must_use]
    pub const fn full_radius(self) -> u32 {
        match self {
            Self::Adaptive | Self::Coverage => 3,
            Self::Balanced => 2,
            Self::Stable => 1,
        }
    }

    /// Whether backward-consistency rejection is enforced at the small and
    /// full refine stages for this preset.
    #[must_use]
    pub const fn enforces_backward_consistency(self) -> bool {
        matches!(self, Self::Coverage | Self::Balanced)
    }

    /// Whether this preset widens radii when no temporal prediction is
    /// available (only `Adaptive` does).
    #[must_use]
    pub const fn widens_without_prediction(self) -> bool {
        matches!(self, Self::Adaptive)
    }
}

/// Interpolation quality mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityMode {
    /// Single-candidate bilinear warp.
    Standard,
    /// Three-candidate symmetry-scored selection with Catmull-Rom sampling.
    High,
}

/// Output pacing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Target is `multiplier * source_rate`, clamped for sub-30-fps sources.
    Multiplier,
    /// Target is the display refresh rate.
    MonitorSync,
}

/// Debug visualization mode for [`crate::FrameGenerator::debug`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DebugViewMode {
    #[default]
    None,
    MotionFlow,
    ConfidenceHeatmap,
    MotionNeedles,
    ResidualError,
    SplitScreen,
    Occlusion,
    GhostMask,
    StructureGradient,
}

/// Temporal-stabilization parameters, active only when
/// [`FrameGenSettings::temporal_stabilization`] is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalStabilizationSettings {
    /// Weight given to history vs. current motion, in `[0, 0.99]`.
    pub history_weight: f32,
    /// Influence of confidence on the stabilization blend, in `[0, 1]`.
    pub confidence_influence: f32,
    /// Anti-ghosting clamp neighborhood radius `k`, in `{1, 2, 3}`.
    pub neighborhood: u32,
}

impl Default for TemporalStabilizationSettings {
    fn default() -> Self {
        Self {
            history_weight: 0.8,
            confidence_influence: 0.5,
            neighborhood: 2,
        }
    }
}

/// All user-tunable configuration for the frame-generation core.
///
/// This is the single-writer snapshot described in the concurrency model:
/// the surrounding application owns one instance and mutates it through the
/// setters on [`crate::FrameGenerator`]; the render loop reads a coherent
/// copy once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGenSettings {
    /// Coarse-to-fine search-radius and backward-consistency preset.
    pub motion_model: MotionModel,
    /// Bilinear vs. Catmull-Rom / multi-candidate interpolation quality.
    pub quality_mode: QualityMode,
    /// Output multiplier, `1..=20`.
    pub multiplier: u32,
    /// Render-side delay scale, `0.25..`. Multiplies the adaptive-delay
    /// nudge applied to the intended present time.
    pub delay_scale: f32,
    /// Jitter-suppression coefficient `s`, `0..=1` (default `0.2`).
    pub jitter_suppression: f32,
    /// Exponent applied when remapping raw confidence for display/weighting,
    /// `0.25..=4`.
    pub confidence_power: f32,
    /// Scale factor for edge-related thresholds in the post-processor and
    /// interpolator, `0.5..=20`.
    pub edge_scale: f32,
    /// Text/static protection strength, `0..=1`.
    pub text_protect_strength: f32,
    /// Edge-magnitude threshold gating the text-lock mask, `0..=0.2`.
    pub edge_threshold: f32,
    /// Enables the optional temporal motion stabilizer (§4.3).
    pub temporal_stabilization: bool,
    /// Parameters for the temporal stabilizer, used only when
    /// `temporal_stabilization` is `true`.
    pub temporal: TemporalStabilizationSettings,
    /// Enables temporal motion-prediction carry-over between ticks.
    pub motion_prediction: bool,
    /// Never-drop presentation policy (see `spec.md` §9 Open Questions; this
    /// crate resolves it as back-pressure — see `DESIGN.md`).
    pub never_drop: bool,
    /// Maximum frame-queue length, `2..=12`.
    pub max_queue_size: usize,
    /// Target queue depth for the adaptive-delay controller, `2..=12`.
    pub target_queue_depth: usize,
    /// Enables the adaptive-delay controller.
    pub adaptive_delay: bool,
    /// Forces interpolation even when the scheduler would otherwise not
    /// interpolate (e.g. very low source rates already below threshold).
    pub force_interpolation: bool,
    /// Clamps output pacing to an explicit frames-per-second ceiling.
    pub limit_output_fps: Option<f32>,
    /// Enables vsync-gated presentation.
    pub vsync: bool,
    /// Multiplier-locked vs. monitor-synced target-rate selection.
    pub output_mode: OutputMode,
    /// Runs the reduced tiny-forward/backward-only estimator and skips
    /// prediction, smoothing and temporal post-processing (§4.2 "Minimal
    /// pipeline mode").
    pub minimal_pipeline: bool,
}

impl Default for FrameGenSettings {
    fn default() -> Self {
        Self {
            motion_model: MotionModel::Adaptive,
            quality_mode: QualityMode::High,
            multiplier: 2,
            delay_scale: 1.0,
            jitter_suppression: 0.2,
            confidence_power: 1.0,
            edge_scale: 1.0,
            text_protect_strength: 1.0,
            edge_threshold: 0.04,
            temporal_stabilization: true,
            temporal: TemporalStabilizationSettings::default(),
            motion_prediction: true,
            never_drop: false,
            max_queue_size: 4,
            target_queue_depth: 3,
            adaptive_delay: true,
            force_interpolation: false,
            limit_output_fps: None,
            vsync: true,
            output_mode: OutputMode::MonitorSync,
            minimal_pipeline: false,
        }
    }
}

impl FrameGenSettings {
    /// Validates range-constrained fields, returning the first violation.
    pub fn validate(&self) -> crate::errors::Result<()> {
        use crate::errors::FrameGenError::InvalidConfig;

        if !(1..=20).contains(&self.multiplier) {
            return Err(InvalidConfig {
                field: "multiplier",
                detail: format!("{} is outside 1..=20", self.multiplier),
            });
        }
        if !(2..=12).contains(&self.max_queue_size) {
            return Err(InvalidConfig {
                field: "max_queue_size",
                detail: format!("{} is outside 2..=12", self.max_queue_size),
            });
        }
        if !(2..=12).contains(&self.target_queue_depth) {
            return Err(InvalidConfig {
                field: "target_queue_depth",
                detail: format!("{} is outside 2..=12", self.target_queue_depth),
            });
        }
        if !(0.0..=1.0).contains(&self.jitter_suppression) {
            return Err(InvalidConfig {
                field: "jitter_suppression",
                detail: format!("{} is outside 0..=1", self.jitter_suppression),
            });
        }
        if !(0.25..=4.0).contains(&self.confidence_power) {
            return Err(InvalidConfig {
                field: "confidence_power",
                detail: format!("{} is outside 0.25..=4", self.confidence_power),
            });
        }
        if !(0.5..=20.0).contains(&self.edge_scale) {
            return Err(InvalidConfig {
                field: "edge_scale",
                detail: format!("{} is outside 0.5..=20", self.edge_scale),
            });
        }
        if !(0.0..=1.0).contains(&self.text_protect_strength) {
            return Err(InvalidConfig {
                field: "text_protect_strength",
                detail: format!("{} is outside 0..=1", self.text_protect_strength),
            });
        }
        if !(0.0..=0.2).contains(&self.edge_threshold) {
            return Err(InvalidConfig {
                field: "edge_threshold",
                detail: format!("{} is outside 0..=0.2", self.edge_threshold),
            });
        }
        if self.delay_scale < 0.25 {
            return Err(InvalidConfig {
                field: "delay_scale",
                detail: format!("{} is below the 0.25 floor", self.delay_scale),
            });
        }
        if !(0.0..=0.99).contains(&self.temporal.history_weight) {
            return Err(InvalidConfig {
                field: "temporal.history_weight",
                detail: format!("{} is outside 0..=0.99", self.temporal.history_weight),
            });
        }
        if !(1..=3).contains(&self.temporal.neighborhood) {
            return Err(InvalidConfig {
                field: "temporal.neighborhood",
                detail: format!("{} is outside 1..=3", self.temporal.neighborhood),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(FrameGenSettings::default().validate().is_ok());
    }

    #[test]
    fn multiplier_out_of_range_is_rejected() {
        let settings = FrameGenSettings {
            multiplier: 21,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn motion_model_presets_have_monotonic_coverage_vs_stable_radii() {
        assert!(MotionModel::Coverage.tiny_radius() >= MotionModel::Stable.tiny_radius());
        assert!(MotionModel::Coverage.full_radius() >= MotionModel::Stable.full_radius());
    }
}
