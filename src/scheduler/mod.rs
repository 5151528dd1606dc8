//! Presentation Scheduler
//!
//! Drives the whole core once per output tick (`spec.md` §4.5): target-rate
//! selection, pacing, phase/alpha computation with jitter suppression and
//! quantization, adaptive delay, and pair advancement. [`SchedulerState`] is
//! the plain-data aggregate threaded explicitly through [`SchedulerState::tick`]
//! — no process-global singleton, per REDESIGN FLAGS §9. The scalar formulas
//! are free functions in this module so they stay unit-testable; [`wait`]
//! holds the substitutable pacing wait strategy.

pub mod wait;

use crate::config::OutputMode;

const SUB_30FPS_THRESHOLD_HZ: f64 = 30.0;

/// Selects the output target rate (`spec.md` §4.5 "Target-rate selection").
/// Sub-30-fps sources are clamped down to the display refresh to avoid
/// extreme multiplications that produce step artifacts.
#[must_use]
pub fn select_target_rate(mode: OutputMode, multiplier: u32, source_rate_hz: f64, monitor_refresh_hz: f64) -> f64 {
    match mode {
        OutputMode::MonitorSync => monitor_refresh_hz,
        OutputMode::Multiplier => {
            let target = source_rate_hz * f64::from(multiplier);
            if source_rate_hz < SUB_30FPS_THRESHOLD_HZ {
                target.min(monitor_refresh_hz)
            } else {
                target
            }
        }
    }
}

/// Whether a source rate counts as "sub-30-fps" for the phase-computation
/// and alpha-quantization special cases.
#[must_use]
pub fn is_sub_30fps(source_rate_hz: f64) -> bool {
    source_rate_hz < SUB_30FPS_THRESHOLD_HZ
}

/// The interval (in the same units as `average_interval`/`actual_interval`)
/// to divide the display time into when computing alpha (`spec.md` §4.5
/// "Phase computation").
#[must_use]
pub fn select_use_interval(
    average_interval: f64,
    actual_interval: f64,
    jitter_suppression: f32,
    sub_30fps: bool,
    force_interpolation: bool,
) -> f64 {
    if sub_30fps || force_interpolation {
        return average_interval;
    }
    let js = f64::from(jitter_suppression).max(1e-9);
    let error_ratio = (actual_interval - average_interval).abs() / average_interval.max(1e-9);
    if error_ratio <= js {
        average_interval
    } else if error_ratio < 2.0 * js {
        let t = (error_ratio - js) / js;
        average_interval + (actual_interval - average_interval) * t
    } else {
        actual_interval
    }
}

/// `alpha = clamp((display_time - prev_ts) / use_interval, 0, 1)`.
#[must_use]
pub fn compute_alpha(display_time: f64, prev_ts: f64, use_interval: f64) -> f32 {
    if use_interval <= 0.0 {
        return 0.0;
    }
    (((display_time - prev_ts) / use_interval) as f32).clamp(0.0, 1.0)
}

/// Quantizes alpha to `floor(alpha*M)/M` for fixed-multiplier, non-sync,
/// >=30fps sources (`spec.md` §4.5 "Alpha quantization"); a no-op otherwise.
#[must_use]
pub fn quantize_alpha(alpha: f32, multiplier: u32, mode: OutputMode, sub_30fps: bool) -> f32 {
    if mode != OutputMode::Multiplier || sub_30fps || multiplier <= 1 {
        return alpha;
    }
    let m = multiplier as f32;
    (alpha * m).floor() / m
}

/// Adaptive-delay nudge to the intended present time:
/// `(setpoint - |queue|) * 0.35 * avg_interval`, clamped to `+/- 3*avg_interval`,
/// scaled by the user's `delay_scale`.
#[must_use]
pub fn adaptive_delay_nudge(queue_len: usize, target_queue_depth: usize, average_interval: f64, delay_scale: f32) -> f64 {
    let raw = (target_queue_depth as f64 - queue_len as f64) * 0.35 * average_interval;
    let bound = 3.0 * average_interval;
    raw.clamp(-bound, bound) * f64::from(delay_scale)
}

/// Identity of a (prev, curr) pair, used to detect when the scheduler must
/// reset its sub-step cursor and signal the post-processor's temporal reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIdentity {
    pub prev_slot: usize,
    pub curr_slot: usize,
    pub prev_ts: i64,
    pub curr_ts: i64,
}

/// Outcome of one [`SchedulerState::tick`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    pub alpha: f32,
    pub interpolated: bool,
    pub should_pop_front: bool,
    pub reset_temporal: bool,
}

/// The Scheduler Clock State aggregate (`spec.md` §3): running averages,
/// present timestamps, and the pair-identity/sub-step cursor. Passed
/// explicitly from the render loop each tick — no global mutable state.
#[derive(Debug, Default)]
pub struct SchedulerState {
    pub last_present_ts: Option<f64>,
    pub next_present_qpc: Option<f64>,
    current_pair: Option<PairIdentity>,
    sub_step: u32,
    pub last_alpha: f32,
    pub interpolated_this_tick: bool,
    pub present_count: u64,
    pub unstable: bool,
}

impl SchedulerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances `next_present_qpc` by `interval` ticks, matching §4.5
    /// "Pacing": `next_present_qpc += interval`.
    pub fn advance_present_qpc(&mut self, interval: f64) -> f64 {
        let next = self.next_present_qpc.unwrap_or(0.0) + interval;
        self.next_present_qpc = Some(next);
        next
    }

    /// Runs one output tick: detects pair-identity changes, computes alpha,
    /// and decides pair advancement, per `spec.md` §4.5.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        pair: PairIdentity,
        display_time: f64,
        average_interval: f64,
        actual_interval: f64,
        jitter_suppression: f32,
        source_rate_hz: f64,
        output_mode: OutputMode,
        multiplier: u32,
        force_interpolation: bool,
        never_drop: bool,
    ) -> TickOutput {
        let reset = self.current_pair != Some(pair);
        if reset {
            self.current_pair = Some(pair);
            self.sub_step = 0;
        }

        let sub_30fps = is_sub_30fps(source_rate_hz);
        let use_interval = select_use_interval(average_interval, actual_interval, jitter_suppression, sub_30fps, force_interpolation);
        let mut alpha = compute_alpha(display_time, pair.prev_ts as f64, use_interval);
        alpha = quantize_alpha(alpha, multiplier, output_mode, sub_30fps);

        let interpolated = multiplier > 1 || force_interpolation;

        let should_pop_front = if interpolated && multiplier > 1 {
            self.sub_step += 1;
            let pop = self.sub_step >= multiplier;
            if pop {
                self.sub_step = 0;
            }
            pop
        } else if never_drop {
            false
        } else {
            display_time >= pair.curr_ts as f64
        };

        self.last_alpha = alpha;
        self.interpolated_this_tick = interpolated;
        self.present_count += 1;
        self.last_present_ts = Some(display_time);

        TickOutput {
            alpha,
            interpolated,
            should_pop_front,
            reset_temporal: reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_sync_ignores_multiplier() {
        assert!((select_target_rate(OutputMode::MonitorSync, 4, 30.0, 60.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn multiplier_mode_scales_source_rate() {
        assert!((select_target_rate(OutputMode::Multiplier, 2, 60.0, 144.0) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn sub_30fps_source_is_clamped_to_refresh() {
        let target = select_target_rate(OutputMode::Multiplier, 10, 10.0, 60.0);
        assert!(target <= 60.0);
    }

    #[test]
    fn jitter_within_suppression_band_locks_to_average() {
        let use_interval = select_use_interval(16.667, 16.7, 0.2, false, false);
        assert!((use_interval - 16.667).abs() < 1e-6);
    }

    #[test]
    fn jitter_far_outside_band_trusts_actual() {
        let use_interval = select_use_interval(16.667, 40.0, 0.2, false, false);
        assert!((use_interval - 40.0).abs() < 1e-6);
    }

    #[test]
    fn alpha_quantization_produces_discrete_steps_at_m2() {
        for raw in [0.0_f32, 0.2, 0.49, 0.5, 0.9, 0.99] {
            let q = quantize_alpha(raw, 2, OutputMode::Multiplier, false);
            assert!(q == 0.0 || q == 0.5, "unexpected quantized alpha {q} from {raw}");
        }
    }

    #[test]
    fn adaptive_delay_nudge_is_bounded() {
        let nudge = adaptive_delay_nudge(0, 3, 16.667, 1.0);
        let bound = 3.0 * 16.667;
        assert!(nudge.abs() <= bound + 1e-6);
    }

    #[test]
    fn tick_resets_substep_on_pair_change() {
        let mut state = SchedulerState::new();
        let pair_a = PairIdentity { prev_slot: 0, curr_slot: 1, prev_ts: 0, curr_ts: 1000 };
        let out1 = state.tick(pair_a, 500.0, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 2, false, false);
        assert!(out1.reset_temporal);
        let out2 = state.tick(pair_a, 900.0, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 2, false, false);
        assert!(!out2.reset_temporal);

        let pair_b = PairIdentity { prev_slot: 1, curr_slot: 2, prev_ts: 1000, curr_ts: 2000 };
        let out3 = state.tick(pair_b, 1500.0, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 2, false, false);
        assert!(out3.reset_temporal);
    }

    #[test]
    fn pair_advancement_pops_after_m_substeps() {
        let mut state = SchedulerState::new();
        let pair = PairIdentity { prev_slot: 0, curr_slot: 1, prev_ts: 0, curr_ts: 1000 };
        let out1 = state.tick(pair, 100.0, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 2, false, false);
        assert!(!out1.should_pop_front);
        let out2 = state.tick(pair, 900.0, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 2, false, false);
        assert!(out2.should_pop_front);
    }

    #[test]
    fn alpha_is_monotonic_within_a_pair() {
        let mut state = SchedulerState::new();
        let pair = PairIdentity { prev_slot: 0, curr_slot: 1, prev_ts: 0, curr_ts: 1000 };
        let mut last = -1.0;
        for t in [0.0, 100.0, 300.0, 600.0, 999.0] {
            let out = state.tick(pair, t, 1000.0, 1000.0, 0.2, 60.0, OutputMode::Multiplier, 1, false, false);
            assert!(out.alpha as f64 >= last);
            last = out.alpha as f64;
        }
    }
}
