//! Scheduler-level end-to-end coverage for the scenarios from `spec.md` §8
//! that need only the Frame Queue and the Scheduler — no GPU device.

use framepace::scheduler::{PairIdentity, SchedulerState};

const STEP_100NS: i64 = 166_667; // 60 fps in 100-ns ticks.
const LATE_JITTER_100NS: i64 = 30_000; // 3 ms.

/// Scenario 5: a steady 60 fps stream with every 10th frame arriving 3 ms
/// late. With `jitter_suppression = 0.2`, emitted alpha at M=2 should only
/// ever take the values {0, 0.5}.
#[test]
fn jitter_absorption_keeps_alpha_quantized_at_expected_steps() {
    use framepace::queue::{FrameQueue, OverflowPolicy};

    let queue = FrameQueue::new(8, OverflowPolicy::DropOldest, 0.2);
    queue.set_dimensions_ready();

    let mut capture_ts = 0i64;
    for i in 0..120u64 {
        let jittered = if i % 10 == 9 { capture_ts + LATE_JITTER_100NS } else { capture_ts };
        queue.push(i as usize % 12, jittered, jittered as f64);
        capture_ts += STEP_100NS;
    }

    // The running average should settle close to the nominal 60 fps interval
    // despite one in ten frames arriving late.
    let average = queue.average_interval() as f64;
    let deviation_100ns = (average - STEP_100NS as f64).abs();
    assert!(deviation_100ns < 500.0, "average interval drifted by {deviation_100ns} ticks");

    let mut scheduler = SchedulerState::new();
    let mut seen_alphas = Vec::new();
    let mut prev = queue.pop_front().unwrap();
    while let Some(curr) = queue.pop_front() {
        let pair = PairIdentity {
            prev_slot: prev.slot_index,
            curr_slot: curr.slot_index,
            prev_ts: prev.capture_ts,
            curr_ts: curr.capture_ts,
        };
        // Sample the midpoint display time, the only phase a 2x multiplier
        // without adaptive delay ever targets between a pair's endpoints.
        let display_time = (prev.capture_ts + curr.capture_ts) as f64 / 2.0;
        let tick = scheduler.tick(
            pair,
            display_time,
            average,
            (curr.capture_ts - prev.capture_ts) as f64,
            0.2,
            60.0,
            framepace::OutputMode::Multiplier,
            2,
            false,
            false,
        );
        seen_alphas.push(tick.alpha);
        prev = curr;
    }

    for alpha in seen_alphas {
        let nearest_step = (alpha * 2.0).round() / 2.0;
        assert!((alpha - nearest_step).abs() < 1e-3, "alpha {alpha} is not within 1e-3 of a {{0, 0.5}} step");
    }
}

/// Temporal monotonicity: within one (prev, curr) pair, alpha must not
/// decrease across successive display-time samples.
#[test]
fn alpha_is_non_decreasing_within_a_fixed_pair() {
    let mut scheduler = SchedulerState::new();
    let pair = PairIdentity {
        prev_slot: 0,
        curr_slot: 1,
        prev_ts: 0,
        curr_ts: STEP_100NS,
    };

    let mut last_alpha = -1.0f32;
    for step in 0..10 {
        let display_time = step as f64 * (STEP_100NS as f64 / 10.0);
        let tick = scheduler.tick(
            pair,
            display_time,
            STEP_100NS as f64,
            STEP_100NS as f64,
            0.2,
            60.0,
            framepace::OutputMode::Multiplier,
            1,
            false,
            false,
        );
        assert!(tick.alpha >= last_alpha - 1e-6, "alpha regressed from {last_alpha} to {} at step {step}", tick.alpha);
        last_alpha = tick.alpha;
    }
}
