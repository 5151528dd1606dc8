//! Cost & Confidence Kernels (Reference Implementation)
//!
//! Plain-Rust restatement of the scalar formulas the WGSL coarse/refine
//! passes implement (`spec.md` §4.2), kept separate from pipeline plumbing so
//! they are unit- and bench-testable without a GPU context — the same
//! separation of pure math from dispatch code the teacher keeps between
//! `scene::camera` and `renderer::graph`.

use glam::Vec2;

/// Multiplicative cost bias favoring the zero vector on ties (coarse search).
pub const ZERO_VECTOR_BIAS: f32 = 0.95;

/// The fixed 6-point hexagon search pattern used at the coarse level.
pub const HEXAGON_PATTERN: [(i32, i32); 6] = [(-2, 0), (2, 0), (0, -2), (0, 2), (-1, -2), (1, 2)];

/// Per-sample SAD weight from a Sobel-style gradient magnitude:
/// `1 + 4 * gradient_magnitude`.
#[must_use]
pub fn sample_weight(gradient_magnitude: f32) -> f32 {
    1.0 + 4.0 * gradient_magnitude
}

/// Coarse-level confidence: `clamp(exp(-4 * best_cost), 0.1, 0.98)`.
#[must_use]
pub fn coarse_confidence(best_cost: f32) -> f32 {
    (-4.0 * best_cost).exp().clamp(0.1, 0.98)
}

/// Regularization weight for the medium refine stage,
/// `lerp(0.10, 0.03, coarse_conf)`.
#[must_use]
pub fn medium_reg_weight(coarse_conf: f32) -> f32 {
    lerp(0.10, 0.03, coarse_conf)
}

/// Backward-consistency penalty weight, `lerp(0.06, 0.20, back_conf)`.
#[must_use]
pub fn backward_penalty_weight(back_conf: f32) -> f32 {
    lerp(0.06, 0.20, back_conf)
}

/// Whether the fast path fires at a refine stage: high coarse confidence and
/// a near-zero coarse vector.
#[must_use]
pub fn fast_path_applies(coarse_conf: f32, coarse_mv_sq: f32) -> bool {
    coarse_conf > 0.94 && coarse_mv_sq < 0.04
}

/// Confidence assigned when the fast path fires: `max(conf, 0.95)`.
#[must_use]
pub fn fast_path_confidence(conf: f32) -> f32 {
    conf.max(0.95)
}

/// Whether the fine refine stage's quarter-pixel pass is skipped:
/// sub-0.3% relative cost improvement from the half pass, high coarse
/// confidence, and a small delta from the coarse prediction.
#[must_use]
pub fn quarter_pass_skipped(
    half_pass_relative_improvement: f32,
    coarse_conf: f32,
    delta_from_coarse_sq: f32,
) -> bool {
    half_pass_relative_improvement < 0.003 && coarse_conf >= 0.7 && delta_from_coarse_sq <= 0.04
}

/// Ambiguity `uniqueness = clamp((second_best - best) / second_best, 0, 1)`.
#[must_use]
pub fn uniqueness(best: f32, second_best: f32) -> f32 {
    if second_best <= 0.0 {
        return 0.0;
    }
    ((second_best - best) / second_best).clamp(0.0, 1.0)
}

/// Blend factor snapping an ambiguous match toward the coarse prediction:
/// `(1 - uniqueness) * (1 - coarse_conf) * 0.6`.
#[must_use]
pub fn snap_back_blend(uniqueness: f32, coarse_conf: f32) -> f32 {
    (1.0 - uniqueness) * (1.0 - coarse_conf) * 0.6
}

/// Final per-pixel confidence: `match_term = exp(-8 * avg_diff)`, then
/// `lerp(match_term * (0.4 + 0.6 * uniqueness), coarse_conf, 0.35)`, clamped
/// to `[0.05, 0.98]`.
#[must_use]
pub fn final_confidence(avg_diff: f32, uniqueness: f32, coarse_conf: f32) -> f32 {
    let match_term = (-8.0 * avg_diff).exp();
    let blended = match_term * (0.4 + 0.6 * uniqueness);
    lerp(blended, coarse_conf, 0.35).clamp(0.05, 0.98)
}

/// Snaps an ambiguous winning offset toward the reference prediction by
/// `blend` (as produced by [`snap_back_blend`]).
#[must_use]
pub fn snap_back_vector(best: Vec2, predicted: Vec2, blend: f32) -> Vec2 {
    best.lerp(predicted, blend.clamp(0.0, 1.0))
}

/// Search radius for a motion-model preset's level radius function, clamped
/// to the frame-dependent bound `min(w, h) / 4`.
#[must_use]
pub fn clamp_search_radius(radius: u32, width: u32, height: u32) -> u32 {
    let bound = (width.min(height) / 4).max(1);
    radius.clamp(1, bound)
}

#[must_use]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_confidence_is_clamped() {
        assert!((coarse_confidence(0.0) - 0.98).abs() < 1e-6 || coarse_confidence(0.0) <= 0.98);
        assert!(coarse_confidence(10.0) >= 0.1);
    }

    #[test]
    fn uniqueness_is_bounded_and_zero_when_no_second_best() {
        assert_eq!(uniqueness(1.0, 0.0), 0.0);
        let u = uniqueness(0.1, 1.0);
        assert!((0.0..=1.0).contains(&u));
    }

    #[test]
    fn fast_path_requires_both_conditions() {
        assert!(fast_path_applies(0.95, 0.01));
        assert!(!fast_path_applies(0.90, 0.01));
        assert!(!fast_path_applies(0.95, 0.1));
    }

    #[test]
    fn final_confidence_stays_in_bounds() {
        for avg_diff in [0.0_f32, 0.1, 1.0, 10.0] {
            for u in [0.0_f32, 0.5, 1.0] {
                for cc in [0.1_f32, 0.5, 0.98] {
                    let c = final_confidence(avg_diff, u, cc);
                    assert!((0.05..=0.98).contains(&c), "{c} out of bounds");
                }
            }
        }
    }

    #[test]
    fn search_radius_respects_frame_bound() {
        assert_eq!(clamp_search_radius(4, 16, 16), 4);
        assert_eq!(clamp_search_radius(4, 4, 4), 1);
    }

    #[test]
    fn snap_back_vector_is_identity_at_zero_blend() {
        let best = Vec2::new(3.0, -2.0);
        let predicted = Vec2::new(0.0, 0.0);
        let snapped = snap_back_vector(best, predicted, 0.0);
        assert!((snapped - best).length() < 1e-6);
    }

    #[test]
    fn snap_back_vector_reaches_prediction_at_full_blend() {
        let best = Vec2::new(3.0, -2.0);
        let predicted = Vec2::new(1.0, 1.0);
        let snapped = snap_back_vector(best, predicted, 1.0);
        assert!((snapped - predicted).length() < 1e-6);
    }
}
