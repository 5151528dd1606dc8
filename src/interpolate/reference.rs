//! Interpolator Reference Math
//!
//! Plain-Rust restatement of the masking, candidate-selection, and
//! halo-clamp formulas from `spec.md` §4.4, kept separate from the WGSL
//! dispatch for unit testing.

use glam::Vec2;

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Motion mask: `smoothstep(0.6*T, T, |mv|)`, `T = max(0.35, 0.55*scale)`.
#[must_use]
pub fn motion_mask(mv_magnitude: f32, motion_sample_scale: f32) -> f32 {
    let t = (0.55 * motion_sample_scale).max(0.35);
    smoothstep(0.6 * t, t, mv_magnitude)
}

/// Color-difference mask between unwarped prev/curr.
#[must_use]
pub fn color_diff_mask(max_channel_diff: f32, diff_scale: f32) -> f32 {
    smoothstep(0.008, 0.030 * diff_scale.max(0.5), max_channel_diff)
}

/// Confidence mask.
#[must_use]
pub fn confidence_mask(confidence: f32) -> f32 {
    smoothstep(0.15, 0.55, confidence)
}

/// Text-lock subtraction mask: `(0.3 + 0.7*strength) * edge_mask * static_mask`.
#[must_use]
pub fn text_lock_mask(strength: f32, edge_mask: f32, static_mask: f32) -> f32 {
    (0.3 + 0.7 * strength) * edge_mask * static_mask
}

/// Final per-pixel interpolation gate: the three masks multiplied, minus
/// the text lock, clamped to `[0, 1]`.
#[must_use]
pub fn interp_weight(motion: f32, color_diff: f32, confidence: f32, text_lock: f32) -> f32 {
    (motion * color_diff * confidence - text_lock).max(0.0)
}

/// Whether the mandatory static fast path fires.
#[must_use]
pub fn takes_static_fast_path(weight: f32, alpha: f32) -> bool {
    weight < 0.006 || alpha < 0.001 || alpha > 0.999
}

/// Symmetry error used to score a candidate motion vector (High quality):
/// `|luma(warpPrev)-luma(curr)| + |luma(warpCurr)-luma(prev)| +
/// 0.35*|luma(warpPrev)-luma(warpCurr)|`, plus an `alpha * ||cand - m||`
/// tie-breaker term, which the caller adds after calling this.
#[must_use]
pub fn symmetry_error(warp_prev_luma: f32, warp_curr_luma: f32, prev_luma: f32, curr_luma: f32) -> f32 {
    (warp_prev_luma - curr_luma).abs() + (warp_curr_luma - prev_luma).abs() + 0.35 * (warp_prev_luma - warp_curr_luma).abs()
}

/// Picks the index of the minimum-scored candidate among `m`, `m_c`
/// (consensus), and their midpoint, given precomputed symmetry errors and
/// the tie-breaker distance from `m` for each.
#[must_use]
pub fn select_candidate(scores: [f32; 3], tie_break_alpha: f32, distances_from_m: [f32; 3]) -> usize {
    let mut best = 0;
    let mut best_score = scores[0] + tie_break_alpha * distances_from_m[0];
    for i in 1..3 {
        let score = scores[i] + tie_break_alpha * distances_from_m[i];
        if score < best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

/// Consensus candidate `m_c`: confidence-weighted average of `m` and its
/// four cardinal neighbors, clamped component-wise to `m +/- bound`.
#[must_use]
pub fn consensus_candidate(m: Vec2, neighbors: [(Vec2, f32); 4], center_weight: f32, scale: f32) -> Vec2 {
    let bound = 1.6f32.mul_add(scale, 0.0).max(0.75);
    let mut sum = m * center_weight;
    let mut weight_total = center_weight;
    for (mv, w) in neighbors {
        sum += mv * w;
        weight_total += w;
    }
    let avg = if weight_total > 0.0 { sum / weight_total } else { m };
    avg.clamp(m - Vec2::splat(bound), m + Vec2::splat(bound))
}

/// Warp-trust gain: `smoothstep(0.01, 0.16, (zero_err - warp_err) / max(zero_err, 0.01))`.
#[must_use]
pub fn warp_trust(zero_err: f32, warp_err: f32) -> f32 {
    smoothstep(0.01, 0.16, (zero_err - warp_err) / zero_err.max(0.01))
}

/// Halo bound envelope for a channel: `[min(prev,curr) - 0.5*range, max(prev,curr) + 0.5*range]`.
#[must_use]
pub fn halo_bounds(prev: f32, curr: f32) -> (f32, f32) {
    let range = (curr - prev).abs();
    (prev.min(curr) - 0.5 * range, prev.max(curr) + 0.5 * range)
}

/// Catmull-Rom four-tap weights for fractional offset `f` in `[0,1)`.
#[must_use]
pub fn catmull_rom_weights(f: f32) -> [f32; 4] {
    let w0 = f * (-0.5 + f * (1.0 - 0.5 * f));
    let w1 = 1.0 + f * f * (-2.5 + 1.5 * f);
    let w2 = f * (0.5 + f * (2.0 - 1.5 * f));
    let w3 = f * f * (-0.5 + 0.5 * f);
    [w0, w1, w2, w3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_fast_path_triggers_on_alpha_boundaries() {
        assert!(takes_static_fast_path(0.5, 0.0));
        assert!(takes_static_fast_path(0.5, 1.0));
        assert!(!takes_static_fast_path(0.5, 0.5));
    }

    #[test]
    fn interp_weight_never_negative() {
        assert_eq!(interp_weight(0.1, 0.1, 0.1, 1.0), 0.0);
    }

    #[test]
    fn halo_bounds_contain_both_endpoints() {
        let (lo, hi) = halo_bounds(0.2, 0.8);
        assert!(lo <= 0.2 && hi >= 0.8);
    }

    #[test]
    fn catmull_rom_weights_sum_to_one() {
        for f in [0.0_f32, 0.25, 0.5, 0.75, 0.999] {
            let w = catmull_rom_weights(f);
            let sum: f32 = w.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "weights {w:?} sum to {sum} at f={f}");
        }
    }

    #[test]
    fn select_candidate_picks_lowest_score() {
        let idx = select_candidate([0.5, 0.1, 0.3], 0.0, [0.0, 0.0, 0.0]);
        assert_eq!(idx, 1);
    }

    #[test]
    fn warp_trust_is_zero_when_warp_does_not_help() {
        assert_eq!(warp_trust(0.1, 0.1), 0.0);
    }

    #[test]
    fn consensus_candidate_matches_m_when_neighbors_agree() {
        let m = Vec2::new(2.0, -1.0);
        let neighbors = [(m, 1.0), (m, 1.0), (m, 1.0), (m, 1.0)];
        let m_c = consensus_candidate(m, neighbors, 1.0, 1.0);
        assert!((m_c - m).length() < 1e-5);
    }

    #[test]
    fn consensus_candidate_is_clamped_to_bound() {
        let m = Vec2::new(0.0, 0.0);
        let outlier = Vec2::new(50.0, 0.0);
        let neighbors = [(outlier, 1.0), (outlier, 1.0), (outlier, 1.0), (outlier, 1.0)];
        let m_c = consensus_candidate(m, neighbors, 0.0, 1.0);
        let bound = 1.6f32.max(0.75);
        assert!((m_c.x - bound).abs() < 1e-4);
    }
}
