//! Spawn point selection for every spawn pattern.
//!
//! Patterns form a closed set dispatched by one resolver, so adding a pattern
//! is a one-place change. The first four patterns are deterministic and
//! correctness-critical; the named variants layer clustering and randomness
//! and are cosmetic.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rampart_core::SpawnPattern;

/// Consecutive queue entries sharing one point under `BurstSpawn`.
const BURST_GROUP: usize = 3;
/// Chance, in percent, that `AdaptiveSpawn` skips one extra point.
const ADAPTIVE_SKIP_PERCENT: u32 = 25;

/// Mutable selection state threaded through one queue materialization.
///
/// The round-robin cursor and the random stream live on the scheduler and
/// persist across waves; the burst anchor resets per wave.
pub(crate) struct PatternState<'a> {
    pub(crate) round_robin_cursor: &'a mut usize,
    pub(crate) rng: &'a mut ChaCha8Rng,
    pub(crate) burst_point: Option<usize>,
}

/// Resolves the spawn point index for one queue entry.
///
/// `queue_position` is the entry's index in the time-ordered queue and
/// `point_count` is always at least one.
pub(crate) fn resolve_spawn_point(
    pattern: SpawnPattern,
    queue_position: usize,
    point_count: usize,
    state: &mut PatternState<'_>,
) -> usize {
    debug_assert!(point_count > 0, "resolver requires spawn points");
    let last = point_count - 1;

    match pattern {
        SpawnPattern::SinglePoint => 0,
        SpawnPattern::Random | SpawnPattern::ChaosMode => state.rng.gen_range(0..point_count),
        SpawnPattern::RoundRobin => advance_round_robin(state, point_count),
        SpawnPattern::Distributed => queue_position % point_count,
        SpawnPattern::EdgeFocused => {
            let offset = clustered_offset(state.rng, point_count).min(last);
            if state.rng.gen_bool(0.5) {
                offset
            } else {
                last - offset
            }
        }
        SpawnPattern::CornerFocused => {
            if state.rng.gen_bool(0.5) {
                0
            } else {
                last
            }
        }
        SpawnPattern::BurstSpawn => {
            if queue_position % BURST_GROUP == 0 || state.burst_point.is_none() {
                state.burst_point = Some(state.rng.gen_range(0..point_count));
            }
            state.burst_point.unwrap_or(0)
        }
        SpawnPattern::PincerMovement => {
            let half = (point_count / 2).max(1);
            if queue_position % 2 == 0 {
                state.rng.gen_range(0..half)
            } else {
                let upper_start = (point_count / 2).min(last);
                upper_start + state.rng.gen_range(0..(point_count - upper_start))
            }
        }
        SpawnPattern::AdaptiveSpawn => {
            if state.rng.gen_range(0..100) < ADAPTIVE_SKIP_PERCENT {
                let _ = advance_round_robin(state, point_count);
            }
            advance_round_robin(state, point_count)
        }
    }
}

fn advance_round_robin(state: &mut PatternState<'_>, point_count: usize) -> usize {
    let point = *state.round_robin_cursor % point_count;
    *state.round_robin_cursor = (point + 1) % point_count;
    point
}

fn clustered_offset(rng: &mut ChaCha8Rng, point_count: usize) -> usize {
    let spread = (point_count as f64 / 4.0).max(0.5);
    let normal = Normal::new(0.0, spread).expect("positive standard deviation");
    normal.sample(rng).abs() as usize
}
