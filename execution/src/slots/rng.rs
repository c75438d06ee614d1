//! Sampling primitives shared by both engines.
//!
//! Everything is generic over [`rand::Rng`] so production code can run on an
//! entropy-seeded generator while tests and the simulator inject a seeded
//! `ChaCha` generator and replay exact outcomes. Weighted picks walk their
//! entry slice in order, so a given seed always resolves ties the same way.

use rand::Rng;

/// Uniform integer in `[0, n)`.
pub fn uniform_int<R: Rng>(rng: &mut R, n: usize) -> usize {
    rng.gen_range(0..n)
}

/// Uniform float in `[0.0, 1.0)`.
pub fn uniform_float<R: Rng>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Bernoulli trial with probability `p`.
pub fn chance<R: Rng>(rng: &mut R, p: f64) -> bool {
    uniform_float(rng) < p
}

/// Weighted pick over `(item, weight)` entries. Entries with zero weight are
/// never chosen. Returns `None` for an empty table or an all-zero one.
pub fn weighted_pick<T: Copy, R: Rng>(rng: &mut R, entries: &[(T, u32)]) -> Option<T> {
    let total: u64 = entries.iter().map(|(_, w)| *w as u64).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for (item, weight) in entries {
        if roll < *weight as u64 {
            return Some(*item);
        }
        roll -= *weight as u64;
    }
    // Unreachable: roll < total and the weights sum to total.
    None
}

/// Weighted pick restricted to entries accepted by `keep`.
pub fn weighted_pick_where<T: Copy, R: Rng, F: Fn(&T) -> bool>(
    rng: &mut R,
    entries: &[(T, u32)],
    keep: F,
) -> Option<T> {
    let total: u64 = entries
        .iter()
        .filter(|(item, _)| keep(item))
        .map(|(_, w)| *w as u64)
        .sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total);
    for (item, weight) in entries {
        if !keep(item) {
            continue;
        }
        if roll < *weight as u64 {
            return Some(*item);
        }
        roll -= *weight as u64;
    }
    None
}
