//! Roulette-wheel selection.

use rand::Rng;

/// Pick an index with probability proportional to its weight.
///
/// Draws `r` uniformly in `[0, total)` and returns the first index whose
/// cumulative weight exceeds `r`, so zero-weight entries are never chosen
/// while a positive one exists. Infinite weights dominate: when some are
/// `+inf` the draw is uniform among those entries only. When the total
/// weight is zero, NaN or overflows without an infinite entry, the choice
/// falls back to a uniform draw over all indices.
///
/// Returns `None` only for an empty slice.
pub fn sample<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().sum();
    if total == f64::INFINITY {
        let infinite: Vec<usize> = (0..weights.len())
            .filter(|&i| weights[i] == f64::INFINITY)
            .collect();
        if !infinite.is_empty() {
            return Some(infinite[rng.gen_range(0..infinite.len())]);
        }
    }
    if !total.is_finite() || total <= 0.0 {
        return Some(rng.gen_range(0..weights.len()));
    }

    let r = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative > r {
            return Some(i);
        }
    }

    // rounding can leave r at or past the final cumulative sum
    weights.iter().rposition(|&w| w > 0.0)
}
