//! Benchmark and test input generation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// The process-wide RNG for input generation, created once by the caller.
/// `Some(seed)` gives reproducible vectors.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Past this index f32 no longer represents every integer, so `[i, i + 1)`
/// may contain no f32 at all.
pub const EXACT_INTERVAL_LIMIT: usize = 1 << 24;

/// Fills `vector` so that exactly one value lies in each interval `[i, i + 1)`,
/// then shuffles the values.
///
/// The one-per-interval property holds for lengths up to
/// `EXACT_INTERVAL_LIMIT`. Beyond it, element `i` is the f32 nearest to a
/// uniform point in `[i, i + 1)`.
pub fn fill_random<R: Rng + ?Sized>(vector: &mut [f32], rng: &mut R) {
    for (i, x) in vector.iter_mut().enumerate() {
        *x = value_in_interval(i, rng.gen::<f64>());
    }
    vector.shuffle(rng);
}

fn value_in_interval(i: usize, unit: f64) -> f32 {
    let value = (i as f64 + unit) as f32;
    // Round-to-nearest can land on i + 1 where the f32 spacing is coarse.
    if i < EXACT_INTERVAL_LIMIT && value as f64 >= (i + 1) as f64 {
        i as f32
    } else {
        value
    }
}

pub fn generate_random_vector<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    let mut vector = vec![0.0f32; len];
    fill_random(&mut vector, rng);
    vector
}
