//! Bounded 1-D Latin-Hypercube sampling.
//!
//! Model
//! - Split a range into `count` equal intervals, draw one uniform value inside each,
//!   then Fisher–Yates shuffle so positions carry no information about the interval.
//! - Used for angular tolerance (`[-tol, +tol]`), drop heights (`[min, max]`) and,
//!   through two independent draws, random impact locations in `[0, 100]²`.
//!
//! Determinism
//! - Every sampler takes the RNG explicitly. `SeedToken { seed, index }` mixes a campaign
//!   seed with a record index so each record gets its own reproducible stream.

use crate::layout::Location;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed plus stream index; expands to an independent `StdRng`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedToken {
    pub seed: u64,
    pub index: u64,
}

impl SeedToken {
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    pub fn to_std_rng(self) -> StdRng {
        // SplitMix64 finalizer.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// One stratified draw per interval of `[lo, hi)`, shuffled. Empty for `count == 0`.
///
/// A degenerate range (`hi <= lo`) yields `count` copies of `lo`.
pub fn lhs_in_range<R: Rng + ?Sized>(rng: &mut R, count: usize, lo: f64, hi: f64) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if !(hi > lo) {
        return vec![lo; count];
    }
    let width = (hi - lo) / count as f64;
    let mut out: Vec<f64> = (0..count)
        .map(|i| {
            let base = lo + i as f64 * width;
            // Rounding can push base + width·u onto the next interval; clamp to range.
            (base + rng.gen::<f64>() * width).min(hi)
        })
        .collect();
    out.shuffle(rng);
    out
}

/// `count` offsets in `[-max_tolerance, +max_tolerance]`; all zeros if the tolerance
/// is not positive.
pub fn generate_lhs_variations<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    max_tolerance: f64,
) -> Vec<f64> {
    if !(max_tolerance > 0.0) {
        return vec![0.0; count];
    }
    lhs_in_range(rng, count, -max_tolerance, max_tolerance)
}

/// `count` random impact points in `[0, 100]²` from independent X and Y draws.
pub fn random_impact_locations<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Location> {
    let xs = generate_lhs_variations(rng, count, 50.0);
    let ys = generate_lhs_variations(rng, count, 50.0);
    xs.into_iter()
        .zip(ys)
        .map(|(x, y)| Location::new(x + 50.0, y + 50.0))
        .collect()
}
