//! Seeded shuffle
//!
//! Fisher–Yates driven by a 32-bit linear congruential generator
//! (Numerical Recipes constants). Reproducible for a fixed seed; not suitable
//! for anything security related.

use rand::Rng;

const MULTIPLIER: u32 = 1_664_525;
const INCREMENT: u32 = 1_013_904_223;

/// Linear congruential generator with 32-bit state
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: (seed ^ (seed >> 32)) as u32,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        self.state
    }

    /// Uniform-ish value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Seed used when the caller does not supply one.
fn fresh_seed() -> u64 {
    let millis = chrono::Utc::now().timestamp_millis() as u64;
    millis ^ rand::thread_rng().r#gen::<u64>()
}

/// Return a permutation of `items`.
///
/// The same seed and input always produce the same order.
pub fn shuffle<T>(mut items: Vec<T>, seed: Option<u64>) -> Vec<T> {
    let mut rng = Lcg::new(seed.unwrap_or_else(fresh_seed));
    for i in (1..items.len()).rev() {
        let j = (rng.next_f64() * (i + 1) as f64) as usize;
        items.swap(i, j.min(i));
    }
    items
}
