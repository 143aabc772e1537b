//! Deterministic 32-bit RNG for shuffling and weighted sampling.
//!
//! One mulberry32 state word; all arithmetic wraps at 32 bits so the same
//! seed yields the same sequence on every platform. This is the only
//! randomness source in the engine — never mix in external entropy.

/// Seeded pseudo-random generator. Identical seed ⇒ identical output
/// sequence, which is what makes daily sessions reproducible and the
/// scheduler testable.
#[derive(Debug, Clone)]
pub struct SessionRng {
    state: u32,
}

impl SessionRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut r = self.state;
        r = (r ^ (r >> 15)).wrapping_mul(r | 1);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(r | 61));
        r ^ (r >> 14)
    }

    /// Uniform draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform index in [0, upper_exclusive); 0 when the range is empty.
    pub fn range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive <= 1 {
            return 0;
        }
        (self.next_f64() * upper_exclusive as f64) as usize
    }

    /// In-place Fisher–Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64) as usize;
            items.swap(i, j);
        }
    }
}

/// Stable FNV-1a hash of a calendar-date key such as "2026-08-06". The
/// same calendar day always maps to the same base seed.
pub fn seed_from_date_key(date_key: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in date_key.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

/// Seed for the nth replay within the same session: the base order stays
/// deterministic per nonce, but restarting changes it.
pub fn replay_seed(base: u32, nonce: u32) -> u32 {
    base.wrapping_add(nonce)
}
