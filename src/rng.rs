//! A tiny, dependency-free PRNG for the disjunct builder's optional down-sampling.
//!
//! A caller-supplied, non-zero seed makes down-sampling reproducible, with a
//! non-reproducible fallback when the seed is zero. Neither requirement calls for a
//! general-purpose random number generator or any particular distribution quality beyond "looks
//! uniform enough for approximate down-sampling", so this crate rolls its own xorshift64* rather
//! than taking on the `rand` crate, which this crate otherwise has
//! no use for.

use std::time::{SystemTime, UNIX_EPOCH};

pub struct Rng {
    state: u64,
}

impl Rng {
    /// `seed == 0` selects a non-deterministic, process-local seed (the "system generator");
    /// any other value is used directly, and is guaranteed to reproduce the same output
    /// sequence every time.
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { Self::system_seed() } else { seed };
        Rng { state }
    }

    fn system_seed() -> u64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E3779B97F4A7C15);
        // Mix in the address of a stack local for a little extra process-local entropy; this is
        // explicitly non-cryptographic and only needs to avoid handing out the same seed twice in
        // a row within one process.
        let marker = 0u8;
        let addr = &marker as *const u8 as u64;
        nanos ^ addr.rotate_left(17)
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Returns a value uniformly distributed in `[0, bound)`. `bound == 0` always returns 0.
    pub fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }
}
