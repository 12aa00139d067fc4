// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seedable `xoroshiro128+` generator used to shuffle noise permutation tables.

/// Stateful `xoroshiro128+` pseudo-random number generator.
///
/// * Not cryptographically secure; it only drives permutation shuffles.
/// * Matching seeds yield identical sequences across supported platforms, so a
///   seeded [`NoiseField`](crate::noise::NoiseField) is bit-reproducible.
#[derive(Debug, Clone, Copy)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Constructs a PRNG from a single 64-bit seed via SplitMix64 expansion.
    pub fn from_seed_u64(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm_state = seed;
        let mut state = [splitmix64(&mut sm_state), splitmix64(&mut sm_state)];
        if state[0] == 0 && state[1] == 0 {
            state[0] = 0x9e37_79b9_7f4a_7c15;
        }
        Self { state }
    }

    /// Returns the next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns an index uniformly drawn from `0..bound`.
    ///
    /// Uses rejection sampling to avoid modulo bias. A `bound` of 0 or 1
    /// always yields 0.
    pub fn next_index(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        let span = bound as u64;
        let value = if span.is_power_of_two() {
            self.next_u64() & (span - 1)
        } else {
            let limit = u64::MAX - u64::MAX % span;
            loop {
                let candidate = self.next_u64();
                if candidate < limit {
                    break candidate % span;
                }
            }
        };
        // value < bound, which came from a usize.
        usize::try_from(value).unwrap_or(0)
    }

    /// Fisher–Yates shuffle of `items` in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}
