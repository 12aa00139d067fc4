// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tileable gradient noise and its fractal (octave) composite.
//!
//! [`NoiseField`] is the classic improved-gradient construction: a shuffled
//! permutation table hashes lattice corners into one of 12 gradient
//! directions, contributions are blended with a quintic fade curve. The
//! table is shuffled by [`Prng`], so a nonzero seed makes every sample
//! bit-reproducible; seed 0 draws a fresh seed from process randomness.

use crate::prng::Prng;

/// Seedable, tileable 3D gradient noise.
#[derive(Debug, Clone)]
pub struct NoiseField {
    tile_dim: usize,
    seed: u64,
    perm: Vec<usize>,
}

impl NoiseField {
    /// Lattice period used when none is configured.
    pub const DEFAULT_TILE_DIM: usize = 256;

    /// Builds a field whose lattice repeats every `tile_dim` units.
    ///
    /// `seed == 0` picks a non-deterministic seed; read it back with
    /// [`NoiseField::seed`] to reproduce the run. Tile dimensions below 2 are
    /// raised to 2.
    pub fn new(tile_dim: usize, seed: u64) -> Self {
        let tile_dim = tile_dim.max(2);
        let seed = if seed == 0 { random_seed() } else { seed };

        let mut permutation: Vec<usize> = (0..tile_dim).collect();
        Prng::from_seed_u64(seed).shuffle(&mut permutation);

        let mut perm = Vec::with_capacity(2 * tile_dim);
        perm.extend_from_slice(&permutation);
        perm.extend_from_slice(&permutation);

        Self {
            tile_dim,
            seed,
            perm,
        }
    }

    /// Builds a field with [`Self::DEFAULT_TILE_DIM`].
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Self::DEFAULT_TILE_DIM, seed)
    }

    /// Effective seed (never 0).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Lattice period.
    pub fn tile_dim(&self) -> usize {
        self.tile_dim
    }

    /// Coherent noise at `(x, y, z)`, in `[-1, 1]`.
    ///
    /// Zero at every lattice point.
    #[allow(clippy::similar_names)]
    pub fn noise3(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, x) = self.split(x);
        let (yi, y) = self.split(y);
        let (zi, z) = self.split(z);

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = &self.perm;
        let a = p[xi] + yi;
        let aa = p[a] + zi;
        let ab = p[a + 1] + zi;
        let b = p[xi + 1] + yi;
        let ba = p[b] + zi;
        let bb = p[b + 1] + zi;

        lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(
                    u,
                    grad(p[ab], x, y - 1.0, z),
                    grad(p[bb], x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa + 1], x, y, z - 1.0),
                    grad(p[ba + 1], x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        )
    }

    /// Sum of `octaves` samples at doubling frequency, each weighted by
    /// `persistence` times the previous weight, divided by the total weight.
    ///
    /// Stays approximately in `[-1, 1]`. Zero octaves yield 0.
    pub fn fractal(
        &self,
        octaves: u32,
        persistence: f64,
        x: f64,
        y: f64,
        z: f64,
        frequency: f64,
    ) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut total_amplitude = 0.0;
        let mut frequency = frequency;
        for _ in 0..octaves {
            value += amplitude * self.noise3(x * frequency, y * frequency, z * frequency);
            total_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }
        if total_amplitude == 0.0 {
            return 0.0;
        }
        value / total_amplitude
    }

    /// Splits a coordinate into its wrapped lattice cell and the offset inside it.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn split(&self, coord: f64) -> (usize, f64) {
        let floor = coord.floor();
        // Saturating float->int cast; non-finite input lands on cell 0.
        let cell = (floor as i64).rem_euclid(self.tile_dim as i64) as usize;
        (cell, coord - floor)
    }
}

fn random_seed() -> u64 {
    loop {
        let seed: u64 = rand::random();
        if seed != 0 {
            return seed;
        }
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Low 4 bits of `hash` select one of 12 edge gradients (4 repeated).
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let first = if h & 1 == 0 { u } else { -u };
    let second = if h & 2 == 0 { v } else { -v };
    first + second
}
