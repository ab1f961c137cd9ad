//! Reading noise sources.
//!
//! Each source yields a unit sample in [-1, 1]; the measurement model scales
//! it to millimetres.

use std::fmt::Debug;

use rand::prelude::*;
use rand_distr::{Triangular, Uniform};

/// Source of unit noise samples in [-1, 1]
pub trait NoiseSource: Debug {
    fn sample(&mut self) -> f64;
}

/// Triangular distribution on [-1, 1] with mode 0
///
/// Small errors are most likely and the error is bounded, which is how a
/// micrometer drum reading behaves.
#[derive(Debug)]
pub struct TriangularNoise {
    rng: StdRng,
    dist: Triangular<f64>,
}

impl TriangularNoise {
    /// Seed from the operating system
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        // min < max and min <= mode <= max
        let dist = Triangular::new(-1.0, 1.0, 0.0).expect("-1 <= 0 <= 1");
        Self { rng, dist }
    }
}

impl NoiseSource for TriangularNoise {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Uniform distribution on [-1, 1]
#[derive(Debug)]
pub struct UniformNoise {
    rng: StdRng,
    dist: Uniform<f64>,
}

impl UniformNoise {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            dist: Uniform::new_inclusive(-1.0, 1.0),
        }
    }
}

impl NoiseSource for UniformNoise {
    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Always returns 0; for noise-free runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise;

impl NoiseSource for ZeroNoise {
    fn sample(&mut self) -> f64 {
        0.0
    }
}
