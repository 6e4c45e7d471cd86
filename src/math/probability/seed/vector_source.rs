//! Seeded source of n-dimensional displacement vectors.
//!
//! Every octave of a noise field owns one `RandomVectorSource`. The source is a
//! ChaCha8 generator seeded with the field seed and switched to a stream number
//! derived from the octave index, so each octave reads its own reproducible
//! sequence regardless of the order (or thread) in which octaves are generated.

use crate::math::error::{MathError, MathResult};
use crate::math::probability::noise::{Float, VectorMode};
use nalgebra::DVector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Deterministic generator for gradient vectors.
#[derive(Debug, Clone)]
pub struct RandomVectorSource {
    seed: u64,
    stream: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl RandomVectorSource {
    /// Creates a source reading stream `0` of `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    /// Creates a source reading the given sub-stream of `seed`.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self {
            seed,
            stream,
            rng,
            draws: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Number of vectors drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Draws `dimensions` uniform values in [-1, 1), scales the vector to unit
    /// length and multiplies by `magnitude`.
    pub fn uniform_vector(&mut self, dimensions: usize, magnitude: Float) -> DVector<Float> {
        self.draws += 1;
        let vec = DVector::from_iterator(
            dimensions,
            (0..dimensions).map(|_| self.rng.random_range(-1.0..1.0)),
        );
        let norm = vec.norm();
        (vec / norm) * magnitude
    }

    /// Draws `dimensions` values from N(0, `variance`) and scales the vector by
    /// `magnitude / Σ component²`.
    ///
    /// The scale is passed to the normal distribution as its spread parameter.
    /// The result is not unit length: a short draw yields a long vector.
    pub fn normal_vector(
        &mut self,
        dimensions: usize,
        magnitude: Float,
        variance: Float,
    ) -> MathResult<DVector<Float>> {
        let normal =
            Normal::new(0.0, variance).map_err(|e| MathError::InvalidConfiguration {
                message: format!("Normal distribution with spread {variance} rejected: {e}"),
            })?;
        self.draws += 1;
        let vec = DVector::from_iterator(
            dimensions,
            (0..dimensions).map(|_| normal.sample(&mut self.rng)),
        );
        let energy = vec.norm_squared();
        Ok(vec * (magnitude / energy))
    }

    /// Draws one vector in the requested mode.
    pub fn vector(
        &mut self,
        mode: VectorMode,
        dimensions: usize,
        magnitude: Float,
        variance: Float,
    ) -> MathResult<DVector<Float>> {
        match mode {
            VectorMode::Uniform => Ok(self.uniform_vector(dimensions, magnitude)),
            VectorMode::Normal => self.normal_vector(dimensions, magnitude, variance),
        }
    }
}
