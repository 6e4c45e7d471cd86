//! Multi-octave gradient noise fields over n-dimensional grids.
//!
//! A [`NoiseField`](math::probability::noise::NoiseField) stacks noise octaves,
//! sums their gradients on the finest grid, integrates them into a scalar
//! potential and resamples the gradient grid to arbitrary pixel densities.
//! Everything derived from a field is computed lazily and memoized.

pub mod math;

pub use math::prelude;
