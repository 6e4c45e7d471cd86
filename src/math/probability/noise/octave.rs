// src/math/probability/noise/octave.rs

use super::{Float, GradientGrid, config::NoiseFieldConfig, types::VectorMode};
use crate::math::{
    error::{MathError, MathResult},
    probability::seed::RandomVectorSource,
    types::{IndexIter, NdGrid},
    utils::numerical::linspace,
};
use rayon::prelude::*;
use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Instant;
use tracing::debug;

/// Eine Frequenzschicht des Rauschfelds.
///
/// Besitzt ein Gradientengitter mit `top_shape * density^octave` Knoten pro Achse.
/// Das Gitter wird beim ersten Zugriff genau einmal erzeugt und danach nur noch
/// gelesen.
#[derive(Debug)]
pub struct NoiseOctave {
    octave: u32,
    dimensions: usize,
    top_shape: Vec<usize>,
    density: usize,
    magnitude: Float,
    variance: Float,
    vector_mode: VectorMode,
    seed: u64,
    shape: Vec<usize>,
    gradient_grid: OnceLock<MathResult<GradientGrid>>,
    generations: Arc<AtomicUsize>,
}

impl NoiseOctave {
    /// Erstellt die Oktave `octave` eines Felds mit eigener Generierungszählung.
    pub fn from_config(config: &NoiseFieldConfig, octave: u32) -> MathResult<Self> {
        config.validate()?;
        Self::new(config, octave, Arc::new(AtomicUsize::new(0)))
    }

    pub(crate) fn new(
        config: &NoiseFieldConfig,
        octave: u32,
        generations: Arc<AtomicUsize>,
    ) -> MathResult<Self> {
        let shape = config
            .octave_shape(octave)
            .ok_or_else(|| MathError::InvalidConfiguration {
                message: format!("Grid of octave {octave} overflows."),
            })?;
        let variance = config.variance.evaluate(octave);
        if config.vector_mode == VectorMode::Normal && !(variance.is_finite() && variance >= 0.0)
        {
            return Err(MathError::InvalidConfiguration {
                message: format!("Octave {octave} has invalid spread {variance}."),
            });
        }
        Ok(Self {
            octave,
            dimensions: config.dimensions(),
            top_shape: config.shape.clone(),
            density: config.density,
            magnitude: config.magnitude.evaluate(octave),
            variance,
            vector_mode: config.vector_mode,
            seed: config.seed,
            shape,
            gradient_grid: OnceLock::new(),
            generations,
        })
    }

    pub fn octave(&self) -> u32 {
        self.octave
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn top_shape(&self) -> &[usize] {
        &self.top_shape
    }

    pub fn magnitude(&self) -> Float {
        self.magnitude
    }

    pub fn variance(&self) -> Float {
        self.variance
    }

    /// `density^octave`
    pub fn density_scale_factor(&self) -> usize {
        self.density.pow(self.octave)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Ob das Gradientengitter bereits erzeugt wurde.
    pub fn is_generated(&self) -> bool {
        self.gradient_grid.get().is_some()
    }

    /// Gradientengitter der Form `[..shape, dimensions]`.
    pub fn gradient_grid(&self) -> MathResult<&GradientGrid> {
        self.gradient_grid
            .get_or_init(|| self.generate())
            .as_ref()
            .map_err(Clone::clone)
    }

    // Zieht genau einen Vektor pro Knoten, Knoten in row-major Reihenfolge.
    fn generate(&self) -> MathResult<GradientGrid> {
        let started = Instant::now();
        let mut source = RandomVectorSource::with_stream(self.seed, u64::from(self.octave));
        let mut grid_shape = self.shape.clone();
        grid_shape.push(self.dimensions);
        let mut grid = NdGrid::filled(&grid_shape, 0.0);

        for index in IndexIter::new(&self.shape) {
            let vector = source.vector(
                self.vector_mode,
                self.dimensions,
                self.magnitude,
                self.variance,
            )?;
            grid.lane_mut(&index).copy_from_slice(vector.as_slice());
        }

        self.generations.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Octave {}: generated {} gradient vectors on grid {:?} (density {}) in {:?}",
            self.octave,
            source.draws(),
            self.shape,
            self.density,
            started.elapsed()
        );
        Ok(grid)
    }

    /// Knotenkoordinaten in [0, 1]^n, Form `[..shape, dimensions]`.
    pub fn points(&self) -> NdGrid<Float> {
        let axes: Vec<Vec<Float>> = self.shape.iter().map(|&d| linspace(0.0, 1.0, d)).collect();
        let mut grid_shape = self.shape.clone();
        grid_shape.push(self.dimensions);
        let mut points = NdGrid::filled(&grid_shape, 0.0);
        for index in IndexIter::new(&self.shape) {
            let lane = points.lane_mut(&index);
            for (axis, &i) in index.iter().enumerate() {
                lane[axis] = axes[axis][i];
            }
        }
        points
    }

    /// Multilineare Interpolation des Gradientengitters an einem Punkt in [0, 1]^n.
    ///
    /// Punkte außerhalb des Einheitswürfels werden abgewiesen, nicht geklemmt.
    pub fn interpolate_at(&self, point: &[Float]) -> MathResult<Vec<Float>> {
        if point.len() != self.dimensions {
            return Err(MathError::DimensionMismatch {
                expected: self.dimensions,
                actual: point.len(),
            });
        }

        // (unterer Knoten, oberer Knoten, Anteil) pro Achse
        let mut cell = Vec::with_capacity(self.dimensions);
        for (axis, (&t, &len)) in point.iter().zip(&self.shape).enumerate() {
            if !(0.0..=1.0).contains(&t) {
                return Err(MathError::OutOfBoundsQuery { axis, value: t });
            }
            if len == 1 {
                cell.push((0, 0, 0.0));
                continue;
            }
            let position = t * (len - 1) as Float;
            let lower = (position.floor() as usize).min(len - 2);
            cell.push((lower, lower + 1, position - lower as Float));
        }

        let grid = self.gradient_grid()?;
        let mut result = vec![0.0; self.dimensions];
        let mut index = vec![0; self.dimensions];
        for corner in 0..1usize << self.dimensions {
            let mut weight = 1.0;
            for (axis, &(lower, upper, frac)) in cell.iter().enumerate() {
                if (corner >> axis) & 1 == 1 {
                    index[axis] = upper;
                    weight *= frac;
                } else {
                    index[axis] = lower;
                    weight *= 1.0 - frac;
                }
            }
            if weight == 0.0 {
                continue;
            }
            for (acc, g) in result.iter_mut().zip(grid.lane(&index)) {
                *acc += weight * g;
            }
        }
        Ok(result)
    }

    /// Interpoliert an allen Punkten eines Gitters der Form `[..m, dimensions]`.
    /// Das Ergebnis hat dieselbe Form.
    pub fn interpolated_gradient(&self, points: &NdGrid<Float>) -> MathResult<GradientGrid> {
        let width = points.shape().last().copied().unwrap_or(0);
        if width != self.dimensions {
            return Err(MathError::DimensionMismatch {
                expected: self.dimensions,
                actual: width,
            });
        }
        // Gitter vor dem parallelen Zugriff erzeugen
        self.gradient_grid()?;
        let values = points
            .data()
            .par_chunks(self.dimensions)
            .map(|point| self.interpolate_at(point))
            .collect::<MathResult<Vec<_>>>()?;
        NdGrid::from_vec(points.shape(), values.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn octave(shape: &[usize], density: usize, index: u32) -> NoiseOctave {
        let config = NoiseFieldConfig::new()
            .with_shape(shape)
            .with_density(density)
            .with_octaves(index + 1)
            .with_seed(5);
        NoiseOctave::from_config(&config, index).unwrap()
    }

    #[test]
    fn test_shape_grows_with_octave() {
        for i in 0..4 {
            let layer = octave(&[2, 3], 2, i);
            let factor = 2usize.pow(i);
            assert_eq!(layer.density_scale_factor(), factor);
            assert_eq!(layer.shape(), &[2 * factor, 3 * factor]);
        }
    }

    #[test]
    fn test_grid_is_generated_once() {
        let layer = octave(&[3, 3], 2, 1);
        assert!(!layer.is_generated());
        let first = layer.gradient_grid().unwrap() as *const GradientGrid;
        let second = layer.gradient_grid().unwrap() as *const GradientGrid;
        assert_eq!(first, second);
        assert_eq!(layer.generations.load(Ordering::Relaxed), 1);
        assert_eq!(layer.gradient_grid().unwrap().shape(), &[6, 6, 2]);
    }

    #[test]
    fn test_interpolation_hits_nodes() {
        let layer = octave(&[3, 4], 2, 0);
        let grid = layer.gradient_grid().unwrap();
        let points = layer.points();
        for index in IndexIter::new(layer.shape()) {
            let value = layer.interpolate_at(points.lane(&index)).unwrap();
            for (v, g) in value.iter().zip(grid.lane(&index)) {
                assert_abs_diff_eq!(*v, *g, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_interpolation_midpoint_is_average() {
        let layer = octave(&[2], 1, 0);
        let grid = layer.gradient_grid().unwrap();
        let mid = layer.interpolate_at(&[0.5]).unwrap();
        assert_abs_diff_eq!(mid[0], 0.5 * (grid[&[0, 0][..]] + grid[&[1, 0][..]]), epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let layer = octave(&[2, 2], 2, 0);
        assert_eq!(
            layer.interpolate_at(&[0.5, 1.25]),
            Err(MathError::OutOfBoundsQuery {
                axis: 1,
                value: 1.25
            })
        );
        assert!(matches!(
            layer.interpolate_at(&[-0.01, 0.5]),
            Err(MathError::OutOfBoundsQuery { axis: 0, .. })
        ));
        assert!(matches!(
            layer.interpolate_at(&[0.5]),
            Err(MathError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_batch_interpolation_keeps_shape() {
        let coarse = octave(&[2, 2], 2, 0);
        let fine = octave(&[2, 2], 2, 2);
        let values = coarse.interpolated_gradient(&fine.points()).unwrap();
        assert_eq!(values.shape(), &[8, 8, 2]);
    }
}
