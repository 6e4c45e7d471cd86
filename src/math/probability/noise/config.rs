// src/math/probability/noise/config.rs

use super::types::{OctaveFunction, VectorMode};
use crate::math::{
    error::{MathError, MathResult},
    probability::seed::seed_from_text,
    utils::constants::DEFAULT_WINDOW_SIZE,
};
use serde::{Deserialize, Serialize};

/// Konfiguration eines mehrschichtigen Gradienten-Rauschfelds.
///
/// Zwei Konfigurationen mit identischen Werten beschreiben dasselbe Feld;
/// darauf beruht das Teilen von Caches zwischen Feldern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoiseFieldConfig {
    /// Ausdehnung des gröbsten Gitters pro Achse. Die Länge ist die Dimension.
    pub shape: Vec<usize>,
    /// Seed für alle Zufallsströme des Felds.
    pub seed: u64,
    /// Anzahl der Oktaven (mindestens 1).
    pub octaves: u32,
    /// Verdichtungsfaktor pro Oktave: Oktave `i` hat `shape * density^i` Knoten.
    pub density: usize,
    /// Magnitude der Gradienten in Abhängigkeit vom Oktavindex.
    pub magnitude: OctaveFunction,
    /// Streuung der Normalverteilung (nur `VectorMode::Normal`).
    pub variance: OctaveFunction,
    pub vector_mode: VectorMode,
    /// Fenstergröße der Kernel-Integration.
    pub window_size: usize,
}

impl Default for NoiseFieldConfig {
    fn default() -> Self {
        Self {
            shape: vec![4, 4],
            seed: 0,
            octaves: 1,
            density: 2,
            magnitude: OctaveFunction::Constant(1.0),
            variance: OctaveFunction::Constant(1.0),
            vector_mode: VectorMode::Uniform,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl NoiseFieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shape(mut self, shape: &[usize]) -> Self {
        self.shape = shape.to_vec();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_text_seed<S: AsRef<str>>(mut self, text: S) -> Self {
        self.seed = seed_from_text(text);
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn with_density(mut self, density: usize) -> Self {
        self.density = density;
        self
    }

    /// Konstante Magnitude für alle Oktaven.
    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = OctaveFunction::Constant(magnitude);
        self
    }

    pub fn with_magnitude_fn(mut self, magnitude: OctaveFunction) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn with_variance_fn(mut self, variance: OctaveFunction) -> Self {
        self.variance = variance;
        self
    }

    pub fn with_vector_mode(mut self, mode: VectorMode) -> Self {
        self.vector_mode = mode;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.shape.len()
    }

    /// Gitterausdehnung der Oktave `octave`, oder `None` bei Überlauf.
    pub fn octave_shape(&self, octave: u32) -> Option<Vec<usize>> {
        let factor = self.density.checked_pow(octave)?;
        self.shape.iter().map(|d| d.checked_mul(factor)).collect()
    }

    pub fn validate(&self) -> MathResult<()> {
        if self.shape.is_empty() {
            return Err(MathError::InvalidConfiguration {
                message: "Noise field shape needs at least one dimension.".to_string(),
            });
        }
        // Eine Zelle hat 2^n Ecken, die als usize abzählbar sein müssen
        if self.shape.len() >= usize::BITS as usize {
            return Err(MathError::InvalidConfiguration {
                message: format!(
                    "Noise field with {} dimensions has too many cell corners.",
                    self.shape.len()
                ),
            });
        }
        if self.shape.contains(&0) {
            return Err(MathError::InvalidConfiguration {
                message: format!("Noise field shape {:?} has an empty axis.", self.shape),
            });
        }
        if self.octaves == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "Noise field needs at least one octave.".to_string(),
            });
        }
        if self.density == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "Octave density must be at least 1.".to_string(),
            });
        }
        if self.window_size == 0 {
            return Err(MathError::InvalidConfiguration {
                message: "Kernel window size must be at least 1.".to_string(),
            });
        }
        let finest = self.octave_shape(self.octaves - 1).ok_or_else(|| {
            MathError::InvalidConfiguration {
                message: format!(
                    "Grid of octave {} overflows: shape {:?}, density {}.",
                    self.octaves - 1,
                    self.shape,
                    self.density
                ),
            }
        })?;
        if finest
            .iter()
            .try_fold(1usize, |acc, d| acc.checked_mul(*d))
            .is_none()
        {
            return Err(MathError::InvalidConfiguration {
                message: format!("Finest octave grid {finest:?} has too many nodes."),
            });
        }
        Ok(())
    }
}
