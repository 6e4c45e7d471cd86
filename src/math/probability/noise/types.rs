use super::Float;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Wie ein Gradientvektor aus dem Zufallsstrom gezogen wird.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorMode {
    /// Gleichverteilte Richtung, Länge = Magnitude.
    #[default]
    Uniform,
    /// Normalverteilte Komponenten, skaliert mit `magnitude / Σ x²`.
    Normal,
}

/// Abbildung Oktavindex -> Skalar, für Magnitude und Varianz pro Oktave.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub enum OctaveFunction {
    /// `v`
    Constant(Float),
    /// `v * (i + 1)`
    Linear(Float),
    /// `v * (i + 1)²`
    Quadratic(Float),
    /// `v / 2^i`
    Falloff(Float),
    /// Beliebige reine Funktion. Nicht serialisierbar.
    #[serde(skip)]
    Custom(fn(u32) -> Float),
}

impl OctaveFunction {
    pub fn evaluate(&self, octave: u32) -> Float {
        let step = Float::from(octave) + 1.0;
        match *self {
            OctaveFunction::Constant(v) => v,
            OctaveFunction::Linear(v) => v * step,
            OctaveFunction::Quadratic(v) => v * step * step,
            OctaveFunction::Falloff(v) => v / Float::from(octave).exp2(),
            OctaveFunction::Custom(f) => f(octave),
        }
    }
}

impl Default for OctaveFunction {
    fn default() -> Self {
        OctaveFunction::Constant(1.0)
    }
}

// Floats werden bitweise verglichen, damit Eq und Hash zueinander passen.
impl PartialEq for OctaveFunction {
    fn eq(&self, other: &Self) -> bool {
        use OctaveFunction::*;
        match (self, other) {
            (Constant(a), Constant(b))
            | (Linear(a), Linear(b))
            | (Quadratic(a), Quadratic(b))
            | (Falloff(a), Falloff(b)) => a.to_bits() == b.to_bits(),
            (Custom(a), Custom(b)) => std::ptr::fn_addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl Eq for OctaveFunction {}

impl Hash for OctaveFunction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match *self {
            OctaveFunction::Constant(v)
            | OctaveFunction::Linear(v)
            | OctaveFunction::Quadratic(v)
            | OctaveFunction::Falloff(v) => v.to_bits().hash(state),
            OctaveFunction::Custom(f) => (f as usize).hash(state),
        }
    }
}
