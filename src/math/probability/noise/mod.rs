pub mod cache;
pub mod config;
pub mod field;
pub mod kernel;
pub mod octave;
pub mod spectrum;
pub mod stencil;
pub mod types;

pub use cache::NoiseFieldCache;
pub use config::NoiseFieldConfig;
pub use field::NoiseField;
pub use kernel::{integrate_kernel, kernel_method};
pub use octave::NoiseOctave;
pub use stencil::{Corner, Stencil};
pub use types::{OctaveFunction, VectorMode};

use crate::math::types::NdGrid;

pub type Float = f64;
/// Vektorgitter `[..räumlich, n]`: ein n-Vektor pro Knoten.
pub type GradientGrid = NdGrid<Float>;
