pub mod error;
pub mod probability;
pub mod scalar_field;
pub mod types;
pub mod utils;

// Re-exports für einfache Verwendung
pub use error::{MathError, MathResult};
pub use types::*;

// Öffentliche API
pub mod prelude {
    pub use super::{
        error::{MathError, MathResult},
        probability::{noise::*, seed::*},
        scalar_field::ScalarField2D,
        types::*,
    };
}
