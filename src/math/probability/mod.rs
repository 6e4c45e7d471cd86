pub mod noise;
pub mod seed;

pub use noise::*;
pub use seed::{RandomVectorSource, seed_from_text};
