// src/math/types/mod.rs
pub mod grid;

pub use grid::{IndexIter, NdGrid};
