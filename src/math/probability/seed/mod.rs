// src/math/probability/seed/mod.rs
pub mod vector_source;

pub use vector_source::RandomVectorSource;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Leitet einen numerischen Seed aus einem Text ab.
/// Gleicher Text ergibt innerhalb eines Builds denselben Seed.
pub fn seed_from_text<S: AsRef<str>>(text: S) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.as_ref().hash(&mut hasher);
    hasher.finish()
}
