// src/extractors/mod.rs
pub mod rows;
pub mod scope;
pub mod text;

// Re-export key extraction types for convenience
pub use rows::{HeaderMarkers, RowExtractor, RowRecord};
pub use scope::Vocabulary;
