//! Spatial acceleration structures.

pub mod index;

pub use index::SpatialIndex;
