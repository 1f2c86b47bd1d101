//! Core building blocks shared by every layer: errors and vector helpers.

pub mod error;
pub mod vector;

pub use error::{EngineError, EngineResult};
