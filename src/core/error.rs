//! Engine error taxonomy.
//!
//! Configuration problems surface at construction (or behaviour replacement)
//! and never mid-simulation. Index problems surface at the call site and leave
//! the simulation untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed behaviour tree, invalid params, dimension mismatch,
    /// malformed predicate or invalid settings.
    #[error("ConfigurationError at {path}: {reason}")]
    Configuration { path: String, reason: String },

    /// Particle index outside `0..count`.
    #[error("IndexError: particle index {index} out of range for {count} particles")]
    Index { index: usize, count: usize },
}

impl EngineError {
    pub fn config(path: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration { .. })
    }

    pub fn is_index(&self) -> bool {
        matches!(self, EngineError::Index { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
