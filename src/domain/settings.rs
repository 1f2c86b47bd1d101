use serde::Deserialize;

use crate::core::{EngineError, EngineResult};

/// Per-simulation tuning. Every constant the step pipeline depends on lives
/// here so independent simulations can coexist with different values.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Distance floor for inverse-distance forces (coincident particles).
    pub distance_epsilon: f32,
    /// Spatial cell edge as a multiple of the largest neighbour radius.
    pub cell_size_factor: f32,
    /// Run the evaluation pass on rayon (requires the `parallel` feature).
    pub parallel: bool,
    /// Collect per-step timings into `PerfStats`.
    pub perf_metrics: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            distance_epsilon: 1e-3,
            cell_size_factor: 2.0,
            parallel: true,
            perf_metrics: false,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let settings: EngineSettings =
            serde_json::from_str(json).map_err(|e| EngineError::config("settings", e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(self.distance_epsilon.is_finite() && self.distance_epsilon > 0.0) {
            return Err(EngineError::config(
                "settings.distance_epsilon",
                format!("must be a finite number > 0, got {}", self.distance_epsilon),
            ));
        }
        if !(self.cell_size_factor.is_finite() && self.cell_size_factor > 0.0) {
            return Err(EngineError::config(
                "settings.cell_size_factor",
                format!("must be a finite number > 0, got {}", self.cell_size_factor),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let s = EngineSettings::from_json("{}").unwrap();
        assert_eq!(s, EngineSettings::default());
    }

    #[test]
    fn partial_json_overrides_fields() {
        let s = EngineSettings::from_json(r#"{ "parallel": false, "distance_epsilon": 0.5 }"#).unwrap();
        assert!(!s.parallel);
        assert_eq!(s.distance_epsilon, 0.5);
        assert_eq!(s.cell_size_factor, 2.0);
    }

    #[test]
    fn rejects_unknown_and_invalid_fields() {
        assert!(EngineSettings::from_json(r#"{ "gravity": 1 }"#).is_err());
        let err = EngineSettings::from_json(r#"{ "distance_epsilon": 0 }"#).unwrap_err();
        assert!(err.is_configuration());
        assert!(EngineSettings::from_json(r#"{ "cell_size_factor": -1 }"#).is_err());
    }
}
