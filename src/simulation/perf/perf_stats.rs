use wasm_bindgen::prelude::*;

/// Timings and counters of the last `step()`.
#[wasm_bindgen]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerfStats {
    pub(super) step_ms: f64,
    pub(super) index_ms: f64,
    pub(super) evaluate_ms: f64,
    pub(super) integrate_ms: f64,
    pub(super) commit_ms: f64,
    pub(super) particles_evaluated: u32,
    pub(super) active_particles: u32,
    pub(super) neighbor_checks: u32,
    pub(super) occupied_cells: u32,
    pub(super) clamped_values: u32,
    pub(super) meta_writes: u32,
}

impl PerfStats {
    pub(crate) fn reset(&mut self) {
        *self = PerfStats::default();
    }
}

#[wasm_bindgen]
impl PerfStats {
    #[wasm_bindgen(getter)]
    pub fn step_ms(&self) -> f64 { self.step_ms }
    #[wasm_bindgen(getter)]
    pub fn index_ms(&self) -> f64 { self.index_ms }
    #[wasm_bindgen(getter)]
    pub fn evaluate_ms(&self) -> f64 { self.evaluate_ms }
    #[wasm_bindgen(getter)]
    pub fn integrate_ms(&self) -> f64 { self.integrate_ms }
    #[wasm_bindgen(getter)]
    pub fn commit_ms(&self) -> f64 { self.commit_ms }

    /// Particles whose tree ran (active at the start of the step).
    #[wasm_bindgen(getter)]
    pub fn particles_evaluated(&self) -> u32 { self.particles_evaluated }
    /// Particles still active after the step.
    #[wasm_bindgen(getter)]
    pub fn active_particles(&self) -> u32 { self.active_particles }
    /// Candidates distance-tested by neighbour queries (saturating).
    #[wasm_bindgen(getter)]
    pub fn neighbor_checks(&self) -> u32 { self.neighbor_checks }
    #[wasm_bindgen(getter)]
    pub fn occupied_cells(&self) -> u32 { self.occupied_cells }
    /// Particles held at their previous state because the update went non-finite.
    #[wasm_bindgen(getter)]
    pub fn clamped_values(&self) -> u32 { self.clamped_values }
    /// Particles whose metadata changed through `set`.
    #[wasm_bindgen(getter)]
    pub fn meta_writes(&self) -> u32 { self.meta_writes }
}
