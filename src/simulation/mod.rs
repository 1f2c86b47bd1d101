//! Simulation - behaviour-tree particle engine
//!
//! `step()` pipeline:
//! 1. rebuild the spatial index from the committed positions
//! 2. evaluate the behaviour tree for every active particle (read-only)
//! 3. integrate every particle from the same frozen state
//! 4. commit positions, velocities, active flags and metadata together
//!
//! Nothing mutates live state before step 4, so particle order never
//! changes the result.
//!
//! `SimulationCore` is the native API; `Simulation` (facade) wraps it for JS.

use serde_json::Value;

use crate::core::EngineResult;
use crate::domain::{BehaviourTree, EngineSettings, ParticleStore, Predicate};
use crate::spatial::SpatialIndex;

#[path = "perf/perf_timer.rs"]
mod perf_timer;
#[path = "perf/perf_stats.rs"]
mod perf_stats;
#[path = "init/init.rs"]
mod init;
#[path = "init/settings.rs"]
mod settings;
#[path = "step/step.rs"]
mod step;
#[path = "commands/commands.rs"]
mod commands;
#[path = "query/query.rs"]
mod query;
mod facade;

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;

pub use facade::{create_simulation, create_simulation_with_settings, Simulation};
pub use perf_stats::PerfStats;

use perf_timer::PerfTimer;

pub struct SimulationCore {
    settings: EngineSettings,
    store: ParticleStore,
    tree: BehaviourTree,
    /// `None` when no behaviour queries neighbours.
    index: Option<SpatialIndex>,
    frame: u64,
    perf_stats: PerfStats,
}

impl SimulationCore {
    /// Build a simulation from flat positions and a parsed behaviour config.
    pub fn new(positions: &[f32], dims: usize, behaviours: &Value) -> EngineResult<Self> {
        init::create_simulation_core(positions, dims, behaviours, EngineSettings::default())
    }

    pub fn with_settings(
        positions: &[f32],
        dims: usize,
        behaviours: &Value,
        settings: EngineSettings,
    ) -> EngineResult<Self> {
        init::create_simulation_core(positions, dims, behaviours, settings)
    }

    /// Same as [`SimulationCore::new`] with the behaviour config as JSON text.
    pub fn from_json(positions: &[f32], dims: usize, behaviours_json: &str) -> EngineResult<Self> {
        init::create_simulation_core_from_json(positions, dims, behaviours_json, EngineSettings::default())
    }

    pub fn particle_count(&self) -> usize { self.store.len() }

    pub fn dims(&self) -> usize { self.store.dims() }

    pub fn frame(&self) -> u64 { self.frame }

    pub fn active_count(&self) -> usize { self.store.active_count() }

    pub fn settings(&self) -> &EngineSettings { &self.settings }

    pub fn behaviours(&self) -> &BehaviourTree { &self.tree }

    pub fn store(&self) -> &ParticleStore { &self.store }

    /// Edge of the spatial index cells (`0.0` = one global bucket), if an index exists.
    pub fn cell_size(&self) -> Option<f32> {
        self.index.as_ref().map(SpatialIndex::cell_size)
    }

    /// Enable or disable per-step perf metrics
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        settings::enable_perf_metrics(self, enabled);
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        settings::set_parallel(self, enabled);
    }

    /// Last step perf snapshot (zeros when perf disabled)
    pub fn get_perf_stats(&self) -> PerfStats {
        settings::get_perf_stats(self)
    }

    /// Advance exactly one tick.
    pub fn step(&mut self) {
        step::step(self);
    }

    pub fn set_meta(&mut self, index: usize, key: &str, value: &str) -> EngineResult<()> {
        commands::set_meta(self, index, key, value)
    }

    pub fn get_meta(&self, index: usize, key: &str) -> EngineResult<Option<&str>> {
        self.store.meta_value(index, key)
    }

    pub fn is_active(&self, index: usize) -> EngineResult<bool> {
        self.store.is_active(index)
    }

    /// Swap the whole behaviour tree. On error the current tree stays in place.
    pub fn replace_behaviours(&mut self, behaviours: &Value) -> EngineResult<()> {
        commands::replace_behaviours(self, behaviours)
    }

    pub fn replace_behaviours_json(&mut self, behaviours_json: &str) -> EngineResult<()> {
        commands::replace_behaviours_json(self, behaviours_json)
    }

    /// Flat positions of every particle, creation order.
    pub fn get(&self) -> Vec<f32> {
        query::get(self)
    }

    /// Flat positions of particles whose metadata satisfies `predicate`.
    pub fn get_if(&self, predicate: &Predicate) -> Vec<f32> {
        query::get_if(self, predicate)
    }
}
