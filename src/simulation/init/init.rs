use serde_json::Value;
use tracing::debug;

use crate::core::{EngineError, EngineResult};
use crate::domain::{BehaviourTree, EngineSettings, ParticleStore};
use crate::spatial::SpatialIndex;

use super::perf_stats::PerfStats;
use super::SimulationCore;

pub(super) fn create_simulation_core(
    positions: &[f32],
    dims: usize,
    behaviours: &Value,
    settings: EngineSettings,
) -> EngineResult<SimulationCore> {
    settings.validate()?;
    let store = ParticleStore::create(positions, dims)?;
    let tree = BehaviourTree::compile(behaviours, dims)?;
    let index = SpatialIndex::for_tree(&tree, &settings);

    debug!(
        particles = store.len(),
        dims,
        nodes = tree.len(),
        cell_size = ?index.as_ref().map(SpatialIndex::cell_size),
        "simulation created"
    );

    Ok(SimulationCore {
        settings,
        store,
        tree,
        index,
        frame: 0,
        perf_stats: PerfStats::default(),
    })
}

pub(super) fn create_simulation_core_from_json(
    positions: &[f32],
    dims: usize,
    behaviours_json: &str,
    settings: EngineSettings,
) -> EngineResult<SimulationCore> {
    let behaviours: Value = serde_json::from_str(behaviours_json)
        .map_err(|e| EngineError::config("behaviours", e.to_string()))?;
    create_simulation_core(positions, dims, &behaviours, settings)
}
