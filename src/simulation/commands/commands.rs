use serde_json::Value;
use tracing::debug;

use crate::core::{EngineError, EngineResult};
use crate::domain::BehaviourTree;
use crate::spatial::SpatialIndex;

use super::SimulationCore;

pub(super) fn set_meta(sim: &mut SimulationCore, index: usize, key: &str, value: &str) -> EngineResult<()> {
    sim.store.set_meta(index, key, value)
}

/// Compile first, swap second: a rejected tree leaves the old one running.
pub(super) fn replace_behaviours(sim: &mut SimulationCore, behaviours: &Value) -> EngineResult<()> {
    let tree = BehaviourTree::compile(behaviours, sim.store.dims())?;
    let index = SpatialIndex::for_tree(&tree, &sim.settings);

    debug!(
        frame = sim.frame,
        nodes = tree.len(),
        cell_size = ?index.as_ref().map(SpatialIndex::cell_size),
        "behaviours replaced"
    );

    sim.tree = tree;
    sim.index = index;
    Ok(())
}

pub(super) fn replace_behaviours_json(sim: &mut SimulationCore, behaviours_json: &str) -> EngineResult<()> {
    let behaviours: Value = serde_json::from_str(behaviours_json)
        .map_err(|e| EngineError::config("behaviours", e.to_string()))?;
    replace_behaviours(sim, &behaviours)
}
