use crate::core::vector::push_point;
use crate::domain::Predicate;

use super::SimulationCore;

pub(super) fn get(sim: &SimulationCore) -> Vec<f32> {
    sim.store.snapshot_positions()
}

/// No index mapping is returned; callers correlate through `get()` if needed.
pub(super) fn get_if(sim: &SimulationCore, predicate: &Predicate) -> Vec<f32> {
    let store = &sim.store;
    let dims = store.dims();
    let mut out = Vec::new();
    for (i, position) in store.positions().iter().enumerate() {
        if predicate.matches(store.metadata(i)) {
            push_point(&mut out, *position, dims);
        }
    }
    out
}
