//! Behaviours Engine - declarative per-particle behaviour trees in WASM
//!
//! A point cloud (2D or 3D) is driven by a tree of composable behaviours
//! (`repel`, `attract`, `dampen`, `collide`, `if`, `set`, `stop`) evaluated
//! once per particle per tick, backed by a uniform-grid spatial index.
//!
//! Architecture:
//! - core/       - errors, flat buffer helpers
//! - domain/     - particle store, predicates, behaviour tree compiler, settings
//! - spatial/    - neighbour index
//! - systems/    - evaluator and integrator
//! - simulation/ - step pipeline, queries, JS facade

pub mod core;
pub mod domain;
pub mod spatial;
pub mod systems;
pub mod simulation;

use wasm_bindgen::prelude::*;

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&format!("behaviours-engine {} initialized", version()).into());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use crate::core::{EngineError, EngineResult};
pub use domain::{Behaviour, BehaviourTree, EngineSettings, MetaMap, ParticleStore, Predicate, PredicateOp};
pub use simulation::{create_simulation, create_simulation_with_settings, PerfStats, Simulation, SimulationCore};
pub use spatial::SpatialIndex;
