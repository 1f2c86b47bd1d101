use js_sys::JSON;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::core::EngineError;
use crate::domain::{EngineSettings, Predicate};

use super::perf_stats::PerfStats;
use super::SimulationCore;

fn to_js(err: EngineError) -> JsValue {
    JsError::new(&err.to_string()).into()
}

/// JS value -> serde_json via `JSON.stringify`.
fn js_to_json(value: &JsValue, what: &str) -> Result<Value, JsValue> {
    let text = JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or_else(|| to_js(EngineError::config(what, "value is not JSON-serializable")))?;
    serde_json::from_str(&text).map_err(|e| to_js(EngineError::config(what, e.to_string())))
}

/// `createSimulation(points, dims, behaviours)`
#[wasm_bindgen(js_name = createSimulation)]
pub fn create_simulation(points: &[f32], dims: usize, behaviours: &JsValue) -> Result<Simulation, JsValue> {
    let behaviours = js_to_json(behaviours, "behaviours")?;
    let core = SimulationCore::new(points, dims, &behaviours).map_err(to_js)?;
    Ok(Simulation { core })
}

/// `createSimulationWithSettings(points, dims, behaviours, { distance_epsilon, ... })`
#[wasm_bindgen(js_name = createSimulationWithSettings)]
pub fn create_simulation_with_settings(
    points: &[f32],
    dims: usize,
    behaviours: &JsValue,
    settings: &JsValue,
) -> Result<Simulation, JsValue> {
    let behaviours = js_to_json(behaviours, "behaviours")?;
    let settings = js_to_json(settings, "settings")?;
    let settings = EngineSettings::from_json(&settings.to_string()).map_err(to_js)?;
    let core = SimulationCore::with_settings(points, dims, &behaviours, settings).map_err(to_js)?;
    Ok(Simulation { core })
}

#[wasm_bindgen]
pub struct Simulation {
    core: SimulationCore,
}

#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(getter = particleCount)]
    pub fn particle_count(&self) -> usize { self.core.particle_count() }

    #[wasm_bindgen(getter)]
    pub fn dims(&self) -> usize { self.core.dims() }

    #[wasm_bindgen(getter)]
    pub fn frame(&self) -> u64 { self.core.frame() }

    #[wasm_bindgen(getter = activeCount)]
    pub fn active_count(&self) -> usize { self.core.active_count() }

    /// Advance one tick.
    pub fn step(&mut self) {
        self.core.step();
    }

    /// Flat positions (Float32Array copy), creation order.
    pub fn get(&self) -> Vec<f32> {
        self.core.get()
    }

    /// Flat positions of particles matching `[op, key, literal]`.
    #[wasm_bindgen(js_name = getIf)]
    pub fn get_if(&self, test: &JsValue) -> Result<Vec<f32>, JsValue> {
        let test = js_to_json(test, "test")?;
        let predicate = Predicate::parse(&test, "test").map_err(to_js)?;
        Ok(self.core.get_if(&predicate))
    }

    #[wasm_bindgen(js_name = setMeta)]
    pub fn set_meta(&mut self, index: usize, key: String, value: String) -> Result<(), JsValue> {
        self.core.set_meta(index, &key, &value).map_err(to_js)
    }

    #[wasm_bindgen(js_name = getMeta)]
    pub fn get_meta(&self, index: usize, key: String) -> Result<Option<String>, JsValue> {
        self.core
            .get_meta(index, &key)
            .map(|v| v.map(str::to_string))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self, index: usize) -> Result<bool, JsValue> {
        self.core.is_active(index).map_err(to_js)
    }

    #[wasm_bindgen(js_name = replaceBehaviours)]
    pub fn replace_behaviours(&mut self, behaviours: &JsValue) -> Result<(), JsValue> {
        let behaviours = js_to_json(behaviours, "behaviours")?;
        self.core.replace_behaviours(&behaviours).map_err(to_js)
    }

    /// Older name kept for existing callers.
    #[wasm_bindgen(js_name = _replaceBehaviours)]
    pub fn replace_behaviours_legacy(&mut self, behaviours: &JsValue) -> Result<(), JsValue> {
        self.replace_behaviours(behaviours)
    }

    /// Enable or disable per-step perf metrics (adds timing overhead when enabled)
    #[wasm_bindgen(js_name = enablePerfMetrics)]
    pub fn enable_perf_metrics(&mut self, enabled: bool) {
        self.core.enable_perf_metrics(enabled);
    }

    #[wasm_bindgen(js_name = getPerfStats)]
    pub fn get_perf_stats(&self) -> PerfStats {
        self.core.get_perf_stats()
    }
}

impl Simulation {
    pub fn from_core(core: SimulationCore) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &SimulationCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SimulationCore {
        &mut self.core
    }
}
