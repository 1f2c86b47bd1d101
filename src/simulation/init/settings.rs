use super::perf_stats::PerfStats;
use super::SimulationCore;

pub(super) fn enable_perf_metrics(sim: &mut SimulationCore, enabled: bool) {
    sim.settings.perf_metrics = enabled;
    if !enabled {
        sim.perf_stats.reset();
    }
}

pub(super) fn set_parallel(sim: &mut SimulationCore, enabled: bool) {
    sim.settings.parallel = enabled;
}

pub(super) fn get_perf_stats(sim: &SimulationCore) -> PerfStats {
    sim.perf_stats.clone()
}
