use tracing::warn;

use crate::systems::{integrate, Evaluator};

use super::{PerfTimer, SimulationCore};

pub(super) fn step(sim: &mut SimulationCore) {
    let perf_on = sim.settings.perf_metrics;
    let step_start = PerfTimer::start();
    let mut lap = PerfTimer::start();

    // === SPATIAL INDEX ===
    // Rebuilt from scratch: every particle may have moved last tick.
    if let Some(index) = sim.index.as_mut() {
        index.rebuild(sim.store.positions());
    }
    let index_ms = lap.lap_ms();

    // === EVALUATE ===
    // Reads only the committed store; each outcome slot belongs to one particle.
    let outcomes = Evaluator::new(
        &sim.tree,
        &sim.store,
        sim.index.as_ref(),
        sim.settings.distance_epsilon,
    )
    .evaluate_all(sim.settings.parallel);
    let evaluate_ms = lap.lap_ms();

    // === INTEGRATE ===
    let integrated = integrate(&sim.store, &outcomes);
    let integrate_ms = lap.lap_ms();

    if integrated.clamped > 0 {
        warn!(
            frame = sim.frame,
            particles = integrated.clamped,
            "non-finite update clamped to previous state"
        );
    }

    // === COMMIT ===
    let clamped = integrated.clamped;
    sim.store
        .commit(integrated.positions, integrated.velocities, integrated.active);

    let mut particles_evaluated = 0u32;
    let mut neighbor_checks = 0u32;
    let mut meta_writes = 0u32;
    for (i, outcome) in outcomes.into_iter().enumerate() {
        if outcome.evaluated {
            particles_evaluated += 1;
        }
        neighbor_checks = neighbor_checks.saturating_add(outcome.neighbor_checks);
        if let Some(meta) = outcome.meta {
            sim.store.replace_meta(i, meta);
            meta_writes += 1;
        }
    }
    let commit_ms = lap.lap_ms();

    if perf_on {
        let stats = &mut sim.perf_stats;
        stats.reset();
        stats.index_ms = index_ms;
        stats.evaluate_ms = evaluate_ms;
        stats.integrate_ms = integrate_ms;
        stats.commit_ms = commit_ms;
        stats.particles_evaluated = particles_evaluated;
        stats.active_particles = sim.store.active_count() as u32;
        stats.neighbor_checks = neighbor_checks;
        stats.occupied_cells = sim.index.as_ref().map_or(0, |ix| ix.occupied_cells() as u32);
        stats.clamped_values = clamped;
        stats.meta_writes = meta_writes;
        stats.step_ms = step_start.elapsed_ms();
    }

    sim.frame += 1;
}
