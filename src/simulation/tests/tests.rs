use serde_json::json;

use super::*;
use crate::core::EngineError;

fn dla_tree(target: [f32; 2], collide_r: f32) -> Value {
    json!([
        ["if", { "test": ["!=", "static", "true"] }, [
            ["attract", { "p": target, "f": 0.1 }],
            ["collide", { "r": collide_r, "test": ["==", "static", "true"] }, [
                ["set", { "key": "static", "value": "true" }],
                ["stop"]
            ]]
        ]]
    ])
}

fn sequential(sim: &mut SimulationCore) {
    sim.set_parallel(false);
}

#[test]
fn get_before_step_returns_input_buffer_exactly() {
    let input = [0.1f32, 0.2, 300.5, -1e-6, 7.25, 1e6];
    let sim = SimulationCore::new(&input, 2, &json!([["dampen", { "f": 0.1 }]])).unwrap();
    assert_eq!(sim.get(), input.to_vec());

    let sim3 = SimulationCore::new(&input, 3, &json!([])).unwrap();
    assert_eq!(sim3.get(), input.to_vec());
}

#[test]
fn point_attraction_arithmetic() {
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 0.0], 2, &json!([["attract", { "p": [0, 0], "f": 0.1 }]])).unwrap();
    sim.step();

    let out = sim.get();
    assert_eq!(&out[0..2], &[0.0, 0.0]);
    assert!((out[2] - 0.9).abs() < 1e-6);
    assert_eq!(out[3], 0.0);

    let v = sim.store().velocity(1).unwrap();
    assert!((v.x + 0.1).abs() < 1e-6);
    assert_eq!(v.y, 0.0);
}

#[test]
fn collide_triggers_set_and_stop() {
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 0.0], 2, &dla_tree([0.0, 0.0], 2.0)).unwrap();
    sim.set_meta(0, "static", "true").unwrap();

    sim.step();
    assert_eq!(sim.get_meta(1, "static").unwrap(), Some("true"));
    assert!(!sim.is_active(1).unwrap());
    let frozen = sim.get();

    for _ in 0..10 {
        sim.step();
    }
    assert_eq!(sim.get(), frozen);
}

#[test]
fn freeze_invariant_holds_bitwise_for_every_stopped_particle() {
    // Seed at the origin, a ring of walkers drifting inward.
    let mut flat = vec![0.0f32, 0.0];
    for k in 0..64 {
        let angle = k as f32 * 0.0981;
        let r = 30.0 + (k % 7) as f32 * 4.0;
        flat.push(angle.cos() * r);
        flat.push(angle.sin() * r);
    }
    let tree = json!([
        ["if", { "test": ["!=", "static", "true"] }, [
            ["attract", { "p": [0, 0], "f": 0.05 }],
            ["dampen", { "f": 0.2 }],
            ["collide", { "r": 1.5, "test": ["==", "static", "true"] }, [
                ["set", { "key": "static", "value": "true" }],
                ["stop"]
            ]]
        ]]
    ]);
    let mut sim = SimulationCore::new(&flat, 2, &tree).unwrap();
    sim.set_meta(0, "static", "true").unwrap();

    let mut frozen_at: Vec<Option<Vec<u32>>> = vec![None; sim.particle_count()];
    for _ in 0..200 {
        sim.step();
        let out = sim.get();
        for (i, slot) in frozen_at.iter_mut().enumerate() {
            let bits: Vec<u32> = out[i * 2..i * 2 + 2].iter().map(|v| v.to_bits()).collect();
            match slot {
                Some(expected) => assert_eq!(*expected, bits, "particle {} moved after stopping", i),
                None => {
                    if !sim.is_active(i).unwrap() {
                        *slot = Some(bits);
                    }
                }
            }
        }
    }

    assert!(frozen_at.iter().any(Option::is_some), "aggregate never grew");
}

#[test]
fn idle_invariant_with_dampen_only() {
    let input: Vec<f32> = (0..30).map(|i| i as f32 * 1.5).collect();
    let mut sim = SimulationCore::new(&input, 3, &json!([["dampen", { "f": 0.3 }], ["dampen", { "f": 1.0 }]])).unwrap();
    for _ in 0..25 {
        sim.step();
    }
    assert_eq!(sim.get(), input);
    assert_eq!(sim.frame(), 25);
}

#[test]
fn get_if_matching_everything_equals_get() {
    let mut sim = SimulationCore::new(
        &[0.0, 0.0, 10.0, 0.0, 0.0, 10.0],
        2,
        &json!([["repel", { "f": 0.5, "r": 20.0 }], ["dampen", { "f": 0.2 }]]),
    )
    .unwrap();
    sim.step();
    sim.step();

    let all = Predicate::not_equals("never-set", "x");
    assert_eq!(sim.get_if(&all), sim.get());
}

#[test]
fn get_if_returns_matching_subset_in_creation_order() {
    let mut sim = SimulationCore::new(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0], 2, &json!([])).unwrap();
    sim.set_meta(3, "kind", "a").unwrap();
    sim.set_meta(1, "kind", "a").unwrap();
    sim.set_meta(2, "kind", "b").unwrap();

    assert_eq!(sim.get_if(&Predicate::equals("kind", "a")), vec![2.0, 2.0, 4.0, 4.0]);
    assert_eq!(sim.get_if(&Predicate::not_equals("kind", "a")), vec![1.0, 1.0, 3.0, 3.0]);
    assert!(sim.get_if(&Predicate::equals("kind", "c")).is_empty());
}

#[test]
fn construction_rejects_unknown_kind() {
    let err = SimulationCore::new(&[0.0, 0.0], 2, &json!([["warp", {}]])).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
fn construction_rejects_ragged_positions() {
    let err = SimulationCore::new(&[0.0, 0.0, 1.0], 2, &json!([])).err().unwrap();
    assert!(err.is_configuration());
    assert!(SimulationCore::from_json(&[0.0, 0.0], 2, "[[\"stop\"").is_err());
}

#[test]
fn set_meta_out_of_range_leaves_state_untouched() {
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 1.0], 2, &json!([])).unwrap();
    let err = sim.set_meta(2, "static", "true").unwrap_err();
    assert_eq!(err, EngineError::Index { index: 2, count: 2 });
    assert_eq!(sim.get_meta(0, "static").unwrap(), None);
    assert_eq!(sim.get_meta(1, "static").unwrap(), None);
    assert!(sim.get_meta(9, "static").unwrap_err().is_index());
}

#[test]
fn replace_behaviours_is_all_or_nothing() {
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 0.0], 2, &json!([["attract", { "p": [0, 0], "f": 0.1 }]])).unwrap();
    assert_eq!(sim.cell_size(), None);

    let err = sim.replace_behaviours(&json!([["repel", { "f": 1, "r": 2 }], ["warp"]])).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(sim.behaviours().len(), 1);

    sim.replace_behaviours_json(r#"[["repel", { "f": 1, "r": 2 }]]"#).unwrap();
    assert_eq!(sim.behaviours().len(), 1);
    assert_eq!(sim.cell_size(), Some(4.0));

    sim.step();
    let out = sim.get();
    assert!(out[0] < 0.0 && out[2] > 1.0, "particles should repel: {:?}", out);
}

#[test]
fn metadata_written_in_a_tick_is_invisible_to_neighbours_until_commit() {
    // Particle 0 is static; 1 touches 0, 2 touches only 1. After one tick 1 is
    // static, but 2 saw 1's pre-tick metadata and must not have stuck yet.
    let tree = json!([
        ["if", { "test": ["!=", "static", "true"] }, [
            ["collide", { "r": 1.1, "test": ["==", "static", "true"] }, [
                ["set", { "key": "static", "value": "true" }],
                ["stop"]
            ]]
        ]]
    ]);
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 0.0, 2.0, 0.0], 2, &tree).unwrap();
    sim.set_meta(0, "static", "true").unwrap();

    sim.step();
    assert_eq!(sim.get_meta(1, "static").unwrap(), Some("true"));
    assert_eq!(sim.get_meta(2, "static").unwrap(), None);

    sim.step();
    assert_eq!(sim.get_meta(2, "static").unwrap(), Some("true"));
}

#[test]
fn parallel_and_sequential_runs_are_identical() {
    let flat: Vec<f32> = (0..900).map(|i| ((i * 7919) % 503) as f32 * 0.5).collect();
    let tree = json!([
        ["repel", { "f": 0.3, "r": 12.0 }],
        ["attract", { "p": [120, 120, 120], "f": 0.01 }],
        ["dampen", { "f": 0.1 }]
    ]);

    let mut a = SimulationCore::new(&flat, 3, &tree).unwrap();
    let mut b = SimulationCore::new(&flat, 3, &tree).unwrap();
    sequential(&mut b);
    for _ in 0..5 {
        a.step();
        b.step();
    }
    assert_eq!(a.get(), b.get());
}

#[test]
fn coincident_particles_stay_finite() {
    let mut sim = SimulationCore::new(
        &[5.0, 5.0, 5.0, 5.0, 5.0, 5.0],
        2,
        &json!([["repel", { "f": 10.0, "r": 1.0 }]]),
    )
    .unwrap();
    for _ in 0..5 {
        sim.step();
        assert!(sim.get().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn perf_metrics_are_zero_until_enabled() {
    let mut sim = SimulationCore::new(&[0.0, 0.0, 1.0, 0.0], 2, &json!([["repel", { "f": 0.1, "r": 5.0 }]])).unwrap();
    sim.step();
    assert_eq!(sim.get_perf_stats(), PerfStats::default());

    sim.enable_perf_metrics(true);
    sim.step();
    let stats = sim.get_perf_stats();
    assert_eq!(stats.particles_evaluated(), 2);
    assert_eq!(stats.active_particles(), 2);
    assert!(stats.neighbor_checks() >= 2);
    assert_eq!(stats.occupied_cells(), 1);
    assert!(stats.step_ms() >= 0.0);
}

#[test]
fn custom_settings_change_cell_size() {
    let settings = EngineSettings {
        cell_size_factor: 3.0,
        ..EngineSettings::default()
    };
    let sim = SimulationCore::with_settings(&[0.0, 0.0], 2, &json!([["collide", { "r": 5.0 }]]), settings).unwrap();
    assert_eq!(sim.cell_size(), Some(15.0));

    let bad = EngineSettings {
        distance_epsilon: 0.0,
        ..EngineSettings::default()
    };
    assert!(SimulationCore::with_settings(&[0.0, 0.0], 2, &json!([]), bad).is_err());
}
