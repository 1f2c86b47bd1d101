//! Per-particle behaviour evaluation.
//!
//! One traversal of the tree per active particle per tick. Everything read
//! comes from the frozen store (positions, neighbour metadata, active flags);
//! everything produced goes into that particle's own [`ParticleOutcome`].
//! The only state a traversal mutates is its private copy of the particle's
//! metadata, so `Set` is visible to later nodes of the same traversal and to
//! nobody else until commit.

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{Behaviour, BehaviourTree, MetaMap, NodeId, ParticleStore};
use crate::spatial::SpatialIndex;

/// What one particle's traversal produced for the integrator.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleOutcome {
    pub force: Vec3,
    /// Product of every `(1 - f)` from Dampen nodes that ran.
    pub damping: f32,
    pub stopped: bool,
    /// Final metadata, present only when a `Set` ran.
    pub meta: Option<MetaMap>,
    pub evaluated: bool,
    pub neighbor_checks: u32,
}

impl ParticleOutcome {
    pub fn idle() -> Self {
        Self {
            force: Vec3::ZERO,
            damping: 1.0,
            stopped: false,
            meta: None,
            evaluated: false,
            neighbor_checks: 0,
        }
    }
}

struct Traversal<'s> {
    base: &'s MetaMap,
    local: Option<MetaMap>,
    out: ParticleOutcome,
}

impl<'s> Traversal<'s> {
    #[inline]
    fn meta(&self) -> &MetaMap {
        self.local.as_ref().unwrap_or(self.base)
    }

    fn set(&mut self, key: &str, value: &str) {
        let base = self.base;
        self.local
            .get_or_insert_with(|| base.clone())
            .insert(key.to_string(), value.to_string());
    }
}

pub struct Evaluator<'a> {
    tree: &'a BehaviourTree,
    store: &'a ParticleStore,
    index: Option<&'a SpatialIndex>,
    epsilon: f32,
}

impl<'a> Evaluator<'a> {
    /// `index` must have been rebuilt from `store.positions()`.
    pub fn new(
        tree: &'a BehaviourTree,
        store: &'a ParticleStore,
        index: Option<&'a SpatialIndex>,
        epsilon: f32,
    ) -> Self {
        Self {
            tree,
            store,
            index,
            epsilon,
        }
    }

    /// Evaluate every particle. Output slot `i` belongs to particle `i`.
    pub fn evaluate_all(&self, parallel: bool) -> Vec<ParticleOutcome> {
        let count = self.store.len();

        #[cfg(feature = "parallel")]
        {
            if parallel {
                return (0..count).into_par_iter().map(|i| self.evaluate(i)).collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = parallel;

        (0..count).map(|i| self.evaluate(i)).collect()
    }

    pub fn evaluate(&self, i: usize) -> ParticleOutcome {
        if !self.store.active_flags()[i] {
            return ParticleOutcome::idle();
        }

        let mut traversal = Traversal {
            base: self.store.metadata(i),
            local: None,
            out: ParticleOutcome {
                evaluated: true,
                ..ParticleOutcome::idle()
            },
        };
        self.run(i, self.tree.roots(), &mut traversal);

        let mut out = traversal.out;
        out.meta = traversal.local;
        out
    }

    fn run(&self, i: usize, ids: &[NodeId], t: &mut Traversal<'_>) {
        let positions = self.store.positions();
        let pos = positions[i];

        for &id in ids {
            let node = self.tree.node(id);
            match &node.behaviour {
                Behaviour::If { test } => {
                    if test.matches(t.meta()) {
                        self.run(i, &node.children, t);
                    }
                }

                Behaviour::Repel { force, point: Some(p), radius } => {
                    let d2 = pos.distance_squared(*p);
                    if radius.map_or(true, |r| d2 <= r * r) {
                        t.out.force += self.push(pos - *p, d2, *force);
                    }
                }
                Behaviour::Repel { force, point: None, radius: Some(r) } => {
                    let mut acc = Vec3::ZERO;
                    t.out.neighbor_checks += self.neighbors(pos, *r, |j, d2| {
                        if j != i {
                            acc += self.push(pos - positions[j], d2, *force);
                        }
                    });
                    t.out.force += acc;
                }

                Behaviour::Attract { force, point: Some(p), .. } => {
                    t.out.force += (*p - pos) * *force;
                }
                Behaviour::Attract { force, point: None, radius: Some(r) } => {
                    let mut acc = Vec3::ZERO;
                    t.out.neighbor_checks += self.neighbors(pos, *r, |j, _| {
                        if j != i {
                            acc += (positions[j] - pos) * *force;
                        }
                    });
                    t.out.force += acc;
                }

                // Rejected by the compiler; nothing to do.
                Behaviour::Repel { point: None, radius: None, .. }
                | Behaviour::Attract { point: None, radius: None, .. } => {}

                Behaviour::Dampen { factor } => {
                    t.out.damping *= 1.0 - *factor;
                }

                Behaviour::Collide { radius, test } => {
                    let mut hit = false;
                    t.out.neighbor_checks += self.neighbors(pos, *radius, |j, _| {
                        if !hit && j != i {
                            hit = test
                                .as_ref()
                                .map_or(true, |test| test.matches(self.store.metadata(j)));
                        }
                    });
                    if hit {
                        self.run(i, &node.children, t);
                    }
                }

                Behaviour::Set { key, value } => t.set(key, value),

                // Marks the terminal state; the rest of the traversal still runs.
                Behaviour::Stop => t.out.stopped = true,
            }
        }
    }

    /// Inverse-distance push along `delta`: magnitude `f / d`, `d` floored at epsilon.
    #[inline]
    fn push(&self, delta: Vec3, d2: f32, f: f32) -> Vec3 {
        let d = d2.sqrt().max(self.epsilon);
        delta * (f / (d * d))
    }

    fn neighbors(&self, center: Vec3, radius: f32, visit: impl FnMut(usize, f32)) -> u32 {
        let positions = self.store.positions();
        match self.index {
            Some(index) => index.for_each_within(positions, center, radius, visit),
            None => brute_force_within(positions, center, radius, visit),
        }
    }
}

fn brute_force_within(positions: &[Vec3], center: Vec3, radius: f32, mut visit: impl FnMut(usize, f32)) -> u32 {
    let r2 = radius * radius;
    for (j, p) in positions.iter().enumerate() {
        let d2 = p.distance_squared(center);
        if d2 <= r2 {
            visit(j, d2);
        }
    }
    positions.len() as u32
}
