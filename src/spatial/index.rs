//! Uniform-grid spatial index.
//!
//! Space is cut into square (2D) or cubic (3D) cells whose edge is a multiple
//! of the largest neighbour radius in the behaviour tree. The index is rebuilt
//! from scratch every tick: bucketing N particles is O(N), and a radius query
//! scans the ring of cells around the query point and filters by exact
//! distance.
//!
//! Buckets are filled in particle order and cells are visited in a fixed
//! order, so queries report neighbours deterministically. That matters:
//! forces are summed in visit order and float addition is not associative.

use std::collections::HashMap;

use glam::Vec3;

use crate::domain::{BehaviourTree, EngineSettings};

type CellKey = (i32, i32, i32);

pub struct SpatialIndex {
    dims: usize,
    /// Cell edge; `0.0` means a single global bucket.
    cell_size: f32,
    inv_cell_size: f32,
    cells: HashMap<CellKey, Vec<u32>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(dims: usize, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            0.0
        };
        let inv_cell_size = if cell_size > 0.0 { 1.0 / cell_size } else { 0.0 };
        Self {
            dims,
            cell_size,
            inv_cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Index sized for `tree`, or `None` when no node queries neighbours.
    pub fn for_tree(tree: &BehaviourTree, settings: &EngineSettings) -> Option<Self> {
        let radius = tree.max_neighbor_radius()?;
        Some(Self::new(tree.dims(), radius * settings.cell_size_factor))
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.cell_size == 0.0
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn key(&self, p: Vec3) -> CellKey {
        if self.is_global() {
            return (0, 0, 0);
        }
        // `as` saturates, so far-away points clamp into edge cells.
        let cx = (p.x * self.inv_cell_size).floor() as i32;
        let cy = (p.y * self.inv_cell_size).floor() as i32;
        let cz = if self.dims == 3 {
            (p.z * self.inv_cell_size).floor() as i32
        } else {
            0
        };
        (cx, cy, cz)
    }

    /// Re-bucket every particle. Allocations of cells that stay occupied are reused.
    pub fn rebuild(&mut self, positions: &[Vec3]) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        for (i, p) in positions.iter().enumerate() {
            let key = self.key(*p);
            self.cells.entry(key).or_default().push(i as u32);
        }
        self.cells.retain(|_, bucket| !bucket.is_empty());
        self.len = positions.len();
    }

    /// Visit every particle within `radius` of `center` as `(index, distance²)`.
    ///
    /// `positions` must be the slice the index was last rebuilt from.
    /// Returns how many candidates were distance-tested.
    pub fn for_each_within(
        &self,
        positions: &[Vec3],
        center: Vec3,
        radius: f32,
        mut visit: impl FnMut(usize, f32),
    ) -> u32 {
        debug_assert_eq!(positions.len(), self.len, "index is stale");
        let r2 = radius * radius;
        let mut tested = 0u32;

        let mut test = |i: usize| {
            tested += 1;
            let d2 = positions[i].distance_squared(center);
            if d2 <= r2 {
                visit(i, d2);
            }
        };

        if self.is_global() {
            if let Some(bucket) = self.cells.get(&(0, 0, 0)) {
                for &i in bucket {
                    test(i as usize);
                }
            }
            return tested;
        }

        let span = (radius * self.inv_cell_size).ceil().max(0.0);
        let span_z = if self.dims == 3 { span } else { 0.0 };
        let ring_cells = (2.0 * span + 1.0) * (2.0 * span + 1.0) * (2.0 * span_z + 1.0);

        if ring_cells > self.cells.len() as f32 {
            // Ring is larger than the occupied grid: a straight scan is cheaper.
            for i in 0..positions.len() {
                test(i);
            }
            return tested;
        }

        let span = span as i32;
        let span_z = span_z as i32;
        let (cx, cy, cz) = self.key(center);
        for dz in -span_z..=span_z {
            for dy in -span..=span {
                for dx in -span..=span {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    if let Some(bucket) = self.cells.get(&key) {
                        for &i in bucket {
                            test(i as usize);
                        }
                    }
                }
            }
        }
        tested
    }

    /// All particle indices within `radius` of `center`.
    pub fn within(&self, positions: &[Vec3], center: Vec3, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_within(positions, center, radius, |i, _| out.push(i));
        out
    }

    /// All particle indices within `radius` of particle `index`, excluding itself.
    pub fn neighbors_of(&self, positions: &[Vec3], index: usize, radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_within(positions, positions[index], radius, |j, _| {
            if j != index {
                out.push(j);
            }
        });
        out
    }
}
