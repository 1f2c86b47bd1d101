//! Particle storage (SoA).
//!
//! Identity is the creation-order index. The particle count is fixed at
//! construction; indices are never reused or reassigned.

use std::collections::HashMap;

use glam::Vec3;

use crate::core::vector::{flatten, is_supported_dims, point_from_slice};
use crate::core::{EngineError, EngineResult};

pub type MetaMap = HashMap<String, String>;

#[derive(Debug)]
pub struct ParticleStore {
    dims: usize,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    meta: Vec<MetaMap>,
    active: Vec<bool>,
}

impl ParticleStore {
    /// Build N = len / dims particles in buffer order, at rest, with empty metadata.
    pub fn create(flat_positions: &[f32], dims: usize) -> EngineResult<Self> {
        if !is_supported_dims(dims) {
            return Err(EngineError::config(
                "dims",
                format!("dimensionality must be 2 or 3, got {}", dims),
            ));
        }
        if flat_positions.len() % dims != 0 {
            return Err(EngineError::config(
                "positions",
                format!(
                    "buffer length {} is not a multiple of dims {}",
                    flat_positions.len(),
                    dims
                ),
            ));
        }
        if let Some(bad) = flat_positions.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::config(
                format!("positions[{}]", bad),
                "coordinates must be finite",
            ));
        }

        let positions: Vec<Vec3> = flat_positions.chunks_exact(dims).map(point_from_slice).collect();
        let count = positions.len();

        Ok(Self {
            dims,
            positions,
            velocities: vec![Vec3::ZERO; count],
            meta: vec![MetaMap::new(); count],
            active: vec![true; count],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    #[inline]
    pub fn active_flags(&self) -> &[bool] {
        &self.active
    }

    #[inline]
    pub fn metadata(&self, index: usize) -> &MetaMap {
        &self.meta[index]
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    fn check_index(&self, index: usize) -> EngineResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(EngineError::Index {
                index,
                count: self.len(),
            })
        }
    }

    pub fn set_meta(&mut self, index: usize, key: impl Into<String>, value: impl Into<String>) -> EngineResult<()> {
        self.check_index(index)?;
        self.meta[index].insert(key.into(), value.into());
        Ok(())
    }

    pub fn meta_value(&self, index: usize, key: &str) -> EngineResult<Option<&str>> {
        self.check_index(index)?;
        Ok(self.meta[index].get(key).map(String::as_str))
    }

    pub fn is_active(&self, index: usize) -> EngineResult<bool> {
        self.check_index(index)?;
        Ok(self.active[index])
    }

    pub fn velocity(&self, index: usize) -> EngineResult<Vec3> {
        self.check_index(index)?;
        Ok(self.velocities[index])
    }

    /// Positions as of the last committed tick, flattened to `dims` components.
    pub fn snapshot_positions(&self) -> Vec<f32> {
        flatten(&self.positions, self.dims)
    }

    /// Replace positions, velocities and active flags for the whole store at once.
    pub fn commit(&mut self, positions: Vec<Vec3>, velocities: Vec<Vec3>, active: Vec<bool>) {
        assert_eq!(positions.len(), self.len(), "commit: position count mismatch");
        assert_eq!(velocities.len(), self.len(), "commit: velocity count mismatch");
        assert_eq!(active.len(), self.len(), "commit: active flag count mismatch");
        self.positions = positions;
        self.velocities = velocities;
        self.active = active;
    }

    /// Swap in the metadata a particle ended its tick with.
    pub(crate) fn replace_meta(&mut self, index: usize, meta: MetaMap) {
        self.meta[index] = meta;
    }
}
