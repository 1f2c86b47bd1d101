//! Per-tick systems: behaviour evaluation, then integration.

pub mod evaluate;
pub mod integrate;

pub use evaluate::{Evaluator, ParticleOutcome};
pub use integrate::{integrate, integrate_particle, Integrated};
