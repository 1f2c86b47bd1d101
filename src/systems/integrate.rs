//! Position integration (unit mass, dt = 1).

use glam::Vec3;

use crate::domain::ParticleStore;

use super::evaluate::ParticleOutcome;

/// Next-tick state for every particle, ready to commit.
pub struct Integrated {
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub active: Vec<bool>,
    /// Particles whose update went non-finite and were held at their old state.
    pub clamped: u32,
}

/// Advance one particle.
///
/// Returns `(position, velocity, active, clamped)`.
#[inline]
pub fn integrate_particle(
    position: Vec3,
    velocity: Vec3,
    active: bool,
    outcome: &ParticleOutcome,
) -> (Vec3, Vec3, bool, bool) {
    if !active || outcome.stopped {
        return (position, Vec3::ZERO, false, false);
    }

    let next_velocity = velocity * outcome.damping + outcome.force;
    let next_position = position + next_velocity;

    if next_velocity.is_finite() && next_position.is_finite() {
        (next_position, next_velocity, true, false)
    } else {
        (position, velocity, true, true)
    }
}

/// Integrate the whole store from its frozen state and the evaluator outcomes.
pub fn integrate(store: &ParticleStore, outcomes: &[ParticleOutcome]) -> Integrated {
    debug_assert_eq!(store.len(), outcomes.len());

    let count = store.len();
    let mut out = Integrated {
        positions: Vec::with_capacity(count),
        velocities: Vec::with_capacity(count),
        active: Vec::with_capacity(count),
        clamped: 0,
    };

    let states = store
        .positions()
        .iter()
        .zip(store.velocities())
        .zip(store.active_flags());

    for (((position, velocity), active), outcome) in states.zip(outcomes) {
        let (p, v, a, clamped) = integrate_particle(*position, *velocity, *active, outcome);
        out.positions.push(p);
        out.velocities.push(v);
        out.active.push(a);
        if clamped {
            out.clamped += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(force: Vec3, damping: f32, stopped: bool) -> ParticleOutcome {
        ParticleOutcome {
            force,
            damping,
            stopped,
            evaluated: true,
            ..ParticleOutcome::idle()
        }
    }

    #[test]
    fn velocity_is_damped_then_forced() {
        let (p, v, active, clamped) = integrate_particle(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            true,
            &outcome(Vec3::new(0.0, 1.0, 0.0), 0.5, false),
        );
        assert_eq!(v, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(p, Vec3::new(2.0, 1.0, 0.0));
        assert!(active);
        assert!(!clamped);
    }

    #[test]
    fn stopped_particles_freeze_in_place() {
        let (p, v, active, _) = integrate_particle(
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            true,
            &outcome(Vec3::new(5.0, 5.0, 0.0), 1.0, true),
        );
        assert_eq!(p, Vec3::new(3.0, 4.0, 0.0));
        assert_eq!(v, Vec3::ZERO);
        assert!(!active);
    }

    #[test]
    fn inactive_particles_never_move() {
        let (p, v, active, _) = integrate_particle(
            Vec3::ONE,
            Vec3::ZERO,
            false,
            &outcome(Vec3::new(9.0, 9.0, 9.0), 1.0, false),
        );
        assert_eq!(p, Vec3::ONE);
        assert_eq!(v, Vec3::ZERO);
        assert!(!active);
    }

    #[test]
    fn non_finite_results_are_clamped_to_previous_state() {
        let (p, v, active, clamped) = integrate_particle(
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            true,
            &outcome(Vec3::new(f32::INFINITY, 0.0, 0.0), 1.0, false),
        );
        assert_eq!(p, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(v, Vec3::new(0.5, 0.0, 0.0));
        assert!(active);
        assert!(clamped);
    }

    #[test]
    fn position_overflow_is_clamped_too() {
        let start = Vec3::new(f32::MAX, 0.0, 0.0);
        let (p, v, _, clamped) = integrate_particle(
            start,
            Vec3::ZERO,
            true,
            &outcome(Vec3::new(f32::MAX, 0.0, 0.0), 1.0, false),
        );
        assert!(clamped);
        assert_eq!(p, start);
        assert_eq!(v, Vec3::ZERO);
    }
}
