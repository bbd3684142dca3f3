//! Verlet integration system

use crate::components::{BodyComponent, TransformComponent};
use crate::config::PhysicsSettings;
use crate::ecs::{Phases, Query, QueryResults, System, UpdateEvent};
use crate::math::{clamp_axis, Vec2};

/// Position-only physics integrator over `(BodyComponent,
/// TransformComponent)` pairs.
///
/// Velocity is never stored: each fixed step derives it as `position -
/// prev.position`, damps it by the body's friction retention vector, adds the
/// gravity term for non-static gravity-enabled bodies, clamps it per axis,
/// snapshots `prev` and only then applies the velocity. The snapshot-then-add
/// ordering is what makes the position difference read as "last step's
/// velocity" on the next tick.
///
/// The gravity term is `gravity * dt^2 * 1_000_000` with millisecond-valued
/// `dt`; the scaling looks like mixed seconds/milliseconds units but changing
/// it would change every existing simulation, so it stays. Clamping keeps the
/// raw accelerations bounded.
pub struct VerletSystem {
    query: Query,

    /// Gravity vector applied to non-static bodies.
    pub gravity: Vec2,

    /// Per-axis velocity clamp; a zero component disables clamping on that
    /// axis.
    pub max_velocity: Vec2,
}

impl Default for VerletSystem {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 0.01), Vec2::new(100.0, 100.0))
    }
}

impl VerletSystem {
    /// Create an integrator with explicit gravity and clamp parameters.
    pub fn new(gravity: Vec2, max_velocity: Vec2) -> Self {
        Self {
            query: Query::new().with::<BodyComponent>().with::<TransformComponent>(),
            gravity,
            max_velocity,
        }
    }

    /// Create an integrator from file-loadable physics settings.
    pub fn from_settings(settings: &PhysicsSettings) -> Self {
        Self::new(
            Vec2::new(settings.gravity[0], settings.gravity[1]),
            Vec2::new(settings.max_velocity[0], settings.max_velocity[1]),
        )
    }
}

impl<R: 'static> System<R> for VerletSystem {
    fn query(&self) -> &Query {
        &self.query
    }

    fn phases(&self) -> Phases {
        Phases::FIXED_UPDATE
    }

    fn fixed_update(&mut self, entities: &QueryResults, ev: &UpdateEvent) {
        for (_entity, components) in entities.iter() {
            let (Some(body_cell), Some(transform_cell)) =
                (components.first(), components.get(1))
            else {
                continue;
            };
            let Some(body) = body_cell.borrow::<BodyComponent>() else {
                continue;
            };
            let Some(mut transform) = transform_cell.borrow_mut::<TransformComponent>() else {
                continue;
            };

            // Friction retains (not drags) the previous step's displacement.
            let mut velocity = (transform.position - transform.prev.position)
                .component_mul(&body.friction);

            if body.gravity && !body.is_static {
                velocity += self.gravity * (ev.dt * ev.dt) * 1_000_000.0;
            }

            if self.max_velocity.x != 0.0 {
                velocity.x = clamp_axis(velocity.x, self.max_velocity.x);
            }
            if self.max_velocity.y != 0.0 {
                velocity.y = clamp_axis(velocity.y, self.max_velocity.y);
            }

            // Snapshot before applying, so the next step's position delta is
            // exactly the velocity applied here.
            transform.snapshot_prev();
            transform.position += velocity;
        }
    }
}
