//! Physical body component

use crate::ecs::{Component, Entity, WeakEntity};
use crate::math::Vec2;

use super::TransformComponent;

/// Physical parameters for Verlet-integrated entities.
///
/// `friction` is a *retention* factor, not a drag coefficient: the integrator
/// multiplies the previous step's implicit velocity by it element-wise, so
/// `(0, 0)` discards all prior motion every step and `(1, 1)` retains it
/// fully.
pub struct BodyComponent {
    /// Whether gravity applies to this body.
    pub gravity: bool,

    /// Element-wise retention factor for the previous step's velocity.
    pub friction: Vec2,

    /// Static bodies are exempt from gravity forcing.
    pub is_static: bool,

    entity: Option<WeakEntity>,
}

impl Default for BodyComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyComponent {
    /// Create a dynamic body with gravity enabled and zero friction.
    pub fn new() -> Self {
        Self {
            gravity: true,
            friction: Vec2::zeros(),
            is_static: false,
            entity: None,
        }
    }

    /// Builder pattern: set the gravity flag.
    #[must_use]
    pub fn with_gravity(mut self, gravity: bool) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder pattern: set the friction retention vector.
    #[must_use]
    pub fn with_friction(mut self, friction: Vec2) -> Self {
        self.friction = friction;
        self
    }

    /// Builder pattern: mark the body static.
    #[must_use]
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// The entity this body is attached to, if still alive.
    pub fn entity(&self) -> Option<Entity> {
        self.entity.as_ref().and_then(WeakEntity::upgrade)
    }

    /// The implicit velocity of the owning entity's transform.
    ///
    /// Derived as `position - prev.position`; degrades to a zero vector when
    /// the body is detached or the entity holds no transform.
    pub fn velocity(&self) -> Vec2 {
        if let Some(entity) = self.entity() {
            if let Some(cell) = entity.get_component::<TransformComponent>() {
                if let Some(transform) = cell.borrow::<TransformComponent>() {
                    return transform.position - transform.prev.position;
                }
            }
        }
        Vec2::zeros()
    }

    /// Rewrite the transform's `prev.position` so the next derived velocity
    /// equals `velocity`. A no-op without an attached transform.
    pub fn set_velocity(&self, velocity: Vec2) {
        if let Some(entity) = self.entity() {
            if let Some(cell) = entity.get_component::<TransformComponent>() {
                if let Some(mut transform) = cell.borrow_mut::<TransformComponent>() {
                    transform.prev.position = transform.position - velocity;
                }
            }
        }
    }
}

impl Component for BodyComponent {
    fn on_add(&mut self, entity: &Entity) {
        self.entity = Some(entity.downgrade());
    }

    fn on_remove(&mut self, _entity: &Entity) {
        self.entity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_without_transform_degrades_to_zero() {
        let body = BodyComponent::new();
        assert_eq!(body.velocity(), Vec2::zeros());
    }

    #[test]
    fn velocity_reads_the_transform_displacement() {
        let entity = Entity::new("mover");
        let body_cell = entity.add_component(BodyComponent::new());
        entity.add_component(
            TransformComponent::at(Vec2::new(5.0, 5.0)),
        );
        entity
            .get_component::<TransformComponent>()
            .unwrap()
            .borrow_mut::<TransformComponent>()
            .unwrap()
            .position = Vec2::new(8.0, 4.0);

        let body = body_cell.borrow::<BodyComponent>().unwrap();
        assert_eq!(body.velocity(), Vec2::new(3.0, -1.0));
    }

    #[test]
    fn set_velocity_roundtrips_through_prev_position() {
        let entity = Entity::new("mover");
        let body_cell = entity.add_component(BodyComponent::new());
        entity.add_component(TransformComponent::at(Vec2::new(1.0, 1.0)));

        let body = body_cell.borrow::<BodyComponent>().unwrap();
        body.set_velocity(Vec2::new(0.5, -0.25));
        assert_eq!(body.velocity(), Vec2::new(0.5, -0.25));
    }

    #[test]
    fn detached_body_loses_its_entity() {
        let entity = Entity::new("mover");
        let body_cell = entity.add_component(BodyComponent::new());
        entity.remove_component::<BodyComponent>();

        let body = body_cell.borrow::<BodyComponent>().unwrap();
        assert!(body.entity().is_none());
        assert_eq!(body.velocity(), Vec2::zeros());
    }
}
