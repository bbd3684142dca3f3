//! Spatial transform component

use crate::ecs::Component;
use crate::math::Vec2;

/// Position, rotation and scale in 2D space.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in world space.
    pub position: Vec2,

    /// Rotation in radians.
    pub rotation: f64,

    /// Scale factors.
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
        }
    }
}

/// Transform component with the previous-step snapshot Verlet integration
/// derives velocity from.
///
/// `prev` is rewritten by the integrator immediately before it applies the
/// new velocity, so `position - prev.position` always reads as the
/// displacement of the last completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Current position in world space.
    pub position: Vec2,

    /// Current rotation in radians.
    pub rotation: f64,

    /// Current scale factors.
    pub scale: Vec2,

    /// Snapshot of the previous step's transform.
    pub prev: Transform,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformComponent {
    /// Create an identity transform with `prev` matching the current values.
    pub fn new() -> Self {
        let current = Transform::default();
        Self {
            position: current.position,
            rotation: current.rotation,
            scale: current.scale,
            prev: current,
        }
    }

    /// Create a transform at `position`, with `prev` matching.
    pub fn at(position: Vec2) -> Self {
        Self::new().with_position(position)
    }

    /// Builder pattern: set position and its `prev` snapshot.
    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self.prev.position = position;
        self
    }

    /// Builder pattern: set rotation and its `prev` snapshot.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self.prev.rotation = rotation;
        self
    }

    /// Builder pattern: set scale and its `prev` snapshot.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self.prev.scale = scale;
        self
    }

    /// Builder pattern: set a uniform scale.
    #[must_use]
    pub fn with_uniform_scale(self, scale: f64) -> Self {
        self.with_scale(Vec2::new(scale, scale))
    }

    /// The current transform without its history.
    pub fn current(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Overwrite `prev` with the current values.
    pub fn snapshot_prev(&mut self) {
        self.prev = self.current();
    }
}

impl Component for TransformComponent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_keep_prev_in_sync() {
        let transform = TransformComponent::at(Vec2::new(3.0, 4.0)).with_rotation(1.5);
        assert_eq!(transform.position, transform.prev.position);
        assert_eq!(transform.rotation, transform.prev.rotation);
    }

    #[test]
    fn snapshot_prev_captures_current_values() {
        let mut transform = TransformComponent::new();
        transform.position = Vec2::new(10.0, -2.0);
        transform.rotation = 0.5;

        transform.snapshot_prev();

        assert_eq!(transform.prev.position, Vec2::new(10.0, -2.0));
        assert_eq!(transform.prev.rotation, 0.5);
    }
}
