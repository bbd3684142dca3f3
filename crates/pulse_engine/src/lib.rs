//! # Pulse Engine
//!
//! A small, single-threaded real-time simulation core: an
//! entity-component-system with query-indexed dispatch, a fixed-timestep
//! update loop, scene lifecycle management and a Verlet-integration physics
//! step.
//!
//! ## Features
//!
//! - **Query-indexed ECS**: each system declares a fixed component query and
//!   receives its pre-indexed entity set every phase
//! - **Fixed-timestep loop**: a time accumulator decouples physics step size
//!   from frame rate
//! - **Scene lifecycle**: isolated entity sets sharing one system pipeline,
//!   with typed event channels at every phase boundary
//! - **Verlet physics**: position-only integration with friction retention
//!   and per-axis velocity clamping
//! - **Opaque renderer**: drawing is threaded through as a caller-defined
//!   type parameter, never interpreted
//!
//! ## Quick Start
//!
//! ```rust
//! use pulse_engine::prelude::*;
//!
//! let mut engine: Engine = Engine::new(EngineArgs::default());
//!
//! let ball = engine.create_entity("ball");
//! ball.add_component(TransformComponent::at(Vec2::new(0.0, 0.0)));
//! ball.add_component(BodyComponent::new().with_friction(Vec2::new(1.0, 1.0)));
//!
//! engine.register_scene("level", move |scene| {
//!     scene.add_entity(&ball);
//! });
//! engine.start("level").unwrap();
//!
//! // The host loop supplies monotonic time and a renderer.
//! engine.update(16.0);
//! engine.update(33.0);
//! engine.draw(&mut ());
//! ```

#![warn(missing_docs)]

pub mod components;
pub mod config;
pub mod ecs;
pub mod events;
pub mod math;
pub mod scene;
pub mod systems;

mod engine;

pub use engine::{
    Engine, EngineArgs, EngineError, EngineEvents, SceneChange, SharedScene, Timer, TimerHandle,
};
pub use scene::{Scene, SceneEvents};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components::{BodyComponent, Transform, TransformComponent},
        config::{Config, EngineSettings, PhysicsSettings},
        ecs::{
            shared, Component, ComponentCell, Entity, EntityId, Phases, Query, QueryResults,
            System, SystemHandle, SystemId, UpdateEvent, WeakEntity,
        },
        events::{Channel, ListenerHandle},
        math::Vec2,
        systems::VerletSystem,
        Engine, EngineArgs, EngineError, Scene, SceneChange, SceneEvents, Timer, TimerHandle,
    };
}
