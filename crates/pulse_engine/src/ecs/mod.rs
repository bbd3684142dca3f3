//! Entity-Component-System core
//!
//! Entities are typed, named containers of components; systems declare a
//! fixed component query and receive a pre-indexed entity set each phase; the
//! [`EntityManager`] keeps those per-query indices correct as entities enter
//! and leave a scene.

pub mod component;
pub mod entity;
pub mod manager;
pub mod query;
pub mod system;

pub use component::{Component, ComponentCell};
pub use entity::{Entity, EntityEvents, EntityId, WeakEntity};
pub use manager::EntityManager;
pub use query::{Query, QueryResults};
pub use system::{shared, Phases, SharedSystem, System, SystemHandle, SystemId, UpdateEvent};
