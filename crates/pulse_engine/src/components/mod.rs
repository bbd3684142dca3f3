//! Built-in components

pub mod body;
pub mod transform;

pub use body::BodyComponent;
pub use transform::{Transform, TransformComponent};
