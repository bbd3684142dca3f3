//! Built-in systems

pub mod verlet;

pub use verlet::VerletSystem;
