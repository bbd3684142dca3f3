//! Math utilities and types
//!
//! Provides the fundamental math types for the 2D simulation core.

pub use nalgebra::Vector2;

/// 2D vector type
///
/// `f64` because engine time is millisecond-valued and the fixed-step
/// accumulator needs the precision headroom.
pub type Vec2 = Vector2<f64>;

/// Clamp a velocity axis to `max`, preserving sign.
///
/// A zero velocity has no sign and stays at zero; callers disable clamping
/// for an axis by passing a zero `max` (checked at the call site, not here).
pub(crate) fn clamp_axis(value: f64, max: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value.abs().min(max) * value.signum()
    }
}
