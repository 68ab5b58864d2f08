//! Sensor subsystem: the LSM6DSL accelerometer and the hit detector that
//! consumes its dominant axis.

pub mod accel;
pub mod hit_detector;

pub use accel::{AccelSample, Lsm6dsl};
pub use hit_detector::{HitDetector, HitState};
