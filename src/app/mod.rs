//! Application core: pure domain logic, zero I/O.
//!
//! The gesture composer, inbound command handling, the outbound message
//! queue and the [`service::HammerService`] that runs one control pass.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod gesture;
pub mod outbound;
pub mod ports;
pub mod service;
