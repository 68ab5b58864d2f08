//! Smart Hammer firmware library.
//!
//! Exposes the state machines, the application service and the adapters
//! for integration testing and host simulation.  All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod scheduler;
pub mod state;
pub mod tick;

pub mod adapters;
pub mod drivers;
pub mod sensors;
