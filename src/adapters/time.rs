//! Millisecond tick source.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` (microseconds since
//!   boot, monotonic), truncated to a wrapping `u32` millisecond count.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` anchored at the
//!   first call, for host-side simulation.
//!
//! [`millis`] has the [`TickFn`](crate::tick::TickFn) signature, so it can
//! be handed straight to the button driver.

/// Milliseconds since boot, wrapping at `u32::MAX`.
#[cfg(target_os = "espidf")]
pub fn millis() -> u32 {
    ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1000) as u32
}

/// Milliseconds since the first call, wrapping at `u32::MAX`.
#[cfg(not(target_os = "espidf"))]
pub fn millis() -> u32 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis() as u32
}
