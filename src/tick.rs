//! Millisecond tick arithmetic.
//!
//! Every timer in the firmware stores a `u32` millisecond timestamp taken
//! from a [`TickFn`] and compares it with [`elapsed_ms`].  The counter wraps
//! after ~49.7 days; `wrapping_sub` keeps intervals correct across the wrap
//! as long as no single interval exceeds `u32::MAX` ms.

/// Monotonic millisecond tick provider.
pub type TickFn = fn() -> u32;

/// Milliseconds from `start` to `now`, tolerant of counter wraparound.
#[inline]
pub fn elapsed_ms(now: u32, start: u32) -> u32 {
    now.wrapping_sub(start)
}
