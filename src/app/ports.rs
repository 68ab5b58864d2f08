//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HammerService (domain)
//! ```
//!
//! Driven adapters (GPIO, accelerometer, motor, LEDs, MQTT, system control)
//! implement these traits.  The [`HammerService`](super::service::HammerService)
//! and the [`Scheduler`](crate::scheduler::Scheduler) consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! All port errors are typed; a failed read means "no new data this cycle"
//! and a failed write leaves the previous output in place.

use crate::drivers::status_led::LedState;
use crate::error::{ActuatorError, CommsError, SensorError};
use crate::sensors::AccelSample;

// ───────────────────────────────────────────────────────────────
// Input ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Digital input sampling for the button debouncer.
pub trait InputPort {
    /// Current logic level of `pin`.
    fn read_level(&mut self, pin: i32) -> Result<bool, SensorError>;
}

/// Accelerometer access.
pub trait AccelPort {
    /// One 3-axis sample in milli-g.
    fn read_accel(&mut self) -> Result<AccelSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Output ports (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Vibration motor output.
pub trait MotorPort {
    /// Set motor duty (0–100 %).
    fn set_motor_duty(&mut self, duty: u8) -> Result<(), ActuatorError>;

    /// Last duty the hardware accepted.
    fn motor_duty(&self) -> u8;

    /// Put every output in its safe state before a reboot.  The default
    /// only stops the motor.
    fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.set_motor_duty(0)
    }
}

/// Status LEDs.
pub trait IndicatorPort {
    fn set_leds(&mut self, state: LedState) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Messaging port (driven adapter: domain → broker)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget publish.  Implementations must not wait for a broker
/// acknowledgement.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// System control
// ───────────────────────────────────────────────────────────────

/// Process-level actions requested by commands or the boot button.
pub trait SystemPort {
    /// Reboot the device.
    fn restart(&mut self);

    /// Erase persisted state (NVS, SPIFFS) and reboot.
    fn factory_reset(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from task bodies)
// ───────────────────────────────────────────────────────────────

/// Identifies a periodic task in the cooperative schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    /// Buttons, gestures, hit detector, vibration pulse.
    Control,
    /// Telemetry and gesture publishing.
    Outbound,
}

/// Callback trait that the scheduler invokes when a task is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) only tracks periods and
/// connectivity gates; what a task actually does lives behind this trait.
pub trait TaskDelegate {
    fn run_task(&mut self, task: TaskId, now_ms: u32);
}
