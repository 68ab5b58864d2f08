//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the accelerometer, the motor PWM driver and the status LEDs, and
//! exposes them through [`InputPort`], [`AccelPort`], [`MotorPort`] and
//! [`IndicatorPort`].  Button levels are read straight from the GPIO
//! registers configured by `hw_init`.  On non-espidf targets the
//! underlying drivers use cfg-gated simulation stubs.

use embedded_hal::i2c::I2c;

use crate::app::ports::{AccelPort, IndicatorPort, InputPort, MotorPort};
use crate::drivers::hw_init;
use crate::drivers::motor::MotorDriver;
use crate::drivers::status_led::{LedState, StatusLeds};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{AccelSample, Lsm6dsl};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C> {
    accel: Lsm6dsl<I2C>,
    motor: MotorDriver,
    leds: StatusLeds,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(accel: Lsm6dsl<I2C>, motor: MotorDriver, leds: StatusLeds) -> Self {
        Self { accel, motor, leds }
    }

    pub fn accel_ready(&self) -> bool {
        self.accel.is_ready()
    }
}

// ── Input ports ───────────────────────────────────────────────

impl<I2C: I2c> InputPort for HardwareAdapter<I2C> {
    fn read_level(&mut self, pin: i32) -> Result<bool, SensorError> {
        Ok(hw_init::gpio_read(pin))
    }
}

impl<I2C: I2c> AccelPort for HardwareAdapter<I2C> {
    fn read_accel(&mut self) -> Result<AccelSample, SensorError> {
        self.accel.read_axes()
    }
}

// ── Output ports ──────────────────────────────────────────────

impl<I2C: I2c> MotorPort for HardwareAdapter<I2C> {
    fn set_motor_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.motor.set_duty(duty)
    }

    fn motor_duty(&self) -> u8 {
        self.motor.duty()
    }

    /// Stop the motor and blank the LEDs.  Both are attempted even if the
    /// first fails.
    fn all_off(&mut self) -> Result<(), ActuatorError> {
        let motor = self.motor.stop();
        let leds = self.leds.off();
        motor.and(leds)
    }
}

impl<I2C: I2c> IndicatorPort for HardwareAdapter<I2C> {
    fn set_leds(&mut self, state: LedState) -> Result<(), ActuatorError> {
        self.leds.set(state)
    }
}
