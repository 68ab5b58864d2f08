//! ERM vibration motor driver (low-side MOSFET on LEDC PWM).
//!
//! Duty is expressed in percent (0–100) and scaled to the 8-bit LEDC
//! channel.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the LEDC channel via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;

pub struct MotorDriver {
    duty: u8,
}

impl MotorDriver {
    pub fn new() -> Self {
        Self { duty: 0 }
    }

    /// Write the duty.  The cached value only changes once the LEDC
    /// channel has accepted it.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        let duty = duty.min(100);
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, percent_to_8bit(duty))?;
        self.duty = duty;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.set_duty(0)
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn is_running(&self) -> bool {
        self.duty > 0
    }
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn percent_to_8bit(duty: u8) -> u8 {
    ((duty as u16) * 255 / 100) as u8
}
