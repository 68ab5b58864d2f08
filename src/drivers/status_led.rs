//! Discrete status LEDs.
//!
//! | LED   | Meaning                              |
//! |-------|--------------------------------------|
//! | green | firmware running                     |
//! | blue  | MQTT session up                      |
//! | red   | accelerometer failed to initialise   |
//!
//! Plain GPIO outputs, active HIGH.  On host builds the writes are no-ops
//! and only the cached state is kept.

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedState {
    pub green: bool,
    pub red: bool,
    pub blue: bool,
}

pub struct StatusLeds {
    current: LedState,
}

impl StatusLeds {
    pub fn new() -> Self {
        Self {
            current: LedState::default(),
        }
    }

    /// Drive the three outputs.  On a failed write the cache is left
    /// stale so the next call retries every pin.
    pub fn set(&mut self, state: LedState) -> Result<(), ActuatorError> {
        if state == self.current {
            return Ok(());
        }
        hw_init::gpio_write(pins::LED_GREEN_GPIO, state.green)?;
        hw_init::gpio_write(pins::LED_RED_GPIO, state.red)?;
        hw_init::gpio_write(pins::LED_BLUE_GPIO, state.blue)?;
        self.current = state;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set(LedState::default())
    }

    pub fn current(&self) -> LedState {
        self.current
    }
}

impl Default for StatusLeds {
    fn default() -> Self {
        Self::new()
    }
}
