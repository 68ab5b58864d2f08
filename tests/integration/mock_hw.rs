//! Mock hardware, system and broker adapters for integration tests.
//!
//! Pin levels and the accelerometer reading are set by the test; every
//! motor and LED write is recorded so tests can assert on the history.

use smarthammer::app::ports::{
    AccelPort, IndicatorPort, InputPort, MotorPort, Publisher, SystemPort,
};
use smarthammer::drivers::status_led::LedState;
use smarthammer::error::{ActuatorError, CommsError, SensorError};
use smarthammer::pins;
use smarthammer::sensors::AccelSample;
use std::collections::HashMap;

pub const DEVICE_ID: &str = "de:ad:be:ef:ca:fe";

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    levels: HashMap<i32, bool>,
    /// `None` simulates a bus failure.
    pub accel_z: Option<i32>,
    pub motor: Vec<u8>,
    pub leds: Vec<LedState>,
    /// Rejects every motor write while set.
    pub motor_fault: bool,
    /// Number of `all_off` calls.
    pub shutdowns: u32,
}

#[allow(dead_code)]
impl MockHardware {
    /// Both board buttons released (pulled up).
    pub fn new() -> Self {
        let mut levels = HashMap::new();
        levels.insert(pins::BOOT_BUTTON_GPIO, true);
        levels.insert(pins::ACTION_BUTTON_GPIO, true);
        Self {
            levels,
            accel_z: Some(1000),
            motor: Vec::new(),
            leds: Vec::new(),
            motor_fault: false,
            shutdowns: 0,
        }
    }

    pub fn press(&mut self, pin: i32) {
        self.levels.insert(pin, false);
    }

    pub fn release(&mut self, pin: i32) {
        self.levels.insert(pin, true);
    }

    pub fn duty(&self) -> u8 {
        self.motor.last().copied().unwrap_or(0)
    }

    pub fn last_leds(&self) -> Option<LedState> {
        self.leds.last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for MockHardware {
    fn read_level(&mut self, pin: i32) -> Result<bool, SensorError> {
        self.levels
            .get(&pin)
            .copied()
            .ok_or(SensorError::GpioReadFailed)
    }
}

impl AccelPort for MockHardware {
    fn read_accel(&mut self) -> Result<AccelSample, SensorError> {
        self.accel_z
            .map(|z| AccelSample { x: 0, y: 0, z })
            .ok_or(SensorError::BusFailed)
    }
}

impl MotorPort for MockHardware {
    fn set_motor_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        if self.motor_fault {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.motor.push(duty);
        Ok(())
    }

    fn motor_duty(&self) -> u8 {
        self.duty()
    }

    fn all_off(&mut self) -> Result<(), ActuatorError> {
        self.shutdowns += 1;
        self.set_motor_duty(0)?;
        self.set_leds(LedState::default())
    }
}

impl IndicatorPort for MockHardware {
    fn set_leds(&mut self, state: LedState) -> Result<(), ActuatorError> {
        self.leds.push(state);
        Ok(())
    }
}

// ── MockSystem ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSystem {
    pub restarts: u32,
    pub factory_resets: u32,
}

impl SystemPort for MockSystem {
    fn restart(&mut self) {
        self.restarts += 1;
    }

    fn factory_reset(&mut self) {
        self.factory_resets += 1;
    }
}

// ── CapturePublisher ──────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CapturePublisher {
    pub sent: Vec<(String, String)>,
    pub fail: bool,
}

#[allow(dead_code)]
impl CapturePublisher {
    pub fn payloads(&self) -> Vec<&str> {
        self.sent.iter().map(|(_, p)| p.as_str()).collect()
    }
}

impl Publisher for CapturePublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        if self.fail {
            return Err(CommsError::MqttPublishFailed);
        }
        self.sent.push((
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }
}
