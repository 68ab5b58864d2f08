//! System configuration parameters
//!
//! All tunable timing windows and thresholds for the Smart Hammer.
//! Every state machine takes its own section by value at construction,
//! so alternative tunings (e.g. the longer 2 s gesture windows used on
//! some hammer heads) are a config change, not a code change.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Button debounce / event timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonTiming {
    /// Continuous press before a `Hold` event is raised (ms).
    pub hold_threshold_ms: u32,
    /// Period of `OnHold` repeat events after the hold (ms).
    pub on_hold_repeat_ms: u32,
    /// Maximum gap between presses counted as a multi-click (ms).
    pub double_click_window_ms: u32,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            hold_threshold_ms: 500,
            on_hold_repeat_ms: 200,
            double_click_window_ms: 500,
        }
    }
}

/// Reverse-click gesture composer windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureTiming {
    /// Time after the hold event before a hold counts as a long hold (ms).
    pub long_hold_ms: u32,
    /// Window after releasing a long hold in which a re-press is a reverse (ms).
    pub reverse_window_ms: u32,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            long_hold_ms: 500,
            reverse_window_ms: 1000,
        }
    }
}

/// Accelerometer axis consumed by the hit detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Hit detector thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDetectorConfig {
    /// Absolute acceleration that arms the detector (milli-g).
    pub threshold_mg: u32,
    /// Settling time before an armed excursion is reported (ms).
    pub confirm_ms: u32,
    /// Dominant axis of the hammer swing.
    pub axis: Axis,
}

impl Default for HitDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_mg: 4000,
            confirm_ms: 300,
            axis: Axis::Z,
        }
    }
}

/// Vibration motor feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibrationConfig {
    /// Length of the hit-feedback pulse (ms).
    pub pulse_ms: u32,
    /// Motor duty used until a `setting` command arrives (0-100%).
    pub default_level: u8,
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            pulse_ms: 300,
            default_level: 50,
        }
    }
}

/// Cooperative task periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerTiming {
    /// Control cycle (buttons, gestures, hit detector, motor) period (ms).
    pub control_interval_ms: u32,
    /// Outbound sender period (ms).
    pub outbound_interval_ms: u32,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            control_interval_ms: 10,
            outbound_interval_ms: 100,
        }
    }
}

/// MQTT endpoint and topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_url: heapless::String<128>,
    /// Topic for telemetry and gesture messages.
    pub publish_topic: heapless::String<64>,
    /// Topic carrying inbound commands.
    pub command_topic: heapless::String<64>,
}

/// Copy `value` into a bounded string.  Overlong input is logged and
/// leaves the string empty, which [`HammerConfig::validate`] rejects.
fn bounded<const N: usize>(field: &str, value: &str) -> heapless::String<N> {
    let mut s = heapless::String::new();
    if s.push_str(value).is_err() {
        log::error!("config: {} longer than {} bytes, ignored", field, N);
    }
    s
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_url: bounded(
                "broker URL",
                option_env!("SMARTHAMMER_MQTT_URL").unwrap_or("mqtt://broker.local:1883"),
            ),
            publish_topic: bounded("publish topic", "topic_1"),
            command_topic: bounded("command topic", "topic_2"),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HammerConfig {
    pub buttons: ButtonTiming,
    pub gesture: GestureTiming,
    pub hit: HitDetectorConfig,
    pub vibration: VibrationConfig,
    pub scheduler: SchedulerTiming,
    pub mqtt: MqttConfig,
}

impl HammerConfig {
    /// Reject configurations the state machines cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.buttons.hold_threshold_ms == 0 {
            return Err(Error::Config("hold threshold must be > 0"));
        }
        if self.buttons.on_hold_repeat_ms == 0 {
            return Err(Error::Config("on-hold repeat interval must be > 0"));
        }
        if self.gesture.reverse_window_ms == 0 {
            return Err(Error::Config("reverse window must be > 0"));
        }
        if self.hit.threshold_mg == 0 {
            return Err(Error::Config("hit threshold must be > 0"));
        }
        if self.vibration.default_level > 100 {
            return Err(Error::Config("vibration level must be 0-100"));
        }
        if self.scheduler.control_interval_ms == 0
            || self.scheduler.control_interval_ms > self.scheduler.outbound_interval_ms
        {
            return Err(Error::Config("control interval must be in 1..=outbound interval"));
        }
        // A hold can only be observed if the loop samples faster than the threshold.
        if self.scheduler.control_interval_ms >= self.buttons.hold_threshold_ms {
            return Err(Error::Config("control interval must be shorter than hold threshold"));
        }
        if self.mqtt.broker_url.is_empty() {
            return Err(Error::Config("MQTT broker URL missing or too long"));
        }
        if self.mqtt.publish_topic.is_empty() || self.mqtt.command_topic.is_empty() {
            return Err(Error::Config("MQTT topic missing or too long"));
        }
        Ok(())
    }
}
