//! Process-wide device state shared between the control loop, the MQTT
//! event task and the outbound sender.
//!
//! Each field has exactly one writer:
//!
//! | Field              | Writer                 | Readers                  |
//! |--------------------|------------------------|--------------------------|
//! | `wifi_connected`   | WiFi adapter           | scheduler                |
//! | `mqtt_connected`   | MQTT event task        | scheduler, service       |
//! | `vibration_level`  | command handler        | service, outbound        |
//! | `hammer_detected`  | hit detector (set)     | outbound (take)          |
//! | `vibration_active` | hit detector (set)     | vibration pulse (take)   |
//! | `buttons_held`     | button callbacks       | hit detector gate        |
//! | `reset_request`    | command handler        | control pass (take)      |
//!
//! Atomics give every reader an eventually-consistent view with no locks;
//! a stale read costs at most one control tick.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Reboot kinds a remote command can ask the control loop to perform.
/// Ordered by precedence: a pending factory reset is never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ResetKind {
    Restart = 1,
    FactoryReset = 2,
}

const NO_RESET: u8 = 0;

pub struct DeviceState {
    wifi_connected: AtomicBool,
    mqtt_connected: AtomicBool,
    vibration_level: AtomicU8,
    hammer_detected: AtomicBool,
    vibration_active: AtomicBool,
    buttons_held: AtomicBool,
    reset_request: AtomicU8,
}

impl DeviceState {
    /// `const` so `main` can keep the instance in a `static`.
    pub const fn new(vibration_level: u8) -> Self {
        Self {
            wifi_connected: AtomicBool::new(false),
            mqtt_connected: AtomicBool::new(false),
            vibration_level: AtomicU8::new(vibration_level),
            hammer_detected: AtomicBool::new(false),
            vibration_active: AtomicBool::new(false),
            buttons_held: AtomicBool::new(false),
            reset_request: AtomicU8::new(NO_RESET),
        }
    }

    // ── Connectivity ──────────────────────────────────────────

    pub fn wifi_connected(&self) -> bool {
        self.wifi_connected.load(Ordering::Acquire)
    }

    pub fn set_wifi_connected(&self, up: bool) {
        self.wifi_connected.store(up, Ordering::Release);
    }

    pub fn mqtt_connected(&self) -> bool {
        self.mqtt_connected.load(Ordering::Acquire)
    }

    pub fn set_mqtt_connected(&self, up: bool) {
        self.mqtt_connected.store(up, Ordering::Release);
    }

    // ── Readings ──────────────────────────────────────────────

    /// Motor duty (0-100%) used for hit feedback.
    pub fn vibration_level(&self) -> u8 {
        self.vibration_level.load(Ordering::Acquire)
    }

    /// Store a new level.  Values above 100 are clamped.
    pub fn set_vibration_level(&self, level: u8) {
        self.vibration_level.store(level.min(100), Ordering::Release);
    }

    pub fn hammer_detected(&self) -> bool {
        self.hammer_detected.load(Ordering::Acquire)
    }

    /// Record a confirmed hit: flags it for telemetry and requests a
    /// feedback pulse.
    pub fn record_hit(&self) {
        self.hammer_detected.store(true, Ordering::Release);
        self.vibration_active.store(true, Ordering::Release);
    }

    /// Consume the hit flag.  Returns `true` once per recorded hit.
    pub fn take_hammer_detected(&self) -> bool {
        self.hammer_detected.swap(false, Ordering::AcqRel)
    }

    pub fn vibration_active(&self) -> bool {
        self.vibration_active.load(Ordering::Acquire)
    }

    /// Consume a pending pulse request.
    pub fn take_vibration_request(&self) -> bool {
        self.vibration_active.swap(false, Ordering::AcqRel)
    }

    pub fn buttons_held(&self) -> bool {
        self.buttons_held.load(Ordering::Acquire)
    }

    pub fn set_buttons_held(&self, held: bool) {
        self.buttons_held.store(held, Ordering::Release);
    }

    // ── Reset requests ────────────────────────────────────────

    /// Ask the control loop to put the outputs in a safe state and reboot.
    pub fn request_reset(&self, kind: ResetKind) {
        self.reset_request.fetch_max(kind as u8, Ordering::AcqRel);
    }

    /// Consume a pending reset request.
    pub fn take_reset_request(&self) -> Option<ResetKind> {
        match self.reset_request.swap(NO_RESET, Ordering::AcqRel) {
            1 => Some(ResetKind::Restart),
            2 => Some(ResetKind::FactoryReset),
            _ => None,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new(crate::config::VibrationConfig::default().default_level)
    }
}
