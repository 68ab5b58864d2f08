//! Connectivity supervision for the main loop.
//!
//! Owns the Wi-Fi and MQTT adapters.  Wi-Fi is polled once every
//! [`LINK_POLL_MS`]; the MQTT client is created the first time the link
//! comes up, retried on later polls if that fails, and then kept for the
//! life of the firmware since the client reconnects on its own.  A boot
//! without a reachable access point therefore goes online as soon as one
//! appears.

use log::warn;

use crate::config::MqttConfig;
use crate::state::DeviceState;
use crate::tick::elapsed_ms;

use super::device_id::DeviceIdString;
use super::mqtt::MqttAdapter;
use super::wifi::WifiAdapter;

pub const LINK_POLL_MS: u32 = 1_000;

pub struct Connectivity {
    wifi: Option<WifiAdapter>,
    mqtt: Option<MqttAdapter>,
    config: MqttConfig,
    device_id: DeviceIdString,
    last_poll: Option<u32>,
}

impl Connectivity {
    /// `wifi` is `None` when no credentials are configured; the device
    /// then stays offline.
    pub fn new(wifi: Option<WifiAdapter>, config: &MqttConfig, device_id: &DeviceIdString) -> Self {
        Self {
            wifi,
            mqtt: None,
            config: config.clone(),
            device_id: device_id.clone(),
            last_poll: None,
        }
    }

    pub fn poll(&mut self, now: u32, state: &'static DeviceState) {
        if let Some(last) = self.last_poll {
            if elapsed_ms(now, last) < LINK_POLL_MS {
                return;
            }
        }
        self.last_poll = Some(now);

        let Some(wifi) = self.wifi.as_mut() else {
            return;
        };
        wifi.poll(now, state);

        if self.mqtt.is_none() && state.wifi_connected() {
            match MqttAdapter::connect(&self.config, &self.device_id, state) {
                Ok(m) => self.mqtt = Some(m),
                Err(e) => warn!("MQTT: {}, retrying on next link poll", e),
            }
        }
    }

    pub fn mqtt(&mut self) -> Option<&mut MqttAdapter> {
        self.mqtt.as_mut()
    }
}
