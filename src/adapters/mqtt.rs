//! MQTT client adapter.
//!
//! - Maintains the `mqtt_connected` flag in [`DeviceState`] from the
//!   client's connection events.
//! - Subscribes to the command topic after every (re)connect.
//! - Routes inbound payloads through [`commands::handle_payload`]; reset
//!   commands are posted to the control loop through [`DeferredReset`].
//! - Implements [`Publisher`] with a non-blocking `enqueue` (QoS 0).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`;
//!   events arrive on the client's own task.  `subscribe` waits on the
//!   socket, so it runs on a small `mqtt-sub` thread woken by the connect
//!   event.  The control loop never takes the client lock blocking.
//! - **all other targets**: simulation that logs publishes and lets tests
//!   or a host harness inject inbound payloads.

use core::fmt::Write;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::commands;
use crate::app::ports::Publisher;
use crate::config::MqttConfig;
use crate::error::CommsError;
use crate::state::DeviceState;

use super::device_id::DeviceIdString;
use super::system::DeferredReset;

fn client_id(device_id: &str) -> heapless::String<48> {
    let mut id = heapless::String::new();
    let _ = write!(id, "smarthammer-{}", device_id);
    id
}

/// Handle one inbound message on the command topic.
fn on_message(payload: &[u8], device_id: &str, state: &DeviceState) {
    let mut system = DeferredReset::new(state);
    let _ = commands::handle_payload(payload, device_id, state, &mut system);
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
type SharedClient = std::sync::Arc<std::sync::Mutex<esp_idf_svc::mqtt::client::EspMqttClient<'static>>>;

#[cfg(target_os = "espidf")]
const SUBSCRIBER_STACK: usize = 4096;

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    client: SharedClient,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    /// Start the client.  Returns once the client task is running; the
    /// broker session comes up in the background.
    pub fn connect(
        config: &MqttConfig,
        device_id: &DeviceIdString,
        state: &'static DeviceState,
    ) -> Result<Self, CommsError> {
        use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};
        use std::sync::{Arc, Mutex, mpsc};

        let cid = client_id(device_id);
        let conf = MqttClientConfiguration {
            client_id: Some(cid.as_str()),
            ..Default::default()
        };

        let (connected_tx, connected_rx) = mpsc::channel::<()>();
        let own_id = device_id.clone();
        let client = EspMqttClient::new_cb(&config.broker_url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    info!("MQTT: connected");
                    state.set_mqtt_connected(true);
                    let _ = connected_tx.send(());
                }
                EventPayload::Disconnected => {
                    warn!("MQTT: disconnected");
                    state.set_mqtt_connected(false);
                }
                EventPayload::Received { data, .. } => on_message(data, &own_id, state),
                EventPayload::Error(e) => warn!("MQTT: {:?}", e),
                _ => {}
            }
        })
        .map_err(|e| {
            warn!("MQTT: client start failed ({})", e);
            CommsError::MqttNotConnected
        })?;

        let client = Arc::new(Mutex::new(client));
        let sub_client = Arc::clone(&client);
        let topic = config.command_topic.clone();
        std::thread::Builder::new()
            .name("mqtt-sub".into())
            .stack_size(SUBSCRIBER_STACK)
            .spawn(move || run_subscriber(sub_client, topic, connected_rx, state))
            .map_err(|e| {
                warn!("MQTT: subscriber thread failed ({})", e);
                CommsError::MqttNotConnected
            })?;

        info!("MQTT: client '{}' -> {}", cid, config.broker_url);
        Ok(Self { client })
    }
}

/// Subscribe once per connect event, retrying every second while the
/// session stays up.
#[cfg(target_os = "espidf")]
fn run_subscriber(
    client: SharedClient,
    topic: heapless::String<64>,
    connected: std::sync::mpsc::Receiver<()>,
    state: &'static DeviceState,
) {
    use esp_idf_svc::mqtt::client::QoS;

    while connected.recv().is_ok() {
        while state.mqtt_connected() {
            let result = match client.lock() {
                Ok(mut c) => c.subscribe(&topic, QoS::AtMostOnce).map(|_| ()),
                Err(_) => return,
            };
            match result {
                Ok(()) => {
                    info!("MQTT: subscribed to {}", topic);
                    break;
                }
                Err(e) => {
                    warn!("MQTT: subscribe failed ({}), retrying", e);
                    std::thread::sleep(core::time::Duration::from_secs(1));
                }
            }
        }
    }
}

#[cfg(target_os = "espidf")]
impl Publisher for MqttAdapter {
    /// Never waits for the lock: a publish that races a subscribe is
    /// dropped like any other failed publish.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        use esp_idf_svc::mqtt::client::QoS;

        let mut client = self
            .client
            .try_lock()
            .map_err(|_| CommsError::MqttPublishFailed)?;
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    log: super::log_sink::LogPublisher,
    device_id: DeviceIdString,
    subscribed: bool,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn connect(
        config: &MqttConfig,
        device_id: &DeviceIdString,
        state: &'static DeviceState,
    ) -> Result<Self, CommsError> {
        info!(
            "MQTT(sim): client '{}' -> {}, subscribed to {}",
            client_id(device_id),
            config.broker_url,
            config.command_topic
        );
        state.set_mqtt_connected(true);
        Ok(Self {
            log: super::log_sink::LogPublisher::new(),
            device_id: device_id.clone(),
            subscribed: true,
        })
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Deliver a payload as if it arrived on the command topic.
    pub fn inject(&self, payload: &[u8], state: &DeviceState) {
        on_message(payload, &self.device_id, state);
    }

    pub fn published(&self) -> u32 {
        self.log.published()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Publisher for MqttAdapter {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        self.log.publish(topic, payload)
    }
}
