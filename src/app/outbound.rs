//! Outbound messages and the bounded queue that carries them from the
//! control loop to the MQTT sender.
//!
//! ```text
//! ┌──────────────┐  OutboundMessage  ┌────────────────┐  publish  ┌───────────┐
//! │ Control task │──────────────────▶│ OutboundSender │──────────▶│ Publisher │
//! │   (10 ms)    │   OutboundQueue   │    (100 ms)    │           │  (MQTT)   │
//! └──────────────┘                   └────────────────┘           └───────────┘
//! ```
//!
//! Every message is keyed by the device id:
//!
//! ```text
//! {"de:ad:be:ef:ca:fe":{"vibration":50,"acc_detect":1}}
//! {"de:ad:be:ef:ca:fe":{"action":"reverse"}}
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{CommsError, Error};
use crate::state::DeviceState;

use super::gesture::GestureAction;
use super::ports::Publisher;

/// Queue depth.  Messages beyond this are dropped.
pub const OUTBOUND_DEPTH: usize = 8;

/// Something the device reports to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundMessage {
    Telemetry { vibration: u8, hit: bool },
    Gesture(GestureAction),
}

#[derive(serde::Serialize)]
struct TelemetryBody {
    vibration: u8,
    acc_detect: u8,
}

#[derive(serde::Serialize)]
struct GestureBody {
    action: &'static str,
}

/// `{"<device id>": <body>}`
struct Keyed<'a> {
    device_id: &'a str,
    message: &'a OutboundMessage,
}

impl Serialize for Keyed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match *self.message {
            OutboundMessage::Telemetry { vibration, hit } => map.serialize_entry(
                self.device_id,
                &TelemetryBody {
                    vibration,
                    acc_detect: u8::from(hit),
                },
            )?,
            OutboundMessage::Gesture(action) => map.serialize_entry(
                self.device_id,
                &GestureBody {
                    action: action.as_str(),
                },
            )?,
        }
        map.end()
    }
}

impl OutboundMessage {
    /// Encode as the JSON payload published to the broker.
    pub fn to_json(&self, device_id: &str) -> Result<Vec<u8>, CommsError> {
        serde_json::to_vec(&Keyed {
            device_id,
            message: self,
        })
        .map_err(|_| CommsError::EncodeFailed)
    }
}

// ── Queue ─────────────────────────────────────────────────────

/// Bounded MPMC queue, usable from a `static`.
pub struct OutboundQueue {
    channel: Channel<CriticalSectionRawMutex, OutboundMessage, OUTBOUND_DEPTH>,
}

impl OutboundQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Non-blocking hand-off.  A full queue drops the message.
    pub fn enqueue(&self, message: OutboundMessage) -> Result<(), CommsError> {
        self.channel.try_send(message).map_err(|_| {
            warn!("outbound: queue full, dropping {:?}", message);
            CommsError::QueueFull
        })
    }

    pub fn try_next(&self) -> Option<OutboundMessage> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sender task ───────────────────────────────────────────────

/// Body of the outbound task: turns the hit flag into telemetry and
/// drains the queue into the publisher.
pub struct OutboundSender {
    device_id: heapless::String<32>,
    topic: heapless::String<64>,
}

impl OutboundSender {
    pub fn new(device_id: &str, topic: &str) -> Result<Self, Error> {
        let mut id = heapless::String::new();
        id.push_str(device_id)
            .map_err(|_| Error::Config("device id too long"))?;
        let mut t = heapless::String::new();
        t.push_str(topic)
            .map_err(|_| Error::Config("publish topic too long"))?;
        Ok(Self {
            device_id: id,
            topic: t,
        })
    }

    /// Run one sender cycle.  Returns the number of messages published.
    ///
    /// Nothing is consumed while the broker is down, so a hit recorded
    /// during an outage is reported once the session comes back.
    pub fn run(
        &mut self,
        state: &DeviceState,
        queue: &OutboundQueue,
        publisher: &mut impl Publisher,
    ) -> usize {
        if !state.mqtt_connected() {
            return 0;
        }

        if state.take_hammer_detected() {
            info!("outbound: hit detected, sending telemetry");
            let _ = queue.enqueue(OutboundMessage::Telemetry {
                vibration: state.vibration_level(),
                hit: true,
            });
        }

        let mut sent = 0;
        while let Some(message) = queue.try_next() {
            let payload = match message.to_json(&self.device_id) {
                Ok(p) => p,
                Err(e) => {
                    warn!("outbound: {} for {:?}", e, message);
                    continue;
                }
            };
            match publisher.publish(&self.topic, &payload) {
                Ok(()) => {
                    debug!("outbound: published {} bytes to {}", payload.len(), self.topic);
                    sent += 1;
                }
                Err(e) => warn!("outbound: publish failed ({}), message dropped", e),
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "de:ad:be:ef:ca:fe";

    #[derive(Default)]
    struct Capture {
        sent: std::vec::Vec<(std::string::String, std::string::String)>,
    }

    impl Publisher for Capture {
        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
            self.sent.push((
                topic.into(),
                std::string::String::from_utf8_lossy(payload).into_owned(),
            ));
            Ok(())
        }
    }

    #[test]
    fn telemetry_json() {
        let m = OutboundMessage::Telemetry {
            vibration: 75,
            hit: true,
        };
        assert_eq!(
            m.to_json(ID).unwrap(),
            br#"{"de:ad:be:ef:ca:fe":{"vibration":75,"acc_detect":1}}"#
        );
    }

    #[test]
    fn gesture_json() {
        let m = OutboundMessage::Gesture(GestureAction::Reverse);
        assert_eq!(
            m.to_json(ID).unwrap(),
            br#"{"de:ad:be:ef:ca:fe":{"action":"reverse"}}"#
        );
    }

    #[test]
    fn full_queue_drops() {
        let q = OutboundQueue::new();
        for _ in 0..OUTBOUND_DEPTH {
            q.enqueue(OutboundMessage::Gesture(GestureAction::Click))
                .unwrap();
        }
        assert_eq!(
            q.enqueue(OutboundMessage::Gesture(GestureAction::Click)),
            Err(CommsError::QueueFull)
        );
        assert_eq!(q.len(), OUTBOUND_DEPTH);
    }

    #[test]
    fn sender_waits_for_connection() {
        let state = DeviceState::default();
        let q = OutboundQueue::new();
        let mut pubr = Capture::default();
        let mut s = OutboundSender::new(ID, "topic_1").unwrap();

        state.record_hit();
        assert_eq!(s.run(&state, &q, &mut pubr), 0);
        assert!(state.hammer_detected());

        state.set_mqtt_connected(true);
        assert_eq!(s.run(&state, &q, &mut pubr), 1);
        assert!(!state.hammer_detected());
        assert_eq!(pubr.sent[0].0, "topic_1");
        assert_eq!(
            pubr.sent[0].1,
            r#"{"de:ad:be:ef:ca:fe":{"vibration":50,"acc_detect":1}}"#
        );
        assert!(q.is_empty());
    }

    #[test]
    fn overlong_topic_is_an_error() {
        let topic = "t".repeat(65);
        assert_eq!(
            OutboundSender::new(ID, &topic).err(),
            Some(Error::Config("publish topic too long"))
        );
    }
}
