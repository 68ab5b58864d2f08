//! End-to-end flow through the scheduler: control pass, outbound pass and
//! the publisher, with MQTT connectivity gating.

use crate::mock_hw::{CapturePublisher, DEVICE_ID, MockHardware, MockSystem};

use smarthammer::app::commands::handle_payload;
use smarthammer::app::outbound::{OutboundQueue, OutboundSender};
use smarthammer::app::service::{BOARD_BUTTONS, HammerService, HammerTasks};
use smarthammer::config::HammerConfig;
use smarthammer::pins::ACTION_BUTTON_GPIO;
use smarthammer::scheduler::Scheduler;
use smarthammer::state::DeviceState;

struct Flow {
    svc: HammerService,
    sender: OutboundSender,
    sched: Scheduler,
    hw: MockHardware,
    publisher: CapturePublisher,
    system: MockSystem,
    state: DeviceState,
    queue: OutboundQueue,
    now: u32,
}

impl Flow {
    fn new() -> Self {
        let config = HammerConfig::default();
        Self {
            svc: HammerService::new(config.clone(), &BOARD_BUTTONS).unwrap(),
            sender: OutboundSender::new(DEVICE_ID, &config.mqtt.publish_topic).unwrap(),
            sched: Scheduler::from_config(&config.scheduler),
            hw: MockHardware::new(),
            publisher: CapturePublisher::default(),
            system: MockSystem::default(),
            state: DeviceState::default(),
            queue: OutboundQueue::new(),
            now: 0,
        }
    }

    fn run_until(&mut self, until: u32) {
        while self.now < until {
            let mut tasks = HammerTasks {
                service: &mut self.svc,
                sender: &mut self.sender,
                hw: &mut self.hw,
                publisher: &mut self.publisher,
                system: &mut self.system,
                state: &self.state,
                queue: &self.queue,
            };
            self.sched.tick(self.now, &self.state, &mut tasks);
            self.now += 10;
        }
    }

    /// Hold the handle, spike at the moment the hold registers, release
    /// after the hit is confirmed.
    fn swing(&mut self) {
        let start = self.now;
        self.hw.press(ACTION_BUTTON_GPIO);
        self.run_until(start + 500);
        self.hw.accel_z = Some(8000);
        self.run_until(start + 520);
        self.hw.accel_z = Some(1000);
        self.run_until(start + 900);
        self.hw.release(ACTION_BUTTON_GPIO);
        self.run_until(start + 1000);
    }
}

#[test]
fn hit_is_published_as_telemetry() {
    let mut f = Flow::new();
    f.state.set_mqtt_connected(true);
    f.swing();

    let payloads = f.publisher.payloads();
    assert_eq!(payloads.len(), 3, "{:?}", payloads);
    assert!(payloads.contains(&r#"{"de:ad:be:ef:ca:fe":{"action":"buttonDown"}}"#));
    assert!(payloads.contains(&r#"{"de:ad:be:ef:ca:fe":{"action":"buttonUp"}}"#));
    assert!(payloads.contains(&r#"{"de:ad:be:ef:ca:fe":{"vibration":50,"acc_detect":1}}"#));
    assert!(f.publisher.sent.iter().all(|(t, _)| t == "topic_1"));
    assert!(!f.state.hammer_detected(), "flag consumed by the sender");
}

#[test]
fn setting_command_changes_feedback_level_and_telemetry() {
    let mut f = Flow::new();
    f.state.set_mqtt_connected(true);
    let p = br#"{"deviceId":"de:ad:be:ef:ca:fe","operation":"setting","value":75}"#;
    handle_payload(p, DEVICE_ID, &f.state, &mut f.system).unwrap();

    f.swing();
    assert!(f.hw.motor.contains(&75), "pulse uses the commanded level");
    assert!(
        f.publisher
            .payloads()
            .contains(&r#"{"de:ad:be:ef:ca:fe":{"vibration":75,"acc_detect":1}}"#)
    );
}

#[test]
fn hit_while_offline_is_reported_after_reconnect() {
    let mut f = Flow::new();
    f.swing();
    assert!(f.publisher.sent.is_empty());
    assert!(f.state.hammer_detected());

    f.state.set_mqtt_connected(true);
    let t = f.now;
    f.run_until(t + 100);
    assert_eq!(
        f.publisher.payloads(),
        vec![r#"{"de:ad:be:ef:ca:fe":{"vibration":50,"acc_detect":1}}"#]
    );
}

#[test]
fn leds_follow_connectivity() {
    let mut f = Flow::new();
    f.run_until(20);
    assert_eq!(f.hw.last_leds().map(|l| l.blue), Some(false));
    f.state.set_mqtt_connected(true);
    f.run_until(40);
    let leds = f.hw.last_leds().unwrap();
    assert!(leds.green && leds.blue && !leds.red);
}

#[test]
fn publish_failure_drops_message_without_stalling() {
    let mut f = Flow::new();
    f.state.set_mqtt_connected(true);
    f.publisher.fail = true;
    f.swing();
    assert!(f.publisher.sent.is_empty());
    assert!(f.queue.is_empty());

    f.publisher.fail = false;
    f.hw.press(ACTION_BUTTON_GPIO);
    let t = f.now;
    f.run_until(t + 30);
    f.hw.release(ACTION_BUTTON_GPIO);
    f.run_until(t + 200);
    assert_eq!(
        f.publisher.payloads(),
        vec![r#"{"de:ad:be:ef:ca:fe":{"action":"click"}}"#]
    );
}
