//! Integration tests for the HammerService control pass: buttons →
//! gesture → hit detector → vibration pulse, against mock hardware.

use crate::mock_hw::{MockHardware, MockSystem};

use smarthammer::adapters::system::DeferredReset;
use smarthammer::app::commands::handle_payload;
use smarthammer::app::gesture::GestureAction;
use smarthammer::app::outbound::{OutboundMessage, OutboundQueue};
use smarthammer::app::service::{BOARD_BUTTONS, HammerService, PassOutcome};
use smarthammer::config::HammerConfig;
use smarthammer::drivers::status_led::LedState;
use smarthammer::drivers::vibration::PulseState;
use smarthammer::pins::{ACTION_BUTTON_GPIO, BOOT_BUTTON_GPIO};
use smarthammer::sensors::HitState;
use smarthammer::state::DeviceState;

struct Rig {
    svc: HammerService,
    hw: MockHardware,
    state: DeviceState,
    queue: OutboundQueue,
    system: MockSystem,
    now: u32,
}

impl Rig {
    fn new() -> Self {
        Self {
            svc: HammerService::new(HammerConfig::default(), &BOARD_BUTTONS).unwrap(),
            hw: MockHardware::new(),
            state: DeviceState::default(),
            queue: OutboundQueue::new(),
            system: MockSystem::default(),
            now: 0,
        }
    }

    /// One control pass at the current time, then advance 10 ms.
    fn pass(&mut self) -> PassOutcome {
        let out = self.svc.tick(
            self.now,
            &mut self.hw,
            &self.state,
            &self.queue,
            &mut self.system,
        );
        self.now += 10;
        out
    }

    /// Run passes until `now` reaches `until` (exclusive).
    fn run_until(&mut self, until: u32) -> Vec<(u32, PassOutcome)> {
        let mut log = Vec::new();
        while self.now < until {
            let t = self.now;
            log.push((t, self.pass()));
        }
        log
    }

    fn gestures(log: &[(u32, PassOutcome)]) -> Vec<(u32, GestureAction)> {
        log.iter()
            .filter_map(|(t, o)| o.gesture.map(|g| (*t, g)))
            .collect()
    }
}

#[test]
fn six_hundred_ms_hold_arms_and_releases() {
    let mut rig = Rig::new();
    rig.hw.press(ACTION_BUTTON_GPIO);

    let mut log = rig.run_until(500);
    assert!(!rig.state.buttons_held(), "no hold before 500 ms");

    log.extend(rig.run_until(600));
    assert!(rig.state.buttons_held(), "hold flag set at 500 ms");

    rig.hw.release(ACTION_BUTTON_GPIO);
    log.extend(rig.run_until(700));
    assert!(!rig.state.buttons_held(), "release clears hold flag");

    assert_eq!(
        Rig::gestures(&log),
        vec![
            (500, GestureAction::HoldStarted),
            (600, GestureAction::HoldReleased)
        ]
    );
}

#[test]
fn hit_only_while_handle_held() {
    let mut rig = Rig::new();
    rig.hw.accel_z = Some(6000);
    let log = rig.run_until(1000);
    assert!(log.iter().all(|(_, o)| !o.hit), "gate closed without hold");
    assert_eq!(rig.svc.hit_detector().state(), HitState::Idle);
    assert!(!rig.state.hammer_detected());
}

#[test]
fn held_spike_produces_one_hit_and_one_pulse() {
    let mut rig = Rig::new();
    rig.hw.press(ACTION_BUTTON_GPIO);
    rig.run_until(500);

    // Spike on the pass where the gate opens.
    rig.hw.accel_z = Some(-5200);
    let mut log = rig.run_until(520);
    rig.hw.accel_z = Some(900);
    log.extend(rig.run_until(900));

    let hits: Vec<u32> = log.iter().filter(|(_, o)| o.hit).map(|(t, _)| *t).collect();
    assert_eq!(hits, vec![810], "confirmed once, > 300 ms after arming");
    assert!(rig.state.hammer_detected());

    let started: Vec<u32> = log
        .iter()
        .filter(|(_, o)| o.pulse_started)
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(started, vec![810]);
    assert_eq!(rig.hw.duty(), 50);

    log = rig.run_until(1200);
    let ended: Vec<u32> = log
        .iter()
        .filter(|(_, o)| o.pulse_ended)
        .map(|(t, _)| *t)
        .collect();
    assert_eq!(ended, vec![1110]);
    assert_eq!(rig.hw.duty(), 0);
    assert_eq!(rig.svc.pulse().state(), PulseState::Idle);
}

#[test]
fn release_before_confirmation_cancels_hit() {
    let mut rig = Rig::new();
    rig.hw.press(ACTION_BUTTON_GPIO);
    rig.hw.accel_z = Some(4500);
    rig.run_until(600);
    assert!(matches!(rig.svc.hit_detector().state(), HitState::Armed { .. }));

    rig.hw.release(ACTION_BUTTON_GPIO);
    let log = rig.run_until(1200);
    assert!(log.iter().all(|(_, o)| !o.hit));
    assert_eq!(rig.svc.hit_detector().state(), HitState::Idle);
}

#[test]
fn boot_hold_triggers_factory_reset_once() {
    let mut rig = Rig::new();
    rig.hw.press(BOOT_BUTTON_GPIO);
    rig.run_until(2000);
    assert_eq!(rig.system.factory_resets, 1);
    assert_eq!(rig.hw.shutdowns, 1);
    assert_eq!(rig.hw.last_leds(), Some(LedState::default()));
    assert!(!rig.state.buttons_held(), "boot button never arms the hit gate");
}

#[test]
fn restart_command_clears_outputs_before_reboot() {
    let mut rig = Rig::new();
    rig.state.record_hit();
    rig.pass();
    assert!(rig.svc.pulse().is_running());
    assert_eq!(rig.hw.duty(), 50);

    // Arrives on the broker task; only the control pass reboots.
    let mut deferred = DeferredReset::new(&rig.state);
    handle_payload(br#"{"operation":"restart"}"#, "", &rig.state, &mut deferred).unwrap();
    assert_eq!(rig.system.restarts, 0);

    rig.pass();
    assert_eq!(rig.system.restarts, 1);
    assert_eq!(rig.hw.shutdowns, 1);
    assert_eq!(rig.hw.duty(), 0);
    assert_eq!(rig.hw.last_leds(), Some(LedState::default()));
    assert!(!rig.svc.pulse().is_running());
}

#[test]
fn motor_stop_failure_is_retried_until_it_lands() {
    let mut rig = Rig::new();
    rig.state.record_hit();
    rig.pass();
    assert_eq!(rig.hw.duty(), 50);

    rig.hw.motor_fault = true;
    let log = rig.run_until(600);
    assert!(log.iter().all(|(_, o)| !o.pulse_ended));
    assert!(rig.svc.pulse().is_running());

    rig.hw.motor_fault = false;
    assert!(rig.pass().pulse_ended);
    assert_eq!(rig.hw.duty(), 0);
}

#[test]
fn reverse_gesture_enqueued_when_connected() {
    let mut rig = Rig::new();
    rig.state.set_mqtt_connected(true);

    rig.hw.press(ACTION_BUTTON_GPIO);
    let mut log = rig.run_until(1200);
    rig.hw.release(ACTION_BUTTON_GPIO);
    log.extend(rig.run_until(1500));
    rig.hw.press(ACTION_BUTTON_GPIO);
    log.extend(rig.run_until(1600));

    assert_eq!(
        Rig::gestures(&log),
        vec![
            (500, GestureAction::HoldStarted),
            (1500, GestureAction::Reverse)
        ]
    );
    assert_eq!(
        rig.queue.try_next(),
        Some(OutboundMessage::Gesture(GestureAction::HoldStarted))
    );
    assert_eq!(
        rig.queue.try_next(),
        Some(OutboundMessage::Gesture(GestureAction::Reverse))
    );
    assert!(rig.queue.is_empty());
}

#[test]
fn gestures_not_enqueued_while_offline() {
    let mut rig = Rig::new();
    rig.hw.press(ACTION_BUTTON_GPIO);
    rig.run_until(50);
    rig.hw.release(ACTION_BUTTON_GPIO);
    let log = rig.run_until(100);
    assert_eq!(Rig::gestures(&log), vec![(50, GestureAction::Click)]);
    assert!(rig.queue.is_empty());
}

#[test]
fn accel_failure_sets_red_indicator() {
    let mut rig = Rig::new();
    rig.pass();
    assert!(!rig.svc.indicators(&rig.state).red);

    rig.hw.accel_z = None;
    rig.pass();
    let leds = rig.svc.indicators(&rig.state);
    assert!(leds.red);
    assert!(leds.green);
    assert!(!leds.blue);
}
