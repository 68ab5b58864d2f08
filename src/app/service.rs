//! Application service: the hexagonal core.
//!
//! [`HammerService`] owns the button driver, gesture composer, hit detector
//! and vibration pulse.  One call to [`HammerService::tick`] is one control
//! pass; all I/O flows through port traits injected at the call site, so the
//! whole pass runs against mock adapters in tests.
//!
//! ```text
//!  InputPort ──┐    ┌──────────────────────────────┐
//!  AccelPort ──┼──▶ │        HammerService          │ ──▶ OutboundQueue
//!              │    │ buttons → gesture → hit → vib │
//!  MotorPort ◀─┘    └──────────────────────────────┘ ──▶ DeviceState
//! ```
//!
//! Per-pass order: sample accelerometer, poll buttons, carry out any
//! reset, resolve gesture, run the hit detector (gated on the action button
//! being held), step the vibration pulse, enqueue the resolved gesture.

use log::{debug, info, warn};

use crate::config::HammerConfig;
use crate::drivers::button::{
    ButtonConfig, ButtonDriver, ButtonEvent, ButtonEventKind, ButtonType, MAX_BUTTONS,
};
use crate::drivers::status_led::LedState;
use crate::drivers::vibration::VibrationPulse;
use crate::error::Error;
use crate::pins;
use crate::sensors::HitDetector;
use crate::state::{DeviceState, ResetKind};

use super::gesture::{GestureAction, GestureComposer};
use super::outbound::{OutboundMessage, OutboundQueue, OutboundSender};
use super::ports::{
    AccelPort, IndicatorPort, InputPort, MotorPort, Publisher, SystemPort, TaskDelegate, TaskId,
};

/// Board button table: BOOT strap and the handle button, both pulled up.
pub const BOARD_BUTTONS: [ButtonConfig; 2] = [
    ButtonConfig::new(pins::BOOT_BUTTON_GPIO, true, ButtonType::Boot),
    ButtonConfig::new(pins::ACTION_BUTTON_GPIO, true, ButtonType::Action),
];

// ───────────────────────────────────────────────────────────────
// Button callback context
// ───────────────────────────────────────────────────────────────

/// State the button callbacks write into during a poll.  The service
/// applies the side effects once the poll returns.
pub struct ButtonContext {
    gesture: GestureComposer,
    now_ms: u32,
    types: heapless::Vec<ButtonType, MAX_BUTTONS>,
    factory_reset: bool,
    /// `Some(true)` on action-button hold, `Some(false)` on its release.
    action_held: Option<bool>,
}

impl ButtonContext {
    fn button_type(&self, index: usize) -> Option<ButtonType> {
        self.types.get(index).copied()
    }
}

fn on_press(index: usize, _event: ButtonEvent, ctx: &mut ButtonContext) {
    if ctx.button_type(index) == Some(ButtonType::Action) {
        ctx.gesture.on_press();
    }
}

fn on_release(index: usize, event: ButtonEvent, ctx: &mut ButtonContext) {
    if ctx.button_type(index) == Some(ButtonType::Action) {
        ctx.gesture.on_release();
        ctx.action_held = Some(false);
        if let ButtonEvent::Release { had_hold: true } = event {
            debug!("button: action released after hold");
        }
    }
}

fn on_hold(index: usize, _event: ButtonEvent, ctx: &mut ButtonContext) {
    match ctx.button_type(index) {
        Some(ButtonType::Boot) => {
            warn!("button: BOOT held, factory reset");
            ctx.factory_reset = true;
        }
        Some(ButtonType::Action) => {
            ctx.gesture.on_hold(ctx.now_ms);
            ctx.action_held = Some(true);
        }
        None => {}
    }
}

// ───────────────────────────────────────────────────────────────
// HammerService
// ───────────────────────────────────────────────────────────────

/// What one control pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub gesture: Option<GestureAction>,
    pub hit: bool,
    pub pulse_started: bool,
    pub pulse_ended: bool,
}

pub struct HammerService {
    config: HammerConfig,
    buttons: ButtonDriver<ButtonContext>,
    ctx: ButtonContext,
    hit: HitDetector,
    pulse: VibrationPulse,
    accel_fault: bool,
}

impl HammerService {
    /// Build the service with the given button table.
    pub fn new(config: HammerConfig, buttons: &[ButtonConfig]) -> Result<Self, Error> {
        config.validate()?;

        let mut driver = ButtonDriver::new(config.buttons);
        driver.init(buttons)?;
        driver.set_callback(ButtonEventKind::Press, Some(on_press));
        driver.set_callback(ButtonEventKind::Release, Some(on_release));
        driver.set_callback(ButtonEventKind::Hold, Some(on_hold));

        let types = buttons.iter().map(|b| b.button_type).collect();
        let ctx = ButtonContext {
            gesture: GestureComposer::new(config.gesture),
            now_ms: 0,
            types,
            factory_reset: false,
            action_held: None,
        };

        info!(
            "HammerService: {} button(s), hit threshold {} mg / {} ms, pulse {} ms",
            buttons.len(),
            config.hit.threshold_mg,
            config.hit.confirm_ms,
            config.vibration.pulse_ms
        );

        Ok(Self {
            hit: HitDetector::new(config.hit),
            pulse: VibrationPulse::new(config.vibration),
            buttons: driver,
            ctx,
            config,
            accel_fault: false,
        })
    }

    pub fn config(&self) -> &HammerConfig {
        &self.config
    }

    pub fn gesture(&self) -> &GestureComposer {
        &self.ctx.gesture
    }

    pub fn hit_detector(&self) -> &HitDetector {
        &self.hit
    }

    pub fn pulse(&self) -> &VibrationPulse {
        &self.pulse
    }

    /// Run one control pass at `now`.
    pub fn tick(
        &mut self,
        now: u32,
        hw: &mut (impl InputPort + AccelPort + MotorPort),
        state: &DeviceState,
        outbound: &OutboundQueue,
        system: &mut impl SystemPort,
    ) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        // 1. Inputs
        let sample = match hw.read_accel() {
            Ok(s) => {
                self.accel_fault = false;
                Some(s.axis(self.config.hit.axis))
            }
            Err(e) => {
                if !self.accel_fault {
                    warn!("accel: read failed ({})", e);
                }
                self.accel_fault = true;
                None
            }
        };

        // 2. Buttons
        self.ctx.now_ms = now;
        self.buttons.poll_at(hw, now, &mut self.ctx);
        if let Some(held) = self.ctx.action_held.take() {
            state.set_buttons_held(held);
        }
        let reset = if core::mem::take(&mut self.ctx.factory_reset) {
            Some(ResetKind::FactoryReset)
        } else {
            state.take_reset_request()
        };
        if let Some(kind) = reset {
            self.shut_down(kind, hw, system);
        }

        // 3. Gesture
        outcome.gesture = self.ctx.gesture.resolve(now);

        // 4. Hit detector, armed while the handle is held
        if self.hit.poll(sample, state.buttons_held(), now) {
            state.record_hit();
            outcome.hit = true;
        }

        // 5. Vibration pulse
        if state.take_vibration_request() {
            outcome.pulse_started = self.pulse.trigger(state.vibration_level(), now, hw);
        }
        outcome.pulse_ended = self.pulse.step(now, hw);

        // 6. Outbound
        if let Some(action) = outcome.gesture {
            info!("gesture: {}", action.as_str());
            if state.mqtt_connected() {
                let _ = outbound.enqueue(OutboundMessage::Gesture(action));
            } else {
                debug!("gesture: MQTT down, not sent");
            }
        }

        outcome
    }

    /// Outputs to their safe state, then hand over to the system port.
    fn shut_down(&mut self, kind: ResetKind, hw: &mut impl MotorPort, system: &mut impl SystemPort) {
        if let Err(e) = hw.all_off() {
            warn!("reset: outputs not cleared ({})", e);
        }
        self.pulse = VibrationPulse::new(self.config.vibration);
        match kind {
            ResetKind::Restart => system.restart(),
            ResetKind::FactoryReset => system.factory_reset(),
        }
    }

    /// Status LED pattern for the current state.
    pub fn indicators(&self, state: &DeviceState) -> LedState {
        LedState {
            green: true,
            red: self.accel_fault,
            blue: state.mqtt_connected(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task delegate
// ───────────────────────────────────────────────────────────────

/// Binds the service and sender to their collaborators for one scheduler
/// tick.
pub struct HammerTasks<'a, H, P, S> {
    pub service: &'a mut HammerService,
    pub sender: &'a mut OutboundSender,
    pub hw: &'a mut H,
    pub publisher: &'a mut P,
    pub system: &'a mut S,
    pub state: &'a DeviceState,
    pub queue: &'a OutboundQueue,
}

impl<H, P, S> TaskDelegate for HammerTasks<'_, H, P, S>
where
    H: InputPort + AccelPort + MotorPort + IndicatorPort,
    P: Publisher,
    S: SystemPort,
{
    fn run_task(&mut self, task: TaskId, now_ms: u32) {
        match task {
            TaskId::Control => {
                self.service
                    .tick(now_ms, self.hw, self.state, self.queue, self.system);
                if let Err(e) = self.hw.set_leds(self.service.indicators(self.state)) {
                    warn!("leds: update failed ({})", e);
                }
            }
            TaskId::Outbound => {
                self.sender.run(self.state, self.queue, self.publisher);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ActuatorError, SensorError};
    use crate::sensors::AccelSample;

    #[derive(Default)]
    struct Rig {
        boot: bool,
        action: bool,
        z_mg: i32,
        duty: u8,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                boot: true,
                action: true,
                ..Default::default()
            }
        }
    }

    impl InputPort for Rig {
        fn read_level(&mut self, pin: i32) -> Result<bool, SensorError> {
            Ok(if pin == pins::BOOT_BUTTON_GPIO {
                self.boot
            } else {
                self.action
            })
        }
    }

    impl AccelPort for Rig {
        fn read_accel(&mut self) -> Result<AccelSample, SensorError> {
            Ok(AccelSample {
                x: 0,
                y: 0,
                z: self.z_mg,
            })
        }
    }

    impl MotorPort for Rig {
        fn set_motor_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
            self.duty = duty;
            Ok(())
        }

        fn motor_duty(&self) -> u8 {
            self.duty
        }
    }

    /// Counts `(restarts, factory_resets)`.
    struct Sys<'a>(&'a mut (u32, u32));

    impl SystemPort for Sys<'_> {
        fn restart(&mut self) {
            self.0.0 += 1;
        }

        fn factory_reset(&mut self) {
            self.0.1 += 1;
        }
    }

    #[test]
    fn boot_hold_requests_factory_reset() {
        let mut svc = HammerService::new(HammerConfig::default(), &BOARD_BUTTONS).unwrap();
        let mut rig = Rig::new();
        let state = DeviceState::default();
        let q = OutboundQueue::new();
        let mut resets = (0, 0);

        rig.boot = false;
        for t in (0..600).step_by(10) {
            svc.tick(t, &mut rig, &state, &q, &mut Sys(&mut resets));
        }
        assert_eq!(resets, (0, 1));
        assert_eq!(rig.duty, 0);
        assert!(!state.buttons_held());
    }

    #[test]
    fn posted_restart_stops_running_pulse_first() {
        let mut svc = HammerService::new(HammerConfig::default(), &BOARD_BUTTONS).unwrap();
        let mut rig = Rig::new();
        let state = DeviceState::default();
        let q = OutboundQueue::new();
        let mut resets = (0, 0);

        state.record_hit();
        svc.tick(0, &mut rig, &state, &q, &mut Sys(&mut resets));
        assert!(svc.pulse().is_running());
        assert_eq!(rig.duty, 50);

        state.request_reset(ResetKind::Restart);
        svc.tick(10, &mut rig, &state, &q, &mut Sys(&mut resets));
        assert_eq!(resets, (1, 0));
        assert_eq!(rig.duty, 0);
        assert!(!svc.pulse().is_running());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = HammerConfig::default();
        cfg.buttons.hold_threshold_ms = 0;
        assert!(HammerService::new(cfg, &BOARD_BUTTONS).is_err());
    }
}
