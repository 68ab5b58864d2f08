//! Vibration pulse controller.
//!
//! Turns a "hit" into a timed burst on the motor:
//!
//! ```text
//!   Idle ──trigger(level)──▶ Running{since, duration} ──elapsed ≥ duration──▶ Idle
//!                              duty = level                   duty = 0
//! ```
//!
//! Re-triggering while running is ignored; the running pulse keeps its
//! first start time.  Manual duty changes made while a pulse runs are
//! applied immediately, but the pulse still ends by forcing duty 0.
//! If that final write fails the pulse stays `Running` and the stop is
//! retried on every following step.

use log::{debug, warn};

use crate::app::ports::MotorPort;
use crate::config::VibrationConfig;
use crate::tick::elapsed_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseState {
    Idle,
    Running { since_ms: u32, duration_ms: u32 },
}

pub struct VibrationPulse {
    default_duration_ms: u32,
    state: PulseState,
}

impl VibrationPulse {
    pub fn new(config: VibrationConfig) -> Self {
        Self {
            default_duration_ms: config.pulse_ms,
            state: PulseState::Idle,
        }
    }

    pub fn state(&self) -> PulseState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PulseState::Running { .. })
    }

    /// Start a pulse of the configured length.  Returns `false` if a pulse
    /// was already running.
    pub fn trigger(&mut self, level: u8, now: u32, motor: &mut impl MotorPort) -> bool {
        self.trigger_for(level, self.default_duration_ms, now, motor)
    }

    /// Start a pulse of explicit length (longer cues such as boot feedback).
    pub fn trigger_for(
        &mut self,
        level: u8,
        duration_ms: u32,
        now: u32,
        motor: &mut impl MotorPort,
    ) -> bool {
        if self.is_running() {
            debug!("vibration: pulse already running, trigger ignored");
            return false;
        }
        if let Err(e) = motor.set_motor_duty(level.min(100)) {
            warn!("vibration: motor start failed ({})", e);
            return false;
        }
        self.state = PulseState::Running {
            since_ms: now,
            duration_ms,
        };
        true
    }

    /// Advance the pulse.  Returns `true` on the tick the pulse ends.
    pub fn step(&mut self, now: u32, motor: &mut impl MotorPort) -> bool {
        let PulseState::Running {
            since_ms,
            duration_ms,
        } = self.state
        else {
            return false;
        };
        if elapsed_ms(now, since_ms) < duration_ms {
            return false;
        }
        if let Err(e) = motor.set_motor_duty(0) {
            warn!("vibration: motor stop failed ({}), retrying", e);
            return false;
        }
        self.state = PulseState::Idle;
        true
    }

    /// Manual duty override.  Does not start or extend a pulse.
    pub fn set_duty(&mut self, duty: u8, motor: &mut impl MotorPort) {
        if let Err(e) = motor.set_motor_duty(duty.min(100)) {
            warn!("vibration: duty {} rejected ({})", duty, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActuatorError;

    #[derive(Default)]
    struct Motor {
        duty: u8,
        writes: usize,
        /// Number of upcoming writes to reject.
        failures: usize,
    }

    impl MotorPort for Motor {
        fn set_motor_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(ActuatorError::PwmWriteFailed);
            }
            self.duty = duty;
            self.writes += 1;
            Ok(())
        }

        fn motor_duty(&self) -> u8 {
            self.duty
        }
    }

    fn pulse() -> VibrationPulse {
        VibrationPulse::new(VibrationConfig::default())
    }

    #[test]
    fn pulse_runs_for_duration_then_stops() {
        let mut p = pulse();
        let mut m = Motor::default();
        assert!(p.trigger(60, 1000, &mut m));
        assert_eq!(m.duty, 60);
        assert!(!p.step(1290, &mut m));
        assert_eq!(m.duty, 60);
        assert!(p.step(1300, &mut m));
        assert_eq!(m.duty, 0);
        assert_eq!(p.state(), PulseState::Idle);
    }

    #[test]
    fn retrigger_does_not_extend() {
        let mut p = pulse();
        let mut m = Motor::default();
        p.trigger(50, 0, &mut m);
        assert!(!p.trigger(80, 200, &mut m));
        assert_eq!(m.duty, 50);
        assert!(p.step(300, &mut m));
        assert_eq!(m.duty, 0);
    }

    #[test]
    fn manual_duty_does_not_prevent_stop() {
        let mut p = pulse();
        let mut m = Motor::default();
        p.trigger(50, 0, &mut m);
        p.set_duty(90, &mut m);
        assert_eq!(m.duty, 90);
        assert!(p.step(300, &mut m));
        assert_eq!(m.duty, 0);
    }

    #[test]
    fn idle_step_touches_nothing() {
        let mut p = pulse();
        let mut m = Motor::default();
        assert!(!p.step(5000, &mut m));
        assert_eq!(m.writes, 0);
    }

    #[test]
    fn explicit_long_cue() {
        let mut p = pulse();
        let mut m = Motor::default();
        p.trigger_for(100, 2000, 0, &mut m);
        assert!(!p.step(1999, &mut m));
        assert!(p.step(2000, &mut m));
    }

    #[test]
    fn failed_stop_is_retried_next_step() {
        let mut p = pulse();
        let mut m = Motor::default();
        p.trigger(70, 0, &mut m);
        m.failures = 2;
        assert!(!p.step(300, &mut m));
        assert!(!p.step(310, &mut m));
        assert!(p.is_running());
        assert_eq!(m.duty, 70);
        assert!(p.step(320, &mut m));
        assert_eq!(m.duty, 0);
        assert_eq!(p.state(), PulseState::Idle);
    }

    #[test]
    fn failed_start_leaves_pulse_idle() {
        let mut p = pulse();
        let mut m = Motor {
            failures: 1,
            ..Default::default()
        };
        assert!(!p.trigger(70, 0, &mut m));
        assert_eq!(p.state(), PulseState::Idle);
        assert!(p.trigger(70, 10, &mut m));
    }
}
