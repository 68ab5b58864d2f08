//! Hammer hit detector.
//!
//! Two-state machine over the dominant accelerometer axis, sampled every
//! control tick:
//!
//! ```text
//!   Idle ──|a| > threshold──▶ Armed{since}
//!    ▲                          │
//!    └── now - since > confirm ─┘  (reports one hit)
//! ```
//!
//! The hit is reported only after the confirm window elapses, so the
//! ringing that follows an impact never produces a second hit.  Samples
//! taken while armed are ignored.

use crate::config::HitDetectorConfig;
use crate::tick::elapsed_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitState {
    Idle,
    Armed { since_ms: u32 },
}

pub struct HitDetector {
    config: HitDetectorConfig,
    state: HitState,
}

impl HitDetector {
    pub fn new(config: HitDetectorConfig) -> Self {
        Self {
            config,
            state: HitState::Idle,
        }
    }

    pub fn state(&self) -> HitState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = HitState::Idle;
    }

    /// Feed one sample (milli-g).  Returns `true` exactly once per
    /// confirmed hit.
    pub fn step(&mut self, sample_mg: i32, now: u32) -> bool {
        match self.state {
            HitState::Idle => {
                if sample_mg.unsigned_abs() > self.config.threshold_mg {
                    self.state = HitState::Armed { since_ms: now };
                }
                false
            }
            HitState::Armed { since_ms } => self.confirm(since_ms, now),
        }
    }

    /// Gated poll used by the control loop.
    ///
    /// A closed gate (user not holding the handle) drops any armed
    /// excursion instead of merely pausing evaluation, so releasing the
    /// handle inside the confirm window never reports a hit and a spike
    /// from one grip cannot confirm during the next.  A missing sample
    /// (bus error) cannot arm the detector but still lets an armed window
    /// expire.
    pub fn poll(&mut self, sample_mg: Option<i32>, gate_open: bool, now: u32) -> bool {
        if !gate_open {
            self.reset();
            return false;
        }
        match (self.state, sample_mg) {
            (HitState::Armed { since_ms }, _) => self.confirm(since_ms, now),
            (HitState::Idle, Some(sample)) => self.step(sample, now),
            (HitState::Idle, None) => false,
        }
    }

    fn confirm(&mut self, since_ms: u32, now: u32) -> bool {
        if elapsed_ms(now, since_ms) > self.config.confirm_ms {
            self.state = HitState::Idle;
            log::info!("hit: confirmed ({} ms after threshold)", elapsed_ms(now, since_ms));
            true
        } else {
            false
        }
    }
}
