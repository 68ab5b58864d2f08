//! Reverse-click gesture composer for the action button.
//!
//! Sits on top of the button driver's `Press` / `Release` / `Hold` events
//! and resolves them into one semantic action per control pass.
//!
//! ```text
//!                    hold
//!   Idle(0) ───────────────────▶ HoldPending(1) ──released──▶ Idle   [HoldReleased]
//!     ▲                               │
//!     │                    held > long_hold_ms
//!     │                               ▼
//!     │                          LongHold(2)
//!     │                               │ released
//!     │                               ▼
//!     └──── window expired ──── ReverseWindow(3) ◀──┐
//!          [HoldReleased if up]       │ pressed     │ restart window
//!                                     └─[Reverse]───┘
//! ```
//!
//! A short press/release while idle resolves to `Click`.  The `Hold`
//! event itself resolves to `HoldStarted` unless a reverse check is in
//! progress.

use crate::config::GestureTiming;
use crate::tick::elapsed_ms;

/// Composer stage.  Stages that time something carry their start time, so
/// the stage and its timestamp always change together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStage {
    Idle,
    HoldPending { since_ms: u32 },
    LongHold,
    ReverseWindow { since_ms: u32 },
}

impl GestureStage {
    /// Numeric stage (0–3), as reported in logs.
    pub fn code(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::HoldPending { .. } => 1,
            Self::LongHold => 2,
            Self::ReverseWindow { .. } => 3,
        }
    }
}

/// Resolved semantic action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    /// Press-release without a hold.
    Click,
    /// A hold ended (release, or reverse window expiry with the button up).
    HoldReleased,
    /// Re-press inside the reverse window after a long hold.
    Reverse,
    /// The hold threshold was reached.
    HoldStarted,
}

impl GestureAction {
    /// Wire name used in gesture messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::HoldReleased => "buttonUp",
            Self::Reverse => "reverse",
            Self::HoldStarted => "buttonDown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    hold: bool,
    long_hold: bool,
    short_hold: bool,
    click: bool,
    reverse: bool,
}

pub struct GestureComposer {
    timing: GestureTiming,
    stage: GestureStage,
    pressed: bool,
    prev_pressed: bool,
    /// A reverse re-press was seen; suppresses `HoldStarted`.
    checking_reverse: bool,
    flags: Flags,
}

impl GestureComposer {
    pub fn new(timing: GestureTiming) -> Self {
        Self {
            timing,
            stage: GestureStage::Idle,
            pressed: false,
            prev_pressed: false,
            checking_reverse: false,
            flags: Flags::default(),
        }
    }

    pub fn stage(&self) -> GestureStage {
        self.stage
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn is_checking_reverse(&self) -> bool {
        self.checking_reverse
    }

    // ── Button event inputs ───────────────────────────────────

    pub fn on_press(&mut self) {
        self.pressed = true;
    }

    pub fn on_release(&mut self) {
        self.pressed = false;
    }

    /// The action button crossed the hold threshold.  Restarts the timer of
    /// the current stage, if it has one.
    pub fn on_hold(&mut self, now: u32) {
        self.flags.hold = true;
        match &mut self.stage {
            GestureStage::HoldPending { since_ms } | GestureStage::ReverseWindow { since_ms } => {
                *since_ms = now;
            }
            GestureStage::Idle | GestureStage::LongHold => {}
        }
    }

    // ── Transition function ───────────────────────────────────

    /// Advance the stage machine.  Call once per control pass, after the
    /// button poll.
    pub fn step(&mut self, now: u32) {
        let released_edge = self.prev_pressed && !self.pressed;
        let pressed_edge = !self.prev_pressed && self.pressed;

        if self.flags.hold && self.stage == GestureStage::Idle {
            self.stage = GestureStage::HoldPending { since_ms: now };
        }

        match self.stage {
            GestureStage::Idle if released_edge => self.flags.click = true,
            GestureStage::HoldPending { .. } if !self.pressed => {
                self.flags.short_hold = true;
                self.checking_reverse = false;
                self.stage = GestureStage::Idle;
            }
            GestureStage::HoldPending { since_ms }
                if elapsed_ms(now, since_ms) > self.timing.long_hold_ms =>
            {
                self.flags.long_hold = true;
                self.stage = GestureStage::LongHold;
            }
            _ => {}
        }

        if self.flags.long_hold && !self.pressed {
            self.flags.long_hold = false;
            self.stage = GestureStage::ReverseWindow { since_ms: now };
        }

        if let GestureStage::ReverseWindow { since_ms } = self.stage {
            if elapsed_ms(now, since_ms) > self.timing.reverse_window_ms {
                self.stage = GestureStage::Idle;
                if !self.pressed {
                    self.flags.short_hold = true;
                    self.checking_reverse = false;
                }
            } else if pressed_edge {
                self.stage = GestureStage::ReverseWindow { since_ms: now };
                self.flags.reverse = true;
                self.checking_reverse = true;
            }
        }

        self.prev_pressed = self.pressed;
    }

    /// Consume at most one resolved action, highest priority first.
    pub fn take_action(&mut self) -> Option<GestureAction> {
        let f = &mut self.flags;
        if f.reverse {
            f.reverse = false;
            Some(GestureAction::Reverse)
        } else if f.short_hold {
            f.short_hold = false;
            f.hold = false;
            Some(GestureAction::HoldReleased)
        } else if f.click {
            f.click = false;
            Some(GestureAction::Click)
        } else if f.hold && !self.checking_reverse {
            f.hold = false;
            Some(GestureAction::HoldStarted)
        } else {
            None
        }
    }

    /// `step` followed by `take_action`.
    pub fn resolve(&mut self, now: u32) -> Option<GestureAction> {
        self.step(now);
        self.take_action()
    }
}
