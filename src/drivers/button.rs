//! Polled button driver with press, release, hold, repeat and multi-click
//! detection.
//!
//! ## Hardware
//!
//! Momentary switches read through [`InputPort`].  Each button declares its
//! idle level (`true` for the usual pull-up wiring), so active-low and
//! active-high switches are handled the same way.  `poll()` must run at a
//! fixed cadence (the control loop calls it every 10 ms); sampling at that
//! rate is what debounces the contacts.
//!
//! ## Event generation
//!
//! | Event          | Condition                                                   |
//! |----------------|-------------------------------------------------------------|
//! | `Press`        | Level leaves idle                                           |
//! | `Release`      | Level returns to idle (carries whether a hold was raised)   |
//! | `Hold`         | Pressed for `hold_threshold_ms`, once per press             |
//! | `OnHold`       | Every `on_hold_repeat_ms` after `Hold` while still pressed  |
//! | `DoubleClick`  | Second press within `double_click_window_ms` of the last    |
//! | `TripleClick`  | Third press in the same run; the counter then resets        |
//!
//! Within one poll, events for a button are emitted in the order
//! multi-click, press, release, hold, on-hold.  Events are dispatched
//! synchronously to at most one callback per [`ButtonEventKind`].

use heapless::Vec;
use log::{debug, error, info, warn};

use crate::app::ports::InputPort;
use crate::config::ButtonTiming;
use crate::error::Error;
use crate::tick::{TickFn, elapsed_ms};

/// Maximum number of buttons a driver instance can manage.
pub const MAX_BUTTONS: usize = 5;

/// Upper bound on events produced by one poll (4 per button).
pub const MAX_EVENTS_PER_POLL: usize = MAX_BUTTONS * 4;

// ── Configuration ─────────────────────────────────────────────

/// Role of a physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonType {
    /// BOOT strap button (factory reset on hold).
    Boot,
    /// Handle button that arms the hit detector and drives gestures.
    Action,
}

/// Static description of one button plus the last level the driver saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonConfig {
    pub pin: i32,
    /// Level read while the button is not pressed.
    pub idle_level: bool,
    pub button_type: ButtonType,
    /// Last sampled level.  Starts at `idle_level`.
    pub last_level: bool,
}

impl ButtonConfig {
    pub const fn new(pin: i32, idle_level: bool, button_type: ButtonType) -> Self {
        Self {
            pin,
            idle_level,
            button_type,
            last_level: idle_level,
        }
    }
}

// ── Events ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    Release { had_hold: bool },
    Hold { held_ms: u32 },
    OnHold { held_ms: u32 },
    DoubleClick,
    TripleClick,
}

impl ButtonEvent {
    pub fn kind(&self) -> ButtonEventKind {
        match self {
            Self::Press => ButtonEventKind::Press,
            Self::Release { .. } => ButtonEventKind::Release,
            Self::Hold { .. } => ButtonEventKind::Hold,
            Self::OnHold { .. } => ButtonEventKind::OnHold,
            Self::DoubleClick => ButtonEventKind::DoubleClick,
            Self::TripleClick => ButtonEventKind::TripleClick,
        }
    }
}

/// Discriminant used to index the callback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEventKind {
    Press = 0,
    Release = 1,
    Hold = 2,
    OnHold = 3,
    DoubleClick = 4,
    TripleClick = 5,
}

impl ButtonEventKind {
    pub const COUNT: usize = 6;
}

/// Event handler: receives the button index, the event, and the caller's
/// context for this poll.
pub type ButtonCallback<C> = fn(usize, ButtonEvent, &mut C);

/// Events produced by a single poll, in emission order.
pub type EventBatch = Vec<(usize, ButtonEvent), MAX_EVENTS_PER_POLL>;

// ── Per-button runtime ────────────────────────────────────────

const PENDING_PRESS: u8 = 1 << 0;
const PENDING_RELEASE: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, Default)]
struct ButtonRuntime {
    /// Time of the current press edge; `None` while released.
    hold_start: Option<u32>,
    /// Time of the last `Hold`/`OnHold` emission in this press.
    on_hold_at: u32,
    /// Time of the previous press edge, for multi-click detection.
    last_press: Option<u32>,
    press_count: u8,
    /// `Hold` already raised for the current press.
    hold_raised: bool,
    /// Edges sampled this poll, not yet turned into events.
    pending: u8,
}

// ── Driver ────────────────────────────────────────────────────

pub struct ButtonDriver<C> {
    timing: ButtonTiming,
    buttons: Vec<(ButtonConfig, ButtonRuntime), MAX_BUTTONS>,
    callbacks: [Option<ButtonCallback<C>>; ButtonEventKind::COUNT],
    tick: Option<TickFn>,
    warned_no_tick: bool,
}

impl<C> ButtonDriver<C> {
    pub fn new(timing: ButtonTiming) -> Self {
        Self {
            timing,
            buttons: Vec::new(),
            callbacks: [None; ButtonEventKind::COUNT],
            tick: None,
            warned_no_tick: false,
        }
    }

    /// Register the button set, replacing any previous registration.
    ///
    /// More than [`MAX_BUTTONS`] configs is rejected and leaves the current
    /// registration untouched.  An empty slice is valid: the driver keeps
    /// running with nothing to poll.
    pub fn init(&mut self, configs: &[ButtonConfig]) -> Result<(), Error> {
        if configs.len() > MAX_BUTTONS {
            error!(
                "button: {} configs exceed capacity {}, ignoring init",
                configs.len(),
                MAX_BUTTONS
            );
            return Err(Error::Config("too many buttons"));
        }

        self.buttons.clear();
        for cfg in configs {
            // Capacity checked above.
            let _ = self.buttons.push((*cfg, ButtonRuntime::default()));
        }
        info!("button: {} button(s) registered", self.buttons.len());
        Ok(())
    }

    /// Install (or replace) the handler for one event kind.  `None` is
    /// ignored so an existing handler is never cleared by accident.
    pub fn set_callback(&mut self, kind: ButtonEventKind, callback: Option<ButtonCallback<C>>) {
        match callback {
            Some(cb) => self.callbacks[kind as usize] = Some(cb),
            None => warn!("button: null callback for {:?} ignored", kind),
        }
    }

    pub fn set_tick_source(&mut self, tick: TickFn) {
        self.tick = Some(tick);
        self.warned_no_tick = false;
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn config(&self, index: usize) -> Option<&ButtonConfig> {
        self.buttons.get(index).map(|(cfg, _)| cfg)
    }

    /// Whether the button at `index` is currently held down.
    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons
            .get(index)
            .is_some_and(|(_, rt)| rt.hold_start.is_some())
    }

    /// Poll every button using the installed tick source.
    ///
    /// Without a tick source nothing is sampled and an empty batch is
    /// returned (logged once).
    pub fn poll(&mut self, input: &mut impl InputPort, ctx: &mut C) -> EventBatch {
        let Some(tick) = self.tick else {
            if !self.warned_no_tick {
                warn!("button: poll() before set_tick_source(), skipping");
                self.warned_no_tick = true;
            }
            return EventBatch::new();
        };
        self.poll_at(input, tick(), ctx)
    }

    /// Poll every button at an explicit time, dispatch the resulting events
    /// and return them.
    pub fn poll_at(&mut self, input: &mut impl InputPort, now: u32, ctx: &mut C) -> EventBatch {
        let mut batch = EventBatch::new();

        for (index, (cfg, rt)) in self.buttons.iter_mut().enumerate() {
            let level = match input.read_level(cfg.pin) {
                Ok(level) => level,
                Err(e) => {
                    debug!("button: GPIO{} read failed ({}), skipping", cfg.pin, e);
                    continue;
                }
            };

            // 1. Edge detection.
            if level != cfg.last_level {
                cfg.last_level = level;
                if level == cfg.idle_level {
                    rt.pending |= PENDING_RELEASE;
                } else {
                    rt.pending |= PENDING_PRESS;
                    rt.hold_start = Some(now);
                }
            }

            // 2. Press: multi-click classification, then the press itself.
            if rt.pending & PENDING_PRESS != 0 {
                let multi = match rt.last_press {
                    Some(prev) if elapsed_ms(now, prev) < self.timing.double_click_window_ms => {
                        rt.press_count += 1;
                        if rt.press_count >= 2 {
                            rt.press_count = 0;
                            Some(ButtonEvent::TripleClick)
                        } else {
                            Some(ButtonEvent::DoubleClick)
                        }
                    }
                    _ => {
                        rt.press_count = 0;
                        None
                    }
                };
                rt.last_press = Some(now);

                if let Some(ev) = multi {
                    let _ = batch.push((index, ev));
                }
                let _ = batch.push((index, ButtonEvent::Press));
            }

            // 3. Release clears all hold bookkeeping for this press.
            if rt.pending & PENDING_RELEASE != 0 {
                let _ = batch.push((
                    index,
                    ButtonEvent::Release {
                        had_hold: rt.hold_raised,
                    },
                ));
                rt.hold_start = None;
                rt.hold_raised = false;
                rt.on_hold_at = 0;
            }
            rt.pending = 0;

            // 4. Hold once, then periodic repeats.
            if let Some(start) = rt.hold_start {
                let held_ms = elapsed_ms(now, start);
                if !rt.hold_raised {
                    if held_ms >= self.timing.hold_threshold_ms {
                        rt.hold_raised = true;
                        rt.on_hold_at = now;
                        let _ = batch.push((index, ButtonEvent::Hold { held_ms }));
                    }
                } else if elapsed_ms(now, rt.on_hold_at) >= self.timing.on_hold_repeat_ms {
                    rt.on_hold_at = now;
                    let _ = batch.push((index, ButtonEvent::OnHold { held_ms }));
                }
            }
        }

        for &(index, event) in &batch {
            if let Some(cb) = self.callbacks[event.kind() as usize] {
                cb(index, event, ctx);
            }
        }

        batch
    }
}
