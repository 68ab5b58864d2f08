//! Cooperative polling scheduler.
//!
//! A fixed table of periodic tasks, each with its own period and a
//! connectivity gate.  The main loop calls [`Scheduler::tick`] with the
//! current time; due tasks are handed to a [`TaskDelegate`] in table order,
//! so the control pass always runs before the outbound pass of the same
//! tick.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      main loop (10 ms)                   │
//! │                             │                            │
//! │                             ▼                            │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │ Scheduler.tick(now)                                │  │
//! │  │   Control   every 10 ms   ── always                │  │
//! │  │   Outbound  every 100 ms  ── only while MQTT is up │  │
//! │  └─────────────────────────┬──────────────────────────┘  │
//! │                            ▼                             │
//! │                   TaskDelegate.run_task()                │
//! │          (HammerService.tick / OutboundSender.run)       │
//! └──────────────────────────────────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::app::ports::{TaskDelegate, TaskId};
use crate::config::SchedulerTiming;
use crate::state::DeviceState;
use crate::tick::elapsed_ms;

/// Maximum number of periodic tasks (stack-allocated).
const MAX_TASKS: usize = 4;

/// A task counts as due this much before its period has fully elapsed.
/// The loop sleeps one control period and `millis()` truncates, so a wake
/// that lands a fraction of a millisecond early must still run the task.
const EARLY_SLACK_MS: u32 = 1;

/// Condition a task needs before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskGate {
    Always,
    /// Skipped while the broker session is down.  The period timer keeps
    /// running, so the task fires on the first tick after reconnecting.
    MqttConnected,
}

impl TaskGate {
    fn is_open(&self, state: &DeviceState) -> bool {
        match self {
            Self::Always => true,
            Self::MqttConnected => state.mqtt_connected(),
        }
    }
}

/// One row of the task table.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTask {
    pub id: TaskId,
    pub period_ms: u32,
    pub gate: TaskGate,
    last_run: Option<u32>,
}

impl PeriodicTask {
    pub const fn new(id: TaskId, period_ms: u32, gate: TaskGate) -> Self {
        Self {
            id,
            period_ms,
            gate,
            last_run: None,
        }
    }

    fn is_due(&self, now: u32) -> bool {
        match self.last_run {
            None => true,
            Some(last) => elapsed_ms(now, last).saturating_add(EARLY_SLACK_MS) >= self.period_ms,
        }
    }
}

pub struct Scheduler {
    tasks: heapless::Vec<PeriodicTask, MAX_TASKS>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
        }
    }

    /// The firmware's standard table: control pass, then outbound pass.
    pub fn from_config(timing: &SchedulerTiming) -> Self {
        let mut s = Self::new();
        s.add(PeriodicTask::new(
            TaskId::Control,
            timing.control_interval_ms,
            TaskGate::Always,
        ));
        s.add(PeriodicTask::new(
            TaskId::Outbound,
            timing.outbound_interval_ms,
            TaskGate::MqttConnected,
        ));
        s
    }

    /// Append a task.  Returns its slot, or `None` if the table is full.
    pub fn add(&mut self, task: PeriodicTask) -> Option<usize> {
        let slot = self.tasks.len();
        match self.tasks.push(task) {
            Ok(()) => {
                info!(
                    "Scheduler: {:?} every {} ms ({:?}) at slot {}",
                    task.id, task.period_ms, task.gate, slot
                );
                Some(slot)
            }
            Err(_) => {
                warn!("Scheduler: table full, {:?} not added", task.id);
                None
            }
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Run every due task whose gate is open.  Returns how many ran.
    pub fn tick(&mut self, now: u32, state: &DeviceState, delegate: &mut dyn TaskDelegate) -> usize {
        let mut ran = 0;
        for task in self.tasks.iter_mut() {
            if !task.is_due(now) {
                continue;
            }
            if !task.gate.is_open(state) {
                debug!("Scheduler: {:?} gated", task.id);
                continue;
            }
            task.last_run = Some(now);
            delegate.run_task(task.id, now);
            ran += 1;
        }
        ran
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
