#![forbid(unsafe_code)]

//! Virtual-time driver for models.
//!
//! `ProgramSimulator` runs a [`Model`] against a [`ManualClock`]. Timers only
//! fire when the test calls [`advance`](ProgramSimulator::advance), so a
//! two-minute inactivity timeout runs in microseconds and always fires in the
//! same order.
//!
//! # Example
//!
//! ```ignore
//! use kiosk_runtime::ProgramSimulator;
//! use std::time::Duration;
//!
//! let mut sim = ProgramSimulator::new(app);
//! sim.init();
//! sim.advance(Duration::from_secs(60));
//! assert!(sim.model().warning_visible());
//! ```

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::event::Event;

use crate::program::{Cmd, Model, TimerKey};
use crate::scheduler::{Clock, ManualClock, Scheduler};
use crate::state_persistence::StateRegistry;

/// What the simulator did, in order. Tests assert on this instead of on
/// wall-clock effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    Quit,
    /// Message fed back into update (not stored, just noted).
    Msg,
    Batch(usize),
    Log(String),
    Schedule { key: TimerKey, after: Duration },
    Cancel(TimerKey),
    SaveState,
    /// A scheduled timer came due and was delivered.
    TimerFired(TimerKey),
}

/// Runs a [`Model`] on a virtual clock.
pub struct ProgramSimulator<M: Model> {
    model: M,
    clock: ManualClock,
    scheduler: Scheduler<M::Message>,
    command_log: Vec<CmdRecord>,
    running: bool,
    logs: Vec<String>,
    state_registry: Option<Arc<StateRegistry>>,
}

impl<M: Model> ProgramSimulator<M> {
    /// Create a simulator. The model is not initialized until
    /// [`init`](Self::init) is called.
    pub fn new(model: M) -> Self {
        Self {
            model,
            clock: ManualClock::new(),
            scheduler: Scheduler::new(),
            command_log: Vec::new(),
            running: true,
            logs: Vec::new(),
            state_registry: None,
        }
    }

    /// Create a simulator whose `Cmd::SaveState` flushes through `registry`.
    pub fn with_registry(model: M, registry: Arc<StateRegistry>) -> Self {
        let mut sim = Self::new(model);
        sim.state_registry = Some(registry);
        sim
    }

    /// Call `Model::init()` and execute the returned commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Deliver raw input the way a frontend without an `interpret` hook
    /// would.
    pub fn inject_event(&mut self, event: Event) {
        self.send(M::Message::from(event));
    }

    /// Dispatch a message through `Model::update()`. Ignored after quit.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Move virtual time forward by `delta`, delivering every timer that
    /// comes due. The clock stops at each deadline while that timer's
    /// message is handled, so timers scheduled in response are measured
    /// from the moment they were requested.
    pub fn advance(&mut self, delta: Duration) {
        let target = self.clock.now() + delta;
        while self.running {
            let Some((key, deadline, msg)) = self.scheduler.pop_due(target) else {
                break;
            };
            self.clock.set(deadline);
            self.command_log.push(CmdRecord::TimerFired(key));
            let cmd = self.model.update(msg);
            self.execute_cmd(cmd);
        }
        self.clock.set(target);
    }

    /// Run the model's shutdown hook, then drop every pending timer.
    pub fn shutdown(&mut self) {
        let cmd = self.model.shutdown();
        self.scheduler.clear();
        self.running = false;
        self.execute_cmd(cmd);
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Keys of pending timers in firing order.
    pub fn pending_timers(&self) -> Vec<TimerKey> {
        self.scheduler.pending_keys()
    }

    /// Absolute virtual deadline of the timer under `key`.
    pub fn timer_deadline(&self, key: &str) -> Option<Duration> {
        self.scheduler.deadline(key)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// `false` after a `Cmd::Quit` or [`shutdown`](Self::shutdown).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Log messages emitted via `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Number of `SaveState` commands executed so far.
    pub fn save_count(&self) -> usize {
        self.command_log
            .iter()
            .filter(|r| **r == CmdRecord::SaveState)
            .count()
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
            Cmd::Schedule { key, after, msg } => {
                if self.running {
                    self.command_log.push(CmdRecord::Schedule { key, after });
                    self.scheduler.schedule(key, self.clock.now(), after, msg);
                }
            }
            Cmd::Cancel(key) => {
                self.command_log.push(CmdRecord::Cancel(key));
                self.scheduler.cancel(key);
            }
            Cmd::SaveState => {
                self.command_log.push(CmdRecord::SaveState);
                if let Some(registry) = &self.state_registry {
                    let _ = registry.flush();
                }
            }
        }
    }
}
