#![forbid(unsafe_code)]

//! Two-stage inactivity timer.
//!
//! Arming schedules two timers from the same instant: a warning after
//! `warn_after` and a hard reset after `reset_after`. While the warning is
//! up, a 1 s tick counts down the seconds left until the reset.
//!
//! Every arm bumps an epoch that the timer messages carry. The arm command
//! cancels all three keys before scheduling the new pair, and any message
//! from an older epoch is dropped in [`update`](InactivityMonitor::update),
//! so a stale warning or reset can never land after a rearm.
//!
//! A hard reset disarms the monitor. It stays quiet until the next activity
//! signal arms it again.

use std::time::Duration;

use kiosk_core::countdown::Countdown;
use kiosk_runtime::{Cmd, TimerKey};
use tracing::{debug, info};

pub const WARN_KEY: TimerKey = "inactivity.warn";
pub const RESET_KEY: TimerKey = "inactivity.reset";
pub const TICK_KEY: TimerKey = "inactivity.tick";

const TICK: Duration = Duration::from_secs(1);

/// Timer messages. Each carries the epoch it was scheduled under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityMsg {
    Warn { epoch: u64 },
    Reset { epoch: u64 },
    Tick { epoch: u64 },
}

impl InactivityMsg {
    pub const fn epoch(self) -> u64 {
        match self {
            Self::Warn { epoch } | Self::Reset { epoch } | Self::Tick { epoch } => epoch,
        }
    }
}

/// What a timer message did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InactivityOutcome {
    /// Nothing visible changed.
    Idle,
    WarningShown,
    /// The warning countdown dropped by one second.
    Ticked,
    /// The form must be wiped.
    HardReset,
}

#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    warn_after: Duration,
    reset_after: Duration,
    epoch: u64,
    warning: Countdown,
    warning_visible: bool,
    armed: bool,
    suspended: bool,
}

impl InactivityMonitor {
    /// Create a disarmed monitor. `reset_after` is clamped to at least one
    /// second past `warn_after`.
    pub fn new(warn_after: Duration, reset_after: Duration) -> Self {
        let reset_after = reset_after.max(warn_after.saturating_add(TICK));
        let window = (reset_after - warn_after).as_secs().max(1);
        Self {
            warn_after,
            reset_after,
            epoch: 0,
            warning: Countdown::new(window),
            warning_visible: false,
            armed: false,
            suspended: false,
        }
    }

    pub fn warn_after(&self) -> Duration {
        self.warn_after
    }

    pub fn reset_after(&self) -> Duration {
        self.reset_after
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    /// Seconds shown in the warning.
    pub fn remaining_secs(&self) -> u64 {
        self.warning.remaining()
    }

    /// Start (or restart) both deadlines from now and hide the warning.
    pub fn arm(&mut self) -> Cmd<InactivityMsg> {
        self.epoch = self.epoch.wrapping_add(1);
        self.armed = true;
        self.hide_warning();
        let epoch = self.epoch;
        debug!(target: "kiosk::inactivity", epoch, "armed");
        Cmd::batch(vec![
            Cmd::cancel(WARN_KEY),
            Cmd::cancel(RESET_KEY),
            Cmd::cancel(TICK_KEY),
            Cmd::schedule(WARN_KEY, self.warn_after, InactivityMsg::Warn { epoch }),
            Cmd::schedule(RESET_KEY, self.reset_after, InactivityMsg::Reset { epoch }),
        ])
    }

    /// A user-activity signal. Rearms unless suspended.
    pub fn activity(&mut self) -> Cmd<InactivityMsg> {
        if self.suspended {
            return Cmd::none();
        }
        self.arm()
    }

    pub fn update(&mut self, msg: InactivityMsg) -> (InactivityOutcome, Cmd<InactivityMsg>) {
        if !self.armed || msg.epoch() != self.epoch {
            debug!(
                target: "kiosk::inactivity",
                ?msg,
                current = self.epoch,
                "stale timer dropped"
            );
            return (InactivityOutcome::Idle, Cmd::none());
        }
        match msg {
            InactivityMsg::Warn { epoch } => {
                self.warning_visible = true;
                self.warning.start();
                info!(
                    target: "kiosk::inactivity",
                    seconds = self.warning.remaining(),
                    "inactivity warning"
                );
                (
                    InactivityOutcome::WarningShown,
                    Cmd::schedule(TICK_KEY, TICK, InactivityMsg::Tick { epoch }),
                )
            }
            InactivityMsg::Tick { epoch } => {
                if !self.warning_visible {
                    return (InactivityOutcome::Idle, Cmd::none());
                }
                if self.warning.tick() {
                    return self.hard_reset("countdown");
                }
                (
                    InactivityOutcome::Ticked,
                    Cmd::schedule(TICK_KEY, TICK, InactivityMsg::Tick { epoch }),
                )
            }
            InactivityMsg::Reset { .. } => self.hard_reset("deadline"),
        }
    }

    /// "Continue": dismiss the warning and rearm. Form data is untouched.
    pub fn continue_session(&mut self) -> Cmd<InactivityMsg> {
        if self.suspended {
            self.hide_warning();
            return Cmd::none();
        }
        self.arm()
    }

    /// "Exit": hard reset right away.
    pub fn exit(&mut self) -> (InactivityOutcome, Cmd<InactivityMsg>) {
        self.hard_reset("exit")
    }

    /// Stop all timers and ignore activity until [`resume`](Self::resume).
    pub fn suspend(&mut self) -> Cmd<InactivityMsg> {
        self.suspended = true;
        self.disarm()
    }

    pub fn resume(&mut self) -> Cmd<InactivityMsg> {
        self.suspended = false;
        self.arm()
    }

    fn hard_reset(&mut self, cause: &'static str) -> (InactivityOutcome, Cmd<InactivityMsg>) {
        info!(target: "kiosk::inactivity", cause, "inactivity reset");
        (InactivityOutcome::HardReset, self.disarm())
    }

    fn disarm(&mut self) -> Cmd<InactivityMsg> {
        self.epoch = self.epoch.wrapping_add(1);
        self.armed = false;
        self.hide_warning();
        Cmd::batch(vec![
            Cmd::cancel(WARN_KEY),
            Cmd::cancel(RESET_KEY),
            Cmd::cancel(TICK_KEY),
        ])
    }

    fn hide_warning(&mut self) {
        self.warning_visible = false;
        self.warning.stop();
    }
}

impl Default for InactivityMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(120))
    }
}
