#![forbid(unsafe_code)]

//! The display-code modal.
//!
//! Opening a session captures the link and starts a whole-second countdown.
//! The countdown reaching zero and the "done" button end the session the
//! same way; the controller wipes the form in both cases. Replacing the link
//! (after a language change) leaves the countdown where it is.

use std::time::Duration;

use kiosk_core::countdown::Countdown;
use kiosk_runtime::{Cmd, TimerKey};
use tracing::{debug, info};

pub const TICK_KEY: TimerKey = "code.tick";

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMsg {
    Tick { epoch: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeOutcome {
    Idle,
    Ticked,
    /// The countdown reached zero. The caller finishes the session.
    Expired,
}

#[derive(Debug, Clone)]
pub struct CodeSession {
    url: Option<String>,
    countdown: Countdown,
    epoch: u64,
}

impl CodeSession {
    /// A closed session lasting `seconds` (at least one) once opened.
    pub fn new(seconds: u64) -> Self {
        Self {
            url: None,
            countdown: Countdown::new(seconds.max(1)),
            epoch: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.url.is_some()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn duration_secs(&self) -> u64 {
        self.countdown.duration()
    }

    /// Show `url` and start the countdown from the full duration.
    pub fn open(&mut self, url: String) -> Cmd<CodeMsg> {
        self.epoch = self.epoch.wrapping_add(1);
        self.countdown.start();
        info!(
            target: "kiosk::code",
            seconds = self.countdown.remaining(),
            "code session opened"
        );
        self.url = Some(url);
        Cmd::schedule(TICK_KEY, TICK, CodeMsg::Tick { epoch: self.epoch })
    }

    /// Swap the displayed link. Returns `false` when no session is open.
    pub fn replace_url(&mut self, url: String) -> bool {
        if !self.is_active() {
            return false;
        }
        debug!(
            target: "kiosk::code",
            remaining = self.countdown.remaining(),
            "code link replaced"
        );
        self.url = Some(url);
        true
    }

    pub fn update(&mut self, msg: CodeMsg) -> (CodeOutcome, Cmd<CodeMsg>) {
        let CodeMsg::Tick { epoch } = msg;
        if !self.is_active() || epoch != self.epoch {
            return (CodeOutcome::Idle, Cmd::none());
        }
        if self.countdown.tick() {
            return (CodeOutcome::Expired, Cmd::none());
        }
        (
            CodeOutcome::Ticked,
            Cmd::schedule(TICK_KEY, TICK, CodeMsg::Tick { epoch }),
        )
    }

    /// Close the session and stop its timer.
    pub fn finish(&mut self) -> Cmd<CodeMsg> {
        self.epoch = self.epoch.wrapping_add(1);
        self.countdown.stop();
        if self.url.take().is_some() {
            info!(target: "kiosk::code", "code session finished");
        }
        Cmd::cancel(TICK_KEY)
    }
}

impl Default for CodeSession {
    fn default() -> Self {
        Self::new(180)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_schedules_first_tick() {
        let mut s = CodeSession::default();
        let cmd = s.open("https://x.test/#/qr/th/a/b/c/-/1".into());
        assert!(matches!(
            cmd,
            Cmd::Schedule { key: TICK_KEY, msg: CodeMsg::Tick { epoch: 1 }, .. }
        ));
        assert!(s.is_active());
        assert_eq!(s.remaining_secs(), 180);
    }

    #[test]
    fn expires_after_duration() {
        let mut s = CodeSession::new(3);
        let _ = s.open("u".into());
        assert_eq!(s.update(CodeMsg::Tick { epoch: 1 }).0, CodeOutcome::Ticked);
        assert_eq!(s.update(CodeMsg::Tick { epoch: 1 }).0, CodeOutcome::Ticked);
        let (outcome, cmd) = s.update(CodeMsg::Tick { epoch: 1 });
        assert_eq!(outcome, CodeOutcome::Expired);
        assert!(cmd.is_none());
        assert_eq!(s.remaining_secs(), 0);
    }

    #[test]
    fn replace_keeps_countdown() {
        let mut s = CodeSession::new(10);
        let _ = s.open("first".into());
        let _ = s.update(CodeMsg::Tick { epoch: 1 });
        assert!(s.replace_url("second".into()));
        assert_eq!(s.url(), Some("second"));
        assert_eq!(s.remaining_secs(), 9);
    }

    #[test]
    fn replace_without_session_is_refused() {
        let mut s = CodeSession::default();
        assert!(!s.replace_url("x".into()));
        assert_eq!(s.url(), None);
    }

    #[test]
    fn finish_cancels_and_drops_late_ticks() {
        let mut s = CodeSession::new(10);
        let _ = s.open("u".into());
        assert!(matches!(s.finish(), Cmd::Cancel(TICK_KEY)));
        assert!(!s.is_active());
        assert_eq!(s.update(CodeMsg::Tick { epoch: 1 }).0, CodeOutcome::Idle);
    }

    #[test]
    fn reopen_restarts_from_full() {
        let mut s = CodeSession::new(10);
        let _ = s.open("a".into());
        let _ = s.update(CodeMsg::Tick { epoch: 1 });
        let _ = s.finish();
        let _ = s.open("b".into());
        assert_eq!(s.remaining_secs(), 10);
        assert_eq!(s.update(CodeMsg::Tick { epoch: 1 }).0, CodeOutcome::Idle);
    }
}
