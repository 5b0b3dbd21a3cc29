#![forbid(unsafe_code)]

//! Whole-second countdown.
//!
//! The warning banner and the code modal both show a number of seconds that
//! drops by one on every 1 s tick. [`Countdown`] holds that number; the
//! runtime scheduler delivers the ticks.
//!
//! ```rust
//! use kiosk_core::countdown::Countdown;
//!
//! let mut c = Countdown::new(2);
//! c.start();
//! assert!(!c.tick());
//! assert_eq!(c.remaining(), 1);
//! assert!(c.tick());
//! assert!(c.finished());
//! ```

/// State for a seconds countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration: u64,
    remaining: u64,
    running: bool,
}

impl Countdown {
    /// Creates a countdown of `seconds`, initially stopped.
    pub fn new(seconds: u64) -> Self {
        Self {
            duration: seconds,
            remaining: seconds,
            running: false,
        }
    }

    /// Returns the configured duration in seconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Returns the remaining seconds.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns whether the countdown is running and not yet finished.
    pub fn running(&self) -> bool {
        self.running && !self.finished()
    }

    /// Returns whether the countdown has reached zero.
    pub fn finished(&self) -> bool {
        self.remaining == 0
    }

    /// Starts the countdown from its full duration.
    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.running = true;
    }

    /// Stops the countdown, leaving the remaining value untouched.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Applies one 1 s tick.
    ///
    /// Returns `true` exactly once: on the tick that reaches zero. A stopped
    /// or finished countdown ignores ticks.
    pub fn tick(&mut self) -> bool {
        if !self.running() {
            return false;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.running = false;
            return true;
        }
        self.remaining -= 1;
        false
    }
}
