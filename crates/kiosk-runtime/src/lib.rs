#![forbid(unsafe_code)]

//! Elm-style runtime for the kiosk.
//!
//! A [`Model`] owns all state and reacts to messages in `update`. Side
//! effects come back as [`Cmd`] values: timers are scheduled and cancelled by
//! key through the [`Scheduler`], and the durable store is flushed through a
//! [`StateRegistry`]. [`Program`] drives a model in real time against a
//! [`Frontend`]; [`ProgramSimulator`] drives it against a virtual clock for
//! tests.

pub mod program;
pub mod scheduler;
pub mod simulator;
pub mod state_persistence;

pub use program::{Cmd, Frontend, Model, Program, ProgramConfig, TimerKey};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock};
pub use simulator::{CmdRecord, ProgramSimulator};
#[cfg(feature = "state-persistence")]
pub use state_persistence::FileStorage;
pub use state_persistence::{
    MemoryStorage, StateRegistry, StorageBackend, StorageError, StorageResult, StoredEntry,
};
