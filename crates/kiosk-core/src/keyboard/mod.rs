#![forbid(unsafe_code)]

//! On-screen keyboard.
//!
//! [`layout`] holds the static key grids; [`engine`] holds the shift/caps
//! state machine and the logic that edits the focused field through a
//! [`FieldHost`](crate::focus::FieldHost).

pub mod engine;
pub mod layout;

pub use engine::{
    KeyOutcome, KeyboardState, PointerPhase, SurfaceEvent, SurfaceResponse, SurfaceTarget,
    TabPolicy, VirtualKeyboard,
};
pub use layout::{KeyDef, KeyKind, KeyRef, LayoutKind, ShiftSide};
