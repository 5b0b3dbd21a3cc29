#![forbid(unsafe_code)]

//! Core: input events, editable text fields, the field sanitizer, and the
//! on-screen keyboard engine.
//!
//! Nothing in this crate owns a clock or a store. Timers and persistence live
//! in `kiosk-runtime`; the form itself lives in `kiosk-form`.

pub mod countdown;
pub mod event;
pub mod focus;
pub mod geometry;
pub mod keyboard;
pub mod locale;
pub mod sanitize;
pub mod text_field;

pub use focus::{FieldHandle, FieldHost};
pub use locale::Lang;
pub use sanitize::sanitize;
pub use text_field::TextField;

