#![forbid(unsafe_code)]

//! The visit-registration form.
//!
//! [`KioskApp`](controller::KioskApp) is the root [`Model`](kiosk_runtime::Model).
//! It owns the four text fields, the on-screen keyboard, the
//! [`InactivityMonitor`](inactivity::InactivityMonitor), the
//! [`CodeSession`](code_session::CodeSession) and the
//! [`FormStore`](persistence::FormStore), and maps every UI message onto them.

pub mod code_display;
pub mod code_session;
pub mod config;
pub mod controller;
pub mod fields;
pub mod inactivity;
pub mod link;
pub mod persistence;

pub use code_display::{CodeRenderer, RenderError};
pub use config::KioskConfig;
pub use controller::{KioskApp, Msg, Status};
pub use fields::{FieldId, FieldValues, FormFields};
pub use link::{BuildError, LinkBuilder, LinkParts};
