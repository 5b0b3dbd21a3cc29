#![forbid(unsafe_code)]

//! Visit kiosk public facade crate.
//!
//! Re-exports the types a binary needs to run the kiosk and offers a
//! prelude plus one error type covering every fallible layer.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use kiosk_core::event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseEvent};
pub use kiosk_core::geometry::{Rect, Viewport};
pub use kiosk_core::keyboard::{LayoutKind, TabPolicy, VirtualKeyboard};
pub use kiosk_core::{Lang, TextField, sanitize};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "state-persistence")]
pub use kiosk_runtime::FileStorage;
pub use kiosk_runtime::{
    Cmd, Frontend, MemoryStorage, Model, Program, ProgramConfig, ProgramSimulator, StateRegistry,
    StorageError,
};

// --- Form re-exports -------------------------------------------------------

pub use kiosk_form::{
    BuildError, CodeRenderer, FieldId, KioskApp, KioskConfig, LinkBuilder, Msg, RenderError,
    Status,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for kiosk binaries.
#[derive(Debug)]
pub enum Error {
    /// Terminal or file I/O.
    Io(std::io::Error),
    /// The durable store failed.
    Storage(StorageError),
    /// A link could not be built.
    Link(BuildError),
    /// The code renderer failed.
    Render(RenderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage: {err}"),
            Self::Link(err) => write!(f, "link: {err}"),
            Self::Render(err) => write!(f, "render: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Link(err) => Some(err),
            Self::Render(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Self::Link(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

/// Standard result type for kiosk binaries.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cmd, Error, Event, FieldId, KioskApp, KioskConfig, Lang, Model, Msg, Program, Result,
        StateRegistry, Viewport,
    };

    pub use crate::{core, form, runtime};
}

pub use kiosk_core as core;
pub use kiosk_form as form;
pub use kiosk_runtime as runtime;
