#![forbid(unsafe_code)]

//! Seam to whatever draws the scannable code.
//!
//! The kiosk only supplies a payload and an edge length in pixels. Encoding
//! and drawing belong to the renderer.

use std::fmt;
use std::io;

/// Errors from a [`CodeRenderer`].
#[derive(Debug)]
pub enum RenderError {
    /// The renderer cannot do this (for example, export from a text
    /// terminal).
    Unsupported(&'static str),
    /// The payload cannot be encoded.
    Payload(String),
    /// Writing the output failed.
    Io(io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "renderer does not support {what}"),
            Self::Payload(reason) => write!(f, "cannot encode payload: {reason}"),
            Self::Io(e) => write!(f, "render I/O error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Draws the code for a payload.
pub trait CodeRenderer: Send {
    /// Draw `payload` at `size_px` square. Called when a session opens and
    /// whenever its link is rebuilt.
    fn render(&mut self, payload: &str, size_px: u32) -> Result<(), RenderError>;

    /// Read back the last drawn code as image bytes.
    fn export_image(&mut self) -> Result<Vec<u8>, RenderError>;
}

/// Renderer that accepts every payload and exports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl CodeRenderer for NullRenderer {
    fn render(&mut self, _payload: &str, _size_px: u32) -> Result<(), RenderError> {
        Ok(())
    }

    fn export_image(&mut self) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::Unsupported("image export"))
    }
}

impl<R: CodeRenderer + ?Sized> CodeRenderer for Box<R> {
    fn render(&mut self, payload: &str, size_px: u32) -> Result<(), RenderError> {
        (**self).render(payload, size_px)
    }

    fn export_image(&mut self) -> Result<Vec<u8>, RenderError> {
        (**self).export_image()
    }
}
