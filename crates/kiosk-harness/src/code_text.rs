#![forbid(unsafe_code)]

//! Text rendition of the display code.
//!
//! A terminal cannot draw a scannable matrix, so the renderer boxes the
//! payload itself, wrapped to a width derived from the requested pixel size.
//! The drawn lines live in a [`CodeCanvas`] shared with the frontend.

use std::sync::{Arc, Mutex};

use kiosk::form::code_display::{CodeRenderer, RenderError};
use tracing::debug;

/// Assumed pixel width of one terminal cell.
const CELL_PX: u32 = 12;
const MIN_COLS: usize = 16;
const MAX_COLS: usize = 48;

/// Lines of the most recent rendition.
#[derive(Debug, Clone, Default)]
pub struct CodeCanvas {
    lines: Arc<Mutex<Vec<String>>>,
}

impl CodeCanvas {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn replace(&self, lines: Vec<String>) -> Result<(), RenderError> {
        let mut slot = self
            .lines
            .lock()
            .map_err(|_| RenderError::Payload("code canvas poisoned".into()))?;
        *slot = lines;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TextCodeRenderer {
    canvas: CodeCanvas,
}

impl TextCodeRenderer {
    pub fn new(canvas: CodeCanvas) -> Self {
        Self { canvas }
    }
}

impl CodeRenderer for TextCodeRenderer {
    fn render(&mut self, payload: &str, size_px: u32) -> Result<(), RenderError> {
        if payload.is_empty() {
            return Err(RenderError::Payload("empty payload".into()));
        }
        let lines = boxed(payload, columns_for(size_px));
        debug!(target: "kiosk::harness", size_px, rows = lines.len(), "code drawn");
        self.canvas.replace(lines)
    }

    /// The boxed text, one line per row.
    fn export_image(&mut self) -> Result<Vec<u8>, RenderError> {
        let lines = self.canvas.lines();
        if lines.is_empty() {
            return Err(RenderError::Unsupported("nothing rendered"));
        }
        Ok(lines.join("\n").into_bytes())
    }
}

fn columns_for(size_px: u32) -> usize {
    usize::try_from(size_px / CELL_PX)
        .unwrap_or(MAX_COLS)
        .clamp(MIN_COLS, MAX_COLS)
}

fn boxed(payload: &str, cols: usize) -> Vec<String> {
    let inner = cols - 4;
    let chars: Vec<char> = payload.chars().collect();
    let mut lines = Vec::with_capacity(chars.len() / inner + 3);
    lines.push(format!("┌{}┐", "─".repeat(cols - 2)));
    for chunk in chars.chunks(inner) {
        let text: String = chunk.iter().collect();
        lines.push(format!("│ {text:<inner$} │"));
    }
    lines.push(format!("└{}┘", "─".repeat(cols - 2)));
    lines
}
