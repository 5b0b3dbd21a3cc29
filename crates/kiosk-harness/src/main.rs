#![forbid(unsafe_code)]

//! Visit kiosk in a terminal.
//!
//! # Running
//!
//! ```sh
//! KIOSK_LOG_FILE=/tmp/kiosk.log cargo run -p kiosk-harness
//! ```
//!
//! Kiosk behavior comes from the `KIOSK_*` variables read by
//! [`KioskConfig::from_env`]. This binary also reads:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `KIOSK_STATE_FILE` | JSON store for the saved form | `$XDG_STATE_HOME/kiosk/state.json` |
//! | `KIOSK_LOG` | tracing filter | `info` |
//! | `KIOSK_LOG_FILE` | log destination; no logging when unset | unset |
//! | `KIOSK_ENABLE_MOUSE` | capture mouse and touch | `true` |
//! | `KIOSK_MAX_POLL_MS` | longest input wait | 250 |

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use kiosk::prelude::*;
use kiosk::{FileStorage, ProgramConfig};
use kiosk_harness::code_text::{CodeCanvas, TextCodeRenderer};
use kiosk_harness::screen::viewport_for;
use kiosk_harness::terminal::{SessionOptions, TerminalFrontend, TerminalSession};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let enabled = matches!(
        trimmed,
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON"
    );
    Some(enabled)
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Log to `KIOSK_LOG_FILE`. The terminal is in raw mode, so never stderr.
fn init_logging() -> std::io::Result<()> {
    let Some(path) = env_string("KIOSK_LOG_FILE") else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("KIOSK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn open_registry() -> std::sync::Arc<StateRegistry> {
    let backend = match env_string("KIOSK_STATE_FILE") {
        Some(path) => FileStorage::new(path),
        None => FileStorage::default_for_app("kiosk"),
    };
    info!(target: "kiosk::harness", path = %backend.path().display(), "state file");
    let registry = StateRegistry::new(Box::new(backend));
    if !registry.is_available() {
        warn!(target: "kiosk::harness", "state file not writable, form will not survive a restart");
    }
    registry.shared()
}

fn main() -> Result<()> {
    init_logging()?;

    let config = KioskConfig::from_env();
    // Surfaces a rejected base URL before the terminal is taken over.
    config.link_builder()?;
    let registry = open_registry();
    let canvas = CodeCanvas::default();

    let session = TerminalSession::new(SessionOptions {
        mouse_capture: env_flag("KIOSK_ENABLE_MOUSE").unwrap_or(true),
    })?;
    let (cols, rows) = session.size()?;

    let app = KioskApp::new(config)
        .with_registry(registry.clone())
        .with_renderer(TextCodeRenderer::new(canvas.clone()))
        .with_viewport(viewport_for(cols, rows));
    let mut program_config = ProgramConfig::default();
    if let Some(ms) = env_u64("KIOSK_MAX_POLL_MS") {
        program_config = program_config.with_max_poll(Duration::from_millis(ms.max(1)));
    }

    Program::new(app, TerminalFrontend::new(session, canvas))
        .with_registry(registry)
        .with_config(program_config)
        .run()?;
    Ok(())
}
