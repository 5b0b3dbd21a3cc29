#![forbid(unsafe_code)]

//! Crossterm session and the [`Frontend`] that draws the kiosk into it.
//!
//! The session enters raw mode and the alternate screen, optionally captures
//! the mouse, and undoes all of it on drop. A panic hook restores the
//! terminal too, so a crash never leaves the kiosk console in raw mode.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use crossterm::{cursor, event as cte, queue, style, terminal};
use kiosk::core::event::Event;
use kiosk::form::{KioskApp, Msg};
use kiosk::runtime::Frontend;
use tracing::info;

use crate::code_text::CodeCanvas;
use crate::screen::Screen;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub mouse_capture: bool,
}

/// Raw-mode terminal, restored on drop.
#[derive(Debug)]
pub struct TerminalSession {
    mouse_enabled: bool,
}

impl TerminalSession {
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();

        terminal::enable_raw_mode()?;
        let mut session = Self {
            mouse_enabled: false,
        };
        let mut stdout = io::stdout();
        crossterm::execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cte::EnableBracketedPaste,
            cursor::Hide
        )?;
        if options.mouse_capture {
            crossterm::execute!(stdout, cte::EnableMouseCapture)?;
            session.mouse_enabled = true;
        }
        info!(target: "kiosk::harness", mouse = session.mouse_enabled, "terminal session started");
        Ok(session)
    }

    /// Current size as `(columns, rows)`.
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();
        if self.mouse_enabled {
            let _ = crossterm::execute!(stdout, cte::DisableMouseCapture);
            self.mouse_enabled = false;
        }
        let _ = crossterm::execute!(
            stdout,
            cte::DisableBracketedPaste,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
        info!(target: "kiosk::harness", "terminal restored");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, cte::DisableMouseCapture);
    let _ = crossterm::execute!(stdout, cte::DisableBracketedPaste);
    let _ = crossterm::execute!(stdout, cursor::Show);
    let _ = crossterm::execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Draws the kiosk as text and hit-tests pointer input against the last
/// frame.
pub struct TerminalFrontend {
    session: TerminalSession,
    canvas: CodeCanvas,
    screen: Screen,
}

impl TerminalFrontend {
    pub fn new(session: TerminalSession, canvas: CodeCanvas) -> Self {
        Self {
            session,
            canvas,
            screen: Screen::default(),
        }
    }
}

impl Frontend<KioskApp> for TerminalFrontend {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Option<Event>> {
        if !cte::poll(timeout)? {
            return Ok(None);
        }
        Ok(Event::from_crossterm(cte::read()?))
    }

    fn present(&mut self, app: &KioskApp) -> io::Result<()> {
        self.screen = Screen::compose(app, &self.canvas.lines());
        let (_, rows) = self.session.size()?;
        let mut stdout = io::stdout().lock();
        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
        for (y, line) in self.screen.lines().iter().enumerate().take(usize::from(rows)) {
            let y = u16::try_from(y).unwrap_or(u16::MAX);
            queue!(stdout, cursor::MoveTo(0, y), style::Print(line))?;
        }
        stdout.flush()
    }

    fn interpret(&mut self, event: Event) -> Vec<Msg> {
        self.screen.interpret(event)
    }
}
