#![forbid(unsafe_code)]

//! Input as the kiosk sees it.
//!
//! The terminal harness feeds crossterm events through [`Event::from_crossterm`];
//! a touch surface builds [`Event::Touch`] directly. The only question the
//! inactivity monitor asks of an event is [`Event::activity`].
//!
//! Coordinates are 0-indexed cells. A terminal that cannot report key
//! releases produces presses only, so [`KeyEventKind`] defaults to `Press`.

use bitflags::bitflags;
use crossterm::event as ct;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Touch(TouchEvent),
    /// Viewport size in cells.
    Resize { width: u16, height: u16 },
    Paste(String),
    /// Window focus gained (`true`) or lost.
    Focus(bool),
}

/// What sort of user presence an event proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    TouchStart,
    Click,
}

impl Event {
    /// `None` for input the kiosk has no use for (media keys, sideways scroll).
    #[must_use]
    pub fn from_crossterm(event: ct::Event) -> Option<Self> {
        Some(match event {
            ct::Event::Key(key) => Event::Key(KeyEvent::try_from(key).ok()?),
            ct::Event::Mouse(mouse) => Event::Mouse(MouseEvent::try_from(mouse).ok()?),
            ct::Event::Resize(width, height) => Event::Resize { width, height },
            ct::Event::Paste(text) => Event::Paste(text),
            ct::Event::FocusGained => Event::Focus(true),
            ct::Event::FocusLost => Event::Focus(false),
        })
    }

    /// Releases, resizes and focus changes happen without anyone at the
    /// screen, so they are not activity.
    #[must_use]
    pub fn activity(&self) -> Option<ActivityKind> {
        match self {
            Event::Key(key) if key.kind == KeyEventKind::Release => None,
            Event::Key(_) | Event::Paste(_) => Some(ActivityKind::KeyPress),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(_) | MouseEventKind::Up(_),
                ..
            }) => Some(ActivityKind::Click),
            Event::Mouse(_) => Some(ActivityKind::PointerMove),
            Event::Touch(_) => Some(ActivityKind::TouchStart),
            Event::Resize { .. } | Event::Focus(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A bare press of `code`.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }

    #[must_use]
    pub const fn with_kind(self, kind: KeyEventKind) -> Self {
        Self { kind, ..self }
    }

    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        self.code == KeyCode::Char(c)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Press or auto-repeat; the kinds that edit text.
    #[must_use]
    pub fn is_press(&self) -> bool {
        self.kind != KeyEventKind::Release
    }
}

impl TryFrom<ct::KeyEvent> for KeyEvent {
    type Error = ct::KeyCode;

    fn try_from(event: ct::KeyEvent) -> Result<Self, Self::Error> {
        let code = KeyCode::try_from(event.code)?;
        let kind = match event.kind {
            ct::KeyEventKind::Press => KeyEventKind::Press,
            ct::KeyEventKind::Repeat => KeyEventKind::Repeat,
            ct::KeyEventKind::Release => KeyEventKind::Release,
        };
        Ok(Self {
            code,
            modifiers: Modifiers::from(event.modifiers),
            kind,
        })
    }
}

/// Keys a visitor can use on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    /// Shift+Tab as reported by the terminal.
    BackTab,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
    /// F1 and up. The harness binds the language and clear buttons here.
    F(u8),
}

impl TryFrom<ct::KeyCode> for KeyCode {
    type Error = ct::KeyCode;

    fn try_from(code: ct::KeyCode) -> Result<Self, Self::Error> {
        use ct::KeyCode as C;
        Ok(match code {
            C::Char(c) => KeyCode::Char(c),
            C::Enter => KeyCode::Enter,
            C::Esc => KeyCode::Escape,
            C::Backspace => KeyCode::Backspace,
            C::Delete => KeyCode::Delete,
            C::Tab => KeyCode::Tab,
            C::BackTab => KeyCode::BackTab,
            C::Home => KeyCode::Home,
            C::End => KeyCode::End,
            C::Up => KeyCode::Up,
            C::Down => KeyCode::Down,
            C::Left => KeyCode::Left,
            C::Right => KeyCode::Right,
            C::F(n) => KeyCode::F(n),
            other => return Err(other),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

impl From<ct::KeyModifiers> for Modifiers {
    fn from(raw: ct::KeyModifiers) -> Self {
        [
            (ct::KeyModifiers::SHIFT, Modifiers::SHIFT),
            (ct::KeyModifiers::ALT, Modifiers::ALT),
            (ct::KeyModifiers::CONTROL, Modifiers::CTRL),
        ]
        .into_iter()
        .filter(|(theirs, _)| raw.contains(*theirs))
        .fold(Modifiers::empty(), |acc, (_, ours)| acc | ours)
    }
}

/// Pointer input at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
}

impl MouseEvent {
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self { kind, x, y }
    }
}

impl TryFrom<ct::MouseEvent> for MouseEvent {
    type Error = ct::MouseEventKind;

    fn try_from(event: ct::MouseEvent) -> Result<Self, Self::Error> {
        let kind = match event.kind {
            ct::MouseEventKind::Down(b) => MouseEventKind::Down(b.into()),
            ct::MouseEventKind::Up(b) => MouseEventKind::Up(b.into()),
            ct::MouseEventKind::Drag(b) => MouseEventKind::Drag(b.into()),
            ct::MouseEventKind::Moved => MouseEventKind::Moved,
            ct::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
            ct::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
            other @ (ct::MouseEventKind::ScrollLeft | ct::MouseEventKind::ScrollRight) => {
                return Err(other);
            }
        };
        Ok(Self::new(kind, event.column, event.row))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    /// Moved with a button held.
    Drag(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<ct::MouseButton> for MouseButton {
    fn from(button: ct::MouseButton) -> Self {
        match button {
            ct::MouseButton::Left => Self::Left,
            ct::MouseButton::Right => Self::Right,
            ct::MouseButton::Middle => Self::Middle,
        }
    }
}

/// A finger landing on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub x: u16,
    pub y: u16,
}
