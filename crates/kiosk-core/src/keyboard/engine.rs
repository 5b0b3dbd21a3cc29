#![forbid(unsafe_code)]

//! Keyboard state machine and focus redirection.
//!
//! [`VirtualKeyboard`] never takes focus. It keeps a [`FieldHandle`] to the
//! field that last gained focus and edits that field through a
//! [`FieldHost`] on every key press. A missing or stale handle turns the
//! press into a no-op.
//!
//! Pointer input on the keyboard surface goes through
//! [`VirtualKeyboard::handle_surface`]: every phase reports
//! `prevent_default` so the edited field keeps focus, and a key is
//! dispatched once per physical press (on pointer down or touch start).

use tracing::debug;

use super::layout::{KeyDef, KeyKind, KeyRef, LayoutKind};
use crate::focus::{FieldHandle, FieldHost};
use crate::text_field::TextField;

/// What the Tab key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabPolicy {
    /// Move focus to the next field, wrapping to the first.
    #[default]
    MoveFocus,
    /// Insert a literal tab character.
    InsertTab,
}

impl std::str::FromStr for TabPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "movefocus" | "focus" => Ok(Self::MoveFocus),
            "inserttab" | "insert" => Ok(Self::InsertTab),
            other => Err(format!("unknown tab policy: {other:?}")),
        }
    }
}

/// Modifier and layout state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardState {
    pub layout: LayoutKind,
    /// One-shot: cleared after the next character.
    pub shift: bool,
    /// Latched until pressed again.
    pub caps: bool,
}

/// Result of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The target field's text changed. Carries the handle that was edited.
    Edited(FieldHandle),
    /// Focus moved to another field.
    FocusMoved(FieldHandle),
    /// Only keyboard state (shift, caps, layout) changed.
    StateChanged,
    /// The keyboard was hidden.
    Dismissed,
    /// Nothing happened.
    Ignored,
}

/// Phase of a pointer interaction on the keyboard surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    TouchStart,
    Up,
    Click,
}

impl PointerPhase {
    /// Phases that dispatch a key.
    pub const fn dispatches(self) -> bool {
        matches!(self, Self::Down | Self::TouchStart)
    }
}

/// What the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTarget {
    Key(KeyRef),
    /// Layout button in the header.
    LayoutToggle,
    /// Close button in the header.
    Close,
    /// Surface padding between keys.
    Background,
}

/// A pointer interaction on the keyboard surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub phase: PointerPhase,
    pub target: SurfaceTarget,
}

impl SurfaceEvent {
    pub const fn new(phase: PointerPhase, target: SurfaceTarget) -> Self {
        Self { phase, target }
    }
}

/// Response to a surface interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceResponse {
    /// Suppress the host's default handling (focus change).
    pub prevent_default: bool,
    pub outcome: KeyOutcome,
}

/// The on-screen keyboard.
#[derive(Debug, Clone, Default)]
pub struct VirtualKeyboard {
    state: KeyboardState,
    target: Option<FieldHandle>,
    visible: bool,
    tab_policy: TabPolicy,
}

impl VirtualKeyboard {
    /// Create a hidden keyboard with the given layout.
    pub fn new(layout: LayoutKind) -> Self {
        Self {
            state: KeyboardState {
                layout,
                ..KeyboardState::default()
            },
            ..Self::default()
        }
    }

    /// Set the Tab policy (builder).
    pub fn with_tab_policy(mut self, policy: TabPolicy) -> Self {
        self.tab_policy = policy;
        self
    }

    // --- State access ---

    pub fn state(&self) -> KeyboardState {
        self.state
    }

    pub fn layout(&self) -> LayoutKind {
        self.state.layout
    }

    pub fn target(&self) -> Option<FieldHandle> {
        self.target
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn tab_policy(&self) -> TabPolicy {
        self.tab_policy
    }

    /// Rows of the current layout.
    pub fn rows(&self) -> &'static [&'static [KeyDef]] {
        self.state.layout.rows()
    }

    // --- Focus and visibility ---

    /// A field gained focus: target it and show the keyboard.
    pub fn focus(&mut self, handle: FieldHandle) {
        self.target = Some(handle);
        self.visible = true;
    }

    /// Forget the target field.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Drop the target, hide, and release shift. Layout and caps are kept.
    pub fn reset(&mut self) {
        self.target = None;
        self.visible = false;
        self.state.shift = false;
    }

    pub fn toggle_layout(&mut self) {
        self.state.layout = self.state.layout.toggled();
    }

    pub fn set_layout(&mut self, layout: LayoutKind) {
        self.state.layout = layout;
    }

    // --- Labels ---

    /// Glyph a character key inserts in the current state.
    ///
    /// Latin letters are uppercase when exactly one of caps and shift is on.
    /// Every other key, and every Thai key, uses its shifted glyph when shift
    /// is on and one exists.
    pub fn glyph_for(&self, kind: &KeyKind) -> Option<char> {
        let KeyKind::Char { normal, shift } = *kind else {
            return None;
        };
        if self.state.layout == LayoutKind::En && normal.is_ascii_alphabetic() {
            let upper = self.state.caps != self.state.shift;
            return Some(if upper {
                normal.to_ascii_uppercase()
            } else {
                normal.to_ascii_lowercase()
            });
        }
        Some(match shift {
            Some(alt) if self.state.shift => alt,
            _ => normal,
        })
    }

    /// Text drawn on a key.
    pub fn label_for(&self, kind: &KeyKind) -> String {
        match kind {
            KeyKind::Char { .. } => self.glyph_for(kind).map(String::from).unwrap_or_default(),
            KeyKind::Backspace => "Backspace".into(),
            KeyKind::Tab => "Tab".into(),
            KeyKind::Caps if self.state.caps => "Caps ▲".into(),
            KeyKind::Caps => "Caps".into(),
            KeyKind::Enter => "Enter".into(),
            KeyKind::Shift(_) if self.state.shift => "Shift ▲".into(),
            KeyKind::Shift(_) => "Shift".into(),
            KeyKind::Space => "Space".into(),
            KeyKind::Clear => "Clear".into(),
            KeyKind::LayoutToggle => self.state.layout.toggled().name().into(),
        }
    }

    // --- Key presses ---

    /// Press the key at `at` in the current layout.
    pub fn press_at<H: FieldHost + ?Sized>(&mut self, host: &mut H, at: KeyRef) -> KeyOutcome {
        match self.state.layout.key(at) {
            Some(def) => self.press(host, &def.kind),
            None => KeyOutcome::Ignored,
        }
    }

    /// Apply one logical key press.
    pub fn press<H: FieldHost + ?Sized>(&mut self, host: &mut H, kind: &KeyKind) -> KeyOutcome {
        let outcome = match *kind {
            KeyKind::Char { .. } => match self.glyph_for(kind) {
                Some(glyph) => {
                    let mut buf = [0u8; 4];
                    let outcome = self.insert(host, glyph.encode_utf8(&mut buf));
                    if matches!(outcome, KeyOutcome::Edited(_)) {
                        self.state.shift = false;
                    }
                    outcome
                }
                None => KeyOutcome::Ignored,
            },
            KeyKind::Backspace => self.edit(host, |field| field.delete_backward()),
            KeyKind::Tab => match self.tab_policy {
                TabPolicy::MoveFocus => self.move_focus(host),
                TabPolicy::InsertTab => self.insert(host, "\t"),
            },
            KeyKind::Enter => self.insert(host, "\n"),
            KeyKind::Space => self.insert(host, " "),
            KeyKind::Clear => self.edit(host, |field| {
                field.clear();
                true
            }),
            KeyKind::LayoutToggle => {
                self.toggle_layout();
                KeyOutcome::StateChanged
            }
            KeyKind::Caps => {
                self.state.caps = !self.state.caps;
                KeyOutcome::StateChanged
            }
            KeyKind::Shift(_) => {
                self.state.shift = !self.state.shift;
                KeyOutcome::StateChanged
            }
        };
        debug!(
            target: "kiosk::keyboard",
            key = ?kind,
            outcome = ?outcome,
            layout = %self.state.layout,
            shift = self.state.shift,
            caps = self.state.caps,
            "key press"
        );
        outcome
    }

    fn insert<H: FieldHost + ?Sized>(&mut self, host: &mut H, text: &str) -> KeyOutcome {
        self.edit(host, |field| {
            field.insert_text(text);
            true
        })
    }

    fn edit<H, F>(&mut self, host: &mut H, f: F) -> KeyOutcome
    where
        H: FieldHost + ?Sized,
        F: FnOnce(&mut TextField) -> bool,
    {
        let Some(handle) = self.target else {
            return KeyOutcome::Ignored;
        };
        match host.field_mut(handle) {
            Some(field) => {
                if f(field) {
                    KeyOutcome::Edited(handle)
                } else {
                    KeyOutcome::Ignored
                }
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn move_focus<H: FieldHost + ?Sized>(&mut self, host: &mut H) -> KeyOutcome {
        let Some(current) = self.target else {
            return KeyOutcome::Ignored;
        };
        match host.next_focus(current) {
            Some(next) => {
                self.target = Some(next);
                KeyOutcome::FocusMoved(next)
            }
            None => KeyOutcome::Ignored,
        }
    }

    // --- Surface ---

    /// Handle a pointer interaction on the keyboard surface.
    pub fn handle_surface<H: FieldHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: SurfaceEvent,
    ) -> SurfaceResponse {
        let outcome = if event.phase.dispatches() {
            match event.target {
                SurfaceTarget::Key(at) => self.press_at(host, at),
                SurfaceTarget::LayoutToggle => {
                    self.toggle_layout();
                    KeyOutcome::StateChanged
                }
                SurfaceTarget::Close => {
                    self.hide();
                    KeyOutcome::Dismissed
                }
                SurfaceTarget::Background => KeyOutcome::Ignored,
            }
        } else {
            KeyOutcome::Ignored
        };
        SurfaceResponse {
            prevent_default: true,
            outcome,
        }
    }
}
