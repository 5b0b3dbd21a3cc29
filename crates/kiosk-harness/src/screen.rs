#![forbid(unsafe_code)]

//! Text layout of the kiosk screen and hit-testing against it.
//!
//! [`Screen::compose`] lays the current [`KioskApp`] out as plain lines and
//! records a rectangle for every control it draws. [`Screen::interpret`]
//! turns a raw terminal event into the messages for the app: the raw event
//! first (so activity always reaches the inactivity monitor), then whatever
//! the pointer landed on or the key is bound to.
//!
//! Key bindings:
//!
//! | Key | Form | Warning | Code |
//! |-----|------|---------|------|
//! | Enter | submit | continue | done |
//! | Esc | hide keyboard | continue | |
//! | F1 / F2 / F3 | ไทย / EN / 中文 | | same |
//! | F4 | show or hide keyboard | | |
//! | F5 | clear | | |
//! | F8 | | exit | save image |
//! | Ctrl+C, Ctrl+Q | quit | quit | quit |

use kiosk::core::event::{Event, KeyCode, KeyEvent, MouseButton, MouseEventKind};
use kiosk::core::geometry::{Rect, Viewport};
use kiosk::core::keyboard::{KeyRef, PointerPhase, SurfaceEvent, SurfaceTarget};
use kiosk::core::locale::Lang;
use kiosk::form::{FieldId, KioskApp, Msg, Status};
use unicode_segmentation::UnicodeSegmentation;

use crate::labels::{Labels, labels, lang_button};

/// Width of a one-character key cell, in columns.
const KEY_COLS: u16 = 4;
const FIELD_COLS: u16 = 32;

/// What a screen region does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Field(FieldId),
    Language(Lang),
    Submit,
    Clear,
    Key(KeyRef),
    LayoutToggle,
    CloseKeyboard,
    Continue,
    Exit,
    Done,
    Export,
}

impl Hit {
    /// Message for a pointer interaction in `phase`. Keyboard regions see
    /// every phase so the engine can apply its own dispatch rule; buttons
    /// react to the press only.
    pub fn message(self, phase: PointerPhase) -> Option<Msg> {
        let surface = |target| Some(Msg::Surface(SurfaceEvent::new(phase, target)));
        match self {
            Hit::Key(at) => surface(SurfaceTarget::Key(at)),
            Hit::LayoutToggle => surface(SurfaceTarget::LayoutToggle),
            Hit::CloseKeyboard => surface(SurfaceTarget::Close),
            _ if !phase.dispatches() => None,
            Hit::Field(id) => Some(Msg::Focus(id)),
            Hit::Language(lang) => Some(Msg::SetLanguage(lang)),
            Hit::Submit => Some(Msg::Submit),
            Hit::Clear => Some(Msg::ClearAll),
            Hit::Continue => Some(Msg::ContinueSession),
            Hit::Exit => Some(Msg::ExitSession),
            Hit::Done => Some(Msg::FinishCode),
            Hit::Export => Some(Msg::ExportCode),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Form,
    Warning,
    Code,
}

/// One composed frame.
#[derive(Debug, Default)]
pub struct Screen {
    lines: Vec<String>,
    regions: Vec<(Rect, Hit)>,
    mode: Mode,
    keyboard_visible: bool,
}

impl Screen {
    /// Lay out `app`. `code` holds the renderer's current drawing.
    pub fn compose(app: &KioskApp, code: &[String]) -> Self {
        let mut screen = Self {
            keyboard_visible: app.keyboard().is_visible(),
            ..Self::default()
        };
        let text = labels(app.lang());
        if app.code().is_active() {
            screen.mode = Mode::Code;
            screen.code_modal(app, text, code);
        } else if app.inactivity().warning_visible() {
            screen.mode = Mode::Warning;
            screen.warning_modal(app, text);
        } else {
            screen.form(app, text);
        }
        screen
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Topmost region under the cell at `(x, y)`.
    pub fn hit(&self, x: u16, y: u16) -> Option<Hit> {
        self.regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(x, y))
            .map(|(_, hit)| *hit)
    }

    /// Messages for one raw event, in dispatch order.
    pub fn interpret(&self, event: Event) -> Vec<Msg> {
        let extra = match &event {
            Event::Key(key) if key.is_press() => {
                if key.ctrl() && (key.is_char('c') || key.is_char('q')) {
                    return vec![Msg::Quit];
                }
                self.bound(key)
            }
            Event::Mouse(mouse) => {
                let phase = match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => Some(PointerPhase::Down),
                    MouseEventKind::Up(MouseButton::Left) => Some(PointerPhase::Up),
                    _ => None,
                };
                phase.and_then(|phase| self.hit(mouse.x, mouse.y)?.message(phase))
            }
            Event::Touch(touch) => self
                .hit(touch.x, touch.y)
                .and_then(|hit| hit.message(PointerPhase::TouchStart)),
            Event::Resize { width, height } => Some(Msg::Resize(viewport_for(*width, *height))),
            _ => None,
        };
        let mut msgs = Vec::with_capacity(2);
        match (&event, &extra) {
            // The warning buttons act on the warning; activity would hide it first.
            (_, Some(Msg::ContinueSession | Msg::ExitSession)) => {}
            (Event::Key(_), Some(_)) => msgs.push(activity_only(event)),
            _ => msgs.push(Msg::Input(event)),
        }
        msgs.extend(extra);
        msgs
    }

    fn bound(&self, key: &KeyEvent) -> Option<Msg> {
        let language = match key.code {
            KeyCode::F(1) => Some(Lang::Th),
            KeyCode::F(2) => Some(Lang::En),
            KeyCode::F(3) => Some(Lang::Zh),
            _ => None,
        };
        if let Some(lang) = language
            && self.mode != Mode::Warning
        {
            return Some(Msg::SetLanguage(lang));
        }
        match (self.mode, key.code) {
            (Mode::Form, KeyCode::Enter) => Some(Msg::Submit),
            (Mode::Form, KeyCode::Escape) => Some(Msg::CloseKeyboard),
            (Mode::Form, KeyCode::F(4)) if self.keyboard_visible => Some(Msg::CloseKeyboard),
            (Mode::Form, KeyCode::F(4)) => Some(Msg::ShowKeyboard),
            (Mode::Form, KeyCode::F(5)) => Some(Msg::ClearAll),
            (Mode::Warning, KeyCode::Enter | KeyCode::Escape) => Some(Msg::ContinueSession),
            (Mode::Warning, KeyCode::F(8)) => Some(Msg::ExitSession),
            (Mode::Code, KeyCode::Enter) => Some(Msg::FinishCode),
            (Mode::Code, KeyCode::F(8)) => Some(Msg::ExportCode),
            _ => None,
        }
    }

    // --- Layout ---

    fn push(&mut self, line: String) -> u16 {
        self.lines.push(line);
        u16::try_from(self.lines.len() - 1).unwrap_or(u16::MAX)
    }

    fn row(&mut self) -> Row<'_> {
        let y = self.push(String::new());
        Row {
            screen: self,
            y,
            x: 0,
        }
    }

    fn form(&mut self, app: &KioskApp, text: &Labels) {
        let mut row = self.row();
        row.text(text.title);
        row.text("   ");
        for lang in Lang::ALL {
            let label = if lang == app.lang() {
                format!("<{}>", lang_button(lang))
            } else {
                format!("[{}]", lang_button(lang))
            };
            row.button(&label, Hit::Language(lang));
            row.text(" ");
        }
        self.push(String::new());

        let focused = app.focused();
        let label_cols = FieldId::ALL
            .iter()
            .map(|id| width(text.field(*id)))
            .max()
            .unwrap_or(0)
            + 2;
        for id in FieldId::ALL {
            let mut row = self.row();
            let mark = if id.required() { "*" } else { " " };
            let label = format!("{}{mark}", text.field(id));
            row.text(&pad(&label, label_cols));
            let value = app.value(id);
            let shown = if focused == Some(id) {
                format!("{value}▏")
            } else {
                value.to_owned()
            };
            row.button(&format!("[{}]", pad(&shown, FIELD_COLS)), Hit::Field(id));
        }
        self.push(String::new());

        let mut row = self.row();
        row.button(&format!("[ {} ]", text.submit), Hit::Submit);
        row.text("  ");
        row.button(&format!("[ {} ]", text.clear), Hit::Clear);

        let status = status_line(app, text);
        self.push(status);

        if app.keyboard().is_visible() {
            self.push(String::new());
            self.keyboard(app);
        }
    }

    fn keyboard(&mut self, app: &KioskApp) {
        let keyboard = app.keyboard();
        let mut header = self.row();
        header.button(&format!("[{}]", keyboard.layout().toggled()), Hit::LayoutToggle);
        header.text(" ");
        header.button("[×]", Hit::CloseKeyboard);

        for (r, keys) in keyboard.rows().iter().enumerate() {
            let mut row = self.row();
            for (c, def) in keys.iter().enumerate() {
                let cols = (u16::from(def.width_tenths) * KEY_COLS / 10).max(KEY_COLS);
                let label = keyboard.label_for(&def.kind);
                let cell = format!("[{}]", pad(&label, cols - 2));
                row.button(&cell, Hit::Key(KeyRef::new(r, c)));
            }
        }
    }

    fn warning_modal(&mut self, app: &KioskApp, text: &Labels) {
        self.push(String::new());
        self.push(format!("  !! {} !!", text.warning_title));
        self.push(format!(
            "  {} {} {}",
            text.resetting_in,
            app.inactivity().remaining_secs(),
            text.seconds
        ));
        self.push(String::new());
        let mut row = self.row();
        row.text("  ");
        row.button(&format!("[ {} ]", text.continue_session), Hit::Continue);
        row.text("  ");
        row.button(&format!("[ {} ]", text.exit), Hit::Exit);
    }

    fn code_modal(&mut self, app: &KioskApp, text: &Labels, code: &[String]) {
        let mut row = self.row();
        row.text(text.code_title);
        row.text("   ");
        for lang in Lang::ALL {
            row.button(&format!("[{}]", lang_button(lang)), Hit::Language(lang));
            row.text(" ");
        }
        self.push(String::new());
        for line in code {
            self.push(format!("  {line}"));
        }
        self.push(String::new());
        self.push(format!(
            "  {} {} {}",
            text.closes_in,
            app.code().remaining_secs(),
            text.seconds
        ));
        let mut row = self.row();
        row.text("  ");
        row.button(&format!("[ {} ]", text.done), Hit::Done);
        row.text("  ");
        row.button(&format!("[ {} ]", text.export), Hit::Export);
        let status = status_line(app, text);
        self.push(status);
    }
}

/// Cursor along one line, registering button regions as it goes.
struct Row<'a> {
    screen: &'a mut Screen,
    y: u16,
    x: u16,
}

impl Row<'_> {
    fn text(&mut self, s: &str) {
        if let Some(line) = self.screen.lines.get_mut(usize::from(self.y)) {
            line.push_str(s);
        }
        self.x = self.x.saturating_add(width(s));
    }

    fn button(&mut self, label: &str, hit: Hit) {
        let rect = Rect::new(self.x, self.y, width(label), 1);
        self.screen.regions.push((rect, hit));
        self.text(label);
    }
}

fn status_line(app: &KioskApp, text: &Labels) -> String {
    match app.status() {
        Some(Status::Incomplete(_)) => format!("  ! {}", text.fill_hint),
        Some(Status::BuildFailed(e)) => format!("  ! {}: {e}", text.build_failed),
        Some(Status::RenderFailed(e)) => format!("  ! {}: {e}", text.render_failed),
        Some(Status::Exported { bytes }) => format!("  {} ({bytes} B)", text.exported),
        None if app.shows_fill_hint() => format!("  {}", text.fill_hint),
        None => String::new(),
    }
}

/// A bound key still counts as activity but must not reach the focused
/// field. `F(0)` is never bound and never edits.
fn activity_only(event: Event) -> Msg {
    match event {
        Event::Key(key) => Msg::Input(Event::Key(KeyEvent {
            code: KeyCode::F(0),
            ..key
        })),
        other => Msg::Input(other),
    }
}

/// Terminal cells to an approximate pixel viewport.
pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::new(u32::from(cols) * 8, u32::from(rows) * 16)
}

/// Display columns of `s`. Wide East Asian graphemes take two.
pub fn width(s: &str) -> u16 {
    let cols: usize = s
        .graphemes(true)
        .map(|g| match g.chars().next() {
            Some(c) if is_wide(c) => 2,
            Some(_) => 1,
            None => 0,
        })
        .sum();
    u16::try_from(cols).unwrap_or(u16::MAX)
}

fn is_wide(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
    )
}

fn pad(s: &str, cols: u16) -> String {
    let fill = usize::from(cols.saturating_sub(width(s)));
    format!("{s}{}", " ".repeat(fill))
}
