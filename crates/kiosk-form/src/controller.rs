#![forbid(unsafe_code)]

//! Root model of the kiosk screen.
//!
//! [`KioskApp`] owns the fields, the language, the on-screen keyboard, both
//! timer state machines and the store, and turns every [`Msg`] into state
//! changes plus [`Cmd`]s for the runtime.
//!
//! Raw input arrives as [`Msg::Input`]. Any activity in it rearms the
//! inactivity monitor, and key presses edit the focused field. A frontend
//! that hit-tests its own drawing sends the semantic messages (focus,
//! keyboard surface, buttons) right after the raw event they came from.
//!
//! While a code session is open the form is frozen: edits, focus changes and
//! submits are ignored, and the inactivity monitor is suspended.

use std::sync::Arc;

use kiosk_core::event::{Event, KeyCode};
use kiosk_core::focus::FieldHost;
use kiosk_core::geometry::Viewport;
use kiosk_core::keyboard::{KeyKind, KeyOutcome, SurfaceEvent, VirtualKeyboard};
use kiosk_core::locale::Lang;
use kiosk_runtime::{Cmd, Model, StateRegistry, TimerKey};
use tracing::{debug, info, warn};

use crate::code_display::{CodeRenderer, NullRenderer};
use crate::code_session::{CodeMsg, CodeOutcome, CodeSession};
use crate::config::KioskConfig;
use crate::fields::{FieldId, FormFields, Validation};
use crate::inactivity::{InactivityMonitor, InactivityMsg, InactivityOutcome};
use crate::link::{BuildError, FreshnessSource, FreshnessTokens, LinkBuilder, SystemMillis};
use crate::persistence::{FormSnapshot, FormStore};

/// Debounce timer for saving the form.
pub const PERSIST_KEY: TimerKey = "persist.flush";

/// Clock behind freshness tokens.
pub type TokenClock = Box<dyn Fn() -> u64 + Send>;

/// Everything the kiosk screen reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Raw input from the terminal or touch screen.
    Input(Event),
    /// A field gained focus.
    Focus(FieldId),
    /// Replace a field's text (paste from an external source, tests).
    SetField(FieldId, String),
    /// Pointer interaction on the on-screen keyboard.
    Surface(SurfaceEvent),
    SetLanguage(Lang),
    Submit,
    /// The "clear" button: empty the fields, keep the language.
    ClearAll,
    Inactivity(InactivityMsg),
    /// "Continue" on the inactivity warning.
    ContinueSession,
    /// "Exit" on the inactivity warning.
    ExitSession,
    Code(CodeMsg),
    /// "Done" on the code modal.
    FinishCode,
    PersistFlush,
    Resize(Viewport),
    ExportCode,
    ShowKeyboard,
    CloseKeyboard,
    Quit,
}

impl From<Event> for Msg {
    fn from(event: Event) -> Self {
        Msg::Input(event)
    }
}

/// User-visible status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Submit was refused; these required fields are empty.
    Incomplete(Vec<FieldId>),
    /// The link could not be built.
    BuildFailed(BuildError),
    /// The renderer failed to draw or export the code.
    RenderFailed(String),
    /// The code image was exported.
    Exported { bytes: usize },
}

pub struct KioskApp {
    config: KioskConfig,
    fields: FormFields,
    lang: Lang,
    keyboard: VirtualKeyboard,
    links: Result<LinkBuilder, BuildError>,
    tokens: FreshnessTokens<TokenClock>,
    inactivity: InactivityMonitor,
    code: CodeSession,
    store: Option<FormStore>,
    renderer: Box<dyn CodeRenderer>,
    viewport: Viewport,
    status: Option<Status>,
    last_export: Option<Vec<u8>>,
}

impl KioskApp {
    pub fn new(config: KioskConfig) -> Self {
        let links = config.link_builder();
        if let Err(e) = &links {
            warn!(target: "kiosk::app", base = %config.base_url, error = %e, "base url rejected");
        }
        let clock: TokenClock = Box::new(|| SystemMillis.now_ms());
        Self {
            fields: FormFields::new(),
            lang: config.default_lang,
            keyboard: VirtualKeyboard::new(config.keyboard_layout)
                .with_tab_policy(config.tab_policy),
            links,
            tokens: FreshnessTokens::new(clock),
            inactivity: InactivityMonitor::new(config.warn_after, config.reset_after),
            code: CodeSession::new(config.code_secs),
            store: None,
            renderer: Box::new(NullRenderer),
            viewport: Viewport::default(),
            status: None,
            last_export: None,
            config,
        }
    }

    /// Save to and restore from `registry` under the configured key.
    pub fn with_registry(mut self, registry: Arc<StateRegistry>) -> Self {
        self.store = Some(FormStore::with_key(registry, self.config.schema_key.as_str()));
        self
    }

    pub fn with_renderer(mut self, renderer: impl CodeRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Source of the millisecond timestamps behind freshness tokens.
    pub fn with_token_clock(mut self, clock: impl Fn() -> u64 + Send + 'static) -> Self {
        let clock: TokenClock = Box::new(clock);
        self.tokens = FreshnessTokens::new(clock);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    // --- Read access ---

    pub fn config(&self) -> &KioskConfig {
        &self.config
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn value(&self, id: FieldId) -> &str {
        self.fields.value(id)
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn keyboard(&self) -> &VirtualKeyboard {
        &self.keyboard
    }

    /// Field the keyboard is editing, if its handle is still current.
    pub fn focused(&self) -> Option<FieldId> {
        self.keyboard.target().and_then(|h| self.fields.id_of(h))
    }

    pub fn inactivity(&self) -> &InactivityMonitor {
        &self.inactivity
    }

    pub fn code(&self) -> &CodeSession {
        &self.code
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn validation(&self) -> Validation {
        self.fields.validate()
    }

    /// The "please fill the required fields" hint shows while the form is
    /// incomplete and no code is displayed.
    pub fn shows_fill_hint(&self) -> bool {
        !self.code.is_active() && !self.fields.is_valid()
    }

    /// Bytes from the last successful export.
    pub fn last_export(&self) -> Option<&[u8]> {
        self.last_export.as_deref()
    }

    // --- Transitions ---

    fn handle_input(&mut self, event: Event) -> Cmd<Msg> {
        let rearm = if event.activity().is_some() {
            self.inactivity.activity().map(Msg::Inactivity)
        } else {
            Cmd::none()
        };
        if self.code.is_active() {
            return rearm;
        }

        let edit = match &event {
            Event::Key(key) if key.is_press() && key.code == KeyCode::Tab => {
                let outcome = self.keyboard.press(&mut self.fields, &KeyKind::Tab);
                self.after_key(outcome)
            }
            Event::Key(_) | Event::Paste(_) => self.edit_focused(&event),
            _ => Cmd::none(),
        };
        Cmd::batch(vec![rearm, edit])
    }

    fn edit_focused(&mut self, event: &Event) -> Cmd<Msg> {
        let Some(handle) = self.keyboard.target() else {
            return Cmd::none();
        };
        let Some(field) = self.fields.field_mut(handle) else {
            return Cmd::none();
        };
        let before = field.value().to_owned();
        if field.handle_event(event) && field.value() != before {
            return self.edited();
        }
        Cmd::none()
    }

    fn after_key(&mut self, outcome: KeyOutcome) -> Cmd<Msg> {
        match outcome {
            KeyOutcome::Edited(_) => self.edited(),
            _ => Cmd::none(),
        }
    }

    /// A field's text changed.
    fn edited(&mut self) -> Cmd<Msg> {
        if matches!(self.status, Some(Status::Incomplete(_))) {
            self.status = None;
        }
        self.persist()
    }

    /// Stage the snapshot and (re)start the debounce timer.
    fn persist(&mut self) -> Cmd<Msg> {
        let Some(store) = &self.store else {
            return Cmd::none();
        };
        store.stage(&FormSnapshot::capture(&self.fields, self.lang));
        Cmd::schedule(PERSIST_KEY, self.config.persist_debounce, Msg::PersistFlush)
    }

    fn submit(&mut self) -> Cmd<Msg> {
        if self.code.is_active() {
            return Cmd::none();
        }
        let validation = self.fields.validate();
        if !validation.is_valid() {
            debug!(target: "kiosk::app", missing = ?validation.missing, "submit refused");
            self.status = Some(Status::Incomplete(validation.missing));
            return Cmd::none();
        }
        let url = match self.build_link() {
            Ok(url) => url,
            Err(e) => {
                warn!(target: "kiosk::app", error = %e, "link build failed");
                self.status = Some(Status::BuildFailed(e));
                return Cmd::none();
            }
        };
        self.status = None;
        self.keyboard.hide();
        let open = self.code.open(url).map(Msg::Code);
        let suspend = self.inactivity.suspend().map(Msg::Inactivity);
        self.render_code();
        Cmd::batch(vec![suspend, open])
    }

    fn build_link(&mut self) -> Result<String, BuildError> {
        let links = self.links.as_ref().map_err(Clone::clone)?;
        let token = self.tokens.next_token();
        links.build(&self.fields.values(), self.lang, token)
    }

    fn set_language(&mut self, lang: Lang) -> Cmd<Msg> {
        if lang == self.lang {
            return Cmd::none();
        }
        info!(target: "kiosk::app", from = %self.lang, to = %lang, "language changed");
        self.lang = lang;
        if self.code.is_active() {
            match self.build_link() {
                Ok(url) => {
                    self.code.replace_url(url);
                    self.render_code();
                }
                Err(e) => {
                    warn!(target: "kiosk::app", error = %e, "link rebuild failed");
                    self.status = Some(Status::BuildFailed(e));
                }
            }
        }
        self.persist()
    }

    fn render_code(&mut self) {
        let Some(url) = self.code.url() else {
            return;
        };
        let size = self.viewport.code_size();
        if let Err(e) = self.renderer.render(url, size) {
            warn!(target: "kiosk::app", error = %e, size, "code render failed");
            self.status = Some(Status::RenderFailed(e.to_string()));
        }
    }

    fn export_code(&mut self) {
        if !self.code.is_active() {
            return;
        }
        match self.renderer.export_image() {
            Ok(bytes) => {
                info!(target: "kiosk::app", bytes = bytes.len(), "code exported");
                self.status = Some(Status::Exported { bytes: bytes.len() });
                self.last_export = Some(bytes);
            }
            Err(e) => {
                warn!(target: "kiosk::app", error = %e, "code export failed");
                self.status = Some(Status::RenderFailed(e.to_string()));
            }
        }
    }

    /// The "clear" button.
    fn clear_all(&mut self) -> Cmd<Msg> {
        if self.code.is_active() {
            return Cmd::none();
        }
        info!(target: "kiosk::app", "form cleared");
        self.fields.clear();
        self.status = None;
        self.forget_saved()
    }

    /// Wipe the form back to a fresh start: fields, language, keyboard
    /// target and saved snapshot.
    fn wipe(&mut self) -> Cmd<Msg> {
        self.fields.reset();
        self.lang = self.config.default_lang;
        self.keyboard.reset();
        self.status = None;
        self.last_export = None;
        self.forget_saved()
    }

    fn forget_saved(&mut self) -> Cmd<Msg> {
        match &self.store {
            Some(store) => {
                store.remove();
                Cmd::batch(vec![Cmd::cancel(PERSIST_KEY), Cmd::save_state()])
            }
            None => Cmd::none(),
        }
    }

    fn finish_code(&mut self) -> Cmd<Msg> {
        if !self.code.is_active() {
            return Cmd::none();
        }
        let finish = self.code.finish().map(Msg::Code);
        let wipe = self.wipe();
        let resume = self.inactivity.resume().map(Msg::Inactivity);
        Cmd::batch(vec![finish, wipe, resume])
    }

    fn on_inactivity(&mut self, msg: InactivityMsg) -> Cmd<Msg> {
        let (outcome, cmd) = self.inactivity.update(msg);
        let cmd = cmd.map(Msg::Inactivity);
        match outcome {
            InactivityOutcome::HardReset => Cmd::batch(vec![cmd, self.wipe()]),
            _ => cmd,
        }
    }

    fn on_code(&mut self, msg: CodeMsg) -> Cmd<Msg> {
        let (outcome, cmd) = self.code.update(msg);
        match outcome {
            CodeOutcome::Expired => self.finish_code(),
            _ => cmd.map(Msg::Code),
        }
    }
}

impl Model for KioskApp {
    type Message = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        if let Some(snapshot) = self.store.as_ref().and_then(FormStore::load) {
            if let Some(lang) = snapshot.apply(&mut self.fields) {
                self.lang = lang;
            }
            info!(target: "kiosk::app", lang = %self.lang, "saved form restored");
        }
        self.inactivity.arm().map(Msg::Inactivity)
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Input(event) => self.handle_input(event),
            Msg::Focus(id) => {
                if !self.code.is_active() {
                    self.keyboard.focus(self.fields.handle(id));
                }
                Cmd::none()
            }
            Msg::SetField(id, text) => {
                if self.code.is_active() || self.fields.value(id) == text {
                    return Cmd::none();
                }
                self.fields.set_value(id, text);
                self.edited()
            }
            Msg::Surface(event) => {
                if self.code.is_active() {
                    return Cmd::none();
                }
                let response = self.keyboard.handle_surface(&mut self.fields, event);
                self.after_key(response.outcome)
            }
            Msg::SetLanguage(lang) => self.set_language(lang),
            Msg::Submit => self.submit(),
            Msg::ClearAll => self.clear_all(),
            Msg::Inactivity(msg) => self.on_inactivity(msg),
            Msg::ContinueSession => {
                if !self.inactivity.warning_visible() {
                    return Cmd::none();
                }
                self.inactivity.continue_session().map(Msg::Inactivity)
            }
            Msg::ExitSession => {
                if !self.inactivity.warning_visible() {
                    return Cmd::none();
                }
                let (_, cmd) = self.inactivity.exit();
                Cmd::batch(vec![cmd.map(Msg::Inactivity), self.wipe()])
            }
            Msg::Code(msg) => self.on_code(msg),
            Msg::FinishCode => self.finish_code(),
            Msg::PersistFlush => Cmd::save_state(),
            Msg::Resize(viewport) => {
                if viewport != self.viewport {
                    self.viewport = viewport;
                    self.render_code();
                }
                Cmd::none()
            }
            Msg::ExportCode => {
                self.export_code();
                Cmd::none()
            }
            Msg::ShowKeyboard => {
                if !self.code.is_active() {
                    self.keyboard.show();
                }
                Cmd::none()
            }
            Msg::CloseKeyboard => {
                self.keyboard.hide();
                Cmd::none()
            }
            Msg::Quit => Cmd::quit(),
        }
    }

    fn shutdown(&mut self) -> Cmd<Msg> {
        if self.store.is_none() {
            return Cmd::none();
        }
        debug!(target: "kiosk::app", "final save");
        Cmd::save_state()
    }
}

impl std::fmt::Debug for KioskApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KioskApp")
            .field("lang", &self.lang)
            .field("fields", &self.fields)
            .field("focused", &self.focused())
            .field("code", &self.code)
            .field("inactivity", &self.inactivity)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
