//! Kiosk end-to-end tests on a virtual clock.
//!
//! Every scenario runs [`KioskApp`] inside a [`ProgramSimulator`], so the
//! two-minute inactivity timeout and the three-minute code session take no
//! real time and fire in a fixed order.
//!
//! # Invariants
//!
//! 1. **Inactivity**: no activity for 60 s shows the warning; 120 s wipes the
//!    form and resets the language. Activity before 120 s restarts both
//!    deadlines, and a timer from an older arming is ignored.
//! 2. **Code session**: a valid submit opens a session whose link carries the
//!    language and the four fields in order; a language change swaps only the
//!    language segment and token and keeps the countdown; expiry and "done"
//!    end in the same state.
//! 3. **Persistence**: edits inside the debounce window cost one write;
//!    shutdown flushes; a restart restores; resets remove the record.
//! 4. **Keyboard**: surface presses edit the focused field with caps XOR
//!    shift casing, once per press.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kiosk_core::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind, TouchEvent,
};
use kiosk_core::geometry::Viewport;
use kiosk_core::keyboard::{KeyRef, PointerPhase, SurfaceEvent, SurfaceTarget};
use kiosk_core::locale::Lang;
use kiosk_form::code_display::{CodeRenderer, RenderError};
use kiosk_form::link::{SEGMENT_COUNT, decode};
use kiosk_form::persistence::{FormSnapshot, SCHEMA_KEY, SCHEMA_VERSION};
use kiosk_form::{FieldId, KioskApp, KioskConfig, Msg};
use kiosk_runtime::{CmdRecord, MemoryStorage, ProgramSimulator, StateRegistry, StoredEntry};
use tracing::Level;

// ============================================================================
// Test Utilities
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

fn log_jsonl(event: &str, case: &str, passed: bool, details: &str) {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    eprintln!(
        r#"{{"event":"{event}","case":"{case}","passed":{passed},"details":"{details}","timestamp":{timestamp}}}"#
    );
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn app() -> KioskApp {
    KioskApp::new(KioskConfig::default()).with_token_clock(|| 1_700_000_000_000)
}

fn sim() -> ProgramSimulator<KioskApp> {
    init_tracing();
    let mut sim = ProgramSimulator::new(app());
    sim.init();
    sim
}

struct Store {
    backend: Arc<MemoryStorage>,
    registry: Arc<StateRegistry>,
}

impl Store {
    fn new() -> Self {
        Self::over(Arc::new(MemoryStorage::new()))
    }

    fn over(backend: Arc<MemoryStorage>) -> Self {
        let registry = StateRegistry::new(Box::new(Arc::clone(&backend))).shared();
        Self { backend, registry }
    }

    fn sim(&self) -> ProgramSimulator<KioskApp> {
        init_tracing();
        let app = app().with_registry(Arc::clone(&self.registry));
        let mut sim = ProgramSimulator::with_registry(app, Arc::clone(&self.registry));
        sim.init();
        sim
    }

    fn saved(&self) -> Option<FormSnapshot> {
        let entry = self.backend.entry(SCHEMA_KEY)?;
        serde_json::from_slice(&entry.payload).ok()
    }
}

fn fill(sim: &mut ProgramSimulator<KioskApp>) {
    sim.send(Msg::SetField(FieldId::Depositor, "  สมชาย   ใจดี ".into()));
    sim.send(Msg::SetField(FieldId::VisitorId, "AB/12".into()));
    sim.send(Msg::SetField(FieldId::Prisoner, "Anan #1".into()));
}

fn mouse_move() -> Event {
    Event::Mouse(MouseEvent::new(MouseEventKind::Moved, 3, 4))
}

fn key(row: usize, col: usize) -> Msg {
    Msg::Surface(SurfaceEvent::new(
        PointerPhase::Down,
        SurfaceTarget::Key(KeyRef { row, col }),
    ))
}

#[derive(Clone, Default)]
struct RecordingRenderer {
    renders: Arc<Mutex<Vec<(String, u32)>>>,
}

impl RecordingRenderer {
    fn renders(&self) -> Vec<(String, u32)> {
        self.renders.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl CodeRenderer for RecordingRenderer {
    fn render(&mut self, payload: &str, size_px: u32) -> Result<(), RenderError> {
        if let Ok(mut renders) = self.renders.lock() {
            renders.push((payload.to_owned(), size_px));
        }
        Ok(())
    }

    fn export_image(&mut self) -> Result<Vec<u8>, RenderError> {
        let renders = self.renders();
        let (payload, _) = renders.last().ok_or(RenderError::Unsupported("empty"))?;
        Ok(payload.as_bytes().to_vec())
    }
}

// ============================================================================
// 1. Inactivity
// ============================================================================

#[test]
fn idle_warns_then_wipes() {
    let mut sim = sim();
    fill(&mut sim);
    sim.send(Msg::SetLanguage(Lang::En));
    sim.send(Msg::Focus(FieldId::Prisoner));

    sim.advance(secs(59));
    assert!(!sim.model().inactivity().warning_visible());

    sim.advance(secs(1));
    assert!(sim.model().inactivity().warning_visible());
    assert_eq!(sim.model().inactivity().remaining_secs(), 60);

    sim.advance(secs(30));
    assert_eq!(sim.model().inactivity().remaining_secs(), 30);
    assert_eq!(sim.model().value(FieldId::Prisoner), "Anan #1");

    sim.advance(secs(30));
    let app = sim.model();
    assert!(app.fields().is_empty());
    assert_eq!(app.lang(), Lang::Th);
    assert!(!app.inactivity().warning_visible());
    assert_eq!(app.focused(), None);
    assert!(!app.keyboard().is_visible());
    assert!(sim.pending_timers().is_empty());

    log_jsonl("inactivity", "idle_wipe", true, "warn at 60s, wipe at 120s");
}

#[test]
fn exactly_one_reset_fires() {
    let mut sim = sim();
    fill(&mut sim);
    sim.advance(secs(500));
    let fired: Vec<_> = sim
        .command_log()
        .iter()
        .filter(|r| **r == CmdRecord::TimerFired("inactivity.reset"))
        .collect();
    assert_eq!(fired.len(), 1);
    assert!(!sim.model().inactivity().is_armed());
}

#[test]
fn activity_restarts_both_deadlines() {
    let mut sim = sim();
    fill(&mut sim);

    sim.advance(secs(100));
    assert!(sim.model().inactivity().warning_visible());
    sim.inject_event(mouse_move());
    assert!(!sim.model().inactivity().warning_visible());
    assert_eq!(sim.timer_deadline("inactivity.warn"), Some(secs(160)));
    assert_eq!(sim.timer_deadline("inactivity.reset"), Some(secs(220)));
    assert_eq!(sim.timer_deadline("inactivity.tick"), None);

    sim.advance(secs(50));
    assert_eq!(sim.model().value(FieldId::VisitorId), "AB/12");
    assert!(!sim.model().inactivity().warning_visible());

    sim.advance(secs(10));
    assert!(sim.model().inactivity().warning_visible());
    sim.advance(secs(60));
    assert!(sim.model().fields().is_empty());

    log_jsonl("inactivity", "rearm", true, "activity moves both deadlines");
}

#[test]
fn key_release_is_not_activity() {
    let mut sim = sim();
    sim.advance(secs(30));
    let release = KeyEvent::new(KeyCode::Char('a')).with_kind(KeyEventKind::Release);
    sim.inject_event(Event::Key(release));
    assert_eq!(sim.timer_deadline("inactivity.warn"), Some(secs(60)));
    sim.inject_event(Event::Key(KeyEvent::new(KeyCode::Char('a'))));
    assert_eq!(sim.timer_deadline("inactivity.warn"), Some(secs(90)));
}

#[test]
fn stale_timer_message_is_ignored() {
    use kiosk_form::inactivity::InactivityMsg;

    let mut sim = sim();
    fill(&mut sim);
    let old = sim.model().inactivity().epoch();
    sim.inject_event(mouse_move());
    sim.send(Msg::Inactivity(InactivityMsg::Warn { epoch: old }));
    sim.send(Msg::Inactivity(InactivityMsg::Reset { epoch: old }));
    assert!(!sim.model().inactivity().warning_visible());
    assert_eq!(sim.model().value(FieldId::Prisoner), "Anan #1");

    log_jsonl("inactivity", "stale_epoch", true, "old epoch dropped");
}

#[test]
fn continue_keeps_data_and_rearms() {
    let mut sim = sim();
    fill(&mut sim);
    sim.advance(secs(70));
    sim.send(Msg::ContinueSession);
    assert!(!sim.model().inactivity().warning_visible());
    assert_eq!(sim.timer_deadline("inactivity.reset"), Some(secs(190)));
    sim.advance(secs(60));
    assert_eq!(sim.model().value(FieldId::Depositor), "  สมชาย   ใจดี ");
}

#[test]
fn wiped_form_stays_quiet_until_touched() {
    let mut sim = sim();
    sim.advance(secs(120));
    assert!(sim.pending_timers().is_empty());
    sim.inject_event(Event::Touch(TouchEvent { x: 1, y: 1 }));
    assert_eq!(sim.timer_deadline("inactivity.warn"), Some(secs(180)));
}

// ============================================================================
// 2. Code Session
// ============================================================================

#[test]
fn submit_encodes_fields_in_order() {
    let mut sim = sim();
    fill(&mut sim);
    sim.send(Msg::SetLanguage(Lang::En));
    sim.send(Msg::Submit);

    let url = sim.model().code().url().map(str::to_owned).unwrap();
    assert_eq!(
        url,
        format!(
            "https://kiosk-mobile.vercel.app/#/qr/en/{}/AB%2F12/Anan%20%231/-/1700000000000",
            urlencoding::encode("สมชาย ใจดี")
        )
    );
    let parts = decode(&url).unwrap();
    assert_eq!(parts.lang, Lang::En);
    assert_eq!(parts.values.depositor, "สมชาย ใจดี");
    assert_eq!(parts.values.zone, "");

    let after_marker = url.split("/qr/").nth(1).unwrap();
    assert_eq!(after_marker.split('/').count(), SEGMENT_COUNT);

    log_jsonl("code", "submit", true, "segments in order");
}

#[test]
fn incomplete_form_opens_nothing() {
    let mut sim = sim();
    sim.send(Msg::SetField(FieldId::Depositor, "A".into()));
    sim.send(Msg::SetField(FieldId::VisitorId, "   ".into()));
    sim.send(Msg::SetField(FieldId::Prisoner, "C".into()));
    sim.send(Msg::Submit);
    assert!(!sim.model().code().is_active());
    assert!(sim.timer_deadline("code.tick").is_none());
}

#[test]
fn language_change_keeps_countdown() {
    let mut sim = sim();
    fill(&mut sim);
    sim.send(Msg::Submit);
    let before = decode(sim.model().code().url().unwrap()).unwrap();
    assert_eq!(before.lang, Lang::Th);

    sim.advance(secs(40));
    assert_eq!(sim.model().code().remaining_secs(), 140);

    sim.send(Msg::SetLanguage(Lang::Zh));
    let after = decode(sim.model().code().url().unwrap()).unwrap();
    assert_eq!(after.lang, Lang::Zh);
    assert_eq!(after.values, before.values);
    assert!(after.token > before.token);
    assert_eq!(sim.model().code().remaining_secs(), 140);
    assert_eq!(sim.timer_deadline("code.tick"), Some(secs(41)));

    log_jsonl("code", "language_change", true, "countdown kept");
}

#[test]
fn session_suspends_inactivity() {
    let mut sim = sim();
    fill(&mut sim);
    sim.send(Msg::Submit);
    assert!(sim.timer_deadline("inactivity.reset").is_none());

    sim.advance(secs(150));
    sim.inject_event(mouse_move());
    assert!(sim.model().code().is_active());
    assert!(!sim.model().inactivity().warning_visible());
    assert!(sim.timer_deadline("inactivity.warn").is_none());
}

#[test]
fn expiry_matches_manual_finish() {
    let mut expired = sim();
    fill(&mut expired);
    expired.send(Msg::SetLanguage(Lang::En));
    expired.send(Msg::Submit);
    expired.advance(secs(179));
    assert!(expired.model().code().is_active());
    expired.advance(secs(1));

    let mut finished = sim();
    fill(&mut finished);
    finished.send(Msg::SetLanguage(Lang::En));
    finished.send(Msg::Submit);
    finished.advance(secs(25));
    finished.send(Msg::FinishCode);

    for sim in [&expired, &finished] {
        let app = sim.model();
        assert!(!app.code().is_active());
        assert!(app.fields().is_empty());
        assert_eq!(app.lang(), Lang::Th);
        assert_eq!(app.status(), None);
        assert!(app.inactivity().is_armed());
        assert!(sim.timer_deadline("code.tick").is_none());
    }
    assert_eq!(expired.timer_deadline("inactivity.warn"), Some(secs(240)));

    log_jsonl("code", "expiry_vs_done", true, "same end state");
}

#[test]
fn renderer_sees_open_rebuild_and_resize() {
    let renderer = RecordingRenderer::default();
    let app = app()
        .with_renderer(renderer.clone())
        .with_viewport(Viewport::new(400, 300));
    let mut sim = ProgramSimulator::new(app);
    sim.init();
    fill(&mut sim);
    sim.send(Msg::Submit);
    sim.send(Msg::SetLanguage(Lang::En));
    sim.send(Msg::Resize(Viewport::new(1920, 1080)));

    let renders = renderer.renders();
    assert_eq!(renders.len(), 3);
    assert_eq!(renders[0].1, 180);
    assert!(renders[0].0.contains("/qr/th/"));
    assert!(renders[1].0.contains("/qr/en/"));
    assert_eq!(renders[2].1, 480);

    sim.send(Msg::ExportCode);
    assert_eq!(sim.model().last_export(), Some(renders[2].0.as_bytes()));
}

// ============================================================================
// 3. Persistence
// ============================================================================

#[test]
fn edits_within_debounce_cost_one_write() {
    let store = Store::new();
    let mut sim = store.sim();
    for len in 1..="Somchai".len() {
        sim.send(Msg::SetField(FieldId::Depositor, "Somchai"[..len].to_owned()));
        sim.advance(Duration::from_millis(100));
    }
    assert_eq!(store.backend.write_count(), 0);

    sim.advance(Duration::from_millis(200));
    assert_eq!(store.backend.write_count(), 1);
    assert_eq!(store.saved().map(|s| s.depositor), Some("Somchai".into()));

    log_jsonl("persist", "debounce", true, "7 edits, 1 write");
}

#[test]
fn shutdown_flushes_pending_edit() {
    let store = Store::new();
    let mut sim = store.sim();
    sim.send(Msg::SetField(FieldId::Prisoner, "Anan".into()));
    sim.shutdown();
    assert_eq!(store.backend.write_count(), 1);
    assert_eq!(store.saved().map(|s| s.prisoner), Some("Anan".into()));
}

#[test]
fn restart_restores_fields_and_language() {
    let backend = Arc::new(MemoryStorage::new());
    {
        let store = Store::over(Arc::clone(&backend));
        let mut sim = store.sim();
        fill(&mut sim);
        sim.send(Msg::SetLanguage(Lang::Zh));
        sim.shutdown();
    }
    let store = Store::over(backend);
    let sim = store.sim();
    assert_eq!(sim.model().lang(), Lang::Zh);
    assert_eq!(sim.model().value(FieldId::VisitorId), "AB/12");
    assert_eq!(sim.model().value(FieldId::Depositor), "  สมชาย   ใจดี ");

    log_jsonl("persist", "restart", true, "fields and language restored");
}

#[test]
fn typing_into_restored_field_appends() {
    let backend = Arc::new(MemoryStorage::new());
    {
        let store = Store::over(Arc::clone(&backend));
        let mut sim = store.sim();
        sim.send(Msg::SetField(FieldId::Depositor, "Somchai".into()));
        sim.shutdown();
    }
    let store = Store::over(backend);
    let mut sim = store.sim();
    assert_eq!(sim.model().value(FieldId::Depositor), "Somchai");

    sim.send(Msg::Focus(FieldId::Depositor));
    sim.send(Msg::Surface(SurfaceEvent::new(
        PointerPhase::Down,
        SurfaceTarget::LayoutToggle,
    )));
    sim.send(key(1, 1)); // q
    assert_eq!(sim.model().value(FieldId::Depositor), "Somchaiq");

    sim.inject_event(Event::Key(KeyEvent::new(KeyCode::Char('!'))));
    assert_eq!(sim.model().value(FieldId::Depositor), "Somchaiq!");

    log_jsonl("persist", "restored_caret", true, "typing appends after restore");
}

#[test]
fn file_store_survives_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk-state.json");
    let run = || {
        let registry = StateRegistry::with_file(&path).shared();
        let app = app().with_registry(Arc::clone(&registry));
        let mut sim = ProgramSimulator::with_registry(app, registry);
        sim.init();
        sim
    };

    let mut first = run();
    first.send(Msg::SetField(FieldId::Zone, "B-4".into()));
    first.send(Msg::SetLanguage(Lang::En));
    first.advance(secs(1));
    drop(first);
    assert!(path.exists());

    let second = run();
    assert_eq!(second.model().value(FieldId::Zone), "B-4");
    assert_eq!(second.model().lang(), Lang::En);

    log_jsonl("persist", "file_restart", true, "json file round trip");
}

#[test]
fn foreign_or_broken_records_load_as_empty() {
    let payload = serde_json::to_vec(&FormSnapshot {
        language: "en".into(),
        depositor: "x".into(),
        ..FormSnapshot::default()
    })
    .unwrap();
    for entry in [
        StoredEntry::new(SCHEMA_KEY, SCHEMA_VERSION + 1, payload.clone()),
        StoredEntry::new(SCHEMA_KEY, SCHEMA_VERSION, b"not json".to_vec()),
        StoredEntry::new("kiosk-form-v1", SCHEMA_VERSION, payload.clone()),
    ] {
        let store = Store::over(Arc::new(MemoryStorage::with_entries([entry])));
        let sim = store.sim();
        assert!(sim.model().fields().is_empty());
        assert_eq!(sim.model().lang(), Lang::Th);
    }
}

#[test]
fn resets_remove_the_record() {
    let store = Store::new();
    let mut sim = store.sim();
    fill(&mut sim);
    sim.advance(secs(1));
    assert!(store.saved().is_some());

    sim.advance(secs(119));
    assert!(sim.model().fields().is_empty());
    assert!(store.saved().is_none());
}

#[test]
fn manual_clear_keeps_language() {
    let store = Store::new();
    let mut sim = store.sim();
    fill(&mut sim);
    sim.send(Msg::SetLanguage(Lang::En));
    sim.advance(secs(1));
    sim.send(Msg::ClearAll);
    assert!(sim.model().fields().is_empty());
    assert_eq!(sim.model().lang(), Lang::En);
    assert!(store.saved().is_none());
    assert!(sim.timer_deadline("persist.flush").is_none());
}

#[test]
fn finishing_a_session_removes_the_record() {
    let store = Store::new();
    let mut sim = store.sim();
    fill(&mut sim);
    sim.send(Msg::Submit);
    sim.advance(secs(1));
    assert!(store.saved().is_some());
    sim.send(Msg::FinishCode);
    assert!(store.saved().is_none());
}

// ============================================================================
// 4. Keyboard
// ============================================================================

#[test]
fn surface_typing_follows_caps_and_shift() {
    let mut sim = sim();
    sim.send(Msg::Focus(FieldId::Depositor));
    sim.send(Msg::Surface(SurfaceEvent::new(
        PointerPhase::Down,
        SurfaceTarget::LayoutToggle,
    )));

    sim.send(key(2, 1)); // a
    sim.send(key(2, 0)); // caps
    sim.send(key(2, 1));
    sim.send(key(3, 0)); // shift
    sim.send(key(2, 1));
    sim.send(key(2, 1));
    assert_eq!(sim.model().value(FieldId::Depositor), "aAaA");
    assert!(!sim.model().keyboard().state().shift);
    assert!(sim.model().keyboard().state().caps);

    sim.send(key(0, 13)); // backspace
    assert_eq!(sim.model().value(FieldId::Depositor), "aAa");

    log_jsonl("keyboard", "caps_xor_shift", true, "aAaA");
}

#[test]
fn trailing_click_does_not_type_twice() {
    let mut sim = sim();
    sim.send(Msg::Focus(FieldId::Zone));
    for phase in [PointerPhase::TouchStart, PointerPhase::Up, PointerPhase::Click] {
        sim.send(Msg::Surface(SurfaceEvent::new(
            phase,
            SurfaceTarget::Key(KeyRef { row: 0, col: 1 }),
        )));
    }
    assert_eq!(sim.model().value(FieldId::Zone).chars().count(), 1);
}

#[test]
fn keyboard_press_after_reset_is_a_noop() {
    let mut sim = sim();
    sim.send(Msg::Focus(FieldId::Depositor));
    sim.advance(secs(120));
    sim.send(key(2, 1));
    assert!(sim.model().fields().is_empty());
}

#[test]
fn tab_key_cycles_focus() {
    let mut sim = sim();
    sim.send(Msg::Focus(FieldId::Prisoner));
    sim.send(key(1, 0));
    assert_eq!(sim.model().focused(), Some(FieldId::Zone));
    sim.send(key(1, 0));
    assert_eq!(sim.model().focused(), Some(FieldId::Depositor));
}
