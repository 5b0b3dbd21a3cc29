//! Property-based invariant tests for the sanitizer, text fields and the
//! on-screen keyboard.
//!
//! 1. Sanitize is idempotent.
//! 2. Sanitized output has no edge whitespace and no whitespace runs.
//! 3. Sanitize keeps every non-whitespace char in order.
//! 4. The caret never leaves the value.
//! 5. Inserting then backspacing the same number of chars restores the value.
//! 6. Latin letter case is caps XOR shift; shift is consumed by the press.
//! 7. Thai glyphs ignore caps.

use kiosk_core::focus::{FieldHandle, FieldHost};
use kiosk_core::keyboard::{KeyKind, KeyOutcome, LayoutKind, ShiftSide, VirtualKeyboard};
use kiosk_core::sanitize::{is_blank, sanitize};
use kiosk_core::text_field::TextField;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

struct OneField(TextField);

impl FieldHost for OneField {
    fn field_mut(&mut self, handle: FieldHandle) -> Option<&mut TextField> {
        (handle == FieldHandle::new(0, 0)).then_some(&mut self.0)
    }

    fn focus_order(&self) -> Vec<FieldHandle> {
        vec![FieldHandle::new(0, 0)]
    }
}

fn messy_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just(" ".to_string()),
            Just("\t".to_string()),
            Just("\n".to_string()),
            Just("\u{3000}".to_string()),
            "[a-zA-Z0-9]{1,4}",
            "[ก-ฮ]{1,3}",
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn char_keys(layout: LayoutKind) -> Vec<KeyKind> {
    layout
        .rows()
        .iter()
        .flat_map(|row| row.iter())
        .map(|def| def.kind)
        .filter(|kind| matches!(kind, KeyKind::Char { .. }))
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-3. Sanitizer
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sanitize_idempotent(raw in messy_text()) {
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once.clone(), "not idempotent for {:?}", raw);
    }

    #[test]
    fn sanitize_shape(raw in messy_text()) {
        let out = sanitize(&raw);
        prop_assert_eq!(out.trim(), out.as_str());
        prop_assert!(!out.contains("  "), "double space in {:?}", out);
        prop_assert!(out.chars().all(|c| c == ' ' || !c.is_whitespace()));
        prop_assert_eq!(out.is_empty(), is_blank(&raw));
    }

    #[test]
    fn sanitize_keeps_content(raw in messy_text()) {
        let kept: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let out: String = sanitize(&raw).chars().filter(|c| *c != ' ').collect();
        prop_assert_eq!(out, kept);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4-5. Text field editing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn caret_stays_in_bounds(
        initial in "[a-zก-ฮ ]{0,12}",
        start in 0usize..20,
        end in 0usize..20,
        text in "[a-z]{0,4}",
    ) {
        let mut field = TextField::new().with_value(initial);
        field.set_selection(start, end);
        prop_assert!(field.cursor() <= field.char_count());
        field.insert_text(&text);
        prop_assert!(field.cursor() <= field.char_count());
        field.delete_backward();
        prop_assert!(field.cursor() <= field.char_count());
    }

    #[test]
    fn insert_then_backspace_restores(
        initial in "[a-zก-ฮ]{0,10}",
        at in 0usize..12,
        text in "[a-zก-ฮ่้]{1,5}",
    ) {
        let mut field = TextField::new().with_value(initial.clone());
        field.set_cursor(at);
        field.insert_text(&text);
        for _ in 0..text.chars().count() {
            prop_assert!(field.delete_backward());
        }
        prop_assert_eq!(field.value(), initial.as_str());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6-7. Keyboard glyph rules
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn latin_case_is_caps_xor_shift(idx in 0usize..47, caps in any::<bool>(), shift in any::<bool>()) {
        let keys = char_keys(LayoutKind::En);
        let key = keys[idx % keys.len()];
        let KeyKind::Char { normal, shift: alt } = key else { unreachable!() };

        let mut host = OneField(TextField::new());
        let mut kb = VirtualKeyboard::new(LayoutKind::En);
        kb.focus(FieldHandle::new(0, 0));
        if caps {
            kb.press(&mut host, &KeyKind::Caps);
        }
        if shift {
            kb.press(&mut host, &KeyKind::Shift(ShiftSide::Left));
        }
        let outcome = kb.press(&mut host, &key);
        prop_assert_eq!(outcome, KeyOutcome::Edited(FieldHandle::new(0, 0)));

        let expected = if normal.is_ascii_alphabetic() {
            if caps != shift { normal.to_ascii_uppercase() } else { normal }
        } else if shift {
            alt.unwrap_or(normal)
        } else {
            normal
        };
        prop_assert_eq!(host.0.value(), expected.to_string());
        prop_assert!(!kb.state().shift);
        prop_assert_eq!(kb.state().caps, caps);
    }

    #[test]
    fn thai_ignores_caps(idx in 0usize..47, shift in any::<bool>()) {
        let keys = char_keys(LayoutKind::Th);
        let key = keys[idx % keys.len()];

        let mut plain = VirtualKeyboard::new(LayoutKind::Th);
        let mut capped = VirtualKeyboard::new(LayoutKind::Th);
        let mut host = OneField(TextField::new());
        capped.press(&mut host, &KeyKind::Caps);
        if shift {
            plain.press(&mut host, &KeyKind::Shift(ShiftSide::Left));
            capped.press(&mut host, &KeyKind::Shift(ShiftSide::Left));
        }
        prop_assert_eq!(plain.glyph_for(&key), capped.glyph_for(&key));
    }
}
