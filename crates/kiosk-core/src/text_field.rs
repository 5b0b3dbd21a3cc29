#![forbid(unsafe_code)]

//! Editable single-line text buffer.
//!
//! A [`TextField`] holds a value, a caret and an optional selection anchor.
//! Positions are **char** indices: the on-screen keyboard inserts and deletes
//! Thai vowel and tone marks one code point at a time, so backspace after a
//! tone mark must remove only the mark. Arrow-key movement is grapheme aware
//! so the caret never parks inside a cluster.

use unicode_segmentation::UnicodeSegmentation;

use crate::event::{Event, KeyCode, KeyEvent};

/// A single-line editable text value with caret and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    /// Text value.
    value: String,
    /// Caret position (char index).
    cursor: usize,
    /// Selection anchor (char index). The selection spans anchor..cursor.
    selection_anchor: Option<usize>,
}

impl TextField {
    /// Create an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value with the caret at the end (builder).
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.set_value(value);
        self
    }

    // --- Value access ---

    /// Current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value. The caret moves to the end and the selection is
    /// dropped.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_count();
        self.selection_anchor = None;
    }

    /// Remove all text.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.selection_anchor = None;
    }

    /// True when the field holds no text at all.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Number of chars in the value.
    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Caret position (char index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the caret, collapsing any selection.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.char_count());
        self.selection_anchor = None;
    }

    // --- Selection ---

    /// Selected range as `(start, end)`, or `None` when collapsed.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.selection_anchor?;
        let range = ordered(anchor, self.cursor);
        (range.0 != range.1).then_some(range)
    }

    /// Select `start..end` with the caret at `end` (clamped).
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let max = self.char_count();
        self.selection_anchor = Some(start.min(max));
        self.cursor = end.min(max);
    }

    /// Select the whole value.
    pub fn select_all(&mut self) {
        self.set_selection(0, self.char_count());
    }

    /// Selected text, if any.
    pub fn selected_text(&self) -> Option<&str> {
        let (start, end) = self.selection()?;
        Some(&self.value[self.byte_offset(start)..self.byte_offset(end)])
    }

    // --- Range editing ---

    /// Replace chars `start..end` with `text` and put the caret right after
    /// the inserted text. Out-of-range bounds are clamped.
    pub fn replace_range(&mut self, text: &str, start: usize, end: usize) {
        let max = self.char_count();
        let (start, end) = ordered(start.min(max), end.min(max));
        let byte_start = self.byte_offset(start);
        let byte_end = self.byte_offset(end);
        self.value.replace_range(byte_start..byte_end, text);
        self.cursor = start + text.chars().count();
        self.selection_anchor = None;
    }

    /// Insert `text` over the selection, or at the caret when nothing is
    /// selected.
    pub fn insert_text(&mut self, text: &str) {
        let (start, end) = self.selection().unwrap_or((self.cursor, self.cursor));
        self.replace_range(text, start, end);
    }

    /// Delete the selection, or the single char before the caret.
    ///
    /// Returns `false` when there was nothing to delete (caret at 0).
    pub fn delete_backward(&mut self) -> bool {
        if let Some((start, end)) = self.selection() {
            self.replace_range("", start, end);
            return true;
        }
        self.selection_anchor = None;
        if self.cursor == 0 {
            return false;
        }
        let cursor = self.cursor;
        self.replace_range("", cursor - 1, cursor);
        true
    }

    /// Delete the selection, or the single char after the caret.
    pub fn delete_forward(&mut self) -> bool {
        if let Some((start, end)) = self.selection() {
            self.replace_range("", start, end);
            return true;
        }
        self.selection_anchor = None;
        if self.cursor >= self.char_count() {
            return false;
        }
        let cursor = self.cursor;
        self.replace_range("", cursor, cursor + 1);
        true
    }

    // --- Physical keyboard ---

    /// Handle an event from the physical keyboard.
    ///
    /// Returns `true` if the value or caret changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(key),
            Event::Paste(text) => {
                self.insert_text(text);
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let ctrl = key.ctrl();
        let shift = key.shift();

        match key.code {
            KeyCode::Char('a') if ctrl => {
                self.select_all();
                true
            }
            KeyCode::Char(c) if !ctrl => {
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf));
                true
            }
            KeyCode::Backspace if ctrl && self.selection().is_none() => {
                let end = self.cursor;
                let start = self.word_start_before(end);
                if start == end {
                    return false;
                }
                self.replace_range("", start, end);
                true
            }
            KeyCode::Backspace => self.delete_backward(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => {
                let target = if ctrl {
                    self.word_start_before(self.cursor)
                } else if !shift && let Some((start, _)) = self.selection() {
                    start
                } else {
                    self.prev_boundary(self.cursor)
                };
                self.move_to(target, shift);
                true
            }
            KeyCode::Right => {
                let target = if ctrl {
                    self.word_end_after(self.cursor)
                } else if !shift && let Some((_, end)) = self.selection() {
                    end
                } else {
                    self.next_boundary(self.cursor)
                };
                self.move_to(target, shift);
                true
            }
            KeyCode::Home => {
                self.move_to(0, shift);
                true
            }
            KeyCode::End => {
                self.move_to(self.char_count(), shift);
                true
            }
            _ => false,
        }
    }

    fn move_to(&mut self, target: usize, extend: bool) {
        if extend {
            if self.selection_anchor.is_none() {
                self.selection_anchor = Some(self.cursor);
            }
        } else {
            self.selection_anchor = None;
        }
        self.cursor = target.min(self.char_count());
    }

    // --- Boundaries ---

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn char_index(&self, byte_idx: usize) -> usize {
        self.value[..byte_idx].chars().count()
    }

    /// Grapheme cluster boundaries as char indices, including 0 and the end.
    fn grapheme_boundaries(&self) -> Vec<usize> {
        let mut bounds: Vec<usize> = self
            .value
            .grapheme_indices(true)
            .map(|(i, _)| self.char_index(i))
            .collect();
        bounds.push(self.char_count());
        bounds
    }

    fn prev_boundary(&self, pos: usize) -> usize {
        self.grapheme_boundaries()
            .into_iter()
            .rev()
            .find(|&b| b < pos)
            .unwrap_or(0)
    }

    fn next_boundary(&self, pos: usize) -> usize {
        self.grapheme_boundaries()
            .into_iter()
            .find(|&b| b > pos)
            .unwrap_or_else(|| self.char_count())
    }

    fn word_start_before(&self, pos: usize) -> usize {
        self.value
            .unicode_word_indices()
            .map(|(i, _)| self.char_index(i))
            .filter(|&start| start < pos)
            .last()
            .unwrap_or(0)
    }

    fn word_end_after(&self, pos: usize) -> usize {
        self.value
            .unicode_word_indices()
            .map(|(i, w)| self.char_index(i) + w.chars().count())
            .find(|&end| end > pos)
            .unwrap_or_else(|| self.char_count())
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
