#![forbid(unsafe_code)]

//! Focus handles.
//!
//! The on-screen keyboard never owns focus. It remembers a [`FieldHandle`]
//! for the field that last gained focus and asks a [`FieldHost`] to resolve
//! it each time a key is pressed. A host invalidates every outstanding handle
//! by bumping its mount generation (the form does this when it is reset), so
//! a stale handle resolves to nothing and the press becomes a no-op.

use crate::text_field::TextField;

/// Reference to an editable field: a slot index plus the mount generation it
/// was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldHandle {
    /// Position of the field in the host's focus order.
    pub slot: usize,
    /// Host generation at the time the handle was issued.
    pub mount: u64,
}

impl FieldHandle {
    /// Create a handle.
    pub const fn new(slot: usize, mount: u64) -> Self {
        Self { slot, mount }
    }
}

/// A container of editable fields that can resolve focus handles.
pub trait FieldHost {
    /// Resolve a handle to its field. Returns `None` when the handle is
    /// stale or out of range.
    fn field_mut(&mut self, handle: FieldHandle) -> Option<&mut TextField>;

    /// Handles of every focusable field, in tab order, for the current
    /// mount generation.
    fn focus_order(&self) -> Vec<FieldHandle>;

    /// Handle that follows `current` in tab order, wrapping to the first.
    /// Falls back to the first field when `current` is not in the order.
    fn next_focus(&self, current: FieldHandle) -> Option<FieldHandle> {
        let order = self.focus_order();
        let next = order
            .iter()
            .position(|h| *h == current)
            .and_then(|idx| order.get(idx + 1));
        next.or_else(|| order.first()).copied()
    }
}
