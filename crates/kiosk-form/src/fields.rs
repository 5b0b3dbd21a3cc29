#![forbid(unsafe_code)]

//! The four form fields and their validation.
//!
//! Field order is a contract with the mobile page that decodes the link:
//! `depositor, visitor_id, prisoner, zone`. The zone is optional; the other
//! three must be non-empty after sanitization.

use std::fmt;

use kiosk_core::focus::{FieldHandle, FieldHost};
use kiosk_core::sanitize::{is_blank, sanitize};
use kiosk_core::text_field::TextField;

/// Identifies one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    /// Depositor's full name.
    Depositor,
    /// Depositor's ID card or passport number.
    VisitorId,
    /// Prisoner's full name.
    Prisoner,
    /// Zone or queue number.
    Zone,
}

impl FieldId {
    /// Every field, in link and tab order.
    pub const ALL: [FieldId; 4] = [
        FieldId::Depositor,
        FieldId::VisitorId,
        FieldId::Prisoner,
        FieldId::Zone,
    ];

    /// Position in [`FieldId::ALL`].
    pub const fn index(self) -> usize {
        match self {
            FieldId::Depositor => 0,
            FieldId::VisitorId => 1,
            FieldId::Prisoner => 2,
            FieldId::Zone => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn required(self) -> bool {
        !matches!(self, FieldId::Zone)
    }

    /// Stable snake-case name, used in logs and the persisted snapshot.
    pub const fn name(self) -> &'static str {
        match self {
            FieldId::Depositor => "depositor",
            FieldId::VisitorId => "visitor_id",
            FieldId::Prisoner => "prisoner",
            FieldId::Zone => "zone",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Required fields that are empty after sanitization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub missing: Vec<FieldId>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Sanitized field values. Empty strings stand for absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    pub depositor: String,
    pub visitor_id: String,
    pub prisoner: String,
    pub zone: String,
}

impl FieldValues {
    pub fn get(&self, id: FieldId) -> &str {
        match id {
            FieldId::Depositor => &self.depositor,
            FieldId::VisitorId => &self.visitor_id,
            FieldId::Prisoner => &self.prisoner,
            FieldId::Zone => &self.zone,
        }
    }

    /// Values in link order.
    pub fn ordered(&self) -> [&str; 4] {
        FieldId::ALL.map(|id| self.get(id))
    }
}

/// Text buffers for the four fields plus the mount generation that issues
/// focus handles.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    fields: [TextField; 4],
    mount: u64,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, id: FieldId) -> &TextField {
        &self.fields[id.index()]
    }

    pub fn field_by_id_mut(&mut self, id: FieldId) -> &mut TextField {
        &mut self.fields[id.index()]
    }

    /// Raw (unsanitized) text of a field.
    pub fn value(&self, id: FieldId) -> &str {
        self.field(id).value()
    }

    /// Replace a field's text. The caret moves to the end.
    pub fn set_value(&mut self, id: FieldId, value: impl Into<String>) {
        self.field_by_id_mut(id).set_value(value);
    }

    /// Focus handle for `id` under the current mount generation.
    pub fn handle(&self, id: FieldId) -> FieldHandle {
        FieldHandle::new(id.index(), self.mount)
    }

    /// Field a handle points at, if it is still current.
    pub fn id_of(&self, handle: FieldHandle) -> Option<FieldId> {
        if handle.mount != self.mount {
            return None;
        }
        FieldId::from_index(handle.slot)
    }

    pub fn mount(&self) -> u64 {
        self.mount
    }

    /// Empty every field. Outstanding handles stay valid.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
    }

    /// Empty every field and invalidate every outstanding handle.
    pub fn reset(&mut self) {
        self.clear();
        self.mount = self.mount.wrapping_add(1);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(TextField::is_empty)
    }

    pub fn validate(&self) -> Validation {
        let missing = FieldId::ALL
            .into_iter()
            .filter(|id| id.required() && is_blank(self.value(*id)))
            .collect();
        Validation { missing }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_valid()
    }

    pub fn values(&self) -> FieldValues {
        FieldValues {
            depositor: sanitize(self.value(FieldId::Depositor)),
            visitor_id: sanitize(self.value(FieldId::VisitorId)),
            prisoner: sanitize(self.value(FieldId::Prisoner)),
            zone: sanitize(self.value(FieldId::Zone)),
        }
    }
}

impl FieldHost for FormFields {
    fn field_mut(&mut self, handle: FieldHandle) -> Option<&mut TextField> {
        let id = self.id_of(handle)?;
        Some(self.field_by_id_mut(id))
    }

    fn focus_order(&self) -> Vec<FieldHandle> {
        FieldId::ALL.into_iter().map(|id| self.handle(id)).collect()
    }
}
