#![forbid(unsafe_code)]

//! Saved form between restarts.
//!
//! One record under a fixed schema key holds the language and the four raw
//! field values as JSON. Anything that does not decode as the current
//! version (missing, older version, malformed JSON, unreadable store) loads
//! as "nothing saved".
//!
//! The store only stages records in the shared [`StateRegistry`]. Writing to
//! disk happens when the program executes `Cmd::SaveState`, which the
//! controller issues on its debounce timer, after a reset and at shutdown.

use std::sync::Arc;

use kiosk_core::locale::Lang;
use kiosk_runtime::StateRegistry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fields::{FieldId, FormFields};

/// Record key in the registry.
pub const SCHEMA_KEY: &str = "kiosk-form-v2";
/// Version stamped on every record written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// The persisted shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub language: String,
    pub depositor: String,
    pub visitor_id: String,
    pub prisoner: String,
    pub zone: String,
}

impl FormSnapshot {
    /// Capture the raw (unsanitized) field text and the language.
    pub fn capture(fields: &FormFields, lang: Lang) -> Self {
        Self {
            language: lang.code().to_owned(),
            depositor: fields.value(FieldId::Depositor).to_owned(),
            visitor_id: fields.value(FieldId::VisitorId).to_owned(),
            prisoner: fields.value(FieldId::Prisoner).to_owned(),
            zone: fields.value(FieldId::Zone).to_owned(),
        }
    }

    /// Write the snapshot into `fields`. Returns the stored language, or
    /// `None` when it is not one we know.
    pub fn apply(&self, fields: &mut FormFields) -> Option<Lang> {
        fields.set_value(FieldId::Depositor, self.depositor.as_str());
        fields.set_value(FieldId::VisitorId, self.visitor_id.as_str());
        fields.set_value(FieldId::Prisoner, self.prisoner.as_str());
        fields.set_value(FieldId::Zone, self.zone.as_str());
        Lang::parse(&self.language)
    }
}

/// Reads and stages the form snapshot.
#[derive(Debug, Clone)]
pub struct FormStore {
    registry: Arc<StateRegistry>,
    key: String,
}

impl FormStore {
    pub fn new(registry: Arc<StateRegistry>) -> Self {
        Self::with_key(registry, SCHEMA_KEY)
    }

    pub fn with_key(registry: Arc<StateRegistry>, key: impl Into<String>) -> Self {
        Self {
            registry,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn registry(&self) -> &Arc<StateRegistry> {
        &self.registry
    }

    /// Read the backend and decode the saved snapshot.
    pub fn load(&self) -> Option<FormSnapshot> {
        if let Err(e) = self.registry.load() {
            warn!(
                target: "kiosk::persist",
                backend = self.registry.backend_name(),
                error = %e,
                "store unreadable, starting empty"
            );
            return None;
        }
        let entry = self.registry.get(&self.key)?;
        if entry.schema_version != SCHEMA_VERSION {
            debug!(
                target: "kiosk::persist",
                found = entry.schema_version,
                expected = SCHEMA_VERSION,
                "saved form has another schema version, ignoring"
            );
            return None;
        }
        match serde_json::from_slice::<FormSnapshot>(&entry.payload) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(target: "kiosk::persist", error = %e, "saved form is malformed, ignoring");
                None
            }
        }
    }

    /// Stage `snapshot` in memory. It reaches the backend on the next flush.
    pub fn stage(&self, snapshot: &FormSnapshot) {
        match serde_json::to_vec(snapshot) {
            Ok(payload) => self.registry.set(self.key.as_str(), SCHEMA_VERSION, payload),
            Err(e) => warn!(target: "kiosk::persist", error = %e, "cannot encode form"),
        }
    }

    /// Drop the staged snapshot. Returns whether one existed.
    pub fn remove(&self) -> bool {
        self.registry.remove(&self.key).is_some()
    }
}
