#![forbid(unsafe_code)]

//! Kiosk settings.
//!
//! Defaults match the deployed kiosk. [`KioskConfig::from_env`] overrides
//! them from `KIOSK_*` variables; a value that does not parse is logged and
//! the default kept.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `KIOSK_BASE_URL` | destination page, ending in `qr` | `https://kiosk-mobile.vercel.app/#/qr` |
//! | `KIOSK_TTL_SECS` | `?ttl=` on every link | unset |
//! | `KIOSK_WARN_AFTER_SECS` | idle seconds before the warning | 60 |
//! | `KIOSK_RESET_AFTER_SECS` | idle seconds before the reset | 120 |
//! | `KIOSK_CODE_SECS` | code modal duration | 180 |
//! | `KIOSK_PERSIST_DEBOUNCE_MS` | delay before a save | 250 |
//! | `KIOSK_DEFAULT_LANG` | `th`, `en` or `zh` | `th` |
//! | `KIOSK_KEYBOARD_LAYOUT` | `th` or `en` | `th` |
//! | `KIOSK_TAB_POLICY` | `move-focus` or `insert-tab` | `move-focus` |

use std::str::FromStr;
use std::time::Duration;

use kiosk_core::keyboard::{LayoutKind, TabPolicy};
use kiosk_core::locale::Lang;
use tracing::warn;

use crate::link::{BuildError, DEFAULT_BASE_URL, LinkBuilder};
use crate::persistence::SCHEMA_KEY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    pub base_url: String,
    pub ttl_secs: Option<u64>,
    pub warn_after: Duration,
    pub reset_after: Duration,
    pub code_secs: u64,
    pub persist_debounce: Duration,
    pub schema_key: String,
    pub default_lang: Lang,
    pub keyboard_layout: LayoutKind,
    pub tab_policy: TabPolicy,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            ttl_secs: None,
            warn_after: Duration::from_secs(60),
            reset_after: Duration::from_secs(120),
            code_secs: 180,
            persist_debounce: Duration::from_millis(250),
            schema_key: SCHEMA_KEY.to_owned(),
            default_lang: Lang::Th,
            keyboard_layout: LayoutKind::Th,
            tab_policy: TabPolicy::MoveFocus,
        }
    }
}

impl KioskConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name).and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            })
        };
        let mut config = Self::default();

        if let Some(base) = get("KIOSK_BASE_URL") {
            match LinkBuilder::new(base.as_str()) {
                Ok(builder) => config.base_url = builder.base().to_owned(),
                Err(e) => {
                    warn!(target: "kiosk::config", var = "KIOSK_BASE_URL", error = %e, "ignored");
                }
            }
        }
        config.ttl_secs = parsed(&get, "KIOSK_TTL_SECS");
        if let Some(secs) = parsed::<u64>(&get, "KIOSK_WARN_AFTER_SECS") {
            config.warn_after = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>(&get, "KIOSK_RESET_AFTER_SECS") {
            config.reset_after = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>(&get, "KIOSK_CODE_SECS") {
            config.code_secs = secs;
        }
        if let Some(ms) = parsed::<u64>(&get, "KIOSK_PERSIST_DEBOUNCE_MS") {
            config.persist_debounce = Duration::from_millis(ms);
        }
        if let Some(lang) = parsed(&get, "KIOSK_DEFAULT_LANG") {
            config.default_lang = lang;
        }
        if let Some(layout) = parsed(&get, "KIOSK_KEYBOARD_LAYOUT") {
            config.keyboard_layout = layout;
        }
        if let Some(policy) = parsed(&get, "KIOSK_TAB_POLICY") {
            config.tab_policy = policy;
        }

        config.normalized()
    }

    /// Replace timings that cannot work with the defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.warn_after.is_zero() || self.reset_after <= self.warn_after {
            warn!(
                target: "kiosk::config",
                warn_after = self.warn_after.as_secs(),
                reset_after = self.reset_after.as_secs(),
                "reset must come after a non-zero warning; using default timings"
            );
            self.warn_after = defaults.warn_after;
            self.reset_after = defaults.reset_after;
        }
        if self.code_secs == 0 {
            warn!(target: "kiosk::config", "code duration must be non-zero; using default");
            self.code_secs = defaults.code_secs;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: Option<u64>) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_timeouts(mut self, warn_after: Duration, reset_after: Duration) -> Self {
        self.warn_after = warn_after;
        self.reset_after = reset_after;
        self
    }

    pub fn with_code_secs(mut self, code_secs: u64) -> Self {
        self.code_secs = code_secs;
        self
    }

    pub fn with_persist_debounce(mut self, debounce: Duration) -> Self {
        self.persist_debounce = debounce;
        self
    }

    pub fn with_schema_key(mut self, key: impl Into<String>) -> Self {
        self.schema_key = key.into();
        self
    }

    pub fn with_default_lang(mut self, lang: Lang) -> Self {
        self.default_lang = lang;
        self
    }

    pub fn with_keyboard_layout(mut self, layout: LayoutKind) -> Self {
        self.keyboard_layout = layout;
        self
    }

    pub fn with_tab_policy(mut self, policy: TabPolicy) -> Self {
        self.tab_policy = policy;
        self
    }

    /// Link builder for the configured base and ttl.
    pub fn link_builder(&self) -> Result<LinkBuilder, BuildError> {
        Ok(LinkBuilder::new(self.base_url.as_str())?.with_ttl(self.ttl_secs))
    }
}

fn parsed<T>(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(target: "kiosk::config", var = name, value = %raw, error = %e, "ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> KioskConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        KioskConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(from_pairs(&[]), KioskConfig::default());
    }

    #[test]
    fn values_are_trimmed_and_parsed() {
        let c = from_pairs(&[
            ("KIOSK_TTL_SECS", " 600 "),
            ("KIOSK_WARN_AFTER_SECS", "30"),
            ("KIOSK_RESET_AFTER_SECS", "90"),
            ("KIOSK_CODE_SECS", "45"),
            ("KIOSK_PERSIST_DEBOUNCE_MS", "100"),
            ("KIOSK_DEFAULT_LANG", " EN "),
            ("KIOSK_KEYBOARD_LAYOUT", "en"),
            ("KIOSK_TAB_POLICY", "insert-tab"),
        ]);
        assert_eq!(c.ttl_secs, Some(600));
        assert_eq!(c.warn_after, Duration::from_secs(30));
        assert_eq!(c.reset_after, Duration::from_secs(90));
        assert_eq!(c.code_secs, 45);
        assert_eq!(c.persist_debounce, Duration::from_millis(100));
        assert_eq!(c.default_lang, Lang::En);
        assert_eq!(c.keyboard_layout, LayoutKind::En);
        assert_eq!(c.tab_policy, TabPolicy::InsertTab);
    }

    #[test]
    fn garbage_falls_back() {
        let c = from_pairs(&[
            ("KIOSK_TTL_SECS", "soon"),
            ("KIOSK_DEFAULT_LANG", "fr"),
            ("KIOSK_TAB_POLICY", "sideways"),
            ("KIOSK_BASE_URL", "https://example.test/#/scan"),
        ]);
        assert_eq!(c, KioskConfig::default());
    }

    #[test]
    fn reset_before_warn_restores_default_timings() {
        let c = from_pairs(&[
            ("KIOSK_WARN_AFTER_SECS", "100"),
            ("KIOSK_RESET_AFTER_SECS", "50"),
        ]);
        assert_eq!(c.warn_after, Duration::from_secs(60));
        assert_eq!(c.reset_after, Duration::from_secs(120));
    }

    #[test]
    fn base_url_is_normalized() {
        let c = from_pairs(&[("KIOSK_BASE_URL", "https://example.test/#/qr/")]);
        assert_eq!(c.base_url, "https://example.test/#/qr");
        assert!(c.link_builder().is_ok());
    }

    #[test]
    fn zero_code_duration_is_rejected() {
        let c = KioskConfig::default().with_code_secs(0).normalized();
        assert_eq!(c.code_secs, 180);
    }
}
