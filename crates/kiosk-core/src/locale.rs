#![forbid(unsafe_code)]

//! Display languages.

use std::fmt;
use std::str::FromStr;

/// Language of the kiosk screen and of the destination page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lang {
    /// Thai.
    #[default]
    Th,
    /// English.
    En,
    /// Chinese.
    Zh,
}

impl Lang {
    /// Every supported language, in selector order.
    pub const ALL: [Lang; 3] = [Lang::Th, Lang::En, Lang::Zh];

    /// Lowercase code used in URLs and snapshots.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Th => "th",
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Parse a code, tolerating case and surrounding whitespace.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a language code is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLang(pub String);

impl fmt::Display for UnknownLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language code: {:?}", self.0)
    }
}

impl std::error::Error for UnknownLang {}

impl FromStr for Lang {
    type Err = UnknownLang;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownLang(s.to_string()))
    }
}
