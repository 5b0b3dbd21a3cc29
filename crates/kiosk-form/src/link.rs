#![forbid(unsafe_code)]

//! Destination link construction and decoding.
//!
//! A link carries everything the mobile page needs as path segments after a
//! literal `qr` marker:
//!
//! ```text
//! <base>/#/qr/<lang>/<depositor>/<visitor_id>/<prisoner>/<zone>/<token>[?ttl=<secs>]
//! ```
//!
//! Every segment is percent-encoded on its own, so a value containing `/`
//! or `#` cannot shift the segments after it. Empty values become `-`.
//! A raw segment starting with a literal `-` is otherwise reserved: values
//! made only of dots travel as `-` plus the dots, since URL parsers drop
//! `.` and `..` segments (percent-encoded or not), and any other value's
//! leading `-` is sent as `%2D`.
//! The freshness token is a millisecond timestamp forced strictly upward by
//! [`FreshnessTokens`], so two links built from the same input always differ.

use std::fmt;

use kiosk_core::locale::Lang;
use tracing::debug;
use url::Url;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::fields::{FieldId, FieldValues};

/// Destination page used when no base is configured.
pub const DEFAULT_BASE_URL: &str = "https://kiosk-mobile.vercel.app/#/qr";
/// Literal segment that precedes the payload.
pub const MARKER: &str = "qr";
/// Segment standing in for an empty field.
pub const PLACEHOLDER: &str = "-";
/// Segments after the marker: language, four fields, token.
pub const SEGMENT_COUNT: usize = 1 + FieldId::ALL.len() + 1;

/// Why a link could not be built or decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The base (or a built link) is not a valid absolute URL.
    InvalidBase(String),
    /// No `qr` marker segment where one is required.
    MissingMarker,
    /// Wrong number of segments after the marker.
    SegmentCount { expected: usize, found: usize },
    /// A segment could not be decoded.
    Malformed(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase(reason) => write!(f, "invalid base url: {reason}"),
            Self::MissingMarker => write!(f, "link has no '{MARKER}' marker segment"),
            Self::SegmentCount { expected, found } => write!(
                f,
                "link has {found} segments after the marker, expected {expected}"
            ),
            Self::Malformed(reason) => write!(f, "malformed link segment: {reason}"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Decoded contents of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts {
    pub lang: Lang,
    /// Field values; placeholders decode to empty strings.
    pub values: FieldValues,
    pub token: u64,
    pub ttl_secs: Option<u64>,
}

/// Builds links against a validated base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base: String,
    ttl_secs: Option<u64>,
}

impl LinkBuilder {
    /// Validate `base`: it must parse as an absolute URL and its route (the
    /// fragment for hash-routed pages, the path otherwise) must end in the
    /// marker segment.
    pub fn new(base: impl Into<String>) -> Result<Self, BuildError> {
        let base = base.into().trim().trim_end_matches('/').to_owned();
        let url = Url::parse(&base).map_err(|e| BuildError::InvalidBase(e.to_string()))?;
        let (route, _) = route_of(&url);
        if route.split('/').rfind(|s| !s.is_empty()) != Some(MARKER) {
            return Err(BuildError::MissingMarker);
        }
        Ok(Self {
            base,
            ttl_secs: None,
        })
    }

    /// Append `?ttl=<secs>` to every link.
    pub fn with_ttl(mut self, ttl_secs: Option<u64>) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn ttl_secs(&self) -> Option<u64> {
        self.ttl_secs
    }

    /// Build the link for `values` in `lang`, then decode it again and
    /// check the segment count.
    pub fn build(
        &self,
        values: &FieldValues,
        lang: Lang,
        token: u64,
    ) -> Result<String, BuildError> {
        let mut link = self.base.clone();
        push_segment(&mut link, lang.code());
        for value in values.ordered() {
            push_segment(&mut link, value);
        }
        link.push('/');
        link.push_str(&token.to_string());
        if let Some(ttl) = self.ttl_secs {
            link.push_str("?ttl=");
            link.push_str(&ttl.to_string());
        }

        let parts = decode(&link)?;
        if parts.token != token || parts.lang != lang {
            return Err(BuildError::Malformed(link));
        }
        debug!(
            target: "kiosk::link",
            lang = lang.code(),
            token,
            len = link.len(),
            "link built"
        );
        Ok(link)
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_URL.to_owned(),
            ttl_secs: None,
        }
    }
}

fn push_segment(link: &mut String, value: &str) {
    link.push('/');
    if value.is_empty() {
        link.push_str(PLACEHOLDER);
    } else if value.chars().all(|c| c == '.') {
        link.push_str(PLACEHOLDER);
        link.push_str(value);
    } else {
        let encoded = urlencoding::encode(value);
        match encoded.strip_prefix('-') {
            Some(rest) => {
                link.push_str("%2D");
                link.push_str(rest);
            }
            None => link.push_str(&encoded),
        }
    }
}

fn decode_segment(raw: &str) -> Result<String, BuildError> {
    if raw == PLACEHOLDER {
        return Ok(String::new());
    }
    if let Some(dots) = raw.strip_prefix(PLACEHOLDER) {
        if !dots.is_empty() && dots.chars().all(|c| c == '.') {
            return Ok(dots.to_owned());
        }
    }
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .map_err(|e| BuildError::Malformed(e.to_string()))
}

/// Route string and its query. Hash-routed pages keep both inside the
/// fragment.
fn route_of(url: &Url) -> (&str, Option<&str>) {
    match url.fragment() {
        Some(fragment) if fragment.split(['/', '?']).any(|s| s == MARKER) => {
            match fragment.split_once('?') {
                Some((route, query)) => (route, Some(query)),
                None => (fragment, None),
            }
        }
        _ => (url.path(), url.query()),
    }
}

/// Recover the language, field values, token and ttl from a link.
pub fn decode(link: &str) -> Result<LinkParts, BuildError> {
    let url = Url::parse(link).map_err(|e| BuildError::InvalidBase(e.to_string()))?;
    let (route, query) = route_of(&url);

    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    let first = segments
        .iter()
        .position(|s| *s == MARKER)
        .ok_or(BuildError::MissingMarker)?;
    // The base route may itself contain `qr` before the real marker.
    let marker = match segments.len().checked_sub(SEGMENT_COUNT + 1) {
        Some(at) if segments[at] == MARKER => at,
        _ => first,
    };
    let payload = &segments[marker + 1..];
    if payload.len() != SEGMENT_COUNT {
        return Err(BuildError::SegmentCount {
            expected: SEGMENT_COUNT,
            found: payload.len(),
        });
    }

    let lang = Lang::parse(payload[0])
        .ok_or_else(|| BuildError::Malformed(format!("language {:?}", payload[0])))?;
    let mut decoded: [String; 4] = Default::default();
    for (slot, raw) in decoded.iter_mut().zip(&payload[1..5]) {
        *slot = decode_segment(raw)?;
    }
    let [depositor, visitor_id, prisoner, zone] = decoded;
    let token = payload[5]
        .parse::<u64>()
        .map_err(|_| BuildError::Malformed(format!("token {:?}", payload[5])))?;

    let ttl_secs = match query {
        Some(query) => url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "ttl")
            .map(|(_, v)| {
                v.parse::<u64>()
                    .map_err(|_| BuildError::Malformed(format!("ttl {v:?}")))
            })
            .transpose()?,
        None => None,
    };

    Ok(LinkParts {
        lang,
        values: FieldValues {
            depositor,
            visitor_id,
            prisoner,
            zone,
        },
        token,
        ttl_secs,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Freshness tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Source of wall-clock milliseconds.
pub trait FreshnessSource {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMillis;

impl FreshnessSource for SystemMillis {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

impl<F: Fn() -> u64> FreshnessSource for F {
    fn now_ms(&self) -> u64 {
        self()
    }
}

/// Strictly increasing tokens: `max(now, last + 1)`.
#[derive(Debug, Clone, Default)]
pub struct FreshnessTokens<S> {
    source: S,
    last: Option<u64>,
}

impl<S: FreshnessSource> FreshnessTokens<S> {
    pub fn new(source: S) -> Self {
        Self { source, last: None }
    }

    pub fn next_token(&mut self) -> u64 {
        let now = self.source.now_ms();
        let token = match self.last {
            Some(last) => now.max(last.saturating_add(1)),
            None => now,
        };
        self.last = Some(token);
        token
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(depositor: &str, visitor_id: &str, prisoner: &str, zone: &str) -> FieldValues {
        FieldValues {
            depositor: depositor.into(),
            visitor_id: visitor_id.into(),
            prisoner: prisoner.into(),
            zone: zone.into(),
        }
    }

    #[test]
    fn default_base_layout() {
        let link = LinkBuilder::default()
            .build(&values("Somchai Jaidee", "AB/12", "Anan", ""), Lang::Th, 1700000000000)
            .unwrap();
        assert_eq!(
            link,
            "https://kiosk-mobile.vercel.app/#/qr/th/Somchai%20Jaidee/AB%2F12/Anan/-/1700000000000"
        );
    }

    #[test]
    fn thai_text_is_percent_encoded() {
        let link = LinkBuilder::default()
            .build(&values("สมชาย", "1", "อนันต์", "3"), Lang::En, 5)
            .unwrap();
        assert!(link.is_ascii());
        let parts = decode(&link).unwrap();
        assert_eq!(parts.values.depositor, "สมชาย");
        assert_eq!(parts.values.prisoner, "อนันต์");
        assert_eq!(parts.lang, Lang::En);
    }

    #[test]
    fn literal_dash_is_not_the_placeholder() {
        let link = LinkBuilder::default()
            .build(&values("-", "b", "c", ""), Lang::Th, 1)
            .unwrap();
        assert!(link.contains("/qr/th/%2D/b/c/-/1"));
        let parts = decode(&link).unwrap();
        assert_eq!(parts.values.depositor, "-");
        assert_eq!(parts.values.zone, "");
    }

    #[test]
    fn leading_dash_is_escaped() {
        let link = LinkBuilder::default()
            .build(&values("-..", "-x", "c", "d"), Lang::En, 1)
            .unwrap();
        assert!(link.contains("/qr/en/%2D../%2Dx/c/d/1"));
        let parts = decode(&link).unwrap();
        assert_eq!(parts.values.depositor, "-..");
        assert_eq!(parts.values.visitor_id, "-x");
    }

    #[test]
    fn dot_only_values_survive_a_path_route() {
        let builder = LinkBuilder::new("https://example.test/app/qr").unwrap();
        let link = builder
            .build(&values("..", "AB12", "...", "."), Lang::Th, 7)
            .unwrap();
        assert_eq!(link, "https://example.test/app/qr/th/-../AB12/-.../-./7");
        let parts = decode(&link).unwrap();
        assert_eq!(parts.values, values("..", "AB12", "...", "."));
        assert_eq!(parts.token, 7);

        let hashed = LinkBuilder::default()
            .build(&values(".", "..", "c", ""), Lang::Zh, 8)
            .unwrap();
        assert_eq!(decode(&hashed).unwrap().values, values(".", "..", "c", ""));
    }

    #[test]
    fn base_route_may_repeat_the_marker() {
        let builder = LinkBuilder::new("https://example.test/qr/x/qr").unwrap();
        let link = builder
            .build(&values("a", "b", "c", "qr"), Lang::Th, 3)
            .unwrap();
        assert_eq!(link, "https://example.test/qr/x/qr/th/a/b/c/qr/3");
        assert_eq!(decode(&link).unwrap().values.zone, "qr");

        let hashed = LinkBuilder::new("https://example.test/#/qr/kiosk/qr").unwrap();
        let link = hashed.build(&values("a", "b", "c", ""), Lang::En, 4).unwrap();
        assert_eq!(decode(&link).unwrap().token, 4);
    }

    #[test]
    fn ttl_is_appended_and_decoded() {
        let builder = LinkBuilder::default().with_ttl(Some(600));
        let link = builder.build(&values("a", "b", "c", "d"), Lang::Zh, 9).unwrap();
        assert!(link.ends_with("/9?ttl=600"));
        let parts = decode(&link).unwrap();
        assert_eq!(parts.ttl_secs, Some(600));
        assert_eq!(parts.token, 9);
    }

    #[test]
    fn path_routed_base() {
        let builder = LinkBuilder::new("https://example.test/app/qr/").unwrap();
        let link = builder
            .with_ttl(Some(30))
            .build(&values("a", "b", "c", ""), Lang::Th, 1)
            .unwrap();
        assert_eq!(link, "https://example.test/app/qr/th/a/b/c/-/1?ttl=30");
        assert_eq!(decode(&link).unwrap().ttl_secs, Some(30));
    }

    #[test]
    fn invalid_bases_are_rejected() {
        assert!(matches!(
            LinkBuilder::new("not a url"),
            Err(BuildError::InvalidBase(_))
        ));
        assert_eq!(
            LinkBuilder::new("https://example.test/#/scan"),
            Err(BuildError::MissingMarker)
        );
    }

    #[test]
    fn decode_rejects_wrong_shapes() {
        assert_eq!(
            decode("https://x.test/#/qr/th/a/b/c/1"),
            Err(BuildError::SegmentCount {
                expected: SEGMENT_COUNT,
                found: 5
            })
        );
        assert_eq!(
            decode("https://x.test/#/scan/th/a/b/c/d/1"),
            Err(BuildError::MissingMarker)
        );
        assert!(matches!(
            decode("https://x.test/#/qr/xx/a/b/c/d/1"),
            Err(BuildError::Malformed(_))
        ));
        assert!(matches!(
            decode("https://x.test/#/qr/th/a/b/c/d/now"),
            Err(BuildError::Malformed(_))
        ));
    }

    #[test]
    fn tokens_strictly_increase_on_a_frozen_clock() {
        let mut tokens = FreshnessTokens::new(|| 1_000u64);
        assert_eq!(tokens.next_token(), 1_000);
        assert_eq!(tokens.next_token(), 1_001);
        assert_eq!(tokens.next_token(), 1_002);
    }

    #[test]
    fn tokens_follow_the_clock_when_it_moves_ahead() {
        use std::cell::Cell;
        let now = Cell::new(10u64);
        let mut tokens = FreshnessTokens::new(|| now.get());
        assert_eq!(tokens.next_token(), 10);
        now.set(500);
        assert_eq!(tokens.next_token(), 500);
        now.set(400);
        assert_eq!(tokens.next_token(), 501);
    }

    #[test]
    fn same_input_different_token_different_link() {
        let builder = LinkBuilder::default();
        let mut tokens = FreshnessTokens::new(|| 42u64);
        let v = values("a", "b", "c", "");
        let first = builder.build(&v, Lang::Th, tokens.next_token()).unwrap();
        let second = builder.build(&v, Lang::Th, tokens.next_token()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn system_millis_is_after_2020() {
        assert!(SystemMillis.now_ms() > 1_577_836_800_000);
    }
}
