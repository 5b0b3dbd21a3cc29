#![forbid(unsafe_code)]

//! Key grids for the Latin and Thai layouts.
//!
//! Both grids have five rows: digits with Backspace, a Tab row, a Caps row
//! with Enter, the Shift row, and a bottom row with the layout toggle, Clear
//! and Space. Widths are relative to a plain character key and stored in
//! tenths so the tables stay `const`.

use std::fmt;
use std::str::FromStr;

/// Which Shift key on the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftSide {
    Left,
    Right,
}

/// What a key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Inserts a glyph. `shift` is the alternate glyph, if any.
    Char { normal: char, shift: Option<char> },
    Backspace,
    Tab,
    Caps,
    Enter,
    Shift(ShiftSide),
    Space,
    Clear,
    LayoutToggle,
}

/// A key in a layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyDef {
    pub kind: KeyKind,
    /// Relative width in tenths of a character key.
    pub width_tenths: u8,
}

impl KeyDef {
    const fn new(kind: KeyKind, width_tenths: u8) -> Self {
        Self { kind, width_tenths }
    }

    /// Relative width (1.0 = one character key).
    pub fn width(&self) -> f32 {
        f32::from(self.width_tenths) / 10.0
    }
}

/// Position of a key in the current grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyRef {
    pub row: usize,
    pub col: usize,
}

impl KeyRef {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Keyboard layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutKind {
    En,
    #[default]
    Th,
}

impl LayoutKind {
    /// Rows of the grid.
    pub fn rows(self) -> &'static [&'static [KeyDef]] {
        match self {
            Self::En => EN_ROWS,
            Self::Th => TH_ROWS,
        }
    }

    /// Look up a key by position.
    pub fn key(self, at: KeyRef) -> Option<&'static KeyDef> {
        self.rows().get(at.row)?.get(at.col)
    }

    /// The other layout.
    pub const fn toggled(self) -> Self {
        match self {
            Self::En => Self::Th,
            Self::Th => Self::En,
        }
    }

    /// Short uppercase name shown on toggle buttons.
    pub const fn name(self) -> &'static str {
        match self {
            Self::En => "EN",
            Self::Th => "TH",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "th" => Ok(Self::Th),
            other => Err(format!("unknown keyboard layout: {other:?}")),
        }
    }
}

const fn ch(normal: char) -> KeyDef {
    KeyDef::new(
        KeyKind::Char {
            normal,
            shift: None,
        },
        10,
    )
}

const fn sh(normal: char, shift: char) -> KeyDef {
    KeyDef::new(
        KeyKind::Char {
            normal,
            shift: Some(shift),
        },
        10,
    )
}

const BACKSPACE: KeyDef = KeyDef::new(KeyKind::Backspace, 22);
const TAB: KeyDef = KeyDef::new(KeyKind::Tab, 18);
const CAPS: KeyDef = KeyDef::new(KeyKind::Caps, 22);
const ENTER: KeyDef = KeyDef::new(KeyKind::Enter, 24);
const SHIFT_L: KeyDef = KeyDef::new(KeyKind::Shift(ShiftSide::Left), 28);
const SHIFT_R: KeyDef = KeyDef::new(KeyKind::Shift(ShiftSide::Right), 28);
const BOTTOM: [KeyDef; 3] = [
    KeyDef::new(KeyKind::LayoutToggle, 18),
    KeyDef::new(KeyKind::Clear, 18),
    KeyDef::new(KeyKind::Space, 85),
];

static EN_ROWS: &[&[KeyDef]] = &[
    &[
        sh('`', '~'),
        sh('1', '!'),
        sh('2', '@'),
        sh('3', '#'),
        sh('4', '$'),
        sh('5', '%'),
        sh('6', '^'),
        sh('7', '&'),
        sh('8', '*'),
        sh('9', '('),
        sh('0', ')'),
        sh('-', '_'),
        sh('=', '+'),
        BACKSPACE,
    ],
    &[
        TAB,
        ch('q'),
        ch('w'),
        ch('e'),
        ch('r'),
        ch('t'),
        ch('y'),
        ch('u'),
        ch('i'),
        ch('o'),
        ch('p'),
        sh('[', '{'),
        sh(']', '}'),
        sh('\\', '|'),
    ],
    &[
        CAPS,
        ch('a'),
        ch('s'),
        ch('d'),
        ch('f'),
        ch('g'),
        ch('h'),
        ch('j'),
        ch('k'),
        ch('l'),
        sh(';', ':'),
        sh('\'', '"'),
        ENTER,
    ],
    &[
        SHIFT_L,
        ch('z'),
        ch('x'),
        ch('c'),
        ch('v'),
        ch('b'),
        ch('n'),
        ch('m'),
        sh(',', '<'),
        sh('.', '>'),
        sh('/', '?'),
        SHIFT_R,
    ],
    &BOTTOM,
];

static TH_ROWS: &[&[KeyDef]] = &[
    &[
        sh('_', '%'),
        sh('1', '+'),
        sh('2', '๒'),
        sh('3', '๓'),
        sh('4', '๔'),
        sh('5', 'ู'),
        sh('6', '฿'),
        sh('7', '๗'),
        sh('8', '๘'),
        sh('9', '๙'),
        sh('0', '๐'),
        sh('-', 'ฦ'),
        sh('=', '฿'),
        BACKSPACE,
    ],
    &[
        TAB,
        sh('ๆ', '๐'),
        sh('ไ', '๑'),
        sh('ำ', '๒'),
        sh('พ', '๓'),
        sh('ะ', '๔'),
        sh('ั', '๕'),
        sh('ี', '๖'),
        sh('ร', '๗'),
        sh('น', '๘'),
        sh('ย', '๙'),
        sh('บ', '?'),
        sh('ล', 'ฃ'),
        sh('ฃ', '|'),
    ],
    &[
        CAPS,
        sh('ฟ', 'ฤ'),
        sh('ห', 'ฆ'),
        sh('ก', 'ฏ'),
        sh('ด', 'โ'),
        sh('เ', 'ฌ'),
        sh('้', '็'),
        sh('่', '๋'),
        sh('า', 'ษ'),
        sh('ส', 'ศ'),
        sh('ว', 'ซ'),
        sh('ง', '.'),
        ENTER,
    ],
    &[
        SHIFT_L,
        sh('ผ', '('),
        sh('ป', ')'),
        sh('แ', 'ฉ'),
        sh('อ', 'ฮ'),
        sh('ิ', 'ฺ'),
        sh('ื', '์'),
        sh('ท', ','),
        sh('ม', 'ฒ'),
        sh('ใ', 'ฑ'),
        sh('ฝ', 'ฦ'),
        SHIFT_R,
    ],
    &BOTTOM,
];
