#![forbid(unsafe_code)]

//! Rectangles for hit-testing and the viewport model used to size the code.

/// A rectangle in cell (or pixel) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: u16,
    /// Top edge.
    pub y: u16,
    /// Width.
    pub width: u16,
    /// Height.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Check if a point is inside the rectangle.
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Smallest edge length of the displayed code, in pixels.
pub const MIN_CODE_PX: u32 = 160;
/// Largest edge length of the displayed code, in pixels.
pub const MAX_CODE_PX: u32 = 480;
/// Landscape viewports shorter than this switch to the compact density.
pub const COMPACT_HEIGHT_PX: u32 = 600;

/// Orientation of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Layout density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Regular,
    Compact,
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1080, 1920)
    }
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square viewports count as portrait.
    pub const fn orientation(&self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Edge length for the displayed code: 60% of the short side, clamped.
    pub fn code_size(&self) -> u32 {
        let short = u64::from(self.width.min(self.height));
        let size = u32::try_from(short * 3 / 5).unwrap_or(MAX_CODE_PX);
        size.clamp(MIN_CODE_PX, MAX_CODE_PX)
    }

    pub fn density(&self) -> Density {
        if self.orientation() == Orientation::Landscape && self.height < COMPACT_HEIGHT_PX {
            Density::Compact
        } else {
            Density::Regular
        }
    }
}
