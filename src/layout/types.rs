//! Core layout types

use serde::Serialize;

/// Intrinsic page size in document units (points for PDF)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, serde::Deserialize)]
pub struct PageMeta {
    pub width: f64,
    pub height: f64,
}

impl PageMeta {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if both dimensions are finite and strictly positive
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Scroll container state as reported by the host
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_offset: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64, scroll_offset: f64) -> Self {
        Self {
            width,
            height,
            scroll_offset,
        }
    }

    /// Bottom edge of the viewport in content coordinates
    #[must_use]
    pub fn end(&self) -> f64 {
        self.scroll_offset + self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        // Initial width matches a typical desktop viewer column until the
        // first resize arrives.
        Self::new(960.0, 800.0, 0.0)
    }
}

/// Vertical region reserved for one page
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SlotExtent {
    pub index: usize,
    pub start: f64,
    pub size: f64,
}

impl SlotExtent {
    #[must_use]
    pub fn end(&self) -> f64 {
        self.start + self.size
    }
}

/// The set of slots that should currently be rendered
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisibleWindow {
    /// First rendered index (includes overscan)
    pub first_index: usize,
    /// Last rendered index (includes overscan)
    pub last_index: usize,
    /// First slot intersecting the viewport
    pub first_visible: usize,
    /// Last slot intersecting the viewport
    pub last_visible: usize,
    /// Rendered slots, contiguous and ordered by index
    pub items: Vec<SlotExtent>,
    /// Total scrollable extent of all slots
    pub total_size: f64,
}

impl VisibleWindow {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        !self.items.is_empty() && (self.first_index..=self.last_index).contains(&index)
    }

    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|item| item.index).collect()
    }
}

/// Where the target slot should land inside the viewport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Start,
    Center,
}

/// A scroll position the container is asked to move to
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScrollRequest {
    pub index: usize,
    pub offset: f64,
    pub align: Align,
}
