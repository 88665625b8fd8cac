//! Seam to the external page renderer

use serde::Serialize;

/// What the renderer needs to paint one slot
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RenderTarget {
    /// Page index (0-based)
    pub index: usize,
    /// Absolute slot position in the scroll content
    pub start: f64,
    /// Current slot extent, estimated or measured
    pub slot_size: f64,
    /// Width to paint the page at
    pub target_width: f64,
    /// True once the slot size comes from a measurement
    pub measured: bool,
}

/// Paints pages. Actual heights are reported back through
/// [`crate::viewer::Viewer::on_measured`] once known.
pub trait PageRenderer {
    type Output;

    fn render_page(&mut self, target: &RenderTarget) -> Self::Output;
}
