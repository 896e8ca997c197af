//! Corner-handle image resizing.
//!
//! A session starts on pointer-down over a handle, follows every pointer
//! move, and ends on pointer-up. Only one session exists at a time.

use super::element::ElementId;
use crate::config::BuilderConfig;
use crate::dom::{ArenaDom, InlineStyle, NodeId};
use crate::util::{decode_data_url, extract_image_dimensions};

/// Which corner handle is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nw" => Some(Corner::NorthWest),
            "ne" => Some(Corner::NorthEast),
            "sw" => Some(Corner::SouthWest),
            "se" => Some(Corner::SouthEast),
            _ => None,
        }
    }

    /// Sign applied to the pointer delta on each axis.
    fn signs(self) -> (f64, f64) {
        match self {
            Corner::SouthEast => (1.0, 1.0),
            Corner::SouthWest => (-1.0, 1.0),
            Corner::NorthEast => (1.0, -1.0),
            Corner::NorthWest => (-1.0, -1.0),
        }
    }
}

/// An in-flight resize.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    pub element: ElementId,
    pub image: NodeId,
    pub corner: Corner,
    start_x: f64,
    start_y: f64,
    start_width: f64,
    start_height: f64,
}

impl ResizeSession {
    pub fn begin(
        dom: &ArenaDom,
        element: ElementId,
        image: NodeId,
        corner: Corner,
        x: f64,
        y: f64,
        config: &BuilderConfig,
    ) -> Self {
        let (start_width, start_height) = current_size(dom, image, config);
        Self {
            element,
            image,
            corner,
            start_x: x,
            start_y: y,
            start_width,
            start_height,
        }
    }

    /// Size for a pointer at `(x, y)`, clamped to the minimum.
    pub fn size_at(&self, x: f64, y: f64, min: f64) -> (f64, f64) {
        let (sx, sy) = self.corner.signs();
        let width = (self.start_width + sx * (x - self.start_x)).max(min);
        let height = (self.start_height + sy * (y - self.start_y)).max(min);
        (width.round(), height.round())
    }

    /// Apply the size for a pointer position to the live image.
    pub fn update(&self, dom: &mut ArenaDom, x: f64, y: f64, min: f64) -> (f64, f64) {
        let (width, height) = self.size_at(x, y, min);
        let mut style = InlineStyle::of(dom, self.image);
        style.set("width", format!("{width}px"));
        style.set("height", format!("{height}px"));
        style.write_to(dom, self.image);
        (width, height)
    }
}

/// Current rendered size of an image.
///
/// Inline style wins, then `width`/`height` attributes, then the intrinsic
/// size of a data URL, then the configured default.
pub fn current_size(dom: &ArenaDom, image: NodeId, config: &BuilderConfig) -> (f64, f64) {
    let style = InlineStyle::of(dom, image);
    let from_style = |prop: &str| style.get(prop).and_then(parse_px);
    let from_attr = |name: &str| dom.attr(image, name).and_then(parse_px);

    let mut width = from_style("width").or_else(|| from_attr("width"));
    let mut height = from_style("height").or_else(|| from_attr("height"));

    if (width.is_none() || height.is_none())
        && let Some((w, h)) = dom
            .attr(image, "src")
            .and_then(decode_data_url)
            .and_then(|bytes| extract_image_dimensions(&bytes))
    {
        width = width.or(Some(w as f64));
        height = height.or(Some(h as f64));
    }

    (
        width.unwrap_or(config.default_image_width),
        height.unwrap_or(config.default_image_height),
    )
}

/// Parse `120`, `120px` or `120.5px`. Percentages and other units yield `None`.
fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v).trim();
    v.parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}
