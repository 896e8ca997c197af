//! Element geometry supplied by the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::element::{ElementId, element_id, is_tagged};
use crate::book::BookSettings;
use crate::dom::{ArenaDom, NodeId};

/// A bounding box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Source of bounding rectangles for nodes on the canvas.
pub trait LayoutProvider {
    fn bounding_rect(&self, dom: &ArenaDom, node: NodeId) -> Option<Rect>;
}

impl<F> LayoutProvider for F
where
    F: Fn(&ArenaDom, NodeId) -> Option<Rect>,
{
    fn bounding_rect(&self, dom: &ArenaDom, node: NodeId) -> Option<Rect> {
        self(dom, node)
    }
}

/// Headless layout: each tagged child of the container occupies one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackedLayout {
    pub origin_y: f64,
    pub row_height: f64,
    pub gap: f64,
    pub width: f64,
}

impl Default for StackedLayout {
    fn default() -> Self {
        Self {
            origin_y: 0.0,
            row_height: 40.0,
            gap: 0.0,
            width: 600.0,
        }
    }
}

impl StackedLayout {
    /// Start rows below the book's top margin.
    pub fn from_settings(settings: &BookSettings) -> Self {
        Self {
            origin_y: settings.margins.top_px(),
            ..Self::default()
        }
    }
}

impl LayoutProvider for StackedLayout {
    fn bounding_rect(&self, dom: &ArenaDom, node: NodeId) -> Option<Rect> {
        let parent = dom.parent(node)?;
        let row = dom
            .element_children(parent)
            .filter(|&c| is_tagged(dom, c))
            .position(|c| c == node)?;
        let y = self.origin_y + row as f64 * (self.row_height + self.gap);
        Some(Rect::new(0.0, y, self.width, self.row_height))
    }
}

/// Rectangles pushed by a host that does real layout, keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct RectTable {
    rects: HashMap<ElementId, Rect>,
}

impl RectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: ElementId, rect: Rect) {
        self.rects.insert(id, rect);
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl LayoutProvider for RectTable {
    fn bounding_rect(&self, dom: &ArenaDom, node: NodeId) -> Option<Rect> {
        element_id(dom, node).and_then(|id| self.rects.get(&id).copied())
    }
}
