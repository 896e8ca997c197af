//! Drag and drop: library insertion and reordering of existing elements.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::decorate::{SELECTION_PROPERTIES, apply_base, remove_resize_handles};
use super::element::{
    ElementId, element_id, find_tagged, is_tagged, tagged_elements, top_level_tagged,
};
use super::layout::LayoutProvider;
use super::normalize::EMPTY_CANVAS_ATTR;
use super::{Deferred, PageBuilder};
use crate::dom::{ArenaDom, Attribute, NodeId, remove_style_properties, set_style_property};

/// Marks the single drop indicator line.
pub const DROP_INDICATOR_ATTR: &str = "data-drop-indicator";

const EXISTING_PREFIX: &str = "existing:";

/// What a drag carries, as read from the plain-text transfer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// A library element type id.
    Library(String),
    /// An image asset, sent as `{"type":"image","imageUrl":"..."}`.
    Image { image_url: String },
    /// An element already on the canvas, sent as `existing:<id>`.
    Existing(ElementId),
}

#[derive(Serialize, Deserialize)]
struct ImagePayload<'a> {
    #[serde(rename = "type")]
    kind: Cow<'a, str>,
    #[serde(rename = "imageUrl")]
    image_url: Cow<'a, str>,
}

impl DragPayload {
    pub fn encode(&self) -> String {
        match self {
            DragPayload::Library(kind) => kind.clone(),
            DragPayload::Existing(id) => format!("{EXISTING_PREFIX}{id}"),
            DragPayload::Image { image_url } => serde_json::to_string(&ImagePayload {
                kind: Cow::Borrowed("image"),
                image_url: Cow::Borrowed(image_url),
            })
            .unwrap_or_default(),
        }
    }

    /// Decode a transfer string. Anything that is not an existing-element
    /// reference or a well-formed image object is a library element type.
    pub fn decode(data: &str) -> Self {
        if let Some(id) = data.strip_prefix(EXISTING_PREFIX) {
            return DragPayload::Existing(ElementId::from(id));
        }
        if data.trim_start().starts_with('{') {
            match serde_json::from_str::<ImagePayload<'_>>(data) {
                Ok(payload) if payload.kind == "image" => {
                    return DragPayload::Image {
                        image_url: payload.image_url.into_owned(),
                    };
                }
                Ok(payload) => debug!(kind = %payload.kind, "non-image JSON payload"),
                Err(e) => debug!(error = %e, "malformed JSON payload"),
            }
        }
        DragPayload::Library(data.to_string())
    }
}

/// Effect advertised to the platform's drag feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropEffect {
    #[default]
    None,
    Copy,
    Move,
}

impl DropEffect {
    /// Value for the platform's `dropEffect` / `effectAllowed`.
    pub fn as_str(self) -> &'static str {
        match self {
            DropEffect::None => "none",
            DropEffect::Copy => "copy",
            DropEffect::Move => "move",
        }
    }
}

/// The transfer channel of one drag gesture.
#[derive(Debug, Clone, Default)]
pub struct DataTransfer {
    data: String,
    pub effect_allowed: DropEffect,
    pub drop_effect: DropEffect,
    /// Snapshot node shown under the cursor.
    pub drag_image: Option<NodeId>,
}

impl DataTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    pub fn get_data(&self) -> &str {
        &self.data
    }
}

/// Which drag is in flight. At most one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragged_element_type: Option<String>,
    pub dragged_element_id: Option<ElementId>,
}

impl DragState {
    pub fn is_reorder(&self) -> bool {
        self.dragged_element_id.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.dragged_element_type.is_none() && self.dragged_element_id.is_none()
    }
}

/// Where a dropped element goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before(NodeId),
    End,
}

/// Nearest-midpoint insertion point among the top-level tagged elements.
///
/// The element whose vertical midpoint is closest to `y` wins, first in
/// document order on ties. Above its midpoint inserts before it, otherwise
/// the drop appends.
pub fn find_insert_position<L: LayoutProvider + ?Sized>(
    dom: &ArenaDom,
    container: NodeId,
    layout: &L,
    y: f64,
) -> InsertPosition {
    let mut best: Option<(NodeId, f64, f64)> = None;
    for node in top_level_tagged(dom, container) {
        let Some(rect) = layout.bounding_rect(dom, node) else {
            continue;
        };
        let mid = rect.mid_y();
        let distance = (y - mid).abs();
        if best.is_none_or(|(_, closest, _)| distance < closest) {
            best = Some((node, distance, mid));
        }
    }
    match best {
        Some((node, _, mid)) if y < mid => InsertPosition::Before(node),
        _ => InsertPosition::End,
    }
}

fn next_tagged_sibling(dom: &ArenaDom, node: NodeId) -> Option<NodeId> {
    let mut current = dom.next_element_sibling(node);
    while let Some(sibling) = current {
        if is_tagged(dom, sibling) {
            return Some(sibling);
        }
        current = dom.next_element_sibling(sibling);
    }
    None
}

impl<L: LayoutProvider> PageBuilder<L> {
    /// Start dragging a library element type.
    pub fn handle_drag_start(&mut self, transfer: Option<&mut DataTransfer>, element_type: &str) -> bool {
        let Some(transfer) = transfer else {
            debug!("drag start without transfer");
            return false;
        };
        let title = self
            .library
            .get(element_type)
            .map(|e| e.title.clone())
            .unwrap_or_else(|| element_type.to_string());
        transfer.set_data(DragPayload::Library(element_type.to_string()).encode());
        self.begin_library_drag(transfer, element_type, &title);
        true
    }

    /// Start dragging an image asset.
    pub fn handle_image_drag_start(&mut self, transfer: Option<&mut DataTransfer>, image_url: &str) -> bool {
        let Some(transfer) = transfer else {
            debug!("image drag start without transfer");
            return false;
        };
        transfer.set_data(
            DragPayload::Image {
                image_url: image_url.to_string(),
            }
            .encode(),
        );
        self.begin_library_drag(transfer, "image", "Image");
        true
    }

    fn begin_library_drag(&mut self, transfer: &mut DataTransfer, element_type: &str, title: &str) {
        transfer.effect_allowed = DropEffect::Copy;
        self.drag = DragState {
            dragged_element_type: Some(element_type.to_string()),
            dragged_element_id: None,
        };
        transfer.drag_image = self.create_drag_image(title);
    }

    /// A rotated, translucent snapshot outside the canvas, removed on the
    /// next tick.
    fn create_drag_image(&mut self, title: &str) -> Option<NodeId> {
        let host = self.dom.parent(self.container)?;
        let style = format!(
            "position: absolute; top: -1000px; left: -1000px; padding: 8px 12px; \
             background: #ffffff; border: 2px solid {}; border-radius: 6px; \
             transform: rotate(-3deg); opacity: 0.8; pointer-events: none;",
            self.config.selection_color
        );
        let node = self.dom.create_element(
            "div",
            vec![
                Attribute::new("class", "drag-image"),
                Attribute::new("style", style),
            ],
        );
        self.dom.append_text(node, title);
        self.dom.append(host, node);
        self.deferred.push(Deferred::RemoveNode(node));
        Some(node)
    }

    /// Start dragging an element already on the canvas.
    pub fn handle_existing_element_drag_start(
        &mut self,
        transfer: Option<&mut DataTransfer>,
        id: &str,
    ) -> bool {
        let Some(transfer) = transfer else {
            debug!("reorder start without transfer");
            return false;
        };
        if id.is_empty() {
            debug!("reorder start without element id");
            return false;
        }
        let id = ElementId::from(id);
        let Some(node) = find_tagged(&self.dom, self.container, &id) else {
            debug!(%id, "reorder start for missing element");
            return false;
        };

        transfer.set_data(DragPayload::Existing(id.clone()).encode());
        transfer.effect_allowed = DropEffect::Move;
        self.annotator.set_dragging(&mut self.dom, node, true, &self.config);
        self.drag = DragState {
            dragged_element_type: None,
            dragged_element_id: Some(id),
        };
        true
    }

    /// Pointer moved over the canvas during a drag. Always accepts the drop.
    pub fn handle_drag_over(&mut self, transfer: Option<&mut DataTransfer>, y: f64) -> bool {
        if self.drag.is_reorder() && self.container.is_some() {
            let position = find_insert_position(&self.dom, self.container, &self.layout, y);
            self.show_drop_indicator(position);
            if let Some(transfer) = transfer {
                transfer.drop_effect = DropEffect::Move;
            }
        } else if let Some(transfer) = transfer {
            transfer.drop_effect = if self.drag.dragged_element_type.is_some() {
                DropEffect::Copy
            } else {
                DropEffect::Move
            };
        }
        true
    }

    fn show_drop_indicator(&mut self, position: InsertPosition) {
        self.remove_drop_indicator();
        let style = format!(
            "height: 2px; background: {}; margin: 4px 0; border-radius: 1px; pointer-events: none;",
            self.config.selection_color
        );
        let indicator = self.dom.create_element(
            "div",
            vec![
                Attribute::new("class", "drop-indicator"),
                Attribute::new(DROP_INDICATOR_ATTR, "true"),
                Attribute::new("style", style),
            ],
        );
        match position {
            InsertPosition::Before(target) => self.dom.insert_before(target, indicator),
            InsertPosition::End => self.dom.append(self.container, indicator),
        }
    }

    pub(crate) fn remove_drop_indicator(&mut self) {
        if self.container.is_none() {
            return;
        }
        let indicators: Vec<_> = self
            .dom
            .descendants(self.container)
            .into_iter()
            .filter(|&n| self.dom.attr(n, DROP_INDICATOR_ATTR).is_some())
            .collect();
        for indicator in indicators {
            self.dom.detach(indicator);
        }
    }

    /// Drop a payload at pointer height `y`.
    pub fn handle_drop(&mut self, payload: &str, y: f64) -> bool {
        self.remove_drop_indicator();
        self.run_deferred();

        let done = match DragPayload::decode(payload) {
            DragPayload::Existing(id) => self.reorder(&id, y),
            DragPayload::Image { image_url } => self.create_image(&image_url).is_some(),
            DragPayload::Library(element_type) => self.create_library_element(&element_type).is_some(),
        };
        self.drag = DragState::default();
        done
    }

    /// Finish any drag, dropped or cancelled, and restore canvas styling.
    pub fn handle_drag_end(&mut self) {
        self.remove_drop_indicator();
        self.run_deferred();
        if self.container.is_some() {
            for node in tagged_elements(&self.dom, self.container) {
                let imported = element_id(&self.dom, node).is_some_and(|id| id.is_imported());
                apply_base(&mut self.dom, node, imported, &self.config);
            }
        }
        self.annotator.clear_dragging();
        self.drag = DragState::default();
    }

    fn reorder(&mut self, id: &ElementId, y: f64) -> bool {
        let Some(node) = find_tagged(&self.dom, self.container, id) else {
            warn!(%id, "reorder target not found");
            return false;
        };

        let position = find_insert_position(&self.dom, self.container, &self.layout, y);
        let unchanged = match position {
            InsertPosition::Before(target) => {
                target == node || Some(target) == next_tagged_sibling(&self.dom, node)
            }
            InsertPosition::End => {
                self.dom.parent(node) == Some(self.container)
                    && next_tagged_sibling(&self.dom, node).is_none()
            }
        };
        if unchanged {
            debug!(%id, "drop at current position");
            self.annotator.set_dragging(&mut self.dom, node, false, &self.config);
            return true;
        }

        remove_style_properties(&mut self.dom, node, SELECTION_PROPERTIES);
        remove_resize_handles(&mut self.dom, node);
        set_style_property(&mut self.dom, node, "opacity", "1");
        self.annotator.strip(id);

        self.dom.detach(node);
        match position {
            InsertPosition::Before(target) => self.dom.insert_before(target, node),
            InsertPosition::End => self.dom.append(self.container, node),
        }
        apply_base(&mut self.dom, node, id.is_imported(), &self.config);
        debug!(%id, "element reordered");

        self.commit(Some(id.clone()));
        true
    }

    /// Put a new element on the canvas, replacing the empty-canvas block.
    pub(crate) fn place_new_element(&mut self, node: NodeId) {
        let placeholders: Vec<_> = self
            .dom
            .element_children(self.container)
            .filter(|&n| self.dom.attr(n, EMPTY_CANVAS_ATTR).is_some())
            .collect();
        for placeholder in placeholders {
            self.dom.detach(placeholder);
        }
        self.dom.append(self.container, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::layout::StackedLayout;
    use crate::dom::parse_fragment;

    #[test]
    fn test_payload_wire_format() {
        let image = DragPayload::Image {
            image_url: "data:image/png;base64,AAA=".into(),
        };
        assert_eq!(
            image.encode(),
            r#"{"type":"image","imageUrl":"data:image/png;base64,AAA="}"#
        );
        assert_eq!(DragPayload::decode(&image.encode()), image);
        assert_eq!(
            DragPayload::Existing("x-1".into()).encode(),
            "existing:x-1"
        );
        assert_eq!(
            DragPayload::decode("existing:x-1"),
            DragPayload::Existing("x-1".into())
        );
    }

    #[test]
    fn test_payload_fallbacks() {
        assert_eq!(
            DragPayload::decode("paragraph"),
            DragPayload::Library("paragraph".into())
        );
        assert_eq!(
            DragPayload::decode("{broken"),
            DragPayload::Library("{broken".into())
        );
        assert_eq!(
            DragPayload::decode(r#"{"type":"video","imageUrl":"a"}"#),
            DragPayload::Library(r#"{"type":"video","imageUrl":"a"}"#.into())
        );
    }

    #[test]
    fn test_find_insert_position() {
        let f = parse_fragment(
            r#"<p data-element-id="a">A</p><p data-element-id="b">B</p><p data-element-id="c">C</p>"#,
        );
        let layout = StackedLayout::default();
        let nodes = top_level_tagged(&f.dom, f.container);
        // Rows: a 0..40 (mid 20), b 40..80 (mid 60), c 80..120 (mid 100).
        assert_eq!(
            find_insert_position(&f.dom, f.container, &layout, 5.0),
            InsertPosition::Before(nodes[0])
        );
        assert_eq!(
            find_insert_position(&f.dom, f.container, &layout, 55.0),
            InsertPosition::Before(nodes[1])
        );
        assert_eq!(
            find_insert_position(&f.dom, f.container, &layout, 65.0),
            InsertPosition::End
        );
        // Equidistant from a and b: a wins.
        assert_eq!(
            find_insert_position(&f.dom, f.container, &layout, 40.0),
            InsertPosition::End
        );
    }

    #[test]
    fn test_empty_canvas_appends() {
        let f = parse_fragment("");
        assert_eq!(
            find_insert_position(&f.dom, f.container, &StackedLayout::default(), 10.0),
            InsertPosition::End
        );
    }
}
