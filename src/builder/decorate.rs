//! Visual decoration of tagged elements.
//!
//! Decorations are written to inline style as a function of
//! `(element, decoration)`. Which decorations an element currently carries is
//! recorded in a side table keyed by element id; inline style is never read
//! back to decide that.

use std::collections::HashMap;

use tracing::trace;

use super::element::{ElementId, ElementKind, element_id, tagged_elements};
use crate::config::BuilderConfig;
use crate::dom::{ArenaDom, Attribute, InlineStyle, NodeId, parse_color};

/// Marks a resize handle node; the value is the corner.
pub const RESIZE_HANDLE_ATTR: &str = "data-resize-handle";

/// Properties owned by the selection and hover layers.
pub const SELECTION_PROPERTIES: &[&str] = &["outline", "outline-offset", "box-shadow"];

/// Decorations currently applied to one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecorationState {
    pub selected: bool,
    pub hovered: bool,
    pub dragging: bool,
}

/// Apply base interactive styling: pointer cursor, minimum height, relative
/// positioning, legible text color and full opacity. Imported elements also
/// get padding, margin and a dashed frame.
pub fn apply_base(dom: &mut ArenaDom, node: NodeId, imported: bool, config: &BuilderConfig) {
    let mut style = InlineStyle::of(dom, node);
    style.set("cursor", "pointer");
    style.set("min-height", "20px");
    style.set("position", "relative");
    let legible = style.get("color").is_some_and(is_legible_color);
    if !legible {
        style.set("color", config.legible_text_color.as_str());
    }
    style.set("opacity", "1");
    if imported {
        style.set("padding", "8px");
        style.set("margin", "4px 0");
        style.set("border", "1px dashed #d1d5db");
    }
    style.write_to(dom, node);
}

/// Whether a CSS color reads well on a light page.
///
/// Translucent colors and light grays (all channels close together and
/// bright) are not.
pub fn is_legible_color(value: &str) -> bool {
    let Some(color) = parse_color(value) else {
        // Keywords like `inherit` or `currentColor` are left alone.
        return !value.trim().is_empty();
    };
    if color.alpha < 0.6 {
        return false;
    }
    let max = color.r.max(color.g).max(color.b);
    let min = color.r.min(color.g).min(color.b);
    let grayish = max - min <= 24;
    !(grayish && min >= 96)
}

/// Side table of decoration state plus the operations that change it.
#[derive(Debug, Default)]
pub struct Annotator {
    states: HashMap<ElementId, DecorationState>,
}

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &ElementId) -> DecorationState {
        self.states.get(id).copied().unwrap_or_default()
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.state(id).selected
    }

    /// Forget everything; used when the canvas is rebuilt.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Sweep selection styling off every tagged element, then select `node`.
    pub fn apply_selection(
        &mut self,
        dom: &mut ArenaDom,
        container: NodeId,
        node: NodeId,
        kind: ElementKind,
        config: &BuilderConfig,
    ) {
        self.clear_selection(dom, container, config);
        let Some(id) = element_id(dom, node) else {
            return;
        };

        let mut style = InlineStyle::of(dom, node);
        style.set("outline", format!("2px solid {}", config.selection_color));
        style.set("outline-offset", "2px");
        style.set("box-shadow", config.selection_shadow.as_str());
        style.write_to(dom, node);

        if kind.is_image() {
            add_resize_handles(dom, container, node, config);
        }

        let state = self.states.entry(id).or_default();
        state.selected = true;
        state.hovered = false;
    }

    /// Remove selection styling and handles from every tagged element.
    ///
    /// Elements still under the pointer get their hover outline back.
    pub fn clear_selection(&mut self, dom: &mut ArenaDom, container: NodeId, config: &BuilderConfig) {
        remove_resize_handles(dom, container);
        for node in tagged_elements(dom, container) {
            let mut style = InlineStyle::of(dom, node);
            let mut changed = false;
            for property in SELECTION_PROPERTIES {
                changed |= style.remove(property);
            }
            let hovered = element_id(dom, node)
                .and_then(|id| self.states.get(&id))
                .is_some_and(|state| state.hovered && !state.selected);
            if hovered {
                style.set("outline", format!("1px dashed {}", config.hover_color));
                changed = true;
            }
            if changed {
                style.write_to(dom, node);
            }
        }
        for state in self.states.values_mut() {
            state.selected = false;
        }
    }

    /// Show or hide the dashed hover outline. Never touches a selected element.
    pub fn set_hover(&mut self, dom: &mut ArenaDom, node: NodeId, on: bool, config: &BuilderConfig) {
        let Some(id) = element_id(dom, node) else {
            return;
        };
        let state = self.states.entry(id).or_default();
        if state.selected || state.hovered == on {
            return;
        }
        state.hovered = on;

        let mut style = InlineStyle::of(dom, node);
        if on {
            style.set("outline", format!("1px dashed {}", config.hover_color));
        } else {
            style.remove("outline");
        }
        style.write_to(dom, node);
    }

    /// Dim an element while it is dragged, or restore it.
    pub fn set_dragging(
        &mut self,
        dom: &mut ArenaDom,
        node: NodeId,
        on: bool,
        config: &BuilderConfig,
    ) {
        let Some(id) = element_id(dom, node) else {
            return;
        };
        self.states.entry(id).or_default().dragging = on;
        let opacity = if on {
            config.drag_opacity.to_string()
        } else {
            "1".to_string()
        };
        let mut style = InlineStyle::of(dom, node);
        style.set("opacity", opacity);
        style.write_to(dom, node);
    }

    /// Clear the dragging flag on every element. Styling is handled by the caller.
    pub fn clear_dragging(&mut self) {
        for state in self.states.values_mut() {
            state.dragging = false;
        }
    }

    /// Drop hover and selection flags from an element's entry.
    pub fn strip(&mut self, id: &ElementId) {
        if let Some(state) = self.states.get_mut(id) {
            *state = DecorationState::default();
        }
    }

    pub fn forget(&mut self, id: &ElementId) {
        self.states.remove(id);
    }
}

const CORNERS: [(&str, &str, &str); 4] = [
    ("nw", "top", "left"),
    ("ne", "top", "right"),
    ("sw", "bottom", "left"),
    ("se", "bottom", "right"),
];

fn add_resize_handles(dom: &mut ArenaDom, container: NodeId, node: NodeId, config: &BuilderConfig) {
    // An <img> cannot hold children; its handles go on its parent, unless
    // that parent is the canvas itself.
    let host = if dom.tag_name(node) == Some("img") {
        match dom.parent(node) {
            Some(parent) if parent != container => parent,
            _ => {
                trace!(?node, "bare image on canvas, no resize handles");
                return;
            }
        }
    } else {
        node
    };
    let offset = config.handle_size as f64 / -2.0;
    for (corner, vertical, horizontal) in CORNERS {
        let cursor = if corner == "nw" || corner == "se" {
            "nwse-resize"
        } else {
            "nesw-resize"
        };
        let style = format!(
            "position: absolute; {vertical}: {offset}px; {horizontal}: {offset}px; \
             width: {size}px; height: {size}px; background: {color}; \
             border: 1px solid #ffffff; border-radius: 2px; cursor: {cursor}; z-index: 10;",
            size = config.handle_size,
            color = config.selection_color,
        );
        let handle = dom.create_element(
            "div",
            vec![
                Attribute::new("class", "resize-handle"),
                Attribute::new(RESIZE_HANDLE_ATTR, corner),
                Attribute::new("style", style),
            ],
        );
        dom.append(host, handle);
    }
    trace!(?node, "resize handles added");
}

/// Remove every resize handle under `root`.
pub fn remove_resize_handles(dom: &mut ArenaDom, root: NodeId) {
    let handles: Vec<_> = dom
        .descendants(root)
        .into_iter()
        .filter(|&n| dom.attr(n, RESIZE_HANDLE_ATTR).is_some())
        .collect();
    for handle in handles {
        dom.detach(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::element::find_tagged;
    use crate::dom::{inner_html, parse_fragment};

    #[test]
    fn test_legibility() {
        assert!(is_legible_color("#111"));
        assert!(is_legible_color("red"));
        assert!(!is_legible_color("#cccccc"));
        assert!(!is_legible_color("lightgray"));
        assert!(!is_legible_color("rgba(0, 0, 0, 0.3)"));
        assert!(is_legible_color("inherit"));
    }

    #[test]
    fn test_base_fixes_gray_text() {
        let mut f = parse_fragment(r#"<p style="color: #ddd; opacity: 0.2">x</p>"#);
        let p = f.dom.find_by_tag("p").unwrap();
        let config = BuilderConfig::default();
        apply_base(&mut f.dom, p, true, &config);
        let style = InlineStyle::of(&f.dom, p);
        assert_eq!(style.get("color"), Some("#1f2937"));
        assert_eq!(style.get("opacity"), Some("1"));
        assert_eq!(style.get("border"), Some("1px dashed #d1d5db"));
    }

    #[test]
    fn test_selection_moves() {
        let mut f = parse_fragment(
            r#"<p data-element-id="a">A</p><figure data-element-id="b"><img src="x.png"></figure>"#,
        );
        let config = BuilderConfig::default();
        let mut annotator = Annotator::new();
        let a = find_tagged(&f.dom, f.container, &"a".into()).unwrap();
        let b = find_tagged(&f.dom, f.container, &"b".into()).unwrap();

        annotator.apply_selection(&mut f.dom, f.container, a, ElementKind::Text, &config);
        assert!(InlineStyle::of(&f.dom, a).get("outline").is_some());

        annotator.apply_selection(&mut f.dom, f.container, b, ElementKind::Image, &config);
        assert_eq!(InlineStyle::of(&f.dom, a).get("outline"), None);
        assert_eq!(InlineStyle::of(&f.dom, a).get("box-shadow"), None);
        assert!(!annotator.is_selected(&"a".into()));
        assert!(annotator.is_selected(&"b".into()));
        assert_eq!(inner_html(&f.dom, b).matches("resize-handle").count(), 4);

        annotator.clear_selection(&mut f.dom, f.container, &config);
        assert!(!inner_html(&f.dom, f.container).contains("resize-handle"));
    }

    #[test]
    fn test_bare_canvas_image_gets_no_handles() {
        let mut f = parse_fragment(
            r#"<img data-element-id="i" src="a.png"><p data-element-id="p"><img data-element-id="j" src="b.png"></p>"#,
        );
        let config = BuilderConfig::default();
        let mut annotator = Annotator::new();
        let i = find_tagged(&f.dom, f.container, &"i".into()).unwrap();
        let j = find_tagged(&f.dom, f.container, &"j".into()).unwrap();
        let p = find_tagged(&f.dom, f.container, &"p".into()).unwrap();

        annotator.apply_selection(&mut f.dom, f.container, i, ElementKind::Image, &config);
        assert!(annotator.is_selected(&"i".into()));
        assert!(!inner_html(&f.dom, f.container).contains(RESIZE_HANDLE_ATTR));

        annotator.apply_selection(&mut f.dom, f.container, j, ElementKind::Image, &config);
        assert_eq!(inner_html(&f.dom, p).matches(RESIZE_HANDLE_ATTR).count(), 4);
    }

    #[test]
    fn test_hover_survives_selection_sweep() {
        let mut f = parse_fragment(r#"<p data-element-id="a">A</p><p data-element-id="b">B</p>"#);
        let config = BuilderConfig::default();
        let mut annotator = Annotator::new();
        let a = find_tagged(&f.dom, f.container, &"a".into()).unwrap();
        let b = find_tagged(&f.dom, f.container, &"b".into()).unwrap();

        annotator.set_hover(&mut f.dom, a, true, &config);
        annotator.apply_selection(&mut f.dom, f.container, b, ElementKind::Text, &config);

        let a_outline = InlineStyle::of(&f.dom, a).get("outline").map(str::to_string);
        assert_eq!(a_outline, Some(format!("1px dashed {}", config.hover_color)));
        assert!(annotator.state(&"a".into()).hovered);

        annotator.set_hover(&mut f.dom, a, false, &config);
        assert_eq!(InlineStyle::of(&f.dom, a).get("outline"), None);
    }

    #[test]
    fn test_hover_never_overrides_selection() {
        let mut f = parse_fragment(r#"<p data-element-id="a">A</p>"#);
        let config = BuilderConfig::default();
        let mut annotator = Annotator::new();
        let a = find_tagged(&f.dom, f.container, &"a".into()).unwrap();

        annotator.apply_selection(&mut f.dom, f.container, a, ElementKind::Text, &config);
        annotator.set_hover(&mut f.dom, a, true, &config);
        assert!(InlineStyle::of(&f.dom, a).get("outline").unwrap().contains("solid"));
        annotator.set_hover(&mut f.dom, a, false, &config);
        assert!(InlineStyle::of(&f.dom, a).get("outline").is_some());
    }
}
