//! Interaction registration for tagged elements.
//!
//! Handlers are registered per element id. After any structural change,
//! [`ListenerRegistry::reconcile`] compares the registry with the canvas and
//! reports which ids were added, removed or moved.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use super::decorate::{RESIZE_HANDLE_ATTR, apply_base};
use super::drag::DROP_INDICATOR_ATTR;
use super::element::{ELEMENT_ID_ATTR, ElementId, ElementKind, element_id, tagged_elements};
use super::identity::IdGenerator;
use super::normalize::EMPTY_CANVAS_ATTR;
use crate::config::BuilderConfig;
use crate::dom::{ArenaDom, NodeId};

/// Block elements picked up when content appears outside the builder's own
/// creation paths.
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "section", "article", "aside", "header",
    "footer", "blockquote", "pre", "ul", "ol", "table", "figure",
];

/// What is registered for one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerEntry {
    pub kind: ElementKind,
    pub imported: bool,
    /// Native drag start starts a reorder.
    pub draggable: bool,
}

/// Outcome of a reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileDiff {
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
    pub moved: Vec<ElementId>,
}

impl ReconcileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: HashMap<ElementId, ListenerEntry>,
    order: Vec<ElementId>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ElementId) -> Option<&ListenerEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in document order as of the last reconcile.
    pub fn ids(&self) -> &[ElementId] {
        &self.order
    }

    /// Re-derive registrations from the canvas.
    ///
    /// Every tagged element gets base styling and, when reordering is
    /// enabled, the `draggable` attribute. Kinds of elements already
    /// registered are kept as classified at registration time.
    pub fn reconcile(
        &mut self,
        dom: &mut ArenaDom,
        container: NodeId,
        config: &BuilderConfig,
    ) -> ReconcileDiff {
        let mut diff = ReconcileDiff::default();
        if container.is_none() {
            return diff;
        }

        let mut current = Vec::new();
        let mut entries = HashMap::with_capacity(self.entries.len());
        for node in tagged_elements(dom, container) {
            let Some(id) = element_id(dom, node) else {
                continue;
            };
            let entry = match self.entries.get(&id) {
                Some(existing) => *existing,
                None => {
                    diff.added.push(id.clone());
                    ListenerEntry {
                        kind: ElementKind::classify(dom, node),
                        imported: id.is_imported(),
                        draggable: config.enable_reorder,
                    }
                }
            };

            apply_base(dom, node, entry.imported, config);
            if entry.draggable {
                dom.set_attr(node, "draggable", "true");
            }
            entries.insert(id.clone(), entry);
            current.push(id);
        }

        diff.removed = self
            .order
            .iter()
            .filter(|id| !entries.contains_key(*id))
            .cloned()
            .collect();

        let kept_before: Vec<_> = self.order.iter().filter(|id| entries.contains_key(*id)).collect();
        let kept_now: Vec<_> = current.iter().filter(|id| self.entries.contains_key(*id)).collect();
        diff.moved = kept_before
            .iter()
            .zip(kept_now.iter())
            .filter(|(before, now)| before != now)
            .map(|(_, now)| (**now).clone())
            .collect();

        self.entries = entries;
        self.order = current;
        if !diff.is_empty() {
            debug!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                moved = diff.moved.len(),
                "listeners reconciled"
            );
        }
        diff
    }

    /// Drop every registration.
    pub fn remove_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Innermost registered element at or above `node`.
    ///
    /// This is the element whose capturing click handler wins.
    pub fn handler_target(
        &self,
        dom: &ArenaDom,
        container: NodeId,
        node: NodeId,
    ) -> Option<(NodeId, ElementId)> {
        let mut current = node;
        while current.is_some() && current != container {
            if let Some(id) = element_id(dom, current)
                && self.entries.contains_key(&id)
            {
                return Some((current, id));
            }
            current = dom.parent(current)?;
        }
        None
    }
}

/// Give fresh identity to untagged block content and to duplicate ids.
///
/// Newly tagged blocks get base styling right away, so a save that follows
/// already carries it. Tagged elements are not descended into. Returns how
/// many elements were (re)tagged.
pub fn process_existing_dom_content(
    dom: &mut ArenaDom,
    container: NodeId,
    ids: &mut IdGenerator,
    config: &BuilderConfig,
) -> usize {
    if container.is_none() {
        return 0;
    }

    let mut seen = HashSet::new();
    let mut count = 0;
    for node in tagged_elements(dom, container) {
        let Some(id) = element_id(dom, node) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            let tag = dom.tag_name(node).unwrap_or("element").to_string();
            let fresh = ids.generate("manual", Some(&tag));
            debug!(duplicate = %id, %fresh, "duplicate element id replaced");
            dom.set_attr(node, ELEMENT_ID_ATTR, fresh.as_str());
            count += 1;
        }
    }

    count += tag_untagged_blocks(dom, container, ids, config);
    count
}

fn tag_untagged_blocks(
    dom: &mut ArenaDom,
    parent: NodeId,
    ids: &mut IdGenerator,
    config: &BuilderConfig,
) -> usize {
    let children: Vec<_> = dom.element_children(parent).collect();
    let mut count = 0;
    for child in children {
        if dom.attr(child, ELEMENT_ID_ATTR).is_some()
            || dom.attr(child, RESIZE_HANDLE_ATTR).is_some()
            || dom.attr(child, DROP_INDICATOR_ATTR).is_some()
            || dom.attr(child, EMPTY_CANVAS_ATTR).is_some()
        {
            continue;
        }
        let Some(tag) = dom.tag_name(child).map(str::to_string) else {
            continue;
        };
        if BLOCK_TAGS.contains(&tag.as_str()) && has_content(dom, child) {
            let id = ids.generate("manual", Some(&tag));
            trace!(%id, "untagged block picked up");
            dom.set_attr(child, ELEMENT_ID_ATTR, id.as_str());
            apply_base(dom, child, false, config);
            count += 1;
        } else {
            count += tag_untagged_blocks(dom, child, ids, config);
        }
    }
    count
}

fn has_content(dom: &ArenaDom, node: NodeId) -> bool {
    dom.descendants(node).into_iter().any(|d| {
        dom.text(d).is_some_and(|t| !t.trim().is_empty())
            || matches!(dom.tag_name(d), Some("img" | "hr" | "video" | "svg"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::element::find_tagged;
    use crate::dom::parse_fragment;

    #[test]
    fn test_reconcile_diff() {
        let mut f = parse_fragment(r#"<p data-element-id="a">A</p><p data-element-id="b">B</p>"#);
        let config = BuilderConfig::default();
        let mut registry = ListenerRegistry::new();

        let diff = registry.reconcile(&mut f.dom, f.container, &config);
        assert_eq!(diff.added.len(), 2);
        assert_eq!(f.dom.attr(f.dom.find_by_tag("p").unwrap(), "draggable"), Some("true"));

        // Move b before a, delete nothing, add c.
        let b = find_tagged(&f.dom, f.container, &"b".into()).unwrap();
        let a = find_tagged(&f.dom, f.container, &"a".into()).unwrap();
        f.dom.insert_before(a, b);
        let c = f.dom.create_element("p", vec![crate::dom::Attribute::new(ELEMENT_ID_ATTR, "c")]);
        f.dom.append(f.container, c);

        let diff = registry.reconcile(&mut f.dom, f.container, &config);
        assert_eq!(diff.added, vec![ElementId::from("c")]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.moved, vec![ElementId::from("b"), ElementId::from("a")]);

        f.dom.detach(a);
        let diff = registry.reconcile(&mut f.dom, f.container, &config);
        assert_eq!(diff.removed, vec![ElementId::from("a")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_handler_target_is_innermost() {
        let mut f = parse_fragment(
            r#"<div data-element-id="outer"><p data-element-id="inner"><b>x</b></p></div>"#,
        );
        let mut registry = ListenerRegistry::new();
        registry.reconcile(&mut f.dom, f.container, &BuilderConfig::default());
        let b = f.dom.find_by_tag("b").unwrap();
        let (_, id) = registry.handler_target(&f.dom, f.container, b).unwrap();
        assert_eq!(id.as_str(), "inner");
    }

    #[test]
    fn test_process_existing_content() {
        let mut f = parse_fragment(concat!(
            r#"<p data-element-id="a">A</p><p data-element-id="a">copy</p>"#,
            r#"<section><div> </div><p>typed</p></section>"#,
            r#"<div data-element-id="t"><div>inside</div></div>"#,
        ));
        let mut ids = IdGenerator::with_seed(9);
        let config = BuilderConfig::default();
        let count = process_existing_dom_content(&mut f.dom, f.container, &mut ids, &config);
        // duplicate + section (which has content, so its children are left alone)
        assert_eq!(count, 2);
        let tagged = tagged_elements(&f.dom, f.container);
        assert_eq!(tagged.len(), 4);
        let section = f.dom.find_by_tag("section").unwrap();
        assert!(element_id(&f.dom, section).unwrap().as_str().starts_with("manual-section-"));
        let style = crate::dom::InlineStyle::of(&f.dom, section);
        assert_eq!(style.get("cursor"), Some("pointer"));
        assert_eq!(style.get("color"), Some(config.legible_text_color.as_str()));
    }
}
