//! Tagged element identity and classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::{ArenaDom, NodeId};

/// Attribute carrying an element's identity.
pub const ELEMENT_ID_ATTR: &str = "data-element-id";

/// Id prefix marking content that came from an import.
pub const IMPORTED_PREFIX: &str = "imported-";

/// Stable identity of a tagged element within a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Imported elements get looser extraction rules and extra framing.
    pub fn is_imported(&self) -> bool {
        self.0.starts_with(IMPORTED_PREFIX)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a tagged element is, decided once from its markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Heading,
    List,
    Table,
    Image,
    Divider,
    Container,
}

impl ElementKind {
    /// Classify an element node. Anything holding an `<img>` is an image.
    pub fn classify(dom: &ArenaDom, node: NodeId) -> Self {
        let Some(tag) = dom.tag_name(node) else {
            return ElementKind::Container;
        };
        if tag == "img"
            || dom
                .descendants(node)
                .into_iter()
                .any(|d| dom.tag_name(d) == Some("img"))
        {
            return ElementKind::Image;
        }
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading,
            "p" | "blockquote" | "pre" | "span" | "a" | "em" | "strong" => ElementKind::Text,
            "ul" | "ol" | "li" | "dl" => ElementKind::List,
            "table" | "thead" | "tbody" | "tr" | "td" | "th" => ElementKind::Table,
            "hr" => ElementKind::Divider,
            _ => ElementKind::Container,
        }
    }

    pub fn is_image(self) -> bool {
        self == ElementKind::Image
    }
}

/// Identity of a node, if it is tagged.
pub fn element_id(dom: &ArenaDom, node: NodeId) -> Option<ElementId> {
    dom.attr(node, ELEMENT_ID_ATTR)
        .filter(|id| !id.is_empty())
        .map(ElementId::from)
}

pub fn is_tagged(dom: &ArenaDom, node: NodeId) -> bool {
    dom.attr(node, ELEMENT_ID_ATTR).is_some_and(|id| !id.is_empty())
}

/// Every tagged element under `container`, in document order.
pub fn tagged_elements(dom: &ArenaDom, container: NodeId) -> Vec<NodeId> {
    dom.descendants(container)
        .into_iter()
        .filter(|&n| is_tagged(dom, n))
        .collect()
}

/// Tagged direct children of `container`.
pub fn top_level_tagged(dom: &ArenaDom, container: NodeId) -> Vec<NodeId> {
    dom.element_children(container)
        .filter(|&n| is_tagged(dom, n))
        .collect()
}

/// Look an element up by id. Only nodes attached under `container` count.
pub fn find_tagged(dom: &ArenaDom, container: NodeId, id: &ElementId) -> Option<NodeId> {
    if container.is_none() {
        return None;
    }
    dom.descendants(container)
        .into_iter()
        .find(|&n| dom.attr(n, ELEMENT_ID_ATTR) == Some(id.as_str()))
}
