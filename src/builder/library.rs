//! Element library catalog.

use serde::{Deserialize, Serialize};

use crate::dom::{ArenaDom, NodeId, parse_fragment};
use crate::error::{Error, Result};

/// One draggable entry of the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryElement {
    pub id: String,
    pub title: String,
    /// Opaque markup, instantiated verbatim.
    pub template: String,
}

impl LibraryElement {
    fn new(id: &str, title: &str, template: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            template: template.to_string(),
        }
    }
}

/// Ordered catalog of library elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementLibrary {
    elements: Vec<LibraryElement>,
}

impl ElementLibrary {
    pub fn new(elements: Vec<LibraryElement>) -> Self {
        Self { elements }
    }

    /// Load a catalog from a JSON array of `{id, title, template}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn get(&self, id: &str) -> Option<&LibraryElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LibraryElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Build a detached copy of a template's first element inside `dom`.
    pub fn instantiate(&self, dom: &mut ArenaDom, id: &str) -> Result<NodeId> {
        let element = self
            .get(id)
            .ok_or_else(|| Error::UnknownElementType(id.to_string()))?;
        let fragment = parse_fragment(&element.template);
        let root = fragment
            .dom
            .element_children(fragment.container)
            .next()
            .ok_or_else(|| Error::UnknownElementType(id.to_string()))?;
        Ok(dom.import_subtree(&fragment.dom, root))
    }
}

impl Default for ElementLibrary {
    fn default() -> Self {
        Self::new(vec![
            LibraryElement::new(
                "heading",
                "Heading",
                r#"<h1 style="font-size: 2em; font-weight: bold; margin: 0.67em 0;">Heading</h1>"#,
            ),
            LibraryElement::new(
                "subheading",
                "Subheading",
                r#"<h2 style="font-size: 1.5em; font-weight: bold; margin: 0.83em 0;">Subheading</h2>"#,
            ),
            LibraryElement::new(
                "paragraph",
                "Paragraph",
                r#"<p style="margin: 1em 0; line-height: 1.6;">Start writing your paragraph here.</p>"#,
            ),
            LibraryElement::new(
                "quote",
                "Quote",
                r#"<blockquote style="border-left: 4px solid #d1d5db; padding-left: 16px; font-style: italic; margin: 1em 0;">A memorable quote.</blockquote>"#,
            ),
            LibraryElement::new(
                "bulleted-list",
                "Bulleted List",
                r#"<ul style="padding-left: 24px; margin: 1em 0;"><li>First item</li><li>Second item</li><li>Third item</li></ul>"#,
            ),
            LibraryElement::new(
                "numbered-list",
                "Numbered List",
                r#"<ol style="padding-left: 24px; margin: 1em 0;"><li>First step</li><li>Second step</li><li>Third step</li></ol>"#,
            ),
            LibraryElement::new(
                "image",
                "Image",
                r#"<figure style="margin: 1em 0; text-align: center;"><img src="" alt="Image placeholder" style="max-width: 100%; width: 300px; height: 200px; background: #f3f4f6;"><figcaption style="font-size: 0.875em; color: #4b5563;">Image caption</figcaption></figure>"#,
            ),
            LibraryElement::new(
                "divider",
                "Divider",
                r#"<hr style="border: none; border-top: 1px solid #d1d5db; margin: 2em 0;">"#,
            ),
            LibraryElement::new(
                "callout",
                "Callout",
                r#"<div style="background: #eff6ff; border: 1px solid #bfdbfe; border-radius: 6px; padding: 16px; margin: 1em 0;"><strong>Note:</strong> Important information goes here.</div>"#,
            ),
            LibraryElement::new(
                "two-column",
                "Two Columns",
                r#"<div style="display: flex; gap: 24px; margin: 1em 0;"><div style="flex: 1;"><p>Left column</p></div><div style="flex: 1;"><p>Right column</p></div></div>"#,
            ),
            LibraryElement::new(
                "table",
                "Table",
                r#"<table style="width: 100%; border-collapse: collapse; margin: 1em 0;"><thead><tr><th style="border: 1px solid #d1d5db; padding: 8px;">Header</th><th style="border: 1px solid #d1d5db; padding: 8px;">Header</th></tr></thead><tbody><tr><td style="border: 1px solid #d1d5db; padding: 8px;">Cell</td><td style="border: 1px solid #d1d5db; padding: 8px;">Cell</td></tr></tbody></table>"#,
            ),
            LibraryElement::new(
                "chapter-title",
                "Chapter Title",
                r#"<div style="text-align: center; margin: 3em 0 2em;"><p style="font-size: 0.875em; letter-spacing: 0.2em; text-transform: uppercase;">Chapter One</p><h1 style="font-size: 2.25em; margin: 0.5em 0;">Chapter Title</h1></div>"#,
            ),
        ])
    }
}
