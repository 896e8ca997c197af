//! Serialization of the live canvas and the write-back version guard.

use tracing::trace;

use super::decorate::{SELECTION_PROPERTIES, remove_resize_handles};
use super::drag::DROP_INDICATOR_ATTR;
use super::element::tagged_elements;
use super::normalize::EMPTY_CANVAS_ATTR;
use crate::dom::{ArenaDom, InlineStyle, NodeId, inner_html};
use crate::util::word_count;

/// Elements whose text never counts as page content.
const SKIP_TEXT: &[&str] = &["script", "style", "template", "noscript"];

/// Serialize the canvas without transient UI state.
///
/// Works on a copy of the container subtree; the live DOM is never touched.
pub fn serialize(dom: &ArenaDom, container: NodeId) -> String {
    if container.is_none() {
        return String::new();
    }
    let mut scratch = ArenaDom::new();
    let root = scratch.import_subtree(dom, container);

    remove_resize_handles(&mut scratch, root);
    let transient: Vec<_> = scratch
        .descendants(root)
        .into_iter()
        .filter(|&n| {
            scratch.attr(n, DROP_INDICATOR_ATTR).is_some()
                || scratch.attr(n, EMPTY_CANVAS_ATTR).is_some()
        })
        .collect();
    for node in transient {
        scratch.detach(node);
    }

    for node in tagged_elements(&scratch, root) {
        let mut style = InlineStyle::of(&scratch, node);
        let mut changed = false;
        for property in SELECTION_PROPERTIES {
            changed |= style.remove(property);
        }
        if style.get("opacity").is_some_and(|o| o.trim() != "1") {
            style.set("opacity", "1");
            changed = true;
        }
        if changed {
            style.write_to(&mut scratch, node);
        }
        scratch.remove_attr(node, "draggable");
    }

    inner_html(&scratch, root)
}

/// Words of visible text under `root`.
pub fn content_word_count(dom: &ArenaDom, root: NodeId) -> usize {
    let mut count = 0;
    for child in dom.children(root) {
        if let Some(text) = dom.text(child) {
            count += word_count(text);
        } else if dom.tag_name(child).is_some_and(|t| !SKIP_TEXT.contains(&t))
            && dom.attr(child, EMPTY_CANVAS_ATTR).is_none()
        {
            count += content_word_count(dom, child);
        }
    }
    count
}

/// A persisted write, stamped with the version that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUpdate {
    pub html: String,
    pub version: u64,
    pub word_count: usize,
}

/// Tracks what this session last wrote so that its own writes are not
/// rebuilt back into the canvas.
#[derive(Debug, Default)]
pub struct PersistenceBridge {
    next_version: u64,
    last_produced: Option<u64>,
    page_id: Option<String>,
}

impl PersistenceBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a freshly loaded page. Versions keep counting up across pages.
    pub fn begin_page(&mut self, page_id: Option<&str>) {
        self.page_id = page_id.map(str::to_string);
        self.last_produced = None;
    }

    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    pub fn last_produced(&self) -> Option<u64> {
        self.last_produced
    }

    /// Stamp serialized content with a new version.
    pub fn persist(&mut self, html: String, word_count: usize) -> ContentUpdate {
        self.next_version += 1;
        self.last_produced = Some(self.next_version);
        trace!(version = self.next_version, bytes = html.len(), "content persisted");
        ContentUpdate {
            html,
            version: self.next_version,
            word_count,
        }
    }

    /// Whether page content seen by the host must be rebuilt into the canvas.
    ///
    /// Only content this session produced last, for the page it has loaded,
    /// is skipped.
    pub fn should_rebuild(&self, page_id: &str, revision: Option<u64>) -> bool {
        self.page_id.as_deref() != Some(page_id)
            || revision.is_none()
            || revision != self.last_produced
    }
}
