//! Content normalization: foreign HTML into tagged builder content.
//!
//! Normalizing is idempotent. Markup that already carries element ids is
//! returned untouched, and every other path produces markup that does.

use memchr::memmem;
use tracing::debug;

use super::decorate::apply_base;
use super::element::{ELEMENT_ID_ATTR, is_tagged};
use super::identity::IdGenerator;
use crate::config::BuilderConfig;
use crate::dom::{ArenaDom, Attribute, NodeId, escape_text, inner_html, parse_fragment};

/// Attribute marking the instructional empty-canvas block.
pub const EMPTY_CANVAS_ATTR: &str = "data-empty-canvas";

/// Elements that never render and are never tagged.
const NON_VISUAL: &[&str] = &["script", "style", "meta", "link", "title", "br", "noscript", "template"];

/// Tags whose presence means the content has block structure worth tagging
/// element by element.
const STRUCTURAL: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "table", "blockquote", "figure",
];

/// Phrasing elements that stay part of their tagged ancestor.
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "font", "i", "img",
    "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
    "wbr",
];

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
    pub html: String,
    /// The input was already builder content and came back unchanged.
    pub was_already_processed: bool,
    /// Number of tagged elements in `html`.
    pub element_count: usize,
}

/// Normalize with a fresh id generator and default config.
pub fn normalize(raw: &str) -> NormalizedContent {
    normalize_with(raw, &mut IdGenerator::new(), &BuilderConfig::default())
}

/// Convert arbitrary HTML into tagged builder content.
pub fn normalize_with(raw: &str, ids: &mut IdGenerator, config: &BuilderConfig) -> NormalizedContent {
    if raw.trim().is_empty() {
        return NormalizedContent {
            html: empty_canvas_html(config),
            was_already_processed: false,
            element_count: 0,
        };
    }

    let bytes = raw.as_bytes();
    let id_count = count_element_ids(raw);
    if id_count > 0 || memmem::find(bytes, EMPTY_CANVAS_ATTR.as_bytes()).is_some() {
        debug!(elements = id_count, "content already processed");
        return NormalizedContent {
            html: raw.to_string(),
            was_already_processed: true,
            element_count: id_count,
        };
    }

    let mut fragment = parse_fragment(raw);
    let container = fragment.container;

    if !has_structure(&fragment.dom, container) {
        debug!("flat content, wrapping");
        return NormalizedContent {
            html: wrap_flat(&mut fragment.dom, container, ids, config),
            was_already_processed: false,
            element_count: 1,
        };
    }

    let element_count = tag_children(&mut fragment.dom, container, false, ids, config);
    debug!(elements = element_count, "imported content tagged");
    NormalizedContent {
        html: inner_html(&fragment.dom, container),
        was_already_processed: false,
        element_count,
    }
}

/// Count identity attributes in serialized markup.
pub fn count_element_ids(html: &str) -> usize {
    let needle = format!("{ELEMENT_ID_ATTR}=");
    memmem::find_iter(html.as_bytes(), needle.as_bytes()).count()
}

/// The untagged placeholder shown on an empty page.
pub fn empty_canvas_html(config: &BuilderConfig) -> String {
    format!(
        "<div class=\"empty-canvas\" {EMPTY_CANVAS_ATTR}=\"true\" style=\"min-height: 200px; \
         display: flex; align-items: center; justify-content: center; color: #6b7280; \
         border: 2px dashed #d1d5db; border-radius: 8px;\">{}</div>",
        escape_text(&config.placeholder_text)
    )
}

fn has_structure(dom: &ArenaDom, root: NodeId) -> bool {
    dom.element_children(root).any(|child| match dom.tag_name(child) {
        Some(tag) if NON_VISUAL.contains(&tag) => false,
        Some(tag) if STRUCTURAL.contains(&tag) => true,
        _ => has_structure(dom, child),
    })
}

/// Move everything the parser kept into one imported wrapper block.
fn wrap_flat(
    dom: &mut ArenaDom,
    container: NodeId,
    ids: &mut IdGenerator,
    config: &BuilderConfig,
) -> String {
    let id = ids.generate("imported", Some("content"));
    let wrapper = dom.create_element("div", vec![Attribute::new(ELEMENT_ID_ATTR, id.as_str())]);
    apply_base(dom, wrapper, true, config);
    for child in dom.children(container).collect::<Vec<_>>() {
        dom.detach(child);
        dom.append(wrapper, child);
    }
    dom.append(container, wrapper);
    inner_html(dom, container)
}

fn tag_children(
    dom: &mut ArenaDom,
    parent: NodeId,
    inside_tagged: bool,
    ids: &mut IdGenerator,
    config: &BuilderConfig,
) -> usize {
    let children: Vec<_> = dom.element_children(parent).collect();
    let mut count = 0;
    for child in children {
        let Some(tag) = dom.tag_name(child).map(str::to_string) else {
            continue;
        };
        if NON_VISUAL.contains(&tag.as_str()) || is_tagged(dom, child) {
            continue;
        }
        if inside_tagged && INLINE.contains(&tag.as_str()) {
            count += tag_children(dom, child, true, ids, config);
            continue;
        }
        let id = ids.generate("imported", Some(&tag));
        dom.set_attr(child, ELEMENT_ID_ATTR, id.as_str());
        apply_base(dom, child, true, config);
        count += 1 + tag_children(dom, child, true, ids, config);
    }
    count
}
