//! Live DOM substrate for the page canvas.
//!
//! Page content is materialized by parsing it with html5ever into an
//! [`ArenaDom`]. The `<body>` element of the parsed document is the canvas
//! container; everything else in the document (the drag-image layer, for
//! instance) lives outside it and is never serialized.

mod arena;
mod inline_style;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, Attribute, ChildrenIter, Node, NodeData, NodeId};
pub use inline_style::{
    InlineStyle, Rgba, parse_color, remove_style_properties, set_style_property,
};
pub use serialize::{escape_attr, escape_text, inner_html, outer_html};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::ArenaSink;

/// A parsed HTML fragment and the element that holds its top-level nodes.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub dom: ArenaDom,
    /// The `<body>` element; its children are the fragment's nodes.
    pub container: NodeId,
}

/// Parse a fragment of HTML (not a full document).
///
/// The markup is wrapped in a minimal document so the tree builder treats
/// it as body content, the same way assigning `innerHTML` on a block does.
pub fn parse_fragment(html: &str) -> Fragment {
    let wrapped = format!("<!DOCTYPE html><html><head></head><body>{html}</body></html>");
    let dom = parse_document(ArenaSink::new(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes())
        .into_dom();

    let container = dom.find_by_tag("body").unwrap_or(NodeId::NONE);
    Fragment { dom, container }
}
