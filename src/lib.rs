//! # quire
//!
//! The content engine of a drag-and-drop page builder for books.
//!
//! ## Features
//!
//! - Normalize arbitrary HTML into tagged, individually addressable elements
//! - Single selection with outline, glow and image resize handles
//! - Drag from an element library, or drag existing elements to reorder
//! - Serialize the canvas without any transient UI state
//! - Version-stamped write-back that never rebuilds the canvas from its own saves
//!
//! ## Quick Start
//!
//! ```
//! use quire::{Book, EditorSession};
//!
//! let mut book = Book::new("Field Notes");
//! book.add_page("<h1>Day One</h1><p>Rain again.</p>");
//!
//! let mut session = EditorSession::new(book);
//! let id = session
//!     .apply(|builder| builder.insert_library_element("quote"))
//!     .unwrap();
//!
//! let page = session.current_page().unwrap();
//! assert!(page.content.contains(id.as_str()));
//! ```
//!
//! ## Normalizing content
//!
//! ```
//! use quire::normalize;
//!
//! let out = normalize("<p>Hello</p><h1>Title</h1>");
//! assert_eq!(out.element_count, 2);
//! assert!(normalize(&out.html).was_already_processed);
//! ```

pub mod book;
pub mod builder;
pub mod config;
pub mod dom;
pub mod error;
pub mod session;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use book::{Book, BookSettings, Page};
pub use builder::{
    BuilderEvent, DataTransfer, DragPayload, ElementId, ElementKind, ElementLibrary,
    LayoutProvider, NormalizedContent, PageBuilder, Rect, RectTable, StackedLayout, normalize,
};
pub use config::BuilderConfig;
pub use error::{Error, Result};
pub use session::EditorSession;
