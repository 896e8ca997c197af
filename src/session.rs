//! Editing session over a whole book.
//!
//! [`EditorSession`] connects the page builder to the book model. Content
//! the builder persists is written into the current page with the version
//! that produced it; whenever page content changes, the canvas is rebuilt
//! only if that content is not the builder's own latest write.

use tracing::{debug, trace};

use crate::book::{Book, Page};
use crate::builder::{
    BuilderEvent, ElementLibrary, LayoutProvider, NormalizedContent, PageBuilder, StackedLayout,
};
use crate::config::BuilderConfig;
use crate::error::Result;

#[derive(Debug)]
pub struct EditorSession<L: LayoutProvider = StackedLayout> {
    book: Book,
    current: usize,
    builder: PageBuilder<L>,
    events: Vec<BuilderEvent>,
}

impl EditorSession<StackedLayout> {
    /// Session with default config and catalog; layout rows start below the
    /// book's top margin.
    pub fn new(book: Book) -> Self {
        let layout = StackedLayout::from_settings(&book.settings);
        Self::with_builder(
            book,
            PageBuilder::with_layout(BuilderConfig::default(), ElementLibrary::default(), layout),
        )
    }
}

impl<L: LayoutProvider> EditorSession<L> {
    /// Wrap a configured builder and open the first page. A book without
    /// pages gets an empty one.
    pub fn with_builder(mut book: Book, builder: PageBuilder<L>) -> Self {
        if book.pages.is_empty() {
            book.add_page("");
        }
        let mut session = Self {
            book,
            current: 0,
            builder,
            events: Vec::new(),
        };
        session.materialize();
        session
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn into_book(self) -> Book {
        self.book
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.book.pages.get(self.current)
    }

    pub fn builder(&self) -> &PageBuilder<L> {
        &self.builder
    }

    /// Run a builder operation, then write back its results.
    pub fn apply<R>(&mut self, f: impl FnOnce(&mut PageBuilder<L>) -> R) -> R {
        let result = f(&mut self.builder);
        self.sync();
        result
    }

    /// Write pending builder output into the book. A content write runs
    /// the page-content-changed check, as any content write does.
    pub fn sync(&mut self) {
        if self.drain_builder_events() {
            self.page_content_changed();
        }
    }

    /// Navigate to another page. Always rebuilds the canvas.
    pub fn set_page(&mut self, index: usize) -> Result<()> {
        self.book.page(index)?;
        self.current = index;
        self.materialize();
        Ok(())
    }

    /// Replace a page's content from outside the builder.
    pub fn replace_page_content(&mut self, index: usize, content: impl Into<String>) -> Result<()> {
        self.book.page_mut(index)?.set_content(content);
        if index == self.current {
            self.page_content_changed();
        }
        Ok(())
    }

    /// Append an empty page and return its index.
    pub fn add_page(&mut self) -> usize {
        self.book.add_page("")
    }

    pub fn take_events(&mut self) -> Vec<BuilderEvent> {
        std::mem::take(&mut self.events)
    }

    fn materialize(&mut self) -> Option<NormalizedContent> {
        let page = self.book.pages.get(self.current)?;
        let (id, content) = (page.id.clone(), page.content.clone());
        let normalized = self.builder.load_page(Some(&id), &content);
        // Writes made while loading are the builder's own.
        self.drain_builder_events();
        Some(normalized)
    }

    /// Returns whether page content was written.
    fn drain_builder_events(&mut self) -> bool {
        let mut written = false;
        for event in self.builder.take_events() {
            if let BuilderEvent::ContentUpdated {
                html,
                version,
                word_count,
            } = &event
                && let Some(page) = self.book.pages.get_mut(self.current)
            {
                page.content.clone_from(html);
                page.word_count = *word_count;
                page.revision = Some(*version);
                trace!(page = %page.id, version, "page content written");
                written = true;
            }
            self.events.push(event);
        }
        written
    }

    fn page_content_changed(&mut self) {
        let Some(page) = self.book.pages.get(self.current) else {
            return;
        };
        if !self.builder.bridge().should_rebuild(&page.id, page.revision) {
            trace!(page = %page.id, "own write, canvas kept");
            return;
        }
        debug!(page = %page.id, "page content changed, rebuilding canvas");
        self.materialize();
    }
}
