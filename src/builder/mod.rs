//! The page-builder content engine.
//!
//! [`PageBuilder`] owns the materialized canvas of one page and every piece
//! of state derived from it: element identity, decorations, the selection,
//! the in-flight drag, listener registrations and the write-back version.
//!
//! Every structural change runs the same sequence:
//!
//! 1. mutate the canvas
//! 2. serialize and persist (emits [`BuilderEvent::ContentUpdated`])
//! 3. pick up untagged content and reconcile listeners
//! 4. select the affected element
//!
//! Gestures never return errors. A missing canvas, a stale id or an unknown
//! element type is a logged no-op reported as `false` or `None`.

mod decorate;
mod drag;
mod element;
mod identity;
mod layout;
mod library;
mod listeners;
mod normalize;
mod persist;
mod resize;
mod selection;

pub use decorate::{
    Annotator, DecorationState, RESIZE_HANDLE_ATTR, SELECTION_PROPERTIES, apply_base,
    is_legible_color,
};
pub use drag::{
    DROP_INDICATOR_ATTR, DataTransfer, DragPayload, DragState, DropEffect, InsertPosition,
    find_insert_position,
};
pub use element::{
    ELEMENT_ID_ATTR, ElementId, ElementKind, IMPORTED_PREFIX, element_id, find_tagged,
    is_tagged, tagged_elements, top_level_tagged,
};
pub use identity::IdGenerator;
pub use layout::{LayoutProvider, Rect, RectTable, StackedLayout};
pub use library::{ElementLibrary, LibraryElement};
pub use listeners::{ListenerEntry, ListenerRegistry, ReconcileDiff, process_existing_dom_content};
pub use normalize::{
    EMPTY_CANVAS_ATTR, NormalizedContent, count_element_ids, empty_canvas_html, normalize,
    normalize_with,
};
pub use persist::{ContentUpdate, PersistenceBridge, content_word_count, serialize};
pub use resize::{Corner, ResizeSession, current_size};
pub use selection::SelectionState;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BuilderConfig;
use crate::dom::{ArenaDom, Attribute, NodeId, parse_fragment};
use crate::util::{decode_text, image_data_url};

/// Notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BuilderEvent {
    /// The canvas was persisted.
    #[serde(rename_all = "camelCase")]
    ContentUpdated {
        html: String,
        version: u64,
        word_count: usize,
    },
    /// The selection changed; `None` means nothing is selected.
    ElementSelected { id: Option<ElementId> },
    /// A resize session finished.
    ImageResized {
        id: ElementId,
        width: f64,
        height: f64,
    },
}

/// Work scheduled for the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Deferred {
    RemoveNode(NodeId),
}

/// Interactive editor for one page of tagged content.
#[derive(Debug)]
pub struct PageBuilder<L: LayoutProvider = StackedLayout> {
    dom: ArenaDom,
    container: NodeId,
    ids: IdGenerator,
    annotator: Annotator,
    selection: SelectionState,
    drag: DragState,
    listeners: ListenerRegistry,
    bridge: PersistenceBridge,
    library: ElementLibrary,
    config: BuilderConfig,
    layout: L,
    events: Vec<BuilderEvent>,
    deferred: Vec<Deferred>,
    resize: Option<ResizeSession>,
}

impl PageBuilder<StackedLayout> {
    /// Builder with the default catalog, config and headless layout.
    pub fn new() -> Self {
        Self::with_layout(BuilderConfig::default(), ElementLibrary::default(), StackedLayout::default())
    }
}

impl Default for PageBuilder<StackedLayout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LayoutProvider> PageBuilder<L> {
    pub fn with_layout(config: BuilderConfig, library: ElementLibrary, layout: L) -> Self {
        Self {
            dom: ArenaDom::new(),
            container: NodeId::NONE,
            ids: IdGenerator::new(),
            annotator: Annotator::new(),
            selection: SelectionState::default(),
            drag: DragState::default(),
            listeners: ListenerRegistry::new(),
            bridge: PersistenceBridge::new(),
            library,
            config,
            layout,
            events: Vec::new(),
            deferred: Vec::new(),
            resize: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn dom(&self) -> &ArenaDom {
        &self.dom
    }

    /// The canvas element, or `NodeId::NONE` before the first load.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn is_mounted(&self) -> bool {
        self.container.is_some()
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn library(&self) -> &ElementLibrary {
        &self.library
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn selected_id(&self) -> Option<&ElementId> {
        self.selection.id()
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn bridge(&self) -> &PersistenceBridge {
        &self.bridge
    }

    pub fn annotator(&self) -> &Annotator {
        &self.annotator
    }

    /// Selected element resolved against the live canvas.
    pub fn selected_element(&self) -> Option<NodeId> {
        self.selection.element(&self.dom, self.container)
    }

    pub fn find(&self, id: &ElementId) -> Option<NodeId> {
        find_tagged(&self.dom, self.container, id)
    }

    /// Ids of every tagged element, in document order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        tagged_elements(&self.dom, self.container)
            .into_iter()
            .filter_map(|n| element_id(&self.dom, n))
            .collect()
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<BuilderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Current canvas markup without transient state.
    pub fn serialize(&self) -> String {
        serialize(&self.dom, self.container)
    }

    // ------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------

    /// Materialize page content into a fresh canvas.
    ///
    /// Content that had to be normalized is persisted right away so its new
    /// identities survive the session.
    pub fn load_page(&mut self, page_id: Option<&str>, content: &str) -> NormalizedContent {
        let normalized = normalize_with(content, &mut self.ids, &self.config);
        let fragment = parse_fragment(&normalized.html);
        self.dom = fragment.dom;
        self.container = fragment.container;

        self.annotator.reset();
        self.listeners.remove_all();
        self.drag = DragState::default();
        self.deferred.clear();
        self.resize = None;
        if self.selection != SelectionState::Unselected {
            self.selection = SelectionState::Unselected;
            self.events.push(BuilderEvent::ElementSelected { id: None });
        }
        self.bridge.begin_page(page_id);
        let picked_up =
            process_existing_dom_content(&mut self.dom, self.container, &mut self.ids, &self.config);

        debug!(
            page = page_id.unwrap_or("-"),
            elements = normalized.element_count,
            already_processed = normalized.was_already_processed,
            picked_up,
            "page loaded"
        );
        if (!normalized.was_already_processed && normalized.element_count > 0) || picked_up > 0 {
            self.persist();
        }
        self.reconcile();
        normalized
    }

    /// Load content not tied to a page.
    pub fn load(&mut self, content: &str) -> NormalizedContent {
        self.load_page(None, content)
    }

    // ------------------------------------------------------------------
    // Sequencing
    // ------------------------------------------------------------------

    fn persist(&mut self) -> ContentUpdate {
        let html = serialize(&self.dom, self.container);
        let words = content_word_count(&self.dom, self.container);
        let update = self.bridge.persist(html, words);
        self.events.push(BuilderEvent::ContentUpdated {
            html: update.html.clone(),
            version: update.version,
            word_count: update.word_count,
        });
        update
    }

    /// Tag new content, persist, reconcile listeners, then select.
    pub(crate) fn commit(&mut self, select: Option<ElementId>) {
        process_existing_dom_content(&mut self.dom, self.container, &mut self.ids, &self.config);
        self.persist();
        self.reconcile();
        if let Some(id) = select {
            self.select(Some(&id));
        }
    }

    /// Pull untagged content into the identity system and reconcile
    /// listener registrations. Hosts call this after editing the canvas
    /// through other means; newly tagged content is persisted.
    pub fn refresh_listeners(&mut self) -> ReconcileDiff {
        if self.container.is_none() {
            return ReconcileDiff::default();
        }
        let picked_up =
            process_existing_dom_content(&mut self.dom, self.container, &mut self.ids, &self.config);
        if picked_up > 0 {
            debug!(picked_up, "untagged content picked up");
            self.persist();
        }
        self.reconcile()
    }

    fn reconcile(&mut self) -> ReconcileDiff {
        let diff = self.listeners.reconcile(&mut self.dom, self.container, &self.config);
        for id in &diff.removed {
            self.annotator.forget(id);
        }
        if self.selected_element().is_none() && self.selection != SelectionState::Unselected {
            debug!("selected element left the canvas");
            self.selection = SelectionState::Unselected;
            self.events.push(BuilderEvent::ElementSelected { id: None });
        }
        diff
    }

    /// Run work deferred to the next tick, such as removing drag images.
    pub fn run_deferred(&mut self) {
        for task in std::mem::take(&mut self.deferred) {
            match task {
                Deferred::RemoveNode(node) => self.dom.detach(node),
            }
        }
    }

    /// Host timer tick.
    pub fn tick(&mut self) {
        self.run_deferred();
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select an element by id, or clear the selection with `None`.
    ///
    /// A stale id selects nothing. Returns whether an element is selected.
    pub fn select(&mut self, id: Option<&ElementId>) -> bool {
        if self.container.is_none() {
            return false;
        }
        self.annotator.clear_selection(&mut self.dom, self.container, &self.config);

        let target = id.and_then(|id| self.find(id).map(|node| (id.clone(), node)));
        let next = match target {
            Some((id, node)) => {
                let kind = self
                    .listeners
                    .get(&id)
                    .map(|e| e.kind)
                    .unwrap_or_else(|| ElementKind::classify(&self.dom, node));
                self.annotator
                    .apply_selection(&mut self.dom, self.container, node, kind, &self.config);
                SelectionState::Selected(id)
            }
            None => {
                if let Some(id) = id {
                    debug!(%id, "select: element not found");
                }
                SelectionState::Unselected
            }
        };

        let selected = next != SelectionState::Unselected;
        if next != self.selection {
            self.events.push(BuilderEvent::ElementSelected {
                id: next.id().cloned(),
            });
            self.selection = next;
        }
        selected
    }

    pub fn clear_selection(&mut self) {
        self.select(None);
    }

    // ------------------------------------------------------------------
    // Pointer gestures on tagged elements
    // ------------------------------------------------------------------

    /// Click anywhere on the canvas; the innermost registered element wins.
    pub fn click(&mut self, node: NodeId) -> bool {
        match self.listeners.handler_target(&self.dom, self.container, node) {
            Some((_, id)) => self.select(Some(&id)),
            None => false,
        }
    }

    pub fn pointer_enter(&mut self, node: NodeId) {
        if let Some((target, _)) = self.listeners.handler_target(&self.dom, self.container, node) {
            self.annotator
                .set_hover(&mut self.dom, target, true, &self.config);
        }
    }

    pub fn pointer_leave(&mut self, node: NodeId) {
        if let Some((target, _)) = self.listeners.handler_target(&self.dom, self.container, node) {
            self.annotator
                .set_hover(&mut self.dom, target, false, &self.config);
        }
    }

    /// Native drag start on a canvas node begins a reorder of its element.
    pub fn native_drag_start(&mut self, node: NodeId, transfer: Option<&mut DataTransfer>) -> bool {
        let Some((_, id)) = self.listeners.handler_target(&self.dom, self.container, node) else {
            return false;
        };
        if !self.listeners.get(&id).is_some_and(|e| e.draggable) {
            return false;
        }
        self.handle_existing_element_drag_start(transfer, id.as_str())
    }

    // ------------------------------------------------------------------
    // Resize
    // ------------------------------------------------------------------

    /// Pointer down on a resize handle of the selected image.
    pub fn resize_pointer_down(&mut self, handle: NodeId, x: f64, y: f64) -> bool {
        if self.resize.is_some() {
            return false;
        }
        let Some(corner) = self.dom.attr(handle, RESIZE_HANDLE_ATTR).and_then(Corner::parse) else {
            return false;
        };
        let (Some(id), Some(owner)) = (self.selection.id().cloned(), self.selected_element()) else {
            return false;
        };
        let image = if self.dom.tag_name(owner) == Some("img") {
            Some(owner)
        } else {
            self.dom
                .descendants(owner)
                .into_iter()
                .find(|&n| self.dom.tag_name(n) == Some("img"))
        };
        let Some(image) = image else {
            warn!(%id, "resize handle on element without image");
            return false;
        };
        self.resize = Some(ResizeSession::begin(&self.dom, id, image, corner, x, y, &self.config));
        true
    }

    /// Pointer moved; live-resizes while a session is open.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        match &self.resize {
            Some(session) => {
                session.update(&mut self.dom, x, y, self.config.min_image_size);
                true
            }
            None => false,
        }
    }

    /// Pointer released; ends the session and persists the new size.
    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        let Some(session) = self.resize.take() else {
            return false;
        };
        let (width, height) = session.update(&mut self.dom, x, y, self.config.min_image_size);
        debug!(id = %session.element, width, height, "resize finished");
        self.events.push(BuilderEvent::ImageResized {
            id: session.element,
            width,
            height,
        });
        self.persist();
        true
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    // ------------------------------------------------------------------
    // Creation and deletion
    // ------------------------------------------------------------------

    /// Insert a library element at the end of the page and select it.
    pub fn insert_library_element(&mut self, element_type: &str) -> Option<ElementId> {
        self.create_library_element(element_type)
    }

    /// Insert an image figure for a URL and select it.
    pub fn insert_image(&mut self, image_url: &str) -> Option<ElementId> {
        self.create_image(image_url)
    }

    /// Insert an image from raw bytes as a data URL.
    pub fn insert_image_bytes(&mut self, name: &str, data: &[u8]) -> Option<ElementId> {
        match image_data_url(name, data) {
            Ok(url) => self.create_image(&url),
            Err(e) => {
                warn!(error = %e, "image insert rejected");
                None
            }
        }
    }

    pub(crate) fn create_library_element(&mut self, element_type: &str) -> Option<ElementId> {
        if self.container.is_none() {
            return None;
        }
        let node = match self.library.instantiate(&mut self.dom, element_type) {
            Ok(node) => node,
            Err(e) => {
                warn!(error = %e, "library element not created");
                return None;
            }
        };
        let id = self.ids.generate("element", Some(element_type));
        Some(self.add_element(node, id))
    }

    pub(crate) fn create_image(&mut self, image_url: &str) -> Option<ElementId> {
        if self.container.is_none() {
            return None;
        }
        let figure = self.dom.create_element(
            "figure",
            vec![Attribute::new("style", "margin: 1em 0; text-align: center;")],
        );
        let img = self.dom.create_element(
            "img",
            vec![
                Attribute::new("src", image_url),
                Attribute::new("alt", ""),
                Attribute::new("style", "max-width: 100%; height: auto;"),
            ],
        );
        let caption = self.dom.create_element(
            "figcaption",
            vec![Attribute::new("style", "font-size: 0.875em; color: #4b5563; margin-top: 8px;")],
        );
        self.dom.append_text(caption, "Image caption");
        self.dom.append(figure, img);
        self.dom.append(figure, caption);

        let id = self.ids.generate("image", None);
        Some(self.add_element(figure, id))
    }

    fn add_element(&mut self, node: NodeId, id: ElementId) -> ElementId {
        self.dom.set_attr(node, ELEMENT_ID_ATTR, id.as_str());
        apply_base(&mut self.dom, node, false, &self.config);
        self.place_new_element(node);
        debug!(%id, "element created");
        self.commit(Some(id.clone()));
        id
    }

    /// Append pasted markup. Its block elements get fresh identity.
    pub fn paste(&mut self, bytes: &[u8], encoding_hint: Option<&str>) -> bool {
        if self.container.is_none() {
            return false;
        }
        let markup = decode_text(bytes, encoding_hint);
        if markup.trim().is_empty() {
            return false;
        }
        let fragment = parse_fragment(&markup);
        let nodes: Vec<_> = fragment.dom.children(fragment.container).collect();
        let mut first = true;
        for node in nodes {
            let copy = self.dom.import_subtree(&fragment.dom, node);
            if first {
                self.place_new_element(copy);
                first = false;
            } else {
                self.dom.append(self.container, copy);
            }
        }
        debug!(bytes = bytes.len(), "content pasted");
        self.commit(None);
        true
    }

    /// Remove an element. The empty-canvas block returns when nothing is left.
    pub fn delete_element(&mut self, id: &ElementId) -> bool {
        let Some(node) = self.find(id) else {
            debug!(%id, "delete: element not found");
            return false;
        };
        // Handles may live outside the deleted subtree.
        if self
            .selected_element()
            .is_some_and(|selected| self.dom.is_inclusive_descendant(selected, node))
        {
            self.annotator.clear_selection(&mut self.dom, self.container, &self.config);
        }
        self.dom.detach(node);
        self.annotator.forget(id);

        if !self.has_blocks() {
            let placeholder = parse_fragment(&empty_canvas_html(&self.config));
            for child in placeholder.dom.children(placeholder.container).collect::<Vec<_>>() {
                let copy = self.dom.import_subtree(&placeholder.dom, child);
                self.dom.append(self.container, copy);
            }
        }
        self.commit(None);
        true
    }

    /// Whether the canvas holds anything besides transient builder nodes.
    fn has_blocks(&self) -> bool {
        self.dom.element_children(self.container).any(|child| {
            [RESIZE_HANDLE_ATTR, DROP_INDICATOR_ATTR, EMPTY_CANVAS_ATTR]
                .iter()
                .all(|attr| self.dom.attr(child, attr).is_none())
        })
    }

    // ------------------------------------------------------------------
    // Direct edits
    // ------------------------------------------------------------------

    /// Edit the live canvas directly, as typing in the editor does.
    ///
    /// Nothing is tagged or persisted here; call
    /// [`refresh_listeners`](Self::refresh_listeners) once the edit is done.
    /// Returns `None` before the first load.
    pub fn edit_canvas<R>(&mut self, edit: impl FnOnce(&mut ArenaDom, NodeId) -> R) -> Option<R> {
        if self.container.is_none() {
            return None;
        }
        Some(edit(&mut self.dom, self.container))
    }

    /// Replace the inner markup of one element and persist the result.
    ///
    /// Blocks in the new markup are tagged like pasted content. The
    /// selection and its decorations survive when the element was selected.
    pub fn set_element_html(&mut self, id: &ElementId, html: &str) -> bool {
        let Some(node) = self.find(id) else {
            debug!(%id, "set html: element not found");
            return false;
        };
        for child in self.dom.children(node).collect::<Vec<_>>() {
            self.dom.detach(child);
        }
        let fragment = parse_fragment(html);
        for child in fragment.dom.children(fragment.container).collect::<Vec<_>>() {
            let copy = self.dom.import_subtree(&fragment.dom, child);
            self.dom.append(node, copy);
        }
        debug!(%id, "element markup replaced");

        let reselect = self.selection.id().cloned();
        self.commit(None);
        if let Some(selected) = reselect {
            // Same id, so no selection event; this redraws the handles.
            self.select(Some(&selected));
        }
        true
    }
}
