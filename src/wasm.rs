//! WASM bindings for a browser-hosted page builder.
//!
//! The host renders [`WasmPageBuilder::canvas_html`], forwards pointer and
//! drag events by element id, pushes element rectangles after layout, and
//! drains events as JSON.

use wasm_bindgen::prelude::*;

use crate::book::Book;
use crate::builder::{
    DataTransfer, ElementId, ElementLibrary, PageBuilder, RESIZE_HANDLE_ATTR, Rect, RectTable,
};
use crate::config::BuilderConfig;
use crate::dom::inner_html;
use crate::session::EditorSession;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmPageBuilder {
    session: EditorSession<RectTable>,
}

#[wasm_bindgen]
impl WasmPageBuilder {
    /// Open a book given as JSON. Config and catalog are optional JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        book_json: &str,
        config_json: Option<String>,
        library_json: Option<String>,
    ) -> Result<WasmPageBuilder, JsValue> {
        let book = Book::from_json(book_json).map_err(js_error)?;
        let config = match config_json {
            Some(json) => BuilderConfig::from_json(&json).map_err(js_error)?,
            None => BuilderConfig::default(),
        };
        let library = match library_json {
            Some(json) => ElementLibrary::from_json(&json).map_err(js_error)?,
            None => ElementLibrary::default(),
        };
        let builder = PageBuilder::with_layout(config, library, RectTable::new());
        Ok(Self {
            session: EditorSession::with_builder(book, builder),
        })
    }

    pub fn set_page(&mut self, index: usize) -> Result<(), JsValue> {
        self.session.set_page(index).map_err(js_error)
    }

    pub fn replace_page_content(&mut self, index: usize, content: &str) -> Result<(), JsValue> {
        self.session
            .replace_page_content(index, content)
            .map_err(js_error)
    }

    /// Live canvas markup, transient decorations included.
    pub fn canvas_html(&self) -> String {
        let builder = self.session.builder();
        inner_html(builder.dom(), builder.container())
    }

    /// Canvas markup as it would be saved.
    pub fn serialize(&self) -> String {
        self.session.builder().serialize()
    }

    pub fn set_element_rect(&mut self, id: &str, x: f64, y: f64, width: f64, height: f64) {
        let id = ElementId::from(id);
        self.session
            .apply(|b| b.layout_mut().set(id, Rect::new(x, y, width, height)));
    }

    pub fn clear_rects(&mut self) {
        self.session.apply(|b| b.layout_mut().clear());
    }

    /// Select by id; an empty id clears the selection.
    pub fn click(&mut self, id: &str) -> bool {
        let id = (!id.is_empty()).then(|| ElementId::from(id));
        self.session.apply(|b| b.select(id.as_ref()))
    }

    pub fn hover(&mut self, id: &str, entered: bool) {
        let id = ElementId::from(id);
        self.session.apply(|b| {
            if let Some(node) = b.find(&id) {
                if entered {
                    b.pointer_enter(node);
                } else {
                    b.pointer_leave(node);
                }
            }
        });
    }

    /// Returns the plain-text payload to put on the native transfer.
    pub fn drag_start(&mut self, element_type: &str) -> String {
        let mut transfer = DataTransfer::new();
        self.session
            .apply(|b| b.handle_drag_start(Some(&mut transfer), element_type));
        transfer.get_data().to_string()
    }

    pub fn image_drag_start(&mut self, image_url: &str) -> String {
        let mut transfer = DataTransfer::new();
        self.session
            .apply(|b| b.handle_image_drag_start(Some(&mut transfer), image_url));
        transfer.get_data().to_string()
    }

    /// Returns the payload, or `undefined` when the drag was rejected.
    pub fn existing_drag_start(&mut self, id: &str) -> Option<String> {
        let mut transfer = DataTransfer::new();
        let started = self
            .session
            .apply(|b| b.handle_existing_element_drag_start(Some(&mut transfer), id));
        started.then(|| transfer.get_data().to_string())
    }

    /// Returns the drop effect to show.
    pub fn drag_over(&mut self, y: f64) -> String {
        let mut transfer = DataTransfer::new();
        self.session
            .apply(|b| b.handle_drag_over(Some(&mut transfer), y));
        transfer.drop_effect.as_str().to_string()
    }

    pub fn drop(&mut self, payload: &str, y: f64) -> bool {
        self.session.apply(|b| b.handle_drop(payload, y))
    }

    pub fn drag_end(&mut self) {
        self.session.apply(|b| b.handle_drag_end());
    }

    pub fn tick(&mut self) {
        self.session.apply(|b| b.tick());
    }

    /// Begin resizing the selected image from a corner (`nw`, `ne`, `sw`, `se`).
    pub fn resize_start(&mut self, corner: &str, x: f64, y: f64) -> bool {
        self.session.apply(|b| {
            let handle = b.selected_element().and_then(|owner| {
                let dom = b.dom();
                let scope = dom.parent(owner).unwrap_or(owner);
                dom.descendants(scope)
                    .into_iter()
                    .find(|&n| dom.attr(n, RESIZE_HANDLE_ATTR) == Some(corner))
            });
            handle.is_some_and(|h| b.resize_pointer_down(h, x, y))
        })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.apply(|b| b.pointer_move(x, y))
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.session.apply(|b| b.pointer_up(x, y))
    }

    pub fn insert_element(&mut self, element_type: &str) -> Option<String> {
        self.session
            .apply(|b| b.insert_library_element(element_type))
            .map(|id| id.to_string())
    }

    pub fn insert_image(&mut self, image_url: &str) -> Option<String> {
        self.session
            .apply(|b| b.insert_image(image_url))
            .map(|id| id.to_string())
    }

    pub fn insert_image_bytes(&mut self, name: &str, data: &[u8]) -> Option<String> {
        self.session
            .apply(|b| b.insert_image_bytes(name, data))
            .map(|id| id.to_string())
    }

    pub fn delete_element(&mut self, id: &str) -> bool {
        let id = ElementId::from(id);
        self.session.apply(|b| b.delete_element(&id))
    }

    /// Sync an element the user typed into; new blocks inside it get ids.
    pub fn set_element_html(&mut self, id: &str, html: &str) -> bool {
        let id = ElementId::from(id);
        self.session.apply(|b| b.set_element_html(&id, html))
    }

    /// Call after editing canvas content outside the builder.
    pub fn refresh_listeners(&mut self) {
        self.session.apply(|b| {
            b.refresh_listeners();
        });
    }

    /// Pending events as a JSON array.
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.take_events()).map_err(js_error)
    }

    pub fn book_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.book()).map_err(js_error)
    }
}
