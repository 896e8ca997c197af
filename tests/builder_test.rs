//! Page builder gesture tests.
//!
//! Selection, drag and drop, resize and serialization on a headless canvas.
//! `StackedLayout` gives every top-level tagged element a 40px row starting
//! at y = 0, so row `n` spans `40n..40n + 40` with its midpoint at `40n + 20`.

use quire::builder::{
    BuilderEvent, DataTransfer, DropEffect, EMPTY_CANVAS_ATTR, ElementId, RESIZE_HANDLE_ATTR,
    find_tagged, top_level_tagged,
};
use quire::dom::{InlineStyle, inner_html, parse_fragment};
use quire::{PageBuilder, StackedLayout};

const THREE: &str = concat!(
    r#"<p data-element-id="a">Alpha</p>"#,
    r#"<p data-element-id="b">Bravo</p>"#,
    r#"<p data-element-id="c">Charlie</p>"#,
);

fn loaded(content: &str) -> PageBuilder<StackedLayout> {
    let mut builder = PageBuilder::new();
    builder.load(content);
    builder.take_events();
    builder
}

fn order(builder: &PageBuilder) -> Vec<String> {
    top_level_tagged(builder.dom(), builder.container())
        .into_iter()
        .filter_map(|n| builder.dom().attr(n, "data-element-id").map(str::to_string))
        .collect()
}

fn outlined(builder: &PageBuilder) -> Vec<String> {
    builder
        .element_ids()
        .into_iter()
        .filter(|id| {
            let node = builder.find(id).unwrap();
            InlineStyle::of(builder.dom(), node).get("outline").is_some()
        })
        .map(|id| id.to_string())
        .collect()
}

fn content_updates(events: &[BuilderEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, BuilderEvent::ContentUpdated { .. }))
        .count()
}

// ============================================================================
// Library drops
// ============================================================================

#[test]
fn test_drop_paragraph_on_empty_canvas() {
    let mut builder = loaded("");
    let mut transfer = DataTransfer::new();

    assert!(builder.handle_drag_start(Some(&mut transfer), "paragraph"));
    assert_eq!(transfer.get_data(), "paragraph");
    assert_eq!(transfer.effect_allowed, DropEffect::Copy);
    assert!(builder.handle_drag_over(Some(&mut transfer), 10.0));
    assert_eq!(transfer.drop_effect, DropEffect::Copy);
    assert!(builder.handle_drop(transfer.get_data(), 10.0));
    builder.handle_drag_end();

    let ids = builder.element_ids();
    assert_eq!(ids.len(), 1);
    assert!(ids[0].as_str().starts_with("element-paragraph-"));
    let live = inner_html(builder.dom(), builder.container());
    assert!(!live.contains("empty-canvas"));

    let events = builder.take_events();
    assert_eq!(content_updates(&events), 1);
    let selected: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            BuilderEvent::ElementSelected { id } => Some(id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec![Some(ids[0].clone())]);
    assert!(builder.drag_state().is_idle());
}

#[test]
fn test_drop_image_payload_builds_figure() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    assert!(builder.handle_image_drag_start(Some(&mut transfer), "https://img.test/cat.png"));
    assert_eq!(
        transfer.get_data(),
        r#"{"type":"image","imageUrl":"https://img.test/cat.png"}"#
    );

    assert!(builder.handle_drop(transfer.get_data(), 500.0));
    let id = builder.selected_id().cloned().unwrap();
    assert!(id.as_str().starts_with("image-"));

    let saved = builder.serialize();
    assert!(saved.contains(r#"<img src="https://img.test/cat.png""#));
    assert!(saved.contains("<figcaption"));
    // Selected image shows handles live, never in the saved markup.
    assert_eq!(
        inner_html(builder.dom(), builder.container())
            .matches(RESIZE_HANDLE_ATTR)
            .count(),
        4
    );
    assert!(!saved.contains(RESIZE_HANDLE_ATTR));
}

#[test]
fn test_drop_unknown_type_is_noop() {
    let mut builder = loaded(THREE);
    assert!(!builder.handle_drop("no-such-element", 10.0));
    assert!(builder.take_events().is_empty());
    assert_eq!(order(&builder), ["a", "b", "c"]);
}

#[test]
fn test_drag_image_removed_on_tick() {
    let mut builder = loaded("");
    let mut transfer = DataTransfer::new();
    builder.handle_drag_start(Some(&mut transfer), "heading");

    let snapshot = transfer.drag_image.unwrap();
    assert!(builder.dom().parent(snapshot).is_some());
    assert!(!builder.dom().is_inclusive_descendant(snapshot, builder.container()));

    builder.tick();
    assert!(builder.dom().parent(snapshot).is_none());
}

#[test]
fn test_drag_start_without_transfer_rejected() {
    let mut builder = loaded(THREE);
    assert!(!builder.handle_drag_start(None, "paragraph"));
    assert!(!builder.handle_existing_element_drag_start(None, "a"));
    let mut transfer = DataTransfer::new();
    assert!(!builder.handle_existing_element_drag_start(Some(&mut transfer), ""));
    assert!(builder.drag_state().is_idle());
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_selecting_b_clears_a() {
    let mut builder = loaded(THREE);
    let a = ElementId::from("a");
    let b = ElementId::from("b");

    assert!(builder.select(Some(&a)));
    assert_eq!(outlined(&builder), ["a"]);

    assert!(builder.select(Some(&b)));
    assert_eq!(outlined(&builder), ["b"]);
    let a_style = InlineStyle::of(builder.dom(), builder.find(&a).unwrap());
    assert_eq!(a_style.get("box-shadow"), None);
    assert_eq!(a_style.get("outline-offset"), None);
}

#[test]
fn test_stale_select_deselects() {
    let mut builder = loaded(THREE);
    builder.select(Some(&"a".into()));
    builder.take_events();

    assert!(!builder.select(Some(&"gone".into())));
    assert_eq!(builder.selected_id(), None);
    assert!(outlined(&builder).is_empty());
    assert_eq!(
        builder.take_events(),
        vec![BuilderEvent::ElementSelected { id: None }]
    );
}

#[test]
fn test_reselect_emits_nothing() {
    let mut builder = loaded(THREE);
    builder.select(Some(&"a".into()));
    builder.take_events();
    builder.select(Some(&"a".into()));
    assert!(builder.take_events().is_empty());
}

#[test]
fn test_hover_outline_is_dashed_and_transient() {
    let mut builder = loaded(THREE);
    let a = builder.find(&"a".into()).unwrap();

    builder.pointer_enter(a);
    let style = InlineStyle::of(builder.dom(), a);
    assert!(style.get("outline").unwrap().contains("dashed"));
    assert!(!builder.serialize().contains("outline"));

    builder.pointer_leave(a);
    assert_eq!(InlineStyle::of(builder.dom(), a).get("outline"), None);
}

// ============================================================================
// Reordering
// ============================================================================

#[test]
fn test_drop_at_current_position_is_noop() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    assert!(builder.handle_existing_element_drag_start(Some(&mut transfer), "a"));
    assert_eq!(transfer.get_data(), "existing:a");

    // Just above b's midpoint: insertion point is b, a's next sibling.
    builder.handle_drag_over(Some(&mut transfer), 55.0);
    assert!(inner_html(builder.dom(), builder.container()).contains("drop-indicator"));
    let before = builder.serialize();

    assert!(builder.handle_drop(transfer.get_data(), 55.0));
    builder.handle_drag_end();

    assert!(builder.take_events().is_empty());
    assert_eq!(order(&builder), ["a", "b", "c"]);
    assert_eq!(builder.serialize(), before);
}

#[test]
fn test_drop_last_element_at_end_is_noop() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    builder.handle_existing_element_drag_start(Some(&mut transfer), "c");
    assert!(builder.handle_drop(transfer.get_data(), 115.0));
    assert_eq!(content_updates(&builder.take_events()), 0);
}

#[test]
fn test_reorder_moves_and_reselects() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    builder.handle_existing_element_drag_start(Some(&mut transfer), "c");
    let dimmed = InlineStyle::of(builder.dom(), builder.find(&"c".into()).unwrap());
    assert_eq!(dimmed.get("opacity"), Some("0.5"));

    // Above a's midpoint.
    assert!(builder.handle_drop(transfer.get_data(), 5.0));
    builder.handle_drag_end();

    assert_eq!(order(&builder), ["c", "a", "b"]);
    assert_eq!(builder.selected_id().map(ElementId::as_str), Some("c"));

    let events = builder.take_events();
    assert_eq!(content_updates(&events), 1);
    let Some(BuilderEvent::ContentUpdated { html, .. }) = events.first() else {
        panic!("expected content update first");
    };
    assert!(html.starts_with(r#"<p data-element-id="c""#));
    assert!(!html.contains("opacity: 0.5"));
}

#[test]
fn test_drop_indicator_is_unique() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    builder.handle_existing_element_drag_start(Some(&mut transfer), "a");
    for y in [5.0, 45.0, 85.0, 150.0] {
        builder.handle_drag_over(Some(&mut transfer), y);
        let live = inner_html(builder.dom(), builder.container());
        assert_eq!(live.matches("drop-indicator").count(), 1);
    }
    builder.handle_drag_end();
    assert!(!inner_html(builder.dom(), builder.container()).contains("drop-indicator"));
}

#[test]
fn test_drag_end_restores_opacity() {
    let mut builder = loaded(THREE);
    let mut transfer = DataTransfer::new();
    builder.handle_existing_element_drag_start(Some(&mut transfer), "b");
    builder.handle_drag_end();

    let b = builder.find(&"b".into()).unwrap();
    assert_eq!(InlineStyle::of(builder.dom(), b).get("opacity"), Some("1"));
    assert!(builder.drag_state().is_idle());
}

#[test]
fn test_native_drag_start_from_inner_node() {
    let mut builder = loaded(r#"<p data-element-id="a">Hi <em>there</em></p>"#);
    let em = builder.dom().find_by_tag("em").unwrap();
    let mut transfer = DataTransfer::new();
    assert!(builder.native_drag_start(em, Some(&mut transfer)));
    assert_eq!(transfer.get_data(), "existing:a");
    assert_eq!(transfer.effect_allowed, DropEffect::Move);
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_serialize_never_leaks_selection() {
    let mut builder = loaded(
        r#"<figure data-element-id="f"><img src="x.png" width="120" height="90"></figure><p data-element-id="p">text</p>"#,
    );
    builder.select(Some(&"f".into()));

    let saved = builder.serialize();
    assert!(!saved.contains("outline"));
    assert!(!saved.contains("box-shadow"));
    assert!(!saved.contains("resize-handle"));
    assert!(!saved.contains("draggable"));
    // Live canvas still shows the selection.
    assert!(inner_html(builder.dom(), builder.container()).contains("outline"));
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_from_south_east_handle() {
    let mut builder = loaded(
        r#"<figure data-element-id="f"><img src="x.png" width="200" height="100"></figure>"#,
    );
    builder.select(Some(&"f".into()));
    builder.take_events();

    let handle = builder
        .dom()
        .descendants(builder.container())
        .into_iter()
        .find(|&n| builder.dom().attr(n, RESIZE_HANDLE_ATTR) == Some("se"))
        .unwrap();

    assert!(builder.resize_pointer_down(handle, 300.0, 300.0));
    assert!(!builder.resize_pointer_down(handle, 300.0, 300.0));
    assert!(builder.pointer_move(340.0, 320.0));
    assert!(builder.pointer_up(400.0, 100.0));
    assert!(!builder.is_resizing());

    let events = builder.take_events();
    assert_eq!(
        events[0],
        BuilderEvent::ImageResized {
            id: "f".into(),
            width: 300.0,
            height: 50.0,
        }
    );
    let BuilderEvent::ContentUpdated { html, .. } = &events[1] else {
        panic!("resize must persist");
    };
    assert!(html.contains("width: 300px; height: 50px;"));
    assert!(!builder.pointer_move(0.0, 0.0));
}

#[test]
fn test_insert_image_bytes_uses_data_url() {
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&640u32.to_be_bytes());
    png.extend_from_slice(&480u32.to_be_bytes());
    png.extend_from_slice(&[8, 6, 0, 0, 0]);

    let mut builder = loaded("");
    let id = builder.insert_image_bytes("photo.png", &png).unwrap();
    assert!(builder.serialize().contains("src=\"data:image/png;base64,"));
    assert_eq!(builder.selected_id(), Some(&id));
    assert!(builder.insert_image_bytes("notes.txt", b"plain").is_none());
}

// ============================================================================
// Deletion and direct edits
// ============================================================================

#[test]
fn test_delete_selected_bare_image_restores_placeholder() {
    let mut builder = loaded(r#"<img data-element-id="i" src="a.png">"#);
    let id = ElementId::from("i");

    assert!(builder.select(Some(&id)));
    let live = inner_html(builder.dom(), builder.container());
    assert!(!live.contains(RESIZE_HANDLE_ATTR));

    assert!(builder.delete_element(&id));
    let live = inner_html(builder.dom(), builder.container());
    assert!(!live.contains(RESIZE_HANDLE_ATTR));
    assert!(live.contains(EMPTY_CANVAS_ATTR));
    assert_eq!(builder.serialize(), "");
    assert_eq!(builder.selected_id(), None);
}

#[test]
fn test_delete_selected_image_sweeps_handles_from_host() {
    let mut builder = loaded(concat!(
        r#"<p data-element-id="host"><img data-element-id="i" src="a.png"></p>"#,
        r#"<p data-element-id="b">Bravo</p>"#,
    ));
    let id = ElementId::from("i");

    assert!(builder.select(Some(&id)));
    let host = builder.find(&"host".into()).unwrap();
    assert_eq!(
        builder
            .dom()
            .element_children(host)
            .filter(|&n| builder.dom().attr(n, RESIZE_HANDLE_ATTR).is_some())
            .count(),
        4
    );

    assert!(builder.delete_element(&id));
    let live = inner_html(builder.dom(), builder.container());
    assert!(!live.contains(RESIZE_HANDLE_ATTR));
    assert!(!live.contains(EMPTY_CANVAS_ATTR));
    assert_eq!(order(&builder), vec!["host", "b"]);
}

#[test]
fn test_typed_block_picked_up_on_refresh() {
    let mut builder = loaded(THREE);
    assert!(builder.select(Some(&"a".into())));
    builder.take_events();

    let typed = builder
        .edit_canvas(|dom, container| {
            let p = dom.create_element("p", Vec::new());
            dom.append_text(p, "typed");
            dom.append(container, p);
            p
        })
        .unwrap();

    let diff = builder.refresh_listeners();
    assert_eq!(diff.added.len(), 1);
    let id = diff.added[0].clone();
    assert!(id.as_str().starts_with("manual-p-"));
    assert_eq!(builder.dom().attr(typed, "data-element-id"), Some(id.as_str()));
    assert!(builder.listeners().get(&id).is_some());
    assert_eq!(builder.selected_id().map(ElementId::as_str), Some("a"));
    assert_eq!(outlined(&builder), vec!["a"]);

    let events = builder.take_events();
    assert_eq!(content_updates(&events), 1);
    assert!(!events.iter().any(|e| matches!(e, BuilderEvent::ElementSelected { .. })));
    let Some(BuilderEvent::ContentUpdated { html, .. }) = events.first() else {
        panic!("no content update");
    };
    let saved = parse_fragment(html);
    let node = find_tagged(&saved.dom, saved.container, &id).unwrap();
    let style = InlineStyle::of(&saved.dom, node);
    assert_eq!(style.get("cursor"), Some("pointer"));

    // Nothing new, nothing persisted.
    assert!(builder.refresh_listeners().added.is_empty());
    assert!(builder.take_events().is_empty());
}

#[test]
fn test_set_element_html_keeps_selection() {
    let mut builder = loaded(THREE);
    let b = ElementId::from("b");
    assert!(builder.select(Some(&b)));
    builder.take_events();

    assert!(builder.set_element_html(&b, "Bravo <em>two</em>"));
    assert!(builder.serialize().contains("Bravo <em>two</em></p>"));
    assert_eq!(builder.selected_id(), Some(&b));
    assert_eq!(outlined(&builder), vec!["b"]);

    let events = builder.take_events();
    assert_eq!(content_updates(&events), 1);
    assert!(!events.iter().any(|e| matches!(e, BuilderEvent::ElementSelected { .. })));

    assert!(!builder.set_element_html(&"missing".into(), "x"));
    assert!(builder.take_events().is_empty());
}
