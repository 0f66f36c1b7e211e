use trellis_core::*;
use trellis_ui::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// List box with `n` `<div>` items already in its light DOM.
fn list_with_items(doc: &Document, builder: ComponentBuilder, n: usize) -> (Component, Vec<ElementId>) {
    let list = builder.build(doc);
    let items: Vec<ElementId> = (0..n)
        .map(|i| {
            let item = doc.create_element("div");
            doc.append_child(item, doc.create_text(&format!("item {i}")));
            doc.append_child(list.host(), item);
            item
        })
        .collect();
    (list, items)
}

fn selection_list(doc: &Document, selection: SingleSelection) -> ComponentBuilder {
    ComponentBuilder::new("x-list")
        .unit(SlotContent)
        .unit(ContentItems::new(doc))
        .unit(selection)
}

#[test]
fn test_clamped_selection_renders_once() {
    init_logging();
    let doc = Document::new();
    let (list, items) = list_with_items(&doc, list_box(&doc), 3);

    assert_eq!(list.state().int(SELECTED_INDEX), Some(-1));
    assert!(list.state().value(ITEMS).is_null());

    turn(|| {
        list.attach(Some(doc.body()));
        list.set_state(Patch::new().set(SELECTED_INDEX, 5));
    });

    assert_eq!(list.state().int(SELECTED_INDEX), Some(2));
    assert_eq!(list.stats().renders, 1);
    assert_eq!(doc.property(items[2], "selected"), Some(Value::Bool(true)));
    assert!(doc.has_class(items[2], "selected"));
    assert_eq!(doc.property(items[0], "selected"), Some(Value::Bool(false)));
    assert_eq!(
        doc.attribute(list.host(), "aria-activedescendant"),
        doc.attribute(items[2], "id")
    );
}

#[test]
fn test_required_selection_is_clamped() {
    let doc = Document::new();
    let (list, _) = list_with_items(&doc, selection_list(&doc, SingleSelection::required()), 5);
    turn(|| list.attach(Some(doc.body())));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(0));

    turn(|| list.set_state(Patch::new().set(SELECTED_INDEX, -5)));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(0));

    turn(|| list.set_state(Patch::new().set(SELECTED_INDEX, 999)));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(4));
}

#[test]
fn test_empty_list_has_no_selection() {
    let doc = Document::new();
    let (list, _) = list_with_items(&doc, selection_list(&doc, SingleSelection::required()), 0);
    turn(|| {
        list.attach(Some(doc.body()));
        list.set_state(Patch::new().set(SELECTED_INDEX, 3));
    });
    assert_eq!(list.state().int(SELECTED_INDEX), Some(-1));
    assert_eq!(list.state().value(SELECTED_ITEM), Value::Null);
}

#[test]
fn test_selection_tracks_item_removal() {
    let doc = Document::new();
    let (list, items) = list_with_items(&doc, selection_list(&doc, SingleSelection::default()), 4);
    turn(|| {
        list.attach(Some(doc.body()));
        select_last(&list);
    });
    assert_eq!(list.state().value(SELECTED_ITEM), Value::Element(items[3]));

    doc.remove(items[3]);
    doc.remove(items[2]);
    turn(|| refresh_content(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(1));
    assert_eq!(list.state().value(SELECTED_ITEM), Value::Element(items[1]));
}

#[test]
fn test_cursor_moves() {
    let doc = Document::new();
    let (list, _) = list_with_items(&doc, selection_list(&doc, SingleSelection::default()), 3);
    turn(|| list.attach(Some(doc.body())));

    turn(|| select_next(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(0));
    turn(|| select_next(&list));
    turn(|| select_next(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(2));
    assert!(!turn(|| select_next(&list)));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(2));

    turn(|| select_first(&list));
    assert!(!turn(|| select_previous(&list)));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(0));
}

#[test]
fn test_cursor_wraps() {
    let doc = Document::new();
    let (list, _) = list_with_items(
        &doc,
        selection_list(&doc, SingleSelection::default().wrapping()),
        3,
    );
    turn(|| list.attach(Some(doc.body())));

    turn(|| select_previous(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(2));
    turn(|| select_next(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(0));
    turn(|| select_previous(&list));
    assert_eq!(list.state().int(SELECTED_INDEX), Some(2));
}

#[test]
fn test_author_class_survives_item_updates() {
    let doc = Document::new();
    let (list, items) = list_with_items(&doc, list_box(&doc), 3);
    doc.toggle_class(items[1], "highlight", true).unwrap();

    turn(|| {
        list.attach(Some(doc.body()));
        select_index(&list, 1);
    });
    assert!(doc.has_class(items[1], "highlight"));
    assert!(doc.has_class(items[1], "selected"));

    turn(|| select_index(&list, 0));
    assert!(doc.has_class(items[1], "highlight"));
    assert!(!doc.has_class(items[1], "selected"));
    assert_eq!(doc.attribute(items[1], "aria-selected").as_deref(), Some("false"));
}

#[test]
fn test_external_item_writes_are_kept() {
    let doc = Document::new();
    let (list, items) = list_with_items(&doc, list_box(&doc), 2);
    turn(|| list.attach(Some(doc.body())));

    doc.toggle_class(items[0], "starred", true).unwrap();
    doc.set_attribute(items[0], "role", "menuitemradio").unwrap();
    turn(|| select_index(&list, 0));

    assert!(doc.has_class(items[0], "starred"));
    assert_eq!(doc.attribute(items[0], "role").as_deref(), Some("menuitemradio"));
    assert_eq!(doc.attribute(items[1], "role").as_deref(), Some("option"));
    let original = list.item_original(items[0]).unwrap_or_default();
    assert_eq!(original.classes.get("starred"), Some(&true));
}

#[test]
fn test_auxiliary_nodes_are_not_items() {
    let doc = Document::new();
    let list = list_box(&doc).build(&doc);
    let a = doc.create_element("div");
    let b = doc.create_element("div");
    for node in [
        doc.create_element("style"),
        a,
        doc.create_text("  "),
        doc.create_element("script"),
        doc.create_comment("note"),
        b,
        doc.create_element("template"),
    ] {
        doc.append_child(list.host(), node);
    }
    turn(|| list.attach(Some(doc.body())));
    assert_eq!(list.state().elements(ITEMS), &[a, b]);
    assert_eq!(doc.attribute(a, "role").as_deref(), Some("option"));
}

#[test]
fn test_author_host_role_wins() {
    let doc = Document::new();
    let (list, _) = list_with_items(&doc, list_box(&doc), 1);
    doc.set_attribute(list.host(), "role", "menu").unwrap();
    turn(|| list.attach(Some(doc.body())));
    assert_eq!(doc.attribute(list.host(), "role").as_deref(), Some("menu"));
}

#[test]
fn test_list_box_composition_checks() {
    let doc = Document::new();
    assert!(list_box(&doc).check().is_ok());

    let err = ComponentBuilder::new("x-bad")
        .unit(SingleSelection::default())
        .check()
        .unwrap_err();
    assert_eq!(err.missing()[0].capability, capabilities::ITEMS);
}
