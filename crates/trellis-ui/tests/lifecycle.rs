use std::cell::RefCell;
use std::rc::Rc;

use trellis_core::input::{install_input_tracking, note_keydown, note_pointer};
use trellis_core::prelude::*;
use trellis_ui::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_open_close_helpers() {
    let doc = Document::new();
    let popup = ComponentBuilder::new("x-popup")
        .unit(OpenClose::new())
        .build(&doc);
    turn(|| popup.attach(Some(doc.body())));
    assert!(!doc.has_class(popup.host(), "opened"));

    assert!(turn(|| open(&popup)));
    assert!(doc.has_class(popup.host(), "opened"));

    turn(|| close(&popup, Some(Value::from("cancel"))));
    assert!(!doc.has_class(popup.host(), "opened"));
    assert_eq!(popup.state().str(CLOSE_RESULT), Some("cancel"));

    turn(|| toggle(&popup));
    assert!(popup.state().bool(OPENED));
    assert!(popup.state().value(CLOSE_RESULT).is_null());
}

#[test]
fn test_transition_is_awaited() {
    let doc = Document::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let seen = log.clone();
    let popup = ComponentBuilder::new("x-popup")
        .unit(OpenClose::new().with_transition(move |component, opened| {
            let rendered = component.rendered_state().is_some_and(|s| s.bool(OPENED));
            let seen = seen.clone();
            Box::pin(async move {
                seen.borrow_mut().push((opened, rendered));
                Ok::<(), LifecycleError>(())
            })
        }))
        .build(&doc);
    popup.attach(Some(doc.body()));

    assert!(pollster::block_on(open_async(&popup)).unwrap());
    assert!(pollster::block_on(close_async(&popup, None)).unwrap());
    // no change, no transition
    assert!(!pollster::block_on(close_async(&popup, None)).unwrap());
    assert_eq!(*log.borrow(), vec![(true, true), (false, false)]);
}

#[test]
fn test_failed_transition_propagates() {
    init_logging();
    let doc = Document::new();
    let popup = ComponentBuilder::new("x-popup")
        .unit(OpenClose::new().with_transition(|_, _| {
            Box::pin(async {
                Err::<(), _>(LifecycleError::new("OpenClose", "transition interrupted"))
            })
        }))
        .build(&doc);
    popup.attach(Some(doc.body()));

    let err = pollster::block_on(open_async(&popup)).unwrap_err();
    assert_eq!(err.unit, "OpenClose");
    assert!(popup.state().bool(OPENED));
    assert!(doc.has_class(popup.host(), "opened"));
}

#[test]
fn test_part_role_swaps_on_change_only() {
    init_logging();
    let doc = Document::new();
    let fancy = PartType::template("fancy-button", |doc: &Document| {
        let el = doc.create_element("div");
        let _ = doc.toggle_class(el, "fancy", true);
        el
    });
    let c = ComponentBuilder::new("x-menu-button")
        .unit(PartRole::new("source", "sourcePartType", "button").template(fancy))
        .build(&doc);
    turn(|| c.attach(Some(doc.body())));

    let first = c.part("source").unwrap();
    assert_eq!(doc.tag(first).as_deref(), Some("button"));

    // unrelated change leaves the part alone
    turn(|| c.set_state(Patch::new().set("other", 1)));
    assert_eq!(c.part("source"), Some(first));

    turn(|| c.set_state(Patch::new().set("sourcePartType", "fancy-button")));
    let second = c.part("source").unwrap();
    assert_ne!(second, first);
    assert!(!doc.contains(first));
    assert!(doc.has_class(second, "fancy"));
    assert_eq!(doc.attribute(second, "id").as_deref(), Some("source"));

    turn(|| c.set_state(Patch::new().set("sourcePartType", "a")));
    let third = c.part("source").unwrap();
    assert_eq!(doc.tag(third).as_deref(), Some("a"));
    assert!(doc.has_class(third, "fancy"));
}

#[test]
fn test_focus_ring_follows_modality() {
    let doc = Document::new();
    let list = list_box(&doc).build(&doc);
    turn(|| list.attach(Some(doc.body())));
    assert_eq!(doc.style_value(list.host(), "outline").as_deref(), Some("none"));

    install_input_tracking();
    note_keydown();
    turn(|| focus_changed(&list, true));
    assert!(doc.has_class(list.host(), "focus-visible"));
    assert_eq!(doc.style_value(list.host(), "outline"), None);

    turn(|| focus_changed(&list, false));
    note_pointer();
    turn(|| focus_changed(&list, true));
    assert!(!doc.has_class(list.host(), "focus-visible"));
}

#[test]
fn test_reattach_renders_pending_state() {
    let doc = Document::new();
    let popup = ComponentBuilder::new("x-popup")
        .unit(OpenClose::new())
        .build(&doc);
    turn(|| popup.attach(Some(doc.body())));
    let renders = popup.stats().renders;

    popup.detach();
    assert!(!doc.is_connected(popup.host()));
    assert_eq!(popup.phase(), Phase::Rendered);
    turn(|| open(&popup));
    assert_eq!(popup.stats().renders, renders);
    assert!(!doc.has_class(popup.host(), "opened"));
    assert_eq!(popup.phase(), Phase::Stable);

    turn(|| popup.attach(Some(doc.body())));
    assert_eq!(popup.stats().renders, renders + 1);
    assert!(doc.has_class(popup.host(), "opened"));
    assert_eq!(popup.phase(), Phase::Rendered);
}

#[test]
fn test_initially_opened() {
    let doc = Document::new();
    let popup = ComponentBuilder::new("x-popup")
        .unit(OpenClose::new().opened(true))
        .build(&doc);
    assert!(popup.state().bool(OPENED));
    assert!(popup.has_capability(capabilities::OPEN_CLOSE));

    turn(|| popup.attach(Some(doc.body())));
    assert!(doc.has_class(popup.host(), "opened"));
    assert!(!turn(|| open(&popup)));
    assert!(turn(|| close(&popup, None)));
    assert!(!doc.has_class(popup.host(), "opened"));
}
