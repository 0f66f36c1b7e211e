//! Light-DOM content and the item list derived from it.

use trellis_core::{
    Behavior, Capability, Component, Document, Field, ITEMS, Patch, Reaction, Value,
    substantive_elements,
};

use crate::capabilities;

/// Every child node of the host, including text and comments.
pub const CONTENT: Field = "content";

/// Publishes the host's children as `content` when attached.
///
/// Call [`refresh_content`] after moving children in or out of the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotContent;

impl Behavior for SlotContent {
    fn name(&self) -> &'static str {
        "SlotContent"
    }

    fn provides(&self) -> &[Capability] {
        &[capabilities::CONTENT]
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(CONTENT, Value::Null);
    }

    fn attached(&self, component: &Component) {
        refresh_content(component);
    }
}

/// Re-reads the host's children into `content`. Returns whether they changed.
pub fn refresh_content(component: &Component) -> bool {
    let children = component.document().children(component.host());
    log::trace!("content of {:?}: {} nodes", component.host(), children.len());
    component.set_state(Patch::new().set(CONTENT, children))
}

/// Derives `items` from `content`, skipping text, comments, and auxiliary
/// elements such as `<style>` or `<template>`.
pub struct ContentItems {
    doc: Document,
}

impl ContentItems {
    pub fn new(doc: &Document) -> Self {
        Self { doc: doc.clone() }
    }
}

impl Behavior for ContentItems {
    fn name(&self) -> &'static str {
        "ContentItems"
    }

    fn provides(&self) -> &[Capability] {
        &[capabilities::ITEMS]
    }

    fn requires(&self) -> &[Capability] {
        &[capabilities::CONTENT]
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(ITEMS, Value::Null);
    }

    fn reactions(&self) -> Vec<Reaction> {
        let doc = self.doc.clone();
        vec![Reaction::new(&[CONTENT], move |state, _| {
            let items = match state.get(CONTENT) {
                Some(content) if !content.is_null() => {
                    Value::from(substantive_elements(&doc, state.elements(CONTENT)))
                }
                _ => Value::Null,
            };
            Some(Patch::new().set(ITEMS, items))
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{ComponentBuilder, turn};

    #[test]
    fn test_items_follow_content() {
        let doc = Document::new();
        let c = ComponentBuilder::new("x-list")
            .unit(SlotContent)
            .unit(ContentItems::new(&doc))
            .build(&doc);
        assert!(c.state().value(ITEMS).is_null());

        let a = doc.create_element("div");
        let style = doc.create_element("style");
        let text = doc.create_text("hello");
        let b = doc.create_element("span");
        for n in [a, style, text, b] {
            doc.append_child(c.host(), n);
        }

        turn(|| c.attach(Some(doc.body())));
        assert_eq!(c.state().elements(CONTENT).len(), 4);
        assert_eq!(c.state().elements(ITEMS), &[a, b]);

        let d = doc.create_element("div");
        doc.append_child(c.host(), d);
        assert!(turn(|| refresh_content(&c)));
        assert_eq!(c.state().elements(ITEMS), &[a, b, d]);
        assert!(!turn(|| refresh_content(&c)));
    }
}
