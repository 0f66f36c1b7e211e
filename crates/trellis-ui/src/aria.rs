//! ARIA bookkeeping for single-selection lists.

use std::sync::atomic::{AtomicUsize, Ordering};

use trellis_core::{
    Behavior, Capability, Changed, Component, Descriptor, Document, ElementId, ITEMS, ItemCalcs,
    PartMap, Setting, State, apply,
};

use crate::{SELECTED_INDEX, capabilities, selected_item};

static NEXT_LIST: AtomicUsize = AtomicUsize::new(0);

/// Marks the host as a `listbox` and its items as `option`s, and points
/// `aria-activedescendant` at the selected item.
///
/// Items without an author-set `id` get a generated one so the host can
/// refer to them. An author-set `role` on an item is kept.
pub struct AriaList {
    doc: Document,
    id_prefix: String,
}

impl AriaList {
    pub fn new(doc: &Document) -> Self {
        let n = NEXT_LIST.fetch_add(1, Ordering::Relaxed);
        Self {
            doc: doc.clone(),
            id_prefix: format!("_list{n}"),
        }
    }

    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }
}

impl Behavior for AriaList {
    fn name(&self) -> &'static str {
        "AriaList"
    }

    fn requires(&self) -> &[Capability] {
        &[capabilities::ITEMS]
    }

    fn update(&self, _state: &State) -> Option<Descriptor> {
        Some(Descriptor::new().attribute("role", "listbox"))
    }

    fn item_update(
        &self,
        state: &State,
        _item: ElementId,
        calcs: &ItemCalcs,
        original: &Descriptor,
    ) -> Option<Descriptor> {
        let mut d = Descriptor::new();
        if original.attributes.get("role").and_then(Setting::as_set).is_none() {
            d = d.attribute("role", "option");
        }
        if original.attributes.get("id").and_then(Setting::as_set).is_none() {
            d = d.attribute("id", format!("{}_option{}", self.id_prefix, calcs.index));
        }
        if state.contains(SELECTED_INDEX) {
            d = d.attribute("aria-selected", calcs.flag("selected").to_string());
        }
        Some(d)
    }

    fn rendered(&self, component: &Component, changed: &Changed) {
        if !changed.any(&[SELECTED_INDEX, ITEMS]) {
            return;
        }
        let active = component
            .rendered_state()
            .as_ref()
            .and_then(selected_item)
            .and_then(|item| self.doc.attribute(item, "id"));
        let d = match active {
            Some(id) => Descriptor::new().attribute("aria-activedescendant", id),
            None => Descriptor::new().remove_attribute("aria-activedescendant"),
        };
        let report = apply(&self.doc, component.host(), &d, &PartMap::default());
        if !report.is_ok() {
            log::warn!("aria-activedescendant not updated: {:?}", report.errors);
        }
    }
}
