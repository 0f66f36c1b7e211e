//! Single selection over `items`, plus a cursor API for moving it.

use trellis_core::{
    Behavior, Capability, Component, Descriptor, ElementId, Field, ITEMS, ItemCalcs, Patch,
    Reaction, State, Value,
};

use crate::capabilities;

pub const SELECTED_INDEX: Field = "selectedIndex";
pub const SELECTED_ITEM: Field = "selectedItem";
pub const SELECTION_REQUIRED: Field = "selectionRequired";
pub const SELECTION_WRAPS: Field = "selectionWraps";

/// Tracks one selected item by index. `-1` means nothing is selected.
///
/// The validator keeps the index in range for the current item count:
/// clamped to `[-1, count - 1]` (or `[0, count - 1]` when a selection is
/// required), wrapped modulo `count` when wrapping is on, and `-1` whenever
/// there are no items.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleSelection {
    pub required: bool,
    pub wraps: bool,
}

impl SingleSelection {
    pub fn required() -> Self {
        Self {
            required: true,
            wraps: false,
        }
    }

    pub fn wrapping(mut self) -> Self {
        self.wraps = true;
        self
    }
}

/// Brings `index` into range for `count` items.
pub fn clamp_index(index: i64, count: usize, required: bool, wraps: bool) -> i64 {
    let count = count as i64;
    if count == 0 {
        return -1;
    }
    if wraps && index != -1 {
        return index.rem_euclid(count);
    }
    let min = if required { 0 } else { -1 };
    index.clamp(min, count - 1)
}

impl Behavior for SingleSelection {
    fn name(&self) -> &'static str {
        "SingleSelection"
    }

    fn provides(&self) -> &[Capability] {
        &[capabilities::SINGLE_SELECTION]
    }

    fn requires(&self) -> &[Capability] {
        &[capabilities::ITEMS]
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(SELECTED_INDEX, Value::Int(-1));
        defaults.insert(SELECTED_ITEM, Value::Null);
        defaults.insert(SELECTION_REQUIRED, self.required.into());
        defaults.insert(SELECTION_WRAPS, self.wraps.into());
    }

    fn reactions(&self) -> Vec<Reaction> {
        vec![Reaction::new(&[SELECTED_INDEX, ITEMS], |state, _| {
            let item = selected_item(state).map_or(Value::Null, Value::Element);
            Some(Patch::new().set(SELECTED_ITEM, item))
        })]
    }

    fn validate(&self, state: &State) -> Option<Patch> {
        let index = state.int(SELECTED_INDEX).unwrap_or(-1);
        let fixed = clamp_index(
            index,
            state.elements(ITEMS).len(),
            state.bool(SELECTION_REQUIRED),
            state.bool(SELECTION_WRAPS),
        );
        if fixed == index && state.get(SELECTED_INDEX).is_some_and(|v| v.as_int().is_some()) {
            return None;
        }
        log::trace!("selectedIndex {index} -> {fixed}");
        Some(Patch::new().set(SELECTED_INDEX, fixed))
    }

    fn item_calcs(&self, state: &State, _item: ElementId, calcs: &mut ItemCalcs) {
        let selected = state.int(SELECTED_INDEX) == Some(calcs.index as i64);
        calcs.set("selected", selected);
    }

    fn item_update(
        &self,
        _state: &State,
        _item: ElementId,
        calcs: &ItemCalcs,
        _original: &Descriptor,
    ) -> Option<Descriptor> {
        let selected = calcs.flag("selected");
        Some(
            Descriptor::new()
                .class("selected", selected)
                .property("selected", selected),
        )
    }
}

/// Item at `selectedIndex`, if the index points at one.
pub fn selected_item(state: &State) -> Option<ElementId> {
    let index = usize::try_from(state.int(SELECTED_INDEX)?).ok()?;
    state.elements(ITEMS).get(index).copied()
}

/// Requests `index`; the validator settles the final value.
pub fn select_index(component: &Component, index: i64) -> bool {
    component.set_state(Patch::new().set(SELECTED_INDEX, index))
}

pub fn select_first(component: &Component) -> bool {
    if component.state().elements(ITEMS).is_empty() {
        return false;
    }
    select_index(component, 0)
}

pub fn select_last(component: &Component) -> bool {
    let count = component.state().elements(ITEMS).len();
    if count == 0 {
        return false;
    }
    select_index(component, count as i64 - 1)
}

/// Moves to the next item. Without wrapping, the last item stays selected.
pub fn select_next(component: &Component) -> bool {
    let state = component.state();
    let count = state.elements(ITEMS).len() as i64;
    if count == 0 {
        return false;
    }
    let index = state.int(SELECTED_INDEX).unwrap_or(-1);
    let target = if index < 0 { 0 } else { index + 1 };
    let target = if state.bool(SELECTION_WRAPS) {
        target.rem_euclid(count)
    } else {
        target.min(count - 1)
    };
    select_index(component, target)
}

/// Moves to the previous item; with nothing selected, selects the last.
pub fn select_previous(component: &Component) -> bool {
    let state = component.state();
    let count = state.elements(ITEMS).len() as i64;
    if count == 0 {
        return false;
    }
    let index = state.int(SELECTED_INDEX).unwrap_or(-1);
    let target = if index < 0 { count - 1 } else { index - 1 };
    let target = if state.bool(SELECTION_WRAPS) {
        target.rem_euclid(count)
    } else {
        target.max(0)
    };
    select_index(component, target)
}
