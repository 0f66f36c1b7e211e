use trellis_core::{Behavior, Component, Descriptor, Field, Patch, State, keyboard_active};

pub const FOCUS_VISIBLE: Field = "focusVisible";

/// Shows a focus ring only when focus arrived by keyboard.
///
/// The host reports focus changes through [`focus_changed`]; the input
/// modality comes from [`trellis_core::input`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusVisible;

impl Behavior for FocusVisible {
    fn name(&self) -> &'static str {
        "FocusVisible"
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(FOCUS_VISIBLE, false.into());
    }

    fn update(&self, state: &State) -> Option<Descriptor> {
        let visible = state.bool(FOCUS_VISIBLE);
        let d = Descriptor::new().class("focus-visible", visible);
        Some(if visible {
            d.clear_style("outline")
        } else {
            d.style("outline", "none")
        })
    }

    fn detached(&self, component: &Component) {
        component.set_state(Patch::new().set(FOCUS_VISIBLE, false));
    }
}

pub fn focus_changed(component: &Component, focused: bool) -> bool {
    let visible = focused && keyboard_active();
    component.set_state(Patch::new().set(FOCUS_VISIBLE, visible))
}
