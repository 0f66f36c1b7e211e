//! # Input modality
//!
//! Whether the user is currently driving the UI with the keyboard is shared
//! by every component (focus rings only show for keyboard users). The flag
//! lives here as explicit process-wide state:
//!
//! - the platform layer calls [`install_input_tracking`] once at start-up and
//!   forwards raw input with [`note_keydown`] / [`note_pointer`];
//! - components only ever read it through [`keyboard_active`].

use parking_lot::RwLock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Modality {
    #[default]
    Pointer,
    Keyboard,
}

#[derive(Debug)]
struct InputState {
    installed: bool,
    modality: Modality,
    generation: u64,
}

static INPUT: RwLock<InputState> = parking_lot::const_rwlock(InputState {
    installed: false,
    modality: Modality::Pointer,
    generation: 0,
});

/// Marks tracking as installed. Returns false if it already was.
pub fn install_input_tracking() -> bool {
    let mut input = INPUT.write();
    if input.installed {
        return false;
    }
    input.installed = true;
    log::debug!("input modality tracking installed");
    true
}

pub fn input_tracking_installed() -> bool {
    INPUT.read().installed
}

pub fn note_keydown() {
    set_modality(Modality::Keyboard);
}

pub fn note_pointer() {
    set_modality(Modality::Pointer);
}

fn set_modality(modality: Modality) {
    let mut input = INPUT.write();
    if !input.installed {
        log::warn!("input event before install_input_tracking; ignored");
        return;
    }
    if input.modality != modality {
        input.modality = modality;
        input.generation += 1;
    }
}

pub fn modality() -> Modality {
    INPUT.read().modality
}

pub fn keyboard_active() -> bool {
    modality() == Modality::Keyboard
}

/// Increments whenever the modality flips; lets callers notice a change
/// since they last looked.
pub fn modality_generation() -> u64 {
    INPUT.read().generation
}
