//! Behavior units built on `trellis-core`.
//!
//! Each unit is a small struct implementing [`Behavior`]; components are an
//! explicit, ordered list of them. [`list_box`] shows a typical composition:
//!
//! ```rust
//! use trellis_core::*;
//! use trellis_ui::*;
//!
//! let doc = Document::new();
//! let list = list_box(&doc).build(&doc);
//! for label in ["one", "two", "three"] {
//!     let item = doc.create_element("div");
//!     doc.append_child(item, doc.create_text(label));
//!     doc.append_child(list.host(), item);
//! }
//!
//! turn(|| {
//!     list.attach(Some(doc.body()));
//!     select_last(&list);
//! });
//! assert_eq!(list.state().int(SELECTED_INDEX), Some(2));
//! assert_eq!(doc.attribute(list.host(), "role").as_deref(), Some("listbox"));
//! ```

pub mod aria;
pub mod content;
pub mod focus;
pub mod open_close;
pub mod part_role;
pub mod selection;

pub use aria::*;
pub use content::*;
pub use focus::*;
pub use open_close::*;
pub use part_role::*;
pub use selection::*;

use std::rc::Rc;

use trellis_core::{Behavior, ComponentBuilder, Document};

/// Capabilities the units in this crate provide to each other.
pub mod capabilities {
    use trellis_core::Capability;

    pub const CONTENT: Capability = Capability("content");
    pub const ITEMS: Capability = Capability("items");
    pub const SINGLE_SELECTION: Capability = Capability("single-selection");
    pub const OPEN_CLOSE: Capability = Capability("open-close");
}

/// Units of a single-selection list box, base-most first.
pub fn list_box_units(doc: &Document) -> Vec<Rc<dyn Behavior>> {
    vec![
        Rc::new(SlotContent),
        Rc::new(ContentItems::new(doc)),
        Rc::new(SingleSelection::default()),
        Rc::new(AriaList::new(doc)),
        Rc::new(FocusVisible),
    ]
}

/// Builder for a `<trellis-list-box>`; callers may append further units
/// before building.
pub fn list_box(doc: &Document) -> ComponentBuilder {
    list_box_units(doc)
        .into_iter()
        .fold(ComponentBuilder::new("trellis-list-box"), |b, unit| {
            b.unit_rc(unit)
        })
}
