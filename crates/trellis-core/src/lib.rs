//! # State, Descriptors, and Rendering
//!
//! Trellis builds components out of small behavior units that share one
//! reactive substrate. There are four main pieces:
//!
//! - `State` / `Patch`: immutable snapshot plus shallow partial updates.
//! - `Resolver`: reactions and validators iterated to a fixed point.
//! - `Descriptor`: mergeable description of attributes, classes, style,
//!   properties, and named shadow descendants.
//! - `Component`: owns the state, schedules renders, and applies merged
//!   descriptors to its host, its parts, and its items.
//!
//! ## State
//!
//! Every unit adds its defaults; after that, state only changes through
//! patches:
//!
//! ```rust
//! use trellis_core::*;
//!
//! let state = State::from(Patch::new().set("selectedIndex", -1).set("opened", false));
//! let next = state.with(&Patch::new().set("opened", true));
//! assert!(next.bool("opened"));
//! assert_eq!(next.changes_since(&state).to_vec(), vec!["opened"]);
//! ```
//!
//! ## Reactions
//!
//! A reaction derives further fields when the ones it watches change. The
//! resolver re-runs every reaction until nothing changes:
//!
//! ```rust
//! use trellis_core::*;
//!
//! let double = Reaction::new(&["n"], |s, _| {
//!     Some(Patch::new().set("double", s.int("n").unwrap_or(0) * 2))
//! });
//! let resolver = Resolver::new(vec![double], vec![]);
//! let out = resolver.converge(&State::new(), &Patch::new().set("n", 21));
//! assert_eq!(out.state.int("double"), Some(42));
//! ```
//!
//! ## Descriptors
//!
//! Units describe what the host should look like for a state; the
//! contributions are merged base-most first and applied in one pass. The
//! host's original configuration is merged last so author-set values win
//! over generated defaults.
//!
//! ```rust
//! use trellis_core::*;
//!
//! let doc = Document::new();
//! let el = doc.create_element("div");
//! let d = Descriptor::new().attribute("role", "listbox").class("open", true);
//! apply(&doc, el, &d, &PartMap::default());
//! assert!(doc.has_class(el, "open"));
//! ```

pub mod apply;
pub mod behavior;
pub mod component;
pub mod descriptor;
pub mod document;
pub mod effects;
pub mod error;
pub mod input;
pub mod items;
pub mod parts;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod state;
pub mod value;

pub use apply::*;
pub use behavior::*;
pub use component::*;
pub use descriptor::*;
pub use document::*;
pub use effects::*;
pub use error::*;
pub use input::*;
pub use items::*;
pub use parts::*;
pub use runtime::*;
pub use scope::*;
pub use state::*;
pub use value::*;
