//! # Behavior units
//!
//! A component is an ordered list of small behavior units. Each unit may
//! contribute to any extension point below; every method has a no-op default,
//! so a unit only implements what it cares about.
//!
//! ```rust
//! use trellis_core::*;
//!
//! struct Toggle;
//!
//! impl Behavior for Toggle {
//!     fn name(&self) -> &'static str {
//!         "Toggle"
//!     }
//!     fn default_state(&self, defaults: &mut Patch) {
//!         defaults.insert("pressed", false.into());
//!     }
//!     fn update(&self, state: &State) -> Option<Descriptor> {
//!         let pressed = state.bool("pressed");
//!         Some(
//!             Descriptor::new()
//!                 .attribute("aria-pressed", pressed.to_string())
//!                 .class("pressed", pressed),
//!         )
//!     }
//! }
//! ```
//!
//! Units are composed base-most first. Later units override earlier ones
//! wherever contributions conflict (defaults, reaction patches, descriptors).

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use smallvec::SmallVec;

use crate::{
    Changed, Component, Descriptor, Document, ElementId, Field, LifecycleError, Patch, State,
    Value,
};

/// Something a unit offers to the rest of the composition, such as an item
/// list or a selection API. Checked when a component is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Capability(pub &'static str);

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub type ReactionFn = dyn Fn(&State, &Changed) -> Option<Patch>;

/// A change-triggered derivation: when any of `fields` changed, compute a
/// further patch from the proposed state.
#[derive(Clone)]
pub struct Reaction {
    pub(crate) unit: &'static str,
    fields: SmallVec<[Field; 4]>,
    f: Rc<ReactionFn>,
}

impl Reaction {
    pub fn new(
        fields: &[Field],
        f: impl Fn(&State, &Changed) -> Option<Patch> + 'static,
    ) -> Self {
        Self {
            unit: "",
            fields: fields.iter().copied().collect(),
            f: Rc::new(f),
        }
    }

    /// Runs on every pass regardless of which fields changed.
    pub fn always(f: impl Fn(&State, &Changed) -> Option<Patch> + 'static) -> Self {
        Self::new(&[], f)
    }

    pub fn unit(&self) -> &'static str {
        self.unit
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn triggered_by(&self, changed: &Changed) -> bool {
        self.fields.is_empty() || changed.any(&self.fields)
    }

    pub fn run(&self, state: &State, changed: &Changed) -> Option<Patch> {
        (self.f)(state, changed)
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("unit", &self.unit)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Per-item values computed before item descriptors, e.g. whether the item
/// is the selected one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemCalcs {
    pub index: usize,
    pub count: usize,
    values: BTreeMap<&'static str, Value>,
}

impl ItemCalcs {
    pub fn new(index: usize, count: usize) -> Self {
        Self {
            index,
            count,
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<Value>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::truthy)
    }
}

pub type SettleFuture = LocalBoxFuture<'static, Result<(), LifecycleError>>;

/// Extension points a behavior unit may implement.
///
/// Lifecycle hooks receive the owning [`Component`] so they can read state,
/// reach the document, or request further patches.
#[allow(unused_variables)]
pub trait Behavior: 'static {
    fn name(&self) -> &'static str;

    fn provides(&self) -> &[Capability] {
        &[]
    }

    fn requires(&self) -> &[Capability] {
        &[]
    }

    /// Adds this unit's fields to the in-progress defaults.
    fn default_state(&self, defaults: &mut Patch) {}

    fn reactions(&self) -> Vec<Reaction> {
        Vec::new()
    }

    /// Final invariant pass. Return a correction, or `None` to accept.
    fn validate(&self, state: &State) -> Option<Patch> {
        None
    }

    /// Builds shadow descendants once, on first attach.
    fn template(&self, doc: &Document, shadow_root: ElementId) {}

    /// Host descriptor contribution for the given state.
    fn update(&self, state: &State) -> Option<Descriptor> {
        None
    }

    fn item_calcs(&self, state: &State, item: ElementId, calcs: &mut ItemCalcs) {}

    fn item_update(
        &self,
        state: &State,
        item: ElementId,
        calcs: &ItemCalcs,
        original: &Descriptor,
    ) -> Option<Descriptor> {
        None
    }

    fn attached(&self, component: &Component) {}

    fn detached(&self, component: &Component) {}

    /// Called at the start of a render, before descriptors are computed.
    /// Structural changes to the shadow tree belong here.
    fn rendering(&self, component: &Component, changed: &Changed) {}

    fn rendered(&self, component: &Component, changed: &Changed) {}

    /// Asynchronous follow-up to a state change (e.g. waiting for a
    /// transition). Awaited by [`Component::set_state_async`].
    fn settle(&self, component: &Component, changed: &Changed) -> Option<SettleFuture> {
        None
    }
}
