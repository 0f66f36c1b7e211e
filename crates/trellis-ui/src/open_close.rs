//! Open/closed state with an optional asynchronous transition.
//!
//! ```rust
//! use trellis_core::*;
//! use trellis_ui::*;
//!
//! let doc = Document::new();
//! let popup = ComponentBuilder::new("x-popup")
//!     .unit(OpenClose::new().with_transition(|_, opened| {
//!         Box::pin(async move {
//!             log::debug!("transition to opened={opened} finished");
//!             Ok::<(), LifecycleError>(())
//!         })
//!     }))
//!     .build(&doc);
//! popup.attach(Some(doc.body()));
//!
//! let changed = pollster::block_on(open_async(&popup)).unwrap();
//! assert!(changed);
//! assert!(doc.has_class(popup.host(), "opened"));
//! ```

use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use trellis_core::{
    Behavior, Capability, Changed, Component, Descriptor, Field, LifecycleError, Patch,
    SettleFuture, State, Value,
};

use crate::capabilities;

pub const OPENED: Field = "opened";
/// Value passed to [`close`], cleared again on open.
pub const CLOSE_RESULT: Field = "closeResult";

type TransitionFn = dyn Fn(&Component, bool) -> SettleFuture;

#[derive(Clone, Default)]
pub struct OpenClose {
    opened: bool,
    transition: Option<Rc<TransitionFn>>,
}

impl OpenClose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(mut self, opened: bool) -> Self {
        self.opened = opened;
        self
    }

    /// Future awaited after each change of `opened`, e.g. a CSS transition
    /// finishing. Receives the new value.
    pub fn with_transition(
        mut self,
        transition: impl Fn(&Component, bool) -> SettleFuture + 'static,
    ) -> Self {
        self.transition = Some(Rc::new(transition));
        self
    }
}

impl fmt::Debug for OpenClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenClose")
            .field("opened", &self.opened)
            .field("transition", &self.transition.is_some())
            .finish()
    }
}

impl Behavior for OpenClose {
    fn name(&self) -> &'static str {
        "OpenClose"
    }

    fn provides(&self) -> &[Capability] {
        &[capabilities::OPEN_CLOSE]
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(OPENED, self.opened.into());
        defaults.insert(CLOSE_RESULT, Value::Null);
    }

    fn update(&self, state: &State) -> Option<Descriptor> {
        Some(Descriptor::new().class("opened", state.bool(OPENED)))
    }

    fn settle(&self, component: &Component, changed: &Changed) -> Option<SettleFuture> {
        if !changed.contains(OPENED) {
            return None;
        }
        let transition = self.transition.as_ref()?;
        Some(transition(component, component.state().bool(OPENED)))
    }
}

pub fn open(component: &Component) -> bool {
    component.set_state(open_patch())
}

pub fn close(component: &Component, result: Option<Value>) -> bool {
    component.set_state(close_patch(result))
}

pub fn toggle(component: &Component) -> bool {
    if component.state().bool(OPENED) {
        close(component, None)
    } else {
        open(component)
    }
}

/// Opens and resolves once every unit's transition has settled.
pub fn open_async(component: &Component) -> LocalBoxFuture<'static, Result<bool, LifecycleError>> {
    component.set_state_async(open_patch())
}

pub fn close_async(
    component: &Component,
    result: Option<Value>,
) -> LocalBoxFuture<'static, Result<bool, LifecycleError>> {
    component.set_state_async(close_patch(result))
}

fn open_patch() -> Patch {
    Patch::new().set(OPENED, true).set(CLOSE_RESULT, Value::Null)
}

fn close_patch(result: Option<Value>) -> Patch {
    Patch::new()
        .set(OPENED, false)
        .set(CLOSE_RESULT, result.unwrap_or_default())
}
