//! # Components
//!
//! A `Component` owns one host element, one state snapshot, and the ordered
//! list of behavior units it was built from.
//!
//! ```rust
//! use trellis_core::*;
//!
//! struct Counter;
//! impl Behavior for Counter {
//!     fn name(&self) -> &'static str { "Counter" }
//!     fn default_state(&self, d: &mut Patch) { d.insert("count", 0.into()); }
//!     fn update(&self, s: &State) -> Option<Descriptor> {
//!         Some(Descriptor::new().attribute("data-count", s.int("count").unwrap_or(0).to_string()))
//!     }
//! }
//!
//! let doc = Document::new();
//! let counter = ComponentBuilder::new("x-counter").unit(Counter).build(&doc);
//! counter.attach(Some(doc.body()));
//! turn(|| {
//!     counter.set_state(Patch::new().set("count", 1));
//!     counter.set_state(Patch::new().set("count", 2));
//! });
//! assert_eq!(counter.stats().renders, 1);
//! assert_eq!(doc.attribute(counter.host(), "data-count").as_deref(), Some("2"));
//! ```
//!
//! `set_state` commits synchronously; the render it causes runs as a
//! microtask, so a burst of patches in one turn produces a single render of
//! the final state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

use crate::{
    Behavior, Capability, Changed, CompositionError, Descriptor, Diagnostic, Document, ElementId,
    ITEMS, ItemCalcs, ItemOriginals, MissingCapability, PartMap, Patch, Reaction, Resolver, Scope,
    State, StateStore, Validator, apply, current, merge, merge_pair, queue_microtask,
    reconcile_items,
};

/// Where a component is in the patch → converge → render cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Resting, nothing rendered yet.
    #[default]
    Idle,
    /// A patch is going through the convergence loop.
    Patched,
    /// Converged to a state that has not been rendered. The render runs on
    /// the next drain, or on re-attach for a detached component.
    Stable,
    /// Descriptors are being applied. Patches arriving now are queued.
    Rendering,
    /// Resting; the rendered state matches the current state.
    Rendered,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub renders: usize,
    /// Scheduled renders that found nothing left to do.
    pub skipped: usize,
    /// Convergence passes used by the most recent patch.
    pub last_passes: usize,
}

/// Notification sent to render observers (see `trellis-devtools`).
#[derive(Clone, Debug)]
pub enum RenderEvent {
    Started,
    Rendered { changed: Changed },
    Skipped,
    Diagnostic(Diagnostic),
}

type Observer = Rc<dyn Fn(&Component, &RenderEvent)>;

/// Composes behavior units into a component, in the order given.
pub struct ComponentBuilder {
    tag: String,
    units: Vec<Rc<dyn Behavior>>,
    limit: Option<usize>,
}

impl ComponentBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            units: Vec::new(),
            limit: None,
        }
    }

    pub fn unit(self, unit: impl Behavior) -> Self {
        self.unit_rc(Rc::new(unit))
    }

    pub fn unit_rc(mut self, unit: Rc<dyn Behavior>) -> Self {
        self.units.push(unit);
        self
    }

    /// Overrides the convergence pass limit.
    pub fn convergence_limit(mut self, passes: usize) -> Self {
        self.limit = Some(passes);
        self
    }

    /// Every capability some unit requires but no unit provides.
    pub fn check(&self) -> Result<(), CompositionError> {
        let provided: Vec<Capability> = self
            .units
            .iter()
            .flat_map(|u| u.provides().iter().copied())
            .collect();
        let missing: Vec<MissingCapability> = self
            .units
            .iter()
            .flat_map(|u| {
                u.requires()
                    .iter()
                    .filter(|c| !provided.contains(c))
                    .map(|c| MissingCapability {
                        unit: u.name(),
                        capability: *c,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing.into())
        }
    }

    /// Builds the component. Composition problems are logged and kept as
    /// diagnostics; the component is still usable.
    pub fn build(self, doc: &Document) -> Component {
        let mut diagnostics = Vec::new();
        if let Err(e) = self.check() {
            log::error!("<{}>: {e}", self.tag);
            diagnostics.push(Diagnostic::Composition(e));
        }

        let mut defaults = Patch::new();
        let mut reactions = Vec::new();
        let mut validators = Vec::new();
        for unit in &self.units {
            unit.default_state(&mut defaults);
            for mut r in unit.reactions() {
                r.unit = unit.name();
                reactions.push(r);
            }
            let u = unit.clone();
            validators.push(Validator::new(unit.name(), move |s| u.validate(s)));
        }
        let mut resolver = Resolver::new(reactions, validators);
        if let Some(limit) = self.limit {
            resolver = resolver.with_limit(limit);
        }

        let initial = resolver.converge(&State::new(), &defaults);
        if let Some(e) = initial.error {
            diagnostics.push(Diagnostic::Convergence(e));
        }

        let host = doc.create_element(&self.tag);
        doc.set_tracked(host, true);

        Component(Rc::new(Inner {
            doc: doc.clone(),
            host,
            units: self.units.into(),
            resolver,
            store: RefCell::new(StateStore::new(initial.state)),
            rendered: RefCell::new(None),
            phase: Cell::new(Phase::Idle),
            attached: Cell::new(false),
            shadow: Cell::new(None),
            render_queued: Cell::new(false),
            queued: RefCell::new(Vec::new()),
            original: RefCell::new(None),
            item_originals: RefCell::new(ItemOriginals::new()),
            parts: RefCell::new(PartMap::default()),
            diagnostics: RefCell::new(diagnostics),
            stats: Cell::new(RenderStats {
                last_passes: initial.passes,
                ..RenderStats::default()
            }),
            observers: RefCell::new(Vec::new()),
            scope: RefCell::new(Scope::new()),
        }))
    }
}

struct Inner {
    doc: Document,
    host: ElementId,
    units: Rc<[Rc<dyn Behavior>]>,
    resolver: Resolver,
    store: RefCell<StateStore>,
    rendered: RefCell<Option<State>>,
    phase: Cell<Phase>,
    attached: Cell<bool>,
    shadow: Cell<Option<ElementId>>,
    render_queued: Cell<bool>,
    queued: RefCell<Vec<Patch>>,
    original: RefCell<Option<Descriptor>>,
    item_originals: RefCell<ItemOriginals>,
    parts: RefCell<PartMap>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    stats: Cell<RenderStats>,
    observers: RefCell<Vec<Observer>>,
    scope: RefCell<Scope>,
}

/// Cloneable handle to a component instance.
#[derive(Clone)]
pub struct Component(Rc<Inner>);

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("host", &self.0.host)
            .field("phase", &self.0.phase.get())
            .field("state", &self.state())
            .finish()
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Component {
    pub fn host(&self) -> ElementId {
        self.0.host
    }

    pub fn document(&self) -> &Document {
        &self.0.doc
    }

    pub fn shadow_root(&self) -> Option<ElementId> {
        self.0.shadow.get()
    }

    pub fn phase(&self) -> Phase {
        self.0.phase.get()
    }

    pub fn stats(&self) -> RenderStats {
        self.0.stats.get()
    }

    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    pub fn unit_names(&self) -> Vec<&'static str> {
        self.0.units.iter().map(|u| u.name()).collect()
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.0
            .units
            .iter()
            .any(|u| u.provides().contains(&capability))
    }

    pub fn reactions(&self) -> &[Reaction] {
        self.0.resolver.reactions()
    }

    // --- state -------------------------------------------------------------

    pub fn state(&self) -> State {
        self.0.store.borrow().snapshot()
    }

    /// Last state written to the elements, if any.
    pub fn rendered_state(&self) -> Option<State> {
        self.0.rendered.borrow().clone()
    }

    /// Merges `patch` into the state, runs the convergence loop, and schedules
    /// a render if the result differs from what was last rendered.
    ///
    /// Returns whether any field changed. During a render the patch is queued
    /// and applied once the render finishes.
    pub fn set_state(&self, patch: Patch) -> bool {
        if self.0.phase.get() == Phase::Rendering {
            let differs = !self.state().diff(&patch).is_empty();
            log::trace!("set_state during render; queued {} fields", patch.len());
            self.0.queued.borrow_mut().push(patch);
            return differs;
        }

        self.0.phase.set(Phase::Patched);
        let current = self.state();
        let outcome = self.0.resolver.converge(&current, &patch);
        let mut stats = self.0.stats.get();
        stats.last_passes = outcome.passes;
        self.0.stats.set(stats);
        if let Some(e) = outcome.error {
            self.report(Diagnostic::Convergence(e));
        }

        let changed = self.0.store.borrow_mut().commit(outcome.state);
        if self.needs_render() {
            self.0.phase.set(Phase::Stable);
            self.schedule_render();
        } else {
            self.settle_phase();
        }
        !changed.is_empty()
    }

    /// Like [`set_state`](Self::set_state), then renders this component right
    /// away and awaits every unit's `settle` hook. The first hook error is
    /// returned.
    pub fn set_state_async(
        &self,
        patch: Patch,
    ) -> LocalBoxFuture<'static, Result<bool, crate::LifecycleError>> {
        let before = self.state();
        let changed_any = self.set_state(patch);
        self.render();
        let changed = self.state().changes_since(&before);
        let units = self.0.units.clone();
        let pending: Vec<_> = units
            .iter()
            .filter_map(|u| u.settle(self, &changed))
            .collect();
        Box::pin(async move {
            futures::future::try_join_all(pending).await?;
            Ok(changed_any)
        })
    }

    fn needs_render(&self) -> bool {
        self.0.attached.get() && self.0.rendered.borrow().as_ref() != Some(&self.state())
    }

    /// Resting phase once no render is scheduled. A detached component whose
    /// state moved past its last render stays `Stable` until re-attached.
    fn settle_phase(&self) {
        let phase = match self.0.rendered.borrow().as_ref() {
            None => Phase::Idle,
            Some(rendered) if *rendered == self.state() => Phase::Rendered,
            Some(_) => Phase::Stable,
        };
        self.0.phase.set(phase);
    }

    // --- attachment --------------------------------------------------------

    /// Inserts the host under `parent` (if given) and starts rendering.
    ///
    /// The first attach builds the shadow template and captures the host's
    /// original configuration.
    pub fn attach(&self, parent: Option<ElementId>) {
        if self.0.attached.get() {
            return;
        }
        let doc = &self.0.doc;
        if let Some(parent) = parent {
            doc.append_child(parent, self.0.host);
        }
        self.0.attached.set(true);

        if self.0.shadow.get().is_none()
            && let Some(root) = doc.attach_shadow(self.0.host)
        {
            self.0.shadow.set(Some(root));
            let units = self.0.units.clone();
            for unit in units.iter() {
                unit.template(doc, root);
            }
        }

        if self.0.original.borrow().is_none() {
            let original = current(doc, self.0.host);
            doc.take_external_mutations(self.0.host);
            *self.0.original.borrow_mut() = Some(original);
        }
        self.refresh_parts();

        let units = self.0.units.clone();
        for unit in units.iter() {
            unit.attached(self);
        }

        if self.needs_render() {
            self.0.phase.set(Phase::Stable);
            self.schedule_render();
        }
    }

    /// Stops rendering and runs disposers registered for this attachment.
    pub fn detach(&self) {
        if !self.0.attached.get() {
            return;
        }
        self.0.attached.set(false);
        self.0.doc.detach(self.0.host);
        let units = self.0.units.clone();
        for unit in units.iter() {
            unit.detached(self);
        }
        let scope = std::mem::take(&mut *self.0.scope.borrow_mut());
        scope.dispose();
        self.settle_phase();
    }

    /// Registers cleanup to run when the component is next detached.
    pub fn on_detach(&self, f: impl FnOnce() + 'static) {
        self.0.scope.borrow().add_disposer(f);
    }

    // --- parts & originals -------------------------------------------------

    /// Shadow descendant with the given `id`.
    pub fn part(&self, id: &str) -> Option<ElementId> {
        self.0.parts.borrow().get(id)
    }

    pub fn part_map(&self) -> PartMap {
        self.0.parts.borrow().clone()
    }

    /// Rebuilds the part map if the document structure moved since it was
    /// built.
    pub fn refresh_parts(&self) {
        let Some(root) = self.0.shadow.get() else {
            return;
        };
        if self.0.parts.borrow().is_stale(&self.0.doc) {
            *self.0.parts.borrow_mut() = PartMap::build(&self.0.doc, root);
        }
    }

    /// Host configuration set outside of renders, with recorded external
    /// writes folded in.
    pub fn original(&self) -> Descriptor {
        self.fold_host_mutations();
        self.0.original.borrow().clone().unwrap_or_default()
    }

    pub fn item_original(&self, item: ElementId) -> Option<Descriptor> {
        self.0.item_originals.borrow().get(item).cloned()
    }

    fn fold_host_mutations(&self) {
        let mutations = self.0.doc.take_external_mutations(self.0.host);
        if mutations.is_empty() {
            return;
        }
        let mut original = self.0.original.borrow_mut();
        let original = original.get_or_insert_with(Descriptor::new);
        for m in &mutations {
            original.record(m);
        }
    }

    // --- diagnostics -------------------------------------------------------

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.0.diagnostics.borrow().clone()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.0.diagnostics.borrow_mut())
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.0.diagnostics.borrow_mut().push(diagnostic.clone());
        self.notify(&RenderEvent::Diagnostic(diagnostic));
    }

    pub fn observe(&self, observer: impl Fn(&Component, &RenderEvent) + 'static) {
        self.0.observers.borrow_mut().push(Rc::new(observer));
    }

    fn notify(&self, event: &RenderEvent) {
        let observers = self.0.observers.borrow().clone();
        for o in observers {
            o(self, event);
        }
    }

    // --- rendering ---------------------------------------------------------

    fn schedule_render(&self) {
        if self.0.render_queued.replace(true) {
            return;
        }
        log::trace!("render scheduled for {:?}", self.0.host);
        let weak: Weak<Inner> = Rc::downgrade(&self.0);
        queue_microtask(move || {
            if let Some(inner) = weak.upgrade() {
                Component(inner).run_scheduled();
            }
        });
    }

    fn run_scheduled(&self) {
        if !self.0.render_queued.replace(false) {
            return;
        }
        if !self.needs_render() {
            let mut stats = self.0.stats.get();
            stats.skipped += 1;
            self.0.stats.set(stats);
            log::debug!("render of {:?} superseded; skipped", self.0.host);
            self.notify(&RenderEvent::Skipped);
            return;
        }
        self.render();
    }

    /// Renders now if the current state has not been rendered yet. A render
    /// already queued for this turn then finds nothing to do.
    pub fn render(&self) {
        if self.0.phase.get() == Phase::Rendering || !self.needs_render() {
            return;
        }
        self.0.phase.set(Phase::Rendering);
        self.notify(&RenderEvent::Started);

        let doc = self.0.doc.clone();
        let state = self.state();
        let changed = match self.rendered_state() {
            Some(prev) => state.changes_since(&prev),
            None => state.changes_since(&State::new()),
        };
        let units = self.0.units.clone();

        for unit in units.iter() {
            unit.rendering(self, &changed);
        }
        self.refresh_parts();

        self.fold_host_mutations();
        let contributions: Vec<Option<Descriptor>> =
            units.iter().map(|u| u.update(&state)).collect();
        let generated = merge(contributions.iter().map(Option::as_ref));
        let host_update = match self.0.original.borrow().as_ref() {
            Some(original) => merge_pair(&generated, original),
            None => generated,
        };
        let mut report = apply(&doc, self.0.host, &host_update, &self.0.parts.borrow());

        let items = state.elements(ITEMS).to_vec();
        if !items.is_empty() {
            let count = items.len();
            let mut originals = self.0.item_originals.borrow_mut();
            report.absorb(reconcile_items(&doc, &items, &mut originals, |item, index, original| {
                let mut calcs = ItemCalcs::new(index, count);
                for unit in units.iter() {
                    unit.item_calcs(&state, item, &mut calcs);
                }
                let contributions: Vec<Option<Descriptor>> = units
                    .iter()
                    .map(|u| u.item_update(&state, item, &calcs, original))
                    .collect();
                merge(contributions.iter().map(Option::as_ref))
            }));
        }

        *self.0.rendered.borrow_mut() = Some(state);
        let mut stats = self.0.stats.get();
        stats.renders += 1;
        self.0.stats.set(stats);
        self.0.phase.set(Phase::Rendered);
        log::debug!(
            "rendered {:?} ({} fields changed, {} apply errors)",
            self.0.host,
            changed.len(),
            report.errors.len()
        );
        for e in report.errors {
            self.report(Diagnostic::Apply(e));
        }

        for unit in units.iter() {
            unit.rendered(self, &changed);
        }
        self.notify(&RenderEvent::Rendered { changed });

        let queued = std::mem::take(&mut *self.0.queued.borrow_mut());
        for patch in queued {
            self.set_state(patch);
        }
    }
}
