use std::collections::HashMap;

use crate::{ApplyError, Descriptor, Document, ElementId, Setting};

/// Lookup from shadow descendant `id` attributes to elements.
///
/// Rebuilt when the shadow tree it was built from changes structure, not on
/// every render. Light DOM changes elsewhere leave it alone.
#[derive(Clone, Debug, Default)]
pub struct PartMap {
    ids: HashMap<String, ElementId>,
    root: Option<ElementId>,
    version: Option<u64>,
}

impl PartMap {
    pub fn build(doc: &Document, root: ElementId) -> Self {
        let mut ids = HashMap::new();
        for node in doc.descendants(root) {
            if let Some(id) = doc.attribute(node, "id") {
                // first element wins, like getElementById
                ids.entry(id).or_insert(node);
            }
        }
        Self {
            ids,
            root: Some(root),
            version: doc.subtree_version(root),
        }
    }

    pub fn is_stale(&self, doc: &Document) -> bool {
        match self.root {
            Some(root) => self.version.is_none() || doc.subtree_version(root) != self.version,
            None => true,
        }
    }

    pub fn get(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Entries the element rejected while applying a descriptor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyReport {
    pub errors: Vec<ApplyError>,
}

impl ApplyReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn absorb(&mut self, other: ApplyReport) {
        self.errors.extend(other.errors);
    }

    fn push(&mut self, result: Result<(), ApplyError>) {
        if let Err(e) = result {
            log::warn!("apply: {e}");
            self.errors.push(e);
        }
    }
}

/// Writes `descriptor` onto `element` and the named descendants in `parts`.
///
/// Every entry is applied independently; a rejected entry is reported and the
/// rest still go through. Applying the same descriptor twice is a no-op the
/// second time.
pub fn apply(doc: &Document, element: ElementId, descriptor: &Descriptor, parts: &PartMap) -> ApplyReport {
    let _guard = doc.begin_apply();
    let mut report = ApplyReport::default();
    apply_element(doc, element, descriptor, &mut report);

    for (id, part) in &descriptor.parts {
        let Some(target) = parts.get(id) else {
            report.push(Err(ApplyError::UnknownPart(id.clone())));
            continue;
        };
        apply_element(doc, target, part, &mut report);
        if !part.parts.is_empty() {
            // nested parts address the descendant's own shadow tree
            let nested = doc
                .shadow_root(target)
                .map(|root| PartMap::build(doc, root))
                .unwrap_or_default();
            let inner = Descriptor {
                parts: part.parts.clone(),
                ..Descriptor::default()
            };
            report.absorb(apply(doc, target, &inner, &nested));
        }
    }
    report
}

fn apply_element(doc: &Document, element: ElementId, d: &Descriptor, report: &mut ApplyReport) {
    for (name, setting) in &d.attributes {
        match setting {
            Setting::Ignore => {}
            Setting::Remove => report.push(doc.remove_attribute(element, name)),
            Setting::Set(v) => report.push(doc.set_attribute(element, name, v)),
        }
    }
    for (name, on) in &d.classes {
        report.push(doc.toggle_class(element, name, *on));
    }
    for (property, setting) in &d.style {
        match setting {
            Setting::Ignore => {}
            Setting::Remove => report.push(doc.set_style(element, property, None)),
            Setting::Set(v) => report.push(doc.set_style(element, property, Some(v))),
        }
    }
    for (name, setting) in &d.properties {
        match setting {
            Setting::Ignore => {}
            Setting::Remove => report.push(doc.set_property(element, name, crate::Value::Null)),
            Setting::Set(v) => report.push(doc.set_property(element, name, v.clone())),
        }
    }
}

/// Captures what is currently set on `element` as a descriptor.
///
/// `apply(doc, el, &current(doc, el), ..)` leaves the element unchanged.
pub fn current(doc: &Document, element: ElementId) -> Descriptor {
    let mut d = Descriptor::new();
    for (name, value) in doc.attributes(element) {
        d.attributes.insert(name, Setting::Set(value));
    }
    for class in doc.classes(element) {
        d.classes.insert(class, true);
    }
    for (property, value) in doc.style(element) {
        d.style.insert(property, Setting::Set(value));
    }
    for (name, value) in doc.properties(element) {
        d.properties.insert(name, Setting::Set(value));
    }
    d
}
