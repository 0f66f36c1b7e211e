use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Document, ElementId, PartMap, apply, current};

/// What to build for a replaceable shadow part.
#[derive(Clone)]
pub enum PartType {
    /// A plain element with this tag.
    Tag(String),
    /// A prebuilt template; two templates are the same type only if they
    /// share the same builder.
    Template {
        name: &'static str,
        build: Rc<dyn Fn(&Document) -> ElementId>,
    },
}

impl PartType {
    pub fn tag(tag: &str) -> Self {
        PartType::Tag(tag.to_ascii_lowercase())
    }

    pub fn template(name: &'static str, build: impl Fn(&Document) -> ElementId + 'static) -> Self {
        PartType::Template {
            name,
            build: Rc::new(build),
        }
    }

    pub fn instantiate(&self, doc: &Document) -> ElementId {
        match self {
            PartType::Tag(tag) => doc.create_element(tag),
            PartType::Template { build, .. } => build(doc),
        }
    }
}

impl PartialEq for PartType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PartType::Tag(a), PartType::Tag(b)) => a == b,
            (PartType::Template { build: a, .. }, PartType::Template { build: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartType::Tag(t) => f.debug_tuple("Tag").field(t).finish(),
            PartType::Template { name, .. } => f.debug_tuple("Template").field(name).finish(),
        }
    }
}

/// Remembers which type each replaceable part currently has, so a part is
/// rebuilt only when its requested type actually changes.
#[derive(Debug, Default)]
pub struct PartTypes {
    applied: HashMap<String, PartType>,
}

impl PartTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self, id: &str) -> Option<&PartType> {
        self.applied.get(id)
    }

    /// Records that part `id` was built as `ty` without checking the element.
    pub fn assume(&mut self, id: &str, ty: PartType) {
        self.applied.insert(id.to_string(), ty);
    }

    /// Makes part `id` an instance of `wanted`. Returns the replacement
    /// element when a swap happened.
    ///
    /// The replacement takes over the old element's attributes, classes,
    /// style, and children, and its place in the tree.
    pub fn ensure(
        &mut self,
        doc: &Document,
        parts: &PartMap,
        id: &str,
        wanted: &PartType,
    ) -> Option<ElementId> {
        let existing = parts.get(id)?;
        let applied = self.applied.get(id).cloned();
        match applied {
            Some(applied) if &applied == wanted => return None,
            None if matches!(wanted, PartType::Tag(t) if doc.tag(existing).as_deref() == Some(t.as_str())) => {
                self.applied.insert(id.to_string(), wanted.clone());
                return None;
            }
            _ => {}
        }

        let replacement = wanted.instantiate(doc);
        let carried = current(doc, existing);
        let report = apply(doc, replacement, &carried, &PartMap::default());
        if !report.is_ok() {
            log::warn!("part `{id}`: {} entries not carried over", report.errors.len());
        }
        for child in doc.children(existing) {
            doc.append_child(replacement, child);
        }
        doc.replace_child(existing, replacement);
        doc.remove(existing);
        log::debug!("part `{id}` swapped to {wanted:?}");

        self.applied.insert(id.to_string(), wanted.clone());
        Some(replacement)
    }
}
