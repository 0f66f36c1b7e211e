//! Replaceable shadow parts whose element type is chosen through state.

use std::cell::RefCell;
use std::fmt;

use trellis_core::{
    Behavior, Changed, Component, Document, ElementId, Field, PartType, PartTypes, Patch, State,
    Value,
};

/// Builds shadow part `part` and keeps it an instance of the type named by
/// state field `field`.
///
/// The field holds either a registered template name or a tag name. The part
/// is only rebuilt when the resolved type changes; the replacement keeps the
/// old element's attributes and children.
pub struct PartRole {
    part: &'static str,
    field: Field,
    default: String,
    templates: Vec<PartType>,
    types: RefCell<PartTypes>,
}

impl PartRole {
    pub fn new(part: &'static str, field: Field, default_tag: &str) -> Self {
        Self {
            part,
            field,
            default: default_tag.to_ascii_lowercase(),
            templates: Vec::new(),
            types: RefCell::new(PartTypes::new()),
        }
    }

    /// Makes `template` selectable by its name.
    pub fn template(mut self, template: PartType) -> Self {
        self.templates.push(template);
        self
    }

    /// Type named by `role`: a registered template, otherwise a tag.
    pub fn resolve(&self, role: &str) -> PartType {
        self.templates
            .iter()
            .find(|t| matches!(t, PartType::Template { name, .. } if *name == role))
            .cloned()
            .unwrap_or_else(|| PartType::tag(role))
    }

    fn wanted(&self, state: &State) -> PartType {
        self.resolve(state.str(self.field).unwrap_or(&self.default))
    }
}

impl fmt::Debug for PartRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartRole")
            .field("part", &self.part)
            .field("field", &self.field)
            .field("templates", &self.templates)
            .finish()
    }
}

impl Behavior for PartRole {
    fn name(&self) -> &'static str {
        "PartRole"
    }

    fn default_state(&self, defaults: &mut Patch) {
        defaults.insert(self.field, Value::from(self.default.as_str()));
    }

    fn template(&self, doc: &Document, shadow_root: ElementId) {
        let ty = self.resolve(&self.default);
        let el = ty.instantiate(doc);
        if let Err(e) = doc.set_attribute(el, "id", self.part) {
            log::warn!("part `{}`: {e}", self.part);
        }
        doc.append_child(shadow_root, el);
        self.types.borrow_mut().assume(self.part, ty);
    }

    fn rendering(&self, component: &Component, changed: &Changed) {
        if !changed.contains(self.field) {
            return;
        }
        let wanted = self.wanted(&component.state());
        let parts = component.part_map();
        if self
            .types
            .borrow_mut()
            .ensure(component.document(), &parts, self.part, &wanted)
            .is_some()
        {
            component.refresh_parts();
        }
    }
}
