use std::collections::BTreeMap;

use crate::{Mutation, Value};

/// One leaf of a descriptor category.
///
/// `Ignore` means "no opinion" and lets a base or later value show through;
/// `Remove` explicitly clears whatever was set before.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Setting<T> {
    #[default]
    Ignore,
    Remove,
    Set(T),
}

impl<T> Setting<T> {
    pub fn is_ignore(&self) -> bool {
        matches!(self, Setting::Ignore)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Setting::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Setting<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Setting::Set(v),
            None => Setting::Remove,
        }
    }
}

/// Declarative update for one element and its named descendants.
///
/// Descriptors are rebuilt from state on every render and combined with
/// [`merge`]; they are never the source of truth.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Descriptor {
    pub attributes: BTreeMap<String, Setting<String>>,
    pub classes: BTreeMap<String, bool>,
    pub style: BTreeMap<String, Setting<String>>,
    pub properties: BTreeMap<String, Setting<Value>>,
    /// Updates for shadow descendants, keyed by element id.
    pub parts: BTreeMap<String, Descriptor>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.classes.is_empty()
            && self.style.is_empty()
            && self.properties.is_empty()
            && self.parts.is_empty()
    }

    pub fn attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes
            .insert(name.to_string(), Setting::Set(value.into()));
        self
    }

    pub fn remove_attribute(mut self, name: &str) -> Self {
        self.attributes.insert(name.to_string(), Setting::Remove);
        self
    }

    /// `None` leaves the attribute to other contributors.
    pub fn attribute_opt(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        let setting = match value {
            Some(v) => Setting::Set(v.into()),
            None => Setting::Ignore,
        };
        self.attributes.insert(name.to_string(), setting);
        self
    }

    /// Boolean attribute: present as `""` when `on`, removed otherwise.
    pub fn toggle_attribute(mut self, name: &str, on: bool) -> Self {
        let setting = if on {
            Setting::Set(String::new())
        } else {
            Setting::Remove
        };
        self.attributes.insert(name.to_string(), setting);
        self
    }

    pub fn class(mut self, name: &str, on: bool) -> Self {
        self.classes.insert(name.to_string(), on);
        self
    }

    pub fn style(mut self, property: &str, value: impl Into<String>) -> Self {
        self.style
            .insert(property.to_string(), Setting::Set(value.into()));
        self
    }

    pub fn clear_style(mut self, property: &str) -> Self {
        self.style.insert(property.to_string(), Setting::Remove);
        self
    }

    pub fn property(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.properties
            .insert(name.to_string(), Setting::Set(value.into()));
        self
    }

    /// Adds (merging) an update for the shadow descendant with `id`.
    pub fn part(mut self, id: &str, descriptor: Descriptor) -> Self {
        let slot = self.parts.entry(id.to_string()).or_default();
        merge_into(slot, &descriptor);
        self
    }

    /// Folds an external write into this descriptor, as if the author had
    /// declared it.
    pub fn record(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Attribute { name, value } => {
                self.attributes
                    .insert(name.clone(), value.clone().into());
            }
            Mutation::Class { name, present } => {
                self.classes.insert(name.clone(), *present);
            }
            Mutation::Style { property, value } => {
                self.style.insert(property.clone(), value.clone().into());
            }
            Mutation::Property { name, value } => {
                let setting = if value.is_null() {
                    Setting::Remove
                } else {
                    Setting::Set(value.clone())
                };
                self.properties.insert(name.clone(), setting);
            }
        }
    }
}

/// Folds `over` into `base`; entries in `over` win except `Ignore`.
pub fn merge_into(base: &mut Descriptor, over: &Descriptor) {
    merge_settings(&mut base.attributes, &over.attributes);
    for (name, on) in &over.classes {
        base.classes.insert(name.clone(), *on);
    }
    merge_settings(&mut base.style, &over.style);
    merge_settings(&mut base.properties, &over.properties);
    for (id, part) in &over.parts {
        merge_into(base.parts.entry(id.clone()).or_default(), part);
    }
}

fn merge_settings<T: Clone>(
    base: &mut BTreeMap<String, Setting<T>>,
    over: &BTreeMap<String, Setting<T>>,
) {
    for (key, setting) in over {
        if !setting.is_ignore() {
            base.insert(key.clone(), setting.clone());
        }
    }
}

/// Combines descriptors left to right. Later contributions win per leaf;
/// `None` contributes nothing.
///
/// ```rust
/// use trellis_core::*;
///
/// let base = Descriptor::new().attribute("role", "listbox").class("a", true);
/// let over = Descriptor::new().attribute("role", "menu");
/// let merged = merge([Some(&base), None, Some(&over)]);
/// assert_eq!(merged.attributes["role"], Setting::Set("menu".into()));
/// assert_eq!(merged.classes["a"], true);
/// ```
pub fn merge<'a>(descriptors: impl IntoIterator<Item = Option<&'a Descriptor>>) -> Descriptor {
    let mut out = Descriptor::new();
    for d in descriptors.into_iter().flatten() {
        merge_into(&mut out, d);
    }
    out
}

/// Convenience for the common two-argument case.
pub fn merge_pair(base: &Descriptor, over: &Descriptor) -> Descriptor {
    let mut out = base.clone();
    merge_into(&mut out, over);
    out
}
