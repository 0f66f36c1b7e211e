//! # Element document
//!
//! Trellis reconciles against a small in-memory element tree rather than a
//! browser DOM. `Document` is a cloneable handle to an arena of
//! nodes addressed by `ElementId`:
//!
//! ```rust
//! use trellis_core::*;
//!
//! let doc = Document::new();
//! let el = doc.create_element("div");
//! doc.append_child(doc.body(), el);
//! doc.set_attribute(el, "title", "hello").unwrap();
//! assert_eq!(doc.attribute(el, "title").as_deref(), Some("hello"));
//! ```
//!
//! Writes made outside an apply pass on a *tracked* element are logged as
//! [`Mutation`]s so components can fold them into their original
//! configuration before the next render.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use bitflags::bitflags;
use slotmap::{SecondaryMap, SlotMap};

use crate::{ApplyError, Value};

slotmap::new_key_type! {
    /// Stable identity of a node for as long as it lives in its document.
    pub struct ElementId;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text(String),
    Comment(String),
    /// Root of a host's shadow tree.
    ShadowRoot,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// External writes are recorded for this node.
        const TRACKED = 1 << 0;
        /// Node is the document body.
        const ROOT = 1 << 1;
    }
}

/// A write made to a tracked element outside of an apply pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Attribute { name: String, value: Option<String> },
    Class { name: String, present: bool },
    Style { property: String, value: Option<String> },
    Property { name: String, value: Value },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    style: BTreeMap<String, String>,
    properties: BTreeMap<String, Value>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
    /// Set on shadow roots.
    host: Option<ElementId>,
    shadow_root: Option<ElementId>,
    flags: NodeFlags,
    /// Structure version of the last change at or below this node. Shadow
    /// trees below it do not count.
    version: u64,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            style: BTreeMap::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            host: None,
            shadow_root: None,
            flags: NodeFlags::empty(),
            version: 0,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

#[derive(Debug)]
struct Inner {
    nodes: SlotMap<ElementId, Node>,
    body: ElementId,
    applying: usize,
    structure_version: u64,
    external: SecondaryMap<ElementId, Vec<Mutation>>,
}

#[derive(Clone, Debug)]
pub struct Document(Rc<RefCell<Inner>>);

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut body = Node::new(NodeKind::Element { tag: "body".into() });
        body.flags |= NodeFlags::ROOT;
        let body = nodes.insert(body);
        Self(Rc::new(RefCell::new(Inner {
            nodes,
            body,
            applying: 0,
            structure_version: 0,
            external: SecondaryMap::new(),
        })))
    }

    pub fn body(&self) -> ElementId {
        self.0.borrow().body
    }

    // --- structure ---------------------------------------------------------

    pub fn create_element(&self, tag: &str) -> ElementId {
        self.insert(Node::new(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        }))
    }

    pub fn create_text(&self, text: &str) -> ElementId {
        self.insert(Node::new(NodeKind::Text(text.to_string())))
    }

    pub fn create_comment(&self, text: &str) -> ElementId {
        self.insert(Node::new(NodeKind::Comment(text.to_string())))
    }

    fn insert(&self, node: Node) -> ElementId {
        self.0.borrow_mut().nodes.insert(node)
    }

    /// Returns the host's shadow root, creating it on first call.
    pub fn attach_shadow(&self, host: ElementId) -> Option<ElementId> {
        let mut inner = self.0.borrow_mut();
        let existing = inner.nodes.get(host)?.shadow_root;
        if existing.is_some() {
            return existing;
        }
        let mut root = Node::new(NodeKind::ShadowRoot);
        root.host = Some(host);
        let root = inner.nodes.insert(root);
        if let Some(h) = inner.nodes.get_mut(host) {
            h.shadow_root = Some(root);
        }
        touch_locked(&mut inner, host);
        Some(root)
    }

    pub fn shadow_root(&self, host: ElementId) -> Option<ElementId> {
        self.0.borrow().nodes.get(host).and_then(|n| n.shadow_root)
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&self, parent: ElementId, child: ElementId) {
        let mut inner = self.0.borrow_mut();
        if !inner.nodes.contains_key(parent) || !inner.nodes.contains_key(child) {
            return;
        }
        detach_locked(&mut inner, child);
        if let Some(p) = inner.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = inner.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        touch_locked(&mut inner, parent);
    }

    /// Puts `new` in `old`'s place under the same parent. `old` is left detached.
    pub fn replace_child(&self, old: ElementId, new: ElementId) {
        let mut inner = self.0.borrow_mut();
        let Some(parent) = inner.nodes.get(old).and_then(|n| n.parent) else {
            return;
        };
        detach_locked(&mut inner, new);
        if let Some(p) = inner.nodes.get_mut(parent)
            && let Some(pos) = p.children.iter().position(|c| *c == old)
        {
            p.children[pos] = new;
        }
        if let Some(n) = inner.nodes.get_mut(new) {
            n.parent = Some(parent);
        }
        if let Some(o) = inner.nodes.get_mut(old) {
            o.parent = None;
        }
        touch_locked(&mut inner, parent);
    }

    /// Detaches `child` from its parent without destroying it.
    pub fn detach(&self, child: ElementId) {
        let mut inner = self.0.borrow_mut();
        detach_locked(&mut inner, child);
    }

    /// Destroys a node and its whole subtree, including shadow trees.
    pub fn remove(&self, id: ElementId) {
        let mut inner = self.0.borrow_mut();
        detach_locked(&mut inner, id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = inner.nodes.remove(next) {
                stack.extend(node.children);
                stack.extend(node.shadow_root);
            }
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.0.borrow().nodes.contains_key(id)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.0.borrow().nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.0
            .borrow()
            .nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Descendants of `id` in document order, not crossing into shadow trees.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let inner = self.0.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = inner
            .nodes
            .get(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(n) = inner.nodes.get(next) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// True when the node is reachable from the body, through shadow hosts.
    pub fn is_connected(&self, id: ElementId) -> bool {
        let inner = self.0.borrow();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = inner.nodes.get(current) else {
                return false;
            };
            if node.flags.contains(NodeFlags::ROOT) {
                return true;
            }
            cursor = node.parent.or(node.host);
        }
        false
    }

    pub fn kind(&self, id: ElementId) -> Option<NodeKind> {
        self.0.borrow().nodes.get(id).map(|n| n.kind.clone())
    }

    pub fn tag(&self, id: ElementId) -> Option<String> {
        match self.0.borrow().nodes.get(id)?.kind {
            NodeKind::Element { ref tag } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn text(&self, id: ElementId) -> Option<String> {
        match self.0.borrow().nodes.get(id)?.kind {
            NodeKind::Text(ref t) | NodeKind::Comment(ref t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Bumped on every structural change (insert/move/remove/shadow) and on
    /// `id` attribute writes.
    pub fn structure_version(&self) -> u64 {
        self.0.borrow().structure_version
    }

    /// Version of the last structural change inside `root`'s subtree.
    ///
    /// Changes in a host's light DOM do not move its shadow root's version,
    /// and changes inside a shadow tree do not move the host's. `None` once
    /// `root` is destroyed.
    pub fn subtree_version(&self, root: ElementId) -> Option<u64> {
        self.0.borrow().nodes.get(root).map(|n| n.version)
    }

    // --- mutation tracking -------------------------------------------------

    pub fn set_tracked(&self, id: ElementId, tracked: bool) {
        if let Some(n) = self.0.borrow_mut().nodes.get_mut(id) {
            n.flags.set(NodeFlags::TRACKED, tracked);
        }
    }

    /// Marks the start of an apply pass; writes until the guard drops are not
    /// recorded as external.
    pub fn begin_apply(&self) -> ApplyGuard {
        self.0.borrow_mut().applying += 1;
        ApplyGuard { doc: self.clone() }
    }

    pub fn is_applying(&self) -> bool {
        self.0.borrow().applying > 0
    }

    /// Drains external writes recorded for `id`, oldest first.
    pub fn take_external_mutations(&self, id: ElementId) -> Vec<Mutation> {
        self.0.borrow_mut().external.remove(id).unwrap_or_default()
    }

    fn record(inner: &mut Inner, id: ElementId, mutation: Mutation) {
        if inner.applying > 0 {
            return;
        }
        let tracked = inner
            .nodes
            .get(id)
            .is_some_and(|n| n.flags.contains(NodeFlags::TRACKED));
        if !tracked {
            return;
        }
        if let Some(entry) = inner.external.entry(id) {
            entry.or_default().push(mutation);
        }
    }

    fn with_element<R>(
        &self,
        id: ElementId,
        f: impl FnOnce(&mut Inner) -> Result<R, ApplyError>,
    ) -> Result<R, ApplyError> {
        let mut inner = self.0.borrow_mut();
        match inner.nodes.get(id) {
            None => Err(ApplyError::MissingElement(id)),
            Some(n) if !n.is_element() => Err(ApplyError::NotAnElement(id)),
            Some(_) => f(&mut *inner),
        }
    }

    // --- attributes --------------------------------------------------------

    pub fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> Result<(), ApplyError> {
        if !valid_name(name) {
            return Err(ApplyError::InvalidAttribute(name.to_string()));
        }
        match name {
            "class" => {
                let wanted: BTreeSet<String> = value.split_whitespace().map(String::from).collect();
                self.replace_classes(id, wanted)
            }
            "style" => self.replace_style(id, parse_style(value)),
            _ => self.with_element(id, |inner| {
                let previous = inner
                    .nodes
                    .get_mut(id)
                    .and_then(|n| n.attributes.insert(name.to_string(), value.to_string()));
                if name == "id" && previous.as_deref() != Some(value) {
                    touch_locked(inner, id);
                }
                Self::record(
                    inner,
                    id,
                    Mutation::Attribute {
                        name: name.to_string(),
                        value: Some(value.to_string()),
                    },
                );
                Ok(())
            }),
        }
    }

    pub fn remove_attribute(&self, id: ElementId, name: &str) -> Result<(), ApplyError> {
        match name {
            "class" => self.replace_classes(id, BTreeSet::new()),
            "style" => self.replace_style(id, BTreeMap::new()),
            _ => self.with_element(id, |inner| {
                let removed = inner
                    .nodes
                    .get_mut(id)
                    .and_then(|n| n.attributes.remove(name))
                    .is_some();
                if removed {
                    if name == "id" {
                        touch_locked(inner, id);
                    }
                    Self::record(
                        inner,
                        id,
                        Mutation::Attribute {
                            name: name.to_string(),
                            value: None,
                        },
                    );
                }
                Ok(())
            }),
        }
    }

    /// Reads an attribute; `class` and `style` are serialized from their
    /// dedicated stores.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        let inner = self.0.borrow();
        let n = inner.nodes.get(id)?;
        match name {
            "class" if !n.classes.is_empty() => {
                Some(n.classes.iter().cloned().collect::<Vec<_>>().join(" "))
            }
            "style" if !n.style.is_empty() => Some(
                n.style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v};"))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            "class" | "style" => None,
            _ => n.attributes.get(name).cloned(),
        }
    }

    /// Plain attributes, excluding `class` and `style`.
    pub fn attributes(&self, id: ElementId) -> Vec<(String, String)> {
        self.0
            .borrow()
            .nodes
            .get(id)
            .map(|n| {
                n.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- classes -----------------------------------------------------------

    pub fn toggle_class(&self, id: ElementId, name: &str, present: bool) -> Result<(), ApplyError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ApplyError::InvalidClass(name.to_string()));
        }
        self.with_element(id, |inner| {
            let changed = inner.nodes.get_mut(id).is_some_and(|n| {
                if present {
                    n.classes.insert(name.to_string())
                } else {
                    n.classes.remove(name)
                }
            });
            if changed {
                Self::record(
                    inner,
                    id,
                    Mutation::Class {
                        name: name.to_string(),
                        present,
                    },
                );
            }
            Ok(())
        })
    }

    fn replace_classes(&self, id: ElementId, wanted: BTreeSet<String>) -> Result<(), ApplyError> {
        let current: BTreeSet<String> = self.classes(id).into_iter().collect();
        for name in current.difference(&wanted) {
            self.toggle_class(id, name, false)?;
        }
        for name in wanted.difference(&current) {
            self.toggle_class(id, name, true)?;
        }
        Ok(())
    }

    pub fn has_class(&self, id: ElementId, name: &str) -> bool {
        self.0
            .borrow()
            .nodes
            .get(id)
            .is_some_and(|n| n.classes.contains(name))
    }

    pub fn classes(&self, id: ElementId) -> Vec<String> {
        self.0
            .borrow()
            .nodes
            .get(id)
            .map(|n| n.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    // --- style -------------------------------------------------------------

    /// Sets (`Some`) or clears (`None`) one inline style property.
    pub fn set_style(&self, id: ElementId, property: &str, value: Option<&str>) -> Result<(), ApplyError> {
        if !valid_style_property(property) || value.is_some_and(|v| v.contains([';', '{', '}'])) {
            return Err(ApplyError::InvalidStyle {
                property: property.to_string(),
                value: value.unwrap_or_default().to_string(),
            });
        }
        self.with_element(id, |inner| {
            let changed = inner.nodes.get_mut(id).is_some_and(|n| match value {
                Some(v) => n.style.insert(property.to_string(), v.to_string()).as_deref() != Some(v),
                None => n.style.remove(property).is_some(),
            });
            if changed {
                Self::record(
                    inner,
                    id,
                    Mutation::Style {
                        property: property.to_string(),
                        value: value.map(String::from),
                    },
                );
            }
            Ok(())
        })
    }

    fn replace_style(&self, id: ElementId, wanted: BTreeMap<String, String>) -> Result<(), ApplyError> {
        for (property, _) in self.style(id) {
            if !wanted.contains_key(&property) {
                self.set_style(id, &property, None)?;
            }
        }
        for (property, value) in &wanted {
            self.set_style(id, property, Some(value))?;
        }
        Ok(())
    }

    pub fn style_value(&self, id: ElementId, property: &str) -> Option<String> {
        self.0.borrow().nodes.get(id)?.style.get(property).cloned()
    }

    pub fn style(&self, id: ElementId) -> Vec<(String, String)> {
        self.0
            .borrow()
            .nodes
            .get(id)
            .map(|n| n.style.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    // --- properties --------------------------------------------------------

    pub fn set_property(&self, id: ElementId, name: &str, value: Value) -> Result<(), ApplyError> {
        self.with_element(id, |inner| {
            let changed = inner.nodes.get_mut(id).is_some_and(|n| {
                if value.is_null() {
                    n.properties.remove(name).is_some()
                } else {
                    n.properties.insert(name.to_string(), value.clone()).as_ref() != Some(&value)
                }
            });
            if changed {
                Self::record(
                    inner,
                    id,
                    Mutation::Property {
                        name: name.to_string(),
                        value,
                    },
                );
            }
            Ok(())
        })
    }

    pub fn property(&self, id: ElementId, name: &str) -> Option<Value> {
        self.0.borrow().nodes.get(id)?.properties.get(name).cloned()
    }

    pub fn properties(&self, id: ElementId) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .nodes
            .get(id)
            .map(|n| {
                n.properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn detach_locked(inner: &mut Inner, child: ElementId) {
    let Some(parent) = inner.nodes.get(child).and_then(|n| n.parent) else {
        return;
    };
    if let Some(p) = inner.nodes.get_mut(parent) {
        p.children.retain(|c| *c != child);
    }
    if let Some(c) = inner.nodes.get_mut(child) {
        c.parent = None;
    }
    touch_locked(inner, parent);
}

/// Records a structural change at `node`: bumps the document version and
/// stamps it on `node` and its ancestors. The walk stops at the tree's top,
/// so it never crosses from a shadow root to its host.
fn touch_locked(inner: &mut Inner, node: ElementId) {
    inner.structure_version += 1;
    let version = inner.structure_version;
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        let Some(n) = inner.nodes.get_mut(current) else {
            break;
        };
        n.version = version;
        cursor = n.parent;
    }
}

/// Ends an apply pass when dropped.
#[derive(Debug)]
pub struct ApplyGuard {
    doc: Document,
}

impl Drop for ApplyGuard {
    fn drop(&mut self) {
        let mut inner = self.doc.0.borrow_mut();
        inner.applying = inner.applying.saturating_sub(1);
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn valid_style_property(property: &str) -> bool {
    if let Some(custom) = property.strip_prefix("--") {
        return !custom.is_empty() && !custom.contains([':', ';', ' ']);
    }
    !property.is_empty()
        && property
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn parse_style(text: &str) -> BTreeMap<String, String> {
    text.split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let (k, v) = (k.trim(), v.trim());
            (!k.is_empty() && !v.is_empty()).then(|| (k.to_string(), v.to_string()))
        })
        .collect()
}
