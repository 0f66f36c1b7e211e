use slotmap::SecondaryMap;

use crate::{
    ApplyReport, Descriptor, Document, ElementId, Field, NodeKind, PartMap, apply, current,
    merge_pair,
};

/// State field holding the component's frozen item list.
pub const ITEMS: Field = "items";

const AUXILIARY_TAGS: [&str; 5] = ["link", "script", "slot", "style", "template"];

/// True for nodes that count as list items: elements other than the
/// auxiliary ones (`link`, `script`, `slot`, `style`, `template`).
pub fn is_substantive(doc: &Document, node: ElementId) -> bool {
    match doc.kind(node) {
        Some(NodeKind::Element { tag }) => !AUXILIARY_TAGS.contains(&tag.as_str()),
        _ => false,
    }
}

/// Filters `nodes` down to substantive elements, preserving order.
pub fn substantive_elements(doc: &Document, nodes: &[ElementId]) -> Vec<ElementId> {
    nodes
        .iter()
        .copied()
        .filter(|n| is_substantive(doc, *n))
        .collect()
}

/// Cached pre-render configuration of each item, keyed by identity.
///
/// Entries for destroyed elements disappear on their own.
#[derive(Debug, Default)]
pub struct ItemOriginals {
    map: SecondaryMap<ElementId, Descriptor>,
}

impl ItemOriginals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The item's original, captured on first sight and brought up to date
    /// with writes made to it since the last render.
    pub fn resolve(&mut self, doc: &Document, item: ElementId) -> Option<&Descriptor> {
        if !doc.contains(item) {
            return None;
        }
        if !self.map.contains_key(item) {
            doc.set_tracked(item, true);
            let captured = current(doc, item);
            // the capture already reflects anything recorded so far
            doc.take_external_mutations(item);
            self.map.insert(item, captured);
        }
        let original = self.map.get_mut(item)?;
        for m in doc.take_external_mutations(item) {
            original.record(&m);
        }
        Some(original)
    }

    pub fn get(&self, item: ElementId) -> Option<&Descriptor> {
        self.map.get(item)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Updates each item in place: its original goes beneath the descriptor
/// computed for it, then the result is applied. Items are never recreated.
pub fn reconcile_items(
    doc: &Document,
    items: &[ElementId],
    originals: &mut ItemOriginals,
    mut compute: impl FnMut(ElementId, usize, &Descriptor) -> Descriptor,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for (index, item) in items.iter().copied().enumerate() {
        let Some(original) = originals.resolve(doc, item) else {
            log::debug!("skipping destroyed item {item:?}");
            continue;
        };
        let original = original.clone();
        let computed = compute(item, index, &original);
        let update = merge_pair(&original, &computed);
        report.absorb(apply(doc, item, &update, &PartMap::default()));
    }
    report
}
