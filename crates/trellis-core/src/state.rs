use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::Value;

/// Names a state field. Units declare their fields as constants.
pub type Field = &'static str;

/// Immutable state snapshot owned by one component.
///
/// Cloning is cheap; every change produces a new snapshot via [`State::with`].
#[derive(Clone, Default, PartialEq)]
pub struct State(Rc<BTreeMap<Field, Value>>);

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns `Value::Null` for fields that were never set.
    pub fn value(&self, field: &str) -> Value {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_int)
    }

    pub fn bool(&self, field: &str) -> bool {
        self.get(field).is_some_and(Value::truthy)
    }

    pub fn str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Frozen element list stored under `field`, empty when absent or null.
    pub fn elements(&self, field: &str) -> &[crate::ElementId] {
        self.get(field).and_then(Value::as_elements).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fields of `patch` whose value differs from this snapshot.
    pub fn diff(&self, patch: &Patch) -> Changed {
        let mut changed = Changed::new();
        for (field, value) in patch.iter() {
            let differs = match self.0.get(field) {
                Some(current) => current != value,
                None => true,
            };
            if differs {
                changed.insert(field);
            }
        }
        changed
    }

    /// Shallow merge of `patch` over this snapshot.
    pub fn with(&self, patch: &Patch) -> State {
        if patch.is_empty() {
            return self.clone();
        }
        let mut map = (*self.0).clone();
        for (field, value) in patch.iter() {
            map.insert(field, value.clone());
        }
        State(Rc::new(map))
    }

    /// Every field whose value differs between the two snapshots.
    pub fn changes_since(&self, previous: &State) -> Changed {
        let mut changed = Changed::new();
        for (field, value) in self.0.iter() {
            if previous.0.get(field) != Some(value) {
                changed.insert(field);
            }
        }
        for field in previous.0.keys() {
            if !self.0.contains_key(field) {
                changed.insert(field);
            }
        }
        changed
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl From<Patch> for State {
    fn from(patch: Patch) -> Self {
        State::new().with(&patch)
    }
}

/// Partial state update, merged shallowly over a snapshot.
///
/// Setting the same field twice keeps the later value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    entries: SmallVec<[(Field, Value); 4]>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn insert(&mut self, field: Field, value: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = value;
        } else {
            self.entries.push((field, value));
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    /// Folds `other` into this patch; `other` wins on shared fields.
    pub fn merge(&mut self, other: Patch) {
        for (field, value) in other.entries {
            self.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.entries.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of field names that changed during an update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changed(SmallVec<[Field; 8]>);

impl Changed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field) {
        if !self.0.contains(&field) {
            self.0.push(field);
        }
    }

    pub fn extend(&mut self, other: &Changed) {
        for field in other.iter() {
            self.insert(field);
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| *f == field)
    }

    /// True when any of `fields` changed.
    pub fn any(&self, fields: &[Field]) -> bool {
        fields.iter().any(|f| self.contains(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Field> {
        self.0.to_vec()
    }
}

impl FromIterator<Field> for Changed {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        let mut changed = Changed::new();
        for field in iter {
            changed.insert(field);
        }
        changed
    }
}

/// Holds the committed snapshot of one component.
///
/// The store accepts any field; invariants are enforced by the convergence
/// loop before a snapshot is committed.
#[derive(Debug, Default)]
pub struct StateStore {
    current: State,
}

impl StateStore {
    pub fn new(defaults: State) -> Self {
        Self { current: defaults }
    }

    pub fn snapshot(&self) -> State {
        self.current.clone()
    }

    /// Replaces the committed snapshot, returning the fields that differ.
    pub fn commit(&mut self, next: State) -> Changed {
        let changed = next.changes_since(&self.current);
        self.current = next;
        changed
    }
}
