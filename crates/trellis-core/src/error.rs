use thiserror::Error;

use crate::{Capability, ElementId, Field};

/// A unit needs a capability that no unit in the composition provides.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unit `{unit}` requires `{capability}`, which no unit in the composition provides")]
pub struct MissingCapability {
    pub unit: &'static str,
    pub capability: Capability,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("{0}")]
    Missing(MissingCapability),
    #[error("{} missing capabilities: {}", .0.len(), join(.0))]
    Many(Vec<MissingCapability>),
}

impl CompositionError {
    pub fn missing(&self) -> &[MissingCapability] {
        match self {
            CompositionError::Missing(m) => std::slice::from_ref(m),
            CompositionError::Many(v) => v,
        }
    }
}

impl From<Vec<MissingCapability>> for CompositionError {
    fn from(mut v: Vec<MissingCapability>) -> Self {
        if v.len() == 1 {
            CompositionError::Missing(v.remove(0))
        } else {
            CompositionError::Many(v)
        }
    }
}

fn join(v: &[MissingCapability]) -> String {
    v.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// The effects/validator loop did not settle within its pass limit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("state did not converge after {passes} passes; still changing: {still_changing:?}")]
pub struct ConvergenceError {
    pub passes: usize,
    pub still_changing: Vec<Field>,
}

/// A single descriptor entry the element rejected. Other entries still apply.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("element {0:?} no longer exists")]
    MissingElement(ElementId),
    #[error("node {0:?} is not an element")]
    NotAnElement(ElementId),
    #[error("invalid attribute name `{0}`")]
    InvalidAttribute(String),
    #[error("invalid class name `{0}`")]
    InvalidClass(String),
    #[error("invalid style `{property}: {value}`")]
    InvalidStyle { property: String, value: String },
    #[error("no part with id `{0}`")]
    UnknownPart(String),
}

/// An asynchronous lifecycle hook rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("lifecycle hook of `{unit}` failed: {message}")]
pub struct LifecycleError {
    pub unit: &'static str,
    pub message: String,
}

impl LifecycleError {
    pub fn new(unit: &'static str, message: impl Into<String>) -> Self {
        Self {
            unit,
            message: message.into(),
        }
    }
}

/// Problems that are reported rather than returned from state mutation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Composition(#[from] CompositionError),
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}
