pub use crate::apply::{ApplyReport, PartMap, apply, current};
pub use crate::behavior::{Behavior, Capability, ItemCalcs, Reaction, SettleFuture};
pub use crate::component::{Component, ComponentBuilder, Phase, RenderEvent, RenderStats};
pub use crate::descriptor::{Descriptor, Setting, merge, merge_pair};
pub use crate::document::{Document, ElementId, NodeKind};
pub use crate::error::{
    ApplyError, CompositionError, ConvergenceError, Diagnostic, LifecycleError,
};
pub use crate::input::keyboard_active;
pub use crate::items::{ITEMS, is_substantive};
pub use crate::parts::PartType;
pub use crate::runtime::{queue_microtask, run_microtasks, turn};
pub use crate::state::{Changed, Field, Patch, State};
pub use crate::value::Value;
