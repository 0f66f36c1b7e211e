use std::fmt;
use std::rc::Rc;

use crate::{Changed, ConvergenceError, Patch, Reaction, State};

pub type ValidatorFn = dyn Fn(&State) -> Option<Patch>;

/// Named state refinement, run after reactions have settled.
#[derive(Clone)]
pub struct Validator {
    pub unit: &'static str,
    f: Rc<ValidatorFn>,
}

impl Validator {
    pub fn new(unit: &'static str, f: impl Fn(&State) -> Option<Patch> + 'static) -> Self {
        Self {
            unit,
            f: Rc::new(f),
        }
    }

    pub fn run(&self, state: &State) -> Option<Patch> {
        (self.f)(state)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").field("unit", &self.unit).finish()
    }
}

/// Outcome of running a patch through reactions and validators.
#[derive(Clone, Debug)]
pub struct Convergence {
    pub state: State,
    /// Fields touched during convergence.
    pub changed: Changed,
    /// Passes in which reactions or validators changed something.
    pub passes: usize,
    pub error: Option<ConvergenceError>,
}

/// Effects resolver plus validator loop.
///
/// Reactions run in composition order, all against the same proposed
/// snapshot; their patches merge with later units winning. The whole set
/// re-runs until nothing changes, then validators refine the result. A
/// correction sends the loop back through the reactions.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    reactions: Vec<Reaction>,
    validators: Vec<Validator>,
    limit: usize,
}

impl Resolver {
    pub fn new(reactions: Vec<Reaction>, validators: Vec<Validator>) -> Self {
        let limit = default_limit(reactions.len(), validators.len());
        Self {
            reactions,
            validators,
            limit,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Proposes `patch` over `current` and iterates to a fixed point.
    ///
    /// Never loops forever: past the pass limit the last computed snapshot
    /// is returned together with a [`ConvergenceError`].
    pub fn converge(&self, current: &State, patch: &Patch) -> Convergence {
        let mut state = current.clone();
        let mut changed = Changed::new();
        let mut pending = patch.clone();
        let mut passes = 0;
        let mut first = true;

        loop {
            let delta = state.diff(&pending);
            if delta.is_empty() {
                match self.refine(&state) {
                    Some(correction) if !state.diff(&correction).is_empty() => {
                        log::trace!("validators corrected {:?}", state.diff(&correction));
                        pending = correction;
                        continue;
                    }
                    _ => break,
                }
            }

            if !first {
                passes += 1;
                if passes > self.limit {
                    let error = ConvergenceError {
                        passes: passes - 1,
                        still_changing: delta.to_vec(),
                    };
                    log::error!("{error}");
                    return Convergence {
                        state,
                        changed,
                        passes: passes - 1,
                        error: Some(error),
                    };
                }
            }
            first = false;

            state = state.with(&pending);
            changed.extend(&delta);
            pending = self.react(&state, &delta);
        }

        Convergence {
            state,
            changed,
            passes,
            error: None,
        }
    }

    fn react(&self, state: &State, delta: &Changed) -> Patch {
        let mut out = Patch::new();
        for reaction in &self.reactions {
            if reaction.triggered_by(delta)
                && let Some(p) = reaction.run(state, delta)
            {
                out.merge(p);
            }
        }
        out
    }

    fn refine(&self, state: &State) -> Option<Patch> {
        let mut staged = state.clone();
        let mut correction: Option<Patch> = None;
        for validator in &self.validators {
            if let Some(p) = validator.run(&staged) {
                if staged.diff(&p).is_empty() {
                    continue;
                }
                staged = staged.with(&p);
                correction.get_or_insert_with(Patch::new).merge(p);
            }
        }
        correction
    }
}

/// Twice the number of contributors: an acyclic chain needs at most one pass
/// per reaction, and a validator correction may replay the chain once.
pub fn default_limit(reactions: usize, validators: usize) -> usize {
    (reactions + validators).max(1) * 2
}
