use std::cell::RefCell;
use std::rc::Rc;

/// Cleanup list tied to one attachment of a component.
///
/// Units register disposers in `attached` (listeners, timers); they run on
/// detach, most recent first.
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn len(&self) -> usize {
        self.inner.disposers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every disposer once. Disposers added meanwhile run too.
    pub fn dispose(&self) {
        loop {
            let next = self.inner.disposers.borrow_mut().pop();
            match next {
                Some(d) => d(),
                None => break,
            }
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("disposers", &self.len())
            .finish()
    }
}
