//! Ordered teardown actions drained once at process end.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

type Action = Box<dyn FnOnce() + Send>;

/// Stack of teardown actions.
///
/// Actions run in reverse registration order, exactly once; draining consumes
/// the stack so nothing can run twice, and a panicking action does not stop
/// the ones registered before it.
#[derive(Default)]
pub struct CleanupStack {
    actions: Vec<(&'static str, Action)>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action to run at teardown. Register at the point where the
    /// action's precondition becomes true.
    pub fn defer(&mut self, label: &'static str, action: impl FnOnce() + Send + 'static) {
        debug!(target: "rewind::cleanup", action = label, "registered cleanup action");
        self.actions.push((label, Box::new(action)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drain the stack, newest registration first.
    pub fn run(mut self) {
        while let Some((label, action)) = self.actions.pop() {
            if catch_unwind(AssertUnwindSafe(action)).is_err() {
                warn!(target: "rewind::cleanup", action = label, "cleanup action panicked");
            }
        }
    }
}
