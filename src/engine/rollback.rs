//! Compensation stack for multi-step operations.
//!
//! Each step that mutates the filesystem, the manifest or the index pushes
//! a compensating action.  On success the stack is disarmed; on failure the
//! compensations run in reverse order.  A compensation that fails is logged
//! and the remaining ones still run.
use crate::error::{LnkError, Result};

type Undo<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

/// Outcome of unwinding a [`Rollback`].
#[derive(Debug, Default)]
pub struct RollbackResult {
    /// Compensations that ran successfully, in execution order.
    pub rolled_back: Vec<String>,
    /// Compensations that failed, with their errors.
    pub failed: Vec<(String, LnkError)>,
}

impl RollbackResult {
    /// Returns `true` if every compensation succeeded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Ordered list of pending compensations.
#[derive(Default)]
pub struct Rollback<'a> {
    steps: Vec<(String, Undo<'a>)>,
}

impl std::fmt::Debug for Rollback<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|(d, _)| d))
            .finish()
    }
}

impl<'a> Rollback<'a> {
    /// Empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Register a compensation for a step that has happened (or is about to).
    pub fn push(&mut self, description: impl Into<String>, undo: impl FnOnce() -> Result<()> + 'a) {
        self.steps.push((description.into(), Box::new(undo)));
    }

    /// Drop every compensation without running it.
    pub fn disarm(self) {
        tracing::debug!("committed {} step(s)", self.steps.len());
    }

    /// Run every compensation in reverse order.
    pub fn unwind(self) -> RollbackResult {
        let mut result = RollbackResult::default();
        for (description, undo) in self.steps.into_iter().rev() {
            match undo() {
                Ok(()) => {
                    tracing::debug!("rolled back: {description}");
                    result.rolled_back.push(description);
                }
                Err(e) => {
                    tracing::warn!("rollback step '{description}' failed: {e}");
                    result.failed.push((description, e));
                }
            }
        }
        result
    }

    /// Disarm on `Ok`, unwind on `Err`.  The original result is returned
    /// unchanged either way.
    ///
    /// # Errors
    ///
    /// Returns the error carried by `result`.
    pub fn settle<T>(self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.disarm();
                Ok(value)
            }
            Err(e) => {
                let outcome = self.unwind();
                if !outcome.is_complete() {
                    tracing::warn!(
                        "partial rollback: {} succeeded, {} failed",
                        outcome.rolled_back.len(),
                        outcome.failed.len()
                    );
                }
                Err(e)
            }
        }
    }
}
