//! Deferred, cached evaluation of a related resource.
//!
//! # Design
//! A `LazyCell` holds a loader and runs it on first access only. The
//! state mutex is never held while the loader runs. The cell remembers which
//! thread is resolving: a loader that reaches back into its own cell gets
//! `RelationCycle` instead of a deadlock, while other threads block on a
//! condvar until the outcome is known. Once resolved the value lives in a
//! `OnceLock` and is handed out by reference for the lifetime of the cell.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock};
use std::thread::{self, ThreadId};

use crate::error::RestError;

type Loader<T> = Box<dyn Fn() -> Result<T, RestError> + Send + Sync>;

/// Observable state of a `LazyCell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazyState {
    Unresolved,
    Resolving,
    Resolved,
    Failed(String),
}

struct Slot {
    state: LazyState,
    resolver: Option<ThreadId>,
}

impl Slot {
    fn new(state: LazyState) -> Mutex<Self> {
        Mutex::new(Self { state, resolver: None })
    }
}

pub struct LazyCell<T> {
    name: String,
    value: OnceLock<T>,
    slot: Mutex<Slot>,
    settled: Condvar,
    loader: Loader<T>,
}

impl<T> LazyCell<T> {
    pub fn new(
        name: impl Into<String>,
        loader: impl Fn() -> Result<T, RestError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            value: OnceLock::new(),
            slot: Slot::new(LazyState::Unresolved),
            settled: Condvar::new(),
            loader: Box::new(loader),
        }
    }

    /// A cell that starts out resolved.
    pub fn resolved(name: impl Into<String>, value: T) -> Self {
        let name = name.into();
        let missing = name.clone();
        let cell = Self {
            name,
            value: OnceLock::new(),
            slot: Slot::new(LazyState::Resolved),
            settled: Condvar::new(),
            loader: Box::new(move || {
                Err(RestError::RelationFailed {
                    relation: missing.clone(),
                    message: "pre-resolved relation has no loader".to_string(),
                })
            }),
        };
        let _ = cell.value.set(value);
        cell
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LazyState {
        self.lock().state.clone()
    }

    /// The value, if it has already been resolved. Never triggers a load.
    pub fn peek(&self) -> Option<&T> {
        self.value.get()
    }

    /// Resolve on first access, then return the cached value. A caller on
    /// another thread waits for a resolution already in progress.
    pub fn get(&self) -> Result<&T, RestError> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let me = thread::current().id();
        let mut slot = self.lock();
        loop {
            match slot.state.clone() {
                LazyState::Unresolved => break,
                LazyState::Resolving if slot.resolver == Some(me) => {
                    return Err(RestError::RelationCycle(self.name.clone()))
                }
                LazyState::Resolving => {
                    slot = self
                        .settled
                        .wait(slot)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
                LazyState::Failed(message) => {
                    return Err(RestError::RelationFailed {
                        relation: self.name.clone(),
                        message,
                    })
                }
                LazyState::Resolved => return self.cached(),
            }
        }
        slot.state = LazyState::Resolving;
        slot.resolver = Some(me);
        drop(slot);

        tracing::trace!(relation = %self.name, "resolving lazy relation");
        let mut pending = Pending { cell: self, done: false };
        let outcome = (self.loader)();
        pending.done = true;

        let mut slot = self.lock();
        slot.resolver = None;
        let result = match outcome {
            Ok(value) => {
                let _ = self.value.set(value);
                slot.state = LazyState::Resolved;
                Ok(())
            }
            Err(err) => {
                tracing::trace!(relation = %self.name, error = %err, "lazy relation failed");
                slot.state = LazyState::Failed(err.to_string());
                Err(err)
            }
        };
        drop(slot);
        self.settled.notify_all();
        result.and_then(|()| self.cached())
    }

    fn cached(&self) -> Result<&T, RestError> {
        self.value.get().ok_or_else(|| RestError::RelationFailed {
            relation: self.name.clone(),
            message: "resolved without a value".to_string(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Marks the cell failed if the loader unwinds, so waiters do not hang.
struct Pending<'a, T> {
    cell: &'a LazyCell<T>,
    done: bool,
}

impl<T> Drop for Pending<'_, T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut slot = self.cell.lock();
        slot.resolver = None;
        slot.state = LazyState::Failed("loader panicked".to_string());
        drop(slot);
        self.cell.settled.notify_all();
    }
}

impl<T: fmt::Debug> fmt::Debug for LazyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCell")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("value", &self.value.get())
            .finish()
    }
}
