use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to an entity instance tracked by a persistence session.
///
/// Every lookup of the same key within one session returns a handle to the same value.
/// Changes made through [`Tracked::modify`] or [`Tracked::set`] are picked up by the next
/// `save_changes`, which compares the current value against the snapshot taken when the
/// entity was attached.
#[derive(Debug)]
pub struct Tracked<M> {
    inner: Arc<Mutex<M>>,
}

impl<M> Clone for Tracked<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Clone> Tracked<M> {
    pub(crate) fn new(value: M) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, M> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> M {
        self.lock().clone()
    }

    /// Mutates the tracked value in place.
    pub fn modify<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.lock())
    }

    /// Replaces the tracked value.
    pub fn set(&self, value: M) {
        *self.lock() = value;
    }

    /// Whether both handles refer to the same tracked instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
