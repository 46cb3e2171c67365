//! Shared state for the single-threaded host.
//!
//! Everything in a live object tree is touched from the host's one update
//! thread: signal callbacks, timers and the tasks awaiting them all run
//! interleaved there. So [`Shared`] is an `Rc<RefCell<T>>`, the same choice
//! a wasm32 target makes, and nothing here is `Send`.
//!
//! Borrows must never be held across a call that may fire a signal, since a
//! listener is free to read or write the same value.

use std::{
    cell::RefCell,
    ops::{Deref, DerefMut},
    rc::{Rc, Weak},
};

/// A "shared" value.
///
/// Equivalent to `Rc<RefCell<T>>`.
#[derive(Default)]
pub struct Shared<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Shared<T> {
    /// Create a new shared `T`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Get a reference to the inner `T`.
    pub fn get(&self) -> impl Deref<Target = T> + '_ {
        self.inner.borrow()
    }

    /// Get a mutable reference to the inner `T`.
    pub fn get_mut(&self) -> impl DerefMut<Target = T> + '_ {
        self.inner.borrow_mut()
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// A non-owning handle.
    pub fn downgrade(&self) -> WeakShared<T> {
        WeakShared {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// A non-owning handle to a [`Shared`] value.
pub struct WeakShared<T> {
    inner: Weak<RefCell<T>>,
}

impl<T> Clone for WeakShared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> WeakShared<T> {
    /// The shared value, if it is still alive.
    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.inner.upgrade().map(|inner| Shared { inner })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn weak_handles_do_not_keep_values_alive() {
        let shared = Shared::new(3u32);
        let weak = shared.downgrade();
        assert_eq!(weak.upgrade().map(|s| *s.get()), Some(3));
        *shared.get_mut() = 4;
        assert_eq!(weak.upgrade().map(|s| *s.get()), Some(4));
        assert!(weak.upgrade().is_some_and(|s| s.ptr_eq(&shared)));
        drop(shared);
        assert!(weak.upgrade().is_none());
    }
}
