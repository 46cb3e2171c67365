//! Host notifications as revocable listener lists.
//!
//! A [`Signal`] is how the host tells observers that something happened:
//! a child was added, a property changed, an instance is being destroyed,
//! a frame ticked. Observers [`connect`](Signal::connect) a callback and get
//! back a [`Connection`]. When the connection is dropped the listener is
//! removed, so a listener can never outlive whatever owns its connection.
use std::{cell::RefCell, rc::Rc};

use crate::sync::{Shared, WeakShared};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: vec![],
        }
    }
}

/// Something a [`Connection`] can be detached from.
pub(crate) trait Detach {
    fn detach(&self, id: u64);
    fn is_attached(&self, id: u64) -> bool;
}

impl<T: 'static> Detach for WeakShared<Listeners<T>> {
    fn detach(&self, id: u64) {
        let Some(listeners) = self.upgrade() else {
            return;
        };
        // The closure is dropped after the borrow ends, it may own connections
        // back into this same list.
        let removed = {
            let mut listeners = listeners.get_mut();
            let index = listeners.entries.iter().position(|(i, _)| *i == id);
            index.map(|index| listeners.entries.remove(index))
        };
        drop(removed);
    }

    fn is_attached(&self, id: u64) -> bool {
        let Some(listeners) = self.upgrade() else {
            return false;
        };
        let attached = listeners.get().entries.iter().any(|(i, _)| *i == id);
        attached
    }
}

/// Guard for one registered listener or timer.
///
/// Dropping the connection disconnects it.
#[must_use = "dropping a Connection disconnects it immediately"]
pub struct Connection {
    id: u64,
    source: Option<Rc<dyn Detach>>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl core::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl Connection {
    pub(crate) fn new(id: u64, source: Rc<dyn Detach>) -> Self {
        Self {
            id,
            source: Some(source),
        }
    }

    /// Remove the listener. Calling this more than once does nothing.
    pub fn disconnect(&mut self) {
        if let Some(source) = self.source.take() {
            source.detach(self.id);
        }
    }

    /// Whether the listener is still registered.
    ///
    /// This becomes `false` after [`Connection::disconnect`], after the source
    /// drops all of its listeners, or after a timer has fired.
    pub fn is_connected(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.is_attached(self.id))
    }
}

/// A list of listeners that can be fired with a `&T`.
///
/// Cloning a `Signal` clones the handle, not the listeners.
pub struct Signal<T> {
    listeners: Shared<Listeners<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            listeners: Default::default(),
        }
    }
}

impl<T: 'static> core::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `f` to be called every time this signal fires.
    pub fn connect(&self, f: impl FnMut(&T) + 'static) -> Connection {
        let listener: Listener<T> = Rc::new(RefCell::new(f));
        let id = {
            let mut listeners = self.listeners.get_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, listener));
            id
        };
        Connection::new(id, Rc::new(self.listeners.downgrade()))
    }

    /// Call every connected listener with `value`.
    ///
    /// Listeners connected while firing are not called until the next fire.
    /// Listeners disconnected while firing are skipped.
    pub fn fire(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .listeners
            .get()
            .entries
            .iter()
            .map(|(id, listener)| (*id, listener.clone()))
            .collect();
        for (id, listener) in snapshot {
            let still_connected = self
                .listeners
                .get()
                .entries
                .iter()
                .any(|(i, _)| *i == id);
            if !still_connected {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(value),
                Err(_) => log::warn!("skipping listener {id}, it re-entered its own signal"),
            }
        }
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.get().entries.len()
    }

    /// Drop every listener. Outstanding connections become disconnected.
    pub fn disconnect_all(&self) {
        // Release the borrow before the closures (and whatever they own) drop.
        let entries = std::mem::take(&mut self.listeners.get_mut().entries);
        drop(entries);
    }
}
