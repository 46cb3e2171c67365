//! Await a condition, racing change, destruction and timeout.
//!
//! Every wait in this crate is [`wait_until`] with a different check and a
//! different change source. The pattern is:
//!
//! 1. Run the check. If it already holds, resolve without subscribing to
//!    anything.
//! 2. Otherwise arm three triggers: the change source, the container's
//!    destroy signal and a timer. Each trigger callback pushes a note into
//!    one queue, in the order the host delivers them.
//! 3. The waiting task drains that queue in order and the first decisive
//!    note wins.
//!
//! Change sources decide at fire time where they can: a callback that sees
//! the awaited value calls [`Notifier::satisfy`] with it, so a child that is
//! added and then removed again before the task runs still counts, and it
//! still beats a destroy the host delivers after it. Sources with nothing to
//! inspect call [`Notifier::notify`] instead, and the check re-runs inside
//! the task.
//!
//! Once a decisive note is queued every later trigger is ignored, and
//! repeated change notes collapse into one, so the queue never holds more
//! than two notes.
//!
//! All three triggers are guards owned by the future, so they are released
//! on success, on failure and when the future is dropped mid-wait.
use std::{cell::Cell, rc::Rc, time::Duration};

use crate::{
    error::WaitError,
    instance::Instance,
    signal::{Connection, Signal},
    time::Clock,
};

enum Trigger<T> {
    Changed,
    Satisfied(T),
    Destroyed,
    TimedOut,
}

struct Queue<T> {
    tx: async_channel::Sender<Trigger<T>>,
    change_pending: Rc<Cell<bool>>,
    decided: Rc<Cell<bool>>,
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Queue {
            tx: self.tx.clone(),
            change_pending: self.change_pending.clone(),
            decided: self.decided.clone(),
        }
    }
}

impl<T> Queue<T> {
    fn decide(&self, trigger: Trigger<T>) {
        if !self.decided.replace(true) {
            let _ = self.tx.try_send(trigger);
        }
    }

    fn change(&self) {
        if !self.decided.get() && !self.change_pending.replace(true) {
            let _ = self.tx.try_send(Trigger::Changed);
        }
    }
}

/// Handed to a change subscription to report what the host just did.
pub struct Notifier<T> {
    queue: Queue<T>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Notifier {
            queue: self.queue.clone(),
        }
    }
}

impl<T> Notifier<T> {
    /// The awaited value is here. The wait resolves with it unless a
    /// destroy or timeout was delivered first.
    pub fn satisfy(&self, value: T) {
        self.queue.decide(Trigger::Satisfied(value));
    }

    /// The awaited state may have changed; re-run the check in the task.
    pub fn notify(&self) {
        self.queue.change();
    }
}

/// The destroy signal of the container a wait is scoped to.
pub struct Lifespan {
    destroying: Signal<()>,
    destroyed: bool,
}

impl Lifespan {
    pub fn of<I: Instance>(container: &I) -> Self {
        Lifespan {
            destroying: container.destroying(),
            destroyed: container.is_destroyed(),
        }
    }
}

/// Wait until `is_satisfied` returns a value.
///
/// * `lifespan` - fail with [`WaitError::ContainerDestroyed`] if this
///   container is destroyed first. `None` waits are only bounded by time.
/// * `is_satisfied` - checked once up front and again after every
///   [`Notifier::notify`]. It runs inside the waiting task, so a panic in it
///   unwinds into whoever is awaiting.
/// * `subscribe` - connect the change source, reporting to the given
///   [`Notifier`]. Called at most once, and only if the first check fails.
/// * `timeout` - fail with [`WaitError::Timeout`] after this long. Zero means
///   the first check is the only chance.
///
/// If the container is already destroyed and the first check fails, the wait
/// fails immediately. When several triggers are pending the one the host
/// delivered first decides.
pub async fn wait_until<C, T>(
    clock: &C,
    lifespan: Option<Lifespan>,
    mut is_satisfied: impl FnMut() -> Option<T>,
    subscribe: impl FnOnce(Notifier<T>) -> Connection,
    timeout: Duration,
) -> Result<T, WaitError>
where
    C: Clock,
    T: 'static,
{
    if let Some(value) = is_satisfied() {
        log::trace!("condition already satisfied");
        return Ok(value);
    }
    if lifespan.as_ref().is_some_and(|l| l.destroyed) {
        return Err(WaitError::ContainerDestroyed);
    }
    if timeout.is_zero() {
        return Err(WaitError::Timeout);
    }

    log::debug!("waiting up to {timeout:?}");
    // One change note plus one decisive note.
    let (tx, rx) = async_channel::bounded::<Trigger<T>>(2);
    let queue = Queue {
        tx,
        change_pending: Rc::new(Cell::new(false)),
        decided: Rc::new(Cell::new(false)),
    };
    let _changed = subscribe(Notifier {
        queue: queue.clone(),
    });
    let _destroyed = lifespan.map(|lifespan| {
        let queue = queue.clone();
        lifespan
            .destroying
            .connect(move |_| queue.decide(Trigger::Destroyed))
    });
    let _timer = clock.after(timeout, {
        let queue = queue.clone();
        move || queue.decide(Trigger::TimedOut)
    });
    let change_pending = queue.change_pending.clone();
    drop(queue);

    while let Ok(trigger) = rx.recv().await {
        match trigger {
            Trigger::Changed => {
                change_pending.set(false);
                log::trace!("change notification, re-checking");
                if let Some(value) = is_satisfied() {
                    log::debug!("condition satisfied");
                    return Ok(value);
                }
            }
            Trigger::Satisfied(value) => {
                log::debug!("condition satisfied when the host fired");
                return Ok(value);
            }
            Trigger::Destroyed => {
                log::debug!("container destroyed while waiting");
                return Err(WaitError::ContainerDestroyed);
            }
            Trigger::TimedOut => {
                log::debug!("timed out after {timeout:?}");
                return Err(WaitError::Timeout);
            }
        }
    }
    // Every trigger source dropped its callback without firing; time can no
    // longer run out, and nothing will change.
    log::warn!("all wait triggers were dropped by the host");
    Err(WaitError::Timeout)
}
