//! Waits on instances.
use std::time::Duration;

use crate::{
    Str,
    condition::{Lifespan, wait_until},
    config::WaitConfig,
    error::WaitError,
    instance::{Attribute, Instance},
    time::Clock,
};

/// Issues waits against a [`Clock`] with shared [`WaitConfig`].
///
/// Every operation takes `timeout: Option<Duration>`, where `None` means
/// [`WaitConfig::default_timeout`]. An operation whose condition already
/// holds resolves on its first poll without subscribing to anything.
/// Dropping the returned future cancels the wait and releases every
/// subscription it made.
#[derive(Clone, Debug)]
pub struct Waiter<C> {
    clock: C,
    config: WaitConfig,
}

impl<C: Clock> Waiter<C> {
    pub fn new(clock: C) -> Self {
        Self::with_config(clock, WaitConfig::default())
    }

    pub fn with_config(clock: C, config: WaitConfig) -> Self {
        Waiter { clock, config }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    pub(crate) fn timeout(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.config.default_timeout)
    }

    /// Wait for a child named `name`.
    ///
    /// With `recursive`, any descendant with that name will do, and the wait
    /// listens to `descendant_added` instead of `child_added`.
    pub async fn child<I: Instance>(
        &self,
        parent: &I,
        name: &str,
        recursive: bool,
        timeout: Option<Duration>,
    ) -> Result<I, WaitError> {
        log::debug!("waiting for child {name:?} (recursive: {recursive})");
        let source = if recursive {
            parent.descendant_added()
        } else {
            parent.child_added()
        };
        let wanted = Str::from_ref(name);
        wait_until(
            &self.clock,
            Some(Lifespan::of(parent)),
            || parent.find_first_child(name, recursive),
            move |notify| {
                source.connect(move |child: &I| {
                    if child.name() == wanted {
                        notify.satisfy(child.clone());
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Wait for a child whose class is `class` or inherits from it.
    pub async fn child_which_is_a<I: Instance>(
        &self,
        parent: &I,
        class: &str,
        recursive: bool,
        timeout: Option<Duration>,
    ) -> Result<I, WaitError> {
        log::debug!("waiting for child which is a {class:?} (recursive: {recursive})");
        let source = if recursive {
            parent.descendant_added()
        } else {
            parent.child_added()
        };
        let wanted = Str::from_ref(class);
        wait_until(
            &self.clock,
            Some(Lifespan::of(parent)),
            || parent.find_first_child_which_is_a(class, recursive),
            move |notify| {
                source.connect(move |child: &I| {
                    if child.is_a(&wanted) {
                        notify.satisfy(child.clone());
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Wait for a direct child whose class is exactly `class`.
    pub async fn child_of_class<I: Instance>(
        &self,
        parent: &I,
        class: &str,
        timeout: Option<Duration>,
    ) -> Result<I, WaitError> {
        log::debug!("waiting for child of class {class:?}");
        let source = parent.child_added();
        let wanted = Str::from_ref(class);
        wait_until(
            &self.clock,
            Some(Lifespan::of(parent)),
            || parent.find_first_child_of_class(class),
            move |notify| {
                source.connect(move |child: &I| {
                    if child.class_name() == wanted {
                        notify.satisfy(child.clone());
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Wait for `model`'s primary part to be set.
    pub async fn primary_part<I: Instance>(
        &self,
        model: &I,
        timeout: Option<Duration>,
    ) -> Result<I, WaitError> {
        log::debug!("waiting for primary part of {:?}", model.name());
        let source = model.property_changed("PrimaryPart");
        let watched = model.clone();
        wait_until(
            &self.clock,
            Some(Lifespan::of(model)),
            || model.primary_part(),
            move |notify| {
                source.connect(move |_| {
                    if let Some(part) = watched.primary_part() {
                        notify.satisfy(part);
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Wait for a value-holding container's value to be set.
    pub async fn value<I: Instance>(
        &self,
        holder: &I,
        timeout: Option<Duration>,
    ) -> Result<I, WaitError> {
        log::debug!("waiting for value of {:?}", holder.name());
        let source = holder.value_changed();
        let watched = holder.clone();
        wait_until(
            &self.clock,
            Some(Lifespan::of(holder)),
            || holder.value(),
            move |notify| {
                source.connect(move |_| {
                    if let Some(value) = watched.value() {
                        notify.satisfy(value);
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Wait for the attribute `name` to be set on `instance`.
    pub async fn attribute<I: Instance>(
        &self,
        instance: &I,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Attribute, WaitError> {
        log::debug!("waiting for attribute {name:?} on {:?}", instance.name());
        let source = instance.attribute_changed(name);
        let watched = instance.clone();
        let key = Str::from_ref(name);
        wait_until(
            &self.clock,
            Some(Lifespan::of(instance)),
            || instance.attribute(name),
            move |notify| {
                source.connect(move |_| {
                    if let Some(value) = watched.attribute(&key) {
                        notify.satisfy(value);
                    }
                })
            },
            self.timeout(timeout),
        )
        .await
    }

    /// Poll `predicate` once now and then once per heartbeat until it returns
    /// a value.
    ///
    /// The predicate always runs in the waiting task, never inside the
    /// heartbeat callback, so a panic in it reaches the caller.
    ///
    /// There is no change event to listen to, so this costs one call per
    /// frame for as long as it waits. Prefer the event driven waits.
    pub async fn predicate<T: 'static>(
        &self,
        predicate: impl FnMut() -> Option<T>,
        timeout: Option<Duration>,
    ) -> Result<T, WaitError> {
        self.poll_predicate(None, predicate, timeout).await
    }

    /// Like [`Waiter::predicate`], but also fails with
    /// [`WaitError::ContainerDestroyed`] if `container` is destroyed first.
    pub async fn predicate_on<I: Instance, T: 'static>(
        &self,
        container: &I,
        predicate: impl FnMut() -> Option<T>,
        timeout: Option<Duration>,
    ) -> Result<T, WaitError> {
        self.poll_predicate(Some(Lifespan::of(container)), predicate, timeout)
            .await
    }

    /// Like [`Waiter::predicate`] with a fallible predicate.
    ///
    /// The predicate's own error ends the wait and is returned as is. Wait
    /// failures are converted into `E`.
    pub async fn try_predicate<T, E>(
        &self,
        mut predicate: impl FnMut() -> Result<Option<T>, E>,
        timeout: Option<Duration>,
    ) -> Result<T, E>
    where
        T: 'static,
        E: From<WaitError> + 'static,
    {
        let outcome = self
            .poll_predicate(
                None,
                || match predicate() {
                    Ok(value) => value.map(Ok),
                    Err(e) => Some(Err(e)),
                },
                timeout,
            )
            .await;
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(E::from(e)),
        }
    }

    async fn poll_predicate<T: 'static>(
        &self,
        lifespan: Option<Lifespan>,
        predicate: impl FnMut() -> Option<T>,
        timeout: Option<Duration>,
    ) -> Result<T, WaitError> {
        let heartbeat = self.clock.heartbeat();
        wait_until(
            &self.clock,
            lifespan,
            predicate,
            move |notify| heartbeat.connect(move |_| notify.notify()),
            self.timeout(timeout),
        )
        .await
    }
}
