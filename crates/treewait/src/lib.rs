//! # treewait
//!
//! Await things appearing in a live, mutable object tree: children, a
//! model's primary part, a value slot, an attribute, or anything a predicate
//! can see. Every wait is bounded by a timeout and cancelled if the container
//! it watches is destroyed.
//!
//! Waits are plain futures. They check once; if the answer is already there
//! they resolve on the first poll without subscribing to anything. Otherwise
//! they listen to the host's change signals, the container's destroy signal
//! and a timer, and the first of those to decide wins. Dropping a wait
//! releases all of its listeners.
//!
//! ## Hosts
//! A host implements [`Instance`] for its tree nodes and [`Clock`] for its
//! frame loop. This crate ships one of each: [`SimInstance`], an in-memory
//! tree, and [`Scheduler`], a frame-stepped clock. Everything runs on the
//! host's one update thread; nothing here is `Send`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//!
//! use futures_lite::future::{block_on, poll_once};
//! use treewait::prelude::*;
//!
//! let scheduler = Scheduler::new();
//! let waiter = Waiter::new(scheduler.clone());
//! let character = SimInstance::new("Model", "Character");
//!
//! // Already there, resolves right away.
//! let head = SimInstance::new_in("Part", "Head", &character).unwrap();
//! let found = block_on(waiter.child(&character, "Head", false, None));
//! assert_eq!(found, Ok(head));
//!
//! // Not there yet.
//! let mut torso = Box::pin(waiter.child(&character, "Torso", false, Some(Duration::from_secs(5))));
//! assert!(block_on(poll_once(torso.as_mut())).is_none());
//! let part = SimInstance::new_in("Part", "Torso", &character).unwrap();
//! assert_eq!(block_on(poll_once(torso.as_mut())), Some(Ok(part)));
//! ```
mod batch;
pub mod condition;
pub mod config;
pub mod error;
pub mod future;
pub mod instance;
pub mod signal;
pub mod sim;
mod str;
pub mod sync;
pub mod time;
pub mod waiter;

pub use str::Str;
pub use waiter::Waiter;

pub mod prelude {
    //! Re-exports for convenience
    pub use super::Str;
    pub use super::condition::{Lifespan, Notifier, wait_until};
    pub use super::config::{DEFAULT_TIMEOUT, WaitConfig};
    pub use super::error::{SimError, WaitError};
    pub use super::instance::{Attribute, Instance};
    pub use super::signal::{Connection, Signal};
    pub use super::sim::SimInstance;
    pub use super::time::{Clock, Scheduler};
    pub use super::waiter::Waiter;
}

pub use prelude::{Clock, Instance, Scheduler, SimInstance, WaitError};
