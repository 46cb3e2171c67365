//! Frame ticks, timers and sleeping.
//!
//! The host owns time. Once per frame it calls [`Scheduler::step`] with the
//! frame's delta; that advances the clock, runs any timers that came due and
//! then fires the [`heartbeat`](Clock::heartbeat). Nothing here spawns a
//! thread or reads the wall clock, so a test can drive time exactly.
use std::{future::Future, rc::Rc, time::Duration};

use crate::{
    signal::{Connection, Detach, Signal},
    sync::{Shared, WeakShared},
};

/// What waits need from the host's notion of time.
pub trait Clock: Clone + 'static {
    /// Time elapsed since the clock started.
    fn now(&self) -> Duration;

    /// Fires once per scheduling frame with that frame's delta.
    fn heartbeat(&self) -> Signal<Duration>;

    /// Run `f` once, no earlier than `delay` from now.
    ///
    /// Dropping the returned connection cancels the timer.
    fn after(&self, delay: Duration, f: impl FnOnce() + 'static) -> Connection;
}

struct Timer {
    id: u64,
    deadline: Duration,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    frame: u64,
    next_timer: u64,
    timers: Vec<Timer>,
}

impl Detach for WeakShared<SchedulerState> {
    fn detach(&self, id: u64) {
        let Some(state) = self.upgrade() else {
            return;
        };
        let removed = {
            let mut state = state.get_mut();
            let index = state.timers.iter().position(|timer| timer.id == id);
            index.map(|index| state.timers.remove(index))
        };
        drop(removed);
    }

    fn is_attached(&self, id: u64) -> bool {
        let Some(state) = self.upgrade() else {
            return false;
        };
        let attached = state.get().timers.iter().any(|timer| timer.id == id);
        attached
    }
}

/// A frame-driven [`Clock`].
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Shared<SchedulerState>,
    heartbeat: Signal<Duration>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.get();
        f.debug_struct("Scheduler")
            .field("now", &state.now)
            .field("frame", &state.frame)
            .field("pending_timers", &state.timers.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.state.get().frame
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_timers(&self) -> usize {
        self.state.get().timers.len()
    }

    /// Advance one frame.
    ///
    /// Due timers run in deadline order (ties in the order they were
    /// scheduled), then the heartbeat fires with `dt`.
    pub fn step(&self, dt: Duration) {
        let due = {
            let mut state = self.state.get_mut();
            state.now += dt;
            state.frame += 1;
            let now = state.now;
            let mut due = vec![];
            let mut i = 0;
            while i < state.timers.len() {
                if state.timers[i].deadline <= now {
                    due.push(state.timers.remove(i));
                } else {
                    i += 1;
                }
            }
            due.sort_by_key(|timer| (timer.deadline, timer.id));
            due
        };
        for timer in due {
            log::trace!("timer {} fired at {:?}", timer.id, timer.deadline);
            (timer.callback)();
        }
        self.heartbeat.fire(&dt);
    }

    /// Step `frames` times with the same `dt`.
    pub fn step_frames(&self, frames: u32, dt: Duration) {
        for _ in 0..frames {
            self.step(dt);
        }
    }

    /// Wait at least `delay`.
    ///
    /// Returns a [`Future`] that yields the time actually waited, which is
    /// `delay` rounded up to the next frame boundary.
    pub fn sleep(&self, delay: Duration) -> impl Future<Output = Duration> + use<> {
        let start = self.now();
        let (tx, rx) = async_channel::bounded::<()>(1);
        let timer = self.after(delay, move || {
            let _ = tx.try_send(());
        });
        let scheduler = self.clone();
        async move {
            let _timer = timer;
            let _ = rx.recv().await;
            scheduler.now() - start
        }
    }
}

impl Clock for Scheduler {
    fn now(&self) -> Duration {
        self.state.get().now
    }

    fn heartbeat(&self) -> Signal<Duration> {
        self.heartbeat.clone()
    }

    fn after(&self, delay: Duration, f: impl FnOnce() + 'static) -> Connection {
        let id = {
            let mut state = self.state.get_mut();
            let id = state.next_timer;
            state.next_timer += 1;
            let deadline = state.now + delay;
            state.timers.push(Timer {
                id,
                deadline,
                callback: Box::new(f),
            });
            id
        };
        Connection::new(id, Rc::new(self.state.downgrade()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FRAME: Duration = Duration::from_millis(100);

    #[test]
    fn timers_fire_in_deadline_order_before_heartbeat() {
        let scheduler = Scheduler::new();
        let log = Shared::new(Vec::<&'static str>::new());
        let push = |s: &'static str| {
            let log = log.clone();
            move || log.get_mut().push(s)
        };
        let _late = scheduler.after(Duration::from_millis(250), push("late"));
        let _early = scheduler.after(Duration::from_millis(150), push("early"));
        let _tie = scheduler.after(Duration::from_millis(150), push("tie"));
        let _beat = scheduler.heartbeat().connect({
            let log = log.clone();
            move |_| log.get_mut().push("beat")
        });

        scheduler.step(FRAME);
        assert_eq!(*log.get(), vec!["beat"]);
        scheduler.step(FRAME);
        assert_eq!(*log.get(), vec!["beat", "early", "tie", "beat"]);
        scheduler.step(FRAME);
        assert_eq!(
            *log.get(),
            vec!["beat", "early", "tie", "beat", "late", "beat"]
        );
        assert_eq!(scheduler.pending_timers(), 0);
        assert_eq!(scheduler.frame(), 3);
        assert_eq!(scheduler.now(), Duration::from_millis(300));
    }

    #[test]
    fn dropping_a_timer_cancels_it() {
        let scheduler = Scheduler::new();
        let fired = Shared::new(false);
        let timer = scheduler.after(FRAME, {
            let fired = fired.clone();
            move || *fired.get_mut() = true
        });
        assert!(timer.is_connected());
        assert_eq!(scheduler.pending_timers(), 1);
        drop(timer);
        assert_eq!(scheduler.pending_timers(), 0);
        scheduler.step(FRAME);
        assert!(!*fired.get());
    }

    #[test]
    fn fired_timers_report_disconnected() {
        let scheduler = Scheduler::new();
        let timer = scheduler.after(Duration::ZERO, || {});
        scheduler.step(Duration::ZERO);
        assert!(!timer.is_connected());
    }

    #[test]
    fn sleep_rounds_up_to_frames() {
        let scheduler = Scheduler::new();
        let sleep = scheduler.sleep(Duration::from_millis(250));
        scheduler.step_frames(3, FRAME);
        let waited = futures_lite::future::block_on(sleep);
        assert_eq!(waited, Duration::from_millis(300));
    }
}
