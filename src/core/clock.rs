//! Clock source abstraction for second-granularity scheduling
//!
//! The timer core never talks to the event loop directly; it schedules
//! callbacks through this trait. `ManualClock` is a deterministic
//! implementation driven by `advance()`, used throughout the tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

/// Signal returned by a repeating callback: keep firing or remove the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// Opaque handle for a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockHandle(pub(crate) u64);

pub type RepeatingFn = Box<dyn FnMut() -> Tick>;
pub type OnceFn = Box<dyn FnOnce()>;

/// Scheduling collaborator. Cancellation is synchronous and cancelling a
/// handle that already fired or was never scheduled is a no-op.
pub trait Clock {
    fn schedule_repeating(&self, interval_secs: u32, callback: RepeatingFn) -> ClockHandle;
    fn schedule_once(&self, after_secs: u32, callback: OnceFn) -> ClockHandle;
    fn cancel(&self, handle: ClockHandle);
}

enum Scheduled {
    Repeating(RepeatingFn),
    Once(OnceFn),
}

struct Entry {
    due: u64,
    interval_secs: u32,
    callback: Scheduled,
}

#[derive(Default)]
struct ManualInner {
    now: u64,
    next_id: u64,
    // BTreeMap keyed by registration id keeps firing order stable
    entries: BTreeMap<u64, Entry>,
    running: Option<u64>,
    running_cancelled: bool,
}

/// Simulated clock. Time only moves when `advance()` is called; callbacks
/// may re-entrantly schedule and cancel, including their own handle.
#[derive(Default)]
pub struct ManualClock {
    inner: RefCell<ManualInner>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now
    }

    /// Number of callbacks currently registered.
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Move time forward one second at a time, firing due callbacks.
    pub fn advance(&self, secs: u64) {
        for _ in 0..secs {
            let now = {
                let mut inner = self.inner.borrow_mut();
                inner.now += 1;
                inner.now
            };
            self.fire_due(now);
        }
    }

    fn fire_due(&self, now: u64) {
        loop {
            let next = {
                let inner = self.inner.borrow();
                inner
                    .entries
                    .iter()
                    .find(|(_, e)| e.due <= now)
                    .map(|(id, _)| *id)
            };
            let Some(id) = next else { break };

            let entry = {
                let mut inner = self.inner.borrow_mut();
                let Some(entry) = inner.entries.remove(&id) else {
                    continue;
                };
                inner.running = Some(id);
                inner.running_cancelled = false;
                entry
            };

            // Invoke without holding the borrow: the callback may call back
            // into this clock.
            match entry.callback {
                Scheduled::Once(callback) => callback(),
                Scheduled::Repeating(mut callback) => {
                    let outcome = callback();
                    let mut inner = self.inner.borrow_mut();
                    if outcome == Tick::Continue && !inner.running_cancelled {
                        inner.entries.insert(
                            id,
                            Entry {
                                due: now + entry.interval_secs as u64,
                                interval_secs: entry.interval_secs,
                                callback: Scheduled::Repeating(callback),
                            },
                        );
                    }
                }
            }

            self.inner.borrow_mut().running = None;
        }
    }
}

impl Clock for ManualClock {
    fn schedule_repeating(&self, interval_secs: u32, callback: RepeatingFn) -> ClockHandle {
        let mut inner = self.inner.borrow_mut();
        let interval_secs = interval_secs.max(1);
        inner.next_id += 1;
        let id = inner.next_id;
        let due = inner.now + interval_secs as u64;
        inner.entries.insert(
            id,
            Entry {
                due,
                interval_secs,
                callback: Scheduled::Repeating(callback),
            },
        );
        ClockHandle(id)
    }

    fn schedule_once(&self, after_secs: u32, callback: OnceFn) -> ClockHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        let due = inner.now + after_secs.max(1) as u64;
        inner.entries.insert(
            id,
            Entry {
                due,
                interval_secs: 0,
                callback: Scheduled::Once(callback),
            },
        );
        ClockHandle(id)
    }

    fn cancel(&self, handle: ClockHandle) {
        let mut inner = self.inner.borrow_mut();
        if inner.entries.remove(&handle.0).is_none() && inner.running == Some(handle.0) {
            inner.running_cancelled = true;
        }
    }
}
