//! Tokio-backed clock source
//!
//! One local task per registration, ticking at second granularity. The
//! timer core is single-threaded by design, so this clock must live on a
//! `LocalSet` inside a current-thread runtime; callbacks run on that same
//! thread, never concurrently.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::clock::{Clock, ClockHandle, OnceFn, RepeatingFn, Tick};

#[derive(Default)]
struct TokioInner {
    next_id: u64,
    tasks: HashMap<u64, JoinHandle<()>>,
}

#[derive(Default)]
pub struct TokioClock {
    inner: Rc<RefCell<TokioInner>>,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self) -> (u64, Weak<RefCell<TokioInner>>) {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        (inner.next_id, Rc::downgrade(&self.inner))
    }

    fn track(&self, id: u64, task: JoinHandle<()>) -> ClockHandle {
        self.inner.borrow_mut().tasks.insert(id, task);
        ClockHandle(id)
    }
}

fn unregister(weak: &Weak<RefCell<TokioInner>>, id: u64) {
    if let Some(inner) = weak.upgrade() {
        inner.borrow_mut().tasks.remove(&id);
    }
}

impl Clock for TokioClock {
    fn schedule_repeating(&self, interval_secs: u32, mut callback: RepeatingFn) -> ClockHandle {
        let (id, weak) = self.register();
        let interval_secs = interval_secs.max(1);
        let task = tokio::task::spawn_local(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs as u64));
            // the first tick of a tokio interval completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if callback() == Tick::Stop {
                    break;
                }
            }
            unregister(&weak, id);
        });
        self.track(id, task)
    }

    fn schedule_once(&self, after_secs: u32, callback: OnceFn) -> ClockHandle {
        let (id, weak) = self.register();
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(Duration::from_secs(after_secs as u64)).await;
            callback();
            unregister(&weak, id);
        });
        self.track(id, task)
    }

    fn cancel(&self, handle: ClockHandle) {
        if let Some(task) = self.inner.borrow_mut().tasks.remove(&handle.0) {
            task.abort();
        }
    }
}
