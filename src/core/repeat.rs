//! Repeat-notification window
//!
//! Handles the timer's elapsed event: one immediate notification, then an
//! optional bounded series of follow-ups at a fixed interval. A new
//! countdown or a reset cancels any window still in flight.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::notify::{Notifier, NotifyOptions};
use crate::settings::Settings;

use super::clock::{Clock, ClockHandle, Tick};

pub const NOTIFY_TITLE: &str = "Timer";
pub const NOTIFY_BODY: &str = "Time is up!";

#[derive(Default)]
struct RepeatInner {
    repeats_left: u32,
    handle: Option<ClockHandle>,
}

/// Elapsed-event handler delivering `1 + repeat_count` notifications when
/// repetition is enabled and exactly one otherwise.
#[derive(Clone)]
pub struct RepeatScheduler {
    inner: Rc<RefCell<RepeatInner>>,
    clock: Rc<dyn Clock>,
    notifier: Rc<dyn Notifier>,
    settings: Arc<Settings>,
}

impl RepeatScheduler {
    pub fn new(clock: Rc<dyn Clock>, notifier: Rc<dyn Notifier>, settings: Arc<Settings>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RepeatInner::default())),
            clock,
            notifier,
            settings,
        }
    }

    /// Called once per elapsed event.
    pub fn handle_elapsed(&self) {
        let opts = NotifyOptions::from_settings(&self.settings);
        deliver(&*self.notifier, &opts);

        self.cancel();

        let repeat_count = self.settings.repeat_count;
        let interval = self.settings.repeat_interval_seconds;
        if !self.settings.repeat_enabled || repeat_count == 0 || interval == 0 {
            return;
        }

        debug!(repeat_count, interval, "arming repeat notifications");
        self.inner.borrow_mut().repeats_left = repeat_count;

        let weak = Rc::downgrade(&self.inner);
        let notifier = Rc::clone(&self.notifier);
        let handle = self.clock.schedule_repeating(
            interval,
            Box::new(move || run_repeat(&weak, &*notifier, &opts)),
        );
        self.inner.borrow_mut().handle = Some(handle);
    }

    /// Drop any scheduled repeats. Safe to call when none are active.
    pub fn cancel(&self) {
        let handle = {
            let mut inner = self.inner.borrow_mut();
            inner.repeats_left = 0;
            inner.handle.take()
        };
        if let Some(handle) = handle {
            self.clock.cancel(handle);
        }
    }
}

fn run_repeat(weak: &Weak<RefCell<RepeatInner>>, notifier: &dyn Notifier, opts: &NotifyOptions) -> Tick {
    let Some(inner_rc) = weak.upgrade() else {
        return Tick::Stop;
    };
    {
        let mut inner = inner_rc.borrow_mut();
        if inner.repeats_left == 0 {
            inner.handle = None;
            return Tick::Stop;
        }
        inner.repeats_left -= 1;
    }
    notifier.notify(NOTIFY_TITLE, NOTIFY_BODY, opts).ok();
    Tick::Continue
}

fn deliver(notifier: &dyn Notifier, opts: &NotifyOptions) {
    if let Err(e) = notifier.notify(NOTIFY_TITLE, NOTIFY_BODY, opts) {
        warn!("notification delivery failed: {e}");
    }
}
