//! Countdown timer state machine
//!
//! Idle/Running/Paused with a 1 Hz tick scheduled through the [`Clock`]
//! seam. The timer is a cheap-to-clone handle over shared single-threaded
//! state; it never blocks and never returns errors to callers. Inputs are
//! clamped and listener failures are logged and isolated.

use std::cell::RefCell;
use std::mem;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clock, ClockHandle, Tick};
use super::duration::{format_remaining, DisplayFormat};

/// Timer lifecycle state. Serialized with the uppercase names used by the
/// persisted last-state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Read-only view of the timer, handed to change listeners and published
/// to the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_seconds: u64,
}

impl TimerSnapshot {
    pub fn idle() -> Self {
        Self {
            state: TimerState::Idle,
            remaining_seconds: 0,
        }
    }
}

/// Change listener. A returned error is logged and does not prevent the
/// remaining listeners from running.
pub type ChangeListener = Box<dyn FnMut(TimerSnapshot) -> anyhow::Result<()>>;

/// Elapsed listener. Single slot, last registration wins.
pub type ElapsedListener = Box<dyn FnMut()>;

struct TimerInner {
    state: TimerState,
    remaining: u64,
    tick: Option<ClockHandle>,
    on_changed: Vec<ChangeListener>,
    on_elapsed: Option<ElapsedListener>,
}

/// Countdown timer. Cloning yields another handle to the same timer.
#[derive(Clone)]
pub struct Timer {
    inner: Rc<RefCell<TimerInner>>,
    clock: Rc<dyn Clock>,
}

impl Timer {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TimerInner {
                state: TimerState::Idle,
                remaining: 0,
                tick: None,
                on_changed: Vec::new(),
                on_elapsed: None,
            })),
            clock,
        }
    }

    pub fn state(&self) -> TimerState {
        self.inner.borrow().state
    }

    pub fn remaining(&self) -> u64 {
        self.inner.borrow().remaining
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.inner.borrow();
        TimerSnapshot {
            state: inner.state,
            remaining_seconds: inner.remaining,
        }
    }

    /// Remaining time in auto format (hours shown only when nonzero).
    pub fn format_remaining(&self) -> String {
        format_remaining(self.remaining(), DisplayFormat::Auto)
    }

    /// Register an additional change listener. Listeners are invoked in
    /// registration order on every state or remaining-time change. A
    /// change a listener makes to the timer itself is not re-broadcast;
    /// each listener sees only the snapshot it was handed.
    pub fn on_changed(&self, listener: ChangeListener) {
        self.inner.borrow_mut().on_changed.push(listener);
    }

    /// Register the elapsed callback, replacing any previous one.
    pub fn on_elapsed(&self, listener: ElapsedListener) {
        self.inner.borrow_mut().on_elapsed = Some(listener);
    }

    /// Start (or restart) the countdown. With an argument the remaining
    /// time is replaced (clamped at 0); without one the current remaining
    /// time is kept, resuming a paused countdown. A start with nothing
    /// remaining is a no-op.
    pub fn start(&self, total_seconds: Option<i64>) {
        let remaining = {
            let mut inner = self.inner.borrow_mut();
            if let Some(total) = total_seconds {
                inner.remaining = clamp_seconds(total);
            }
            inner.remaining
        };
        if remaining == 0 {
            debug!("timer start ignored: nothing remaining");
            return;
        }

        // Always cancel before rescheduling so a re-entrant start while
        // already Running cannot leave two ticks outstanding.
        self.cancel_tick();
        self.inner.borrow_mut().state = TimerState::Running;
        emit_changed(&self.inner);

        let weak = Rc::downgrade(&self.inner);
        let handle = self
            .clock
            .schedule_repeating(1, Box::new(move || run_tick(&weak)));
        self.inner.borrow_mut().tick = Some(handle);
    }

    /// Pause a running countdown; in any other state this does nothing.
    pub fn pause(&self) {
        if self.inner.borrow().state != TimerState::Running {
            return;
        }
        self.cancel_tick();
        self.inner.borrow_mut().state = TimerState::Paused;
        emit_changed(&self.inner);
    }

    /// Cancel any tick and return to Idle with nothing remaining.
    pub fn reset(&self) {
        self.cancel_tick();
        {
            let mut inner = self.inner.borrow_mut();
            inner.remaining = 0;
            inner.state = TimerState::Idle;
        }
        emit_changed(&self.inner);
    }

    /// Restore a remaining time without starting a tick: Paused when
    /// something remains, Idle otherwise. Used when resuming persisted
    /// state.
    pub fn set_paused(&self, remaining_seconds: i64) {
        self.cancel_tick();
        {
            let mut inner = self.inner.borrow_mut();
            inner.remaining = clamp_seconds(remaining_seconds);
            inner.state = if inner.remaining > 0 {
                TimerState::Paused
            } else {
                TimerState::Idle
            };
        }
        emit_changed(&self.inner);
    }

    fn cancel_tick(&self) {
        let handle = self.inner.borrow_mut().tick.take();
        if let Some(handle) = handle {
            self.clock.cancel(handle);
        }
    }
}

fn clamp_seconds(value: i64) -> u64 {
    value.max(0) as u64
}

fn run_tick(weak: &Weak<RefCell<TimerInner>>) -> Tick {
    let Some(inner_rc) = weak.upgrade() else {
        return Tick::Stop;
    };

    let hit_zero = {
        let mut inner = inner_rc.borrow_mut();
        inner.remaining = inner.remaining.saturating_sub(1);
        inner.remaining == 0
    };
    emit_changed(&inner_rc);

    if !hit_zero {
        return Tick::Continue;
    }

    // Listeners observe Idle/0 before the elapsed callback fires.
    {
        let mut inner = inner_rc.borrow_mut();
        inner.tick = None;
        inner.state = TimerState::Idle;
    }
    emit_changed(&inner_rc);
    fire_elapsed(&inner_rc);
    Tick::Stop
}

fn emit_changed(inner_rc: &Rc<RefCell<TimerInner>>) {
    // Take the listeners out so they can re-borrow the timer freely.
    let (snapshot, mut listeners) = {
        let mut inner = inner_rc.borrow_mut();
        let snapshot = TimerSnapshot {
            state: inner.state,
            remaining_seconds: inner.remaining,
        };
        (snapshot, mem::take(&mut inner.on_changed))
    };

    for listener in listeners.iter_mut() {
        if let Err(e) = listener(snapshot) {
            warn!("timer change listener failed: {e:#}");
        }
    }

    let mut inner = inner_rc.borrow_mut();
    let added_during_emit = mem::take(&mut inner.on_changed);
    listeners.extend(added_during_emit);
    inner.on_changed = listeners;
}

fn fire_elapsed(inner_rc: &Rc<RefCell<TimerInner>>) {
    let taken = inner_rc.borrow_mut().on_elapsed.take();
    if let Some(mut callback) = taken {
        callback();
        let mut inner = inner_rc.borrow_mut();
        // keep the callback unless it replaced itself while running
        if inner.on_elapsed.is_none() {
            inner.on_elapsed = Some(callback);
        }
    }
}
