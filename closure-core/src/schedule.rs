//! Deadline scheduling on a single monotonic counter.
//!
//! Two independent logical one-shot timers share the counter: the action
//! deadline armed by the controller and the debounce settle timer. Arming a
//! timer replaces whatever was pending on it; an armed timer fires exactly
//! once.

use core::{ops::Add, time::Duration};

/// Monotonic timestamp type driving the scheduler.
pub trait MonotonicInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// A single relative one-shot deadline.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OneShot<I> {
    deadline: Option<I>,
}

impl<I: MonotonicInstant> OneShot<I> {
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedules the timer `after` from `now`, replacing any pending deadline.
    pub fn arm_relative(&mut self, now: I, after: Duration) -> I {
        let deadline = now + after;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` once when `now` has reached the deadline, disarming it.
    pub fn fire(&mut self, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl<I: MonotonicInstant> Default for OneShot<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Logical timers multiplexed onto the counter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerId {
    DebounceSettle,
    ActionDeadline,
}

/// Owner of the debounce and action deadlines.
#[derive(Clone, Debug)]
pub struct DeadlineScheduler<I> {
    action: OneShot<I>,
    debounce: OneShot<I>,
}

impl<I: MonotonicInstant> DeadlineScheduler<I> {
    pub const fn new() -> Self {
        Self {
            action: OneShot::new(),
            debounce: OneShot::new(),
        }
    }

    /// Schedules the next action deadline, overwriting the pending one.
    pub fn arm_relative(&mut self, now: I, after: Duration) -> I {
        self.action.arm_relative(now, after)
    }

    /// Restarts the debounce settle timer.
    pub fn arm_debounce(&mut self, now: I, settle: Duration) -> I {
        self.debounce.arm_relative(now, settle)
    }

    pub fn action_deadline(&self) -> Option<I> {
        self.action.deadline()
    }

    pub fn debounce_deadline(&self) -> Option<I> {
        self.debounce.deadline()
    }

    /// Returns `true` while a debounce settle is in progress.
    pub fn settling(&self) -> bool {
        self.debounce.is_armed()
    }

    /// Earliest pending deadline across both timers.
    pub fn next_wakeup(&self) -> Option<I> {
        match (self.action.deadline(), self.debounce.deadline()) {
            (Some(action), Some(debounce)) => Some(action.min(debounce)),
            (action, debounce) => action.or(debounce),
        }
    }

    /// Fires the earliest timer that has expired at `now`, if any.
    ///
    /// Only one timer fires per call so the caller can hand its event to the
    /// controller before the other is looked at: a deadline re-armed by that
    /// event is then no longer due. On a tie the debounce timer goes first so
    /// the controller sees the settled inputs before the deadline.
    pub fn expire_next(&mut self, now: I) -> Option<TimerId> {
        let due = |deadline: Option<I>| deadline.filter(|deadline| now >= *deadline);
        let timer = match (due(self.debounce.deadline()), due(self.action.deadline())) {
            (Some(debounce), Some(action)) if action < debounce => TimerId::ActionDeadline,
            (Some(_), _) => TimerId::DebounceSettle,
            (None, Some(_)) => TimerId::ActionDeadline,
            (None, None) => return None,
        };
        match timer {
            TimerId::DebounceSettle => self.debounce.fire(now),
            TimerId::ActionDeadline => self.action.fire(now),
        };
        Some(timer)
    }
}

impl<I: MonotonicInstant> Default for DeadlineScheduler<I> {
    fn default() -> Self {
        Self::new()
    }
}
