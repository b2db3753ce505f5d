//! Single-consumer event loop glue around the [`ActionController`].
//!
//! Raw pin changes and timer expiries are turned into [`Event`]s, queued,
//! and handed to the controller strictly one at a time. Every transition
//! re-arms the action deadline and lands in the [`TransitionHistory`].

use core::fmt;

use heapless::Deque;

use crate::config::{ConfigError, TimingConfig};
use crate::controller::{ActionController, Cause, Event, SystemState, Transition};
use crate::debounce::Debouncer;
use crate::history::{TransitionHistory, TransitionId};
use crate::indicator::BlinkTimer;
use crate::io::{InputLevels, PinSampler};
use crate::motor::MotorLines;
use crate::schedule::{DeadlineScheduler, MonotonicInstant, TimerId};

/// Default depth of the pending event queue.
pub const EVENT_QUEUE_DEPTH: usize = 4;

/// Errors reported when queueing events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventQueueError {
    /// The queue already holds its maximum number of events.
    Full,
}

impl fmt::Display for EventQueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventQueueError::Full => f.write_str("event queue full"),
        }
    }
}

/// A transition together with its provenance, handed to observers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dispatched {
    pub id: TransitionId,
    pub cause: Cause,
    pub transition: Transition,
}

pub struct Dispatcher<I, L, T, const N: usize = EVENT_QUEUE_DEPTH>
where
    L: MotorLines,
    T: BlinkTimer,
{
    controller: ActionController<L, T>,
    debouncer: Debouncer,
    scheduler: DeadlineScheduler<I>,
    queue: Deque<Event, N>,
    history: TransitionHistory<I>,
}

impl<I, L, T, const N: usize> Dispatcher<I, L, T, N>
where
    I: MonotonicInstant,
    L: MotorLines,
    T: BlinkTimer,
{
    /// Builds the dispatcher after validating `timing`.
    pub fn new(lines: L, timer: T, timing: TimingConfig) -> Result<Self, ConfigError> {
        timing.validate()?;
        Ok(Self {
            controller: ActionController::new(lines, timer, timing),
            debouncer: Debouncer::new(timing.debounce_settle),
            scheduler: DeadlineScheduler::new(),
            queue: Deque::new(),
            history: TransitionHistory::new(),
        })
    }

    /// Delivers the power-on sample straight to the controller, skipping the
    /// debounce wait so the doors move immediately.
    pub fn boot(&mut self, now: I, levels: InputLevels) -> Option<Dispatched> {
        self.debouncer.prime(levels);
        self.dispatch(now, Event::LevelChanged(levels), Cause::Boot)
    }

    /// Notes a raw edge on any input line.
    pub fn pin_changed(&mut self, now: I) {
        self.debouncer.pin_changed(now, &mut self.scheduler);
    }

    /// Queues an event for the next [`Dispatcher::service`] call.
    pub fn enqueue(&mut self, event: Event) -> Result<(), EventQueueError> {
        self.queue
            .push_back(event)
            .map_err(|_| EventQueueError::Full)
    }

    /// Drains queued events, then fires expired timers one at a time.
    ///
    /// Each timer's event is handled before the next timer is checked, so a
    /// deadline replaced by that event never fires. Returns the number of
    /// transitions performed. `observe` sees each one right after the
    /// controller ran its entry action.
    pub fn service(
        &mut self,
        now: I,
        pins: &mut impl PinSampler,
        mut observe: impl FnMut(&Dispatched),
    ) -> usize {
        let mut performed = self.drain(now, &mut observe);
        while let Some(timer) = self.scheduler.expire_next(now) {
            let event = match timer {
                TimerId::DebounceSettle => Event::LevelChanged(self.debouncer.settled(pins)),
                TimerId::ActionDeadline => Event::DeadlineFired,
            };
            // Drained above, so there is room.
            let _ = self.enqueue(event);
            performed += self.drain(now, &mut observe);
        }
        performed
    }

    fn drain(&mut self, now: I, observe: &mut impl FnMut(&Dispatched)) -> usize {
        let mut performed = 0;
        while let Some(event) = self.queue.pop_front() {
            let cause = Cause::from(&event);
            if let Some(dispatched) = self.dispatch(now, event, cause) {
                observe(&dispatched);
                performed += 1;
            }
        }
        performed
    }

    fn dispatch(&mut self, now: I, event: Event, cause: Cause) -> Option<Dispatched> {
        let transition = self.controller.handle(event)?;
        self.scheduler.arm_relative(now, transition.rearm);
        let id = self
            .history
            .record(now, transition.from, transition.to, cause);
        Some(Dispatched {
            id,
            cause,
            transition,
        })
    }

    /// Earliest instant at which [`Dispatcher::service`] has work to do.
    pub fn next_wakeup(&self) -> Option<I> {
        self.scheduler.next_wakeup()
    }

    pub fn state(&self) -> &SystemState {
        self.controller.state()
    }

    pub fn controller(&self) -> &ActionController<L, T> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ActionController<L, T> {
        &mut self.controller
    }

    pub fn scheduler(&self) -> &DeadlineScheduler<I> {
        &self.scheduler
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    pub fn history(&self) -> &TransitionHistory<I> {
        &self.history
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}
