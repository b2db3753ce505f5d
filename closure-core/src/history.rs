//! Fixed-capacity record of recent controller transitions.

use core::{fmt, time::Duration};

use heapless::HistoryBuf;

use crate::controller::{Action, Cause};
use crate::schedule::MonotonicInstant;

/// Number of transitions retained in memory.
pub const HISTORY_CAPACITY: usize = 16;

/// Identifier assigned to each recorded transition.
pub type TransitionId = u32;

/// One action change observed by the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionRecord<I> {
    pub id: TransitionId,
    pub at: I,
    pub from: Action,
    pub to: Action,
    pub cause: Cause,
    pub elapsed_since_previous: Option<Duration>,
}

impl<I> fmt::Display for TransitionRecord<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} -> {} ({})",
            self.id,
            self.from.label(),
            self.to.label(),
            self.cause
        )
    }
}

/// Ring of the most recent transitions, oldest entries overwritten first.
pub struct TransitionHistory<I, const CAPACITY: usize = HISTORY_CAPACITY> {
    ring: HistoryBuf<TransitionRecord<I>, CAPACITY>,
    last_transition_at: Option<I>,
    next_id: TransitionId,
}

impl<I, const CAPACITY: usize> TransitionHistory<I, CAPACITY>
where
    I: MonotonicInstant,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            last_transition_at: None,
            next_id: 0,
        }
    }

    /// Appends a transition and returns its identifier.
    pub fn record(&mut self, at: I, from: Action, to: Action, cause: Cause) -> TransitionId {
        let elapsed_since_previous = self
            .last_transition_at
            .map(|previous| at.saturating_duration_since(previous));
        self.last_transition_at = Some(at);

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        self.ring.write(TransitionRecord {
            id,
            at,
            from,
            to,
            cause,
            elapsed_since_previous,
        });
        id
    }

    pub fn latest(&self) -> Option<&TransitionRecord<I>> {
        self.ring.recent()
    }

    /// Recorded transitions in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &TransitionRecord<I>> {
        self.ring.oldest_ordered()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total number of transitions recorded since boot, including evicted ones.
    pub const fn total(&self) -> TransitionId {
        self.next_id
    }
}

impl<I, const CAPACITY: usize> Default for TransitionHistory<I, CAPACITY>
where
    I: MonotonicInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::ops::Add;

    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct MockInstant(u64);

    impl Add<Duration> for MockInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self::Output {
            Self(self.0 + u64::try_from(rhs.as_millis()).unwrap())
        }
    }

    impl MonotonicInstant for MockInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_millis(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn records_elapsed_time_between_transitions() {
        let mut history: TransitionHistory<MockInstant> = TransitionHistory::new();
        history.record(MockInstant(0), Action::Idle, Action::MovingInner, Cause::Boot);
        history.record(
            MockInstant(2_048),
            Action::MovingInner,
            Action::MovingOuter,
            Cause::Deadline,
        );

        let latest = history.latest().unwrap();
        assert_eq!(latest.id, 1);
        assert_eq!(latest.elapsed_since_previous, Some(Duration::from_millis(2_048)));
        assert_eq!(history.oldest_first().next().unwrap().elapsed_since_previous, None);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history: TransitionHistory<MockInstant, 4> = TransitionHistory::new();
        for step in 0..6 {
            history.record(MockInstant(step), Action::Idle, Action::Cooldown, Cause::Level);
        }

        assert_eq!(history.len(), 4);
        assert_eq!(history.total(), 6);
        let ids: heapless::Vec<TransitionId, 4> =
            history.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[2, 3, 4, 5]);
    }
}
