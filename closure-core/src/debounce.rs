//! Settle-time debouncer for the input lines.

use core::time::Duration;

use crate::io::{InputLevels, PinSampler};
use crate::schedule::{DeadlineScheduler, MonotonicInstant};

/// Turns raw pin changes into settled level snapshots.
///
/// Every raw change restarts the settle timer held by the
/// [`DeadlineScheduler`]; only when it expires are the lines sampled. The
/// settled sample is delivered even when it matches the previous one so
/// the controller always re-evaluates after input activity.
#[derive(Clone, Debug)]
pub struct Debouncer {
    settle: Duration,
    last: Option<InputLevels>,
    restarts: u32,
}

impl Debouncer {
    pub const fn new(settle: Duration) -> Self {
        Self {
            settle,
            last: None,
            restarts: 0,
        }
    }

    pub const fn settle(&self) -> Duration {
        self.settle
    }

    /// Records a raw transition on any input line.
    ///
    /// Returns `true` when the change restarted a settle that was already
    /// in progress.
    pub fn pin_changed<I: MonotonicInstant>(
        &mut self,
        now: I,
        scheduler: &mut DeadlineScheduler<I>,
    ) -> bool {
        let restarted = scheduler.settling();
        if restarted {
            self.restarts = self.restarts.wrapping_add(1);
        }
        scheduler.arm_debounce(now, self.settle);
        restarted
    }

    /// Samples the lines after the settle timer expired.
    pub fn settled(&mut self, pins: &mut impl PinSampler) -> InputLevels {
        let levels = pins.sample();
        self.last = Some(levels);
        levels
    }

    /// Seeds the debouncer with the boot-time sample.
    pub fn prime(&mut self, levels: InputLevels) {
        self.last = Some(levels);
    }

    /// Most recently delivered snapshot.
    pub const fn last(&self) -> Option<InputLevels> {
        self.last
    }

    /// Number of settles restarted by further bouncing.
    pub const fn restarts(&self) -> u32 {
        self.restarts
    }
}
