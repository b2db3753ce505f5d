#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status storage for the firmware target.
//!
//! The control task publishes its latest action, settled inputs and
//! transition counters through atomics so the heartbeat task can report
//! them without touching the dispatcher.

use closure_core::controller::Action;
use closure_core::dispatch::Dispatched;
use closure_core::io::InputLevels;
use portable_atomic::{AtomicU8, AtomicU32, Ordering};

static ACTION: AtomicU8 = AtomicU8::new(0);
/// Settled inputs packed with [`InputLevels::to_mask`].
static INPUT_MASK: AtomicU8 = AtomicU8::new(0);
static TRANSITIONS: AtomicU32 = AtomicU32::new(0);
/// Entries into cooldown since boot.
static JAMS: AtomicU32 = AtomicU32::new(0);

/// Point-in-time copy of the published status.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    pub action: Action,
    pub inputs: InputLevels,
    pub transitions: u32,
    pub jams: u32,
}

pub fn record_transition(dispatched: &Dispatched) {
    ACTION.store(dispatched.transition.to.code(), Ordering::Relaxed);
    TRANSITIONS.fetch_add(1, Ordering::Relaxed);
    if dispatched.transition.is_jam() {
        JAMS.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_inputs(levels: InputLevels) {
    INPUT_MASK.store(levels.to_mask(), Ordering::Relaxed);
}

pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        action: Action::from_code(ACTION.load(Ordering::Relaxed)).unwrap_or_default(),
        inputs: InputLevels::from_mask(INPUT_MASK.load(Ordering::Relaxed)),
        transitions: TRANSITIONS.load(Ordering::Relaxed),
        jams: JAMS.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use closure_core::controller::{Cause, Transition};

    #[test]
    fn snapshot_reflects_recorded_transitions() {
        let before = snapshot();

        record_inputs(InputLevels::new(false, true, true, false));
        record_transition(&Dispatched {
            id: 0,
            cause: Cause::Level,
            transition: Transition {
                from: Action::RewindingClosed,
                to: Action::Cooldown,
                rearm: Duration::from_secs(65),
            },
        });

        let after = snapshot();
        assert_eq!(after.action, Action::Cooldown);
        assert_eq!(after.inputs, InputLevels::new(false, true, true, false));
        assert!(after.transitions > before.transitions);
        assert!(after.jams > before.jams);
    }
}
