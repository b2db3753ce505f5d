mod support;

use core::time::Duration;

use closure_core::controller::{Action, Cause};
use closure_core::io::{ALL_INPUTS, InputId, InputLevels};
use closure_core::motor::Motor;

use support::Rig;

/// Small deterministic generator so the walk is reproducible.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        self.0 >> 8
    }
}

fn advance_to_wakeup(rig: &mut Rig) {
    if let Some(deadline) = rig.dispatcher.next_wakeup() {
        rig.advance(Duration::from_millis(deadline.0.saturating_sub(rig.now.0)));
    }
}

/// The idle re-check starts the inner door with the indicator left off.
fn indicator_forced_off(rig: &Rig) -> bool {
    rig.log.last().is_some_and(|last| {
        last.cause == Cause::Deadline
            && last.transition.from == Action::Idle
            && last.transition.to == Action::MovingInner
    })
}

fn check_outputs(rig: &Rig) {
    // ExclusiveLines already panics on overlap at write time.
    let inner = rig.asserted(Motor::Inner);
    let outer = rig.asserted(Motor::Outer);
    assert!(inner.is_none() || outer.is_none());

    let action = rig.action();
    if action != Action::MovingInner {
        assert_eq!(inner, None, "inner motor running in {action}");
    }
    if matches!(action, Action::Idle | Action::Cooldown) {
        assert_eq!(rig.lines().high(), None, "motor running in {action}");
    }

    let expected = action.is_active() && !indicator_forced_off(rig);
    assert_eq!(
        rig.dispatcher.controller().indicator().is_enabled(),
        expected,
        "indicator in {action}"
    );
}

#[test]
fn scripted_tour_visits_every_state() {
    let mut rig = Rig::boot(InputLevels::default());
    let mut tour = vec![rig.action()];

    for _ in 0..3 {
        advance_to_wakeup(&mut rig);
        check_outputs(&rig);
        tour.push(rig.action());
    }
    rig.flip(InputId::SwitchOuterClosed, true);
    for _ in 0..2 {
        advance_to_wakeup(&mut rig);
        check_outputs(&rig);
        tour.push(rig.action());
    }
    rig.flip(InputId::SensorClosed, true);
    check_outputs(&rig);
    tour.push(rig.action());

    assert_eq!(
        tour,
        [
            Action::MovingInner,
            Action::MovingOuter,
            Action::RewindingOpen,
            Action::Cooldown,
            Action::MovingOuter,
            Action::RewindingClosed,
            Action::Idle,
        ]
    );
}

#[test]
fn no_two_motor_lines_are_ever_high_together() {
    let mut rng = Lcg(0x5eed);
    let mut rig = Rig::boot(InputLevels::default());

    for _ in 0..2_000 {
        match rng.next() % 3 {
            0 => {
                let line = ALL_INPUTS[usize::try_from(rng.next() % 4).unwrap()];
                let value = !rig.dispatcher.state().levels().get(line.id);
                rig.flip(line.id, value);
            }
            1 => rig.advance(Duration::from_millis(u64::from(rng.next() % 20_000))),
            _ => advance_to_wakeup(&mut rig),
        }
        check_outputs(&rig);
    }

    assert!(rig.lines().writes > 0);
}
