mod support;

use closure_core::controller::{Action, Event};
use closure_core::io::{InputId, InputLevels};
use closure_core::motor::{Direction, Motor};

use support::Rig;

/// Inner door done, shutter commanded closed and stuck between stops.
fn stuck_closing() -> Rig {
    let mut rig = Rig::boot(InputLevels::new(false, true, false, false));
    rig.advance(rig.timing().inner_travel);
    assert_eq!(rig.action(), Action::MovingOuter);
    rig
}

fn stuck_opening() -> Rig {
    let mut rig = Rig::boot(InputLevels::new(false, false, false, false));
    rig.advance(rig.timing().inner_travel);
    assert_eq!(rig.action(), Action::MovingOuter);
    assert_eq!(rig.asserted(Motor::Outer), Some(Direction::Up));
    rig
}

#[test]
fn rewind_closed_succeeds_on_closed_sensor() {
    let mut rig = stuck_closing();

    rig.advance(rig.timing().outer_travel);
    assert_eq!(rig.action(), Action::RewindingClosed);
    assert_eq!(rig.asserted(Motor::Outer), Some(Direction::Up));

    rig.flip(InputId::SensorClosed, true);
    assert_eq!(rig.action(), Action::Idle);
    assert!(rig.dispatcher.controller().motors().is_stopped());
}

#[test]
fn rewind_open_succeeds_on_either_sensor() {
    for sensor in [InputId::SensorOpen, InputId::SensorClosed] {
        let mut rig = stuck_opening();
        rig.advance(rig.timing().outer_travel);
        assert_eq!(rig.action(), Action::RewindingOpen);
        assert_eq!(rig.asserted(Motor::Outer), Some(Direction::Down));

        rig.flip(sensor, true);
        let expected = if sensor == InputId::SensorOpen {
            Action::Idle
        } else {
            // Caught on the closed stop: try the open travel again.
            Action::MovingOuter
        };
        assert_eq!(rig.action(), expected);
    }
}

#[test]
fn open_sensor_during_closed_rewind_is_a_jam() {
    let mut rig = stuck_closing();
    rig.advance(rig.timing().outer_travel);

    rig.flip(InputId::SensorOpen, true);
    assert_eq!(rig.action(), Action::Cooldown);
    assert!(rig.dispatcher.controller().motors().is_stopped());
    assert_eq!(rig.lines().high(), None);
    assert!(rig.log.last().unwrap().transition.is_jam());
}

#[test]
fn rewind_timeout_escalates_to_cooldown() {
    let mut rig = stuck_closing();
    let timing = rig.timing();
    rig.advance(timing.outer_travel);
    rig.advance(timing.rewind_timeout);

    assert_eq!(rig.action(), Action::Cooldown);
    assert!(rig.dispatcher.controller().indicator().is_enabled());
    assert_eq!(rig.lines().high(), None);
}

#[test]
fn unrelated_level_event_keeps_rewinding() {
    let mut rig = stuck_closing();
    rig.advance(rig.timing().outer_travel);

    rig.inject(Event::LevelChanged(InputLevels::new(false, true, false, false)));
    assert_eq!(rig.action(), Action::RewindingClosed);
}

#[test]
fn jam_settling_on_the_rewind_deadline_still_cools_down() {
    let mut rig = stuck_closing();
    let timing = rig.timing();
    rig.advance(timing.outer_travel);
    assert_eq!(rig.action(), Action::RewindingClosed);

    // The open sensor settles on the same instant the rewind deadline expires.
    rig.advance(timing.rewind_timeout - timing.debounce_settle);
    assert_eq!(rig.action(), Action::RewindingClosed);
    rig.flip(InputId::SensorOpen, true);

    assert_eq!(rig.action(), Action::Cooldown);
    let last = rig.log.last().unwrap();
    assert_eq!(last.transition.from, Action::RewindingClosed);
    assert!(last.transition.is_jam());

    rig.advance(timing.cooldown - core::time::Duration::from_millis(1));
    assert_eq!(rig.action(), Action::Cooldown);
    assert_eq!(rig.lines().high(), None);
}

#[test]
fn both_sensors_during_closed_rewind_resolve_instead_of_jamming() {
    let mut rig = stuck_closing();
    rig.advance(rig.timing().outer_travel);
    assert_eq!(rig.action(), Action::RewindingClosed);

    rig.pins.set(InputId::SensorOpen, true);
    rig.flip(InputId::SensorClosed, true);
    assert_eq!(rig.action(), Action::Idle);
    assert!(rig.log.iter().all(|dispatched| !dispatched.transition.is_jam()));
}

#[test]
fn both_sensors_while_closing_count_as_done() {
    let mut rig = stuck_closing();
    assert_eq!(rig.asserted(Motor::Outer), Some(Direction::Down));

    rig.pins.set(InputId::SensorOpen, true);
    rig.flip(InputId::SensorClosed, true);
    assert_eq!(rig.action(), Action::Idle);
    assert!(rig.dispatcher.controller().motors().is_stopped());
}
