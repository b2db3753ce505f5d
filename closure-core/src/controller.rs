//! Action state machine for the two-stage closure.
//!
//! The controller owns the [`SystemState`], the motor driver and the
//! indicator driver. It reacts to two kinds of [`Event`]: settled input
//! levels and expiry of the single action deadline. Every state entry
//! releases all motor lines, asserts at most one, updates the indicator and
//! returns the deadline the caller must arm next.

use core::{fmt, time::Duration};

use crate::config::TimingConfig;
use crate::indicator::{BlinkTimer, IndicatorDriver};
use crate::io::InputLevels;
use crate::motor::{Direction, Motor, MotorDriver, MotorLines};

/// What the controller is currently doing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Action {
    #[default]
    Idle,
    MovingInner,
    MovingOuter,
    RewindingClosed,
    RewindingOpen,
    Cooldown,
}

impl Action {
    /// Every action in code order.
    pub const ALL: [Action; 6] = [
        Action::Idle,
        Action::MovingInner,
        Action::MovingOuter,
        Action::RewindingClosed,
        Action::RewindingOpen,
        Action::Cooldown,
    ];

    /// Returns `true` when the controller is doing work (indicator blinking).
    pub const fn is_active(self) -> bool {
        !matches!(self, Action::Idle)
    }

    /// Returns `true` for the recovery states entered after a travel timeout.
    pub const fn is_rewinding(self) -> bool {
        matches!(self, Action::RewindingClosed | Action::RewindingOpen)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::MovingInner => "moving-inner",
            Action::MovingOuter => "moving-outer",
            Action::RewindingClosed => "rewinding-closed",
            Action::RewindingOpen => "rewinding-open",
            Action::Cooldown => "cooldown",
        }
    }

    /// Compact code used by status registers.
    pub const fn code(self) -> u8 {
        match self {
            Action::Idle => 0,
            Action::MovingInner => 1,
            Action::MovingOuter => 2,
            Action::RewindingClosed => 3,
            Action::RewindingOpen => 4,
            Action::Cooldown => 5,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Action::Idle),
            1 => Some(Action::MovingInner),
            2 => Some(Action::MovingOuter),
            3 => Some(Action::RewindingClosed),
            4 => Some(Action::RewindingOpen),
            5 => Some(Action::Cooldown),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Single authoritative record of the controller's knowledge.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SystemState {
    pub action: Action,
    pub sw_inner_open: bool,
    pub sw_outer_closed: bool,
    pub sens_open: bool,
    pub sens_closed: bool,
    /// Set once the inner motor ran its full travel time without the switch
    /// flipping underneath it.
    pub inner_done: bool,
}

impl SystemState {
    /// Power-on state: idle with every flag cleared.
    pub const fn new() -> Self {
        Self {
            action: Action::Idle,
            sw_inner_open: false,
            sw_outer_closed: false,
            sens_open: false,
            sens_closed: false,
            inner_done: false,
        }
    }

    /// Returns `true` when the outer door sits on the end-stop its switch
    /// asks for. Both sensors asserted satisfies either side.
    pub const fn outer_done(&self) -> bool {
        (self.sw_outer_closed && self.sens_closed) || (!self.sw_outer_closed && self.sens_open)
    }

    /// Copies a settled snapshot in. A change of the inner switch starts a
    /// new inner cycle.
    pub fn apply_levels(&mut self, levels: InputLevels) {
        if levels.sw_inner_open != self.sw_inner_open {
            self.inner_done = false;
        }
        self.sw_inner_open = levels.sw_inner_open;
        self.sw_outer_closed = levels.sw_outer_closed;
        self.sens_open = levels.sens_open;
        self.sens_closed = levels.sens_closed;
    }

    pub const fn levels(&self) -> InputLevels {
        InputLevels::new(
            self.sw_inner_open,
            self.sw_outer_closed,
            self.sens_open,
            self.sens_closed,
        )
    }
}

/// Stimulus consumed by the controller, one at a time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Debounced snapshot of every input line.
    LevelChanged(InputLevels),
    /// The pending action deadline expired.
    DeadlineFired,
}

/// Why a transition happened.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cause {
    Boot,
    Level,
    Deadline,
}

impl From<&Event> for Cause {
    fn from(event: &Event) -> Self {
        match event {
            Event::LevelChanged(_) => Cause::Level,
            Event::DeadlineFired => Cause::Deadline,
        }
    }
}

impl Cause {
    pub const fn label(self) -> &'static str {
        match self {
            Cause::Boot => "boot",
            Cause::Level => "level",
            Cause::Deadline => "deadline",
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State entry performed while handling an event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    pub from: Action,
    pub to: Action,
    /// Deadline to arm relative to the handling instant.
    pub rearm: Duration,
}

impl Transition {
    /// Returns `true` when the rewind mechanism was declared jammed.
    pub const fn is_jam(&self) -> bool {
        matches!(self.to, Action::Cooldown)
    }
}

/// Core state machine driving both motors and the indicator.
pub struct ActionController<L: MotorLines, T: BlinkTimer> {
    state: SystemState,
    motors: MotorDriver<L>,
    indicator: IndicatorDriver<T>,
    timing: TimingConfig,
}

impl<L: MotorLines, T: BlinkTimer> ActionController<L, T> {
    /// Takes ownership of the outputs, releasing every motor line and
    /// leaving the indicator disabled.
    pub fn new(lines: L, timer: T, timing: TimingConfig) -> Self {
        Self {
            state: SystemState::new(),
            motors: MotorDriver::new(lines),
            indicator: IndicatorDriver::new(timer),
            timing,
        }
    }

    /// Runs the handler for `event`. Returns the entered state, if any, and
    /// the deadline that must replace the pending one.
    pub fn handle(&mut self, event: Event) -> Option<Transition> {
        match event {
            Event::LevelChanged(levels) => self.on_level(levels),
            Event::DeadlineFired => Some(self.on_deadline()),
        }
    }

    fn on_level(&mut self, levels: InputLevels) -> Option<Transition> {
        self.state.apply_levels(levels);
        let state = self.state;

        match state.action {
            Action::Idle => Some(self.resolve_idle_motion()),
            Action::MovingInner | Action::Cooldown => None,
            Action::MovingOuter | Action::RewindingOpen => (state.sens_open || state.sens_closed)
                .then(|| self.resolve_idle_motion()),
            Action::RewindingClosed => {
                if state.sens_closed {
                    Some(self.resolve_idle_motion())
                } else if state.sens_open {
                    // Came back up the spooling side: treat as a jam.
                    Some(self.enter(Action::Cooldown))
                } else {
                    None
                }
            }
        }
    }

    fn on_deadline(&mut self) -> Transition {
        match self.state.action {
            Action::Idle => {
                self.state.inner_done = false;
                let transition = self.resolve_idle_motion();
                self.indicator.disable();
                transition
            }
            Action::MovingInner => {
                let expected = Direction::for_inner_switch(self.state.sw_inner_open);
                if self.motors.asserted(Motor::Inner) == Some(expected) {
                    self.state.inner_done = true;
                }
                self.resolve_idle_motion()
            }
            Action::MovingOuter => {
                if self.state.sw_outer_closed {
                    self.enter(Action::RewindingClosed)
                } else {
                    self.enter(Action::RewindingOpen)
                }
            }
            Action::RewindingClosed | Action::RewindingOpen => self.enter(Action::Cooldown),
            Action::Cooldown => self.resolve_idle_motion(),
        }
    }

    /// Picks the next motion: inner door first, then outer, else idle.
    fn resolve_idle_motion(&mut self) -> Transition {
        let next = if !self.state.inner_done {
            Action::MovingInner
        } else if !self.state.outer_done() {
            Action::MovingOuter
        } else {
            Action::Idle
        };
        self.enter(next)
    }

    fn enter(&mut self, action: Action) -> Transition {
        let from = self.state.action;
        let rearm = match action {
            Action::Idle => {
                self.motors.release_all();
                self.indicator.disable();
                self.timing.idle_recheck
            }
            Action::MovingInner => {
                let direction = Direction::for_inner_switch(self.state.sw_inner_open);
                self.motors.run_only(Motor::Inner, direction);
                self.indicator.enable();
                self.timing.inner_travel
            }
            Action::MovingOuter => {
                let direction = Direction::for_outer_switch(self.state.sw_outer_closed);
                self.motors.run_only(Motor::Outer, direction);
                self.indicator.enable();
                self.timing.outer_travel
            }
            Action::RewindingClosed => {
                self.motors.run_only(Motor::Outer, Direction::Up);
                self.indicator.enable();
                self.timing.rewind_timeout
            }
            Action::RewindingOpen => {
                self.motors.run_only(Motor::Outer, Direction::Down);
                self.indicator.enable();
                self.timing.rewind_timeout
            }
            Action::Cooldown => {
                self.motors.release_all();
                self.indicator.enable();
                self.timing.cooldown
            }
        };
        self.state.action = action;

        Transition {
            from,
            to: action,
            rearm,
        }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn action(&self) -> Action {
        self.state.action
    }

    pub fn motors(&self) -> &MotorDriver<L> {
        &self.motors
    }

    pub fn indicator(&self) -> &IndicatorDriver<T> {
        &self.indicator
    }

    pub fn indicator_mut(&mut self) -> &mut IndicatorDriver<T> {
        &mut self.indicator
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::NoopBlinkTimer;
    use crate::motor::NoopMotorLines;

    fn controller() -> ActionController<NoopMotorLines, NoopBlinkTimer> {
        ActionController::new(
            NoopMotorLines::new(),
            NoopBlinkTimer::new(),
            TimingConfig::DEFAULT,
        )
    }

    fn levels(inner_open: bool, outer_closed: bool, open: bool, closed: bool) -> Event {
        Event::LevelChanged(InputLevels::new(inner_open, outer_closed, open, closed))
    }

    #[test]
    fn outer_done_follows_commanded_side() {
        let mut state = SystemState::new();
        state.sw_outer_closed = true;
        state.sens_closed = true;
        assert!(state.outer_done());

        state.sw_outer_closed = false;
        assert!(!state.outer_done());

        state.sens_open = true;
        assert!(state.outer_done());
    }

    #[test]
    fn inner_switch_change_clears_inner_done() {
        let mut state = SystemState::new();
        state.inner_done = true;
        state.apply_levels(InputLevels::new(false, true, false, false));
        assert!(state.inner_done);

        state.apply_levels(InputLevels::new(true, true, false, false));
        assert!(!state.inner_done);
    }

    #[test]
    fn boot_level_starts_the_inner_door() {
        let mut controller = controller();
        let transition = controller.handle(levels(true, false, false, false)).unwrap();

        assert_eq!(transition.from, Action::Idle);
        assert_eq!(transition.to, Action::MovingInner);
        assert_eq!(transition.rearm, TimingConfig::DEFAULT.inner_travel);
        assert_eq!(controller.motors().asserted(Motor::Inner), Some(Direction::Up));
        assert!(controller.indicator().is_enabled());
    }

    #[test]
    fn level_events_are_ignored_while_the_inner_door_moves() {
        let mut controller = controller();
        controller.handle(levels(true, false, false, false));
        assert_eq!(controller.handle(levels(true, true, true, false)), None);
        assert_eq!(controller.action(), Action::MovingInner);
    }

    #[test]
    fn outer_travel_timeout_starts_the_matching_rewind() {
        let mut controller = controller();
        controller.handle(levels(false, true, false, false));
        controller.handle(Event::DeadlineFired);
        assert_eq!(controller.action(), Action::MovingOuter);
        assert_eq!(controller.motors().asserted(Motor::Outer), Some(Direction::Down));

        let transition = controller.handle(Event::DeadlineFired).unwrap();
        assert_eq!(transition.to, Action::RewindingClosed);
        assert_eq!(transition.rearm, TimingConfig::DEFAULT.rewind_timeout);
        assert_eq!(controller.motors().asserted(Motor::Outer), Some(Direction::Up));
    }

    #[test]
    fn idle_deadline_forces_the_indicator_off() {
        let mut controller = controller();
        controller.handle(levels(false, false, true, false));
        controller.handle(Event::DeadlineFired);
        assert_eq!(controller.action(), Action::Idle);

        let transition = controller.handle(Event::DeadlineFired).unwrap();
        assert_eq!(transition.to, Action::MovingInner);
        assert!(!controller.indicator().is_enabled());
    }

    #[test]
    fn action_codes_are_stable() {
        for action in Action::ALL {
            assert_eq!(Action::from_code(action.code()), Some(action));
        }
        assert_eq!(Action::from_code(6), None);
    }
}
