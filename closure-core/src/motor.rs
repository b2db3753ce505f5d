//! Motor output lines and the exclusive-direction driver.
//!
//! Each door motor is wired to an H-bridge with one "up" and one "down"
//! input. Asserting both at once shorts the bridge, so every write goes
//! through [`MotorDriver`], which releases before it asserts.

/// The two door motors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Motor {
    Inner,
    Outer,
}

impl Motor {
    const fn as_index(self) -> usize {
        match self {
            Motor::Inner => 0,
            Motor::Outer => 1,
        }
    }
}

/// Direction of travel for a motor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Inner door direction requested by the inner switch: open means up.
    pub const fn for_inner_switch(sw_inner_open: bool) -> Self {
        if sw_inner_open {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Outer shutter direction requested by the outer switch: closed means down.
    pub const fn for_outer_switch(sw_outer_closed: bool) -> Self {
        if sw_outer_closed {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Physical output line driving one side of an H-bridge.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MotorLine {
    InnerUp,
    InnerDown,
    OuterUp,
    OuterDown,
}

impl MotorLine {
    /// Deterministic index for lookups into [`ALL_MOTOR_LINES`].
    pub const fn as_index(self) -> usize {
        match self {
            MotorLine::InnerUp => 0,
            MotorLine::InnerDown => 1,
            MotorLine::OuterUp => 2,
            MotorLine::OuterDown => 3,
        }
    }

    /// Line that moves `motor` in `direction`.
    pub const fn for_motor(motor: Motor, direction: Direction) -> Self {
        match (motor, direction) {
            (Motor::Inner, Direction::Up) => MotorLine::InnerUp,
            (Motor::Inner, Direction::Down) => MotorLine::InnerDown,
            (Motor::Outer, Direction::Up) => MotorLine::OuterUp,
            (Motor::Outer, Direction::Down) => MotorLine::OuterDown,
        }
    }

    /// Both lines belonging to `motor`.
    pub const fn pair(motor: Motor) -> [MotorLine; 2] {
        [
            MotorLine::for_motor(motor, Direction::Up),
            MotorLine::for_motor(motor, Direction::Down),
        ]
    }

    pub const fn motor(self) -> Motor {
        match self {
            MotorLine::InnerUp | MotorLine::InnerDown => Motor::Inner,
            MotorLine::OuterUp | MotorLine::OuterDown => Motor::Outer,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            MotorLine::InnerUp => "INNER_UP",
            MotorLine::InnerDown => "INNER_DOWN",
            MotorLine::OuterUp => "OUTER_UP",
            MotorLine::OuterDown => "OUTER_DOWN",
        }
    }

    /// MCU pin wired to the line.
    pub const fn mcu_pin(self) -> &'static str {
        match self {
            MotorLine::InnerUp => "PB3",
            MotorLine::InnerDown => "PB4",
            MotorLine::OuterUp => "PB5",
            MotorLine::OuterDown => "PB6",
        }
    }
}

/// Every motor line in index order.
pub const ALL_MOTOR_LINES: [MotorLine; 4] = [
    MotorLine::InnerUp,
    MotorLine::InnerDown,
    MotorLine::OuterUp,
    MotorLine::OuterDown,
];

/// Abstraction over the physical motor outputs.
pub trait MotorLines {
    /// Drives the line high.
    fn assert(&mut self, line: MotorLine);

    /// Drives the line low.
    fn release(&mut self, line: MotorLine);
}

/// Motor outputs that perform no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopMotorLines;

impl NoopMotorLines {
    pub const fn new() -> Self {
        Self
    }
}

impl MotorLines for NoopMotorLines {
    fn assert(&mut self, _: MotorLine) {}

    fn release(&mut self, _: MotorLine) {}
}

/// Sole writer of the motor outputs.
///
/// Tracks which direction is asserted per motor so callers can compare the
/// running direction against a fresh switch reading.
pub struct MotorDriver<L: MotorLines> {
    lines: L,
    asserted: [Option<Direction>; 2],
}

impl<L: MotorLines> MotorDriver<L> {
    /// Takes ownership of the lines and releases all of them.
    pub fn new(lines: L) -> Self {
        let mut driver = Self {
            lines,
            asserted: [None; 2],
        };
        driver.release_all();
        driver
    }

    /// Releases both lines of `motor`, then asserts the one for `direction`.
    pub fn set(&mut self, motor: Motor, direction: Option<Direction>) {
        for line in MotorLine::pair(motor) {
            self.lines.release(line);
        }
        self.asserted[motor.as_index()] = None;

        if let Some(direction) = direction {
            self.lines.assert(MotorLine::for_motor(motor, direction));
            self.asserted[motor.as_index()] = Some(direction);
        }
    }

    /// Releases every motor line.
    pub fn release_all(&mut self) {
        for line in ALL_MOTOR_LINES {
            self.lines.release(line);
        }
        self.asserted = [None; 2];
    }

    /// Releases every line, then runs a single motor.
    pub fn run_only(&mut self, motor: Motor, direction: Direction) {
        self.release_all();
        self.set(motor, Some(direction));
    }

    /// Direction currently asserted on `motor`, if any.
    pub fn asserted(&self, motor: Motor) -> Option<Direction> {
        self.asserted[motor.as_index()]
    }

    /// Returns `true` when no motor line is asserted.
    pub fn is_stopped(&self) -> bool {
        self.asserted.iter().all(Option::is_none)
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn into_inner(self) -> L {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    #[derive(Default)]
    struct RecordingLines {
        levels: [bool; 4],
        writes: Vec<(MotorLine, bool), 16>,
    }

    impl MotorLines for RecordingLines {
        fn assert(&mut self, line: MotorLine) {
            self.levels[line.as_index()] = true;
            let _ = self.writes.push((line, true));
            for motor in [Motor::Inner, Motor::Outer] {
                let [up, down] = MotorLine::pair(motor);
                assert!(
                    !(self.levels[up.as_index()] && self.levels[down.as_index()]),
                    "both directions asserted on {motor:?}"
                );
            }
        }

        fn release(&mut self, line: MotorLine) {
            self.levels[line.as_index()] = false;
            let _ = self.writes.push((line, false));
        }
    }

    #[test]
    fn new_driver_releases_every_line() {
        let driver = MotorDriver::new(RecordingLines::default());
        assert!(driver.is_stopped());
        assert_eq!(driver.lines().writes.len(), 4);
        assert!(driver.lines().writes.iter().all(|(_, high)| !high));
    }

    #[test]
    fn set_releases_both_sides_before_asserting() {
        let mut driver = MotorDriver::new(RecordingLines::default());
        driver.set(Motor::Inner, Some(Direction::Up));
        driver.lines_mut().writes.clear();

        driver.set(Motor::Inner, Some(Direction::Down));
        assert_eq!(
            driver.lines().writes.as_slice(),
            &[
                (MotorLine::InnerUp, false),
                (MotorLine::InnerDown, false),
                (MotorLine::InnerDown, true),
            ]
        );
        assert_eq!(driver.asserted(Motor::Inner), Some(Direction::Down));
        assert_eq!(driver.asserted(Motor::Outer), None);
    }

    #[test]
    fn run_only_stops_the_other_motor() {
        let mut driver = MotorDriver::new(RecordingLines::default());
        driver.set(Motor::Inner, Some(Direction::Up));
        driver.run_only(Motor::Outer, Direction::Down);

        assert_eq!(driver.asserted(Motor::Inner), None);
        assert_eq!(driver.asserted(Motor::Outer), Some(Direction::Down));
        assert_eq!(driver.lines().levels, [false, false, false, true]);

        driver.set(Motor::Outer, None);
        assert!(driver.is_stopped());
    }

    #[test]
    fn switch_directions_follow_wiring() {
        assert_eq!(Direction::for_inner_switch(true), Direction::Up);
        assert_eq!(Direction::for_inner_switch(false), Direction::Down);
        assert_eq!(Direction::for_outer_switch(true), Direction::Down);
        assert_eq!(Direction::for_outer_switch(false), Direction::Up);
    }
}
