#![allow(dead_code)]

use core::{ops::Add, time::Duration};

use closure_core::config::TimingConfig;
use closure_core::controller::{Action, Event};
use closure_core::dispatch::{Dispatched, Dispatcher};
use closure_core::indicator::BlinkCounter;
use closure_core::io::{InputId, InputLevels, PinSampler, input_by_id};
use closure_core::motor::{ALL_MOTOR_LINES, Motor, MotorLine, MotorLines};
use closure_core::schedule::MonotonicInstant;

/// Millisecond clock driven by the tests.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MockInstant(pub u64);

impl MockInstant {
    pub const fn millis(value: u64) -> Self {
        Self(value)
    }
}

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

/// Motor outputs that panic the moment two lines are high together.
#[derive(Default)]
pub struct ExclusiveLines {
    pub levels: [bool; 4],
    pub writes: usize,
}

impl ExclusiveLines {
    pub fn high(&self) -> Option<MotorLine> {
        ALL_MOTOR_LINES
            .into_iter()
            .find(|line| self.levels[line.as_index()])
    }
}

impl MotorLines for ExclusiveLines {
    fn assert(&mut self, line: MotorLine) {
        self.levels[line.as_index()] = true;
        self.writes += 1;
        let high = self.levels.iter().filter(|level| **level).count();
        assert!(high <= 1, "more than one motor line high: {:?}", self.levels);
    }

    fn release(&mut self, line: MotorLine) {
        self.levels[line.as_index()] = false;
        self.writes += 1;
    }
}

/// Raw pin levels as the board would present them.
pub struct BoardPins {
    levels: InputLevels,
}

impl BoardPins {
    pub fn new(levels: InputLevels) -> Self {
        Self { levels }
    }

    pub fn set(&mut self, id: InputId, value: bool) {
        self.levels = self.levels.with(id, value);
    }
}

impl PinSampler for BoardPins {
    fn pin_high(&mut self, id: InputId) -> bool {
        // Undo the normalization so the sampler sees electrical levels.
        input_by_id(id).polarity.normalize(self.levels.get(id))
    }
}

pub type TestDispatcher = Dispatcher<MockInstant, ExclusiveLines, BlinkCounter>;

/// Dispatcher plus simulated pins and clock.
pub struct Rig {
    pub dispatcher: TestDispatcher,
    pub pins: BoardPins,
    pub now: MockInstant,
    pub log: Vec<Dispatched>,
}

impl Rig {
    /// Powers up with `levels` on the inputs.
    pub fn boot(levels: InputLevels) -> Self {
        let mut dispatcher = Dispatcher::new(
            ExclusiveLines::default(),
            BlinkCounter::new(),
            TimingConfig::DEFAULT,
        )
        .unwrap();
        let mut log = Vec::new();
        log.extend(dispatcher.boot(MockInstant(0), levels));
        Self {
            dispatcher,
            pins: BoardPins::new(levels),
            now: MockInstant(0),
            log,
        }
    }

    pub fn action(&self) -> Action {
        self.dispatcher.state().action
    }

    pub fn timing(&self) -> TimingConfig {
        *self.dispatcher.controller().timing()
    }

    pub fn lines(&self) -> &ExclusiveLines {
        self.dispatcher.controller().motors().lines()
    }

    pub fn asserted(&self, motor: Motor) -> Option<closure_core::motor::Direction> {
        self.dispatcher.controller().motors().asserted(motor)
    }

    /// Moves the clock forward, servicing every wake-up on the way.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        while let Some(wakeup) = self.dispatcher.next_wakeup() {
            if wakeup > target {
                break;
            }
            self.now = wakeup.max(self.now);
            self.service();
        }
        self.now = target;
        self.service();
    }

    /// Changes an input and lets the debouncer settle.
    pub fn flip(&mut self, id: InputId, value: bool) {
        self.pins.set(id, value);
        self.dispatcher.pin_changed(self.now);
        let settle = self.timing().debounce_settle;
        self.advance(settle);
    }

    /// Hands an event to the dispatcher, bypassing the pins.
    pub fn inject(&mut self, event: Event) {
        self.dispatcher.enqueue(event).unwrap();
        self.service();
    }

    fn service(&mut self) {
        let log = &mut self.log;
        self.dispatcher
            .service(self.now, &mut self.pins, |dispatched| log.push(*dispatched));
    }
}
