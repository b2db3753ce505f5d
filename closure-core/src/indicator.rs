//! Status indicator driven by a hardware-timed square wave.
//!
//! The lamp hangs off an 8-bit counter whose compare unit toggles the output
//! each time the count reaches [`TOGGLE_COMPARE`]. Stopping the wave is the
//! delicate part: the counter keeps whatever count it stopped at, so the next
//! start would resume mid-phase. [`IndicatorDriver::disable`] therefore
//! pre-loads the counter based on the current output level so that every
//! start goes dark at once and holds dark for a full half period.
//!
//! The lamp is wired active-low: a high output is dark. While disabled the
//! pin idles low, so an idle controller shows a steady light and a busy one
//! blinks.

/// Compare value at which the output toggles.
pub const TOGGLE_COMPARE: u8 = 1;

/// Pre-load used when the output is low: the next count toggles it high.
pub const PRELOAD_TOGGLE_NEXT: u8 = 0;

/// Pre-load used when the output is already high: the count must wrap past
/// 255 before it reaches the compare value again.
pub const PRELOAD_HOLD_FULL_CYCLE: u8 = 2;

/// Counter pre-load that makes the next start begin a fresh dark phase.
pub const fn resting_preload(output_high: bool) -> u8 {
    if output_high {
        PRELOAD_HOLD_FULL_CYCLE
    } else {
        PRELOAD_TOGGLE_NEXT
    }
}

/// Abstraction over the timer peripheral producing the square wave.
pub trait BlinkTimer {
    /// Connects the compare output to the pin and starts counting.
    fn start(&mut self);

    /// Stops the counter, keeping the current count and output level.
    fn stop(&mut self);

    /// Reads the level currently present on the indicator pin.
    fn output_high(&self) -> bool;

    /// Overwrites the counter value.
    fn preload(&mut self, count: u8);

    /// Disconnects the compare unit so the pin falls back to its idle level.
    fn disconnect(&mut self);
}

/// Timer that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopBlinkTimer;

impl NoopBlinkTimer {
    pub const fn new() -> Self {
        Self
    }
}

impl BlinkTimer for NoopBlinkTimer {
    fn start(&mut self) {}

    fn stop(&mut self) {}

    fn output_high(&self) -> bool {
        false
    }

    fn preload(&mut self, _: u8) {}

    fn disconnect(&mut self) {}
}

/// Sole owner of the indicator timer.
pub struct IndicatorDriver<T: BlinkTimer> {
    timer: T,
    enabled: bool,
}

impl<T: BlinkTimer> IndicatorDriver<T> {
    /// Takes ownership of the timer and leaves the indicator disabled.
    pub fn new(timer: T) -> Self {
        let mut driver = Self {
            timer,
            enabled: true,
        };
        driver.disable();
        driver
    }

    /// Starts the square wave. Calling it while running keeps the phase.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.timer.start();
            self.enabled = true;
        }
    }

    /// Stops the square wave and primes the counter for the next start.
    ///
    /// Does nothing while already disabled: the pin then shows its idle
    /// level, and sampling it again would discard the primed phase.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.timer.stop();
        let preload = resting_preload(self.timer.output_high());
        self.timer.preload(preload);
        self.timer.disconnect();
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn into_inner(self) -> T {
        self.timer
    }
}

/// Software model of the 8-bit toggle-on-compare counter.
///
/// Used by the emulator and the firmware blink task to reproduce the
/// hardware phase behavior tick for tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BlinkCounter {
    count: u8,
    running: bool,
    connected: bool,
    latch: bool,
    idle_level: bool,
}

impl BlinkCounter {
    /// Counter stopped at zero with the output disconnected and idling low.
    pub const fn new() -> Self {
        Self {
            count: 0,
            running: false,
            connected: false,
            latch: false,
            idle_level: false,
        }
    }

    /// Advances the counter by one timer tick. Returns `true` when the pin
    /// level changed.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.count = self.count.wrapping_add(1);
        if self.count == TOGGLE_COMPARE {
            self.latch = !self.latch;
            return self.connected;
        }
        false
    }

    /// Advances the counter by `ticks` timer ticks.
    pub fn advance(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    pub const fn count(&self) -> u8 {
        self.count
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Level currently present on the pin.
    pub const fn pin_high(&self) -> bool {
        if self.connected {
            self.latch
        } else {
            self.idle_level
        }
    }

    /// Returns `true` when the active-low lamp is lit.
    pub const fn lamp_lit(&self) -> bool {
        !self.pin_high()
    }
}

impl BlinkTimer for BlinkCounter {
    fn start(&mut self) {
        self.connected = true;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn output_high(&self) -> bool {
        self.pin_high()
    }

    fn preload(&mut self, count: u8) {
        self.count = count;
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}
