//! Indicator counter shared between the control task and the blink task.
//!
//! The controller drives the indicator through [`SharedBlinkTimer`]; the
//! blink task advances the same [`BlinkCounter`] once per counter tick and
//! mirrors its pin level onto the GPIO.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::cell::RefCell;

use closure_core::indicator::{BlinkCounter, BlinkTimer};
use embassy_sync::blocking_mutex::Mutex;
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::signal::Signal;

#[cfg(target_os = "none")]
type BlinkMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type BlinkMutex = NoopRawMutex;

pub struct BlinkShared {
    counter: Mutex<BlinkMutex, RefCell<BlinkCounter>>,
    started: Signal<BlinkMutex, ()>,
}

impl BlinkShared {
    pub const fn new() -> Self {
        Self {
            counter: Mutex::new(RefCell::new(BlinkCounter::new())),
            started: Signal::new(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut BlinkCounter) -> R) -> R {
        self.counter.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Advances the counter by one tick. Returns `true` if the pin toggled.
    pub fn tick(&self) -> bool {
        self.with(BlinkCounter::tick)
    }

    pub fn pin_high(&self) -> bool {
        self.with(|counter| counter.pin_high())
    }

    pub fn is_running(&self) -> bool {
        self.with(|counter| counter.is_running())
    }

    /// Waits until the controller starts the square wave.
    pub async fn wait_started(&self) {
        self.started.wait().await;
    }
}

/// [`BlinkTimer`] handle owned by the controller.
pub struct SharedBlinkTimer<'a> {
    shared: &'a BlinkShared,
}

impl<'a> SharedBlinkTimer<'a> {
    pub const fn new(shared: &'a BlinkShared) -> Self {
        Self { shared }
    }
}

impl BlinkTimer for SharedBlinkTimer<'_> {
    fn start(&mut self) {
        self.shared.with(BlinkCounter::start);
        self.shared.started.signal(());
    }

    fn stop(&mut self) {
        self.shared.with(BlinkCounter::stop);
    }

    fn output_high(&self) -> bool {
        self.shared.pin_high()
    }

    fn preload(&mut self, count: u8) {
        self.shared.with(|counter| counter.preload(count));
    }

    fn disconnect(&mut self) {
        self.shared.with(BlinkCounter::disconnect);
    }
}
