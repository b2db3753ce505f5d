use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_time::{Instant, Timer};

use closure_core::config::{POWER_ON_SETTLE, TimingConfig};
use closure_core::dispatch::Dispatcher;
use closure_core::io::{InputId, PinSampler};

use crate::blink::{BlinkShared, SharedBlinkTimer};
use crate::clock::{FirmwareInstant, to_embassy_duration};
use crate::hw::{BoardInputs, BoardMotorLines, pull_for};
use crate::{log, status};

mod blink_task;
mod control_task;
mod heartbeat_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) type FirmwareDispatcher =
    Dispatcher<FirmwareInstant, BoardMotorLines<'static>, SharedBlinkTimer<'static>>;

pub(super) static BLINK: BlinkShared = BlinkShared::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA6,
        PA7,
        PB2,
        PB3,
        PB4,
        PB5,
        PB6,
        EXTI0,
        EXTI1,
        EXTI6,
        EXTI7,
        ..
    } = hal::init(config);

    let lines = BoardMotorLines::new(
        Output::new(PB3, Level::Low, Speed::Low),
        Output::new(PB4, Level::Low, Speed::Low),
        Output::new(PB5, Level::Low, Speed::Low),
        Output::new(PB6, Level::Low, Speed::Low),
    );
    // Low until the blink task takes over: steady light.
    let indicator = Output::new(PB2, Level::Low, Speed::Low);
    let mut inputs = BoardInputs::new(
        ExtiInput::new(PA0, EXTI0, pull_for(InputId::SwitchInnerOpen)),
        ExtiInput::new(PA1, EXTI1, pull_for(InputId::SwitchOuterClosed)),
        ExtiInput::new(PA6, EXTI6, pull_for(InputId::SensorOpen)),
        ExtiInput::new(PA7, EXTI7, pull_for(InputId::SensorClosed)),
    );

    let timing = TimingConfig::DEFAULT;
    let mut dispatcher = FirmwareDispatcher::new(lines, SharedBlinkTimer::new(&BLINK), timing)
        .expect("default timing rejected");

    // Let the sensor pull-ups charge before the first sample.
    Timer::after(to_embassy_duration(POWER_ON_SETTLE)).await;

    let now = FirmwareInstant::from(Instant::now());
    let levels = inputs.sample();
    log::boot(levels, now);
    status::record_inputs(levels);
    if let Some(dispatched) = dispatcher.boot(now, levels) {
        status::record_transition(&dispatched);
        log::transition(&dispatched, now);
    }

    spawner
        .spawn(blink_task::run(
            &BLINK,
            indicator,
            to_embassy_duration(timing.blink_tick()),
        ))
        .expect("failed to spawn blink task");

    spawner
        .spawn(control_task::run(dispatcher, inputs))
        .expect("failed to spawn control task");

    spawner
        .spawn(heartbeat_task::run())
        .expect("failed to spawn heartbeat task");

    core::future::pending::<()>().await;
}
