use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};

use closure_core::io::PinSampler;

use crate::clock::FirmwareInstant;
use crate::hw::BoardInputs;
use crate::{log, status};

use super::FirmwareDispatcher;

/// Sole consumer of controller events: services due timers, then sleeps
/// until the next wake-up or input edge.
#[embassy_executor::task]
pub async fn run(mut dispatcher: FirmwareDispatcher, mut inputs: BoardInputs<'static>) -> ! {
    loop {
        let now = FirmwareInstant::from(Instant::now());
        dispatcher.service(now, &mut inputs, |dispatched| {
            status::record_transition(dispatched);
            log::transition(dispatched, now);
        });
        status::record_inputs(dispatcher.state().levels());

        // Edges that land while servicing are not latched by the EXTI futures.
        if !dispatcher.scheduler().settling() && inputs.sample() != dispatcher.state().levels() {
            dispatcher.pin_changed(now);
        }

        let wake_at = dispatcher
            .next_wakeup()
            .map_or(Instant::MAX, FirmwareInstant::into_embassy);

        match select(inputs.wait_for_edge(), Timer::at(wake_at)).await {
            Either::First(()) => {
                dispatcher.pin_changed(FirmwareInstant::from(Instant::now()));
            }
            Either::Second(()) => {}
        }
    }
}
