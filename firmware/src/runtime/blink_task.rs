use embassy_stm32::gpio::{Level, Output};
use embassy_time::{Duration, Ticker};

use crate::blink::BlinkShared;

/// Software stand-in for the indicator's toggle-on-compare counter.
#[embassy_executor::task]
pub async fn run(shared: &'static BlinkShared, mut pin: Output<'static>, tick: Duration) -> ! {
    let mut ticker = Ticker::every(tick);
    loop {
        pin.set_level(Level::from(shared.pin_high()));
        if shared.is_running() {
            ticker.next().await;
            shared.tick();
        } else {
            shared.wait_started().await;
            ticker.reset();
        }
    }
}
