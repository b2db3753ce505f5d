use embassy_time::{Duration, Ticker};

use crate::{log, status};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

#[embassy_executor::task]
pub async fn run() -> ! {
    let mut ticker = Ticker::every(HEARTBEAT_PERIOD);
    loop {
        ticker.next().await;
        log::heartbeat(status::snapshot());
    }
}
