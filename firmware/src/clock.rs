//! Embassy-backed timestamps for the core scheduler.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::{ops::Add, time::Duration};

use closure_core::schedule::MonotonicInstant;
use embassy_time::{Duration as EmbassyDuration, Instant};

/// Monotonic instant driving the dispatcher on the MCU.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    pub const fn into_embassy(self) -> Instant {
        self.0
    }

    pub fn as_millis(self) -> u64 {
        self.0.as_millis()
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl Add<Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(
            self.0
                .checked_add(to_embassy_duration(rhs))
                .unwrap_or(Instant::MAX),
        )
    }
}

impl MonotonicInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        from_embassy_duration(self.0.saturating_duration_since(earlier.0))
    }
}

/// Converts a core duration into embassy ticks, saturating on overflow.
pub fn to_embassy_duration(duration: Duration) -> EmbassyDuration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    EmbassyDuration::from_micros(micros)
}

pub fn from_embassy_duration(duration: EmbassyDuration) -> Duration {
    Duration::from_micros(duration.as_micros())
}
