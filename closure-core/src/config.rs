//! Timing configuration for the controller.
//!
//! Defaults come from the free-running deadline counter of the controller
//! board: a 128 kHz clock divided by 1024 gives one tick every 8 ms, and
//! each deadline is a whole number of ticks. The indicator counter runs at
//! 500 Hz and toggles every 256 counts.

use core::{fmt, time::Duration};

/// Period of one deadline counter tick.
pub const TICK: Duration = Duration::from_millis(8);

/// Converts deadline counter ticks into a [`Duration`].
pub const fn ticks(count: u32) -> Duration {
    TICK.saturating_mul(count)
}

/// Delay after power-on before the pulled-up inputs are sampled.
pub const POWER_ON_SETTLE: Duration = Duration::from_millis(5);

/// Debounce settle time: 4 ticks.
pub const DEBOUNCE_SETTLE: Duration = ticks(4);
/// Inner door travel time: 0x0100 ticks.
pub const INNER_TRAVEL: Duration = ticks(0x0100);
/// Outer door travel time before a rewind starts: 0x0400 ticks.
pub const OUTER_TRAVEL: Duration = ticks(0x0400);
/// Time allowed for a rewind to reach an end-stop: 0x0800 ticks.
pub const REWIND_TIMEOUT: Duration = ticks(0x0800);
/// Motor-off penalty after a jam: 0x2000 ticks.
pub const COOLDOWN: Duration = ticks(0x2000);
/// Periodic re-check while idle: 0x8000 ticks.
pub const IDLE_RECHECK: Duration = ticks(0x8000);
/// Full indicator period: two toggles, 256 counts each at 500 Hz.
pub const BLINK_PERIOD: Duration = Duration::from_millis(1_024);

/// Number of indicator counter ticks in one blink period.
pub const BLINK_COUNTS_PER_PERIOD: u32 = 512;

/// Boot-time timing constants.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimingConfig {
    pub debounce_settle: Duration,
    pub inner_travel: Duration,
    pub outer_travel: Duration,
    pub rewind_timeout: Duration,
    pub idle_recheck: Duration,
    pub cooldown: Duration,
    pub blink_period: Duration,
}

impl TimingConfig {
    pub const DEFAULT: Self = Self {
        debounce_settle: DEBOUNCE_SETTLE,
        inner_travel: INNER_TRAVEL,
        outer_travel: OUTER_TRAVEL,
        rewind_timeout: REWIND_TIMEOUT,
        idle_recheck: IDLE_RECHECK,
        cooldown: COOLDOWN,
        blink_period: BLINK_PERIOD,
    };

    #[must_use]
    pub const fn with_debounce_settle(mut self, value: Duration) -> Self {
        self.debounce_settle = value;
        self
    }

    #[must_use]
    pub const fn with_inner_travel(mut self, value: Duration) -> Self {
        self.inner_travel = value;
        self
    }

    #[must_use]
    pub const fn with_outer_travel(mut self, value: Duration) -> Self {
        self.outer_travel = value;
        self
    }

    #[must_use]
    pub const fn with_rewind_timeout(mut self, value: Duration) -> Self {
        self.rewind_timeout = value;
        self
    }

    #[must_use]
    pub const fn with_idle_recheck(mut self, value: Duration) -> Self {
        self.idle_recheck = value;
        self
    }

    #[must_use]
    pub const fn with_cooldown(mut self, value: Duration) -> Self {
        self.cooldown = value;
        self
    }

    #[must_use]
    pub const fn with_blink_period(mut self, value: Duration) -> Self {
        self.blink_period = value;
        self
    }

    /// Divides every duration by `factor`. Used by the emulator to compress
    /// minutes of wall time into seconds.
    #[must_use]
    pub fn scaled_down(self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            debounce_settle: self.debounce_settle / factor,
            inner_travel: self.inner_travel / factor,
            outer_travel: self.outer_travel / factor,
            rewind_timeout: self.rewind_timeout / factor,
            idle_recheck: self.idle_recheck / factor,
            cooldown: self.cooldown / factor,
            blink_period: self.blink_period / factor,
        }
    }

    /// Duration of a single indicator counter tick.
    pub fn blink_tick(&self) -> Duration {
        self.blink_period / BLINK_COUNTS_PER_PERIOD
    }

    /// Shortest deadline the controller ever arms.
    pub fn shortest_motion(&self) -> Duration {
        [
            self.inner_travel,
            self.outer_travel,
            self.rewind_timeout,
            self.idle_recheck,
            self.cooldown,
        ]
        .into_iter()
        .min()
        .unwrap_or(Duration::ZERO)
    }

    /// Checks the configuration for values the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            (ConfigField::DebounceSettle, self.debounce_settle),
            (ConfigField::InnerTravel, self.inner_travel),
            (ConfigField::OuterTravel, self.outer_travel),
            (ConfigField::RewindTimeout, self.rewind_timeout),
            (ConfigField::IdleRecheck, self.idle_recheck),
            (ConfigField::Cooldown, self.cooldown),
            (ConfigField::BlinkPeriod, self.blink_period),
        ];
        if let Some((field, _)) = named.iter().find(|(_, value)| value.is_zero()) {
            return Err(ConfigError::Zero(*field));
        }

        if self.debounce_settle >= self.shortest_motion() {
            return Err(ConfigError::SettleTooLong);
        }

        if self.blink_tick().is_zero() {
            return Err(ConfigError::BlinkTooFast);
        }

        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration field referenced by a [`ConfigError`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigField {
    DebounceSettle,
    InnerTravel,
    OuterTravel,
    RewindTimeout,
    IdleRecheck,
    Cooldown,
    BlinkPeriod,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigField::DebounceSettle => "debounce-settle",
            ConfigField::InnerTravel => "inner-travel",
            ConfigField::OuterTravel => "outer-travel",
            ConfigField::RewindTimeout => "rewind-timeout",
            ConfigField::IdleRecheck => "idle-recheck",
            ConfigField::Cooldown => "cooldown",
            ConfigField::BlinkPeriod => "blink-period",
        })
    }
}

/// Errors reported by [`TimingConfig::validate`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// A duration is zero.
    Zero(ConfigField),
    /// The debounce settle time is not shorter than every motion deadline.
    SettleTooLong,
    /// The blink period is too short to yield a non-zero counter tick.
    BlinkTooFast,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Zero(field) => write!(f, "{field} must be non-zero"),
            ConfigError::SettleTooLong => {
                f.write_str("debounce-settle must be shorter than every motion deadline")
            }
            ConfigError::BlinkTooFast => f.write_str("blink-period is too short"),
        }
    }
}
