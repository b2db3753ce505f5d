//! Digital I/O surface shared by firmware and host targets.
//!
//! Every input line is catalogued with its board routing and polarity so the
//! rest of the crate only ever sees normalized booleans: `true` means "the
//! switch requests this position" or "the door sits on this end-stop".

/// Identifier for the logical input lines sampled by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputId {
    SwitchInnerOpen,
    SwitchOuterClosed,
    SensorOpen,
    SensorClosed,
}

impl InputId {
    /// Deterministic index for lookups into [`ALL_INPUTS`].
    pub const fn as_index(self) -> usize {
        match self {
            InputId::SwitchInnerOpen => 0,
            InputId::SwitchOuterClosed => 1,
            InputId::SensorOpen => 2,
            InputId::SensorClosed => 3,
        }
    }

    /// Attempts to construct an [`InputId`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(InputId::SwitchInnerOpen),
            1 => Some(InputId::SwitchOuterClosed),
            2 => Some(InputId::SensorOpen),
            3 => Some(InputId::SensorClosed),
            _ => None,
        }
    }
}

/// Electrical polarity of an input line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Converts a raw pin level into the logical "asserted" value.
    pub const fn normalize(self, pin_high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => pin_high,
            Polarity::ActiveLow => !pin_high,
        }
    }
}

/// Metadata describing how an input line is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InputLine {
    pub id: InputId,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: Polarity,
    pub pull_up: bool,
}

impl InputLine {
    pub const fn new(
        id: InputId,
        name: &'static str,
        mcu_pin: &'static str,
        polarity: Polarity,
        pull_up: bool,
    ) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            polarity,
            pull_up,
        }
    }
}

/// Compile-time catalog of every input line.
///
/// The end-stop sensors are open-collector reed contacts pulled up on the MCU,
/// so they read low when the door sits on them.
pub const ALL_INPUTS: [InputLine; 4] = [
    InputLine::new(
        InputId::SwitchInnerOpen,
        "SW_INNER_OPEN",
        "PA0",
        Polarity::ActiveHigh,
        false,
    ),
    InputLine::new(
        InputId::SwitchOuterClosed,
        "SW_OUTER_CLOSED",
        "PA1",
        Polarity::ActiveHigh,
        false,
    ),
    InputLine::new(
        InputId::SensorOpen,
        "SENS_OPEN*",
        "PA6",
        Polarity::ActiveLow,
        true,
    ),
    InputLine::new(
        InputId::SensorClosed,
        "SENS_CLOSED*",
        "PA7",
        Polarity::ActiveLow,
        true,
    ),
];

/// Retrieve input metadata by identifier.
pub const fn input_by_id(id: InputId) -> InputLine {
    ALL_INPUTS[id.as_index()]
}

/// Normalized snapshot of every input line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct InputLevels {
    pub sw_inner_open: bool,
    pub sw_outer_closed: bool,
    pub sens_open: bool,
    pub sens_closed: bool,
}

impl InputLevels {
    pub const fn new(
        sw_inner_open: bool,
        sw_outer_closed: bool,
        sens_open: bool,
        sens_closed: bool,
    ) -> Self {
        Self {
            sw_inner_open,
            sw_outer_closed,
            sens_open,
            sens_closed,
        }
    }

    /// Builds a snapshot from raw pin levels, applying each line's polarity.
    pub fn from_pins(mut pin_high: impl FnMut(InputId) -> bool) -> Self {
        let mut read = |id: InputId| input_by_id(id).polarity.normalize(pin_high(id));
        Self {
            sw_inner_open: read(InputId::SwitchInnerOpen),
            sw_outer_closed: read(InputId::SwitchOuterClosed),
            sens_open: read(InputId::SensorOpen),
            sens_closed: read(InputId::SensorClosed),
        }
    }

    /// Returns the logical value of a single line.
    pub const fn get(&self, id: InputId) -> bool {
        match id {
            InputId::SwitchInnerOpen => self.sw_inner_open,
            InputId::SwitchOuterClosed => self.sw_outer_closed,
            InputId::SensorOpen => self.sens_open,
            InputId::SensorClosed => self.sens_closed,
        }
    }

    /// Returns a copy with a single line replaced.
    #[must_use]
    pub const fn with(mut self, id: InputId, value: bool) -> Self {
        match id {
            InputId::SwitchInnerOpen => self.sw_inner_open = value,
            InputId::SwitchOuterClosed => self.sw_outer_closed = value,
            InputId::SensorOpen => self.sens_open = value,
            InputId::SensorClosed => self.sens_closed = value,
        }
        self
    }

    /// Packs the snapshot into a bitmask indexed by [`InputId::as_index`].
    pub const fn to_mask(self) -> u8 {
        (self.sw_inner_open as u8)
            | (self.sw_outer_closed as u8) << 1
            | (self.sens_open as u8) << 2
            | (self.sens_closed as u8) << 3
    }

    /// Unpacks a bitmask produced by [`InputLevels::to_mask`].
    pub const fn from_mask(mask: u8) -> Self {
        Self {
            sw_inner_open: mask & 0b0001 != 0,
            sw_outer_closed: mask & 0b0010 != 0,
            sens_open: mask & 0b0100 != 0,
            sens_closed: mask & 0b1000 != 0,
        }
    }
}

/// Source of raw pin levels for the input lines.
pub trait PinSampler {
    /// Returns `true` when the pin behind `id` currently reads high.
    fn pin_high(&mut self, id: InputId) -> bool;

    /// Reads every line once and normalizes the result.
    fn sample(&mut self) -> InputLevels {
        InputLevels::from_pins(|id| self.pin_high(id))
    }
}
