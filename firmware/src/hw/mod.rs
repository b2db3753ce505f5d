//! Board wiring: motor H-bridge outputs and EXTI-backed inputs.

use closure_core::io::{InputId, PinSampler, input_by_id};
use closure_core::motor::{MotorLine, MotorLines};
use embassy_futures::select::select4;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Output, Pull};

/// GPIOB pin numbers of the four motor lines, in [`MotorLine::as_index`] order.
pub const MOTOR_PORT_PINS: [usize; 4] = [3, 4, 5, 6];

/// Pull configuration for an input line, taken from the line catalog.
pub fn pull_for(id: InputId) -> Pull {
    if input_by_id(id).pull_up {
        Pull::Up
    } else {
        Pull::None
    }
}

pub struct BoardMotorLines<'d> {
    outputs: [Output<'d>; 4],
}

impl<'d> BoardMotorLines<'d> {
    /// Outputs must be passed in [`MotorLine::as_index`] order and start low.
    pub fn new(
        inner_up: Output<'d>,
        inner_down: Output<'d>,
        outer_up: Output<'d>,
        outer_down: Output<'d>,
    ) -> Self {
        Self {
            outputs: [inner_up, inner_down, outer_up, outer_down],
        }
    }
}

impl MotorLines for BoardMotorLines<'_> {
    fn assert(&mut self, line: MotorLine) {
        self.outputs[line.as_index()].set_high();
    }

    fn release(&mut self, line: MotorLine) {
        self.outputs[line.as_index()].set_low();
    }
}

pub struct BoardInputs<'d> {
    inner_open: ExtiInput<'d>,
    outer_closed: ExtiInput<'d>,
    sens_open: ExtiInput<'d>,
    sens_closed: ExtiInput<'d>,
}

impl<'d> BoardInputs<'d> {
    pub fn new(
        inner_open: ExtiInput<'d>,
        outer_closed: ExtiInput<'d>,
        sens_open: ExtiInput<'d>,
        sens_closed: ExtiInput<'d>,
    ) -> Self {
        Self {
            inner_open,
            outer_closed,
            sens_open,
            sens_closed,
        }
    }

    /// Resolves on the next edge of any input line.
    pub async fn wait_for_edge(&mut self) {
        select4(
            self.inner_open.wait_for_any_edge(),
            self.outer_closed.wait_for_any_edge(),
            self.sens_open.wait_for_any_edge(),
            self.sens_closed.wait_for_any_edge(),
        )
        .await;
    }
}

impl PinSampler for BoardInputs<'_> {
    fn pin_high(&mut self, id: InputId) -> bool {
        let input = match id {
            InputId::SwitchInnerOpen => &self.inner_open,
            InputId::SwitchOuterClosed => &self.outer_closed,
            InputId::SensorOpen => &self.sens_open,
            InputId::SensorClosed => &self.sens_closed,
        };
        input.is_high()
    }
}
