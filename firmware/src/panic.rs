// firmware/src/panic.rs
use core::panic::PanicInfo;

use defmt::error;
use embassy_stm32::pac;

use crate::hw::MOTOR_PORT_PINS;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // Stop both H-bridges before trapping; the drivers are unreachable here.
    pac::GPIOB.bsrr().write(|w| {
        for pin in MOTOR_PORT_PINS {
            w.set_br(pin, true);
        }
    });
    error!("closure: PANIC {}", defmt::Display2Format(info));
    cortex_m::asm::udf();
}
