//! Register-level drivers for the AXI peripherals.

pub mod color;
pub mod gpio;
pub mod pwm;
pub mod regs;
