//! AXI PWM bank register driver.
//!
//! Unconditional register stores: no error returns, and a write changes
//! the physical waveform immediately.  The caller must hold a window
//! mapped over a PWM bank.

use super::regs::RegisterWindow;

/// Control register; bit 0 runs the counter.
pub const PWM_CTRL: usize = 0x00;
/// Period register, in PWM clock cycles.
pub const PWM_PERIOD: usize = 0x08;
/// First duty register; channel `n` lives at `PWM_DUTY_BASE + 4 * n`.
pub const PWM_DUTY_BASE: usize = 0x40;

pub const PWM_RUN: u32 = 0x0000_0001;

#[inline]
fn duty_offset(index: u32) -> usize {
    PWM_DUTY_BASE + index as usize * 4
}

pub fn set_period(window: &mut impl RegisterWindow, clocks: u32) {
    window.write(PWM_PERIOD, clocks);
}

pub fn set_duty(window: &mut impl RegisterWindow, clocks: u32, index: u32) {
    window.write(duty_offset(index), clocks);
}

pub fn period(window: &impl RegisterWindow) -> u32 {
    window.read(PWM_PERIOD)
}

pub fn duty(window: &impl RegisterWindow, index: u32) -> u32 {
    window.read(duty_offset(index))
}

pub fn enable(window: &mut impl RegisterWindow) {
    window.write(PWM_CTRL, PWM_RUN);
}

pub fn disable(window: &mut impl RegisterWindow) {
    window.write(PWM_CTRL, 0);
}

pub fn is_enabled(window: &impl RegisterWindow) -> bool {
    window.read(PWM_CTRL) & PWM_RUN != 0
}
