//! AXI GPIO interrupt controller.
//!
//! ## Re-arm protocol
//!
//! After every interrupt the line stays masked until both steps run, in
//! this order:
//!
//! 1. [`reacknowledge`]: read the interrupt status register and write
//!    the same value back.  Status bits are toggle-on-write, so only the
//!    bits that were set get cleared.
//! 2. [`ack_notification`]: write the unmask word to the UIO handle so
//!    the kernel re-enables the line.
//!
//! The status rewrite always precedes the unmask.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::warn;

use super::regs::RegisterWindow;
use crate::app::ports::NotifyHandle;
use crate::board::DeviceDescriptor;
use crate::config::{ChannelConfig, TimingConfig};

pub const GPIO_DATA: usize = 0x000;
pub const GPIO_TRI: usize = 0x004;
pub const GPIO2_DATA: usize = 0x008;
pub const GPIO2_TRI: usize = 0x00C;
pub const GPIO_GIER: usize = 0x11C;
pub const GPIO_ISR: usize = 0x120;
pub const GPIO_IER: usize = 0x128;

/// Global interrupt enable.
pub const GIER_ENABLE: u32 = 0x8000_0000;
pub const IER_CHANNEL1: u32 = 0x1;
pub const IER_CHANNEL2: u32 = 0x2;

/// Tristate value for a channel driven as output.
pub const TRI_OUTPUT: u32 = 0x0000_0000;
/// Tristate value for a high-impedance input channel.
pub const TRI_INPUT: u32 = 0xFFFF_FFFF;

/// Word written to a UIO handle to unmask its interrupt line.
pub const UNMASK_WORD: [u8; 4] = [1, 0, 0, 0];

/// Which channels of a block raise interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqTracking {
    pub channel1: bool,
    pub channel2: bool,
}

impl IrqTracking {
    /// A channel is tracked when it is enabled, an input, and the block
    /// has its interrupt wired.
    pub fn for_channels(ch1: ChannelConfig, ch2: ChannelConfig, has_irq: bool) -> Self {
        Self {
            channel1: ch1.enabled && !ch1.output && has_irq,
            channel2: ch2.enabled && !ch2.output && has_irq,
        }
    }

    pub fn any(self) -> bool {
        self.channel1 || self.channel2
    }

    pub fn ier(self) -> u32 {
        let mut ier = 0;
        if self.channel1 {
            ier |= IER_CHANNEL1;
        }
        if self.channel2 {
            ier |= IER_CHANNEL2;
        }
        ier
    }

    pub fn gier(self) -> u32 {
        if self.any() { GIER_ENABLE } else { 0 }
    }
}

impl fmt::Display for IrqTracking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.channel1, self.channel2) {
            (true, true) => write!(f, "Tracking interrupts for channels 1 & 2."),
            (true, false) => write!(f, "Tracking interrupts for channel 1."),
            (false, true) => write!(f, "Tracking interrupts for channel 2."),
            (false, false) => write!(f, "Not tracking interrupts."),
        }
    }
}

fn tristate(ch: ChannelConfig) -> u32 {
    if ch.output { TRI_OUTPUT } else { TRI_INPUT }
}

/// Write direction, interrupt-enable, and global-enable registers.
///
/// One-shot: returns `None` without touching hardware if the device is
/// already armed or has no window.
pub fn configure_device<W: RegisterWindow, H>(
    dev: &mut DeviceDescriptor<W, H>,
) -> Option<IrqTracking> {
    if dev.armed {
        return None;
    }
    let tracking = dev.tracking();
    let window = dev.window.as_mut()?;

    window.write(GPIO_TRI, tristate(dev.channel1));
    window.write(GPIO2_TRI, tristate(dev.channel2));
    window.write(GPIO_IER, tracking.ier());
    window.write(GPIO_GIER, tracking.gier());

    dev.armed = true;
    Some(tracking)
}

/// Clear pending status by rewriting the value just read.
pub fn reacknowledge(window: &mut impl RegisterWindow, delay: &mut impl DelayNs, settle_us: u32) {
    let status = window.read(GPIO_ISR);
    delay.delay_us(settle_us);
    window.write(GPIO_ISR, status);
    delay.delay_us(settle_us);
}

/// Tell the UIO driver to unmask the line.
///
/// A failed write is logged; the next interrupt on this line will then
/// not be delivered.
pub fn ack_notification(handle: &mut impl NotifyHandle, delay: &mut impl DelayNs, settle_us: u32) {
    if let Err(e) = handle.write_control(UNMASK_WORD) {
        warn!("irq unmask on handle {} failed: {}", handle.token(), e);
    }
    delay.delay_us(settle_us);
}

/// Full re-arm: [`reacknowledge`] then [`ack_notification`].
pub fn rearm(
    window: &mut impl RegisterWindow,
    handle: &mut impl NotifyHandle,
    delay: &mut impl DelayNs,
    timing: &TimingConfig,
) {
    reacknowledge(window, delay, timing.rearm_settle_us);
    ack_notification(handle, delay, timing.ack_settle_us);
}
