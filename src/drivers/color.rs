//! Colour model: maps (silk LED, colour) to PWM duty registers.
//!
//! Percentages are fixed point with three implied decimals: `1000` is
//! 100 %.  A channel at `p` per mille is driven at
//! `p * max_duty / 1000` clocks, truncated.

use heapless::Vec;
use log::warn;
use serde::{Deserialize, Serialize};

use super::pwm;
use super::regs::RegisterWindow;
use crate::board::PwmBank;
use crate::config::{ColorTag, LedChannel, MAX_LED_CHANNELS};
use crate::error::ColorError;

/// Full scale of a fixed-point percentage.
pub const PERCENT_FULL_SCALE: u32 = 1000;

/// Intensity of one RGB position, each component 0–255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbPalette {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbPalette {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// All three components at `level`.
    pub const fn uniform(level: u8) -> Self {
        Self::new(level, level, level)
    }

    pub const fn component(&self, color: ColorTag) -> u8 {
        match color {
            ColorTag::Red => self.red,
            ColorTag::Green => self.green,
            ColorTag::Blue => self.blue,
        }
    }
}

/// Duty clock count for `percent` per mille of `max_duty`.
///
/// `percent` above full scale is clamped.
pub fn duty_clocks(percent: u32, max_duty: u32) -> u32 {
    let percent = percent.min(PERCENT_FULL_SCALE);
    (u64::from(percent) * u64::from(max_duty) / u64::from(PERCENT_FULL_SCALE)) as u32
}

/// Per-mille percentage for an 8-bit palette component.
pub fn palette_percent(value: u8) -> u32 {
    u32::from(value) * PERCENT_FULL_SCALE / 255
}

/// The LED channel table plus the operations over it.
#[derive(Debug, Clone)]
pub struct ColorModel {
    leds: Vec<LedChannel, MAX_LED_CHANNELS>,
}

impl ColorModel {
    pub fn new(leds: &[LedChannel]) -> Self {
        let mut table = Vec::new();
        for led in leds.iter().take(MAX_LED_CHANNELS) {
            let _ = table.push(*led);
        }
        Self { leds: table }
    }

    /// The channel wired to `color` of LED `silk`, if any.
    pub fn find(&self, silk: u8, color: ColorTag) -> Option<&LedChannel> {
        self.leds.iter().find(|l| l.silk == silk && l.color == color)
    }

    /// Drive one filament at `percent` per mille of its maximum duty.
    ///
    /// Returns the duty clock count written.
    pub fn set_led_percent<W: RegisterWindow, H>(
        &self,
        banks: &mut [PwmBank<W, H>],
        silk: u8,
        color: ColorTag,
        percent: u32,
    ) -> Result<u32, ColorError> {
        let led = self.find(silk, color).ok_or(ColorError::NoSuchChannel {
            silk,
            color: color.as_char(),
        })?;
        let window = banks
            .get_mut(led.bank)
            .and_then(|b| b.window.as_mut())
            .ok_or(ColorError::BankUnavailable(led.bank))?;

        let clocks = duty_clocks(percent, led.max_duty);
        pwm::set_duty(window, clocks, led.pwm_index);
        Ok(clocks)
    }

    /// Push all three components of `palette` to LED `silk`.
    ///
    /// Every component is attempted; the first failure is reported.
    pub fn set_palette<W: RegisterWindow, H>(
        &self,
        banks: &mut [PwmBank<W, H>],
        silk: u8,
        palette: &RgbPalette,
    ) -> Result<(), ColorError> {
        let mut result = Ok(());
        for color in ColorTag::ALL {
            let percent = palette_percent(palette.component(color));
            if let Err(e) = self.set_led_percent(banks, silk, color, percent) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Program every bank's period, zero every channel, then start the banks.
    pub fn all_leds_off<W: RegisterWindow, H>(&self, banks: &mut [PwmBank<W, H>]) {
        for bank in banks.iter_mut() {
            match bank.window.as_mut() {
                Some(window) => pwm::set_period(window, bank.period),
                None => warn!("PWM bank {} not mapped; LEDs on it stay dark", bank.name),
            }
        }
        for led in &self.leds {
            if let Some(window) = banks.get_mut(led.bank).and_then(|b| b.window.as_mut()) {
                pwm::set_duty(window, 0, led.pwm_index);
            }
        }
        for bank in banks.iter_mut() {
            if let Some(window) = bank.window.as_mut() {
                pwm::enable(window);
            }
        }
    }
}
