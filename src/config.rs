//! Board configuration.
//!
//! The fixed device topology (three AXI GPIO blocks, one AXI PWM bank,
//! six LED channels) lives here as [`AppConfig::default`].  A JSON file
//! may override any part of it; every loaded configuration is validated
//! before the reactor sees it.

use std::path::Path;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capacity of the GPIO device table.
pub const MAX_GPIO_DEVICES: usize = 8;
/// Capacity of the PWM bank table.
pub const MAX_PWM_BANKS: usize = 4;
/// Capacity of the LED channel table.
pub const MAX_LED_CHANNELS: usize = 16;

/// Logical device name ("sw_btn", "led", ...).
pub type DeviceName = String<16>;

/// PWM period of the RGB bank: 10 ms at 100 MHz.
pub const PWM_PERIOD_TEN_MILLISECOND: u32 = 1_000_000;
/// Maximum duty of each colour channel: 50 % of the period.
pub const PWM_DUTY_FIVE_MILLISECOND: u32 = PWM_PERIOD_TEN_MILLISECOND * 5 / 10;

/// Neutral palette component both LEDs start at.
pub const NEUTRAL_PALETTE_LEVEL: u8 = 2;

// ---------------------------------------------------------------------------
// GPIO devices
// ---------------------------------------------------------------------------

/// What a GPIO block does in this board's topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Switch word on channel 1, button word on channel 2.
    Inputs,
    /// Output-only block toggled as visual acknowledgement.
    Indicator,
    /// Motion sensor; its events drive palette changes.
    Motion,
}

/// Enable and direction flags for one GPIO channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub enabled: bool,
    /// `true` = drive (output), `false` = high-impedance input.
    pub output: bool,
}

impl ChannelConfig {
    pub const fn input() -> Self {
        Self { enabled: true, output: false }
    }

    pub const fn output() -> Self {
        Self { enabled: true, output: true }
    }

    pub const fn disabled() -> Self {
        Self { enabled: false, output: false }
    }
}

/// One row of the GPIO device table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioDeviceConfig {
    pub name: DeviceName,
    /// Physical base address matched against discovered UIO maps.
    pub base_addr: u32,
    pub role: DeviceRole,
    pub channel1: ChannelConfig,
    pub channel2: ChannelConfig,
    pub has_irq: bool,
    /// Name of the device whose DATA register is toggled on events.
    #[serde(default)]
    pub indicator: Option<DeviceName>,
}

// ---------------------------------------------------------------------------
// PWM banks and LED channels
// ---------------------------------------------------------------------------

/// One AXI PWM bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwmBankConfig {
    pub name: DeviceName,
    pub base_addr: u32,
    /// Period register value in PWM clock cycles.
    pub period: u32,
    /// Number of duty registers implemented by the bank.
    pub port_count: u32,
}

/// Colour component of one LED filament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Green,
    Blue,
}

impl ColorTag {
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];

    pub const fn as_char(self) -> char {
        match self {
            Self::Red => 'r',
            Self::Green => 'g',
            Self::Blue => 'b',
        }
    }
}

/// One physically controllable LED filament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedChannel {
    /// Index into [`AppConfig::pwm_banks`].
    #[serde(default)]
    pub bank: usize,
    /// Duty register index within the bank.
    pub pwm_index: u32,
    /// Duty clock count that corresponds to 100 %.
    pub max_duty: u32,
    pub color: ColorTag,
    /// Silk-screen LED number on the board.
    pub silk: u8,
}

// ---------------------------------------------------------------------------
// Palette, timing, UIO paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteConfig {
    /// Silk numbers of the two RGB positions (LED A, LED B).
    pub slots: [u8; 2],
    /// Component value both palettes start at and reset to.
    pub neutral: u8,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            slots: [5, 6],
            neutral: NEUTRAL_PALETTE_LEVEL,
        }
    }
}

/// Hardware settle delays, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// After each side of the interrupt-status rewrite.
    pub rearm_settle_us: u32,
    /// After writing the unmask word to a notification handle.
    pub ack_settle_us: u32,
    /// After draining a handle's interrupt count.
    pub drain_settle_us: u32,
    /// After servicing one wake batch.
    pub batch_pause_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            rearm_settle_us: 1,
            ack_settle_us: 1,
            drain_settle_us: 1,
            batch_pause_us: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UioPaths {
    /// sysfs class directory listing `uioN` entries.
    pub class_dir: std::string::String,
    /// Directory holding the `uioN` character devices.
    pub dev_dir: std::string::String,
}

impl Default for UioPaths {
    fn default() -> Self {
        Self {
            class_dir: "/sys/class/uio".into(),
            dev_dir: "/dev".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Complete board configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GPIO blocks, in slot order.
    pub gpio: Vec<GpioDeviceConfig, MAX_GPIO_DEVICES>,
    pub pwm_banks: Vec<PwmBankConfig, MAX_PWM_BANKS>,
    pub leds: Vec<LedChannel, MAX_LED_CHANNELS>,
    pub palette: PaletteConfig,
    pub timing: TimingConfig,
    pub uio: UioPaths,
}

fn name(s: &str) -> DeviceName {
    let mut n = DeviceName::new();
    // Built-in names are all shorter than the capacity.
    let _ = n.push_str(s);
    n
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut gpio = Vec::new();
        let _ = gpio.push(GpioDeviceConfig {
            name: name("sw_btn"),
            base_addr: 0x4121_0000,
            role: DeviceRole::Inputs,
            channel1: ChannelConfig::input(),
            channel2: ChannelConfig::input(),
            has_irq: true,
            indicator: Some(name("led")),
        });
        let _ = gpio.push(GpioDeviceConfig {
            name: name("led"),
            base_addr: 0x4122_0000,
            role: DeviceRole::Indicator,
            channel1: ChannelConfig::output(),
            channel2: ChannelConfig::disabled(),
            has_irq: false,
            indicator: None,
        });
        let _ = gpio.push(GpioDeviceConfig {
            name: name("2pir"),
            base_addr: 0x4124_0000,
            role: DeviceRole::Motion,
            channel1: ChannelConfig::input(),
            channel2: ChannelConfig::disabled(),
            has_irq: true,
            indicator: Some(name("led")),
        });

        let mut pwm_banks = Vec::new();
        let _ = pwm_banks.push(PwmBankConfig {
            name: name("rgb"),
            base_addr: 0x43C3_0000,
            period: PWM_PERIOD_TEN_MILLISECOND,
            port_count: 6,
        });

        let table = [
            (2, ColorTag::Red, 5),
            (1, ColorTag::Green, 5),
            (0, ColorTag::Blue, 5),
            (5, ColorTag::Red, 6),
            (4, ColorTag::Green, 6),
            (3, ColorTag::Blue, 6),
        ];
        let mut leds = Vec::new();
        for (pwm_index, color, silk) in table {
            let _ = leds.push(LedChannel {
                bank: 0,
                pwm_index,
                max_duty: PWM_DUTY_FIVE_MILLISECOND,
                color,
                silk,
            });
        }

        Self {
            gpio,
            pwm_banks,
            leds,
            palette: PaletteConfig::default(),
            timing: TimingConfig::default(),
            uio: UioPaths::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|_| Error::Config("malformed configuration JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| Error::Config("configuration file unreadable"))?;
        Self::from_json(&text)
    }

    /// Slot index of the GPIO device called `name`.
    pub fn gpio_slot(&self, name: &str) -> Option<usize> {
        self.gpio.iter().position(|d| d.name.as_str() == name)
    }

    /// Reject tables the reactor cannot run against.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        let addrs = self
            .gpio
            .iter()
            .map(|d| d.base_addr)
            .chain(self.pwm_banks.iter().map(|b| b.base_addr));
        for (i, a) in addrs.clone().enumerate() {
            if addrs.clone().skip(i + 1).any(|b| b == a) {
                return Err(Error::Config("duplicate base address"));
            }
        }

        for (i, dev) in self.gpio.iter().enumerate() {
            if self.gpio.iter().skip(i + 1).any(|d| d.name == dev.name) {
                return Err(Error::Config("duplicate device name"));
            }
            if let Some(target) = &dev.indicator {
                match self.gpio_slot(target) {
                    None => return Err(Error::Config("unknown indicator target")),
                    Some(slot) if slot == i => {
                        return Err(Error::Config("device cannot be its own indicator"));
                    }
                    Some(_) => {}
                }
            }
        }

        for led in &self.leds {
            let Some(bank) = self.pwm_banks.get(led.bank) else {
                return Err(Error::Config("LED channel references unknown PWM bank"));
            };
            if led.pwm_index >= bank.port_count {
                return Err(Error::Config("LED channel index beyond bank port count"));
            }
            if led.max_duty > bank.period {
                return Err(Error::Config("LED max duty exceeds PWM period"));
            }
        }

        for silk in self.palette.slots {
            for color in ColorTag::ALL {
                if !self.leds.iter().any(|l| l.silk == silk && l.color == color) {
                    return Err(Error::Config("palette slot missing a colour channel"));
                }
            }
        }

        Ok(())
    }
}
