//! Device board: descriptors for every GPIO block and PWM bank.
//!
//! The board is built once at start-up from the configured table:
//! discovered register maps are matched by physical base address, each
//! match is opened and mapped through the [`DevicePort`], and the
//! indicator relations are resolved from names to slots.  Devices that
//! never resolve keep `window`/`handle` at `None` and are left out of
//! the wait set and all servicing.
//!
//! Slot order follows the configuration table and is stable for the
//! lifetime of the board.

use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{BlockLocation, DevicePort, DiscoveredBlock, NotifyHandle};
use crate::config::{
    AppConfig, ChannelConfig, DeviceName, DeviceRole, MAX_GPIO_DEVICES, MAX_PWM_BANKS,
};
use crate::drivers::gpio::{self, IrqTracking};
use crate::drivers::regs::RegisterWindow;

// ---------------------------------------------------------------------------
// GPIO device descriptor
// ---------------------------------------------------------------------------

/// One AXI GPIO block and everything the reactor knows about it.
pub struct DeviceDescriptor<W, H> {
    pub name: DeviceName,
    pub base_addr: u32,
    pub role: DeviceRole,
    pub channel1: ChannelConfig,
    pub channel2: ChannelConfig,
    pub has_irq: bool,
    /// Where discovery found the block, if it did.
    pub location: Option<BlockLocation>,
    pub window: Option<W>,
    pub handle: Option<H>,
    /// Slot of the device toggled as visual acknowledgement.
    pub indicator: Option<usize>,
    /// Set once the direction / interrupt-enable registers are written.
    pub armed: bool,
}

impl<W, H> DeviceDescriptor<W, H> {
    fn unattached(cfg: &crate::config::GpioDeviceConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            base_addr: cfg.base_addr,
            role: cfg.role,
            channel1: cfg.channel1,
            channel2: cfg.channel2,
            has_irq: cfg.has_irq,
            location: None,
            window: None,
            handle: None,
            indicator: None,
            armed: false,
        }
    }

    /// Hand the descriptor its mapped window and notification handle.
    pub fn attach(&mut self, location: BlockLocation, window: W, handle: H) {
        self.location = Some(location);
        self.window = Some(window);
        self.handle = Some(handle);
    }

    /// Whether the device belongs in the multiplexer's wait set.
    pub fn in_wait_set(&self) -> bool {
        self.has_irq && self.window.is_some() && self.handle.is_some()
    }

    pub fn tracking(&self) -> IrqTracking {
        IrqTracking::for_channels(self.channel1, self.channel2, self.has_irq)
    }
}

// ---------------------------------------------------------------------------
// PWM bank
// ---------------------------------------------------------------------------

/// One AXI PWM bank.
pub struct PwmBank<W, H> {
    pub name: DeviceName,
    pub base_addr: u32,
    pub period: u32,
    pub port_count: u32,
    pub location: Option<BlockLocation>,
    pub window: Option<W>,
    /// Held open for the lifetime of the mapping; never waited on.
    pub handle: Option<H>,
}

impl<W, H> PwmBank<W, H> {
    fn unattached(cfg: &crate::config::PwmBankConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            base_addr: cfg.base_addr,
            period: cfg.period,
            port_count: cfg.port_count,
            location: None,
            window: None,
            handle: None,
        }
    }

    pub fn attach(&mut self, location: BlockLocation, window: W, handle: H) {
        self.location = Some(location);
        self.window = Some(window);
        self.handle = Some(handle);
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Every device the reactor drives, in configuration order.
pub struct Board<W, H> {
    pub gpio: Vec<DeviceDescriptor<W, H>, MAX_GPIO_DEVICES>,
    pub pwm: Vec<PwmBank<W, H>, MAX_PWM_BANKS>,
}

impl<W, H> Board<W, H> {
    /// Descriptors for every configured device, none of them attached.
    ///
    /// Indicator names are resolved to slots here; `config` is expected
    /// to have passed [`AppConfig::validate`].
    pub fn from_config(config: &AppConfig) -> Self {
        let mut gpio = Vec::new();
        for cfg in &config.gpio {
            let mut dev = DeviceDescriptor::unattached(cfg);
            dev.indicator = cfg.indicator.as_ref().and_then(|t| config.gpio_slot(t));
            // Capacities match the config tables.
            let _ = gpio.push(dev);
        }

        let mut pwm = Vec::new();
        for cfg in &config.pwm_banks {
            let _ = pwm.push(PwmBank::unattached(cfg));
        }

        Self { gpio, pwm }
    }


    /// Slots of every device that belongs in the wait set.
    pub fn wait_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.gpio
            .iter()
            .enumerate()
            .filter(|(_, d)| d.in_wait_set())
            .map(|(i, _)| i)
    }
}

impl<W: RegisterWindow, H: NotifyHandle> Board<W, H> {
    /// Discover, open, and map every configured device.
    ///
    /// Never fails: a discovery error leaves every device unattached, and
    /// a device whose block is missing or cannot be opened is excluded.
    pub fn bring_up<P>(config: &AppConfig, port: &mut P) -> Self
    where
        P: DevicePort<Window = W, Handle = H>,
    {
        let mut board = Self::from_config(config);

        let blocks = match port.discover() {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("UIO discovery failed: {}", e);
                std::vec::Vec::new()
            }
        };
        if blocks.is_empty() {
            warn!("No UIO devices found.");
        }

        info!("Found the following GPIO:");
        for dev in board.gpio.iter_mut() {
            if let Some((location, window, handle)) = open_block(port, &blocks, dev.base_addr) {
                dev.attach(location, window, handle);
            }
            info!(
                "name={} addr={:08x} uio={} map={} handle={} size={} has_irq={}",
                dev.name,
                dev.base_addr,
                fmt_uio(dev.location),
                fmt_map(dev.location),
                fmt_token(dev.handle.as_ref()),
                fmt_size(dev.window.as_ref()),
                dev.has_irq,
            );
        }

        info!("Found the following PWM:");
        for bank in board.pwm.iter_mut() {
            if let Some((location, window, handle)) = open_block(port, &blocks, bank.base_addr) {
                bank.attach(location, window, handle);
            }
            info!(
                "name={} addr={:08x} uio={} map={} handle={} size={} port_cnt={}",
                bank.name,
                bank.base_addr,
                fmt_uio(bank.location),
                fmt_map(bank.location),
                fmt_token(bank.handle.as_ref()),
                fmt_size(bank.window.as_ref()),
                bank.port_count,
            );
        }

        board
    }

    /// Write direction and interrupt-enable registers on every mapped
    /// device that is not yet armed.
    pub fn configure_interrupts(&mut self) {
        for dev in self.gpio.iter_mut() {
            if let Some(tracking) = gpio::configure_device(dev) {
                info!("{}: {}", dev.name, tracking);
            }
        }
    }

    /// Close every handle and unmap every window.
    pub fn shutdown(self) {
        let handles = self.gpio.iter().filter(|d| d.handle.is_some()).count()
            + self.pwm.iter().filter(|b| b.handle.is_some()).count();
        let windows = self.gpio.iter().filter(|d| d.window.is_some()).count()
            + self.pwm.iter().filter(|b| b.window.is_some()).count();
        info!("Closing {} handles, unmapping {} windows", handles, windows);
        drop(self);
    }
}

fn open_block<P: DevicePort>(
    port: &mut P,
    blocks: &[DiscoveredBlock],
    base_addr: u32,
) -> Option<(BlockLocation, P::Window, P::Handle)> {
    let block = blocks.iter().find(|b| b.addr == u64::from(base_addr))?;
    match port.open(block) {
        Ok((window, handle)) => Some((block.location, window, handle)),
        Err(e) => {
            warn!(
                "uio{} map{} ({:08x}) unavailable: {}",
                block.location.uio, block.location.map, base_addr, e
            );
            None
        }
    }
}

fn fmt_uio(location: Option<BlockLocation>) -> i64 {
    location.map_or(-1, |l| i64::from(l.uio))
}

fn fmt_map(location: Option<BlockLocation>) -> i64 {
    location.map_or(-1, |l| i64::from(l.map))
}

fn fmt_token(handle: Option<&impl NotifyHandle>) -> i64 {
    handle.map_or(-1, |h| h.token() as i64)
}

fn fmt_size(window: Option<&impl RegisterWindow>) -> usize {
    window.map_or(0, |w| w.size())
}
