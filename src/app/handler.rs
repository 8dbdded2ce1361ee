//! Reactive handler: what happens when a device's interrupt fires.
//!
//! Every serviced interrupt follows the same shape: sample the data
//! register(s), re-arm the line, then act on the sample.  The action
//! depends on the device role:
//!
//! - **Motion**: bump the motion counter, toggle the indicator, and run
//!   the switch-selected [`PaletteRule`] over both palettes.
//! - **Inputs**: debounce channel 1 (switches) and channel 2 (buttons)
//!   independently, toggling an indicator bit for each change.
//! - **Indicator**: output only; logged and ignored.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use super::context::ReactorContext;
use super::events::AppEvent;
use super::ports::{EventSink, NotifyHandle};
use super::rules::PaletteRule;
use crate::board::{Board, DeviceDescriptor};
use crate::config::{DeviceRole, TimingConfig};
use crate::drivers::color::ColorModel;
use crate::drivers::gpio::{self, GPIO_DATA, GPIO2_DATA};
use crate::drivers::regs::RegisterWindow;

/// Indicator bits flipped on a motion event.
pub const MOTION_TOGGLE: u32 = 0xC;
/// Indicator bit flipped on a switch change.
pub const SWITCH_TOGGLE: u32 = 0x1;
/// Indicator bit flipped on a button change.
pub const BUTTON_TOGGLE: u32 = 0x2;

/// Service the device in `slot` after its handle was drained.
pub fn dispatch<W, H, D, S>(
    slot: usize,
    board: &mut Board<W, H>,
    ctx: &mut ReactorContext,
    color: &ColorModel,
    delay: &mut D,
    sink: &mut S,
    timing: &TimingConfig,
) where
    W: RegisterWindow,
    H: NotifyHandle,
    D: DelayNs,
    S: EventSink,
{
    let Some(role) = board.gpio.get(slot).map(|d| d.role) else {
        warn!("dispatch to unknown slot {}", slot);
        return;
    };

    match role {
        DeviceRole::Motion => on_motion(slot, board, ctx, color, delay, sink, timing),
        DeviceRole::Inputs => on_inputs(slot, board, ctx, delay, sink, timing),
        DeviceRole::Indicator => {
            debug!("{}: output device, nothing to service", board.gpio[slot].name);
        }
    }
}

fn on_motion<W, H, D, S>(
    slot: usize,
    board: &mut Board<W, H>,
    ctx: &mut ReactorContext,
    color: &ColorModel,
    delay: &mut D,
    sink: &mut S,
    timing: &TimingConfig,
) where
    W: RegisterWindow,
    H: NotifyHandle,
    D: DelayNs,
    S: EventSink,
{
    let Some(value) = sample_and_rearm(&mut board.gpio[slot], delay, timing, |w| {
        w.read(GPIO_DATA)
    }) else {
        return;
    };

    let count = ctx.inputs.record_motion();
    sink.emit(&AppEvent::Motion { value, count });
    toggle_indicator(board, slot, MOTION_TOGGLE);

    let before = ctx.palettes();
    if ctx.inputs.buttons != 0 {
        ctx.reset_palettes();
    }
    if let Some(rule) = PaletteRule::select(ctx.inputs.switches) {
        debug!("switches={:x} -> {:?}", ctx.inputs.switches, rule);
        rule.apply(&mut ctx.led_a.rgb, &mut ctx.led_b.rgb);
    }

    if ctx.palettes() != before {
        push_palettes(board, ctx, color, sink);
    }
}

fn on_inputs<W, H, D, S>(
    slot: usize,
    board: &mut Board<W, H>,
    ctx: &mut ReactorContext,
    delay: &mut D,
    sink: &mut S,
    timing: &TimingConfig,
) where
    W: RegisterWindow,
    H: NotifyHandle,
    D: DelayNs,
    S: EventSink,
{
    let Some((switches, buttons)) = sample_and_rearm(&mut board.gpio[slot], delay, timing, |w| {
        (w.read(GPIO_DATA), w.read(GPIO2_DATA))
    }) else {
        return;
    };

    if let Some(count) = ctx.inputs.update_switches(switches) {
        sink.emit(&AppEvent::SwitchesChanged { value: switches, count });
        toggle_indicator(board, slot, SWITCH_TOGGLE);
    }
    if let Some(count) = ctx.inputs.update_buttons(buttons) {
        sink.emit(&AppEvent::ButtonsChanged { value: buttons, count });
        toggle_indicator(board, slot, BUTTON_TOGGLE);
    }
}

/// Read with `sample`, then re-arm the line.  `None` if the device is
/// not attached.
fn sample_and_rearm<W, H, D, T>(
    dev: &mut DeviceDescriptor<W, H>,
    delay: &mut D,
    timing: &TimingConfig,
    sample: impl FnOnce(&W) -> T,
) -> Option<T>
where
    W: RegisterWindow,
    H: NotifyHandle,
    D: DelayNs,
{
    let (Some(window), Some(handle)) = (dev.window.as_mut(), dev.handle.as_mut()) else {
        debug!("{}: not attached, ignoring", dev.name);
        return None;
    };
    let value = sample(&*window);
    gpio::rearm(window, handle, delay, timing);
    Some(value)
}

fn toggle_indicator<W: RegisterWindow, H>(board: &mut Board<W, H>, slot: usize, mask: u32) {
    let Some(target) = board.gpio.get(slot).and_then(|d| d.indicator) else {
        return;
    };
    match board.gpio.get_mut(target).and_then(|d| d.window.as_mut()) {
        Some(window) => window.toggle(GPIO_DATA, mask),
        None => debug!("indicator slot {} not mapped", target),
    }
}

fn push_palettes<W, H, S>(
    board: &mut Board<W, H>,
    ctx: &ReactorContext,
    color: &ColorModel,
    sink: &mut S,
) where
    W: RegisterWindow,
    S: EventSink,
{
    for slot in ctx.palettes() {
        match color.set_palette(&mut board.pwm, slot.silk, &slot.rgb) {
            Ok(()) => {
                debug!(
                    "LED{} <- r={} g={} b={}",
                    slot.silk, slot.rgb.red, slot.rgb.green, slot.rgb.blue
                );
                sink.emit(&AppEvent::PaletteApplied { silk: slot.silk, palette: slot.rgb });
            }
            Err(error) => {
                debug!("LED{}: {}", slot.silk, error);
                sink.emit(&AppEvent::PaletteRejected { silk: slot.silk, error });
            }
        }
    }
}
