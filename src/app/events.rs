//! Outbound reactor events.
//!
//! The event loop and handler emit these through the
//! [`EventSink`](super::ports::EventSink) port.  The log adapter turns
//! them into the human-readable event trace; tests record them.

use std::io;

use crate::drivers::color::RgbPalette;
use crate::error::ColorError;

/// Structured events emitted by the reactor core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The wait set was armed with this many sources.
    Armed { sources: usize },

    /// The motion sensor fired.
    Motion { value: u32, count: u64 },

    /// The switch word changed.
    SwitchesChanged { value: u32, count: u64 },

    /// The button word changed.
    ButtonsChanged { value: u32, count: u64 },

    /// A palette was pushed to its LED.
    PaletteApplied { silk: u8, palette: RgbPalette },

    /// A palette push hit a configuration mismatch.
    PaletteRejected { silk: u8, error: ColorError },

    /// The blocking wait returned an error; the loop keeps going.
    WaitFailed(io::ErrorKind),

    /// The loop observed the quit request and stopped.
    Stopped,
}
