//! Mutable reactor state threaded through every handler call.
//!
//! `ReactorContext` is owned by the [`EventLoop`](super::service::EventLoop)
//! and lent to the handler by exclusive reference.  It holds the
//! debounced input words, the event counters, and both live palettes.

use crate::config::PaletteConfig;
use crate::drivers::color::RgbPalette;

// ---------------------------------------------------------------------------
// Debounced inputs
// ---------------------------------------------------------------------------

/// Last seen switch / button words and per-source event counters.
///
/// A new event is a full word that differs from the stored one; there
/// is no per-bit edge detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebouncedInputState {
    pub switches: u32,
    pub buttons: u32,
    pub switch_events: u64,
    pub button_events: u64,
    pub motion_events: u64,
}

impl DebouncedInputState {
    /// Store `word` as the new switch word if it changed.
    /// Returns the new event count on change.
    pub fn update_switches(&mut self, word: u32) -> Option<u64> {
        if word == self.switches {
            return None;
        }
        self.switches = word;
        self.switch_events += 1;
        Some(self.switch_events)
    }

    /// Store `word` as the new button word if it changed.
    pub fn update_buttons(&mut self, word: u32) -> Option<u64> {
        if word == self.buttons {
            return None;
        }
        self.buttons = word;
        self.button_events += 1;
        Some(self.button_events)
    }

    pub fn record_motion(&mut self) -> u64 {
        self.motion_events += 1;
        self.motion_events
    }
}

// ---------------------------------------------------------------------------
// Palette slot
// ---------------------------------------------------------------------------

/// A live palette and the silk LED it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteSlot {
    pub silk: u8,
    pub rgb: RgbPalette,
}

// ---------------------------------------------------------------------------
// ReactorContext
// ---------------------------------------------------------------------------

pub struct ReactorContext {
    pub inputs: DebouncedInputState,
    /// First RGB position (LED A).
    pub led_a: PaletteSlot,
    /// Second RGB position (LED B).
    pub led_b: PaletteSlot,
    /// Value both palettes start at and reset to.
    pub neutral: u8,
}

impl ReactorContext {
    pub fn new(palette: &PaletteConfig) -> Self {
        let rgb = RgbPalette::uniform(palette.neutral);
        Self {
            inputs: DebouncedInputState::default(),
            led_a: PaletteSlot { silk: palette.slots[0], rgb },
            led_b: PaletteSlot { silk: palette.slots[1], rgb },
            neutral: palette.neutral,
        }
    }

    /// Put both palettes back at the neutral value.
    pub fn reset_palettes(&mut self) {
        let rgb = RgbPalette::uniform(self.neutral);
        self.led_a.rgb = rgb;
        self.led_b.rgb = rgb;
    }

    pub fn palettes(&self) -> [PaletteSlot; 2] {
        [self.led_a, self.led_b]
    }
}
