//! Switch-selected palette rules applied on motion events.
//!
//! | Switch bit | LED A                    | LED B                          |
//! |------------|--------------------------|--------------------------------|
//! | `0x1`      | red +32                  | blue −32                       |
//! | `0x2`      | blue +32                 | green −32                      |
//! | `0x4`      | green +32                | red −32                        |
//! | `0x8`      | red = green = 1, blue +4 | red = green = 1, blue = A.blue + 4 |
//!
//! Bits are tested in the order above and the first set bit wins.
//! Component arithmetic saturates at 0 and 255.

use crate::drivers::color::RgbPalette;

/// Step applied by the single-colour rules.
pub const COLOR_STEP: u8 = 32;
/// Blue step applied by the dim rule.
pub const BLUE_NUDGE: u8 = 4;
/// Level red and green are pinned to by the dim rule.
pub const DIM_LEVEL: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteRule {
    /// Switch `0x1`.
    WarmA,
    /// Switch `0x2`.
    BlueA,
    /// Switch `0x4`.
    GreenA,
    /// Switch `0x8`.
    DimToBlue,
}

impl PaletteRule {
    /// Priority order, highest first.
    pub const ORDER: [(u32, Self); 4] = [
        (0x1, Self::WarmA),
        (0x2, Self::BlueA),
        (0x4, Self::GreenA),
        (0x8, Self::DimToBlue),
    ];

    /// The rule selected by `switches`, if any.
    pub fn select(switches: u32) -> Option<Self> {
        Self::ORDER
            .iter()
            .find(|(bit, _)| switches & bit != 0)
            .map(|&(_, rule)| rule)
    }

    /// Mutate both palettes in place.
    pub fn apply(self, a: &mut RgbPalette, b: &mut RgbPalette) {
        match self {
            Self::WarmA => {
                a.red = a.red.saturating_add(COLOR_STEP);
                b.blue = b.blue.saturating_sub(COLOR_STEP);
            }
            Self::BlueA => {
                a.blue = a.blue.saturating_add(COLOR_STEP);
                b.green = b.green.saturating_sub(COLOR_STEP);
            }
            Self::GreenA => {
                a.green = a.green.saturating_add(COLOR_STEP);
                b.red = b.red.saturating_sub(COLOR_STEP);
            }
            Self::DimToBlue => {
                a.red = DIM_LEVEL;
                a.green = DIM_LEVEL;
                a.blue = a.blue.saturating_add(BLUE_NUDGE);
                b.red = DIM_LEVEL;
                b.green = DIM_LEVEL;
                b.blue = a.blue.saturating_add(BLUE_NUDGE);
            }
        }
    }
}
