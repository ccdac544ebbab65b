//! Note layouts of the supported Launchpad generations
//!
//! - **XY** (Launchpad Mk1, S, Mini Mk1/Mk2): note = 16·row + col, top-left
//!   origin. Column 8 holds the scene buttons. Velocity encodes the color as
//!   `16·green + red` plus the copy/clear flags (12). Resetting the device
//!   (CC 0 = 0) turns every LED off.
//! - **Programmer** (Launchpad Mk2, X, Mini Mk3, Pro in programmer mode):
//!   note = 10·(8 − row) + col + 1, bottom-left origin at 11. Column 9 holds
//!   the scene buttons. Velocity selects a palette entry.

use crate::types::{ButtonAddress, LedColor};
use padqueue_core::{Cell, GRID_SIZE};
use serde::{Deserialize, Serialize};

/// Copy + clear flags for XY-layout velocities (plain on/off, no double buffering)
const XY_FLAGS: u8 = 12;

/// Palette base entries (bright) for programmer-layout devices.
/// Entries base+1 and base+2 are progressively dimmer.
const PALETTE_RED: u8 = 5;
const PALETTE_ORANGE: u8 = 9;
const PALETTE_YELLOW: u8 = 13;
const PALETTE_LIME: u8 = 17;
const PALETTE_GREEN: u8 = 21;

/// Pad numbering scheme of the connected device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLayout {
    #[default]
    Xy,
    Programmer,
}

impl GridLayout {
    /// MIDI note number of a grid pad
    pub fn note_for(&self, cell: Cell) -> u8 {
        match self {
            Self::Xy => 16 * cell.row() + cell.col(),
            Self::Programmer => 10 * (GRID_SIZE - cell.row()) + cell.col() + 1,
        }
    }

    /// Grid pad for a MIDI note, `None` for scene buttons and unused notes
    pub fn cell_for(&self, note: u8) -> Option<Cell> {
        match self {
            Self::Xy => Cell::new(note % 16, note / 16),
            Self::Programmer => {
                let (tens, ones) = (note / 10, note % 10);
                if !(1..=GRID_SIZE).contains(&tens) || !(1..=GRID_SIZE).contains(&ones) {
                    return None;
                }
                Cell::new(ones - 1, GRID_SIZE - tens)
            }
        }
    }

    /// Note On velocity that shows `color`
    pub fn velocity_for(&self, color: LedColor) -> u8 {
        let LedColor { red, green } = color.clamped();
        match self {
            Self::Xy => 16 * green + red + XY_FLAGS,
            Self::Programmer => {
                let level = red.max(green);
                if level == 0 {
                    return 0;
                }
                let base = if green == 0 {
                    PALETTE_RED
                } else if red == 0 {
                    PALETTE_GREEN
                } else if red > green {
                    PALETTE_ORANGE
                } else if green > red {
                    PALETTE_LIME
                } else {
                    PALETTE_YELLOW
                };
                base + (3 - level)
            }
        }
    }

    /// Raw MIDI messages that turn every grid LED off
    pub fn clear_messages(&self, channel: u8) -> Vec<[u8; 3]> {
        match self {
            Self::Xy => vec![[0xB0 | channel, 0x00, 0x00]],
            Self::Programmer => Cell::all()
                .map(|cell| [0x80 | channel, self.note_for(cell), 0])
                .collect(),
        }
    }

    /// Top-right scene button, used to quit when nothing else is configured
    pub fn default_exit_button(&self, channel: u8) -> ButtonAddress {
        let note = match self {
            Self::Xy => 8,
            Self::Programmer => 89,
        };
        ButtonAddress::Note { channel, note }
    }
}
