//! Grid-level types shared by the controller, the layouts and the MIDI backend

use padqueue_core::Cell;
use serde::{Deserialize, Serialize};

/// Brightest level of a single LED color channel
pub const MAX_LED_LEVEL: u8 = 3;

/// Bi-color LED setting (red and green levels, 0-3 each)
///
/// Both channels at full give amber. All Launchpad generations accept this
/// form; layouts translate it to the device's own velocity encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedColor {
    pub red: u8,
    pub green: u8,
}

impl LedColor {
    pub const OFF: Self = Self { red: 0, green: 0 };
    pub const RED: Self = Self { red: 3, green: 0 };
    pub const GREEN: Self = Self { red: 0, green: 3 };
    pub const AMBER: Self = Self { red: 3, green: 3 };

    /// Create a color, clamping each level to 0-3
    pub fn new(red: u8, green: u8) -> Self {
        Self {
            red: red.min(MAX_LED_LEVEL),
            green: green.min(MAX_LED_LEVEL),
        }
    }

    /// Same color with levels clamped to the valid range
    pub fn clamped(&self) -> Self {
        Self::new(self.red, self.green)
    }
}

/// MIDI address of a button outside the 8×8 grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonAddress {
    /// Note On/Off message
    Note {
        /// MIDI channel (0-15)
        channel: u8,
        /// Note number (0-127)
        note: u8,
    },
    /// Control Change message
    #[serde(rename = "control_change")]
    CC {
        /// MIDI channel (0-15)
        channel: u8,
        /// CC number (0-127)
        cc: u8,
    },
}

/// Input event from a grid device
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridEvent {
    /// Grid pad pressed
    Pressed(Cell),
    /// Grid pad released
    Released(Cell),
    /// Any other button (scene/top-row buttons)
    Button { address: ButtonAddress, pressed: bool },
}
