//! Grid controller configuration
//!
//! Lives in the `grid:` section of the player's YAML config.

use crate::layout::GridLayout;
use crate::types::{ButtonAddress, LedColor};
use serde::{Deserialize, Serialize};

/// Highest MIDI channel number (channels are 0-15 on the wire)
const MAX_MIDI_CHANNEL: u8 = 15;

/// Grid device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Port name substring to match (case-insensitive)
    pub port_match: String,
    /// Pad numbering scheme of the device
    pub layout: GridLayout,
    /// MIDI channel the pads talk on (0-15, larger values are clamped)
    pub channel: u8,
    /// Color of a cell with a track behind it
    pub idle_color: LedColor,
    /// Color of the armed cell
    pub armed_color: LedColor,
    /// Button that shuts padqueue down (defaults to the layout's top-right scene button)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_button: Option<ButtonAddress>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            port_match: "launchpad".to_string(),
            layout: GridLayout::default(),
            channel: 0,
            idle_color: LedColor::AMBER,
            armed_color: LedColor::GREEN,
            exit_button: None,
        }
    }
}

impl GridConfig {
    /// Channel to put in status bytes
    pub fn midi_channel(&self) -> u8 {
        self.channel.min(MAX_MIDI_CHANNEL)
    }

    /// Exit button with the layout default filled in
    pub fn resolved_exit_button(&self) -> ButtonAddress {
        self.exit_button
            .unwrap_or_else(|| self.layout.default_exit_button(self.midi_channel()))
    }
}

/// Normalize a MIDI port name by removing hardware-specific identifiers
///
/// ALSA port names include dynamic IDs that change between systems/reconnections:
///
/// 1. Bracketed hardware IDs: `[hw:3,0,0]`
/// 2. ALSA sequencer client:port IDs: trailing `28:0` or `20:0`
///
/// Examples:
/// - "Launchpad Mini MK3 [hw:1,0,0]" -> "Launchpad Mini MK3"
/// - "Launchpad S:Launchpad S MIDI 1 28:0" -> "Launchpad S:Launchpad S MIDI 1"
pub fn normalize_port_name(name: &str) -> String {
    let mut result = name.trim();

    if let Some(bracket_pos) = result.rfind('[') {
        result = result[..bracket_pos].trim();
    }

    // Pattern: space followed by digits, colon, digits at end of string
    if let Some(last_space) = result.rfind(' ') {
        let suffix = &result[last_space + 1..];
        if let Some((client, port)) = suffix.split_once(':') {
            if !client.is_empty()
                && !port.is_empty()
                && client.chars().all(|c| c.is_ascii_digit())
                && port.chars().all(|c| c.is_ascii_digit())
            {
                result = result[..last_space].trim();
            }
        }
    }

    result.to_string()
}

/// Case-insensitive substring match of a port name against a pattern,
/// both sides normalized
pub fn port_matches(actual_port: &str, port_match: &str) -> bool {
    normalize_port_name(actual_port)
        .to_lowercase()
        .contains(&normalize_port_name(port_match).to_lowercase())
}
