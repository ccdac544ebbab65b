//! MIDI output for grid LEDs
//!
//! Encodes clear/light commands for the configured layout and sends them.
//! Send failures are logged, never propagated: a dropped LED update is
//! corrected by the next render.

use crate::layout::GridLayout;
use crate::types::LedColor;
use midir::MidiOutputConnection;
use padqueue_core::Cell;

/// MIDI output handler for grid LEDs
pub struct MidiOutputHandler {
    connection: MidiOutputConnection,
    layout: GridLayout,
    channel: u8,
}

impl MidiOutputHandler {
    pub fn new(connection: MidiOutputConnection, layout: GridLayout, channel: u8) -> Self {
        Self {
            connection,
            layout,
            channel,
        }
    }

    /// Turn every grid LED off
    pub fn clear(&mut self) {
        log::debug!("[MIDI OUT] Clear grid");
        for message in self.layout.clear_messages(self.channel) {
            self.send_raw(&message);
        }
    }

    /// Set one pad's LED
    pub fn light(&mut self, cell: Cell, color: LedColor) {
        let note = self.layout.note_for(cell);
        let velocity = self.layout.velocity_for(color);
        log::trace!(
            "[MIDI OUT] Note ch={} note={:#04x} val={}",
            self.channel,
            note,
            velocity
        );
        self.send_raw(&[0x90 | self.channel, note, velocity]);
    }

    fn send_raw(&mut self, message: &[u8]) {
        if let Err(e) = self.connection.send(message) {
            log::warn!("MIDI output: Failed to send message: {}", e);
        }
    }
}

impl Drop for MidiOutputHandler {
    fn drop(&mut self) {
        self.clear();
    }
}
