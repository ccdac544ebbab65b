//! MIDI input handling
//!
//! Receives raw MIDI bytes from the midir callback, translates them into
//! `GridEvent`s using the device layout, and forwards them over a flume
//! channel to the event loop.

use super::connection::{GridConnectionError, MidiConnection};
use crate::layout::GridLayout;
use crate::types::{ButtonAddress, GridEvent};
use flume::Sender;
use midir::MidiInputConnection;

/// Raw MIDI input event (before grid translation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiInputEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiInputEvent {
    /// Parse raw MIDI bytes into an event
    ///
    /// MIDI message format:
    /// - Note Off: 0x8n nn vv (n=channel, nn=note, vv=velocity)
    /// - Note On: 0x9n nn vv
    /// - Control Change: 0xBn cc vv (cc=controller, vv=value)
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];
        let channel = status & 0x0F;

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                note: data[1],
                velocity: data[2],
            }),
            // Note On with velocity 0 is a Note Off
            0x90 if data[2] == 0 => Some(Self::NoteOff {
                channel,
                note: data[1],
                velocity: 0,
            }),
            0x90 => Some(Self::NoteOn {
                channel,
                note: data[1],
                velocity: data[2],
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                cc: data[1],
                value: data[2],
            }),
            _ => None, // Pitch bend, aftertouch, sysex...
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => *channel,
        }
    }

    /// Note On, or CC above the midpoint
    pub fn is_press(&self) -> bool {
        match self {
            Self::NoteOn { velocity, .. } => *velocity > 0,
            Self::ControlChange { value, .. } => *value > 63,
            Self::NoteOff { .. } => false,
        }
    }

    /// Translate into a grid event for the given layout
    ///
    /// Notes on the grid channel that land on a pad become Pressed/Released;
    /// everything else is reported as a plain button.
    pub fn to_grid_event(&self, layout: GridLayout, grid_channel: u8) -> GridEvent {
        let pressed = self.is_press();
        match *self {
            Self::NoteOn { channel, note, .. } | Self::NoteOff { channel, note, .. } => {
                match layout.cell_for(note).filter(|_| channel == grid_channel) {
                    Some(cell) if pressed => GridEvent::Pressed(cell),
                    Some(cell) => GridEvent::Released(cell),
                    None => GridEvent::Button {
                        address: ButtonAddress::Note { channel, note },
                        pressed,
                    },
                }
            }
            Self::ControlChange { channel, cc, .. } => GridEvent::Button {
                address: ButtonAddress::CC { channel, cc },
                pressed,
            },
        }
    }
}

/// Callback data passed to midir
struct CallbackData {
    event_tx: Sender<GridEvent>,
    layout: GridLayout,
    channel: u8,
}

/// MIDI input handler
///
/// Owns the midir connection; events arrive on the channel given at connect time.
pub struct MidiInputHandler {
    /// The midir connection (kept alive for the duration)
    _connection: MidiInputConnection<CallbackData>,
}

impl MidiInputHandler {
    /// Connect to the input port matching `port_match` with our callback
    pub fn connect(
        port_match: &str,
        layout: GridLayout,
        channel: u8,
        event_tx: Sender<GridEvent>,
    ) -> Result<Self, GridConnectionError> {
        let (midi_in, port, port_name) = MidiConnection::find_input_port(port_match)?;

        let callback_data = CallbackData {
            event_tx,
            layout,
            channel,
        };

        let connection = midi_in
            .connect(&port, "padqueue-input", Self::midi_callback, callback_data)
            .map_err(|e| GridConnectionError::Connect {
                port: port_name,
                message: e.to_string(),
            })?;

        log::info!("MIDI: Input handler connected ({:?} layout)", layout);

        Ok(Self {
            _connection: connection,
        })
    }

    /// Called from the MIDI driver thread for every message. Must not block.
    fn midi_callback(_timestamp: u64, data: &[u8], callback_data: &mut CallbackData) {
        let Some(event) = MidiInputEvent::parse(data) else {
            return;
        };
        log::debug!("[MIDI IN] {:?}", event);

        let grid_event = event.to_grid_event(callback_data.layout, callback_data.channel);
        log::trace!("[MIDI IN] -> {:?}", grid_event);

        if callback_data.event_tx.try_send(grid_event).is_err() {
            log::warn!("MIDI: Event channel full, dropping {:?}", grid_event);
        }
    }
}
