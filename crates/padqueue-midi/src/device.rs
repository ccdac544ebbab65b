//! Grid device capability and its Launchpad implementation

use crate::config::GridConfig;
use crate::midi::{GridConnectionError, MidiConnection, MidiInputHandler, MidiOutputHandler};
use crate::types::{GridEvent, LedColor};
use flume::Receiver;
use padqueue_core::Cell;

/// Capacity of the event channel between the driver callback and the event loop
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// An 8×8 illuminated button grid
pub trait GridDevice {
    /// Turn every pad LED off
    fn clear(&mut self);

    /// Set one pad's LED
    fn light(&mut self, cell: Cell, color: LedColor);

    /// Receiver of input events, in arrival order
    ///
    /// All clones share one queue: an event is delivered once.
    fn events(&self) -> Receiver<GridEvent>;
}

/// Novation Launchpad over MIDI
pub struct LaunchpadDevice {
    _input: MidiInputHandler,
    output: MidiOutputHandler,
    event_rx: Receiver<GridEvent>,
}

impl LaunchpadDevice {
    /// Connect input and output ports matching the configured pattern
    pub fn connect(config: &GridConfig) -> Result<Self, GridConnectionError> {
        let (event_tx, event_rx) = flume::bounded(EVENT_CHANNEL_CAPACITY);

        let channel = config.midi_channel();
        if channel != config.channel {
            log::warn!(
                "MIDI: Channel {} is out of range, using {}",
                config.channel,
                channel
            );
        }

        let input = MidiInputHandler::connect(&config.port_match, config.layout, channel, event_tx)?;
        let output_conn = MidiConnection::connect_output(&config.port_match)?;

        log::info!(
            "MIDI: Connected to grid matching '{}'",
            config.port_match
        );

        Ok(Self {
            _input: input,
            output: MidiOutputHandler::new(output_conn, config.layout, channel),
            event_rx,
        })
    }
}

impl GridDevice for LaunchpadDevice {
    fn clear(&mut self) {
        self.output.clear();
    }

    fn light(&mut self, cell: Cell, color: LedColor) {
        self.output.light(cell, color);
    }

    fn events(&self) -> Receiver<GridEvent> {
        self.event_rx.clone()
    }
}
