//! MIDI port lookup for the grid
//!
//! Input and output ports are found the same way, through midir's `MidiIO`
//! trait: first port whose normalized name contains the configured pattern.

use crate::config::port_matches;
use midir::{MidiIO, MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};

/// Error opening the grid's MIDI ports
#[derive(Debug, thiserror::Error)]
pub enum GridConnectionError {
    #[error("MIDI backend unavailable: {0}")]
    Backend(String),

    #[error("No MIDI {direction} port matching '{pattern}'")]
    PortNotFound {
        direction: &'static str,
        pattern: String,
    },

    #[error("Failed to connect to MIDI port '{port}': {message}")]
    Connect { port: String, message: String },
}

/// First port of `io` matching the pattern, with its name
fn find_port<T: MidiIO>(io: &T, port_match: &str) -> Option<(T::Port, String)> {
    io.ports().into_iter().find_map(|port| {
        let name = io.port_name(&port).ok()?;
        port_matches(&name, port_match).then_some((port, name))
    })
}

fn port_names<T: MidiIO>(io: &T) -> Vec<String> {
    io.ports()
        .iter()
        .filter_map(|port| io.port_name(port).ok())
        .collect()
}

/// Port lookup helpers
pub struct MidiConnection;

impl MidiConnection {
    /// Find the grid's input port, returning the MidiInput so the caller can
    /// attach its callback
    pub fn find_input_port(
        port_match: &str,
    ) -> Result<(MidiInput, MidiInputPort, String), GridConnectionError> {
        let midi_in = MidiInput::new("padqueue-in")
            .map_err(|e| GridConnectionError::Backend(e.to_string()))?;

        let (port, name) =
            find_port(&midi_in, port_match).ok_or_else(|| GridConnectionError::PortNotFound {
                direction: "input",
                pattern: port_match.to_string(),
            })?;
        log::info!("MIDI: Found input port: {}", name);

        Ok((midi_in, port, name))
    }

    /// Find and connect the grid's output port
    pub fn connect_output(port_match: &str) -> Result<MidiOutputConnection, GridConnectionError> {
        let midi_out = MidiOutput::new("padqueue-out")
            .map_err(|e| GridConnectionError::Backend(e.to_string()))?;

        let (port, name) =
            find_port(&midi_out, port_match).ok_or_else(|| GridConnectionError::PortNotFound {
                direction: "output",
                pattern: port_match.to_string(),
            })?;
        log::info!("MIDI: Found output port: {}", name);

        midi_out
            .connect(&port, "padqueue-output")
            .map_err(|e| GridConnectionError::Connect {
                port: name,
                message: e.to_string(),
            })
    }

    pub fn list_input_ports() -> Result<Vec<String>, GridConnectionError> {
        let midi_in = MidiInput::new("padqueue-list")
            .map_err(|e| GridConnectionError::Backend(e.to_string()))?;
        Ok(port_names(&midi_in))
    }

    pub fn list_output_ports() -> Result<Vec<String>, GridConnectionError> {
        let midi_out = MidiOutput::new("padqueue-list")
            .map_err(|e| GridConnectionError::Backend(e.to_string()))?;
        Ok(port_names(&midi_out))
    }
}
