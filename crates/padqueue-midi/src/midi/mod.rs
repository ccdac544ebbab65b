//! MIDI protocol backend
//!
//! Handles Launchpad connection, input parsing, and LED output via midir.

pub mod connection;
pub mod input;
pub mod output;

pub use connection::{GridConnectionError, MidiConnection};
pub use input::{MidiInputEvent, MidiInputHandler};
pub use output::MidiOutputHandler;
