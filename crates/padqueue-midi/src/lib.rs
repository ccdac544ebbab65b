//! Launchpad-style grid controller support for padqueue
//!
//! This crate provides:
//! - The `GridDevice` capability (clear, light, event stream)
//! - `LaunchpadDevice`, a midir-backed implementation for XY and programmer layouts
//! - `GridController`, which renders a playlist window and yields pad hits
//!
//! # Architecture
//!
//! ```text
//! Launchpad → midir callback → flume channel → GridController::next_hit() → event loop
//! event loop → GridController::render_window() → MidiOutputHandler → Launchpad LEDs
//! ```
//!
//! The midir callback runs on the driver thread; it only parses and forwards.

mod config;
mod controller;
mod device;
mod layout;
pub mod midi;
mod types;

pub use config::{normalize_port_name, port_matches, GridConfig};
pub use controller::{GridController, Palette};
pub use device::{GridDevice, LaunchpadDevice};
pub use layout::GridLayout;
pub use midi::{GridConnectionError, MidiConnection};
pub use types::{ButtonAddress, GridEvent, LedColor, MAX_LED_LEVEL};

impl From<&GridConfig> for Palette {
    fn from(config: &GridConfig) -> Self {
        Self {
            idle: config.idle_color.clamped(),
            armed: config.armed_color.clamped(),
        }
    }
}
