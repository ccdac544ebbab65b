//! Grid controller: window rendering and hit stream
//!
//! Stateless apart from "listening": translates device events into cells and
//! (window, armed cell) pairs into lit pads.

use crate::device::GridDevice;
use crate::types::{ButtonAddress, GridEvent, LedColor};
use flume::{Receiver, RecvTimeoutError};
use padqueue_core::{CancelToken, Cell, PlaylistWindow};
use std::time::Duration;

/// How often a blocked `next_hit` re-checks the cancel token
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Colors used to render a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Cell with a track behind it
    pub idle: LedColor,
    /// Armed cell
    pub armed: LedColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            idle: LedColor::AMBER,
            armed: LedColor::GREEN,
        }
    }
}

/// Drives one grid device
pub struct GridController<D> {
    device: D,
    events: Receiver<GridEvent>,
    palette: Palette,
    cancel: CancelToken,
    exit_button: Option<ButtonAddress>,
}

impl<D: GridDevice> GridController<D> {
    pub fn new(device: D, palette: Palette, cancel: CancelToken) -> Self {
        let events = device.events();
        Self {
            device,
            events,
            palette,
            cancel,
            exit_button: None,
        }
    }

    /// Button that cancels the shared token when pressed
    pub fn with_exit_button(mut self, button: ButtonAddress) -> Self {
        self.exit_button = Some(button);
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Clear the grid, light one pad per track, then overlay the armed cell
    ///
    /// The armed overlay is skipped when the cell has no track behind it.
    pub fn render_window(&mut self, window: &PlaylistWindow, armed: Option<Cell>) {
        self.device.clear();
        for (cell, _) in window.cells() {
            self.device.light(cell, self.palette.idle);
        }
        if let Some(cell) = armed.filter(|cell| window.contains_cell(*cell)) {
            self.device.light(cell, self.palette.armed);
        }
        log::debug!(
            "Grid: Rendered {} cell(s), armed {:?}",
            window.len(),
            armed.map(|c| c.to_string())
        );
    }

    /// Block until the next pad press
    ///
    /// Returns `None` once the cancel token fires (including via the exit
    /// button) or the device goes away. Releases and other buttons are skipped.
    pub fn next_hit(&self) -> Option<Cell> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            match self.events.recv_timeout(CANCEL_POLL) {
                Ok(GridEvent::Pressed(cell)) => return Some(cell),
                Ok(GridEvent::Released(_)) => continue,
                Ok(GridEvent::Button { address, pressed }) => {
                    if pressed && self.exit_button == Some(address) {
                        log::info!("Grid: Exit button pressed");
                        self.cancel.cancel();
                        return None;
                    }
                    log::trace!("Grid: Ignoring button {:?}", address);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("Grid: Event source disconnected");
                    return None;
                }
            }
        }
    }
}
