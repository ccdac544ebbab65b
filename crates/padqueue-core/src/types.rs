//! Grid and playlist data model
//!
//! A window of at most 64 tracks is laid out row-major over the 8×8 grid:
//! index `i` lives at `(col = i % 8, row = i / 8)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cells per grid side
pub const GRID_SIZE: u8 = 8;

/// Maximum number of tracks a window can hold (one per cell)
pub const WINDOW_CAPACITY: usize = (GRID_SIZE as usize) * (GRID_SIZE as usize);

/// A button on the 8×8 grid
///
/// Columns run left to right, rows top to bottom, both 0-7.
/// Out-of-grid coordinates cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    col: u8,
    row: u8,
}

impl Cell {
    /// Create a cell, or `None` if either coordinate is off the grid
    pub fn new(col: u8, row: u8) -> Option<Self> {
        (col < GRID_SIZE && row < GRID_SIZE).then_some(Self { col, row })
    }

    /// Cell for a window index (`None` for index ≥ 64)
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= WINDOW_CAPACITY {
            return None;
        }
        let size = GRID_SIZE as usize;
        Some(Self {
            col: (index % size) as u8,
            row: (index / size) as u8,
        })
    }

    /// Window index of this cell (`col + 8 * row`)
    pub fn index(&self) -> usize {
        self.col as usize + GRID_SIZE as usize * self.row as usize
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    /// All 64 cells in window-index order
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..WINDOW_CAPACITY).filter_map(Cell::from_index)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A playable track as listed in the remote playlist
///
/// Identity is `id`; `name` is only used for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The slice of a playlist currently mapped onto the grid
///
/// Replaced wholesale on every refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistWindow {
    tracks: Vec<Track>,
}

impl PlaylistWindow {
    /// Build a window, dropping anything past the 64th track
    pub fn new(mut tracks: Vec<Track>) -> Self {
        if tracks.len() > WINDOW_CAPACITY {
            log::warn!(
                "PlaylistWindow: {} tracks fetched, keeping the first {}",
                tracks.len(),
                WINDOW_CAPACITY
            );
            tracks.truncate(WINDOW_CAPACITY);
        }
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track at a window index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Track mapped to a cell, `None` for cells past the end of the window
    pub fn track_at(&self, cell: Cell) -> Option<&Track> {
        self.get(cell.index())
    }

    /// Whether a cell has a track behind it
    pub fn contains_cell(&self, cell: Cell) -> bool {
        cell.index() < self.tracks.len()
    }

    /// Occupied cells paired with their tracks, in index order
    pub fn cells(&self) -> impl Iterator<Item = (Cell, &Track)> + '_ {
        self.tracks
            .iter()
            .enumerate()
            .filter_map(|(i, track)| Cell::from_index(i).map(|cell| (cell, track)))
    }
}

/// Where the window is fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSource {
    pub playlist_id: String,
    /// Number of tracks requested (clamped to 64)
    pub limit: usize,
    pub offset: usize,
}

impl WindowSource {
    pub fn new(playlist_id: impl Into<String>, limit: usize, offset: usize) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            limit: limit.min(WINDOW_CAPACITY),
            offset,
        }
    }
}

/// Track ids currently queued remotely, in play order
///
/// Fetched fresh on every poll and never kept around.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    ids: Vec<String>,
}

impl QueueSnapshot {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// Position of a track in the queue
    ///
    /// A track queued more than once reports its last position: the entry
    /// appended by the most recent enqueue.
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.ids.iter().rposition(|id| id == track_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for QueueSnapshot {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Output device the session is believed to be bound to
///
/// May go stale when the remote side moves playback elsewhere; the
/// synchronizer re-binds it with a transfer when enqueues stop landing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceBinding {
    device_id: Option<String>,
}

impl DeviceBinding {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
        }
    }

    /// No device resolved: commands go to whatever device is active remotely
    pub fn unbound() -> Self {
        Self { device_id: None }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.device_id.is_some()
    }
}

/// Mutable state of the single grid session
///
/// Owned by the synchronizer and only touched from the event loop.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub window: PlaylistWindow,
    /// Cell whose track was most recently requested
    pub armed: Option<Cell>,
    pub binding: DeviceBinding,
}

impl Session {
    pub fn new(binding: DeviceBinding) -> Self {
        Self {
            window: PlaylistWindow::default(),
            armed: None,
            binding,
        }
    }
}
