//! Core of padqueue: the playlist window model and the playback synchronizer
//!
//! This crate provides:
//! - Grid/window data model (`Cell`, `Track`, `PlaylistWindow`, `Session`)
//! - The `PlaybackService` capability the synchronizer drives
//! - `PlaybackSynchronizer`, which turns a cell press into confirmed remote playback
//! - A Spotify Web API implementation of `PlaybackService`
//! - A cooperative `CancelToken` for clean shutdown
//!
//! # Architecture
//!
//! ```text
//! Cell press → PlaybackSynchronizer::activate()
//!            → enqueue → poll queue snapshot (→ transfer + re-enqueue once)
//!            → skip × (queue index + 1) → resume if paused
//! ```
//!
//! Everything here is synchronous. One activation runs to completion (or
//! cancellation) before the caller reads the next press.

mod cancel;
mod service;
mod spotify;
mod sync;
mod types;

pub use cancel::CancelToken;
pub use service::{PlaybackService, PlaybackStatus, RemoteDevice, ServiceError};
pub use spotify::{SpotifyService, DEFAULT_API_BASE};
pub use sync::{Activation, PlaybackSynchronizer, SyncError, SyncOutcome, SyncPolicy};
pub use types::{
    Cell, DeviceBinding, PlaylistWindow, QueueSnapshot, Session, Track, WindowSource, GRID_SIZE,
    WINDOW_CAPACITY,
};
