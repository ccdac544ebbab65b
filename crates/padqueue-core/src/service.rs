//! Remote playback service capability
//!
//! The synchronizer only needs these few operations; authentication,
//! pagination and the HTTP transport are the implementor's business.

use crate::types::{QueueSnapshot, Track};

/// Error type for playback service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{operation}: service unreachable: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation}: HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation}: failed to decode response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

/// Remote player state as far as the synchronizer cares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub is_playing: bool,
    /// Id of the track currently loaded remotely, if the service reports it
    pub current_track_id: Option<String>,
}

/// Output device known to the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDevice {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

/// Remote music playback queue
///
/// Calls are blocking. Every method may fail with a `ServiceError`; callers
/// propagate rather than retry.
pub trait PlaybackService {
    /// Fetch `limit` playlist tracks starting at `offset`
    fn fetch_window(
        &self,
        playlist_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Track>, ServiceError>;

    /// Append a track to the remote queue, targeting `device_id` when given
    fn enqueue(&self, track_id: &str, device_id: Option<&str>) -> Result<(), ServiceError>;

    /// Current upcoming-tracks list
    fn queue_snapshot(&self) -> Result<QueueSnapshot, ServiceError>;

    /// Advance to the next queued track
    fn skip(&self) -> Result<(), ServiceError>;

    /// Move the session's playback to `device_id`
    fn transfer_playback(&self, device_id: &str) -> Result<(), ServiceError>;

    fn pause(&self) -> Result<(), ServiceError>;

    fn resume(&self) -> Result<(), ServiceError>;

    fn playback_status(&self) -> Result<PlaybackStatus, ServiceError>;

    /// Output devices available to the session
    fn list_devices(&self) -> Result<Vec<RemoteDevice>, ServiceError>;
}
