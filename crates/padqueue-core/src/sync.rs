//! Playback synchronization
//!
//! Drives the eventually-consistent remote queue until a requested track is
//! the one playing:
//!
//! 1. Enqueue the track on the bound device
//! 2. Poll the queue snapshot until the track shows up (bounded by attempts)
//! 3. After `soft_threshold` misses, transfer playback to the bound device and
//!    enqueue once more (one-shot; the attempt counter keeps running)
//! 4. Skip everything ahead of it, then the current head (`position + 1` skips)
//! 5. Resume only if the player is paused
//!
//! The skip count assumes nobody else touches the queue between the poll and
//! the skips. The status read after skipping reports whether the target is
//! actually current; a mismatch is logged, not treated as failure.

use crate::cancel::CancelToken;
use crate::service::{PlaybackService, ServiceError};
use crate::types::{Cell, DeviceBinding, PlaylistWindow, Session, Track, WindowSource};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Error type for a single activation
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Playback service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Track '{track_id}' not in remote queue after {attempts} polls")]
    NotFoundInQueue { track_id: String, attempts: u32 },

    #[error("Synchronization cancelled")]
    Cancelled,
}

/// Polling bounds for the enqueue-and-confirm protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPolicy {
    /// Sleep between queue polls
    pub poll_interval_ms: u64,
    /// Failed polls before the transfer-and-reenqueue recovery
    pub soft_threshold: u32,
    /// Failed polls before giving up
    pub hard_ceiling: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 150,
            soft_threshold: 5,
            hard_ceiling: 20,
        }
    }
}

impl SyncPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// What an activation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Cell has no track behind it
    Ignored,
    /// Armed cell pressed again: playback paused and the cell disarmed
    Paused,
    /// Track confirmed in the queue and skipped to
    Playing(SyncOutcome),
}

/// Details of a successful synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub track: Track,
    /// Position the track was found at in the remote queue
    pub queue_index: usize,
    /// Queue polls it took to find the track
    pub attempts: u32,
    /// Whether the transfer-and-reenqueue recovery ran
    pub recovered: bool,
    /// Whether a resume was issued
    pub resumed: bool,
    /// Whether the remote player reports the target as current
    /// (`None` when the service does not say what is playing)
    pub confirmed: Option<bool>,
}

/// Owns the session state and runs one activation per grid press
pub struct PlaybackSynchronizer<S> {
    service: S,
    policy: SyncPolicy,
    session: Session,
    cancel: CancelToken,
}

impl<S: PlaybackService> PlaybackSynchronizer<S> {
    pub fn new(service: S, policy: SyncPolicy, binding: DeviceBinding, cancel: CancelToken) -> Self {
        let policy = SyncPolicy {
            hard_ceiling: policy.hard_ceiling.max(1),
            ..policy
        };
        Self {
            service,
            policy,
            session: Session::new(binding),
            cancel,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn window(&self) -> &PlaylistWindow {
        &self.session.window
    }

    pub fn armed(&self) -> Option<Cell> {
        self.session.armed
    }

    pub fn binding(&self) -> &DeviceBinding {
        &self.session.binding
    }

    /// Re-bind the session to another output device
    pub fn set_binding(&mut self, binding: DeviceBinding) {
        log::info!("Sync: Device binding set to {:?}", binding.device_id());
        self.session.binding = binding;
    }

    /// Replace the window wholesale
    pub fn set_window(&mut self, window: PlaylistWindow) {
        self.session.window = window;
    }

    /// Fetch a fresh window from the service and replace the current one
    pub fn refresh_window(&mut self, source: &WindowSource) -> Result<&PlaylistWindow, ServiceError> {
        log::debug!(
            "Sync: Refreshing window (playlist {}, limit {}, offset {})",
            source.playlist_id,
            source.limit,
            source.offset
        );
        let tracks = self
            .service
            .fetch_window(&source.playlist_id, source.limit, source.offset)?;
        self.session.window = PlaylistWindow::new(tracks);
        log::debug!("Sync: Window holds {} track(s)", self.session.window.len());
        Ok(&self.session.window)
    }

    /// Handle one grid press
    ///
    /// Pressing the armed cell pauses and disarms. Pressing any other occupied
    /// cell arms it and synchronizes its track. Empty cells are ignored.
    /// On `NotFoundInQueue` the cell stays armed.
    pub fn activate(&mut self, cell: Cell) -> Result<Activation, SyncError> {
        let Some(track) = self.session.window.track_at(cell).cloned() else {
            log::debug!("Sync: Cell {} is past the end of the window, ignoring", cell);
            return Ok(Activation::Ignored);
        };

        if self.session.armed == Some(cell) {
            log::info!("Sync: Cell {} pressed again, pausing", cell);
            self.service.pause()?;
            self.session.armed = None;
            return Ok(Activation::Paused);
        }

        if let Some(previous) = self.session.armed.replace(cell) {
            log::debug!("Sync: Cell {} supersedes {}", cell, previous);
        }
        log::info!("Sync: Playing '{}' ({}) from cell {}", track.name, track.id, cell);

        self.enqueue(&track)?;
        let (queue_index, attempts, recovered) = self.await_in_queue(&track)?;

        for _ in 0..=queue_index {
            log::debug!("Sync: Skipping track");
            self.service.skip()?;
        }

        let status = self.service.playback_status()?;
        let resumed = !status.is_playing;
        if resumed {
            log::debug!("Sync: Player paused, resuming");
            self.service.resume()?;
        }

        let confirmed = status
            .current_track_id
            .as_deref()
            .map(|current| current == track.id);
        if confirmed == Some(false) {
            log::warn!(
                "Sync: Expected '{}' to be current after skipping, remote reports {:?}",
                track.id,
                status.current_track_id
            );
        }

        Ok(Activation::Playing(SyncOutcome {
            track,
            queue_index,
            attempts,
            recovered,
            resumed,
            confirmed,
        }))
    }

    fn enqueue(&self, track: &Track) -> Result<(), ServiceError> {
        self.service
            .enqueue(&track.id, self.session.binding.device_id())
    }

    /// Poll until the track appears; returns (position, attempts, recovered)
    fn await_in_queue(&self, track: &Track) -> Result<(usize, u32, bool), SyncError> {
        let mut attempts = 0u32;
        let mut recovered = false;

        loop {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let snapshot = self.service.queue_snapshot()?;
            attempts += 1;
            log::debug!(
                "Sync: Poll {}/{}: {} queued",
                attempts,
                self.policy.hard_ceiling,
                snapshot.len()
            );

            if let Some(position) = snapshot.position_of(&track.id) {
                log::debug!("Sync: '{}' found at queue position {}", track.id, position);
                return Ok((position, attempts, recovered));
            }

            if attempts >= self.policy.hard_ceiling {
                log::warn!(
                    "Sync: '{}' still not queued after {} polls, giving up",
                    track.id,
                    attempts
                );
                return Err(SyncError::NotFoundInQueue {
                    track_id: track.id.clone(),
                    attempts,
                });
            }

            if !recovered && attempts >= self.policy.soft_threshold {
                recovered = true;
                self.rebind_and_enqueue(track)?;
            }

            if !self.cancel.sleep(self.policy.poll_interval()) {
                return Err(SyncError::Cancelled);
            }
        }
    }

    /// One-shot recovery for a stale device binding
    fn rebind_and_enqueue(&self, track: &Track) -> Result<(), ServiceError> {
        match self.session.binding.device_id() {
            Some(device_id) => {
                log::info!(
                    "Sync: Track not showing up in queue, transferring playback to {}",
                    device_id
                );
                self.service.transfer_playback(device_id)?;
            }
            None => {
                log::warn!("Sync: Track not showing up in queue and no device bound, re-enqueueing only");
            }
        }
        self.enqueue(track)
    }
}
