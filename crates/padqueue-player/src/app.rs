//! Main event loop: grid hits in, playback commands and LED frames out

use padqueue_core::{Activation, PlaybackService, PlaybackSynchronizer, SyncError, WindowSource};
use padqueue_midi::{GridController, GridDevice};

/// What happened over one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub hits: usize,
    pub played: usize,
    pub paused: usize,
    pub ignored: usize,
    /// Activations that ended in an error other than cancellation
    pub failed: usize,
}

/// Serve grid presses until the controller stops yielding hits
///
/// Each press is activated, then the window is re-fetched and redrawn. Errors
/// are logged and the loop keeps going; a failed refresh keeps the previous
/// window on the grid.
pub fn run<S, D>(
    sync: &mut PlaybackSynchronizer<S>,
    grid: &mut GridController<D>,
    source: &WindowSource,
) -> RunSummary
where
    S: PlaybackService,
    D: GridDevice,
{
    let mut summary = RunSummary::default();

    refresh(sync, source);
    grid.render_window(sync.window(), sync.armed());
    log::info!(
        "App: Serving {} track(s) from playlist {}",
        sync.window().len(),
        source.playlist_id
    );
    if !sync.binding().is_bound() {
        log::warn!("App: No output device bound, commands go to the active device");
    }

    while let Some(cell) = grid.next_hit() {
        summary.hits += 1;
        match sync.activate(cell) {
            Ok(Activation::Ignored) => summary.ignored += 1,
            Ok(Activation::Paused) => summary.paused += 1,
            Ok(Activation::Playing(outcome)) => {
                summary.played += 1;
                log::info!(
                    "App: Playing '{}' from cell {} after {} poll(s){}",
                    outcome.track.name,
                    cell,
                    outcome.attempts,
                    if outcome.recovered { " (recovered)" } else { "" }
                );
            }
            Err(SyncError::Cancelled) => {
                log::info!("App: Activation of cell {} cancelled", cell);
                break;
            }
            Err(e @ SyncError::NotFoundInQueue { .. }) => {
                summary.failed += 1;
                log::warn!("App: {}", e);
            }
            Err(e) => {
                summary.failed += 1;
                log::error!("App: Cell {} failed: {}", cell, e);
            }
        }

        refresh(sync, source);
        grid.render_window(sync.window(), sync.armed());
    }

    log::info!(
        "App: Stopped after {} hit(s), {} played, {} failed",
        summary.hits,
        summary.played,
        summary.failed
    );
    summary
}

fn refresh<S: PlaybackService>(sync: &mut PlaybackSynchronizer<S>, source: &WindowSource) {
    if let Err(e) = sync.refresh_window(source) {
        log::error!("App: Window refresh failed, keeping previous window: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::{Receiver, Sender};
    use padqueue_core::{
        CancelToken, Cell, DeviceBinding, PlaybackStatus, QueueSnapshot, RemoteDevice,
        ServiceError, SyncPolicy, Track,
    };
    use padqueue_midi::{GridEvent, LedColor, Palette};
    use std::cell::{Cell as Flag, RefCell};

    /// Queue that echoes back everything enqueued so far
    #[derive(Default)]
    struct EchoService {
        queue: RefCell<Vec<String>>,
        playing: Flag<bool>,
        window_size: usize,
        fail_fetch: Flag<bool>,
        never_queue: bool,
    }

    impl PlaybackService for EchoService {
        fn fetch_window(&self, _: &str, limit: usize, offset: usize) -> Result<Vec<Track>, ServiceError> {
            if self.fail_fetch.get() {
                return Err(ServiceError::Status {
                    operation: "fetch_window",
                    status: 503,
                    body: String::new(),
                });
            }
            Ok((offset..offset + limit.min(self.window_size))
                .map(|i| Track::new(format!("t{}", i), format!("Track {}", i)))
                .collect())
        }

        fn enqueue(&self, track_id: &str, _: Option<&str>) -> Result<(), ServiceError> {
            if !self.never_queue {
                self.queue.borrow_mut().push(track_id.to_string());
            }
            Ok(())
        }

        fn queue_snapshot(&self) -> Result<QueueSnapshot, ServiceError> {
            Ok(QueueSnapshot::new(self.queue.borrow().clone()))
        }

        fn skip(&self) -> Result<(), ServiceError> {
            let mut queue = self.queue.borrow_mut();
            if !queue.is_empty() {
                queue.remove(0);
            }
            Ok(())
        }

        fn transfer_playback(&self, _: &str) -> Result<(), ServiceError> {
            Ok(())
        }

        fn pause(&self) -> Result<(), ServiceError> {
            self.playing.set(false);
            Ok(())
        }

        fn resume(&self) -> Result<(), ServiceError> {
            self.playing.set(true);
            Ok(())
        }

        fn playback_status(&self) -> Result<PlaybackStatus, ServiceError> {
            Ok(PlaybackStatus {
                is_playing: self.playing.get(),
                current_track_id: None,
            })
        }

        fn list_devices(&self) -> Result<Vec<RemoteDevice>, ServiceError> {
            Ok(Vec::new())
        }
    }

    struct FrameGrid {
        frames: Vec<Vec<(Cell, LedColor)>>,
        event_rx: Receiver<GridEvent>,
    }

    impl GridDevice for FrameGrid {
        fn clear(&mut self) {
            self.frames.push(Vec::new());
        }

        fn light(&mut self, cell: Cell, color: LedColor) {
            if let Some(frame) = self.frames.last_mut() {
                frame.push((cell, color));
            }
        }

        fn events(&self) -> Receiver<GridEvent> {
            self.event_rx.clone()
        }
    }

    fn fast_policy() -> SyncPolicy {
        SyncPolicy {
            poll_interval_ms: 0,
            ..SyncPolicy::default()
        }
    }

    fn setup(
        service: EchoService,
    ) -> (
        PlaybackSynchronizer<EchoService>,
        GridController<FrameGrid>,
        Sender<GridEvent>,
    ) {
        let cancel = CancelToken::new();
        let (tx, rx) = flume::unbounded();
        let grid = FrameGrid {
            frames: Vec::new(),
            event_rx: rx,
        };
        let sync = PlaybackSynchronizer::new(
            service,
            fast_policy(),
            DeviceBinding::new("dev"),
            cancel.clone(),
        );
        (sync, GridController::new(grid, Palette::default(), cancel), tx)
    }

    fn cell(index: usize) -> Cell {
        Cell::from_index(index).unwrap()
    }

    fn source() -> WindowSource {
        WindowSource::new("pl", 64, 0)
    }

    #[test]
    fn test_play_pause_cycle_renders_each_step() {
        let (mut sync, mut grid, tx) = setup(EchoService {
            window_size: 4,
            ..Default::default()
        });
        tx.send(GridEvent::Pressed(cell(2))).unwrap();
        tx.send(GridEvent::Pressed(cell(2))).unwrap();
        tx.send(GridEvent::Pressed(cell(30))).unwrap();
        drop(tx);

        let summary = run(&mut sync, &mut grid, &source());
        assert_eq!(
            summary,
            RunSummary {
                hits: 3,
                played: 1,
                paused: 1,
                ignored: 1,
                failed: 0,
            }
        );

        // Initial frame plus one per hit
        let frames = &grid.device().frames;
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1].last(), Some(&(cell(2), LedColor::GREEN)));
        assert_eq!(frames[2].len(), 4);
        assert!(frames[2].iter().all(|(_, color)| *color == LedColor::AMBER));
        assert!(!sync.service().playing.get());
    }

    #[test]
    fn test_not_found_keeps_serving() {
        let (mut sync, mut grid, tx) = setup(EchoService {
            window_size: 2,
            never_queue: true,
            ..Default::default()
        });
        tx.send(GridEvent::Pressed(cell(0))).unwrap();
        tx.send(GridEvent::Pressed(cell(1))).unwrap();
        drop(tx);

        let summary = run(&mut sync, &mut grid, &source());
        assert_eq!(summary.hits, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(sync.armed(), Some(cell(1)));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_window() {
        let (mut sync, mut grid, tx) = setup(EchoService {
            window_size: 3,
            ..Default::default()
        });
        sync.refresh_window(&source()).unwrap();
        sync.service().fail_fetch.set(true);
        tx.send(GridEvent::Pressed(cell(1))).unwrap();
        drop(tx);

        let summary = run(&mut sync, &mut grid, &source());
        assert_eq!(summary.played, 1);
        assert_eq!(sync.window().len(), 3);
        assert_eq!(grid.device().frames.last().map(Vec::len), Some(4));
    }
}
