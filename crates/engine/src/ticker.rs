use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::playback::FrameScheduler;

/// Roughly one display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Tick delivered to the frame channel by [`ThreadScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Counts up from zero for each run of the scheduler.
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        match self.stopped.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.wake.notify_all();
    }

    /// Sleeps for `interval` unless stopped first. Returns `true` once stopped.
    fn wait(&self, interval: Duration) -> bool {
        let Ok(stopped) = self.stopped.lock() else {
            return true;
        };
        match self
            .wake
            .wait_timeout_while(stopped, interval, |stopped| !*stopped)
        {
            Ok((stopped, _)) => *stopped,
            Err(_) => true,
        }
    }
}

/// Frame scheduler backed by a worker thread.
///
/// While active, a ticker thread sends a [`FrameTick`] every interval. The
/// consumer owns the receiving end and feeds ticks to the sync loop. `cancel`
/// wakes the ticker and joins it, so no tick is sent once it returns.
#[derive(Debug)]
pub struct ThreadScheduler {
    interval: Duration,
    frames: Sender<FrameTick>,
    running: Option<(Arc<StopSignal>, JoinHandle<()>)>,
}

impl ThreadScheduler {
    pub fn new(interval: Duration, frames: Sender<FrameTick>) -> Self {
        Self {
            interval,
            frames,
            running: None,
        }
    }

    pub fn with_default_interval(frames: Sender<FrameTick>) -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL, frames)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for ThreadScheduler {
    fn start(&mut self) {
        if self.is_active() {
            return;
        }
        self.cancel();

        let signal = Arc::new(StopSignal::default());
        let worker_signal = Arc::clone(&signal);
        let frames = self.frames.clone();
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("frame-ticker".to_owned())
            .spawn(move || {
                let mut sequence = 0_u64;
                while !worker_signal.wait(interval) {
                    if frames.send(FrameTick { sequence }).is_err() {
                        break;
                    }
                    sequence += 1;
                }
            });

        match spawned {
            Ok(handle) => {
                debug!(interval_ms = interval.as_millis() as u64, "frame ticker started");
                self.running = Some((signal, handle));
            }
            Err(error) => warn!(%error, "failed to spawn frame ticker"),
        }
    }

    fn cancel(&mut self) {
        let Some((signal, handle)) = self.running.take() else {
            return;
        };
        signal.stop();
        if handle.join().is_err() {
            warn!("frame ticker panicked");
        }
        debug!("frame ticker cancelled");
    }

    fn is_active(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::{FrameTick, ThreadScheduler};
    use crate::playback::FrameScheduler;

    #[test]
    fn ticks_arrive_in_sequence_while_active() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(Duration::from_millis(1), tx);

        scheduler.start();
        let first = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("first tick");
        let second = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("second tick");
        scheduler.cancel();

        assert_eq!(first, FrameTick { sequence: 0 });
        assert_eq!(second, FrameTick { sequence: 1 });
    }

    #[test]
    fn cancel_is_idempotent_and_stops_ticks() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(Duration::from_millis(1), tx);

        scheduler.cancel();
        scheduler.start();
        assert!(scheduler.is_active());
        scheduler.cancel();
        scheduler.cancel();
        assert!(!scheduler.is_active());

        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(30)).is_err());
    }

    #[test]
    fn restart_begins_a_new_sequence() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(Duration::from_millis(1), tx);

        scheduler.start();
        rx.recv_timeout(Duration::from_secs(2)).expect("tick");
        scheduler.cancel();
        while rx.try_recv().is_ok() {}

        scheduler.start();
        let tick = rx.recv_timeout(Duration::from_secs(2)).expect("tick");
        drop(scheduler);

        assert_eq!(tick.sequence, 0);
    }

    #[test]
    fn long_interval_is_interrupted_by_cancel() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(Duration::from_secs(60), tx);

        scheduler.start();
        scheduler.cancel();

        assert!(rx.try_recv().is_err());
    }
}
