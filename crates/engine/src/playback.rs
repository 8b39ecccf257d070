//! Playback sync loop driving the overlay pipeline.
//!
//! The loop is a small state machine fed with media events and frame ticks.
//! It decides *when* to render; what to render comes from
//! [`compose`](crate::overlay::compose). Continuous redraws are delegated to a
//! [`FrameScheduler`] so the same loop runs on a worker thread, an event-loop
//! timer or a UI refresh callback.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::overlay::{Overlay, compose};
use crate::segment::Segment;
use crate::style::Style;
use crate::time::seconds_or_zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Seeking,
}

/// Discrete notifications from the playback time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaEvent {
    Play,
    Pause,
    Seeking,
    TimeUpdate,
    Ended,
}

/// Snapshot of the time source taken when an event or tick is handled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockReading {
    pub time: f64,
    pub paused: bool,
    pub ended: bool,
}

impl ClockReading {
    pub fn playing(time: f64) -> Self {
        Self {
            time,
            paused: false,
            ended: false,
        }
    }

    pub fn paused(time: f64) -> Self {
        Self {
            time,
            paused: true,
            ended: false,
        }
    }

    pub fn ended(time: f64) -> Self {
        Self {
            time,
            paused: true,
            ended: true,
        }
    }
}

/// Source of per-frame callbacks while playback runs.
///
/// `start` and `cancel` must both be safe to call repeatedly.
pub trait FrameScheduler {
    fn start(&mut self);
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Scheduler for hosts that already have a refresh callback.
///
/// The host checks [`FrameScheduler::is_active`] on every refresh and feeds a
/// frame to the loop while it returns `true`.
#[derive(Debug, Clone, Default)]
pub struct PollingScheduler {
    active: bool,
}

impl FrameScheduler for PollingScheduler {
    fn start(&mut self) {
        self.active = true;
    }

    fn cancel(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Display endpoint for composed overlays.
pub trait OverlaySink {
    fn show(&mut self, overlay: Overlay);
}

impl<F> OverlaySink for F
where
    F: FnMut(Overlay),
{
    fn show(&mut self, overlay: Overlay) {
        self(overlay)
    }
}

/// Playback state machine. Returns the time to render at, if any.
#[derive(Debug)]
pub struct SyncLoop<S> {
    scheduler: S,
    state: PlaybackState,
    resume_state: PlaybackState,
    last_time: f64,
}

impl<S> SyncLoop<S>
where
    S: FrameScheduler,
{
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            state: PlaybackState::Stopped,
            resume_state: PlaybackState::Stopped,
            last_time: 0.0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Time of the last clock reading seen by the loop.
    pub fn last_time(&self) -> f64 {
        self.last_time
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Handles a media event.
    ///
    /// `Play` starts the continuous cycle and renders on the first frame.
    /// `Seeking` and `TimeUpdate` render once at the reported time without
    /// touching the cycle. `Pause` and `Ended` stop the cycle.
    ///
    /// # Example
    /// ```
    /// use engine::playback::{ClockReading, MediaEvent, PlaybackState, PollingScheduler, SyncLoop};
    ///
    /// let mut sync = SyncLoop::new(PollingScheduler::default());
    /// assert_eq!(sync.on_media(MediaEvent::Play, ClockReading::playing(0.0)), None);
    /// assert_eq!(sync.state(), PlaybackState::Playing);
    /// assert_eq!(sync.on_frame(ClockReading::playing(0.016)), Some(0.016));
    /// ```
    pub fn on_media(&mut self, event: MediaEvent, clock: ClockReading) -> Option<f64> {
        let time = seconds_or_zero(clock.time);
        self.last_time = time;

        match event {
            MediaEvent::Play => {
                self.scheduler.cancel();
                self.scheduler.start();
                self.transition(PlaybackState::Playing, event);
                None
            }
            MediaEvent::Pause => {
                self.scheduler.cancel();
                self.transition(PlaybackState::Paused, event);
                None
            }
            MediaEvent::Ended => {
                self.scheduler.cancel();
                self.transition(PlaybackState::Stopped, event);
                None
            }
            MediaEvent::Seeking => {
                if self.state != PlaybackState::Seeking {
                    self.resume_state = self.state;
                }
                self.transition(PlaybackState::Seeking, event);
                Some(time)
            }
            MediaEvent::TimeUpdate => {
                if self.state == PlaybackState::Seeking {
                    self.transition(self.resume_state, event);
                }
                Some(time)
            }
        }
    }

    /// Handles one scheduled frame.
    ///
    /// Ticks that arrive after cancellation, or while neither playing nor
    /// scrubbing through playback, are ignored. When the clock reports paused
    /// or ended the frame still renders and the cycle stops.
    pub fn on_frame(&mut self, clock: ClockReading) -> Option<f64> {
        if !self.scheduler.is_active() || !self.is_cycling() {
            return None;
        }
        let time = seconds_or_zero(clock.time);
        self.last_time = time;

        if clock.ended {
            self.stop_cycle(PlaybackState::Stopped, MediaEvent::Ended);
        } else if clock.paused {
            self.stop_cycle(PlaybackState::Paused, MediaEvent::Pause);
        }
        Some(time)
    }

    /// Time to re-render at after a style change. Playback state is untouched.
    pub fn on_style_change(&self) -> f64 {
        self.last_time
    }

    /// Stops scheduling frames. Safe to call in any state.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }

    fn is_cycling(&self) -> bool {
        match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Seeking => self.resume_state == PlaybackState::Playing,
            PlaybackState::Paused | PlaybackState::Stopped => false,
        }
    }

    // A seek in progress resumes into the state the clock reported.
    fn stop_cycle(&mut self, next: PlaybackState, cause: MediaEvent) {
        self.scheduler.cancel();
        self.resume_state = next;
        self.transition(next, cause);
    }

    fn transition(&mut self, next: PlaybackState, cause: MediaEvent) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, ?cause, "playback state changed");
        }
        self.state = next;
    }
}

/// Composes the overlay for `time` and hands it to `sink`.
pub fn present<K>(sink: &mut K, segments: &[Segment], style: &Style, time: f64)
where
    K: OverlaySink + ?Sized,
{
    sink.show(compose(segments, style, time));
}
