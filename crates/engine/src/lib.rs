//! Karaoke subtitle overlay engine.
//!
//! Locates the active transcript segment for a playback time, splits its text
//! at the reveal point and renders a styled two-span line. The playback sync
//! loop decides when that pipeline runs; persistence and transcript decoding
//! sit alongside it.

pub mod api;
pub mod error;
pub mod export;
pub mod outline;
pub mod overlay;
pub mod placement;
pub mod playback;
pub mod project;
pub mod reveal;
pub mod segment;
pub mod srt;
pub mod style;
pub mod ticker;
pub mod time;
pub mod timeline;
pub mod transcript;

pub use api::{Command, Engine, EngineErrorEvent, EngineErrorKind, Event, ProjectSnapshot};
pub use error::{EngineError, Result};
pub use overlay::{Overlay, OverlayLine, OverlaySpan};
pub use playback::{
    ClockReading, FrameScheduler, MediaEvent, OverlaySink, PlaybackState, PollingScheduler,
    SyncLoop,
};
pub use segment::{Segment, SegmentEdit, SegmentId};
pub use style::{Style, StyleControls};
pub use ticker::{FrameTick, ThreadScheduler};
