use engine::placement::{PixelRect, SubtitleBox};
use engine::time::parse_seconds_or_zero;
use engine::{
    ClockReading, Command, EngineErrorEvent, Event, MediaEvent, OverlaySink, PlaybackState,
    ProjectSnapshot, SegmentEdit, StyleControls,
};
use tracing::warn;

use crate::widgets::overlay::{OverlayState, overlay_rect};
use crate::widgets::timeline::{
    TimelineInteraction, TimelineRenderModel, build_render_model, timeline_duration,
};

/// Change made through one of the style controls. Numeric inputs arrive as
/// typed text.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleEdit {
    FontFamily(String),
    FontSize(String),
    DoneColor(String),
    RestColor(String),
    BackgroundColor(String),
    BackgroundOpacity(String),
    BorderOn(bool),
    BorderColor(String),
    BorderWidth(String),
    ShadowOn(bool),
}

/// UI message consumed by update.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Engine(Event),
    SegmentStartEdited { index: usize, input: String },
    SegmentEndEdited { index: usize, input: String },
    SegmentTextEdited { index: usize, text: String },
    MaxWordsApplied(String),
    StyleEdited(StyleEdit),
    Media { event: MediaEvent, clock: ClockReading },
    /// Frame callback from the host, carrying the media clock at that moment.
    FrameDue(ClockReading),
    MediaDurationKnown(f64),
    PreviewResized(PixelRect),
    SubtitleBoxDragged { dx: f64, dy: f64 },
    TimelineSeek(f64),
}

impl Message {
    /// Converts a timeline widget interaction into an app message.
    pub fn from_timeline(interaction: TimelineInteraction) -> Self {
        match interaction {
            TimelineInteraction::SeekRequested(seconds) => Self::TimelineSeek(seconds),
        }
    }
}

/// UI state for the editor screen.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    snapshot: Option<ProjectSnapshot>,
    controls: StyleControls,
    playback: PlaybackState,
    playhead: f64,
    media_duration: Option<f64>,
    preview: PixelRect,
    overlay: OverlayState,
    seek_request: Option<f64>,
    last_error: Option<EngineErrorEvent>,
}

impl AppState {
    /// Creates an empty app state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one UI message and returns outgoing engine commands.
    pub fn update(&mut self, message: Message) -> Vec<Command> {
        match message {
            Message::Engine(event) => self.apply_engine_event(event),
            Message::SegmentStartEdited { index, input } => vec![Command::EditSegment {
                index,
                edit: SegmentEdit::Start(parse_seconds_or_zero(&input)),
            }],
            Message::SegmentEndEdited { index, input } => vec![Command::EditSegment {
                index,
                edit: SegmentEdit::End(parse_seconds_or_zero(&input)),
            }],
            Message::SegmentTextEdited { index, text } => vec![Command::EditSegment {
                index,
                edit: SegmentEdit::Text(text),
            }],
            Message::MaxWordsApplied(input) => {
                let max_words = input.trim().parse::<u32>().unwrap_or(0);
                vec![Command::SplitByMaxWords { max_words }]
            }
            Message::StyleEdited(edit) => {
                apply_style_edit(&mut self.controls, edit);
                vec![Command::SetStyleControls(self.controls.clone())]
            }
            Message::Media { event, clock } => {
                self.playhead = clock.time;
                vec![Command::Media { event, clock }]
            }
            Message::FrameDue(clock) => {
                if self.playback != PlaybackState::Playing {
                    return Vec::new();
                }
                self.playhead = clock.time;
                vec![Command::Frame { clock }]
            }
            Message::MediaDurationKnown(duration) => {
                self.media_duration = Some(duration).filter(|d| d.is_finite() && *d > 0.0);
                Vec::new()
            }
            Message::PreviewResized(preview) => {
                self.preview = preview;
                Vec::new()
            }
            Message::SubtitleBoxDragged { dx, dy } => {
                let moved = self.subtitle_box().dragged_by(dx, dy, self.preview);
                vec![Command::SetSubtitleBox(moved)]
            }
            Message::TimelineSeek(seconds) => {
                self.seek_request = Some(seconds.max(0.0));
                Vec::new()
            }
        }
    }

    /// Seek the host should apply to the media element, if any.
    ///
    /// The media element then reports `seeking`/`timeupdate` back as
    /// [`Message::Media`].
    pub fn take_seek_request(&mut self) -> Option<f64> {
        self.seek_request.take()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn last_error(&self) -> Option<&EngineErrorEvent> {
        self.last_error.as_ref()
    }

    pub fn style_controls(&self) -> &StyleControls {
        &self.controls
    }

    pub fn subtitle_box(&self) -> SubtitleBox {
        self.snapshot
            .as_ref()
            .map(|snapshot| snapshot.project.subtitle_box)
            .unwrap_or_default()
    }

    /// Pixel rectangle of the subtitle box in the current preview.
    pub fn subtitle_rect(&self) -> PixelRect {
        overlay_rect(self.preview, self.subtitle_box())
    }

    /// Returns render data for the timeline.
    pub fn timeline_render_model(&self, width_px: f32) -> Option<TimelineRenderModel> {
        self.snapshot.as_ref().map(|snapshot| {
            let segments = &snapshot.project.segments;
            let duration = timeline_duration(segments, self.media_duration);
            build_render_model(segments, duration, self.playhead, width_px)
        })
    }

    fn apply_engine_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::ProjectChanged(snapshot) => {
                self.controls = snapshot.project.style.clone();
                self.snapshot = Some(snapshot);
            }
            Event::OverlayChanged(overlay) => self.overlay.show(overlay),
            Event::PlaybackChanged { state } => self.playback = state,
            Event::Error(error) => {
                warn!(kind = ?error.kind, message = %error.message, "engine command failed");
                self.last_error = Some(error);
            }
        }
        Vec::new()
    }
}

fn apply_style_edit(controls: &mut StyleControls, edit: StyleEdit) {
    match edit {
        StyleEdit::FontFamily(family) => controls.font_family = Some(family),
        StyleEdit::FontSize(input) => controls.font_size_px = parse_number(&input),
        StyleEdit::DoneColor(color) => controls.done_color = Some(color),
        StyleEdit::RestColor(color) => controls.rest_color = Some(color),
        StyleEdit::BackgroundColor(color) => controls.background_color = Some(color),
        StyleEdit::BackgroundOpacity(input) => controls.background_opacity = parse_number(&input),
        StyleEdit::BorderOn(on) => controls.border_on = Some(on),
        StyleEdit::BorderColor(color) => controls.border_color = Some(color),
        StyleEdit::BorderWidth(input) => controls.border_width = parse_number(&input),
        StyleEdit::ShadowOn(on) => controls.shadow_on = Some(on),
    }
}

// Empty or unparsable input unsets the control so its default applies.
fn parse_number(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
