use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::overlay::{Overlay, compose};
use crate::placement::SubtitleBox;
use crate::playback::{ClockReading, FrameScheduler, MediaEvent, PlaybackState, SyncLoop};
use crate::project::Project;
use crate::segment::{Segment, SegmentEdit, SegmentStore, split_by_max_words};
use crate::style::{Style, StyleCache, StyleControls};

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    NewProject {
        name: String,
    },
    /// Replaces the whole session with a stored project.
    ///
    /// # Example
    /// ```
    /// use engine::project::Project;
    /// use engine::segment::Segment;
    /// use engine::{Command, Engine, PollingScheduler};
    ///
    /// let mut engine = Engine::new(PollingScheduler::default());
    /// let mut project = Project::new("demo");
    /// project.segments = vec![Segment::new(0, 0.0, 1.0, "hi")];
    /// let events = engine
    ///     .handle_command(Command::LoadProject(Box::new(project)))
    ///     .unwrap();
    /// assert_eq!(engine.segments().len(), 1);
    /// assert!(!events.is_empty());
    /// ```
    LoadProject(Box<Project>),
    /// Installs a finished transcript.
    ReplaceSegments {
        segments: Vec<Segment>,
        language: Option<String>,
    },
    EditSegment {
        index: usize,
        edit: SegmentEdit,
    },
    /// Re-chunks the current segments. `0` leaves them as they are.
    SplitByMaxWords {
        max_words: u32,
    },
    SetStyleControls(StyleControls),
    SetSubtitleBox(SubtitleBox),
    Media {
        event: MediaEvent,
        clock: ClockReading,
    },
    Frame {
        clock: ClockReading,
    },
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ProjectChanged(ProjectSnapshot),
    OverlayChanged(Overlay),
    PlaybackChanged { state: PlaybackState },
    Error(EngineErrorEvent),
}

/// User-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    SegmentNotFound,
    ProjectUnavailable,
    TranscriptionFailed,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::SegmentIndexOutOfRange { .. } => Self::SegmentNotFound,
            EngineError::InvalidProjectId { .. }
            | EngineError::ProjectNotFound { .. }
            | EngineError::ProjectIo { .. }
            | EngineError::ProjectSerialization { .. } => Self::ProjectUnavailable,
            EngineError::TranscriptIo(_)
            | EngineError::TranscriptionFailed { .. }
            | EngineError::TranscriptIncomplete => Self::TranscriptionFailed,
            EngineError::InvalidFrameRate(_) => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable project snapshot consumed by the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub style: Style,
}

/// Owns the editing state and drives the overlay from playback input.
#[derive(Debug)]
pub struct Engine<S> {
    project: Project,
    segments: SegmentStore,
    style: StyleCache,
    subtitle_box: SubtitleBox,
    sync: SyncLoop<S>,
    overlay: Overlay,
}

impl<S> Engine<S>
where
    S: FrameScheduler,
{
    /// Creates an engine with an empty, unnamed project.
    pub fn new(scheduler: S) -> Self {
        Self {
            project: Project::default(),
            segments: SegmentStore::default(),
            style: StyleCache::default(),
            subtitle_box: SubtitleBox::default(),
            sync: SyncLoop::new(scheduler),
            overlay: Overlay::Empty,
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::NewProject { name } => Ok(self.new_project(name)),
            Command::LoadProject(project) => Ok(self.load_project(*project)),
            Command::ReplaceSegments { segments, language } => {
                Ok(self.replace_segments(segments, language))
            }
            Command::EditSegment { index, edit } => self.edit_segment(index, edit),
            Command::SplitByMaxWords { max_words } => Ok(self.split_by_max_words(max_words)),
            Command::SetStyleControls(controls) => Ok(self.set_style_controls(controls)),
            Command::SetSubtitleBox(subtitle_box) => Ok(self.set_subtitle_box(subtitle_box)),
            Command::Media { event, clock } => Ok(self.media(event, clock)),
            Command::Frame { clock } => Ok(self.frame(clock)),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        self.segments.as_slice()
    }

    pub fn style(&self) -> &Style {
        self.style.style()
    }

    pub fn subtitle_box(&self) -> SubtitleBox {
        self.subtitle_box
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.sync.state()
    }

    pub fn scheduler(&self) -> &S {
        self.sync.scheduler()
    }

    /// Current session as a project document, ready to be saved.
    pub fn project_document(&self) -> Project {
        Project {
            style: self.style.controls().clone(),
            subtitle_box: self.subtitle_box,
            segments: self.segments.as_slice().to_vec(),
            ..self.project.clone()
        }
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            project: self.project_document(),
            style: self.style.style().clone(),
        }
    }

    fn new_project(&mut self, name: String) -> Vec<Event> {
        self.load_project(Project::new(name))
    }

    fn load_project(&mut self, mut project: Project) -> Vec<Event> {
        self.segments
            .replace_all(std::mem::take(&mut project.segments));
        self.style.update(std::mem::take(&mut project.style));
        self.subtitle_box = project.subtitle_box;
        info!(
            id = %project.id,
            name = %project.name,
            segment_count = self.segments.len(),
            "project loaded"
        );
        self.project = project;
        self.changed_with_render()
    }

    fn replace_segments(&mut self, segments: Vec<Segment>, language: Option<String>) -> Vec<Event> {
        self.segments.replace_all(segments);
        if language.is_some() {
            self.project.language = language;
        }
        self.changed_with_render()
    }

    fn edit_segment(&mut self, index: usize, edit: SegmentEdit) -> Result<Vec<Event>> {
        self.segments.apply(index, edit)?;
        Ok(self.changed_with_render())
    }

    fn split_by_max_words(&mut self, max_words: u32) -> Vec<Event> {
        self.project.max_words = max_words;
        let split = split_by_max_words(self.segments.as_slice(), max_words);
        self.segments.replace_all(split);
        self.changed_with_render()
    }

    fn set_style_controls(&mut self, controls: StyleControls) -> Vec<Event> {
        self.style.update(controls);
        let mut events = vec![Event::ProjectChanged(self.snapshot())];
        events.extend(self.render_at(self.sync.on_style_change()));
        events
    }

    fn set_subtitle_box(&mut self, subtitle_box: SubtitleBox) -> Vec<Event> {
        if subtitle_box == self.subtitle_box {
            return Vec::new();
        }
        debug!(?subtitle_box, "subtitle box moved");
        self.subtitle_box = subtitle_box;
        vec![Event::ProjectChanged(self.snapshot())]
    }

    fn media(&mut self, event: MediaEvent, clock: ClockReading) -> Vec<Event> {
        let before = self.sync.state();
        let render_time = self.sync.on_media(event, clock);
        self.after_sync(before, render_time)
    }

    fn frame(&mut self, clock: ClockReading) -> Vec<Event> {
        let before = self.sync.state();
        let render_time = self.sync.on_frame(clock);
        self.after_sync(before, render_time)
    }

    fn after_sync(&mut self, before: PlaybackState, render_time: Option<f64>) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(time) = render_time {
            events.extend(self.render_at(time));
        }
        let state = self.sync.state();
        if state != before {
            events.push(Event::PlaybackChanged { state });
        }
        events
    }

    fn changed_with_render(&mut self) -> Vec<Event> {
        let mut events = vec![Event::ProjectChanged(self.snapshot())];
        events.extend(self.render_at(self.sync.last_time()));
        events
    }

    /// Recomputes the overlay; emits only when the display would change.
    fn render_at(&mut self, time: f64) -> Option<Event> {
        let overlay = compose(self.segments.as_slice(), self.style.style(), time);
        if overlay == self.overlay {
            return None;
        }
        self.overlay = overlay.clone();
        Some(Event::OverlayChanged(overlay))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Command, Engine, EngineErrorEvent, EngineErrorKind, Event};
    use crate::error::EngineError;
    use crate::overlay::Overlay;
    use crate::placement::SubtitleBox;
    use crate::playback::{ClockReading, FrameScheduler, MediaEvent, PlaybackState};
    use crate::project::Project;
    use crate::segment::{Segment, SegmentEdit};
    use crate::style::StyleControls;

    #[derive(Debug, Default)]
    struct MockState {
        active: bool,
        starts: usize,
    }

    #[derive(Debug, Clone, Default)]
    struct MockScheduler {
        state: Arc<Mutex<MockState>>,
    }

    impl FrameScheduler for MockScheduler {
        fn start(&mut self) {
            let mut state = self.state.lock().expect("scheduler lock poisoned");
            state.active = true;
            state.starts += 1;
        }

        fn cancel(&mut self) {
            self.state.lock().expect("scheduler lock poisoned").active = false;
        }

        fn is_active(&self) -> bool {
            self.state.lock().expect("scheduler lock poisoned").active
        }
    }

    fn engine_with(segments: Vec<Segment>) -> (Engine<MockScheduler>, Arc<Mutex<MockState>>) {
        let scheduler = MockScheduler::default();
        let state = Arc::clone(&scheduler.state);
        let mut engine = Engine::new(scheduler);
        engine
            .handle_command(Command::ReplaceSegments {
                segments,
                language: None,
            })
            .expect("replace should succeed");
        (engine, state)
    }

    fn overlay_texts(events: &[Event]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::OverlayChanged(Overlay::Line(line)) => {
                    Some((line.done.text.clone(), line.rest.text.clone()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn seek_renders_the_located_segment_once() {
        let (mut engine, _) = engine_with(vec![Segment::new(0, 0.0, 2.0, "hello")]);

        let events = engine
            .handle_command(Command::Media {
                event: MediaEvent::Seeking,
                clock: ClockReading::paused(1.0),
            })
            .expect("seek should succeed");

        assert_eq!(
            overlay_texts(&events),
            vec![("he".to_owned(), "llo".to_owned())]
        );
        assert!(events.contains(&Event::PlaybackChanged {
            state: PlaybackState::Seeking
        }));
    }

    #[test]
    fn play_starts_scheduler_and_frames_drive_the_overlay() {
        let (mut engine, state) = engine_with(vec![Segment::new(0, 0.0, 1.0, "abcd")]);

        let events = engine
            .handle_command(Command::Media {
                event: MediaEvent::Play,
                clock: ClockReading::playing(0.0),
            })
            .expect("play should succeed");
        assert_eq!(
            events,
            vec![Event::PlaybackChanged {
                state: PlaybackState::Playing
            }]
        );
        assert!(state.lock().expect("lock").active);

        let events = engine
            .handle_command(Command::Frame {
                clock: ClockReading::playing(0.5),
            })
            .expect("frame should succeed");
        assert_eq!(
            overlay_texts(&events),
            vec![("ab".to_owned(), "cd".to_owned())]
        );

        let repeated = engine
            .handle_command(Command::Frame {
                clock: ClockReading::playing(0.55),
            })
            .expect("frame should succeed");
        assert!(repeated.is_empty());
    }

    #[test]
    fn frame_reporting_pause_stops_the_cycle() {
        let (mut engine, state) = engine_with(vec![Segment::new(0, 0.0, 1.0, "abcd")]);
        engine
            .handle_command(Command::Media {
                event: MediaEvent::Play,
                clock: ClockReading::playing(0.0),
            })
            .expect("play should succeed");

        let events = engine
            .handle_command(Command::Frame {
                clock: ClockReading::paused(0.75),
            })
            .expect("frame should succeed");

        assert!(events.contains(&Event::PlaybackChanged {
            state: PlaybackState::Paused
        }));
        assert!(!state.lock().expect("lock").active);
        assert!(
            engine
                .handle_command(Command::Frame {
                    clock: ClockReading::playing(0.9),
                })
                .expect("frame should succeed")
                .is_empty()
        );
    }

    #[test]
    fn style_change_rerenders_without_touching_playback() {
        let (mut engine, _) = engine_with(vec![Segment::new(0, 0.0, 2.0, "hello")]);
        engine
            .handle_command(Command::Media {
                event: MediaEvent::TimeUpdate,
                clock: ClockReading::paused(1.0),
            })
            .expect("time update should succeed");

        let events = engine
            .handle_command(Command::SetStyleControls(StyleControls {
                done_color: Some("#00ff00".to_owned()),
                ..StyleControls::default()
            }))
            .expect("style should succeed");

        let recolored = events.iter().any(|event| {
            matches!(event, Event::OverlayChanged(Overlay::Line(line)) if line.done.color == "#00ff00")
        });
        assert!(recolored);
        assert_eq!(engine.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn edits_are_visible_on_the_next_render() {
        let (mut engine, _) = engine_with(vec![Segment::new(0, 0.0, 2.0, "hello")]);
        engine
            .handle_command(Command::Media {
                event: MediaEvent::TimeUpdate,
                clock: ClockReading::paused(2.0),
            })
            .expect("time update should succeed");

        let events = engine
            .handle_command(Command::EditSegment {
                index: 0,
                edit: SegmentEdit::Text("bye".to_owned()),
            })
            .expect("edit should succeed");

        assert_eq!(
            overlay_texts(&events),
            vec![("bye".to_owned(), String::new())]
        );
    }

    #[test]
    fn editing_a_missing_segment_reports_kind() {
        let (mut engine, _) = engine_with(Vec::new());

        let error = engine
            .handle_command(Command::EditSegment {
                index: 4,
                edit: SegmentEdit::Start(1.0),
            })
            .expect_err("edit should fail");

        assert!(matches!(error, EngineError::SegmentIndexOutOfRange { .. }));
        assert_eq!(
            EngineErrorEvent::from_error(&error).kind,
            EngineErrorKind::SegmentNotFound
        );
    }

    #[test]
    fn load_project_replaces_state_and_project_document_round_trips() {
        let (mut engine, _) = engine_with(vec![Segment::new(0, 0.0, 1.0, "old")]);
        let mut project = Project::new("song");
        project.id = "abc".to_owned();
        project.segments = vec![Segment::new(0, 0.0, 3.0, "new words here")];
        project.style.shadow_on = Some(true);
        project.subtitle_box = SubtitleBox::new(0.5, 0.2, 0.3, 0.1);

        let events = engine
            .handle_command(Command::LoadProject(Box::new(project.clone())))
            .expect("load should succeed");

        assert!(matches!(events.first(), Some(Event::ProjectChanged(_))));
        assert!(engine.style().shadow_on);
        assert_eq!(engine.project_document(), project);
    }

    #[test]
    fn loading_a_project_keeps_the_frame_cycle_running() {
        let (mut engine, state) = engine_with(vec![Segment::new(0, 0.0, 1.0, "abcd")]);
        engine
            .handle_command(Command::Media {
                event: MediaEvent::Play,
                clock: ClockReading::playing(0.0),
            })
            .expect("play should succeed");
        let mut project = Project::new("next");
        project.segments = vec![Segment::new(0, 4.0, 6.0, "next song")];

        let events = engine
            .handle_command(Command::LoadProject(Box::new(project)))
            .expect("load should succeed");
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::PlaybackChanged { .. }))
        );
        assert_eq!(engine.playback_state(), PlaybackState::Playing);
        assert!(state.lock().expect("lock").active);

        let events = engine
            .handle_command(Command::Frame {
                clock: ClockReading::playing(5.0),
            })
            .expect("frame should succeed");
        assert_eq!(
            overlay_texts(&events),
            vec![("next".to_owned(), " song".to_owned())]
        );
    }

    #[test]
    fn split_command_records_max_words() {
        let (mut engine, _) = engine_with(vec![Segment::new(0, 0.0, 6.0, "a b c d e f")]);

        engine
            .handle_command(Command::SplitByMaxWords { max_words: 3 })
            .expect("split should succeed");

        assert_eq!(engine.segments().len(), 2);
        assert_eq!(engine.project_document().max_words, 3);
    }

    #[test]
    fn unchanged_subtitle_box_emits_nothing() {
        let (mut engine, _) = engine_with(Vec::new());

        let events = engine
            .handle_command(Command::SetSubtitleBox(SubtitleBox::default()))
            .expect("box should succeed");

        assert!(events.is_empty());
    }
}
