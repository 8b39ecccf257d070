use std::sync::mpsc;
use std::time::Duration;

use engine::overlay::compose;
use engine::playback::present;
use engine::project::Project;
use engine::style::{StyleControls, resolve};
use engine::timeline::locate;
use engine::{
    ClockReading, Command, Engine, Event, FrameScheduler, MediaEvent, Overlay, PlaybackState,
    PollingScheduler, Segment, Style, SyncLoop, ThreadScheduler,
};

fn texts(overlay: &Overlay) -> Option<(&str, &str)> {
    overlay
        .line()
        .map(|line| (line.done.text.as_str(), line.rest.text.as_str()))
}

#[test]
fn empty_segments_render_nothing_at_any_time() {
    let style = Style::default();

    for t in [0.0, 0.5, 10.0, 1e6] {
        assert!(locate(&[], t).is_none());
        assert!(compose(&[], &style, t).is_empty());
    }
}

#[test]
fn boundary_and_fallback_scenarios() {
    let segments = vec![Segment::new(0, 0.0, 1.0, "a"), Segment::new(1, 1.0, 2.0, "b")];

    assert_eq!(locate(&segments, 1.5).map(|s| s.id), Some(1));
    assert_eq!(locate(&segments, 5.0).map(|s| s.id), Some(1));
    assert_eq!(texts(&compose(&segments, &Style::default(), 5.0)), Some(("b", "")));
}

#[test]
fn karaoke_line_progresses_through_a_segment() {
    let segments = vec![Segment::new(0, 0.0, 2.0, "hello")];
    let style = resolve(&StyleControls {
        border_on: Some(true),
        border_width: Some(1.0),
        ..StyleControls::default()
    });

    let snapshots: Vec<_> = [0.0, 0.4, 1.0, 1.6, 2.0]
        .into_iter()
        .map(|t| compose(&segments, &style, t))
        .collect();

    let done: Vec<&str> = snapshots
        .iter()
        .filter_map(|overlay| texts(overlay).map(|(done, _)| done))
        .collect();
    assert_eq!(done, vec!["", "h", "he", "hell", "hello"]);
    assert!(snapshots[2].to_markup().contains("text-shadow: 1px 0px 0 #000000"));
}

#[test]
fn sync_loop_with_thread_scheduler_renders_until_paused() {
    let (tx, rx) = mpsc::channel();
    let mut sync = SyncLoop::new(ThreadScheduler::new(Duration::from_millis(1), tx));
    let segments = vec![Segment::new(0, 0.0, 1.0, "abcd")];
    let style = Style::default();
    let mut shown = Vec::new();

    sync.on_media(MediaEvent::Play, ClockReading::playing(0.0));
    let mut clock = 0.0;
    while sync.state() == PlaybackState::Playing {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("frame tick should arrive");
        clock += 0.25;
        let reading = if clock >= 0.75 {
            ClockReading::paused(clock)
        } else {
            ClockReading::playing(clock)
        };
        if let Some(time) = sync.on_frame(reading) {
            let mut sink = |overlay: Overlay| shown.push(overlay);
            present(&mut sink, &segments, &style, time);
        }
    }

    assert_eq!(sync.state(), PlaybackState::Paused);
    let done: Vec<&str> = shown
        .iter()
        .filter_map(|overlay| texts(overlay).map(|(done, _)| done))
        .collect();
    assert_eq!(done, vec!["a", "ab", "abc"]);
}

#[test]
fn engine_scrub_then_play_emits_overlay_and_state_events() {
    let (tx, rx) = mpsc::channel();
    let mut engine = Engine::new(ThreadScheduler::new(Duration::from_millis(1), tx));
    engine
        .handle_command(Command::ReplaceSegments {
            segments: vec![
                Segment::new(0, 0.0, 1.0, "one"),
                Segment::new(1, 3.0, 4.0, "two"),
            ],
            language: Some("en".to_owned()),
        })
        .expect("replace should succeed");

    let scrub = engine
        .handle_command(Command::Media {
            event: MediaEvent::Seeking,
            clock: ClockReading::paused(2.0),
        })
        .expect("seek should succeed");
    assert!(scrub.iter().any(|event| matches!(
        event,
        Event::OverlayChanged(overlay) if texts(overlay) == Some(("one", ""))
    )));

    engine
        .handle_command(Command::Media {
            event: MediaEvent::Play,
            clock: ClockReading::playing(3.5),
        })
        .expect("play should succeed");
    rx.recv_timeout(Duration::from_secs(2))
        .expect("frame tick should arrive");
    let frame = engine
        .handle_command(Command::Frame {
            clock: ClockReading::ended(4.0),
        })
        .expect("frame should succeed");

    assert!(frame.contains(&Event::PlaybackChanged {
        state: PlaybackState::Stopped
    }));
    assert_eq!(texts(engine.overlay()), Some(("two", "")));
    assert_eq!(engine.project_document().language.as_deref(), Some("en"));
}

fn frame_texts(engine: &mut Engine<PollingScheduler>, time: f64) -> Vec<(String, String)> {
    engine
        .handle_command(Command::Frame {
            clock: ClockReading::playing(time),
        })
        .expect("frame should succeed")
        .iter()
        .filter_map(|event| match event {
            Event::OverlayChanged(overlay) => {
                texts(overlay).map(|(done, rest)| (done.to_owned(), rest.to_owned()))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn playback_survives_scrubbing_and_project_loads() {
    let mut engine = Engine::new(PollingScheduler::default());
    engine
        .handle_command(Command::ReplaceSegments {
            segments: vec![Segment::new(0, 10.0, 11.0, "abcd")],
            language: None,
        })
        .expect("replace should succeed");
    engine
        .handle_command(Command::Media {
            event: MediaEvent::Play,
            clock: ClockReading::playing(0.0),
        })
        .expect("play should succeed");
    engine
        .handle_command(Command::Media {
            event: MediaEvent::Seeking,
            clock: ClockReading::playing(10.0),
        })
        .expect("seek should succeed");

    assert_eq!(
        frame_texts(&mut engine, 10.5),
        vec![("ab".to_owned(), "cd".to_owned())]
    );

    let mut project = Project::new("next");
    project.segments = vec![Segment::new(0, 10.0, 11.0, "wxyz")];
    engine
        .handle_command(Command::LoadProject(Box::new(project)))
        .expect("load should succeed");
    assert_eq!(
        frame_texts(&mut engine, 10.75),
        vec![("wxy".to_owned(), "z".to_owned())]
    );

    let resumed = engine
        .handle_command(Command::Media {
            event: MediaEvent::TimeUpdate,
            clock: ClockReading::playing(10.8),
        })
        .expect("time update should succeed");
    assert!(resumed.contains(&Event::PlaybackChanged {
        state: PlaybackState::Playing
    }));
    assert!(engine.scheduler().is_active());
}
