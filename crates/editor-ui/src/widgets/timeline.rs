use engine::Segment;
use engine::timeline::locate_index;

/// Shortest timeline the widget scales to, in seconds.
const MIN_TIMELINE_SECONDS: f64 = 0.001;

/// Rect-like representation of one segment for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStrip {
    pub index: usize,
    pub x: f32,
    pub width: f32,
    pub active: bool,
}

/// Values needed by the UI to draw segment strips and playhead.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRenderModel {
    pub strips: Vec<SegmentStrip>,
    pub playhead_x: f32,
    pub duration: f64,
}

/// Interaction result emitted by the timeline widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineInteraction {
    SeekRequested(f64),
}

/// Length covered by the widget: the media duration when known, otherwise
/// the latest segment end.
pub fn timeline_duration(segments: &[Segment], media_duration: Option<f64>) -> f64 {
    let from_segments = segments
        .iter()
        .map(|segment| segment.end.max(segment.start))
        .fold(0.0, f64::max);
    media_duration
        .filter(|duration| duration.is_finite())
        .unwrap_or(from_segments)
        .max(MIN_TIMELINE_SECONDS)
}

/// Builds draw data for the timeline; the located segment is marked active.
pub fn build_render_model(
    segments: &[Segment],
    duration: f64,
    playhead: f64,
    width_px: f32,
) -> TimelineRenderModel {
    let safe_width = f64::from(width_px.max(0.0));
    let duration = duration.max(MIN_TIMELINE_SECONDS);
    let scale = safe_width / duration;
    let active = locate_index(segments, playhead);

    let strips = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| SegmentStrip {
            index,
            x: (segment.start.max(0.0) * scale) as f32,
            width: ((segment.end - segment.start).max(0.0) * scale) as f32,
            active: active == Some(index),
        })
        .collect();

    TimelineRenderModel {
        strips,
        playhead_x: (playhead.clamp(0.0, duration) * scale) as f32,
        duration,
    }
}

/// Maps a pointer X position into seconds.
pub fn seconds_at_x(x_px: f32, width_px: f32, duration: f64) -> f64 {
    if width_px <= 0.0 || duration <= 0.0 || !duration.is_finite() {
        return 0.0;
    }
    let normalized = f64::from((x_px / width_px).clamp(0.0, 1.0));
    normalized * duration
}

/// Creates a seek interaction from a click or drag on the timeline.
pub fn click_at_x(x_px: f32, width_px: f32, duration: f64) -> TimelineInteraction {
    TimelineInteraction::SeekRequested(seconds_at_x(x_px, width_px, duration))
}

#[cfg(test)]
mod tests {
    use engine::Segment;

    use super::{
        TimelineInteraction, build_render_model, click_at_x, seconds_at_x, timeline_duration,
    };

    fn sample_segments() -> Vec<Segment> {
        vec![
            Segment::new(0, 0.0, 6.0, "first"),
            Segment::new(1, 6.0, 10.0, "second"),
        ]
    }

    #[test]
    fn build_render_model_positions_strips_and_playhead() {
        let segments = sample_segments();

        let model = build_render_model(&segments, 10.0, 2.5, 100.0);

        assert_eq!(model.strips.len(), 2);
        assert_eq!(model.strips[0].x, 0.0);
        assert_eq!(model.strips[0].width, 60.0);
        assert_eq!(model.strips[1].x, 60.0);
        assert_eq!(model.strips[1].width, 40.0);
        assert_eq!(model.playhead_x, 25.0);
        assert!(model.strips[0].active);
        assert!(!model.strips[1].active);
    }

    #[test]
    fn duration_prefers_media_and_falls_back_to_segments() {
        let segments = sample_segments();

        assert_eq!(timeline_duration(&segments, Some(12.0)), 12.0);
        assert_eq!(timeline_duration(&segments, None), 10.0);
        assert_eq!(timeline_duration(&[], None), 0.001);
    }

    #[test]
    fn seek_position_is_clamped_and_scaled() {
        assert_eq!(seconds_at_x(-10.0, 200.0, 10.0), 0.0);
        assert_eq!(seconds_at_x(100.0, 200.0, 10.0), 5.0);
        assert_eq!(seconds_at_x(220.0, 200.0, 10.0), 10.0);
        assert_eq!(
            click_at_x(50.0, 200.0, 8.0),
            TimelineInteraction::SeekRequested(2.0)
        );
    }
}
