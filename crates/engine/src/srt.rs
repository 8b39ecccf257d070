use std::fmt::Write as _;

use crate::segment::Segment;
use crate::time::format_srt_timestamp;

/// Renders segments as a SubRip document.
///
/// Cues are numbered from 1 in list order; every cue is followed by a blank
/// line. An empty list yields an empty document.
///
/// # Example
/// ```
/// use engine::segment::Segment;
/// use engine::srt::render_srt;
///
/// let srt = render_srt(&[Segment::new(0, 1.0, 2.5, "hola")]);
/// assert_eq!(srt, "1\n00:00:01,000 --> 00:00:02,500\nhola\n\n");
/// ```
pub fn render_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::render_srt;
    use crate::segment::Segment;

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(render_srt(&[]), "");
    }

    #[test]
    fn cues_are_numbered_in_list_order() {
        let segments = vec![
            Segment::new(40, 0.0, 1.2, "uno"),
            Segment::new(3, 61.25, 3_600.0, "dos"),
        ];

        assert_eq!(
            render_srt(&segments),
            "1\n00:00:00,000 --> 00:00:01,200\nuno\n\n\
             2\n00:01:01,250 --> 01:00:00,000\ndos\n\n"
        );
    }
}
