use crate::segment::Segment;
use crate::time::seconds_or_zero;

/// Finds the index of the segment to display at `t`.
///
/// The first segment in list order with `start <= t <= end` wins, so
/// overlapping segments resolve to the earlier entry. When nothing contains
/// `t`, the last segment that already finished (`end < t`) is returned so
/// recently spoken text stays visible during gaps. Returns `None` for an
/// empty list or when `t` precedes every segment.
///
/// The list is assumed to be in chronological order; it is never sorted here.
pub fn locate_index(segments: &[Segment], t: f64) -> Option<usize> {
    let t = seconds_or_zero(t);

    segments
        .iter()
        .position(|segment| segment.start <= t && t <= segment.end)
        .or_else(|| segments.iter().rposition(|segment| segment.end < t))
}

/// Returns the segment to display at `t`. See [`locate_index`].
///
/// # Example
/// ```
/// use engine::segment::Segment;
/// use engine::timeline::locate;
///
/// let segments = vec![Segment::new(0, 0.0, 1.0, "a"), Segment::new(1, 1.0, 2.0, "b")];
/// assert_eq!(locate(&segments, 1.5).map(|s| s.text.as_str()), Some("b"));
/// assert_eq!(locate(&segments, 5.0).map(|s| s.text.as_str()), Some("b"));
/// assert!(locate(&[], 1.0).is_none());
/// ```
pub fn locate(segments: &[Segment], t: f64) -> Option<&Segment> {
    locate_index(segments, t).map(|index| &segments[index])
}
