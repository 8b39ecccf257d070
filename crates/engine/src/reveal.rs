use crate::segment::Segment;
use crate::time::seconds_or_zero;

/// Shortest duration used when computing reveal progress, in seconds.
pub const MIN_REVEAL_DURATION: f64 = 0.01;

/// Fraction of a segment treated as already spoken at `t`, in `[0, 1]`.
///
/// Degenerate segments (`end <= start`) use [`MIN_REVEAL_DURATION`] so the
/// ratio never divides by zero.
///
/// # Example
/// ```
/// use engine::reveal::reveal_ratio;
/// use engine::segment::Segment;
///
/// let segment = Segment::new(0, 0.0, 2.0, "hello");
/// assert_eq!(reveal_ratio(&segment, 1.0), 0.5);
/// ```
pub fn reveal_ratio(segment: &Segment, t: f64) -> f64 {
    let start = seconds_or_zero(segment.start);
    let end = seconds_or_zero(segment.end);
    let duration = (end - start).max(MIN_REVEAL_DURATION);
    let ratio = (seconds_or_zero(t) - start) / duration;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Text partitioned at the reveal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSplit<'a> {
    pub done: &'a str,
    pub rest: &'a str,
}

/// Splits `text` after `floor(chars * ratio)` characters.
///
/// Counting is done in Unicode scalar values so the split never lands inside
/// a multi-byte character. `done` followed by `rest` always equals `text`.
///
/// # Example
/// ```
/// use engine::reveal::split_text;
///
/// let split = split_text("hello", 0.5);
/// assert_eq!((split.done, split.rest), ("he", "llo"));
/// ```
pub fn split_text(text: &str, ratio: f64) -> RevealSplit<'_> {
    let ratio = if ratio.is_nan() {
        0.0
    } else {
        ratio.clamp(0.0, 1.0)
    };
    let char_count = text.chars().count();
    let split_chars = ((char_count as f64 * ratio).floor() as usize).min(char_count);
    let split_byte = text
        .char_indices()
        .nth(split_chars)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len());

    let (done, rest) = text.split_at(split_byte);
    RevealSplit { done, rest }
}
