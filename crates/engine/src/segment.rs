use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::time::{deserialize_seconds, seconds_or_zero};

/// Opaque identifier carried by transcript segments.
pub type SegmentId = u64;

/// Minimum chunk size enforced by [`split_by_max_words`].
pub const MIN_WORDS_PER_CHUNK: u32 = 3;
const MIN_SPLIT_DURATION: f64 = 0.001;

/// One time-stamped unit of transcript text.
///
/// `start`/`end` are seconds. Ordering is never validated: `end <= start` is
/// accepted and handled by the reveal floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: SegmentId,
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub start: f64,
    #[serde(default, deserialize_with = "deserialize_seconds")]
    pub end: f64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub text: String,
}

impl Segment {
    pub fn new(id: SegmentId, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start: seconds_or_zero(start),
            end: seconds_or_zero(end),
            text: text.into(),
        }
    }
}

/// Field-level edit applied to one segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEdit {
    Start(f64),
    End(f64),
    Text(String),
}

/// Ordered, index-addressed list of segments.
///
/// Segments are never removed one by one; the store is replaced wholesale when
/// a transcript completes or a project loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Replaces every segment, keeping the supplied order.
    pub fn replace_all(&mut self, segments: Vec<Segment>) {
        debug!(
            previous = self.segments.len(),
            segment_count = segments.len(),
            "segments replaced"
        );
        self.segments = segments;
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Applies one edit in place.
    ///
    /// Numeric edits go through the numeric-or-zero coercion; the list is not
    /// re-sorted afterwards.
    ///
    /// # Example
    /// ```
    /// use engine::segment::{Segment, SegmentEdit, SegmentStore};
    ///
    /// let mut store = SegmentStore::new(vec![Segment::new(0, 0.0, 1.0, "hi")]);
    /// store.apply(0, SegmentEdit::End(f64::NAN)).unwrap();
    /// assert_eq!(store.as_slice()[0].end, 0.0);
    /// ```
    pub fn apply(&mut self, index: usize, edit: SegmentEdit) -> Result<&Segment> {
        let len = self.segments.len();
        let segment = self
            .segments
            .get_mut(index)
            .ok_or(EngineError::SegmentIndexOutOfRange { index, len })?;

        match edit {
            SegmentEdit::Start(start) => segment.start = seconds_or_zero(start),
            SegmentEdit::End(end) => segment.end = seconds_or_zero(end),
            SegmentEdit::Text(text) => segment.text = text,
        }
        debug!(
            index,
            start = segment.start,
            end = segment.end,
            "segment edited"
        );

        Ok(segment)
    }

    pub fn into_inner(self) -> Vec<Segment> {
        self.segments
    }
}

/// Splits long segments into chunks of at most `max_words` words.
///
/// `0` disables splitting; smaller limits are raised to
/// [`MIN_WORDS_PER_CHUNK`]. Ids are renumbered from zero. Each chunk receives
/// a share of the parent duration proportional to its word count, chunks run
/// back to back from the parent start and never pass the parent end.
///
/// # Example
/// ```
/// use engine::segment::{Segment, split_by_max_words};
///
/// let segments = vec![Segment::new(7, 0.0, 6.0, "one two three four five six")];
/// let split = split_by_max_words(&segments, 3);
/// assert_eq!(split.len(), 2);
/// assert_eq!(split[1].text, "four five six");
/// assert_eq!(split[1].start, 3.0);
/// ```
pub fn split_by_max_words(segments: &[Segment], max_words: u32) -> Vec<Segment> {
    if max_words == 0 {
        return segments.to_vec();
    }
    let max_words = max_words.max(MIN_WORDS_PER_CHUNK) as usize;

    let mut out = Vec::with_capacity(segments.len());
    let mut next_id: SegmentId = 0;
    for segment in segments {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.len() <= max_words || segment.end <= segment.start {
            out.push(Segment {
                id: next_id,
                ..segment.clone()
            });
            next_id += 1;
            continue;
        }

        let total_words = words.len() as f64;
        let total_duration = (segment.end - segment.start).max(MIN_SPLIT_DURATION);
        let mut cursor = segment.start;
        for chunk in words.chunks(max_words) {
            let chunk_duration = total_duration * (chunk.len() as f64 / total_words);
            let chunk_end = segment.end.min(cursor + chunk_duration);
            out.push(Segment {
                id: next_id,
                start: cursor,
                end: chunk_end,
                text: chunk.join(" "),
            });
            next_id += 1;
            cursor = chunk_end;
        }
    }

    debug!(
        input = segments.len(),
        output = out.len(),
        max_words,
        "segments split by word count"
    );
    out
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<SegmentId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_seconds(deserializer)?;
    if value <= 0.0 {
        return Ok(0);
    }
    Ok(value.floor().min(u64::MAX as f64) as SegmentId)
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawText::deserialize(deserializer)? {
        RawText::Text(text) => text,
        RawText::Other(_) => String::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Other(IgnoredAny),
}
